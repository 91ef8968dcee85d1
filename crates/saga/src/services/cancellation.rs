//! Booking cancellation trait and in-memory implementation.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use common::AuthToken;

use crate::compensation::{CancellationRequest, CancellationStrategy};
use crate::error::ServiceError;

/// Issues one cancellation request shape against the backend.
#[async_trait]
pub trait BookingCanceller: Send + Sync {
    /// Asks the backend to cancel the booking using `strategy`.
    async fn cancel_with(
        &self,
        token: &AuthToken,
        strategy: CancellationStrategy,
        request: &CancellationRequest,
    ) -> Result<(), ServiceError>;
}

#[derive(Debug, Default)]
struct InMemoryCancellerState {
    failing: HashSet<CancellationStrategy>,
    delays: HashMap<CancellationStrategy, Duration>,
    calls: Vec<(CancellationStrategy, CancellationRequest)>,
}

/// In-memory canceller for testing.
///
/// Every strategy succeeds unless configured to fail or to stall.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBookingCanceller {
    state: Arc<RwLock<InMemoryCancellerState>>,
}

impl InMemoryBookingCanceller {
    /// Creates a new in-memory canceller.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `strategy` answer with HTTP 404.
    pub fn fail_strategy(&self, strategy: CancellationStrategy) {
        self.state.write().unwrap().failing.insert(strategy);
    }

    /// Makes `strategy` wait before answering.
    pub fn set_delay(&self, strategy: CancellationStrategy, delay: Duration) {
        self.state.write().unwrap().delays.insert(strategy, delay);
    }

    /// Returns the number of cancellation requests received.
    pub fn call_count(&self) -> usize {
        self.state.read().unwrap().calls.len()
    }

    /// Returns the strategies tried, in order.
    pub fn strategies_tried(&self) -> Vec<CancellationStrategy> {
        self.state
            .read()
            .unwrap()
            .calls
            .iter()
            .map(|(strategy, _)| *strategy)
            .collect()
    }

    /// Returns every request received, in order.
    pub fn requests(&self) -> Vec<CancellationRequest> {
        self.state
            .read()
            .unwrap()
            .calls
            .iter()
            .map(|(_, request)| request.clone())
            .collect()
    }
}

#[async_trait]
impl BookingCanceller for InMemoryBookingCanceller {
    async fn cancel_with(
        &self,
        _token: &AuthToken,
        strategy: CancellationStrategy,
        request: &CancellationRequest,
    ) -> Result<(), ServiceError> {
        let (delay, fails) = {
            let mut state = self.state.write().unwrap();
            state.calls.push((strategy, request.clone()));
            (
                state.delays.get(&strategy).copied(),
                state.failing.contains(&strategy),
            )
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if fails {
            return Err(ServiceError::Http {
                status: 404,
                message: format!("{strategy} not supported"),
            });
        }
        Ok(())
    }
}
