//! Compensating cancellation of a booking.
//!
//! The backend's cancellation contract differs across deployments, so a booking
//! is cancelled by trying an ordered list of request shapes until one succeeds.

use std::time::Duration;

use common::{AuthToken, BookingId, MerchantId, OrderNumber};
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::services::cancellation::BookingCanceller;

/// Default bound on a single cancellation request.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(5);

/// One way of asking the backend to cancel a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CancellationStrategy {
    /// Dedicated cancel endpoint.
    CancelBooking,
    /// Status update via PATCH on the status resource.
    PatchStatus,
    /// Full booking update via PUT.
    PutBooking,
    /// Status update via POST on the status resource.
    PostStatus,
    /// PATCH on the booking carrying only the status.
    SimpleStatus,
}

impl CancellationStrategy {
    /// Strategies in the order they are tried.
    pub const ORDERED: [CancellationStrategy; 5] = [
        CancellationStrategy::CancelBooking,
        CancellationStrategy::PatchStatus,
        CancellationStrategy::PutBooking,
        CancellationStrategy::PostStatus,
        CancellationStrategy::SimpleStatus,
    ];

    /// Returns the strategy name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CancellationStrategy::CancelBooking => "cancel_booking",
            CancellationStrategy::PatchStatus => "patch_status",
            CancellationStrategy::PutBooking => "put_booking",
            CancellationStrategy::PostStatus => "post_status",
            CancellationStrategy::SimpleStatus => "simple_status",
        }
    }
}

impl std::fmt::Display for CancellationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The booking to cancel and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancellationRequest {
    pub merchant_id: MerchantId,
    pub booking_id: BookingId,
    pub order_number: OrderNumber,
    pub reason: String,
}

impl CancellationRequest {
    /// Creates a cancellation request.
    pub fn new(
        merchant_id: MerchantId,
        booking_id: BookingId,
        order_number: OrderNumber,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            merchant_id,
            booking_id,
            order_number,
            reason: reason.into(),
        }
    }
}

/// Result of trying one strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyAttempt {
    pub strategy: CancellationStrategy,
    pub error: Option<ServiceError>,
}

/// How compensation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompensationOutcome {
    /// The booking was cancelled by this strategy.
    Compensated(CancellationStrategy),
    /// Every strategy failed; the booking must be cancelled by hand.
    ManualInterventionRequired,
}

/// Every attempt made while compensating, in order, plus the outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompensationReport {
    pub attempts: Vec<StrategyAttempt>,
    pub outcome: CompensationOutcome,
}

impl CompensationReport {
    /// Returns true if the booking was cancelled.
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, CompensationOutcome::Compensated(_))
    }

    /// Returns the strategy that cancelled the booking.
    pub fn strategy(&self) -> Option<CancellationStrategy> {
        match self.outcome {
            CompensationOutcome::Compensated(strategy) => Some(strategy),
            CompensationOutcome::ManualInterventionRequired => None,
        }
    }

    /// Returns the attempts that failed.
    pub fn failures(&self) -> impl Iterator<Item = (CancellationStrategy, &ServiceError)> {
        self.attempts
            .iter()
            .filter_map(|attempt| attempt.error.as_ref().map(|err| (attempt.strategy, err)))
    }
}

/// Cancels bookings by falling through [`CancellationStrategy::ORDERED`].
///
/// Never fails: the caller always gets a [`CompensationReport`].
#[derive(Debug, Clone)]
pub struct CompensationCoordinator<C: BookingCanceller> {
    canceller: C,
    attempt_timeout: Duration,
}

impl<C: BookingCanceller> CompensationCoordinator<C> {
    /// Creates a coordinator with the default per-attempt timeout.
    pub fn new(canceller: C) -> Self {
        Self::with_timeout(canceller, DEFAULT_ATTEMPT_TIMEOUT)
    }

    /// Creates a coordinator with an explicit per-attempt timeout.
    pub fn with_timeout(canceller: C, attempt_timeout: Duration) -> Self {
        Self {
            canceller,
            attempt_timeout,
        }
    }

    /// Tries each strategy in order, stopping at the first success.
    #[tracing::instrument(
        skip(self, token, request),
        fields(booking_id = %request.booking_id, order_number = %request.order_number)
    )]
    pub async fn cancel(&self, token: &AuthToken, request: &CancellationRequest) -> CompensationReport {
        metrics::counter!("checkout_compensations_total").increment(1);
        let mut attempts = Vec::with_capacity(CancellationStrategy::ORDERED.len());

        for strategy in CancellationStrategy::ORDERED {
            let result = tokio::time::timeout(
                self.attempt_timeout,
                self.canceller.cancel_with(token, strategy, request),
            )
            .await
            .unwrap_or(Err(ServiceError::Timeout));

            match result {
                Ok(()) => {
                    tracing::info!(%strategy, "booking cancelled");
                    attempts.push(StrategyAttempt {
                        strategy,
                        error: None,
                    });
                    return CompensationReport {
                        attempts,
                        outcome: CompensationOutcome::Compensated(strategy),
                    };
                }
                Err(err) => {
                    tracing::warn!(%strategy, error = %err, "cancellation strategy failed");
                    attempts.push(StrategyAttempt {
                        strategy,
                        error: Some(err),
                    });
                }
            }
        }

        metrics::counter!("checkout_compensation_exhausted_total").increment(1);
        tracing::error!(
            booking_id = %request.booking_id,
            order_number = %request.order_number,
            reason = %request.reason,
            "all cancellation strategies failed, manual intervention required"
        );
        CompensationReport {
            attempts,
            outcome: CompensationOutcome::ManualInterventionRequired,
        }
    }
}
