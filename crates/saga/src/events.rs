//! Checkout attempt events.
//!
//! Every transition of a [`CheckoutAttempt`](crate::attempt::CheckoutAttempt)
//! is recorded as an event in the attempt's journal.

use chrono::{DateTime, Utc};
use common::{BookingId, OrderNumber, PaymentIntentId, TrackingId};
use serde::{Deserialize, Serialize};

use crate::compensation::CancellationStrategy;
use crate::error::FailureKind;
use crate::state::CheckoutState;

/// Events that can occur during a checkout attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CheckoutEvent {
    /// A new attempt began with fresh identifiers.
    AttemptStarted(AttemptStartedData),

    /// A saga step started execution.
    StepStarted(StepData),

    /// A saga step completed and moved the attempt to a new state.
    StepCompleted(StepCompletedData),

    /// A saga step failed.
    StepFailed(StepFailedData),

    /// The coordinator observed the payment sheet's readiness signal.
    PaymentReady(TimestampData),

    /// Readiness was reset when the attempt finished.
    ReadinessReset,

    /// Compensating cancellation of the booking started.
    CompensationStarted(CompensationStartedData),

    /// One cancellation strategy failed (compensation continues).
    CompensationStrategyFailed(StrategyFailedData),

    /// The booking was cancelled.
    Compensated(CompensatedData),

    /// Every cancellation strategy failed.
    CompensationExhausted(TimestampData),

    /// Payment confirmed.
    AttemptPaid(TimestampData),

    /// The customer cancelled the payment.
    AttemptCancelled(TimestampData),

    /// The attempt failed.
    AttemptFailed(AttemptFailedData),
}

impl CheckoutEvent {
    /// Returns the event type name.
    pub fn event_type(&self) -> &'static str {
        match self {
            CheckoutEvent::AttemptStarted(_) => "AttemptStarted",
            CheckoutEvent::StepStarted(_) => "StepStarted",
            CheckoutEvent::StepCompleted(_) => "StepCompleted",
            CheckoutEvent::StepFailed(_) => "StepFailed",
            CheckoutEvent::PaymentReady(_) => "PaymentReady",
            CheckoutEvent::ReadinessReset => "ReadinessReset",
            CheckoutEvent::CompensationStarted(_) => "CompensationStarted",
            CheckoutEvent::CompensationStrategyFailed(_) => "CompensationStrategyFailed",
            CheckoutEvent::Compensated(_) => "Compensated",
            CheckoutEvent::CompensationExhausted(_) => "CompensationExhausted",
            CheckoutEvent::AttemptPaid(_) => "AttemptPaid",
            CheckoutEvent::AttemptCancelled(_) => "AttemptCancelled",
            CheckoutEvent::AttemptFailed(_) => "AttemptFailed",
        }
    }
}

/// Data for AttemptStarted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptStartedData {
    /// Order number generated for this attempt.
    pub order_number: OrderNumber,
    /// Tracking identifier generated for this attempt.
    pub tracking_id: TrackingId,
    /// When the attempt started.
    pub started_at: DateTime<Utc>,
}

/// Data for StepStarted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepData {
    /// The step name.
    pub step_name: String,
}

/// Data for StepCompleted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepCompletedData {
    /// The step name.
    pub step_name: String,
    /// State reached by completing the step.
    pub state: CheckoutState,
    /// Booking ID (set after create_booking step).
    pub booking_id: Option<BookingId>,
    /// Payment intent ID (set after create_payment_intent step).
    pub payment_intent_id: Option<PaymentIntentId>,
}

/// Data for StepFailed event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepFailedData {
    /// The step that failed.
    pub step_name: String,
    /// Failure category.
    pub kind: FailureKind,
    /// Error message describing the failure.
    pub error: String,
}

/// Data for events that only carry a timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestampData {
    pub at: DateTime<Utc>,
}

/// Data for CompensationStarted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompensationStartedData {
    /// The booking being cancelled.
    pub booking_id: BookingId,
    /// Reason sent to the backend.
    pub reason: String,
}

/// Data for CompensationStrategyFailed event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyFailedData {
    pub strategy: CancellationStrategy,
    pub error: String,
}

/// Data for Compensated event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompensatedData {
    /// The strategy that succeeded.
    pub strategy: CancellationStrategy,
}

/// Data for AttemptFailed event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptFailedData {
    /// The step that failed.
    pub step_name: String,
    /// Failure category.
    pub kind: FailureKind,
    /// Reason for failure.
    pub reason: String,
    /// When the attempt failed.
    pub failed_at: DateTime<Utc>,
}

// Event constructors
impl CheckoutEvent {
    /// Creates an AttemptStarted event.
    pub fn attempt_started(order_number: OrderNumber, tracking_id: TrackingId) -> Self {
        CheckoutEvent::AttemptStarted(AttemptStartedData {
            order_number,
            tracking_id,
            started_at: Utc::now(),
        })
    }

    /// Creates a StepStarted event.
    pub fn step_started(step_name: &str) -> Self {
        CheckoutEvent::StepStarted(StepData {
            step_name: step_name.to_string(),
        })
    }

    /// Creates a StepCompleted event.
    pub fn step_completed(
        step_name: &str,
        state: CheckoutState,
        booking_id: Option<BookingId>,
        payment_intent_id: Option<PaymentIntentId>,
    ) -> Self {
        CheckoutEvent::StepCompleted(StepCompletedData {
            step_name: step_name.to_string(),
            state,
            booking_id,
            payment_intent_id,
        })
    }

    /// Creates a StepFailed event.
    pub fn step_failed(step_name: &str, kind: FailureKind, error: impl Into<String>) -> Self {
        CheckoutEvent::StepFailed(StepFailedData {
            step_name: step_name.to_string(),
            kind,
            error: error.into(),
        })
    }

    /// Creates a PaymentReady event.
    pub fn payment_ready() -> Self {
        CheckoutEvent::PaymentReady(TimestampData { at: Utc::now() })
    }

    /// Creates a CompensationStarted event.
    pub fn compensation_started(booking_id: BookingId, reason: impl Into<String>) -> Self {
        CheckoutEvent::CompensationStarted(CompensationStartedData {
            booking_id,
            reason: reason.into(),
        })
    }

    /// Creates a CompensationStrategyFailed event.
    pub fn compensation_strategy_failed(
        strategy: CancellationStrategy,
        error: impl Into<String>,
    ) -> Self {
        CheckoutEvent::CompensationStrategyFailed(StrategyFailedData {
            strategy,
            error: error.into(),
        })
    }

    /// Creates a Compensated event.
    pub fn compensated(strategy: CancellationStrategy) -> Self {
        CheckoutEvent::Compensated(CompensatedData { strategy })
    }

    /// Creates a CompensationExhausted event.
    pub fn compensation_exhausted() -> Self {
        CheckoutEvent::CompensationExhausted(TimestampData { at: Utc::now() })
    }

    /// Creates an AttemptPaid event.
    pub fn attempt_paid() -> Self {
        CheckoutEvent::AttemptPaid(TimestampData { at: Utc::now() })
    }

    /// Creates an AttemptCancelled event.
    pub fn attempt_cancelled() -> Self {
        CheckoutEvent::AttemptCancelled(TimestampData { at: Utc::now() })
    }

    /// Creates an AttemptFailed event.
    pub fn attempt_failed(step_name: &str, kind: FailureKind, reason: impl Into<String>) -> Self {
        CheckoutEvent::AttemptFailed(AttemptFailedData {
            step_name: step_name.to_string(),
            kind,
            reason: reason.into(),
            failed_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_types() {
        assert_eq!(
            CheckoutEvent::step_started("create_booking").event_type(),
            "StepStarted"
        );
        assert_eq!(CheckoutEvent::payment_ready().event_type(), "PaymentReady");
        assert_eq!(
            CheckoutEvent::compensated(CancellationStrategy::PutBooking).event_type(),
            "Compensated"
        );
    }

    #[test]
    fn test_adjacently_tagged_serialization() {
        let event = CheckoutEvent::step_failed(
            "create_booking",
            FailureKind::AuthFault,
            "HTTP 401: unauthorized",
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "StepFailed");
        assert_eq!(json["data"]["kind"], "AuthFault");

        let back: CheckoutEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_unit_variant_serialization() {
        let json = serde_json::to_value(CheckoutEvent::ReadinessReset).unwrap();
        assert_eq!(json["type"], "ReadinessReset");
    }
}
