//! What a checkout run reports back to the caller.

use common::{BookingId, OrderNumber, PaymentIntentId};
use serde::Serialize;

use crate::attempt::CheckoutAttempt;
use crate::error::{FailureKind, ValidationError};

/// Terminal result of `handle_payment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckoutResult {
    /// Payment confirmed.
    Paid {
        booking_id: BookingId,
        order_number: OrderNumber,
        payment_intent_id: Option<PaymentIntentId>,
    },
    /// The customer dismissed the payment sheet.
    Cancelled {
        /// Whether the booking was cancelled on the backend.
        compensated: bool,
    },
    /// The attempt failed at `step`.
    Failed {
        kind: FailureKind,
        step: String,
        error: String,
        /// `None` when no booking existed, so nothing was compensated.
        compensated: Option<bool>,
    },
    /// Input validation failed before anything was sent.
    Rejected { reason: ValidationError },
    /// Another attempt is still running.
    Busy,
}

impl CheckoutResult {
    /// Returns true for a confirmed payment.
    pub fn is_paid(&self) -> bool {
        matches!(self, CheckoutResult::Paid { .. })
    }

    /// Returns true for results the user should see as errors.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            CheckoutResult::Failed { .. } | CheckoutResult::Rejected { .. }
        )
    }
}

/// How a notice should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeSeverity {
    Info,
    Error,
}

/// The alert shown to the user after a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserNotice {
    pub severity: NoticeSeverity,
    pub title: String,
    pub message: String,
}

impl UserNotice {
    pub(crate) fn paid(order_number: &OrderNumber) -> Self {
        Self {
            severity: NoticeSeverity::Info,
            title: "Payment Successful".to_string(),
            message: format!("Your order {order_number} has been placed."),
        }
    }

    pub(crate) fn cancelled(order_number: &OrderNumber) -> Self {
        Self {
            severity: NoticeSeverity::Info,
            title: "Payment Cancelled".to_string(),
            message: format!("Payment was cancelled. Order {order_number} was not placed."),
        }
    }

    pub(crate) fn failed(kind: FailureKind, step: &str, order_number: &OrderNumber) -> Self {
        Self {
            severity: NoticeSeverity::Error,
            title: "Payment Failed".to_string(),
            message: format!(
                "{}\n\nOrder: {order_number}\nStep: {step}",
                kind.user_message(step)
            ),
        }
    }

    pub(crate) fn rejected(reason: ValidationError) -> Self {
        Self {
            severity: NoticeSeverity::Error,
            title: "Missing Information".to_string(),
            message: reason.to_string(),
        }
    }

    pub(crate) fn busy() -> Self {
        Self {
            severity: NoticeSeverity::Info,
            title: "Payment In Progress".to_string(),
            message: "A payment is already being processed.".to_string(),
        }
    }

    /// Returns true if this notice reports an error.
    pub fn is_error(&self) -> bool {
        self.severity == NoticeSeverity::Error
    }
}

impl std::fmt::Display for UserNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

/// Everything `handle_payment` returns.
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    pub result: CheckoutResult,
    /// The attempt record; `None` when the run was rejected or busy.
    pub attempt: Option<CheckoutAttempt>,
    pub notice: UserNotice,
}

impl CheckoutOutcome {
    pub(crate) fn without_attempt(result: CheckoutResult, notice: UserNotice) -> Self {
        Self {
            result,
            attempt: None,
            notice,
        }
    }

    /// Returns the order number of the attempt, if one was started.
    pub fn order_number(&self) -> Option<&OrderNumber> {
        self.attempt.as_ref().and_then(CheckoutAttempt::order_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::{STEP_CREATE_BOOKING, STEP_CREATE_PAYMENT_INTENT};

    #[test]
    fn test_failed_notice_names_order_and_step() {
        let notice = UserNotice::failed(
            FailureKind::AuthFault,
            STEP_CREATE_BOOKING,
            &OrderNumber::new("DRY-1"),
        );
        assert!(notice.is_error());
        assert!(notice.message.contains("log in again"));
        assert!(notice.message.contains("DRY-1"));
        assert!(notice.message.contains(STEP_CREATE_BOOKING));
    }

    #[test]
    fn test_cancelled_notice_is_informational() {
        let notice = UserNotice::cancelled(&OrderNumber::new("DRY-1"));
        assert!(!notice.is_error());
    }

    #[test]
    fn test_result_serialization() {
        let result = CheckoutResult::Failed {
            kind: FailureKind::ServerFault,
            step: STEP_CREATE_PAYMENT_INTENT.to_string(),
            error: "HTTP 500: boom".to_string(),
            compensated: Some(true),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["kind"], "ServerFault");
        assert!(result.is_error());
        assert!(!result.is_paid());

        let busy = serde_json::to_value(CheckoutResult::Busy).unwrap();
        assert_eq!(busy["status"], "busy");
    }
}
