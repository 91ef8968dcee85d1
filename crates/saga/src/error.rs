//! Checkout error types.
//!
//! Collaborators report typed failures ([`ServiceError`], [`PaymentSheetError`]);
//! the coordinator wraps them in [`SagaError`] and every saga error maps to
//! exactly one [`FailureKind`], which selects the message shown to the user.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of a call to the booking or payment backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// The backend answered with a non-success HTTP status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The request never produced a response.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The request exceeded its timeout.
    #[error("Request timed out")]
    Timeout,

    /// The response body did not have the expected shape.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The backend answered 2xx but reported `success: false`.
    #[error("Request rejected: {0}")]
    Rejected(String),
}

impl ServiceError {
    /// Returns the HTTP status, if the backend answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failure reported by the payment sheet itself.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PaymentSheetError {
    /// The sheet rejected its configuration.
    #[error("Payment sheet initialization failed ({code}): {message}")]
    Initialization { code: String, message: String },
}

/// Missing or invalid input detected before anything is sent to the backend.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationError {
    #[error("Please sign in before placing an order")]
    NotAuthenticated,

    #[error("Please select a dry cleaner")]
    MissingMerchant,

    #[error("Your cart is empty")]
    EmptyCart,

    #[error("Please select pickup and delivery times")]
    MissingSchedule,

    #[error("Please add a pickup address")]
    MissingPickupAddress,

    #[error("Please add a delivery address")]
    MissingDeliveryAddress,

    #[error("Pickup or delivery date and time are incomplete or invalid")]
    InvalidSchedule,
}

/// Errors that end a checkout attempt.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SagaError {
    /// Input validation failed.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A backend call failed.
    #[error("Backend call failed: {0}")]
    Service(#[from] ServiceError),

    /// The payment sheet could not be initialized.
    #[error("{0}")]
    PaymentSheet(#[from] PaymentSheetError),

    /// The payment intent response lacked a credential needed by the sheet.
    #[error("Payment intent is missing {0}")]
    MissingCredentials(&'static str),

    /// The payment sheet never signalled readiness.
    #[error("Payment sheet not ready after {waited_ms} ms")]
    ReadinessTimeout { waited_ms: u64 },

    /// The payment sheet dropped its readiness signal without becoming ready.
    #[error("Payment sheet readiness signal was lost")]
    ReadinessLost,

    /// The provider reported a payment error.
    #[error("Payment declined ({code}): {message}")]
    PaymentDeclined { code: String, message: String },

    /// The sheet returned something other than success, cancel or error.
    #[error("Unclear payment result: {0}")]
    UnclearResult(String),

    /// The order total overflows or cannot be expressed in minor currency units.
    #[error("Order total is out of range")]
    AmountOutOfRange,
}

impl SagaError {
    /// Classifies the error.
    pub fn kind(&self) -> FailureKind {
        match self {
            SagaError::Validation(_) => FailureKind::Validation,
            SagaError::Service(err) => FailureKind::from_service_error(err),
            SagaError::PaymentSheet(_) | SagaError::MissingCredentials(_) => {
                FailureKind::PaymentSystem
            }
            SagaError::ReadinessTimeout { .. } | SagaError::ReadinessLost => {
                FailureKind::ReadinessTimeout
            }
            SagaError::PaymentDeclined { .. } => FailureKind::PaymentDeclined,
            SagaError::UnclearResult(_) => FailureKind::UnclearResult,
            SagaError::AmountOutOfRange => FailureKind::PayloadFault,
        }
    }
}

/// User-facing category of a checkout failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// Missing cart, schedule, addresses or session.
    Validation,
    /// 5xx from the backend.
    ServerFault,
    /// 401 from the backend.
    AuthFault,
    /// Any other 4xx, or a request the client could not build.
    PayloadFault,
    /// The payment sheet never became ready.
    ReadinessTimeout,
    /// The payment sheet or its credentials failed.
    PaymentSystem,
    /// The provider declined the payment.
    PaymentDeclined,
    /// The payment outcome could not be determined.
    UnclearResult,
    /// Everything else: transport errors, timeouts, rejected requests.
    Generic,
}

impl FailureKind {
    /// Maps a backend failure to its category.
    pub fn from_service_error(err: &ServiceError) -> Self {
        match err.status() {
            Some(401) => FailureKind::AuthFault,
            Some(status) if status >= 500 => FailureKind::ServerFault,
            Some(status) if (400..500).contains(&status) => FailureKind::PayloadFault,
            _ => FailureKind::Generic,
        }
    }

    /// Message shown to the user for a failure of this kind at `step`.
    pub fn user_message(&self, step: &str) -> &'static str {
        match self {
            FailureKind::Validation => "Please check your order details and try again.",
            FailureKind::ServerFault if step == crate::checkout::STEP_CREATE_BOOKING => {
                "Server error while creating your booking. Please try again later."
            }
            FailureKind::ServerFault | FailureKind::PaymentSystem => {
                "Payment system error. Please try again."
            }
            FailureKind::AuthFault => "Authentication failed. Please log in again.",
            FailureKind::PayloadFault => {
                "Invalid booking data. Please check your details and try again."
            }
            FailureKind::ReadinessTimeout => "Payment sheet is not ready. Please try again.",
            FailureKind::PaymentDeclined => {
                "Your payment was declined. Please use another payment method."
            }
            FailureKind::UnclearResult => {
                "We could not confirm your payment. Please contact support before trying again."
            }
            FailureKind::Generic => "Payment failed. Please try again.",
        }
    }

    /// Returns the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Validation => "validation",
            FailureKind::ServerFault => "server_fault",
            FailureKind::AuthFault => "auth_fault",
            FailureKind::PayloadFault => "payload_fault",
            FailureKind::ReadinessTimeout => "readiness_timeout",
            FailureKind::PaymentSystem => "payment_system",
            FailureKind::PaymentDeclined => "payment_declined",
            FailureKind::UnclearResult => "unclear_result",
            FailureKind::Generic => "generic",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
