//! Checkout attempt state machine.

use serde::{Deserialize, Serialize};

/// The state of a checkout attempt.
///
/// State transitions:
/// ```text
/// Idle ──► ValidatingInputs ──► BuildingRequest ──► BookingCreated
///      ──► PaymentIntentCreated ──► PaymentSheetReady ──► PaymentPresented
///      ──┬──► Paid
///        ├──► PaymentCancelled
///        └──► PaymentFailed
///
/// Failed is reachable from every non-terminal state before presentation.
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CheckoutState {
    /// Nothing has happened yet.
    #[default]
    Idle,

    /// Merchant, cart, schedule and addresses are being checked.
    ValidatingInputs,

    /// Order number, tracking id and booking payload are being prepared.
    BuildingRequest,

    /// The backend created a booking; from here on failures are compensated.
    BookingCreated,

    /// A payment intent exists for the booking.
    PaymentIntentCreated,

    /// The payment sheet was initialized and observed ready.
    PaymentSheetReady,

    /// The payment sheet was shown to the customer.
    PaymentPresented,

    /// Payment confirmed (terminal state).
    Paid,

    /// The customer dismissed the payment sheet (terminal state).
    PaymentCancelled,

    /// The payment was declined, unclear or not confirmed (terminal state).
    PaymentFailed,

    /// The attempt failed before the payment sheet was shown (terminal state).
    Failed,
}

impl CheckoutState {
    /// Returns the state that follows this one on the success path.
    pub fn next(&self) -> Option<CheckoutState> {
        match self {
            CheckoutState::Idle => Some(CheckoutState::ValidatingInputs),
            CheckoutState::ValidatingInputs => Some(CheckoutState::BuildingRequest),
            CheckoutState::BuildingRequest => Some(CheckoutState::BookingCreated),
            CheckoutState::BookingCreated => Some(CheckoutState::PaymentIntentCreated),
            CheckoutState::PaymentIntentCreated => Some(CheckoutState::PaymentSheetReady),
            CheckoutState::PaymentSheetReady => Some(CheckoutState::PaymentPresented),
            CheckoutState::PaymentPresented => Some(CheckoutState::Paid),
            CheckoutState::Paid
            | CheckoutState::PaymentCancelled
            | CheckoutState::PaymentFailed
            | CheckoutState::Failed => None,
        }
    }

    /// Returns true if `to` is a legal transition from this state.
    pub fn can_transition_to(&self, to: CheckoutState) -> bool {
        match to {
            CheckoutState::Failed => {
                !self.is_terminal() && *self != CheckoutState::PaymentPresented
            }
            CheckoutState::PaymentCancelled | CheckoutState::PaymentFailed => {
                *self == CheckoutState::PaymentPresented
            }
            _ => self.next() == Some(to),
        }
    }

    /// Returns true if a booking exists in this state and must be compensated on failure.
    pub fn has_booking(&self) -> bool {
        matches!(
            self,
            CheckoutState::BookingCreated
                | CheckoutState::PaymentIntentCreated
                | CheckoutState::PaymentSheetReady
                | CheckoutState::PaymentPresented
                | CheckoutState::Paid
        )
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CheckoutState::Paid
                | CheckoutState::PaymentCancelled
                | CheckoutState::PaymentFailed
                | CheckoutState::Failed
        )
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutState::Idle => "Idle",
            CheckoutState::ValidatingInputs => "ValidatingInputs",
            CheckoutState::BuildingRequest => "BuildingRequest",
            CheckoutState::BookingCreated => "BookingCreated",
            CheckoutState::PaymentIntentCreated => "PaymentIntentCreated",
            CheckoutState::PaymentSheetReady => "PaymentSheetReady",
            CheckoutState::PaymentPresented => "PaymentPresented",
            CheckoutState::Paid => "Paid",
            CheckoutState::PaymentCancelled => "PaymentCancelled",
            CheckoutState::PaymentFailed => "PaymentFailed",
            CheckoutState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
