//! Checkout saga for dry-cleaning orders.
//!
//! Turns a cart into a confirmed, paid booking against an external booking
//! backend and payment provider:
//! 1. Build the booking request
//! 2. Create the booking
//! 3. Create a payment intent
//! 4. Initialize the payment sheet and wait for it to become ready
//! 5. Present the payment sheet
//! 6. Confirm the payment
//!
//! If anything fails or the customer cancels after the booking exists, the
//! booking is cancelled by the [`CompensationCoordinator`].

pub mod attempt;
pub mod checkout;
pub mod compensation;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod outcome;
pub mod services;
pub mod state;
pub mod summary;

pub use attempt::CheckoutAttempt;
pub use checkout::{Addresses, CheckoutInput, Merchant, PaymentMethod, Session};
pub use compensation::{
    CancellationRequest, CancellationStrategy, CompensationCoordinator, CompensationOutcome,
    CompensationReport, StrategyAttempt,
};
pub use config::CheckoutConfig;
pub use coordinator::CheckoutCoordinator;
pub use error::{FailureKind, PaymentSheetError, SagaError, ServiceError, ValidationError};
pub use events::CheckoutEvent;
pub use outcome::{CheckoutOutcome, CheckoutResult, NoticeSeverity, UserNotice};
pub use services::{
    BookingCanceller, BookingLine, BookingReceipt, BookingRequest, BookingService,
    InMemoryBookingCanceller, InMemoryBookingService, InMemoryPaymentService,
    InMemoryPricingSource, PaymentConfirmation, PaymentIntent, PaymentIntentRequest,
    PaymentService, PaymentSheet, PaymentSheetConfig, PresentOutcome, PricingResolver,
    PricingSource, Readiness, ReadinessNotifier, ReadinessScript, ReadinessWait, RemotePricing,
    ScriptedPaymentSheet,
};
pub use state::CheckoutState;
pub use summary::OrderSummary;
