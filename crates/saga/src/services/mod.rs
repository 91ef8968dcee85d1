//! Collaborator traits and in-memory implementations for checkout steps.

pub mod booking;
pub mod cancellation;
pub mod payment;
pub mod payment_sheet;
pub mod pricing;

pub use booking::{
    BookingLine, BookingReceipt, BookingRequest, BookingService, InMemoryBookingService,
};
pub use cancellation::{BookingCanceller, InMemoryBookingCanceller};
pub use payment::{
    InMemoryPaymentService, PaymentConfirmation, PaymentIntent, PaymentIntentRequest,
    PaymentService,
};
pub use payment_sheet::{
    PaymentSheet, PaymentSheetConfig, PresentOutcome, Readiness, ReadinessNotifier,
    ReadinessScript, ReadinessWait, ScriptedPaymentSheet,
};
pub use pricing::{InMemoryPricingSource, PricingResolver, PricingSource, RemotePricing};
