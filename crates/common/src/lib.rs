//! Shared identifier types used across the checkout crates.

mod types;

pub use types::{
    AuthToken, BookingId, MerchantId, OrderNumber, PaymentIntentId, TrackingId, UserId,
};
