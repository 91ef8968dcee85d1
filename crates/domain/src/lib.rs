//! Domain layer for dry-cleaning checkout.
//!
//! This crate provides the client-side order model:
//! - Cart with line items and per-item service options
//! - Pricing parameters and the order totals calculator
//! - Pickup/delivery schedule resolution

pub mod cart;
pub mod pricing;
pub mod schedule;

pub use cart::{Amount, Cart, CartError, CartLineItem, ItemId, ItemOptions, StarchLevel};
pub use pricing::{
    ASSUMED_DISTANCE_KM, OrderTotals, PricedLine, PricingParameters, calculate_totals,
    checked_totals,
};
pub use schedule::{ResolvedSchedule, Schedule, ScheduleSlot, build_timestamp, month_number};
