//! HTTP backend for the checkout saga.
//!
//! [`HttpBackend`] talks to the booking backend's REST API and implements the
//! saga's collaborator traits: pricing lookup, booking creation, payment intent
//! creation and confirmation, and the booking cancellation shapes used for
//! compensation.

mod client;
mod config;
mod error;

pub use client::{CancellationCall, HttpBackend};
pub use config::{BackendConfig, DEFAULT_BASE_URL};
pub use error::BackendError;
