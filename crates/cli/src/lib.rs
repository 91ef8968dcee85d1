//! Command-line driver for the checkout saga.
//!
//! Loads a checkout draft from JSON, prices it against the backend, and runs
//! the checkout saga with a payment sheet operated from the terminal.

pub mod config;
pub mod draft;
pub mod terminal;

pub use config::Config;
pub use draft::{DraftError, parse_draft, read_draft, with_session};
pub use terminal::TerminalPaymentSheet;
