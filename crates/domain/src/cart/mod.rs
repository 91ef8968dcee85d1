//! Cart and related types.

mod line_items;
mod value_objects;

pub use line_items::Cart;
pub use value_objects::{Amount, CartLineItem, ItemId, ItemOptions, StarchLevel};

use thiserror::Error;

/// Errors that can occur during cart operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// Item not found in the cart.
    #[error("Item not found: {item_id}")]
    ItemNotFound { item_id: String },

    /// Invalid quantity.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// Starch level outside 1..=4.
    #[error("Invalid starch level: {level} (must be between 1 and 4)")]
    InvalidStarchLevel { level: u8 },
}
