//! Value objects for the cart domain.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::CartError;
use crate::pricing::PricedLine;

/// Catalog identifier of a purchasable item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Creates a new item ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the item ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A numeric amount as it arrives from catalog data.
///
/// Merchant catalogs carry prices either as JSON numbers or as strings, and a
/// string price is not guaranteed to be numeric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    /// A well-formed decimal value.
    Number(Decimal),
    /// Unparsed text.
    Text(String),
}

impl Amount {
    /// Returns the decimal value, or `None` if the amount is not numeric.
    pub fn value(&self) -> Option<Decimal> {
        match self {
            Amount::Number(value) => Some(*value),
            Amount::Text(text) => text.trim().parse().ok(),
        }
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::Number(value)
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Amount::Number(Decimal::from(value))
    }
}

impl From<&str> for Amount {
    fn from(text: &str) -> Self {
        Amount::Text(text.to_string())
    }
}

/// Starch level for pressed garments, 1 (light) through 4 (heavy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct StarchLevel(u8);

impl StarchLevel {
    /// Lightest starch level.
    pub const MIN: u8 = 1;
    /// Heaviest starch level.
    pub const MAX: u8 = 4;

    /// Returns the numeric level.
    pub fn level(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for StarchLevel {
    type Error = CartError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&level) {
            Ok(Self(level))
        } else {
            Err(CartError::InvalidStarchLevel { level })
        }
    }
}

impl From<StarchLevel> for u8 {
    fn from(level: StarchLevel) -> Self {
        level.0
    }
}

/// Per-item service toggles chosen by the customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemOptions {
    /// Wash without pressing.
    pub wash_only: bool,
    /// Starch level, if starch was requested.
    pub starch: Option<StarchLevel>,
    /// Zipper repair.
    pub zipper: bool,
    /// Button replacement.
    pub button: bool,
    /// Fold instead of hang.
    pub fold: bool,
    /// Merchant-specific toggles not covered above.
    pub extras: BTreeMap<String, bool>,
}

/// A purchasable item held in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    /// Catalog identifier.
    pub id: ItemId,

    /// Display name.
    pub name: String,

    /// Catalog category, e.g. "Shirts".
    #[serde(default)]
    pub category: String,

    /// Price of one unit.
    pub price: Amount,

    /// Number of units.
    pub quantity: u32,

    /// Service options.
    #[serde(default)]
    pub options: ItemOptions,
}

impl CartLineItem {
    /// Creates a line item with default options.
    pub fn new(
        id: impl Into<ItemId>,
        name: impl Into<String>,
        category: impl Into<String>,
        price: impl Into<Amount>,
        quantity: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            price: price.into(),
            quantity,
            options: ItemOptions::default(),
        }
    }

    /// Returns `price × quantity`, or `None` if the price is not numeric.
    pub fn line_total(&self) -> Option<Decimal> {
        self.price
            .value()
            .and_then(|price| price.checked_mul(Decimal::from(self.quantity)))
    }
}

impl PricedLine for CartLineItem {
    fn line_id(&self) -> &str {
        self.id.as_str()
    }

    fn unit_price(&self) -> Option<Decimal> {
        self.price.value()
    }

    fn quantity(&self) -> Option<Decimal> {
        Some(Decimal::from(self.quantity))
    }
}
