//! In-memory cart state.

use serde::{Deserialize, Serialize};

use super::{CartError, CartLineItem, ItemId, ItemOptions, StarchLevel};
use crate::pricing::{OrderTotals, PricingParameters, calculate_totals};

/// The customer's cart.
///
/// Items keep the order in which they were first added. A line item never
/// holds a quantity of zero: taking the last unit away removes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CartLineItem>", into = "Vec<CartLineItem>")]
pub struct Cart {
    items: Vec<CartLineItem>,
}

// Query methods
impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all line items in insertion order.
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Returns a line item by ID.
    pub fn get_item(&self, item_id: &ItemId) -> Option<&CartLineItem> {
        self.items.iter().find(|item| &item.id == item_id)
    }

    /// Returns the number of distinct line items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the total number of units across all items.
    pub fn total_quantity(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Returns true if the cart has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Computes the order totals for this cart.
    pub fn totals(&self, pricing: Option<&PricingParameters>) -> OrderTotals {
        calculate_totals(Some(self.items.as_slice()), pricing)
    }
}

// Mutations
impl Cart {
    /// Adds an item to the cart.
    ///
    /// If an item with the same ID exists, its quantity is increased instead
    /// and the existing options are kept.
    pub fn add_item(&mut self, item: CartLineItem) -> Result<(), CartError> {
        if item.quantity == 0 {
            return Err(CartError::InvalidQuantity {
                quantity: item.quantity,
            });
        }

        self.merge(item);
        Ok(())
    }

    /// Adds one unit of an existing item.
    pub fn increment(&mut self, item_id: &ItemId) -> Result<u32, CartError> {
        let item = self.item_mut(item_id)?;
        item.quantity += 1;
        Ok(item.quantity)
    }

    /// Removes one unit of an item, removing the item when it reaches zero.
    ///
    /// Returns the remaining quantity.
    pub fn decrement(&mut self, item_id: &ItemId) -> Result<u32, CartError> {
        let index = self.require_position(item_id)?;
        let remaining = self.items[index].quantity.saturating_sub(1);
        if remaining == 0 {
            self.items.remove(index);
        } else {
            self.items[index].quantity = remaining;
        }
        Ok(remaining)
    }

    /// Sets the quantity of an existing item; zero removes it.
    pub fn set_quantity(&mut self, item_id: &ItemId, quantity: u32) -> Result<(), CartError> {
        let index = self.require_position(item_id)?;
        if quantity == 0 {
            self.items.remove(index);
        } else {
            self.items[index].quantity = quantity;
        }
        Ok(())
    }

    /// Applies a change to an item's options.
    pub fn update_options<F>(&mut self, item_id: &ItemId, update: F) -> Result<(), CartError>
    where
        F: FnOnce(&mut ItemOptions),
    {
        let item = self.item_mut(item_id)?;
        update(&mut item.options);
        Ok(())
    }

    /// Sets or clears the starch level of an item.
    pub fn set_starch(&mut self, item_id: &ItemId, level: Option<u8>) -> Result<(), CartError> {
        let starch = level.map(StarchLevel::try_from).transpose()?;
        self.update_options(item_id, |options| options.starch = starch)
    }

    /// Removes an item regardless of its quantity.
    pub fn remove_item(&mut self, item_id: &ItemId) -> Result<CartLineItem, CartError> {
        let index = self.require_position(item_id)?;
        Ok(self.items.remove(index))
    }

    /// Empties the cart, e.g. after the order was paid.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn merge(&mut self, item: CartLineItem) {
        match self.position(&item.id) {
            Some(index) => self.items[index].quantity += item.quantity,
            None => self.items.push(item),
        }
    }

    fn position(&self, item_id: &ItemId) -> Option<usize> {
        self.items.iter().position(|item| &item.id == item_id)
    }

    fn require_position(&self, item_id: &ItemId) -> Result<usize, CartError> {
        self.position(item_id).ok_or_else(|| CartError::ItemNotFound {
            item_id: item_id.to_string(),
        })
    }

    fn item_mut(&mut self, item_id: &ItemId) -> Result<&mut CartLineItem, CartError> {
        self.items
            .iter_mut()
            .find(|item| &item.id == item_id)
            .ok_or_else(|| CartError::ItemNotFound {
                item_id: item_id.to_string(),
            })
    }
}

impl FromIterator<CartLineItem> for Cart {
    fn from_iter<T: IntoIterator<Item = CartLineItem>>(iter: T) -> Self {
        let mut cart = Cart::new();
        for item in iter.into_iter().filter(|item| item.quantity > 0) {
            cart.merge(item);
        }
        cart
    }
}

impl From<Vec<CartLineItem>> for Cart {
    fn from(items: Vec<CartLineItem>) -> Self {
        items.into_iter().collect()
    }
}

impl From<Cart> for Vec<CartLineItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}
