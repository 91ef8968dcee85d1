//! Checkout saga constants and input types.

use common::{AuthToken, MerchantId, UserId};
use domain::{Cart, PricingParameters, Schedule};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The saga type identifier for checkout.
pub const SAGA_TYPE: &str = "Checkout";

/// Step name: Generate identifiers and build the booking payload.
pub const STEP_BUILD_REQUEST: &str = "build_request";

/// Step name: Create the booking on the backend.
pub const STEP_CREATE_BOOKING: &str = "create_booking";

/// Step name: Create a payment intent for the booking.
pub const STEP_CREATE_PAYMENT_INTENT: &str = "create_payment_intent";

/// Step name: Initialize the payment sheet and wait for it to become ready.
pub const STEP_INIT_PAYMENT_SHEET: &str = "init_payment_sheet";

/// Step name: Present the payment sheet to the customer.
pub const STEP_PRESENT_PAYMENT_SHEET: &str = "present_payment_sheet";

/// Step name: Confirm the payment on the backend.
pub const STEP_CONFIRM_PAYMENT: &str = "confirm_payment";

/// Compensation reason when the customer dismisses the payment sheet.
pub const REASON_CANCELLED_BY_USER: &str = "Payment cancelled by user";

/// The signed-in customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: UserId,
    pub token: AuthToken,
}

impl Session {
    /// Creates a session.
    pub fn new(user_id: impl Into<UserId>, token: AuthToken) -> Self {
        Self {
            user_id: user_id.into(),
            token,
        }
    }
}

/// The dry cleaner the order is placed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Merchant {
    pub id: MerchantId,
    #[serde(default)]
    pub name: String,
}

impl Merchant {
    /// Creates a merchant reference.
    pub fn new(id: impl Into<MerchantId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Pickup and delivery addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Addresses {
    pub pickup: Option<String>,
    pub delivery: Option<String>,
}

impl Addresses {
    /// Creates a pair of addresses.
    pub fn new(pickup: impl Into<String>, delivery: impl Into<String>) -> Self {
        Self {
            pickup: Some(pickup.into()),
            delivery: Some(delivery.into()),
        }
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Card,
    Cash,
}

/// Everything the checkout screen holds when the customer taps Pay.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckoutInput {
    pub session: Option<Session>,
    pub merchant: Option<Merchant>,
    pub cart: Cart,
    pub schedule: Option<Schedule>,
    pub addresses: Addresses,
    pub pricing: PricingParameters,
    pub payment_method: PaymentMethod,
}

/// Borrowed view of a checkout input that passed validation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ValidatedCheckout<'a> {
    pub session: &'a Session,
    pub merchant: &'a Merchant,
    pub cart: &'a Cart,
    pub schedule: &'a Schedule,
    pub pickup_address: &'a str,
    pub delivery_address: &'a str,
    pub pricing: &'a PricingParameters,
    pub payment_method: PaymentMethod,
}

impl CheckoutInput {
    /// Checks that everything needed for a booking is present.
    pub(crate) fn validate(&self) -> Result<ValidatedCheckout<'_>, ValidationError> {
        let session = self
            .session
            .as_ref()
            .filter(|session| !session.token.is_blank())
            .ok_or(ValidationError::NotAuthenticated)?;
        let merchant = self
            .merchant
            .as_ref()
            .ok_or(ValidationError::MissingMerchant)?;
        if self.cart.is_empty() {
            return Err(ValidationError::EmptyCart);
        }
        let schedule = self
            .schedule
            .as_ref()
            .ok_or(ValidationError::MissingSchedule)?;
        let pickup_address = non_blank(self.addresses.pickup.as_deref())
            .ok_or(ValidationError::MissingPickupAddress)?;
        let delivery_address = non_blank(self.addresses.delivery.as_deref())
            .ok_or(ValidationError::MissingDeliveryAddress)?;

        Ok(ValidatedCheckout {
            session,
            merchant,
            cart: &self.cart,
            schedule,
            pickup_address,
            delivery_address,
            pricing: &self.pricing,
            payment_method: self.payment_method,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
