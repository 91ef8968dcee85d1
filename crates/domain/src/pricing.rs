//! Pricing parameters and order totals.
//!
//! Totals are derived, never stored: they are recomputed from the cart's line
//! items and the session's pricing parameters whenever either changes.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Distance, in kilometres, that every delivery is charged for.
///
/// The delivery charge is not derived from the pickup and delivery addresses.
pub const ASSUMED_DISTANCE_KM: Decimal = Decimal::from_parts(10, 0, 0, false, 0);

/// Delivery charge per kilometre used when no remote value is available.
pub const DEFAULT_DELIVERY_CHARGE_PER_KM: Decimal = Decimal::from_parts(25, 0, 0, false, 0);

/// Proportional service charge applied to the subtotal.
pub const DEFAULT_SERVICE_CHARGE_RATE: Decimal = Decimal::from_parts(15, 0, 0, false, 2);

/// Flat platform fee per order.
pub const DEFAULT_PLATFORM_FEE: Decimal = Decimal::from_parts(2, 0, 0, false, 0);

/// A line that can be priced.
///
/// Either value may be missing when the underlying data is not numeric; such
/// lines are left out of the subtotal.
pub trait PricedLine {
    /// Identifier used in diagnostics.
    fn line_id(&self) -> &str;

    /// Price of a single unit, if numeric.
    fn unit_price(&self) -> Option<Decimal>;

    /// Number of units, if numeric.
    fn quantity(&self) -> Option<Decimal>;
}

/// Global pricing parameters for a checkout session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingParameters {
    /// Charge per kilometre of delivery distance.
    pub delivery_charge_per_km: Decimal,
    /// Fraction of the subtotal charged as service fees.
    pub service_charge_rate: Decimal,
    /// Flat platform fee.
    pub platform_fee: Decimal,
}

impl PricingParameters {
    /// Creates pricing parameters from explicit values.
    pub fn new(
        delivery_charge_per_km: Decimal,
        service_charge_rate: Decimal,
        platform_fee: Decimal,
    ) -> Self {
        Self {
            delivery_charge_per_km,
            service_charge_rate,
            platform_fee,
        }
    }

    /// Default parameters with a different per-kilometre delivery charge.
    pub fn with_delivery_charge_per_km(delivery_charge_per_km: Decimal) -> Self {
        Self {
            delivery_charge_per_km,
            ..Self::default()
        }
    }

    /// Delivery charge for [`ASSUMED_DISTANCE_KM`], or `None` if it overflows.
    pub fn delivery_charge(&self) -> Option<Decimal> {
        self.delivery_charge_per_km.checked_mul(ASSUMED_DISTANCE_KM)
    }
}

impl Default for PricingParameters {
    fn default() -> Self {
        Self {
            delivery_charge_per_km: DEFAULT_DELIVERY_CHARGE_PER_KM,
            service_charge_rate: DEFAULT_SERVICE_CHARGE_RATE,
            platform_fee: DEFAULT_PLATFORM_FEE,
        }
    }
}

/// Monetary breakdown of an order.
///
/// Invariant: `total == subtotal + service_fees + delivery_charge + platform_fee`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub service_fees: Decimal,
    pub delivery_charge: Decimal,
    pub platform_fee: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    /// All-zero totals.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Returns the total in minor currency units (cents), rounded to the
    /// nearest integer with halves rounded away from zero.
    ///
    /// Returns `None` if the amount does not fit in an `i64`.
    pub fn amount_minor_units(&self) -> Option<i64> {
        self.total
            .checked_mul(Decimal::ONE_HUNDRED)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
    }
}

/// Computes order totals from line items and pricing parameters.
///
/// Returns all-zero totals when either input is absent. Lines whose price or
/// quantity is not numeric are skipped and logged. Totals that cannot be
/// represented are logged and reported as zero; use [`checked_totals`] to
/// tell them apart.
pub fn calculate_totals<L: PricedLine>(
    items: Option<&[L]>,
    pricing: Option<&PricingParameters>,
) -> OrderTotals {
    checked_totals(items, pricing).unwrap_or_else(|| {
        tracing::warn!("order totals out of range, reporting zero");
        OrderTotals::zero()
    })
}

/// Like [`calculate_totals`], but returns `None` when the fees, delivery
/// charge or total overflow.
///
/// A line whose own amount overflows, or that would overflow the subtotal, is
/// skipped and logged like a non-numeric line.
pub fn checked_totals<L: PricedLine>(
    items: Option<&[L]>,
    pricing: Option<&PricingParameters>,
) -> Option<OrderTotals> {
    let (Some(items), Some(pricing)) = (items, pricing) else {
        return Some(OrderTotals::zero());
    };

    let mut subtotal = Decimal::ZERO;
    for item in items {
        let (Some(price), Some(quantity)) = (item.unit_price(), item.quantity()) else {
            tracing::warn!(
                line_id = item.line_id(),
                "skipping line item with non-numeric price or quantity"
            );
            continue;
        };
        match price
            .checked_mul(quantity)
            .and_then(|line| subtotal.checked_add(line))
        {
            Some(sum) => subtotal = sum,
            None => tracing::warn!(
                line_id = item.line_id(),
                "skipping line item whose amount is out of range"
            ),
        }
    }

    let service_fees = subtotal.checked_mul(pricing.service_charge_rate)?;
    let delivery_charge = pricing.delivery_charge()?;
    let platform_fee = pricing.platform_fee;
    let total = subtotal
        .checked_add(service_fees)?
        .checked_add(delivery_charge)?
        .checked_add(platform_fee)?;

    Some(OrderTotals {
        subtotal,
        service_fees,
        delivery_charge,
        platform_fee,
        total,
    })
}
