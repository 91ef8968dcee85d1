//! Order summary shown before the customer pays.

use common::{AuthToken, OrderNumber};
use domain::{Cart, OrderTotals, PricingParameters};
use serde::Serialize;

use crate::services::pricing::{PricingResolver, PricingSource};

/// Pricing, totals and a provisional order number for the checkout screen.
///
/// The display order number is informational: every payment attempt generates
/// its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub display_order_number: OrderNumber,
    pub pricing: PricingParameters,
    pub totals: OrderTotals,
}

impl OrderSummary {
    /// Resolves pricing for the session and prices the cart.
    pub async fn prepare<P: PricingSource>(
        resolver: &PricingResolver<P>,
        token: Option<&AuthToken>,
        cart: &Cart,
    ) -> Self {
        let pricing = resolver.resolve(token).await;
        Self {
            display_order_number: OrderNumber::generate(),
            pricing,
            totals: cart.totals(Some(&pricing)),
        }
    }

    /// Recomputes totals after the cart changed.
    pub fn refresh(&mut self, cart: &Cart) {
        self.totals = cart.totals(Some(&self.pricing));
    }
}

#[cfg(test)]
mod tests {
    use domain::{CartLineItem, ItemId};
    use rust_decimal::Decimal;

    use super::*;
    use crate::services::pricing::{InMemoryPricingSource, RemotePricing};

    fn cart() -> Cart {
        let mut cart = Cart::new();
        cart.add_item(CartLineItem::new("shirt", "Shirt", "Shirts", 50_i64, 2))
            .unwrap();
        cart
    }

    #[tokio::test]
    async fn test_prepare_with_defaults() {
        let resolver = PricingResolver::new(InMemoryPricingSource::new(RemotePricing::default()));

        let summary = OrderSummary::prepare(&resolver, None, &cart()).await;

        assert_eq!(summary.pricing, PricingParameters::default());
        assert_eq!(summary.totals.total, Decimal::from(367));
        assert!(summary.display_order_number.as_str().starts_with("DRY-"));
    }

    #[tokio::test]
    async fn test_prepare_with_remote_rate_and_refresh() {
        let source = InMemoryPricingSource::new(RemotePricing {
            price_per_km: Some(Decimal::from(30)),
            ..RemotePricing::default()
        });
        let resolver = PricingResolver::new(source);
        let mut cart = cart();

        let mut summary =
            OrderSummary::prepare(&resolver, Some(&AuthToken::new("t")), &cart).await;
        assert_eq!(summary.totals.delivery_charge, Decimal::from(300));

        cart.increment(&ItemId::new("shirt")).unwrap();
        summary.refresh(&cart);
        assert_eq!(summary.totals.subtotal, Decimal::from(150));
    }

    #[tokio::test]
    async fn test_prepare_survives_out_of_range_inputs() {
        let source = InMemoryPricingSource::new(RemotePricing {
            price_per_km: Some(Decimal::MAX),
            ..RemotePricing::default()
        });
        let resolver = PricingResolver::new(source);
        let mut cart = cart();
        cart.add_item(CartLineItem::new(
            "gown",
            "Gown",
            "Formal",
            "70000000000000000000000000000",
            1,
        ))
        .unwrap();

        let summary = OrderSummary::prepare(&resolver, Some(&AuthToken::new("t")), &cart).await;

        assert_eq!(summary.pricing, PricingParameters::default());
        assert_eq!(summary.totals, OrderTotals::zero());
    }
}
