//! Remote pricing lookup with local defaults.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::AuthToken;
use domain::PricingParameters;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// Pricing as returned by `GET /pricing`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemotePricing {
    pub price_per_km: Option<Decimal>,
    pub service_charge: Option<Decimal>,
    pub platform_fee: Option<Decimal>,
}

/// Source of remote pricing.
#[async_trait]
pub trait PricingSource: Send + Sync {
    /// Fetches the current pricing configuration.
    async fn fetch_pricing(&self, token: &AuthToken) -> Result<RemotePricing, ServiceError>;
}

/// Resolves the pricing parameters for a checkout session.
///
/// Never fails: anything short of a usable remote `pricePerKm` yields
/// [`PricingParameters::default`]. Only the per-kilometre charge is taken from
/// the server; the service charge rate and platform fee stay at their defaults
/// even when the server sends them.
#[derive(Debug, Clone)]
pub struct PricingResolver<P: PricingSource> {
    source: P,
}

impl<P: PricingSource> PricingResolver<P> {
    /// Creates a resolver over a pricing source.
    pub fn new(source: P) -> Self {
        Self { source }
    }

    /// Resolves pricing, falling back to defaults.
    #[tracing::instrument(skip_all)]
    pub async fn resolve(&self, token: Option<&AuthToken>) -> PricingParameters {
        let Some(token) = token.filter(|token| !token.is_blank()) else {
            tracing::debug!("no session, using default pricing");
            return PricingParameters::default();
        };

        match self.source.fetch_pricing(token).await {
            Ok(remote) => match remote.price_per_km {
                Some(price_per_km)
                    if price_per_km > Decimal::ZERO
                        && PricingParameters::with_delivery_charge_per_km(price_per_km)
                            .delivery_charge()
                            .is_some() =>
                {
                    tracing::debug!(
                        %price_per_km,
                        service_charge = ?remote.service_charge,
                        platform_fee = ?remote.platform_fee,
                        "remote pricing resolved, service charge and platform fee not applied"
                    );
                    PricingParameters::with_delivery_charge_per_km(price_per_km)
                }
                other => {
                    tracing::warn!(price_per_km = ?other, "unusable remote pricing, using defaults");
                    PricingParameters::default()
                }
            },
            Err(err) => {
                tracing::warn!(error = %err, "pricing fetch failed, using defaults");
                PricingParameters::default()
            }
        }
    }
}

#[derive(Debug)]
struct InMemoryPricingState {
    response: Result<RemotePricing, ServiceError>,
    calls: usize,
}

/// In-memory pricing source for testing.
#[derive(Debug, Clone)]
pub struct InMemoryPricingSource {
    state: Arc<RwLock<InMemoryPricingState>>,
}

impl InMemoryPricingSource {
    /// Creates a source that answers with `pricing`.
    pub fn new(pricing: RemotePricing) -> Self {
        Self::with_response(Ok(pricing))
    }

    /// Creates a source that answers with `response`.
    pub fn with_response(response: Result<RemotePricing, ServiceError>) -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryPricingState { response, calls: 0 })),
        }
    }

    /// Returns the number of fetches.
    pub fn call_count(&self) -> usize {
        self.state.read().unwrap().calls
    }
}

#[async_trait]
impl PricingSource for InMemoryPricingSource {
    async fn fetch_pricing(&self, _token: &AuthToken) -> Result<RemotePricing, ServiceError> {
        let mut state = self.state.write().unwrap();
        state.calls += 1;
        state.response.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(price_per_km: i64) -> RemotePricing {
        RemotePricing {
            price_per_km: Some(Decimal::from(price_per_km)),
            service_charge: Some(Decimal::new(30, 2)),
            platform_fee: Some(Decimal::from(9)),
        }
    }

    #[tokio::test]
    async fn test_no_token_uses_defaults_without_fetching() {
        let source = InMemoryPricingSource::new(remote(40));
        let resolver = PricingResolver::new(source.clone());

        assert_eq!(resolver.resolve(None).await, PricingParameters::default());
        assert_eq!(
            resolver.resolve(Some(&AuthToken::new("  "))).await,
            PricingParameters::default()
        );
        assert_eq!(source.call_count(), 0);
    }

    #[tokio::test]
    async fn test_only_price_per_km_is_applied() {
        let source = InMemoryPricingSource::new(remote(40));
        let resolver = PricingResolver::new(source.clone());

        let pricing = resolver.resolve(Some(&AuthToken::new("t"))).await;

        assert_eq!(pricing.delivery_charge_per_km, Decimal::from(40));
        assert_eq!(pricing.service_charge_rate, Decimal::new(15, 2));
        assert_eq!(pricing.platform_fee, Decimal::from(2));
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_defaults() {
        let source = InMemoryPricingSource::with_response(Err(ServiceError::Http {
            status: 503,
            message: "unavailable".to_string(),
        }));
        let resolver = PricingResolver::new(source);

        assert_eq!(
            resolver.resolve(Some(&AuthToken::new("t"))).await,
            PricingParameters::default()
        );
    }

    #[tokio::test]
    async fn test_unusable_price_falls_back_to_defaults() {
        let out_of_range = RemotePricing {
            price_per_km: Some(Decimal::MAX),
            ..RemotePricing::default()
        };
        for pricing in [RemotePricing::default(), remote(0), remote(-5), out_of_range] {
            let resolver = PricingResolver::new(InMemoryPricingSource::new(pricing));
            assert_eq!(
                resolver.resolve(Some(&AuthToken::new("t"))).await,
                PricingParameters::default()
            );
        }
    }
}
