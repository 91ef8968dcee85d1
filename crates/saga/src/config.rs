//! Checkout configuration.

use std::time::Duration;

use crate::compensation::DEFAULT_ATTEMPT_TIMEOUT;

/// Tunables of the checkout coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutConfig {
    /// ISO currency code sent with payment intents.
    pub currency: String,
    /// First wait for the payment sheet's readiness signal.
    pub readiness_grace: Duration,
    /// Second, final wait for the readiness signal.
    pub readiness_extension: Duration,
    /// Bound on each cancellation request.
    pub compensation_timeout: Duration,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            currency: "usd".to_string(),
            readiness_grace: Duration::from_secs(1),
            readiness_extension: Duration::from_secs(2),
            compensation_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }
}

impl CheckoutConfig {
    /// Sets the payment currency.
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into().to_lowercase();
        self
    }

    /// Total time the coordinator waits for the payment sheet.
    pub fn readiness_budget(&self) -> Duration {
        self.readiness_grace + self.readiness_extension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CheckoutConfig::default();
        assert_eq!(config.currency, "usd");
        assert_eq!(config.readiness_grace, Duration::from_secs(1));
        assert_eq!(config.readiness_extension, Duration::from_secs(2));
        assert_eq!(config.compensation_timeout, Duration::from_secs(5));
        assert_eq!(config.readiness_budget(), Duration::from_secs(3));
    }

    #[test]
    fn test_currency_is_lowercased() {
        let config = CheckoutConfig::default().with_currency("EUR");
        assert_eq!(config.currency, "eur");
    }
}
