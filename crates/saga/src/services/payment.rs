//! Payment service trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{AuthToken, BookingId, OrderNumber, PaymentIntentId};
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// Payload of `POST /payment-intent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentRequest {
    pub booking_id: BookingId,
    pub order_number: OrderNumber,
    /// Order total in minor currency units.
    pub amount: i64,
    pub currency: String,
}

/// Credentials the payment sheet needs.
///
/// Every field is optional on the wire; the saga checks for the ones it needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentIntent {
    #[serde(rename = "paymentIntent")]
    pub client_secret: Option<String>,
    pub ephemeral_key: Option<String>,
    pub customer_id: Option<String>,
    pub payment_intent_id: Option<PaymentIntentId>,
}

/// Payload of `POST /confirm-payment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfirmation {
    pub booking_id: BookingId,
    pub order_number: OrderNumber,
    pub payment_intent_id: Option<PaymentIntentId>,
}

/// Trait for payment intent and confirmation calls.
#[async_trait]
pub trait PaymentService: Send + Sync {
    /// Creates a payment intent for a booking.
    async fn create_payment_intent(
        &self,
        token: &AuthToken,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentIntent, ServiceError>;

    /// Tells the backend the customer completed payment.
    async fn confirm_payment(
        &self,
        token: &AuthToken,
        confirmation: &PaymentConfirmation,
    ) -> Result<(), ServiceError>;
}

#[derive(Debug, Default)]
struct InMemoryPaymentState {
    intents: Vec<PaymentIntentRequest>,
    confirmations: Vec<PaymentConfirmation>,
    next_id: u32,
    fail_intent_with: Option<ServiceError>,
    fail_confirm_with: Option<ServiceError>,
    omit_ephemeral_key: bool,
}

/// In-memory payment service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentService {
    state: Arc<RwLock<InMemoryPaymentState>>,
}

impl InMemoryPaymentService {
    /// Creates a new in-memory payment service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures intent creation to fail with `error`.
    pub fn set_fail_intent_with(&self, error: Option<ServiceError>) {
        self.state.write().unwrap().fail_intent_with = error;
    }

    /// Configures confirmation to fail with `error`.
    pub fn set_fail_confirm_with(&self, error: Option<ServiceError>) {
        self.state.write().unwrap().fail_confirm_with = error;
    }

    /// Leaves the ephemeral key out of created intents.
    pub fn set_omit_ephemeral_key(&self, omit: bool) {
        self.state.write().unwrap().omit_ephemeral_key = omit;
    }

    /// Returns every intent request received, in order.
    pub fn intent_requests(&self) -> Vec<PaymentIntentRequest> {
        self.state.read().unwrap().intents.clone()
    }

    /// Returns every confirmation received, in order.
    pub fn confirmations(&self) -> Vec<PaymentConfirmation> {
        self.state.read().unwrap().confirmations.clone()
    }
}

#[async_trait]
impl PaymentService for InMemoryPaymentService {
    async fn create_payment_intent(
        &self,
        _token: &AuthToken,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentIntent, ServiceError> {
        let mut state = self.state.write().unwrap();
        state.intents.push(request.clone());

        if let Some(err) = state.fail_intent_with.clone() {
            return Err(err);
        }

        state.next_id += 1;
        let id = format!("pi_{:04}", state.next_id);
        Ok(PaymentIntent {
            client_secret: Some(format!("{id}_secret")),
            ephemeral_key: (!state.omit_ephemeral_key).then(|| format!("ek_{:04}", state.next_id)),
            customer_id: Some("cus_0001".to_string()),
            payment_intent_id: Some(PaymentIntentId::new(id)),
        })
    }

    async fn confirm_payment(
        &self,
        _token: &AuthToken,
        confirmation: &PaymentConfirmation,
    ) -> Result<(), ServiceError> {
        let mut state = self.state.write().unwrap();
        state.confirmations.push(confirmation.clone());

        match state.fail_confirm_with.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent_request() -> PaymentIntentRequest {
        PaymentIntentRequest {
            booking_id: BookingId::new("b-1"),
            order_number: OrderNumber::new("DRY-1"),
            amount: 36700,
            currency: "usd".to_string(),
        }
    }

    #[tokio::test]
    async fn test_intent_carries_credentials() {
        let service = InMemoryPaymentService::new();
        let intent = service
            .create_payment_intent(&AuthToken::new("t"), &intent_request())
            .await
            .unwrap();

        assert_eq!(intent.client_secret.as_deref(), Some("pi_0001_secret"));
        assert!(intent.ephemeral_key.is_some());
        assert!(intent.customer_id.is_some());
        assert_eq!(service.intent_requests()[0].amount, 36700);
    }

    #[tokio::test]
    async fn test_omit_ephemeral_key() {
        let service = InMemoryPaymentService::new();
        service.set_omit_ephemeral_key(true);
        let intent = service
            .create_payment_intent(&AuthToken::new("t"), &intent_request())
            .await
            .unwrap();
        assert!(intent.ephemeral_key.is_none());
    }

    #[tokio::test]
    async fn test_confirm_failure() {
        let service = InMemoryPaymentService::new();
        service.set_fail_confirm_with(Some(ServiceError::Timeout));
        let confirmation = PaymentConfirmation {
            booking_id: BookingId::new("b-1"),
            order_number: OrderNumber::new("DRY-1"),
            payment_intent_id: None,
        };

        let result = service
            .confirm_payment(&AuthToken::new("t"), &confirmation)
            .await;
        assert_eq!(result, Err(ServiceError::Timeout));
        assert_eq!(service.confirmations().len(), 1);
    }

    #[test]
    fn test_intent_wire_format() {
        let json = r#"{
            "paymentIntent": "pi_1_secret",
            "ephemeralKey": "ek_1",
            "customerId": "cus_1",
            "paymentIntentId": "pi_1"
        }"#;
        let intent: PaymentIntent = serde_json::from_str(json).unwrap();
        assert_eq!(intent.client_secret.as_deref(), Some("pi_1_secret"));
        assert_eq!(intent.payment_intent_id, Some(PaymentIntentId::new("pi_1")));

        let partial: PaymentIntent = serde_json::from_str(r#"{"paymentIntent": "x"}"#).unwrap();
        assert!(partial.customer_id.is_none());
    }
}
