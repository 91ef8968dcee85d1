//! reqwest-based implementation of the checkout collaborators.

use async_trait::async_trait;
use common::{AuthToken, BookingId, OrderNumber};
use reqwest::{Client, Method, RequestBuilder};
use saga::{
    BookingCanceller, BookingReceipt, BookingRequest, BookingService, CancellationRequest,
    CancellationStrategy, PaymentConfirmation, PaymentIntent, PaymentIntentRequest,
    PaymentService, PricingSource, RemotePricing, ServiceError,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::config::BackendConfig;
use crate::error::{BackendError, status_error, transport_error};

/// Status written by the status-update cancellation shapes.
const CANCELLED_STATUS: &str = "cancelled";

/// Standard response wrapper: `{success, data, message}`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookingData {
    #[serde(rename = "_id")]
    id: BookingId,
    order_number: Option<OrderNumber>,
}

/// One cancellation request shape.
#[derive(Debug, Clone, PartialEq)]
pub struct CancellationCall {
    pub method: Method,
    pub path: String,
    pub body: Value,
}

impl CancellationCall {
    /// Builds the request shape used by `strategy`.
    pub fn for_strategy(strategy: CancellationStrategy, request: &CancellationRequest) -> Self {
        let booking = format!(
            "merchants/{}/bookings/{}",
            request.merchant_id, request.booking_id
        );
        let (method, path, body) = match strategy {
            CancellationStrategy::CancelBooking => (
                Method::POST,
                format!("{booking}/cancel"),
                json!({
                    "reason": request.reason,
                    "orderNumber": request.order_number,
                }),
            ),
            CancellationStrategy::PatchStatus => (
                Method::PATCH,
                format!("{booking}/status"),
                json!({
                    "status": CANCELLED_STATUS,
                    "reason": request.reason,
                    "orderNumber": request.order_number,
                }),
            ),
            CancellationStrategy::PutBooking => (
                Method::PUT,
                booking,
                json!({
                    "status": CANCELLED_STATUS,
                    "cancellationReason": request.reason,
                    "orderNumber": request.order_number,
                }),
            ),
            CancellationStrategy::PostStatus => (
                Method::POST,
                format!("{booking}/status"),
                json!({
                    "status": CANCELLED_STATUS,
                    "reason": request.reason,
                }),
            ),
            CancellationStrategy::SimpleStatus => (
                Method::PATCH,
                booking,
                json!({ "status": CANCELLED_STATUS }),
            ),
        };
        Self { method, path, body }
    }
}

/// HTTP client for the booking backend.
///
/// Implements every collaborator the checkout saga needs. All requests carry
/// the session's bearer token and the configured timeout.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    config: BackendConfig,
    http: Client,
}

impl HttpBackend {
    /// Creates a client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not http(s) or the client cannot
    /// be built.
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        if !(config.base_url.starts_with("http://") || config.base_url.starts_with("https://")) {
            return Err(BackendError::InvalidBaseUrl(config.base_url));
        }
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self { config, http })
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn request(&self, method: Method, path: &str, token: &AuthToken) -> RequestBuilder {
        tracing::debug!(%method, path, "backend request");
        self.http
            .request(method, self.config.url(path))
            .bearer_auth(token.expose())
    }

    /// Sends a request and unwraps the standard response envelope.
    async fn call<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>, ServiceError> {
        let response = request.send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status, &text));
        }

        let envelope: Envelope<T> = response.json().await.map_err(transport_error)?;
        if !envelope.success {
            return Err(ServiceError::Rejected(
                envelope
                    .message
                    .unwrap_or_else(|| "backend reported success: false".to_string()),
            ));
        }
        Ok(envelope.data)
    }

    /// Like [`call`](Self::call) but requires a `data` payload.
    async fn call_for_data<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ServiceError> {
        self.call(request)
            .await?
            .ok_or_else(|| ServiceError::Malformed("response has no data".to_string()))
    }
}

#[async_trait]
impl PricingSource for HttpBackend {
    async fn fetch_pricing(&self, token: &AuthToken) -> Result<RemotePricing, ServiceError> {
        self.call_for_data(self.request(Method::GET, "pricing", token))
            .await
    }
}

#[async_trait]
impl BookingService for HttpBackend {
    async fn create_booking(
        &self,
        token: &AuthToken,
        request: &BookingRequest,
    ) -> Result<BookingReceipt, ServiceError> {
        let data: BookingData = self
            .call_for_data(self.request(Method::POST, "bookings", token).json(request))
            .await?;
        Ok(BookingReceipt {
            booking_id: data.id,
            order_number: data.order_number,
        })
    }
}

#[async_trait]
impl PaymentService for HttpBackend {
    async fn create_payment_intent(
        &self,
        token: &AuthToken,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentIntent, ServiceError> {
        self.call_for_data(
            self.request(Method::POST, "payment-intent", token)
                .json(request),
        )
        .await
    }

    async fn confirm_payment(
        &self,
        token: &AuthToken,
        confirmation: &PaymentConfirmation,
    ) -> Result<(), ServiceError> {
        self.call::<Value>(
            self.request(Method::POST, "confirm-payment", token)
                .json(confirmation),
        )
        .await
        .map(|_| ())
    }
}

#[async_trait]
impl BookingCanceller for HttpBackend {
    async fn cancel_with(
        &self,
        token: &AuthToken,
        strategy: CancellationStrategy,
        request: &CancellationRequest,
    ) -> Result<(), ServiceError> {
        let call = CancellationCall::for_strategy(strategy, request);
        let response = self
            .request(call.method, &call.path, token)
            .json(&call.body)
            .send()
            .await
            .map_err(transport_error)?;

        // Cancellation endpoints differ in their bodies; any 2xx counts.
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(status_error(status, &text))
        }
    }
}
