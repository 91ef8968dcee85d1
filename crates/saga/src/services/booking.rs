//! Booking service trait and in-memory implementation.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use common::{AuthToken, BookingId, MerchantId, OrderNumber, TrackingId, UserId};
use domain::{Amount, CartLineItem, ItemId, ItemOptions, OrderTotals, PricedLine};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::checkout::PaymentMethod;
use crate::error::ServiceError;

/// A cart line as sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingLine {
    pub item_id: ItemId,
    pub name: String,
    pub category: String,
    pub price: Amount,
    pub quantity: u32,
    pub options: ItemOptions,
}

impl From<&CartLineItem> for BookingLine {
    fn from(item: &CartLineItem) -> Self {
        Self {
            item_id: item.id.clone(),
            name: item.name.clone(),
            category: item.category.clone(),
            price: item.price.clone(),
            quantity: item.quantity,
            options: item.options.clone(),
        }
    }
}

impl PricedLine for BookingLine {
    fn line_id(&self) -> &str {
        self.item_id.as_str()
    }

    fn unit_price(&self) -> Option<Decimal> {
        self.price.value()
    }

    fn quantity(&self) -> Option<Decimal> {
        Some(Decimal::from(self.quantity))
    }
}

/// Payload of `POST /bookings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub user_id: UserId,
    pub merchant_id: MerchantId,
    pub order_number: OrderNumber,
    pub tracking_id: TrackingId,
    pub pickup_address: String,
    pub delivery_address: String,
    pub items: Vec<BookingLine>,
    pub totals: OrderTotals,
    pub pickup_date_time: NaiveDateTime,
    pub delivery_date_time: NaiveDateTime,
    pub payment_method: PaymentMethod,
}

/// The backend's acknowledgement of a created booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingReceipt {
    /// Server-assigned booking identifier.
    pub booking_id: BookingId,
    /// Order number echoed by the server.
    pub order_number: Option<OrderNumber>,
}

/// Creates bookings on the backend.
#[async_trait]
pub trait BookingService: Send + Sync {
    /// Creates a booking and returns its server-assigned identifier.
    async fn create_booking(
        &self,
        token: &AuthToken,
        request: &BookingRequest,
    ) -> Result<BookingReceipt, ServiceError>;
}

#[derive(Debug, Default)]
struct InMemoryBookingState {
    requests: Vec<BookingRequest>,
    next_id: u32,
    fail_with: Option<ServiceError>,
}

/// In-memory booking service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBookingService {
    state: Arc<RwLock<InMemoryBookingState>>,
}

impl InMemoryBookingService {
    /// Creates a new in-memory booking service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures every subsequent call to fail with `error`.
    pub fn set_fail_with(&self, error: Option<ServiceError>) {
        self.state.write().unwrap().fail_with = error;
    }

    /// Returns the number of create calls received, failed ones included.
    pub fn call_count(&self) -> usize {
        self.state.read().unwrap().requests.len()
    }

    /// Returns every request received, in order.
    pub fn requests(&self) -> Vec<BookingRequest> {
        self.state.read().unwrap().requests.clone()
    }

    /// Returns the most recent request.
    pub fn last_request(&self) -> Option<BookingRequest> {
        self.state.read().unwrap().requests.last().cloned()
    }
}

#[async_trait]
impl BookingService for InMemoryBookingService {
    async fn create_booking(
        &self,
        _token: &AuthToken,
        request: &BookingRequest,
    ) -> Result<BookingReceipt, ServiceError> {
        let mut state = self.state.write().unwrap();
        state.requests.push(request.clone());

        if let Some(err) = state.fail_with.clone() {
            return Err(err);
        }

        state.next_id += 1;
        Ok(BookingReceipt {
            booking_id: BookingId::new(format!("BKG-{:04}", state.next_id)),
            order_number: Some(request.order_number.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{PricingParameters, calculate_totals};

    fn request(order_number: &str) -> BookingRequest {
        let item = CartLineItem::new("shirt", "Shirt", "Shirts", 50_i64, 2);
        let items = vec![BookingLine::from(&item)];
        let totals = calculate_totals(Some(&items[..]), Some(&PricingParameters::default()));
        let at = chrono::NaiveDate::from_ymd_opt(2026, 6, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        BookingRequest {
            user_id: UserId::new("u-1"),
            merchant_id: MerchantId::new("m-1"),
            order_number: OrderNumber::new(order_number),
            tracking_id: TrackingId::generate(),
            pickup_address: "1 Main St".to_string(),
            delivery_address: "2 Side St".to_string(),
            items,
            totals,
            pickup_date_time: at,
            delivery_date_time: at,
            payment_method: PaymentMethod::Card,
        }
    }

    #[tokio::test]
    async fn test_sequential_booking_ids() {
        let service = InMemoryBookingService::new();
        let token = AuthToken::new("t");

        let r1 = service.create_booking(&token, &request("DRY-1")).await.unwrap();
        let r2 = service.create_booking(&token, &request("DRY-2")).await.unwrap();

        assert_eq!(r1.booking_id.as_str(), "BKG-0001");
        assert_eq!(r2.booking_id.as_str(), "BKG-0002");
        assert_eq!(r2.order_number, Some(OrderNumber::new("DRY-2")));
        assert_eq!(service.call_count(), 2);
    }

    #[tokio::test]
    async fn test_fail_with() {
        let service = InMemoryBookingService::new();
        service.set_fail_with(Some(ServiceError::Http {
            status: 401,
            message: "unauthorized".to_string(),
        }));

        let err = service
            .create_booking(&AuthToken::new("t"), &request("DRY-1"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert_eq!(service.call_count(), 1);
    }

    #[test]
    fn test_booking_line_prices_like_cart_line() {
        let item = CartLineItem::new("shirt", "Shirt", "Shirts", "4.50", 2);
        let line = BookingLine::from(&item);
        assert_eq!(line.unit_price(), item.unit_price());
        assert_eq!(line.line_id(), "shirt");
    }

    #[test]
    fn test_request_wire_format() {
        let json = serde_json::to_value(request("DRY-1")).unwrap();
        assert_eq!(json["orderNumber"], "DRY-1");
        assert_eq!(json["paymentMethod"], "card");
        assert_eq!(json["items"][0]["itemId"], "shirt");
        assert!(json["totals"]["total"].is_string() || json["totals"]["total"].is_number());
    }
}
