//! Drives a checkout from a draft with the terminal payment sheet.

use cli::{Config, TerminalPaymentSheet, parse_draft, with_session};
use saga::{
    CancellationStrategy, CheckoutCoordinator, CheckoutResult, InMemoryBookingCanceller,
    InMemoryBookingService, InMemoryPaymentService, ValidationError,
};

const DRAFT: &str = r#"{
    "merchant": {"id": "m1", "name": "Fresh Press"},
    "cart": [
        {"id": "shirt", "name": "Shirt", "category": "Shirts", "price": 50, "quantity": 2}
    ],
    "schedule": {
        "pickup": {"day": 5, "month": "May", "time": "8:00 AM"},
        "delivery": {"day": 6, "month": "May", "time": "6:00 PM"}
    },
    "addresses": {"pickup": "1 Main St", "delivery": "2 Side St"}
}"#;

fn config() -> Config {
    Config {
        token: Some("tok".to_string()),
        user_id: Some("user-1".to_string()),
        ..Config::default()
    }
}

struct Harness {
    coordinator: CheckoutCoordinator<
        InMemoryBookingService,
        InMemoryPaymentService,
        TerminalPaymentSheet<&'static [u8]>,
        InMemoryBookingCanceller,
    >,
    bookings: InMemoryBookingService,
    canceller: InMemoryBookingCanceller,
}

impl Harness {
    fn with_answer(answer: &'static str) -> Self {
        let bookings = InMemoryBookingService::new();
        let canceller = InMemoryBookingCanceller::new();
        let coordinator = CheckoutCoordinator::new(
            bookings.clone(),
            InMemoryPaymentService::new(),
            TerminalPaymentSheet::new(answer.as_bytes()),
            canceller.clone(),
            config().checkout_config(),
        );
        Self {
            coordinator,
            bookings,
            canceller,
        }
    }
}

#[tokio::test]
async fn test_operator_approves_payment() {
    let harness = Harness::with_answer("y\n");
    let input = with_session(parse_draft(DRAFT).unwrap(), config().session());

    let outcome = harness.coordinator.handle_payment(&input).await;

    assert!(outcome.result.is_paid());
    assert_eq!(harness.bookings.call_count(), 1);
    assert_eq!(harness.canceller.call_count(), 0);
}

#[tokio::test]
async fn test_operator_cancels_payment() {
    let harness = Harness::with_answer("n\n");
    let input = with_session(parse_draft(DRAFT).unwrap(), config().session());

    let outcome = harness.coordinator.handle_payment(&input).await;

    assert_eq!(outcome.result, CheckoutResult::Cancelled { compensated: true });
    assert_eq!(
        harness.canceller.strategies_tried(),
        vec![CancellationStrategy::CancelBooking]
    );
    assert!(!outcome.notice.is_error());
}

#[tokio::test]
async fn test_draft_without_session_is_rejected() {
    let harness = Harness::with_answer("y\n");
    let input = with_session(parse_draft(DRAFT).unwrap(), Config::default().session());

    let outcome = harness.coordinator.handle_payment(&input).await;

    assert_eq!(
        outcome.result,
        CheckoutResult::Rejected {
            reason: ValidationError::NotAuthenticated
        }
    );
    assert_eq!(harness.bookings.call_count(), 0);
}
