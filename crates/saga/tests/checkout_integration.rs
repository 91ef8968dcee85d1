//! Integration tests for the checkout saga.

use std::time::Duration;

use common::AuthToken;
use domain::{Cart, CartLineItem, PricingParameters, Schedule, ScheduleSlot};
use rust_decimal::Decimal;
use saga::{
    Addresses, CancellationStrategy, CheckoutConfig, CheckoutCoordinator, CheckoutInput,
    CheckoutResult, CheckoutState, FailureKind, InMemoryBookingCanceller, InMemoryBookingService,
    InMemoryPaymentService, InMemoryPricingSource, Merchant, NoticeSeverity, OrderSummary,
    PresentOutcome, PricingResolver, ReadinessScript, RemotePricing, ScriptedPaymentSheet,
    ServiceError, Session, ValidationError,
};

type TestCoordinator = CheckoutCoordinator<
    InMemoryBookingService,
    InMemoryPaymentService,
    ScriptedPaymentSheet,
    InMemoryBookingCanceller,
>;

struct TestHarness {
    coordinator: TestCoordinator,
    bookings: InMemoryBookingService,
    payments: InMemoryPaymentService,
    sheet: ScriptedPaymentSheet,
    canceller: InMemoryBookingCanceller,
}

impl TestHarness {
    fn new() -> Self {
        let bookings = InMemoryBookingService::new();
        let payments = InMemoryPaymentService::new();
        let sheet = ScriptedPaymentSheet::new();
        let canceller = InMemoryBookingCanceller::new();

        let coordinator = CheckoutCoordinator::new(
            bookings.clone(),
            payments.clone(),
            sheet.clone(),
            canceller.clone(),
            CheckoutConfig::default(),
        );

        Self {
            coordinator,
            bookings,
            payments,
            sheet,
            canceller,
        }
    }

    fn input(&self) -> CheckoutInput {
        let mut cart = Cart::new();
        cart.add_item(CartLineItem::new("shirt", "Shirt", "Shirts", 50_i64, 2))
            .unwrap();

        CheckoutInput {
            session: Some(Session::new("user-1", AuthToken::new("token"))),
            merchant: Some(Merchant::new("merchant-1", "Fresh Press")),
            cart,
            schedule: Some(Schedule::new(
                ScheduleSlot::new(12, "Apr", "10:30 AM"),
                ScheduleSlot::new(14, "april", "12:15 PM"),
            )),
            addresses: Addresses::new("1 Main St", "2 Side St"),
            pricing: PricingParameters::new(Decimal::from(25), Decimal::new(15, 2), Decimal::from(2)),
            ..CheckoutInput::default()
        }
    }
}

fn http(status: u16) -> ServiceError {
    ServiceError::Http {
        status,
        message: format!("status {status}"),
    }
}

#[tokio::test]
async fn test_happy_path_pays_for_booking() {
    let h = TestHarness::new();

    let outcome = h.coordinator.handle_payment(&h.input()).await;

    match &outcome.result {
        CheckoutResult::Paid {
            booking_id,
            order_number,
            payment_intent_id,
        } => {
            assert_eq!(booking_id.as_str(), "BKG-0001");
            assert!(order_number.as_str().starts_with("DRY-"));
            assert!(payment_intent_id.is_some());
        }
        other => panic!("unexpected result {other:?}"),
    }
    assert_eq!(outcome.notice.severity, NoticeSeverity::Info);

    let attempt = outcome.attempt.as_ref().unwrap();
    assert_eq!(attempt.state(), CheckoutState::Paid);
    assert!(attempt.tracking_id().unwrap().as_str().starts_with("TRK-"));
    assert_eq!(h.payments.intent_requests()[0].amount, 36700);
    assert_eq!(h.payments.intent_requests()[0].currency, "usd");
    assert_eq!(h.sheet.present_count(), 1);
    assert_eq!(h.canceller.call_count(), 0);
}

#[tokio::test]
async fn test_missing_schedule_never_books() {
    let h = TestHarness::new();
    let mut input = h.input();
    input.schedule = None;

    let outcome = h.coordinator.handle_payment(&input).await;

    assert_eq!(
        outcome.result,
        CheckoutResult::Rejected {
            reason: ValidationError::MissingSchedule
        }
    );
    assert!(outcome.attempt.is_none());
    assert_eq!(outcome.notice.severity, NoticeSeverity::Error);
    assert_eq!(h.bookings.call_count(), 0);
    assert_eq!(h.canceller.call_count(), 0);
}

#[tokio::test]
async fn test_incomplete_schedule_slot_never_books() {
    let h = TestHarness::new();
    let mut input = h.input();
    if let Some(schedule) = input.schedule.as_mut() {
        schedule.delivery.time = None;
    }

    let outcome = h.coordinator.handle_payment(&input).await;

    assert_eq!(
        outcome.result,
        CheckoutResult::Rejected {
            reason: ValidationError::InvalidSchedule
        }
    );
    assert_eq!(h.bookings.call_count(), 0);
}

#[tokio::test]
async fn test_consecutive_attempts_use_distinct_order_numbers() {
    let h = TestHarness::new();
    h.bookings.set_fail_with(Some(http(500)));
    let input = h.input();

    let first = h.coordinator.handle_payment(&input).await;
    let second = h.coordinator.handle_payment(&input).await;

    let first_number = first.order_number().unwrap();
    let second_number = second.order_number().unwrap();
    assert_ne!(first_number, second_number);

    let requests = h.bookings.requests();
    assert_eq!(requests.len(), 2);
    assert_ne!(requests[0].order_number, requests[1].order_number);
    assert_ne!(requests[0].tracking_id, requests[1].tracking_id);
}

#[tokio::test]
async fn test_intent_failure_compensates_exactly_once() {
    let h = TestHarness::new();
    h.payments.set_fail_intent_with(Some(http(500)));

    let outcome = h.coordinator.handle_payment(&h.input()).await;

    match &outcome.result {
        CheckoutResult::Failed {
            kind,
            step,
            compensated,
            ..
        } => {
            assert_eq!(*kind, FailureKind::ServerFault);
            assert_eq!(step, "create_payment_intent");
            assert_eq!(*compensated, Some(true));
        }
        other => panic!("unexpected result {other:?}"),
    }

    let requests = h.canceller.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].booking_id.as_str(), "BKG-0001");
    assert_eq!(requests[0].merchant_id.as_str(), "merchant-1");
    assert_eq!(h.sheet.init_count(), 0);
}

#[tokio::test]
async fn test_booking_failure_never_compensates() {
    for status in [400, 401, 404, 500, 503] {
        let h = TestHarness::new();
        h.bookings.set_fail_with(Some(http(status)));

        let outcome = h.coordinator.handle_payment(&h.input()).await;

        assert!(
            matches!(
                outcome.result,
                CheckoutResult::Failed {
                    compensated: None,
                    ..
                }
            ),
            "status {status}: {:?}",
            outcome.result
        );
        assert_eq!(h.canceller.call_count(), 0, "status {status}");
        assert_eq!(h.payments.intent_requests().len(), 0);
    }
}

#[tokio::test]
async fn test_booking_unauthorized_prompts_login() {
    let h = TestHarness::new();
    h.bookings.set_fail_with(Some(http(401)));

    let outcome = h.coordinator.handle_payment(&h.input()).await;

    assert!(matches!(
        outcome.result,
        CheckoutResult::Failed {
            kind: FailureKind::AuthFault,
            ..
        }
    ));
    assert_eq!(outcome.notice.severity, NoticeSeverity::Error);
    assert!(
        outcome
            .notice
            .message
            .contains("Authentication failed. Please log in again.")
    );
    assert!(outcome.notice.message.contains("create_booking"));
    let order_number = outcome.order_number().unwrap().as_str().to_string();
    assert!(outcome.notice.message.contains(&order_number));
    assert_eq!(h.canceller.call_count(), 0);
}

#[tokio::test]
async fn test_booking_server_error_message() {
    let h = TestHarness::new();
    h.bookings.set_fail_with(Some(http(500)));

    let outcome = h.coordinator.handle_payment(&h.input()).await;

    assert!(outcome.notice.message.contains("creating your booking"));
}

#[tokio::test]
async fn test_booking_payload_error_message() {
    let h = TestHarness::new();
    h.bookings.set_fail_with(Some(http(400)));

    let outcome = h.coordinator.handle_payment(&h.input()).await;

    assert!(matches!(
        outcome.result,
        CheckoutResult::Failed {
            kind: FailureKind::PayloadFault,
            ..
        }
    ));
    assert!(outcome.notice.message.contains("check your details"));
}

#[tokio::test]
async fn test_transport_timeout_is_generic() {
    let h = TestHarness::new();
    h.bookings.set_fail_with(Some(ServiceError::Timeout));

    let outcome = h.coordinator.handle_payment(&h.input()).await;

    assert!(matches!(
        outcome.result,
        CheckoutResult::Failed {
            kind: FailureKind::Generic,
            ..
        }
    ));
    assert!(outcome.notice.message.contains("Payment failed. Please try again."));
}

#[tokio::test]
async fn test_user_cancel_compensates_with_reason() {
    let h = TestHarness::new();
    h.sheet.set_outcome(PresentOutcome::Canceled);

    let outcome = h.coordinator.handle_payment(&h.input()).await;

    assert_eq!(
        outcome.result,
        CheckoutResult::Cancelled { compensated: true }
    );
    assert_eq!(outcome.notice.severity, NoticeSeverity::Info);
    assert_eq!(outcome.notice.title, "Payment Cancelled");

    let requests = h.canceller.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].reason, "Payment cancelled by user");
    assert!(h.payments.confirmations().is_empty());

    let attempt = outcome.attempt.unwrap();
    assert_eq!(attempt.state(), CheckoutState::PaymentCancelled);
    assert_eq!(
        attempt.compensated_by(),
        Some(CancellationStrategy::CancelBooking)
    );
}

#[tokio::test]
async fn test_cancel_falls_through_strategies() {
    let h = TestHarness::new();
    h.sheet.set_outcome(PresentOutcome::Canceled);
    h.canceller.fail_strategy(CancellationStrategy::CancelBooking);
    h.canceller.fail_strategy(CancellationStrategy::PatchStatus);
    h.canceller.fail_strategy(CancellationStrategy::PutBooking);

    let outcome = h.coordinator.handle_payment(&h.input()).await;

    assert_eq!(
        outcome.result,
        CheckoutResult::Cancelled { compensated: true }
    );
    let attempt = outcome.attempt.unwrap();
    assert_eq!(attempt.compensated_by(), Some(CancellationStrategy::PostStatus));
    assert_eq!(
        attempt
            .event_types()
            .iter()
            .filter(|t| **t == "CompensationStrategyFailed")
            .count(),
        3
    );
}

#[tokio::test(start_paused = true)]
async fn test_sheet_never_ready_times_out_and_compensates() {
    let h = TestHarness::new();
    h.sheet.set_readiness(ReadinessScript::Never);

    let started = tokio::time::Instant::now();
    let outcome = h.coordinator.handle_payment(&h.input()).await;

    assert!(matches!(
        outcome.result,
        CheckoutResult::Failed {
            kind: FailureKind::ReadinessTimeout,
            compensated: Some(true),
            ..
        }
    ));
    assert!(started.elapsed() >= Duration::from_secs(3));
    assert_eq!(h.sheet.present_count(), 0);
    assert_eq!(h.canceller.call_count(), 1);
    assert!(!outcome.attempt.unwrap().payment_ready());
}

#[tokio::test(start_paused = true)]
async fn test_sheet_ready_after_grace_period() {
    let h = TestHarness::new();
    h.sheet
        .set_readiness(ReadinessScript::After(Duration::from_millis(1800)));

    let outcome = h.coordinator.handle_payment(&h.input()).await;

    assert!(outcome.result.is_paid(), "{:?}", outcome.result);
    assert_eq!(h.sheet.present_count(), 1);
}

#[tokio::test]
async fn test_coordinator_reusable_after_failure() {
    let h = TestHarness::new();
    h.payments.set_fail_intent_with(Some(http(503)));
    let input = h.input();

    let failed = h.coordinator.handle_payment(&input).await;
    assert!(failed.result.is_error());
    assert!(!h.coordinator.is_busy());

    h.payments.set_fail_intent_with(None);
    let paid = h.coordinator.handle_payment(&input).await;
    assert!(paid.result.is_paid());
}

#[tokio::test]
async fn test_summary_then_checkout() {
    let h = TestHarness::new();
    let resolver = PricingResolver::new(InMemoryPricingSource::new(RemotePricing {
        price_per_km: Some(Decimal::from(25)),
        service_charge: Some(Decimal::new(50, 2)),
        platform_fee: Some(Decimal::from(10)),
    }));
    let token = AuthToken::new("token");
    let mut input = h.input();

    let summary = OrderSummary::prepare(&resolver, Some(&token), &input.cart).await;
    assert_eq!(summary.totals.subtotal, Decimal::from(100));
    assert_eq!(summary.totals.service_fees, Decimal::from(15));
    assert_eq!(summary.totals.delivery_charge, Decimal::from(250));
    assert_eq!(summary.totals.platform_fee, Decimal::from(2));
    assert_eq!(summary.totals.total, Decimal::from(367));

    input.pricing = summary.pricing;
    let outcome = h.coordinator.handle_payment(&input).await;

    assert!(outcome.result.is_paid());
    assert_ne!(
        outcome.order_number(),
        Some(&summary.display_order_number)
    );
    assert_eq!(h.bookings.last_request().unwrap().totals, summary.totals);
}
