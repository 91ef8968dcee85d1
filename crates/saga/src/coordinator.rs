//! Checkout coordinator: drives one attempt from "Pay" to a terminal state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use chrono::{Datelike, Utc};
use common::{AuthToken, BookingId, OrderNumber, PaymentIntentId, TrackingId};
use domain::checked_totals;

use crate::attempt::CheckoutAttempt;
use crate::checkout::{
    CheckoutInput, REASON_CANCELLED_BY_USER, SAGA_TYPE, STEP_BUILD_REQUEST, STEP_CONFIRM_PAYMENT,
    STEP_CREATE_BOOKING, STEP_CREATE_PAYMENT_INTENT, STEP_INIT_PAYMENT_SHEET,
    STEP_PRESENT_PAYMENT_SHEET, ValidatedCheckout,
};
use crate::compensation::{CancellationRequest, CompensationCoordinator};
use crate::config::CheckoutConfig;
use crate::error::{SagaError, ValidationError};
use crate::events::CheckoutEvent;
use crate::outcome::{CheckoutOutcome, CheckoutResult, UserNotice};
use crate::services::booking::{BookingLine, BookingRequest, BookingService};
use crate::services::cancellation::BookingCanceller;
use crate::services::payment::{PaymentConfirmation, PaymentIntentRequest, PaymentService};
use crate::services::payment_sheet::{
    PaymentSheet, PaymentSheetConfig, PresentOutcome, ReadinessWait,
};
use crate::state::CheckoutState;

/// How an attempt that did not fail ended.
enum Settled {
    Paid {
        booking_id: BookingId,
        payment_intent_id: Option<PaymentIntentId>,
    },
    Cancelled,
}

/// A step failure, tagged with the step that produced it.
struct StepFailure {
    step: &'static str,
    error: SagaError,
}

impl StepFailure {
    fn at(step: &'static str) -> impl FnOnce(SagaError) -> StepFailure {
        move |error| StepFailure { step, error }
    }
}

/// Clears the coordinator's busy flag when an attempt ends.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Orchestrates checkout attempts.
///
/// Steps run strictly in sequence: build request, create booking, create
/// payment intent, initialize the payment sheet, present it, confirm the
/// payment. Once a booking exists, any failure or cancellation cancels it
/// through the [`CompensationCoordinator`]. Only one attempt runs at a time.
pub struct CheckoutCoordinator<B, P, S, C>
where
    B: BookingService,
    P: PaymentService,
    S: PaymentSheet,
    C: BookingCanceller,
{
    bookings: B,
    payments: P,
    sheet: S,
    compensation: CompensationCoordinator<C>,
    config: CheckoutConfig,
    busy: AtomicBool,
}

impl<B, P, S, C> CheckoutCoordinator<B, P, S, C>
where
    B: BookingService,
    P: PaymentService,
    S: PaymentSheet,
    C: BookingCanceller,
{
    /// Creates a new checkout coordinator.
    pub fn new(bookings: B, payments: P, sheet: S, canceller: C, config: CheckoutConfig) -> Self {
        let compensation =
            CompensationCoordinator::with_timeout(canceller, config.compensation_timeout);
        Self {
            bookings,
            payments,
            sheet,
            compensation,
            config,
            busy: AtomicBool::new(false),
        }
    }

    /// Returns the coordinator configuration.
    pub fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    /// Returns true while an attempt is running.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Runs one checkout attempt.
    ///
    /// Never fails: every error is classified and reported in the returned
    /// [`CheckoutOutcome`]. A call made while another attempt is running
    /// returns [`CheckoutResult::Busy`] without side effects.
    #[tracing::instrument(
        skip_all,
        fields(saga_type = SAGA_TYPE, order_number = tracing::field::Empty)
    )]
    pub async fn handle_payment(&self, input: &CheckoutInput) -> CheckoutOutcome {
        let Some(_guard) = self.try_acquire() else {
            tracing::warn!("checkout already in progress");
            return CheckoutOutcome::without_attempt(CheckoutResult::Busy, UserNotice::busy());
        };

        let checkout = match input.validate() {
            Ok(checkout) => checkout,
            Err(reason) => {
                tracing::info!(%reason, "checkout rejected");
                return CheckoutOutcome::without_attempt(
                    CheckoutResult::Rejected { reason },
                    UserNotice::rejected(reason),
                );
            }
        };

        metrics::counter!("checkout_attempts_total").increment(1);
        let started = Instant::now();

        let order_number = OrderNumber::generate();
        let tracking_id = TrackingId::generate();
        let mut attempt = CheckoutAttempt::start(order_number.clone(), tracking_id.clone());
        tracing::Span::current().record("order_number", order_number.as_str());

        let run = self
            .run(&checkout, &mut attempt, &order_number, &tracking_id)
            .await;
        let (result, notice) = self
            .settle(&checkout, &mut attempt, &order_number, run)
            .await;

        attempt.record(CheckoutEvent::ReadinessReset);
        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());

        CheckoutOutcome {
            result,
            attempt: Some(attempt),
            notice,
        }
    }

    fn try_acquire(&self) -> Option<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| BusyGuard(&self.busy))
    }

    /// Executes the steps until the attempt is paid, cancelled or fails.
    async fn run(
        &self,
        checkout: &ValidatedCheckout<'_>,
        attempt: &mut CheckoutAttempt,
        order_number: &OrderNumber,
        tracking_id: &TrackingId,
    ) -> Result<Settled, StepFailure> {
        let token = &checkout.session.token;

        // 1. Build the booking request
        begin(attempt, STEP_BUILD_REQUEST);
        let (request, amount) =
            build_request(checkout, order_number, tracking_id)
                .map_err(StepFailure::at(STEP_BUILD_REQUEST))?;
        attempt.record(CheckoutEvent::step_completed(
            STEP_BUILD_REQUEST,
            CheckoutState::BuildingRequest,
            None,
            None,
        ));

        // 2. Create the booking
        begin(attempt, STEP_CREATE_BOOKING);
        let receipt = self
            .bookings
            .create_booking(token, &request)
            .await
            .map_err(SagaError::from)
            .map_err(StepFailure::at(STEP_CREATE_BOOKING))?;
        if receipt
            .order_number
            .as_ref()
            .is_some_and(|echoed| *echoed != request.order_number)
        {
            tracing::warn!(
                booking_id = %receipt.booking_id,
                "backend echoed a different order number"
            );
        }
        tracing::info!(booking_id = %receipt.booking_id, "booking created");
        let booking_id = receipt.booking_id;
        attempt.record(CheckoutEvent::step_completed(
            STEP_CREATE_BOOKING,
            CheckoutState::BookingCreated,
            Some(booking_id.clone()),
            None,
        ));

        // 3. Create the payment intent
        begin(attempt, STEP_CREATE_PAYMENT_INTENT);
        let intent = self
            .payments
            .create_payment_intent(
                token,
                &PaymentIntentRequest {
                    booking_id: booking_id.clone(),
                    order_number: request.order_number.clone(),
                    amount,
                    currency: self.config.currency.clone(),
                },
            )
            .await
            .map_err(SagaError::from)
            .map_err(StepFailure::at(STEP_CREATE_PAYMENT_INTENT))?;
        attempt.record(CheckoutEvent::step_completed(
            STEP_CREATE_PAYMENT_INTENT,
            CheckoutState::PaymentIntentCreated,
            None,
            intent.payment_intent_id.clone(),
        ));

        // 4. Initialize the payment sheet and wait for readiness
        begin(attempt, STEP_INIT_PAYMENT_SHEET);
        let sheet_config = PaymentSheetConfig {
            client_secret: intent
                .client_secret
                .clone()
                .ok_or(SagaError::MissingCredentials("client secret"))
                .map_err(StepFailure::at(STEP_INIT_PAYMENT_SHEET))?,
            ephemeral_key: intent
                .ephemeral_key
                .clone()
                .ok_or(SagaError::MissingCredentials("ephemeral key"))
                .map_err(StepFailure::at(STEP_INIT_PAYMENT_SHEET))?,
            customer_id: intent
                .customer_id
                .clone()
                .ok_or(SagaError::MissingCredentials("customer id"))
                .map_err(StepFailure::at(STEP_INIT_PAYMENT_SHEET))?,
            merchant_display_name: checkout.merchant.name.clone(),
        };
        self.await_sheet(&sheet_config)
            .await
            .map_err(StepFailure::at(STEP_INIT_PAYMENT_SHEET))?;
        attempt.record(CheckoutEvent::payment_ready());
        attempt.record(CheckoutEvent::step_completed(
            STEP_INIT_PAYMENT_SHEET,
            CheckoutState::PaymentSheetReady,
            None,
            None,
        ));

        // 5. Present the sheet, gated on our own readiness flag
        if !attempt.payment_ready() {
            return Err(StepFailure {
                step: STEP_PRESENT_PAYMENT_SHEET,
                error: SagaError::ReadinessLost,
            });
        }
        begin(attempt, STEP_PRESENT_PAYMENT_SHEET);
        let presented = self.sheet.present().await;
        attempt.record(CheckoutEvent::step_completed(
            STEP_PRESENT_PAYMENT_SHEET,
            CheckoutState::PaymentPresented,
            None,
            None,
        ));
        match presented {
            PresentOutcome::Completed => {}
            PresentOutcome::Canceled => return Ok(Settled::Cancelled),
            PresentOutcome::Failed { code, message } => {
                return Err(StepFailure {
                    step: STEP_PRESENT_PAYMENT_SHEET,
                    error: SagaError::PaymentDeclined { code, message },
                });
            }
            PresentOutcome::Unclear(raw) => {
                tracing::error!(
                    %booking_id,
                    raw = %raw,
                    "unclear payment result, needs manual follow-up"
                );
                return Err(StepFailure {
                    step: STEP_PRESENT_PAYMENT_SHEET,
                    error: SagaError::UnclearResult(raw),
                });
            }
        }

        // 6. Confirm the payment
        begin(attempt, STEP_CONFIRM_PAYMENT);
        self.payments
            .confirm_payment(
                token,
                &PaymentConfirmation {
                    booking_id: booking_id.clone(),
                    order_number: request.order_number,
                    payment_intent_id: intent.payment_intent_id.clone(),
                },
            )
            .await
            .map_err(SagaError::from)
            .map_err(StepFailure::at(STEP_CONFIRM_PAYMENT))?;
        attempt.record(CheckoutEvent::step_completed(
            STEP_CONFIRM_PAYMENT,
            CheckoutState::PaymentPresented,
            None,
            None,
        ));

        Ok(Settled::Paid {
            booking_id,
            payment_intent_id: intent.payment_intent_id,
        })
    }

    /// Initializes the sheet and waits for its readiness signal, first for the
    /// grace period and then once more for the extension.
    async fn await_sheet(&self, sheet_config: &PaymentSheetConfig) -> Result<(), SagaError> {
        let mut readiness = self.sheet.initialize(sheet_config).await?;

        match readiness.wait(self.config.readiness_grace).await {
            ReadinessWait::Ready => return Ok(()),
            ReadinessWait::Lost => return Err(SagaError::ReadinessLost),
            ReadinessWait::Pending => {
                tracing::debug!(
                    grace_ms = self.config.readiness_grace.as_millis() as u64,
                    "payment sheet not ready yet, extending wait"
                );
            }
        }

        match readiness.wait(self.config.readiness_extension).await {
            ReadinessWait::Ready => Ok(()),
            ReadinessWait::Lost => Err(SagaError::ReadinessLost),
            ReadinessWait::Pending => Err(SagaError::ReadinessTimeout {
                waited_ms: self.config.readiness_budget().as_millis() as u64,
            }),
        }
    }

    /// Turns the run result into the terminal result and user notice,
    /// compensating the booking where one exists.
    async fn settle(
        &self,
        checkout: &ValidatedCheckout<'_>,
        attempt: &mut CheckoutAttempt,
        order_number: &OrderNumber,
        run: Result<Settled, StepFailure>,
    ) -> (CheckoutResult, UserNotice) {
        let token = &checkout.session.token;

        match run {
            Ok(Settled::Paid {
                booking_id,
                payment_intent_id,
            }) => {
                attempt.record(CheckoutEvent::attempt_paid());
                metrics::counter!("checkout_paid_total").increment(1);
                tracing::info!(%booking_id, "checkout paid");

                (
                    CheckoutResult::Paid {
                        booking_id,
                        order_number: order_number.clone(),
                        payment_intent_id,
                    },
                    UserNotice::paid(order_number),
                )
            }
            Ok(Settled::Cancelled) => {
                tracing::info!("payment cancelled by user");
                let compensated = self
                    .compensate(token, checkout, attempt, REASON_CANCELLED_BY_USER)
                    .await
                    .unwrap_or(false);
                attempt.record(CheckoutEvent::attempt_cancelled());
                metrics::counter!("checkout_cancelled_total").increment(1);

                (
                    CheckoutResult::Cancelled { compensated },
                    UserNotice::cancelled(order_number),
                )
            }
            Err(StepFailure { step, error }) => {
                let kind = error.kind();
                let message = error.to_string();
                tracing::error!(step, %kind, error = %message, "checkout step failed");
                attempt.record(CheckoutEvent::step_failed(step, kind, &message));

                let reason = format!("Checkout failed at {step}: {message}");
                let compensated = self.compensate(token, checkout, attempt, &reason).await;

                attempt.record(CheckoutEvent::attempt_failed(step, kind, &message));
                metrics::counter!("checkout_failed_total", "kind" => kind.as_str()).increment(1);

                match error {
                    SagaError::Validation(reason) => (
                        CheckoutResult::Rejected { reason },
                        UserNotice::rejected(reason),
                    ),
                    _ => (
                        CheckoutResult::Failed {
                            kind,
                            step: step.to_string(),
                            error: message,
                            compensated,
                        },
                        UserNotice::failed(kind, step, order_number),
                    ),
                }
            }
        }
    }

    /// Cancels the attempt's booking, if it has one.
    ///
    /// Returns `None` when there was nothing to compensate.
    async fn compensate(
        &self,
        token: &AuthToken,
        checkout: &ValidatedCheckout<'_>,
        attempt: &mut CheckoutAttempt,
        reason: &str,
    ) -> Option<bool> {
        let booking_id = attempt.booking_id()?.clone();
        let order_number = attempt.order_number()?.clone();

        attempt.record(CheckoutEvent::compensation_started(booking_id.clone(), reason));
        let request = CancellationRequest::new(
            checkout.merchant.id.clone(),
            booking_id,
            order_number,
            reason,
        );
        let report = self.compensation.cancel(token, &request).await;

        for (strategy, err) in report.failures() {
            attempt.record(CheckoutEvent::compensation_strategy_failed(
                strategy,
                err.to_string(),
            ));
        }
        match report.strategy() {
            Some(strategy) => attempt.record(CheckoutEvent::compensated(strategy)),
            None => attempt.record(CheckoutEvent::compensation_exhausted()),
        }
        Some(report.succeeded())
    }
}

fn begin(attempt: &mut CheckoutAttempt, step: &'static str) {
    tracing::info!(step, "checkout step started");
    attempt.record(CheckoutEvent::step_started(step));
}

/// Resolves the schedule, prices the cart and assembles the booking payload.
///
/// Returns the payload together with the amount to charge in minor units.
fn build_request(
    checkout: &ValidatedCheckout<'_>,
    order_number: &OrderNumber,
    tracking_id: &TrackingId,
) -> Result<(BookingRequest, i64), SagaError> {
    let schedule = checkout
        .schedule
        .resolve(Utc::now().year())
        .ok_or(ValidationError::InvalidSchedule)?;

    let items: Vec<BookingLine> = checkout.cart.items().iter().map(BookingLine::from).collect();
    let totals = checked_totals(Some(&items[..]), Some(checkout.pricing))
        .ok_or(SagaError::AmountOutOfRange)?;
    let amount = totals
        .amount_minor_units()
        .ok_or(SagaError::AmountOutOfRange)?;

    let request = BookingRequest {
        user_id: checkout.session.user_id.clone(),
        merchant_id: checkout.merchant.id.clone(),
        order_number: order_number.clone(),
        tracking_id: tracking_id.clone(),
        pickup_address: checkout.pickup_address.to_string(),
        delivery_address: checkout.delivery_address.to_string(),
        items,
        totals,
        pickup_date_time: schedule.pickup_at,
        delivery_date_time: schedule.delivery_at,
        payment_method: checkout.payment_method,
    };
    Ok((request, amount))
}
