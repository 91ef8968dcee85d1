//! Checkout attempt record.

use common::{BookingId, OrderNumber, PaymentIntentId, TrackingId};
use serde::{Deserialize, Serialize};

use crate::compensation::CancellationStrategy;
use crate::error::FailureKind;
use crate::events::CheckoutEvent;
use crate::state::CheckoutState;

/// Working state of one checkout attempt.
///
/// Built by applying [`CheckoutEvent`]s in order; every recorded event is kept
/// in the journal. An attempt is never reused: a retry starts a new attempt
/// with a new order number.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutAttempt {
    order_number: Option<OrderNumber>,
    tracking_id: Option<TrackingId>,
    state: CheckoutState,
    booking_id: Option<BookingId>,
    payment_intent_id: Option<PaymentIntentId>,
    /// Set only after the coordinator itself observed the sheet's readiness.
    payment_ready: bool,
    current_step: Option<String>,
    completed_steps: Vec<String>,
    failed_step: Option<String>,
    failure_kind: Option<FailureKind>,
    failure_reason: Option<String>,
    compensated_by: Option<CancellationStrategy>,
    compensation_exhausted: bool,
    journal: Vec<CheckoutEvent>,
}

impl CheckoutAttempt {
    /// Starts an attempt with freshly generated identifiers.
    pub fn start(order_number: OrderNumber, tracking_id: TrackingId) -> Self {
        let mut attempt = Self::default();
        attempt.record(CheckoutEvent::attempt_started(order_number, tracking_id));
        attempt
    }

    /// Rebuilds an attempt from its journal.
    pub fn from_events(events: impl IntoIterator<Item = CheckoutEvent>) -> Self {
        let mut attempt = Self::default();
        for event in events {
            attempt.record(event);
        }
        attempt
    }

    /// Applies an event and appends it to the journal.
    pub fn record(&mut self, event: CheckoutEvent) {
        self.apply(&event);
        self.journal.push(event);
    }

    fn apply(&mut self, event: &CheckoutEvent) {
        match event {
            CheckoutEvent::AttemptStarted(data) => {
                self.order_number = Some(data.order_number.clone());
                self.tracking_id = Some(data.tracking_id.clone());
                self.transition(CheckoutState::ValidatingInputs);
                self.transition(CheckoutState::BuildingRequest);
            }
            CheckoutEvent::StepStarted(data) => {
                self.current_step = Some(data.step_name.clone());
            }
            CheckoutEvent::StepCompleted(data) => {
                self.completed_steps.push(data.step_name.clone());
                if data.state != self.state {
                    self.transition(data.state);
                }
                if let Some(booking_id) = &data.booking_id {
                    self.booking_id = Some(booking_id.clone());
                }
                if let Some(payment_intent_id) = &data.payment_intent_id {
                    self.payment_intent_id = Some(payment_intent_id.clone());
                }
            }
            CheckoutEvent::StepFailed(data) => {
                self.failed_step = Some(data.step_name.clone());
                self.failure_kind = Some(data.kind);
                self.failure_reason = Some(data.error.clone());
            }
            CheckoutEvent::PaymentReady(_) => {
                self.payment_ready = true;
                self.transition(CheckoutState::PaymentSheetReady);
            }
            CheckoutEvent::ReadinessReset => {
                self.payment_ready = false;
            }
            CheckoutEvent::CompensationStarted(_) | CheckoutEvent::CompensationStrategyFailed(_) => {
                // Strategy failures are journaled, the next strategy is tried
            }
            CheckoutEvent::Compensated(data) => {
                self.compensated_by = Some(data.strategy);
            }
            CheckoutEvent::CompensationExhausted(_) => {
                self.compensation_exhausted = true;
            }
            CheckoutEvent::AttemptPaid(_) => {
                self.transition(CheckoutState::Paid);
            }
            CheckoutEvent::AttemptCancelled(_) => {
                self.transition(CheckoutState::PaymentCancelled);
            }
            CheckoutEvent::AttemptFailed(data) => {
                self.failed_step = Some(data.step_name.clone());
                self.failure_kind = Some(data.kind);
                self.failure_reason = Some(data.reason.clone());
                if self.state == CheckoutState::PaymentPresented {
                    self.transition(CheckoutState::PaymentFailed);
                } else {
                    self.transition(CheckoutState::Failed);
                }
            }
        }
    }

    /// Moves to `to`; illegal transitions leave the state unchanged.
    fn transition(&mut self, to: CheckoutState) {
        if !self.state.can_transition_to(to) {
            tracing::warn!(from = %self.state, %to, "ignoring illegal checkout transition");
            return;
        }
        self.state = to;
    }
}

// Query methods
impl CheckoutAttempt {
    /// Returns the attempt state.
    pub fn state(&self) -> CheckoutState {
        self.state
    }

    /// Returns the order number generated for this attempt.
    pub fn order_number(&self) -> Option<&OrderNumber> {
        self.order_number.as_ref()
    }

    /// Returns the tracking identifier generated for this attempt.
    pub fn tracking_id(&self) -> Option<&TrackingId> {
        self.tracking_id.as_ref()
    }

    /// Returns the booking created by this attempt, if any.
    pub fn booking_id(&self) -> Option<&BookingId> {
        self.booking_id.as_ref()
    }

    /// Returns the payment intent ID, if one was created.
    pub fn payment_intent_id(&self) -> Option<&PaymentIntentId> {
        self.payment_intent_id.as_ref()
    }

    /// Returns true if the coordinator observed the payment sheet ready.
    pub fn payment_ready(&self) -> bool {
        self.payment_ready
    }

    /// Returns the step currently or last executed.
    pub fn current_step(&self) -> Option<&str> {
        self.current_step.as_deref()
    }

    /// Returns the list of completed step names.
    pub fn completed_steps(&self) -> &[String] {
        &self.completed_steps
    }

    /// Returns the step that failed, if any.
    pub fn failed_step(&self) -> Option<&str> {
        self.failed_step.as_deref()
    }

    /// Returns the failure category, if the attempt failed.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure_kind
    }

    /// Returns the failure reason, if any.
    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    /// Returns the cancellation strategy that compensated the booking.
    pub fn compensated_by(&self) -> Option<CancellationStrategy> {
        self.compensated_by
    }

    /// Returns true if every cancellation strategy failed.
    pub fn compensation_exhausted(&self) -> bool {
        self.compensation_exhausted
    }

    /// Returns all recorded events in order.
    pub fn journal(&self) -> &[CheckoutEvent] {
        &self.journal
    }

    /// Returns the recorded event type names in order.
    pub fn event_types(&self) -> Vec<&'static str> {
        self.journal.iter().map(CheckoutEvent::event_type).collect()
    }
}
