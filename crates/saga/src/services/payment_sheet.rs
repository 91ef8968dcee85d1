//! Payment sheet abstraction and a scripted implementation.
//!
//! The payment sheet is the provider UI that collects card details. Its
//! readiness is reported through an explicit [`Readiness`] signal that the
//! coordinator awaits with a bounded timeout.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::PaymentSheetError;

/// Everything the sheet needs to collect a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSheetConfig {
    pub client_secret: String,
    pub ephemeral_key: String,
    pub customer_id: String,
    /// Name shown on the sheet.
    pub merchant_display_name: String,
}

/// What the customer did with the presented sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentOutcome {
    /// The payment went through.
    Completed,
    /// The customer dismissed the sheet.
    Canceled,
    /// The provider reported an error.
    Failed { code: String, message: String },
    /// Anything else; carries the raw result for diagnostics.
    Unclear(String),
}

/// Result of waiting on a [`Readiness`] signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessWait {
    Ready,
    Pending,
    /// The sheet dropped its notifier without becoming ready.
    Lost,
}

/// Receiving half of the sheet's readiness signal.
#[derive(Debug, Clone)]
pub struct Readiness {
    rx: watch::Receiver<bool>,
}

impl Readiness {
    /// Creates a not-yet-ready signal and its notifier.
    pub fn channel() -> (ReadinessNotifier, Readiness) {
        let (tx, rx) = watch::channel(false);
        (ReadinessNotifier { tx }, Readiness { rx })
    }

    /// Creates a signal that is already ready.
    pub fn ready() -> Readiness {
        let (notifier, readiness) = Self::channel();
        notifier.notify_ready();
        readiness
    }

    /// Returns true if the sheet has reported readiness.
    pub fn is_ready(&self) -> bool {
        *self.rx.borrow()
    }

    /// Waits up to `within` for the sheet to become ready.
    pub async fn wait(&mut self, within: Duration) -> ReadinessWait {
        match tokio::time::timeout(within, self.rx.wait_for(|ready| *ready)).await {
            Ok(Ok(_)) => ReadinessWait::Ready,
            Ok(Err(_)) => ReadinessWait::Lost,
            Err(_) => ReadinessWait::Pending,
        }
    }
}

/// Sending half of the readiness signal, held by the sheet.
#[derive(Debug)]
pub struct ReadinessNotifier {
    tx: watch::Sender<bool>,
}

impl ReadinessNotifier {
    /// Marks the sheet ready.
    pub fn notify_ready(&self) {
        self.tx.send_replace(true);
    }
}

/// The provider's payment sheet.
#[async_trait]
pub trait PaymentSheet: Send + Sync {
    /// Configures the sheet and returns its readiness signal.
    async fn initialize(&self, config: &PaymentSheetConfig)
    -> Result<Readiness, PaymentSheetError>;

    /// Shows the sheet and waits for the customer.
    async fn present(&self) -> PresentOutcome;
}

/// When a [`ScriptedPaymentSheet`] reports readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessScript {
    Immediate,
    After(Duration),
    Never,
}

#[derive(Debug)]
struct ScriptedSheetState {
    init_error: Option<PaymentSheetError>,
    readiness: ReadinessScript,
    outcome: PresentOutcome,
    configs: Vec<PaymentSheetConfig>,
    present_calls: usize,
    // Kept so that a `Never` sheet stays pending instead of lost.
    notifiers: Vec<ReadinessNotifier>,
}

impl Default for ScriptedSheetState {
    fn default() -> Self {
        Self {
            init_error: None,
            readiness: ReadinessScript::Immediate,
            outcome: PresentOutcome::Completed,
            configs: Vec::new(),
            present_calls: 0,
            notifiers: Vec::new(),
        }
    }
}

/// Payment sheet that follows a script, for testing.
///
/// By default it becomes ready at once and completes the payment.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPaymentSheet {
    state: Arc<Mutex<ScriptedSheetState>>,
}

impl ScriptedPaymentSheet {
    /// Creates a sheet that is ready immediately and completes payment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `initialize` fail with `error`.
    pub fn set_init_error(&self, error: Option<PaymentSheetError>) {
        self.state.lock().unwrap().init_error = error;
    }

    /// Sets when the sheet reports readiness.
    pub fn set_readiness(&self, readiness: ReadinessScript) {
        self.state.lock().unwrap().readiness = readiness;
    }

    /// Sets what `present` returns.
    pub fn set_outcome(&self, outcome: PresentOutcome) {
        self.state.lock().unwrap().outcome = outcome;
    }

    /// Returns the number of `initialize` calls.
    pub fn init_count(&self) -> usize {
        self.state.lock().unwrap().configs.len()
    }

    /// Returns the number of `present` calls.
    pub fn present_count(&self) -> usize {
        self.state.lock().unwrap().present_calls
    }

    /// Returns the most recent configuration.
    pub fn last_config(&self) -> Option<PaymentSheetConfig> {
        self.state.lock().unwrap().configs.last().cloned()
    }
}

#[async_trait]
impl PaymentSheet for ScriptedPaymentSheet {
    async fn initialize(
        &self,
        config: &PaymentSheetConfig,
    ) -> Result<Readiness, PaymentSheetError> {
        let mut state = self.state.lock().unwrap();
        state.configs.push(config.clone());

        if let Some(err) = state.init_error.clone() {
            return Err(err);
        }

        let (notifier, readiness) = Readiness::channel();
        match state.readiness {
            ReadinessScript::Immediate => notifier.notify_ready(),
            ReadinessScript::After(delay) => {
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    notifier.notify_ready();
                });
            }
            ReadinessScript::Never => state.notifiers.push(notifier),
        }
        Ok(readiness)
    }

    async fn present(&self) -> PresentOutcome {
        let mut state = self.state.lock().unwrap();
        state.present_calls += 1;
        state.outcome.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PaymentSheetConfig {
        PaymentSheetConfig {
            client_secret: "pi_1_secret".to_string(),
            ephemeral_key: "ek_1".to_string(),
            customer_id: "cus_1".to_string(),
            merchant_display_name: "Fresh Press".to_string(),
        }
    }

    #[tokio::test]
    async fn test_ready_signal() {
        let mut readiness = Readiness::ready();
        assert!(readiness.is_ready());
        assert_eq!(
            readiness.wait(Duration::from_millis(10)).await,
            ReadinessWait::Ready
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_then_ready() {
        let (notifier, mut readiness) = Readiness::channel();
        assert_eq!(
            readiness.wait(Duration::from_secs(1)).await,
            ReadinessWait::Pending
        );

        notifier.notify_ready();
        assert_eq!(
            readiness.wait(Duration::from_secs(1)).await,
            ReadinessWait::Ready
        );
    }

    #[tokio::test]
    async fn test_dropped_notifier_is_lost() {
        let (notifier, mut readiness) = Readiness::channel();
        drop(notifier);
        assert_eq!(
            readiness.wait(Duration::from_secs(1)).await,
            ReadinessWait::Lost
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_scripted_delayed_readiness() {
        let sheet = ScriptedPaymentSheet::new();
        sheet.set_readiness(ReadinessScript::After(Duration::from_millis(1500)));

        let mut readiness = sheet.initialize(&config()).await.unwrap();
        assert_eq!(
            readiness.wait(Duration::from_secs(1)).await,
            ReadinessWait::Pending
        );
        assert_eq!(
            readiness.wait(Duration::from_secs(2)).await,
            ReadinessWait::Ready
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_scripted_never_ready_stays_pending() {
        let sheet = ScriptedPaymentSheet::new();
        sheet.set_readiness(ReadinessScript::Never);

        let mut readiness = sheet.initialize(&config()).await.unwrap();
        assert_eq!(
            readiness.wait(Duration::from_secs(3)).await,
            ReadinessWait::Pending
        );
    }

    #[tokio::test]
    async fn test_scripted_outcome_and_counts() {
        let sheet = ScriptedPaymentSheet::new();
        sheet.set_outcome(PresentOutcome::Canceled);

        sheet.initialize(&config()).await.unwrap();
        assert_eq!(sheet.present().await, PresentOutcome::Canceled);
        assert_eq!(sheet.init_count(), 1);
        assert_eq!(sheet.present_count(), 1);
        assert_eq!(sheet.last_config().unwrap().customer_id, "cus_1");
    }
}
