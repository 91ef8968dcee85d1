//! A payment sheet operated from the terminal.

use async_trait::async_trait;
use saga::{PaymentSheet, PaymentSheetConfig, PaymentSheetError, PresentOutcome, Readiness};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::Mutex;

/// Payment sheet that asks an operator to approve the charge.
///
/// Answers: `y`/`yes` completes the payment, `n`/`no`, an empty line or end
/// of input cancels it, `d`/`decline` simulates a card decline. Anything else
/// is reported as an unclear result.
pub struct TerminalPaymentSheet<R> {
    input: Mutex<R>,
    config: Mutex<Option<PaymentSheetConfig>>,
}

impl TerminalPaymentSheet<BufReader<Stdin>> {
    /// Reads answers from standard input.
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R> TerminalPaymentSheet<R> {
    /// Reads answers from `input`.
    pub fn new(input: R) -> Self {
        Self {
            input: Mutex::new(input),
            config: Mutex::new(None),
        }
    }
}

fn mask(secret: &str) -> String {
    let visible: String = secret.chars().take(6).collect();
    format!("{visible}…")
}

fn interpret(answer: &str) -> PresentOutcome {
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" => PresentOutcome::Completed,
        "" | "n" | "no" => PresentOutcome::Canceled,
        "d" | "decline" => PresentOutcome::Failed {
            code: "card_declined".to_string(),
            message: "Declined at the terminal".to_string(),
        },
        other => PresentOutcome::Unclear(other.to_string()),
    }
}

#[async_trait]
impl<R> PaymentSheet for TerminalPaymentSheet<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn initialize(
        &self,
        config: &PaymentSheetConfig,
    ) -> Result<Readiness, PaymentSheetError> {
        tracing::debug!(
            customer_id = %config.customer_id,
            client_secret = %mask(&config.client_secret),
            "payment sheet initialized"
        );
        *self.config.lock().await = Some(config.clone());
        Ok(Readiness::ready())
    }

    async fn present(&self) -> PresentOutcome {
        let merchant = self
            .config
            .lock()
            .await
            .as_ref()
            .map(|config| config.merchant_display_name.clone())
            .unwrap_or_default();
        eprint!("Pay {merchant}? [y]es / [n]o / [d]ecline: ");

        let mut answer = String::new();
        match self.input.lock().await.read_line(&mut answer).await {
            Ok(_) => interpret(&answer),
            Err(err) => PresentOutcome::Failed {
                code: "terminal_io".to_string(),
                message: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PaymentSheetConfig {
        PaymentSheetConfig {
            client_secret: "pi_123_secret_abc".to_string(),
            ephemeral_key: "ek_1".to_string(),
            customer_id: "cus_1".to_string(),
            merchant_display_name: "Fresh Press".to_string(),
        }
    }

    async fn present_with(input: &'static str) -> PresentOutcome {
        let sheet = TerminalPaymentSheet::new(input.as_bytes());
        let readiness = sheet.initialize(&config()).await.unwrap();
        assert!(readiness.is_ready());
        sheet.present().await
    }

    #[tokio::test]
    async fn test_answers() {
        assert_eq!(present_with("y\n").await, PresentOutcome::Completed);
        assert_eq!(present_with("YES\n").await, PresentOutcome::Completed);
        assert_eq!(present_with("n\n").await, PresentOutcome::Canceled);
        assert_eq!(present_with("\n").await, PresentOutcome::Canceled);
        assert_eq!(present_with("").await, PresentOutcome::Canceled);
        assert!(matches!(
            present_with("decline\n").await,
            PresentOutcome::Failed { .. }
        ));
        assert_eq!(
            present_with("maybe\n").await,
            PresentOutcome::Unclear("maybe".to_string())
        );
    }

    #[tokio::test]
    async fn test_reads_one_answer_per_presentation() {
        let sheet = TerminalPaymentSheet::new("n\ny\n".as_bytes());
        sheet.initialize(&config()).await.unwrap();
        assert_eq!(sheet.present().await, PresentOutcome::Canceled);
        assert_eq!(sheet.present().await, PresentOutcome::Completed);
    }

    #[test]
    fn test_mask_hides_secret() {
        assert_eq!(mask("pi_123_secret_abc"), "pi_123…");
    }
}
