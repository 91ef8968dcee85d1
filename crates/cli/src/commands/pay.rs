use cli::{Config, TerminalPaymentSheet, read_draft, with_session};
use saga::{CheckoutCoordinator, OrderSummary, PricingResolver};

use super::{DraftArgs, connect};

pub(crate) async fn run(args: DraftArgs, config: &Config) -> Result<(), String> {
    let mut input = with_session(
        read_draft(&args.draft)
            .await
            .map_err(|error| error.to_string())?,
        config.session(),
    );
    let backend = connect(config)?;

    let token = input.session.as_ref().map(|session| &session.token);
    let summary =
        OrderSummary::prepare(&PricingResolver::new(backend.clone()), token, &input.cart).await;
    input.pricing = summary.pricing;
    eprintln!(
        "Order total: {} (subtotal {}, service {}, delivery {}, platform {})",
        summary.totals.total,
        summary.totals.subtotal,
        summary.totals.service_fees,
        summary.totals.delivery_charge,
        summary.totals.platform_fee,
    );

    let coordinator = CheckoutCoordinator::new(
        backend.clone(),
        backend.clone(),
        TerminalPaymentSheet::stdin(),
        backend,
        config.checkout_config(),
    );
    let outcome = coordinator.handle_payment(&input).await;

    let json = serde_json::to_string_pretty(&outcome.result)
        .map_err(|error| format!("failed to render result: {error}"))?;
    println!("{}\n\n{}", outcome.notice, json);

    if outcome.result.is_error() {
        return Err(format!("checkout failed: {}", outcome.notice.title));
    }
    Ok(())
}
