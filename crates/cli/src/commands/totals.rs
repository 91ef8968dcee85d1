use cli::{Config, read_draft, with_session};
use saga::{OrderSummary, PricingResolver};

use super::{DraftArgs, connect};

pub(crate) async fn run(args: DraftArgs, config: &Config) -> Result<(), String> {
    let input = with_session(
        read_draft(&args.draft)
            .await
            .map_err(|error| error.to_string())?,
        config.session(),
    );
    let resolver = PricingResolver::new(connect(config)?);

    let token = input.session.as_ref().map(|session| &session.token);
    let summary = OrderSummary::prepare(&resolver, token, &input.cart).await;

    let json = serde_json::to_string_pretty(&summary)
        .map_err(|error| format!("failed to render summary: {error}"))?;
    println!("{json}");

    Ok(())
}
