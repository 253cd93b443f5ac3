//! Symbol resolution diagnostics.

use anyhow::Result;
use relay_config::AppConfig;
use relay_engine::{market, SymbolResolver};
use relay_core::traits::BrokerApi;
use tracing::warn;

use crate::cli::ResolveArgs;

pub async fn run(args: ResolveArgs, config: AppConfig) -> Result<()> {
    let store = super::open_store(&config)?;
    let credentials = super::credentials(&store, &args.user).await?;
    let broker = super::http_broker(&config)?;

    let universe = match broker.symbols(&credentials).await {
        Ok(universe) => {
            println!("Broker lists {} symbols", universe.len());
            Some(universe)
        }
        Err(e) => {
            warn!("Symbol list unavailable: {}", e);
            println!("Symbol list unavailable, using fallback rules");
            None
        }
    };

    let resolved = SymbolResolver::new().resolve(
        &args.symbol,
        credentials.account_class,
        universe.as_deref(),
    )?;
    println!("{} -> {}", args.symbol, resolved);

    match market::get_quote(&broker, &resolved, &credentials).await {
        Some(quote) => println!(
            "Bid {:.5}  Ask {:.5}  Spread {:.5}",
            quote.bid,
            quote.ask,
            quote.spread()
        ),
        None => println!("No quote available"),
    }

    Ok(())
}
