//! Open positions listing.

use anyhow::Result;
use relay_config::AppConfig;
use relay_engine::locator::by_symbol_and_side;
use relay_engine::PositionLocator;
use std::sync::Arc;

use crate::cli::PositionsArgs;

pub async fn run(args: PositionsArgs, config: AppConfig) -> Result<()> {
    let store = super::open_store(&config)?;
    let credentials = super::credentials(&store, &args.user).await?;
    let locator = PositionLocator::new(Arc::new(super::http_broker(&config)?));

    let positions = locator.list_open_positions(&credentials).await?;
    let shown: Vec<_> = match &args.symbol {
        Some(symbol) => by_symbol_and_side(&positions, symbol),
        None => positions.iter().collect(),
    };

    if shown.is_empty() {
        println!("No open positions");
        return Ok(());
    }

    println!("{:<12} {:<14} {:<6} {:>10} {:>12}", "Ticket", "Symbol", "Side", "Volume", "Profit");
    println!("{}", "-".repeat(58));
    for p in shown {
        let side = p.side.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string());
        let profit = p.profit.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
        println!(
            "{:<12} {:<14} {:<6} {:>10} {:>12}",
            p.ticket, p.symbol, side, p.volume, profit
        );
    }

    Ok(())
}
