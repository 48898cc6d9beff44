use super::ui;
use crate::core::PriceResolver;
use anyhow::{Result, anyhow};

/// Prints a single symbol's valuation.
///
/// A missing symbol and an upstream failure are reported as different errors.
pub async fn run(resolver: &PriceResolver, symbol: &str) -> Result<()> {
    match resolver.lookup(symbol).await {
        Ok(asset) => {
            println!("{}", asset.render());
            Ok(())
        }
        Err(e) if e.is_not_found() => {
            eprintln!("{}", ui::style_text(&e.to_string(), ui::StyleType::Error));
            Err(anyhow!(e).context(format!("{symbol} is not listed by the price source")))
        }
        Err(e) => {
            eprintln!(
                "{}",
                ui::style_text(&format!("External service error: {e}"), ui::StyleType::Error)
            );
            Err(anyhow!(e).context(format!("Could not reach the price source for {symbol}")))
        }
    }
}
