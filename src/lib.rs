pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::AppConfig;
use crate::core::{PriceResolver, ReportAggregator, SingleFlightCache};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// Value a single symbol
    Price { symbol: String },
    /// Value a basket of symbols; the configured watchlist when `symbols` is empty
    Bulk {
        symbols: Vec<String>,
        json: bool,
        show_cache: bool,
    },
}

/// Wires the price source, cache and resolver described by `config`.
pub fn build_aggregator(config: &AppConfig) -> Result<ReportAggregator> {
    let binance = config.providers.binance.clone().unwrap_or_default();
    let source = providers::BinanceClient::from_config(&binance)
        .context("Failed to create Binance client")?;

    let cache = SingleFlightCache::from_config(&config.cache);
    let resolver = PriceResolver::new(Arc::new(source), cache);
    Ok(ReportAggregator::new(resolver, &config.report))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Tradeflow starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let aggregator = build_aggregator(&config)?;

    match command {
        AppCommand::Price { symbol } => cli::price::run(aggregator.resolver(), &symbol).await,
        AppCommand::Bulk {
            symbols,
            json,
            show_cache,
        } => {
            let symbols = if symbols.is_empty() {
                config.symbols.clone()
            } else {
                symbols
            };
            if symbols.is_empty() {
                anyhow::bail!("No symbols given and none configured under `symbols`");
            }
            cli::bulk::run(&aggregator, &symbols, json, show_cache).await
        }
    }
}
