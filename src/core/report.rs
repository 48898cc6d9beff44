//! Bulk valuation: fan out one resolution per symbol, gather in input order.
use crate::core::asset::Asset;
use crate::core::config::ReportConfig;
use crate::core::error::ReportError;
use crate::core::resolver::PriceResolver;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::Semaphore;
use tracing::{debug, info};

/// Result of one bulk valuation. Assets are in request order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeReport {
    pub timestamp: DateTime<Utc>,
    pub assets: Vec<Asset>,
    pub total_value: f64,
    pub concurrency_info: String,
}

impl TradeReport {
    pub fn error_count(&self) -> usize {
        self.assets.iter().filter(|a| a.is_error()).count()
    }
}

pub struct ReportAggregator {
    resolver: PriceResolver,
    max_concurrency: Option<usize>,
}

impl ReportAggregator {
    pub fn new(resolver: PriceResolver, config: &ReportConfig) -> Self {
        Self {
            resolver,
            max_concurrency: config.max_concurrency.map(|permits| permits.max(1)),
        }
    }

    pub fn resolver(&self) -> &PriceResolver {
        &self.resolver
    }

    /// Values every symbol concurrently and waits for all of them.
    ///
    /// Each symbol gets its own slot, duplicates included. A failing symbol
    /// shows up as an error asset in its slot; only a task that never
    /// completes fails the whole report. `max_concurrency` applies to this
    /// call alone, concurrent reports do not share permits.
    pub async fn aggregate(&self, symbols: &[String]) -> Result<TradeReport, ReportError> {
        if symbols.is_empty() {
            return Err(ReportError::NoSymbols);
        }
        info!("Aggregating prices for {} symbols", symbols.len());

        // Owned by this call and never closed, so acquiring a permit cannot fail.
        let limiter = self
            .max_concurrency
            .map(|permits| Arc::new(Semaphore::new(permits)));
        let handles: Vec<_> = symbols
            .iter()
            .map(|symbol| {
                let resolver = self.resolver.clone();
                let limiter = limiter.clone();
                let symbol = symbol.clone();
                tokio::spawn(async move {
                    let _permit = match limiter {
                        Some(limiter) => limiter.acquire_owned().await.ok(),
                        None => None,
                    };
                    resolver.resolve(&symbol).await
                })
            })
            .collect();

        let mut assets = Vec::with_capacity(symbols.len());
        for (symbol, joined) in symbols.iter().zip(join_all(handles).await) {
            let asset = joined.map_err(|source| ReportError::TaskFailed {
                symbol: symbol.clone(),
                source,
            })?;
            assets.push(asset);
        }

        let total_value = assets.iter().map(Asset::price).sum();
        let report = TradeReport {
            timestamp: Utc::now(),
            total_value,
            concurrency_info: self.concurrency_info(assets.len()),
            assets,
        };
        debug!(
            "Report ready: total {} with {} failed symbols",
            report.total_value,
            report.error_count()
        );
        Ok(report)
    }

    fn concurrency_info(&self, tasks: usize) -> String {
        let flavor = match Handle::current().runtime_flavor() {
            RuntimeFlavor::CurrentThread => "current-thread",
            RuntimeFlavor::MultiThread => "multi-thread",
            _ => "other",
        };
        let limit = self
            .max_concurrency
            .map_or("unbounded".to_string(), |n| format!("at most {n}"));
        format!("tokio {flavor} runtime, {tasks} tasks, {limit} in flight")
    }
}
