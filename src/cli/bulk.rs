use super::ui;
use crate::core::{Asset, ReportAggregator, TradeReport};
use anyhow::{Context, Result};
use comfy_table::Cell;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

impl TradeReport {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();

        table.set_header(vec![
            ui::header_cell("Symbol"),
            ui::header_cell("Type"),
            ui::header_cell("Details"),
            ui::header_cell("Price"),
        ]);

        for asset in &self.assets {
            let (details, price) = match asset {
                Asset::Crypto(c) => (Cell::new(c.network()), Some(asset.price())),
                Asset::Stock(s) => (Cell::new(s.exchange()), Some(asset.price())),
                Asset::Fiat(f) => (Cell::new(f.country()), Some(asset.price())),
                Asset::Error(e) => (ui::error_cell(e.message()), None),
            };

            table.add_row(vec![
                Cell::new(asset.symbol()),
                Cell::new(asset.category()),
                details,
                ui::format_optional_cell(price, |p| format!("{p:.2}")),
            ]);
        }

        let mut output = format!(
            "Report at {}\n\n",
            ui::style_text(&self.timestamp.to_rfc3339(), ui::StyleType::Title)
        );

        output.push_str(&table.to_string());

        output.push_str(&format!(
            "\n\n{}: {}",
            ui::style_text("Total Value", ui::StyleType::TotalLabel),
            ui::style_text(&format!("{:.2}", self.total_value), ui::StyleType::TotalValue)
        ));

        let failed = self.error_count();
        if failed > 0 {
            output.push_str(&format!(
                "\n{}",
                ui::style_text(
                    &format!("{failed} of {} symbols could not be priced", self.assets.len()),
                    ui::StyleType::Error
                )
            ));
        }

        output.push_str(&format!(
            "\n{}",
            ui::style_text(&self.concurrency_info, ui::StyleType::Subtle)
        ));

        output
    }
}

pub fn display_cache(snapshot: &HashMap<String, Asset>) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Cached Symbol"), ui::header_cell("Price")]);

    let sorted: BTreeMap<_, _> = snapshot.iter().collect();
    for (symbol, asset) in sorted {
        table.add_row(vec![
            Cell::new(symbol),
            ui::format_optional_cell(Some(asset.price()), |p| format!("{p:.2}")),
        ]);
    }

    format!(
        "{}\n\n{}",
        ui::style_text("Price cache", ui::StyleType::Title),
        table
    )
}

pub async fn run(
    aggregator: &ReportAggregator,
    symbols: &[String],
    as_json: bool,
    show_cache: bool,
) -> Result<()> {
    debug!("Building report for {:?}", symbols);

    let spinner = ui::new_spinner(&format!("Fetching {} prices...", symbols.len()));
    let report = aggregator.aggregate(symbols).await;
    spinner.finish_and_clear();
    let report = report.context("Failed to build trade report")?;

    let snapshot = show_cache.then(|| aggregator.resolver().cache_snapshot());

    if as_json {
        let body = match snapshot {
            Some(cache) => json!({ "report": report, "cache": cache }),
            None => serde_json::to_value(&report)?,
        };
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!("{}", report.display_as_table());
    if let Some(cache) = snapshot {
        println!("\n{}", display_cache(&cache));
    }
    Ok(())
}
