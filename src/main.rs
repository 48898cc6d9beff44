use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tradeflow::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Show the current price of one symbol
    Price {
        /// Symbol as listed by the price source, e.g. BTCUSDT
        symbol: String,
    },
    /// Value several symbols at once
    Bulk {
        /// Symbols to value; defaults to the configured watchlist
        symbols: Vec<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Also print the price cache after the report
        #[arg(long)]
        show_cache: bool,
    },
}

impl From<Commands> for tradeflow::AppCommand {
    fn from(cmd: Commands) -> tradeflow::AppCommand {
        match cmd {
            Commands::Price { symbol } => tradeflow::AppCommand::Price { symbol },
            Commands::Bulk {
                symbols,
                json,
                show_cache,
            } => tradeflow::AppCommand::Bulk {
                symbols: split_symbols(symbols),
                json,
                show_cache,
            },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

/// Accepts `BTCUSDT ETHUSDT` as well as `BTCUSDT,ETHUSDT`.
fn split_symbols(raw: Vec<String>) -> Vec<String> {
    raw.iter()
        .flat_map(|arg| arg.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => tradeflow::cli::setup::setup(),
        Some(cmd) => tradeflow::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
