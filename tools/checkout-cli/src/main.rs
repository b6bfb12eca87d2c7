//! Checkout CLI
//!
//! Quote and place storefront orders against a json-server store.

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

mod commands;
mod config;
mod context;
mod output;

use commands::*;

/// Checkout CLI - price carts, apply vouchers and place orders.
#[derive(Parser)]
#[command(name = "checkout")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output format (json for machine-readable).
    #[arg(long, global = true)]
    json: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Price the cart with shipping and an optional voucher.
    Quote(QuoteArgs),

    /// Place an order from the cart.
    Place(PlaceArgs),

    /// List vouchers a customer can use.
    Vouchers(VouchersArgs),

    /// Order history and status changes.
    Orders(OrdersArgs),

    /// Confirm or fail an online payment.
    Payment(PaymentArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup output formatting
    let output = output::Output::new(cli.verbose > 0, cli.json);

    // Load config
    let config_path = cli.config.as_deref();
    let ctx = context::Context::load(config_path, output)?;

    match ctx.config.log_config(cli.verbose) {
        Ok(log) => {
            if let Err(e) = checkout_observability::init_logging(&log) {
                ctx.output.warn(&e.to_string());
            }
        }
        Err(e) => ctx.output.warn(&format!("{:#}", e)),
    }

    let result = match cli.command {
        Commands::Quote(args) => commands::quote::run(args, &ctx).await,
        Commands::Place(args) => commands::place::run(args, &ctx).await,
        Commands::Vouchers(args) => commands::vouchers::run(args, &ctx).await,
        Commands::Orders(args) => commands::orders::run(args, &ctx).await,
        Commands::Payment(args) => commands::payment::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
