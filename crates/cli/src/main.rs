//! Strand CLI - Drive the cart engine from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Price a configuration without touching the cart
//! strand price 1 --select Length=20\" --select Color=Blonde
//!
//! # Add two units, refusing partial selections
//! strand add 1 -q 2 --select Length=20\" --select Color=Blonde --require-all
//!
//! # Change or remove a line
//! strand update 1 3 --select Length=20\" --select Color=Blonde
//! strand remove 1 --select Length=20\" --select Color=Blonde
//!
//! # Inspect, reconcile, empty
//! strand show
//! strand refresh
//! strand clear
//! ```
//!
//! # Commands
//!
//! - `price` - Resolve a unit price from the catalog
//! - `add` / `remove` / `update` / `clear` - Mutate the persisted cart
//! - `show` - List lines and totals
//! - `refresh` - Reconcile the cart with the pricing service
//!
//! The catalog is a JSON array of products (`--catalog`, default
//! `catalog.json`). Cart location, pricing service and currency come from the
//! `STRAND_*` environment variables.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use strand_cart::{AddToCart, CartConfig, Selection};
use strand_core::ProductId;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "strand")]
#[command(author, version, about = "Strand cart tools")]
struct Cli {
    /// Product catalog (JSON array of products)
    #[arg(long, global = true, default_value = "catalog.json")]
    catalog: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the unit price of a product configuration
    Price {
        /// Product id
        product: ProductId,

        /// Variant selection, repeatable
        #[arg(short, long = "select", value_name = "TYPE=VALUE", value_parser = parse_selection)]
        select: Vec<(String, String)>,
    },
    /// Add a product configuration to the cart
    Add {
        /// Product id
        product: ProductId,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        /// Variant selection, repeatable
        #[arg(short, long = "select", value_name = "TYPE=VALUE", value_parser = parse_selection)]
        select: Vec<(String, String)>,

        /// Reject the add unless every variant type is selected
        #[arg(long)]
        require_all: bool,
    },
    /// Remove a line from the cart
    Remove {
        /// Product id
        product: ProductId,

        /// Variant selection, repeatable
        #[arg(short, long = "select", value_name = "TYPE=VALUE", value_parser = parse_selection)]
        select: Vec<(String, String)>,
    },
    /// Set the quantity of a line (0 or less removes it)
    Update {
        /// Product id
        product: ProductId,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,

        /// Variant selection, repeatable
        #[arg(short, long = "select", value_name = "TYPE=VALUE", value_parser = parse_selection)]
        select: Vec<(String, String)>,
    },
    /// Empty the cart
    Clear,
    /// Show cart lines and totals
    Show,
    /// Reconcile the cart with the pricing service
    Refresh,
}

/// Parse a `TYPE=VALUE` selection argument.
fn parse_selection(raw: &str) -> Result<(String, String), String> {
    let (variant_type, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected TYPE=VALUE, got `{raw}`"))?;
    let variant_type = variant_type.trim();
    if variant_type.is_empty() {
        return Err(format!("missing variant type in `{raw}`"));
    }
    Ok((variant_type.to_string(), value.trim().to_string()))
}

#[tokio::main]
async fn main() {
    // Load .env first so RUST_LOG can come from it
    dotenvy::dotenv().ok();

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "strand_cart=info,strand_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = CartConfig::from_env()?;
    tracing::debug!(?config, "Loaded configuration");

    match cli.command {
        Commands::Price { product, select } => {
            let catalog = commands::catalog::Catalog::load(&cli.catalog)?;
            commands::price::run(&catalog, product, &selection(select), config.currency)?;
        }
        Commands::Add {
            product,
            quantity,
            select,
            require_all,
        } => {
            let catalog = commands::catalog::Catalog::load(&cli.catalog)?;
            let mut request = AddToCart::new().quantity(quantity).selection(selection(select));
            if require_all {
                request = request.require_full_selection();
            }
            let cart = commands::cart::open(&config)?;
            commands::cart::add(&cart, &catalog, product, request)?;
            cart.flush()?;
        }
        Commands::Remove { product, select } => {
            let cart = commands::cart::open(&config)?;
            cart.remove_from_cart(product, &selection(select));
            cart.flush()?;
        }
        Commands::Update {
            product,
            quantity,
            select,
        } => {
            let cart = commands::cart::open(&config)?;
            cart.update_quantity(product, quantity, &selection(select));
            cart.flush()?;
        }
        Commands::Clear => {
            let cart = commands::cart::open(&config)?;
            cart.clear_cart();
            cart.flush()?;
        }
        Commands::Show => {
            let cart = commands::cart::open(&config)?;
            commands::cart::show(&cart, config.currency)?;
        }
        Commands::Refresh => {
            let cart = commands::cart::open(&config)?;
            cart.refresh_cart().await?;
            cart.flush()?;
            commands::cart::show(&cart, config.currency)?;
        }
    }
    Ok(())
}

fn selection(pairs: Vec<(String, String)>) -> Selection {
    pairs.into_iter().collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_selection() {
        assert_eq!(
            parse_selection("Length=20\"").unwrap(),
            ("Length".to_string(), "20\"".to_string())
        );
        assert_eq!(
            parse_selection(" Color = Dark = Brown ").unwrap(),
            ("Color".to_string(), "Dark = Brown".to_string())
        );
        assert!(parse_selection("Color").is_err());
        assert!(parse_selection("=Blonde").is_err());
    }

    #[test]
    fn test_update_accepts_negative_quantity() {
        let cli = Cli::try_parse_from(["strand", "update", "3", "-1", "--select", "Color=Black"])
            .unwrap();
        match cli.command {
            Commands::Update {
                product, quantity, ..
            } => {
                assert_eq!(product, ProductId::new(3));
                assert_eq!(quantity, -1);
            }
            _ => panic!("expected update"),
        }
    }
}
