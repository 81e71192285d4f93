//! `resale-scout`: look up resale prices and price retail listings against
//! them from the command line. Results are printed as JSON.
//!
//! Configuration comes from `SCOUT_*` environment variables (a `.env` file
//! is honored); see `config.rs`.

mod args;
mod config;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use resale_core::{parse_price, DealAnalyzer, RetailListing};
use resale_market_data::MarketDataService;

use crate::args::{Args, Command};
use crate::config::Config;

fn init_tracing(log_format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::from_env()?;
    init_tracing(&config.log_format);

    let market = Arc::new(MarketDataService::from_config(&config.market, None));
    info!("Market data sources: {:?}", market.source_ids());

    match args.command {
        Command::Lookup { code, name } => {
            if code.is_none() && name.is_none() {
                bail!("lookup needs --code or --name");
            }
            let quote = market
                .get_market_data(code.as_deref(), name.as_deref())
                .await;
            print_json(&quote)
        }
        Command::Compare { query, sources } => {
            let requested: Vec<&str> = sources.iter().map(String::as_str).collect();
            let filter = (!requested.is_empty()).then_some(requested.as_slice());
            let results = market.search_across_sources(&query, filter).await?;
            print_json(&results)
        }
        Command::Evaluate {
            title,
            price,
            code,
            brand,
        } => {
            let current_price = parse_price(&price)
                .with_context(|| format!("Unreadable price '{}'", price))?;
            let mut listing = RetailListing::new(title, current_price);
            if let Some(code) = code {
                listing = listing.with_catalog_code(code);
            }
            if let Some(brand) = brand {
                listing = listing.with_brand(brand);
            }

            let analyzer = DealAnalyzer::new(market, config.analyzer);
            let deal = analyzer.analyze(listing).await?;
            print_json(&deal)
        }
        Command::Deals { path, limit } => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let listings: Vec<RetailListing> = serde_json::from_str(&text)
                .with_context(|| format!("{} is not a JSON array of listings", path.display()))?;

            let analyzer = DealAnalyzer::new(market, config.analyzer);
            let deals = analyzer.most_profitable(listings, limit).await;
            info!("{} profitable deals", deals.len());
            print_json(&deals)
        }
    }
}
