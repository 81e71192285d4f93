use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about = "Resale price lookup and deal evaluation", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Consolidated market data for one item.
    Lookup {
        /// Catalog (style) code, e.g. DD1391-100. Preferred over --name.
        #[arg(long)]
        code: Option<String>,
        /// Free-text product name.
        #[arg(long)]
        name: Option<String>,
    },

    /// Raw search results from each marketplace, side by side.
    Compare {
        query: String,
        /// Restrict to a marketplace (repeatable): stockx, goat, flightclub.
        #[arg(long = "source")]
        sources: Vec<String>,
    },

    /// Price one retail listing against the resale market.
    Evaluate {
        #[arg(long)]
        title: String,
        /// Retail price as printed, e.g. "$110.00".
        #[arg(long)]
        price: String,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        brand: Option<String>,
    },

    /// Price a JSON file of listings and print the most profitable ones.
    Deals {
        path: PathBuf,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compare_with_sources() {
        let args = Args::parse_from([
            "resale-scout",
            "compare",
            "dunk low",
            "--source",
            "stockx",
            "--source",
            "goat",
        ]);

        match args.command {
            Command::Compare { query, sources } => {
                assert_eq!(query, "dunk low");
                assert_eq!(sources, vec!["stockx", "goat"]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_deals_default_limit() {
        let args = Args::parse_from(["resale-scout", "deals", "listings.json"]);

        assert!(matches!(args.command, Command::Deals { limit: 10, .. }));
    }
}
