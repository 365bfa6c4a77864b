//! # Listing Search CLI (`listings`)
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `listings search` | Run one search and print the result view |
//! | `listings providers` | List configured providers and check connectivity |
//! | `listings samples` | Print the fallback sample listings |
//! | `listings serve` | Start the HTTP search service |
//!
//! ## Examples
//!
//! ```bash
//! listings search --location Washington --beds 4+ --max-price 1,000,000
//! listings search --provider rentspree --json
//! listings search --location Stafford --inquire KW004
//! listings --config ./config/listings.toml serve
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use listing_search_core::form::controls;

use listing_search::config::{self, Config};
use listing_search::logging::{init_logging, CLI_FILTER, SERVER_FILTER};
use listing_search::{providers, search, server};

const DEFAULT_CONFIG: &str = "./config/listings.toml";

/// Listing Search: query MLS providers from a search form, with a local
/// sample fallback.
#[derive(Parser)]
#[command(name = "listings", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// When the default path does not exist, a minimal configuration with
    /// no providers is used.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one search.
    ///
    /// Values are given exactly as the form controls hold them, e.g.
    /// `--beds 3+` or `--max-price '$750,000'`.
    Search {
        /// Adapter to use; defaults to `[search].default_provider`.
        #[arg(long)]
        provider: Option<String>,

        #[command(flatten)]
        form: FormArgs,

        /// Print the outcome as JSON.
        #[arg(long)]
        json: bool,

        /// Print the contact-form message for this listing id from the
        /// results instead of the results themselves.
        #[arg(long)]
        inquire: Option<String>,
    },

    /// List configured providers and probe their connectivity.
    Providers,

    /// Print the listings the fallback path filters.
    Samples {
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP search service on `[server].bind`.
    Serve,
}

/// One flag per search form control.
#[derive(Args, Default)]
struct FormArgs {
    /// City.
    #[arg(long)]
    location: Option<String>,
    #[arg(long = "property-type")]
    property_type: Option<String>,
    /// Minimum bedrooms, e.g. `3` or `3+`.
    #[arg(long)]
    beds: Option<String>,
    /// Minimum bathrooms.
    #[arg(long)]
    baths: Option<String>,
    #[arg(long = "min-price")]
    min_price: Option<String>,
    #[arg(long = "max-price")]
    max_price: Option<String>,
    /// Minimum living area in square feet.
    #[arg(long)]
    sqft: Option<String>,
    /// Maximum days on market.
    #[arg(long = "days-on-market")]
    days_on_market: Option<String>,
    #[arg(long)]
    status: Option<String>,
}

impl FormArgs {
    fn into_form(self) -> BTreeMap<String, String> {
        [
            (controls::LOCATION, self.location),
            (controls::PROPERTY_TYPE, self.property_type),
            (controls::BEDS, self.beds),
            (controls::BATHS, self.baths),
            (controls::MIN_PRICE, self.min_price),
            (controls::MAX_PRICE, self.max_price),
            (controls::SQFT, self.sqft),
            (controls::DAYS_ON_MARKET, self.days_on_market),
            (controls::STATUS, self.status),
        ]
        .into_iter()
        .filter_map(|(control, value)| value.map(|v| (control.to_string(), v)))
        .collect()
    }
}

fn load(path: &std::path::Path) -> anyhow::Result<Config> {
    if !path.exists() && path == std::path::Path::new(DEFAULT_CONFIG) {
        return Ok(Config::minimal());
    }
    config::load_config(path)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.command {
        Commands::Serve => SERVER_FILTER,
        _ => CLI_FILTER,
    };
    init_logging(filter);

    let cfg = load(&cli.config)?;

    match cli.command {
        Commands::Search {
            provider,
            form,
            json,
            inquire,
        } => {
            search::run_search(
                &cfg,
                provider.as_deref(),
                form.into_form(),
                json,
                inquire.as_deref(),
            )
            .await?;
        }
        Commands::Providers => {
            providers::list_providers(&cfg).await?;
        }
        Commands::Samples { json } => {
            search::list_samples(&cfg, json)?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
