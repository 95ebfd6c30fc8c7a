//! Configuration
//!
//! Command-line arguments with environment fallbacks. A `.env` file in the
//! working directory is loaded first if present.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use rusty_money::iso::{self, Currency};
use thiserror::Error;

use crate::recommendations::lookup::DEFAULT_RECOMMENDER_URL;

/// Currency code not supported for display.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unsupported currency: {0}")]
pub struct UnknownCurrency(pub String);

/// Resolve an ISO currency code.
///
/// # Errors
///
/// Returns [`UnknownCurrency`] for codes other than INR, GBP, USD and EUR.
pub fn parse_currency(code: &str) -> Result<&'static Currency, UnknownCurrency> {
    match code.trim().to_ascii_uppercase().as_str() {
        "INR" => Ok(iso::INR),
        "GBP" => Ok(iso::GBP),
        "USD" => Ok(iso::USD),
        "EUR" => Ok(iso::EUR),
        _ => Err(UnknownCurrency(code.to_string())),
    }
}

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn", global = true)]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact, global = true)]
    pub log_format: LogFormat,
}

/// Greencart configuration
#[derive(Debug, Parser)]
#[command(
    name = "greencart",
    about = "Greener shopping with a weekly budget",
    long_about = None
)]
pub struct Config {
    /// File holding the persisted cart, budget, impact and favorites
    #[arg(long, env = "GREENCART_DATA_FILE", default_value = "greencart.json", global = true)]
    pub data_file: PathBuf,

    /// Recommender base address
    #[arg(long, env = "RECOMMENDER_URL", default_value = DEFAULT_RECOMMENDER_URL, global = true)]
    pub recommender_url: String,

    /// Display currency (INR, GBP, USD, EUR)
    #[arg(
        long,
        env = "GREENCART_CURRENCY",
        default_value = "INR",
        value_parser = parse_currency,
        global = true
    )]
    pub currency: &'static Currency,

    /// Product catalog YAML; the bundled catalog is used if unset
    #[arg(long, env = "GREENCART_CATALOG", global = true)]
    pub catalog: Option<PathBuf>,

    /// Allowance granted at each weekly reset
    #[arg(long, env = "GREENCART_WEEKLY_ALLOWANCE", default_value = "100", global = true)]
    pub weekly_allowance: Decimal,

    /// Logging settings
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

impl Config {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}

/// Subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show or change the cart
    Cart {
        /// Cart action; shows the cart if omitted
        #[command(subcommand)]
        action: Option<CartAction>,
    },

    /// Show or top up the weekly budget
    Budget {
        /// Budget action; shows the budget if omitted
        #[command(subcommand)]
        action: Option<BudgetAction>,
    },

    /// List or toggle favorites
    Favorites {
        /// Favorites action; lists favorites if omitted
        #[command(subcommand)]
        action: Option<FavoritesAction>,
    },

    /// Show or reset the environmental impact totals
    Impact {
        /// Impact action; shows the totals if omitted
        #[command(subcommand)]
        action: Option<ImpactAction>,
    },

    /// Browse the catalog and its greener alternatives
    Browse(BrowseArgs),

    /// Ask the recommender for a greener alternative
    Suggest(SuggestArgs),

    /// List the recommender's categories
    Categories,

    /// Show budget, cart and impact together
    Dashboard,

    /// Show sustainability tips
    Tips,
}

/// Cart actions
#[derive(Debug, Subcommand)]
pub enum CartAction {
    /// Show the cart
    Show,

    /// Add one unit of a catalog product
    Add {
        /// Product id
        id: String,
    },

    /// Remove a line
    Remove {
        /// Product id
        id: String,
    },

    /// Increase a line's quantity by one
    Inc {
        /// Product id
        id: String,
    },

    /// Decrease a line's quantity by one, never below one
    Dec {
        /// Product id
        id: String,
    },

    /// Empty the cart
    Clear,
}

/// Budget actions
#[derive(Debug, Subcommand)]
pub enum BudgetAction {
    /// Show the budget
    Show,

    /// Add to this week's budget
    TopUp {
        /// Amount to add, e.g. 5.00
        amount: String,
    },
}

/// Favorites actions
#[derive(Debug, Subcommand)]
pub enum FavoritesAction {
    /// List favorites
    List,

    /// Add or remove a catalog product
    Toggle {
        /// Product id
        id: String,
    },
}

/// Impact actions
#[derive(Debug, Subcommand)]
pub enum ImpactAction {
    /// Show the totals
    Show,

    /// Zero the totals
    Reset,
}

/// Catalog browsing arguments
#[derive(Debug, Args)]
pub struct BrowseArgs {
    /// Case-insensitive text matched against name or category
    #[arg(short, long, default_value = "")]
    pub search: String,

    /// Exact category
    #[arg(short, long)]
    pub category: Option<String>,

    /// Maximum price, also applied to alternatives
    #[arg(short, long)]
    pub max_price: Option<Decimal>,

    /// Show greener alternatives for this product id
    #[arg(long)]
    pub select: Option<String>,

    /// Add the alternative at this position to the cart
    #[arg(long, requires = "select")]
    pub accept: Option<usize>,
}

/// Recommender lookup arguments
#[derive(Debug, Args)]
pub struct SuggestArgs {
    /// Product name
    #[arg(short, long, default_value = "")]
    pub product: String,

    /// Category
    #[arg(short, long, default_value = "")]
    pub category: String,

    /// Add the alternative to the cart
    #[arg(long)]
    pub add: bool,
}
