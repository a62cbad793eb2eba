//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use storecheck::{Category, RunConfig};

/// storecheck: end-to-end checks for an OpenCart storefront
#[derive(Parser, Debug)]
#[command(name = "storecheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Browser and storefront settings
    #[command(flatten)]
    pub run: RunConfig,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scrape a category listing
    Scrape(ScrapeArgs),

    /// Check a category listing against its fixture
    Verify(VerifyArgs),

    /// Record a fixture from the live listing
    Record(RecordArgs),

    /// Summarize fixture files without a browser
    Fixtures(FixturesArgs),

    /// Show the effective configuration
    Config,
}

/// Arguments for the scrape command
#[derive(Args, Debug)]
pub struct ScrapeArgs {
    /// Category (desktop, laptop, phone)
    #[arg(value_parser = parse_category)]
    pub category: Category,

    /// Switch to this currency before scraping
    #[arg(long)]
    pub currency: Option<String>,

    /// Only the first listing page
    #[arg(long)]
    pub single_page: bool,

    /// Names only, without prices
    #[arg(long)]
    pub names: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: ScrapeFormat,
}

/// Arguments for the verify command
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Category (desktop, laptop, phone)
    #[arg(value_parser = parse_category)]
    pub category: Category,

    /// Currencies to check prices in (repeatable)
    #[arg(long = "currency", default_values_t = ["USD".to_string(), "EUR".to_string(), "GBP".to_string()])]
    pub currencies: Vec<String>,

    /// Skip the name check
    #[arg(long)]
    pub skip_names: bool,
}

/// Arguments for the record command
#[derive(Args, Debug)]
pub struct RecordArgs {
    /// Category (desktop, laptop, phone)
    #[arg(value_parser = parse_category)]
    pub category: Category,
}

/// Arguments for the fixtures command
#[derive(Args, Debug)]
pub struct FixturesArgs {
    /// Limit to one category
    #[arg(value_parser = parse_category)]
    pub category: Option<Category>,
}

/// Scrape output format
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScrapeFormat {
    /// One line per product
    #[default]
    Text,
    /// JSON array
    Json,
}

/// Color argument
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

fn parse_category(value: &str) -> Result<Category, String> {
    value.parse::<Category>().map_err(|e| e.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::ColorChoice;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("storecheck").chain(args.iter().copied())).unwrap()
    }

    mod parse_tests {
        use super::*;

        #[test]
        fn test_scrape_defaults() {
            let cli = parse(&["scrape", "laptops"]);
            let Commands::Scrape(args) = cli.command else {
                panic!("expected scrape");
            };
            assert_eq!(args.category, Category::Laptop);
            assert!(args.currency.is_none());
            assert!(!args.single_page);
            assert_eq!(args.format, ScrapeFormat::Text);
        }

        #[test]
        fn test_scrape_options() {
            let cli = parse(&["scrape", "phone", "--currency", "EUR", "--single-page", "--names", "--format", "json"]);
            let Commands::Scrape(args) = cli.command else {
                panic!("expected scrape");
            };
            assert_eq!(args.currency.as_deref(), Some("EUR"));
            assert!(args.single_page);
            assert!(args.names);
            assert_eq!(args.format, ScrapeFormat::Json);
        }

        #[test]
        fn test_verify_default_currencies() {
            let cli = parse(&["verify", "desktop"]);
            let Commands::Verify(args) = cli.command else {
                panic!("expected verify");
            };
            assert_eq!(args.currencies, vec!["USD", "EUR", "GBP"]);
            assert!(!args.skip_names);
        }

        #[test]
        fn test_verify_repeated_currency() {
            let cli = parse(&["verify", "desktop", "--currency", "GBP", "--currency", "USD", "--skip-names"]);
            let Commands::Verify(args) = cli.command else {
                panic!("expected verify");
            };
            assert_eq!(args.currencies, vec!["GBP", "USD"]);
            assert!(args.skip_names);
        }

        #[test]
        fn test_unknown_category_rejected() {
            let result = Cli::try_parse_from(["storecheck", "record", "tablets"]);
            assert!(result.is_err());
        }

        #[test]
        fn test_fixtures_optional_category() {
            let cli = parse(&["fixtures"]);
            assert!(matches!(cli.command, Commands::Fixtures(FixturesArgs { category: None })));
        }

        #[test]
        fn test_global_flags() {
            let cli = parse(&["config", "-vv", "--color", "never"]);
            assert_eq!(cli.verbose, 2);
            assert_eq!(ColorChoice::from(cli.color), ColorChoice::Never);
        }

        #[test]
        fn test_run_config_flags() {
            let cli = parse(&["--base-url", "http://localhost:8080", "--headless", "false", "config"]);
            assert_eq!(cli.run.base_url, "http://localhost:8080");
            assert!(!cli.run.headless);
        }
    }
}
