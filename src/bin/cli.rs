//! Realty bot CLI
//!
//! Local execution entry point.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use realty_bot::{
    error::Result,
    models::Config,
    pipeline,
    storage::{JsonListingStore, JsonSubscriberStore, ListingStore, SubscriberStore},
};

/// Realty bot - classifieds watcher with Telegram notifications
#[derive(Parser, Debug)]
#[command(
    name = "realty-bot",
    version,
    about = "Notifies Telegram subscribers about new real-estate listings"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the bot: command handling plus the notification loop
    Run,

    /// Fetch and parse the search page once and print the listings
    Check,

    /// Validate configuration
    Validate,

    /// Show stored snapshot and subscriber info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config).with_env();
    log::info!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Run => {
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("Realty bot starting...");
            pipeline::run_bot(Arc::new(config)).await?;
        }

        Command::Check => {
            if let Err(e) = config.validate_search() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            let listings = pipeline::check_once(&config).await?;
            for listing in &listings {
                println!("{} | {} | {}", listing.price, listing.title, listing.link);
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK (includes search query, selectors, and schedule)");

            log::info!("All validations passed!");
        }

        Command::Info => {
            log::info!("Search query: {}", config.search.query);

            let listings = JsonListingStore::new(&config.storage.listings_file);
            match listings.load().await? {
                Some(snapshot) => log::info!(
                    "Snapshot: {} listings in {}",
                    snapshot.len(),
                    listings.path().display()
                ),
                None => log::info!("No snapshot found yet."),
            }

            let subscribers = JsonSubscriberStore::new(&config.storage.subscribers_file);
            log::info!(
                "Subscribers: {} in {}",
                subscribers.load().await?.len(),
                subscribers.path().display()
            );
        }
    }

    Ok(())
}
