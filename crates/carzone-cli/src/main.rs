mod export;
mod scrape;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "carzone-cli")]
#[command(about = "Harvest vehicle listings from the Carzone catalog API")]
struct Cli {
    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch every listing page and write the records to CSV
    Scrape(ScrapeArgs),
    /// Ask the catalog how many pages and listings it holds
    Discover,
}

/// Per-run overrides for values otherwise taken from the environment.
#[derive(Debug, Default, Args)]
struct ScrapeArgs {
    /// Pages to fetch; zero or negative asks the API
    #[arg(long, allow_negative_numbers = true)]
    pages: Option<i64>,

    /// Index of the first page (0 or 1, per API convention)
    #[arg(long)]
    first_page: Option<u32>,

    /// Pages fetched concurrently per chunk
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Pause between chunks, in milliseconds
    #[arg(long)]
    inter_chunk_delay_ms: Option<u64>,

    /// Attempts per request before giving up
    #[arg(long)]
    max_retries: Option<u32>,

    /// Fixed wait between attempts, in milliseconds
    #[arg(long)]
    retry_delay_ms: Option<u64>,

    /// Fetch the detail payload for every listing
    #[arg(long)]
    enrich: bool,

    /// Detail fetches in flight at once within a page
    #[arg(long)]
    detail_concurrency: Option<usize>,

    /// CSV destination
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Print the resolved plan and exit without fetching
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let mut config = carzone_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_directive(&config.log_level, cli.verbose, cli.quiet)))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Scrape(args) => {
            scrape::apply_overrides(&mut config, &args)?;
            scrape::run_scrape(&config, args.dry_run).await
        }
        Commands::Discover => scrape::run_discover(&config).await,
    }
}

/// Resolves the fallback log filter from config and the `-v`/`-q` flags.
fn log_directive(configured: &str, verbose: u8, quiet: bool) -> String {
    if quiet {
        return "error".to_owned();
    }
    match verbose {
        0 => configured.to_owned(),
        1 => "debug".to_owned(),
        _ => "trace".to_owned(),
    }
}
