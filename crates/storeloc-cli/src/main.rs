mod geocode;
mod stores;
mod zips;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use storeloc_core::AppConfig;
use storeloc_db::StoreRepository;
use storeloc_geocode::{NominatimClient, NOMINATIM_BASE_URL};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "storeloc-cli")]
#[command(about = "Store locator maintenance commands")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Look up coordinates for store addresses via Nominatim (OpenStreetMap)
    Geocode(GeocodeArgs),
    #[command(flatten)]
    Storage(StorageCommand),
}

#[derive(Debug, Args)]
struct GeocodeArgs {
    /// Store file (an array, or `{"stores": [...]}`); lat/lon may be absent
    file: PathBuf,
    /// Write here instead of rewriting `file`
    #[arg(long)]
    output: Option<PathBuf>,
    /// Re-geocode stores that already have coordinates
    #[arg(long)]
    all: bool,
    /// Minimum gap between requests; the public instance allows 1 req/s
    #[arg(long, default_value_t = 1100, value_parser = clap::value_parser!(u64).range(1..))]
    interval_ms: u64,
    #[arg(long, env = "STORELOC_NOMINATIM_BASE_URL", default_value = NOMINATIM_BASE_URL)]
    base_url: String,
}

/// Commands that read or write the store database.
#[derive(Debug, Subcommand)]
enum StorageCommand {
    /// Replace all stores with the built-in sample dataset
    Init,
    /// Bulk-create stores from a JSON file (an array, or `{"stores": [...]}`)
    Import { file: PathBuf },
    /// Print every store with its id
    List,
    /// Print distinct retailer names
    Retailers,
    /// Delete one store by id
    Delete { id: u64 },
    /// Delete every store and reset the id counter
    Clear,
    /// Remove stores with a repeated address, keeping the lowest id
    Dedupe,
    /// Resolve a ZIP code and print where the coordinate came from
    Resolve { zip: String },
    /// Print persisted ZIP coordinates
    Zips,
}

/// Storage commands write through to the database, so the in-memory
/// fallback would report success and then lose everything on exit.
fn require_database(config: &AppConfig) -> anyhow::Result<()> {
    if config.database_url.is_none() {
        anyhow::bail!(
            "DATABASE_URL is not set; storeloc-cli needs the Postgres database the server uses"
        );
    }
    Ok(())
}

async fn run_geocode(config: &AppConfig, args: &GeocodeArgs) -> anyhow::Result<()> {
    let client = NominatimClient::with_base_url(config.geocoder_timeout_secs, &args.base_url)?;
    let pace = Duration::from_millis(args.interval_ms);
    geocode::run_geocode(&client, &args.file, args.output.as_deref(), args.all, pace).await?;
    Ok(())
}

async fn run_storage(config: &AppConfig, command: StorageCommand) -> anyhow::Result<()> {
    require_database(config)?;
    let kv = storeloc_db::open_store(config).await?;
    let repo = StoreRepository::new(Arc::clone(&kv));

    match command {
        StorageCommand::Init => stores::run_init(&repo).await,
        StorageCommand::Import { file } => stores::run_import(&repo, &file).await,
        StorageCommand::List => stores::run_list(&repo).await,
        StorageCommand::Retailers => stores::run_retailers(&repo).await,
        StorageCommand::Delete { id } => stores::run_delete(&repo, id).await,
        StorageCommand::Clear => stores::run_clear(&repo).await,
        StorageCommand::Dedupe => stores::run_dedupe(&repo).await,
        StorageCommand::Resolve { zip } => zips::run_resolve(config, kv, &zip).await,
        StorageCommand::Zips => zips::run_zips(config, kv).await,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("storeloc-cli: no command given, see --help");
        return Ok(());
    };

    let config = storeloc_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match command {
        Commands::Geocode(args) => run_geocode(&config, &args).await,
        Commands::Storage(command) => run_storage(&config, command).await,
    }
}
