//! Appsettings host - manage application settings from the command line.
//!
//! Builds the same `SettingsStore` an application would construct at
//! startup and runs one command against it.

mod command;

use tracing::info;
use tracing_subscriber::EnvFilter;

use appsettings::SettingsStore;
use appsettings::cache::{CachedSnapshot, TypedCache};
use appsettings::config::Config;
use appsettings::database::Database;

use command::Command;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // Logs go to stderr so command output stays clean
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("appsettings=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let command = Command::parse(std::env::args().skip(1))?;

    let config = Config::from_env()?;
    info!("Configuration loaded successfully");

    info!("Connecting to MongoDB...");
    let db = Database::connect(&config.mongodb_uri, &config.mongodb_database).await?;
    let records = db.settings_store(&config.collection);
    records.ensure_indexes().await?;

    let store = if config.cache_enabled {
        let cache: TypedCache<String, CachedSnapshot> = TypedCache::new(
            config.settings.cache_key.as_str(),
            config.settings.cache_config(),
        );
        SettingsStore::with_cache(records, cache, config.settings)?
    } else {
        SettingsStore::new(records, config.settings)?
    };
    info!("Settings store ready ({:?})", store);

    let output = command.run(&store).await?;
    println!("{output}");

    Ok(())
}
