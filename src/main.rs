use anyhow::Context;
use clap::{Parser, Subcommand};
use configuration::{Settings, StorageBackend, DEFAULT_CONFIG_FILE};
use std::path::PathBuf;

/// The main entry point for the vehicle catalog service.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the environment may already be set.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let mut settings = configuration::load_config_from(&config_path, None)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;

    if let Commands::Serve(args) = &cli.command {
        args.apply(&mut settings);
    }

    // The guard flushes the file writer on drop, so it must live until exit.
    let _log_guard = configuration::init_tracing(&settings.logging)?;

    // Execute the appropriate command
    match cli.command {
        Commands::Serve(_) => web_server::run_server(settings).await,
        Commands::Migrate => handle_migrate(&settings).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// A CRUD web service for a catalog of vehicles.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults to `config.toml`, which may be absent.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API.
    Serve(ServeArgs),
    /// Apply pending database migrations and exit.
    Migrate,
}

#[derive(Parser)]
struct ServeArgs {
    /// Port to listen on, overriding the configuration.
    #[arg(long)]
    port: Option<u16>,

    /// Storage backend, overriding the configuration.
    #[arg(long, value_enum)]
    storage: Option<StorageBackend>,
}

impl ServeArgs {
    fn apply(&self, settings: &mut Settings) {
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(backend) = self.storage {
            settings.database.backend = backend;
        }
    }
}

// ==============================================================================
// Migrate Command Logic
// ==============================================================================

async fn handle_migrate(settings: &Settings) -> anyhow::Result<()> {
    tracing::info!("Applying database migrations");
    let db_pool = database::connect(&settings.database).await?;
    database::run_migrations(&db_pool).await?;
    tracing::info!("Database schema is up to date");
    Ok(())
}
