use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folio::api::auth::{JwtAuth, Role};
use folio::api::server::{ApiServer, ApiServerConfig};
use folio::config::AppConfig;
use folio_store::{ArtifactCatalog, FsBlobStore};

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Shared literature repository backend", long_about = None)]
struct Cli {
    /// Path to a YAML config file (default: ./folio.yaml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// JWT secret key (can also use JWT_SECRET env var)
        #[arg(long)]
        jwt_secret: Option<String>,

        /// Data directory for blobs and the catalog index
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },

    /// Print storage statistics for a data directory
    Stats {
        /// Data directory
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },

    /// Purge soft-deleted artifacts past the retention window
    Cleanup {
        /// Data directory
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },

    /// Mint a JWT for scripting against the API
    Token {
        /// User the token identifies
        user: String,

        /// Grant the operator role
        #[arg(long)]
        operator: bool,

        /// Expiry in hours
        #[arg(long, default_value = "24")]
        expires: i64,

        /// JWT secret key (can also use JWT_SECRET env var)
        #[arg(long)]
        jwt_secret: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "folio=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve {
            host,
            port,
            jwt_secret,
            data_dir,
        } => {
            let secret = resolve_jwt_secret(jwt_secret, &config);

            let server_config = ApiServerConfig {
                host: host.unwrap_or_else(|| config.host.clone()),
                port: port.unwrap_or(config.port),
                jwt_secret: secret,
                data_dir: data_dir.unwrap_or_else(|| config.data_dir.clone()),
                max_file_size: config.max_file_size,
                cache_max_memory_bytes: config.cache_max_memory_bytes,
                retention: config.retention_secs.map(Duration::from_secs),
                operators: config.operators.clone(),
            };

            println!(
                "Starting API server on {}:{}",
                server_config.host, server_config.port
            );
            ApiServer::new(server_config).start().await?;
        }

        Commands::Stats { data_dir } => {
            let catalog = open_catalog(data_dir, &config).await?;

            let stats = catalog.stats().await;
            let deleted = catalog.list_deleted(None).await;

            println!("Storage Statistics:");
            println!("  Files:        {}", stats.file_count);
            println!("  Total size:   {} bytes", stats.total_size);
            println!("  Average size: {:.1} bytes", stats.average_size);
            match &stats.largest_file {
                Some(largest) => println!(
                    "  Largest:      {} ({} bytes)",
                    largest.filename, largest.size
                ),
                None => println!("  Largest:      -"),
            }
            println!("  Recycle bin:  {} files", deleted.len());

            if !stats.by_type.is_empty() {
                println!("\nBy type:");
                let mut by_type: Vec<_> = stats.by_type.iter().collect();
                by_type.sort_by(|a, b| a.0.cmp(b.0));
                for (tag, type_stats) in by_type {
                    println!(
                        "  {:<8} {} files, {} bytes",
                        tag, type_stats.count, type_stats.total_size
                    );
                }
            }
        }

        Commands::Cleanup { data_dir } => {
            let catalog = open_catalog(data_dir, &config).await?;

            let report = catalog.cleanup().await?;
            println!(
                "Purged {} artifacts, freed {} bytes",
                report.purged, report.freed_space
            );
            if report.failed > 0 {
                println!(
                    "{} artifacts failed to purge and remain in the recycle bin",
                    report.failed
                );
            }
        }

        Commands::Token {
            user,
            operator,
            expires,
            jwt_secret,
        } => {
            let secret = resolve_jwt_secret(jwt_secret, &config);
            let auth = JwtAuth::new(&secret);
            let role = if operator { Role::Operator } else { Role::Member };

            let token = auth.generate_token(&user, role, Some(expires))?;
            println!("{}", token);
        }
    }

    Ok(())
}

fn resolve_jwt_secret(cli_value: Option<String>, config: &AppConfig) -> String {
    cli_value
        .or_else(|| config.resolve_jwt_secret())
        .unwrap_or_else(|| {
            println!("Warning: Using default JWT secret. Set JWT_SECRET env var or --jwt-secret for production.");
            "default_secret_change_in_production".to_string()
        })
}

async fn open_catalog(data_dir: Option<PathBuf>, config: &AppConfig) -> Result<ArtifactCatalog> {
    let data_dir = data_dir.unwrap_or_else(|| config.data_dir.clone());
    let blobs = Arc::new(FsBlobStore::new(data_dir.join("blobs")).await?);

    let mut catalog = ArtifactCatalog::new(blobs);
    if let Some(retention_secs) = config.retention_secs {
        catalog = catalog.with_retention(Duration::from_secs(retention_secs));
    }
    Ok(catalog.with_index(data_dir.join("catalog.json")).await?)
}
