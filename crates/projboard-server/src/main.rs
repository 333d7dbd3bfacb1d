//! projboard-server: serves the projects and tasks REST surface.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use projboard::server::{HttpServer, ProjectRouter, ServerConfig};
use projboard::shared::init_logging;
use projboard::store::{ProjectStore, SqliteStore};
use tracing::info;

/// Projects and tasks REST server
#[derive(Parser, Debug)]
#[command(name = "projboard-server")]
#[command(about = "Serve projects and tasks from an embedded SQLite store", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML configuration file (defaults to ./projboard.toml when present)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Interface to listen on
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (0 picks a free port)
    #[arg(long, short)]
    port: Option<u16>,

    /// Path prefix in front of /projects
    #[arg(long)]
    base_path: Option<String>,

    /// SQLite database file (in-memory when omitted)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Load the demo projects into an empty database
    #[arg(long)]
    seed: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long)]
    log: Option<String>,
}

impl Cli {
    fn apply(self, config: &mut ServerConfig) {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(base_path) = self.base_path {
            config.base_path = base_path;
        }
        if let Some(db) = self.db {
            config.database.path = Some(db);
        }
        if self.seed {
            config.database.seed = true;
        }
        if let Some(log) = self.log {
            config.log_filter = log;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ServerConfig::load(cli.config.as_deref()).context("loading configuration")?;
    cli.apply(&mut config);
    config.validate().context("validating configuration")?;

    init_logging(&config.log_filter).context("initialising logging")?;

    let store = match &config.database.path {
        Some(path) => SqliteStore::open(path)
            .with_context(|| format!("opening database {}", path.display()))?,
        None => SqliteStore::open_in_memory().context("opening in-memory database")?,
    };
    if config.database.seed {
        store.seed_demo_data().context("seeding demo data")?;
    }

    let router = ProjectRouter::new(Arc::new(store.clone()), config.base_path.clone());
    let (addr, server) = HttpServer::new(config.clone(), router)
        .bind(shutdown_signal())
        .await
        .with_context(|| format!("binding {}:{}", config.host, config.port))?;
    info!("Serving http://{}{}/projects", addr, config.base_path);

    server.await.context("server task failed")?;

    store.close().await.context("closing database")?;
    info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until the process is killed.
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
