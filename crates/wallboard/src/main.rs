//! wallboard — drive a fleet of URL-rotating display terminals.

#![deny(unsafe_code)]

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use wallboard_server::{AppState, Broker, serve};
use wallboard_store::Store;

#[derive(Debug, Parser)]
#[command(name = "wallboard", about = "take back control from your televisions")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the web server.
    Run {
        /// Address to listen on.
        #[arg(long, short = 'H', default_value = "0.0.0.0")]
        listen: IpAddr,

        /// Port to listen on.
        #[arg(long, short, env = "WALLBOARD_PORT", default_value_t = 8080)]
        port: u16,

        /// Path to the SQLite database.
        #[arg(long, short, env = "WALLBOARD_DATABASE", default_value = "wallboard.db")]
        database: PathBuf,
    },
    /// Create the database.
    Install {
        /// Path for the new SQLite database.
        #[arg(long, short, env = "WALLBOARD_DATABASE", default_value = "wallboard.db")]
        database: PathBuf,
    },
    /// Remove the database (WARNING: very destructive).
    Clean {
        /// Path to the SQLite database.
        #[arg(long, short, env = "WALLBOARD_DATABASE", default_value = "wallboard.db")]
        database: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("wallboard=info,wallboard_server=info,wallboard_store=info")
        }))
        .init();

    match Cli::parse().command {
        Command::Run {
            listen,
            port,
            database,
        } => run(listen, port, &database).await,
        Command::Install { database } => install(&database),
        Command::Clean { database } => clean(&database),
    }
}

async fn run(listen: IpAddr, port: u16, database: &Path) -> Result<()> {
    if !database.exists() {
        bail!("database does not exist, run `wallboard install` first");
    }
    info!(database = %database.display(), "using database");

    let store = Store::open(database).context("opening database")?;
    let broker = Broker::spawn(store.clone());
    let state = AppState::new(store, broker);

    let addr = SocketAddr::new(listen, port);
    serve(state, addr).await.context("web server failed")
}

fn install(database: &Path) -> Result<()> {
    if database.exists() {
        bail!("database already exists");
    }
    info!(database = %database.display(), "creating database");

    let store = Store::open(database).context("creating database")?;
    store.create_schema().context("creating schema")?;

    info!("database created");
    Ok(())
}

fn clean(database: &Path) -> Result<()> {
    if !database.exists() {
        bail!("database does not exist");
    }
    std::fs::remove_file(database).context("removing database")?;

    info!(database = %database.display(), "database removed");
    Ok(())
}
