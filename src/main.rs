use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

mod ai;
mod api;
mod app;
mod config;
mod db;
mod error;
mod models;
mod seed;
mod services;

use app::App;
use config::Config;
use db::Repository;

#[derive(Parser)]
#[command(name = "article-digest", version, about = "Summarize articles and draft share comments")]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve {
        /// Address to listen on, overriding `bind_addr`
        #[arg(long)]
        bind: Option<String>,
    },
    /// Insert the sample article summary and exit
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging (info for this crate unless RUST_LOG says otherwise)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "article_digest=info,tower_http=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("failed to load configuration")?;

    match cli.command.unwrap_or(Command::Serve { bind: None }) {
        Command::Seed => {
            let repository = Repository::new(&config.db_path)
                .await
                .with_context(|| format!("failed to open database at {}", config.db_path))?;
            let saved = seed::seed(&repository).await.context("seeding failed")?;
            println!("Seeded sample summary {}", saved.id);
        }
        Command::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.bind_addr.clone());
            let addr: SocketAddr = bind
                .parse()
                .with_context(|| format!("invalid bind address {}", bind))?;

            let app = App::new(&config).await.context("failed to initialize")?;
            tracing::info!("Using model {} with database {}", app.model_version(), config.db_path);

            api::serve(Arc::new(app), addr)
                .await
                .context("server error")?;
        }
    }

    Ok(())
}
