//! docchat - chat with your documents from the terminal
//!
//! Upload a PDF, Word, text or HTML document to the document chat backend,
//! then ask questions about it. The signed-in identity and its conversations
//! are kept locally so they survive restarts.

mod app;
mod config;
mod error;
mod models;
mod screens;
mod services;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::{Arc, Mutex};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::services::{ApiClient, Backend, ChatStore, LocalStore, SessionStore};

/// docchat - Ask questions about your documents
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Config file path (default: ~/.config/docchat/config.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Backend base URL
    #[arg(long, env = "DOCCHAT_API_URL")]
    api_url: Option<String>,

    /// Directory for the local database and log file
    #[arg(long)]
    data_dir: Option<String>,

    /// Complete email verification with the token from the link, then start
    #[arg(long, value_name = "TOKEN")]
    verify: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = if let Some(path) = &args.config {
        config::Config::from_file(path)?
    } else {
        config::Config::load()?
    };

    if let Some(api_url) = args.api_url {
        config.api.base_url = api_url;
    }
    if let Some(data_dir) = args.data_dir {
        config.storage.data_dir = data_dir;
    }

    // Set up logging. The terminal belongs to the UI, so log to a file.
    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_path())
        .with_context(|| format!("Failed to open log file {}", config.log_path().display()))?;

    let filter = if args.debug {
        "docchat=debug,info"
    } else {
        "docchat=info,warn"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .init();

    // Stores
    let local = LocalStore::open(&config.database_path())
        .with_context(|| format!("Failed to open {}", config.database_path().display()))?;
    let client = ApiClient::new(&config.api)?;
    info!("Starting docchat against {}", client.base_url());
    let backend: Arc<dyn Backend> = Arc::new(client);

    let mut session = SessionStore::new(local.clone(), backend.clone());
    let mut chats = ChatStore::new(local, backend, config.upload.clone());
    session.restore()?;

    let mut status = match session.current() {
        Some(user) => format!("Welcome back, {}", user.display_name()),
        None => "Sign in to continue".to_string(),
    };

    if let Some(token) = args.verify {
        match session.verify(&token).await {
            Ok(user) => status = format!("Email verified. Signed in as {}", user.display_name()),
            Err(e) => {
                error!("Verification failed: {}", e);
                eprintln!("Verification failed: {}", e);
                status = e.to_string();
            }
        }
    }

    chats.restore(session.current())?;

    // Run the TUI application
    let mut app = app::App::new(config, session, chats, status);
    app.run().await?;

    info!("Exiting");
    Ok(())
}
