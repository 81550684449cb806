//! Book Translator Web - JSON API for uploading and translating PDF books.

mod helpers;
mod routes;
mod state;

use anyhow::{Context, Result};
use book_translator_core::{
    AppConfig, ProviderKind,
    config::{BlobBackend, StorageBackend},
};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use state::{AppState, Services};

#[derive(Parser, Debug)]
#[command(name = "book-translator-web")]
#[command(author, version, about = "Book Translator Web Server", long_about = None)]
struct Args {
    /// Config file (defaults to ~/.config/book-translator/config.toml or ./config.toml)
    #[arg(short, long, env = "BOOK_TRANSLATOR_CONFIG")]
    config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Translation provider (google, openai)
    #[arg(long, env = "TRANSLATOR_PROVIDER")]
    provider: Option<ProviderKind>,

    /// OpenAI API base URL
    #[arg(long, env = "OPENAI_API_BASE")]
    api_base: Option<String>,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY")]
    api_key: Option<String>,

    /// Model name for OpenAI-compatible API
    #[arg(long, env = "OPENAI_MODEL")]
    model: Option<String>,

    /// Supabase project URL; with a key, stores PDFs in Supabase Storage
    #[arg(long, env = "SUPABASE_URL")]
    supabase_url: Option<String>,

    /// Supabase service role key
    #[arg(long, env = "SUPABASE_SERVICE_KEY")]
    supabase_key: Option<String>,

    /// Keep books in memory instead of the on-disk database
    #[arg(long)]
    memory: bool,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    /// Apply command line and environment overrides on top of the file config.
    fn apply(self, config: &mut AppConfig) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(provider) = self.provider {
            config.translator.provider = provider;
        }
        if let Some(api_base) = self.api_base {
            config.translator.api_base = api_base;
        }
        if self.api_key.is_some() {
            config.translator.api_key = self.api_key;
        }
        if let Some(model) = self.model {
            config.translator.model = model;
        }
        if self.supabase_url.is_some() && self.supabase_key.is_some() {
            config.blob.backend = BlobBackend::Supabase;
            config.blob.supabase_url = self.supabase_url;
            config.blob.supabase_key = self.supabase_key;
        }
        if self.memory {
            config.storage.backend = StorageBackend::Memory;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let default_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    // sled logs every flush at debug level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{default_level},sled=warn")));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AppConfig::load(),
    };
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    // Opens the database - fails fast if another instance holds the lock
    let services = Services::from_config(&config)?;
    info!(
        "Book store: {:?}, blob store: {}",
        config.storage.backend,
        services.blobs.name()
    );

    let (state, worker) = AppState::new(&config, services);

    let recovered = state
        .jobs
        .recover_interrupted()
        .await
        .context("Failed to recover interrupted jobs")?;
    if recovered > 0 {
        info!("Marked {} interrupted translations as failed", recovered);
    }

    tokio::spawn(worker.run());

    let app = routes::router(Arc::new(state));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
