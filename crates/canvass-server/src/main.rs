//! canvass server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, and serves the JSON API over HTTP.
//!
//! # Roster import
//!
//! To apply a master roster file and exit without serving:
//!
//! ```text
//! canvass-server --import roster.tsv
//! ```

use std::{fs::File, io::BufReader, path::PathBuf, sync::Arc};

use anyhow::Context as _;
use axum::Router;
use canvass_core::search::SearchEngine;
use canvass_store_sqlite::SqliteStore;
use clap::Parser;
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "canvass roster search server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Import a roster TSV into the store and exit instead of serving.
  #[arg(long, value_name = "PATH")]
  import: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
struct ServerConfig {
  #[serde(default = "default_host")]
  host:       String,
  #[serde(default = "default_port")]
  port:       u16,
  #[serde(default = "default_store_path")]
  store_path: PathBuf,
}

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("canvass.db") }

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("CANVASS"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Open SQLite store.
  let store = SqliteStore::open(&server_cfg.store_path)
    .await
    .with_context(|| {
      format!("failed to open store at {:?}", server_cfg.store_path)
    })?;

  // One-shot import mode.
  if let Some(path) = cli.import {
    let file = File::open(&path)
      .with_context(|| format!("failed to open roster file {path:?}"))?;
    let counts = canvass_import::import_tsv(&store, BufReader::new(file))
      .await
      .context("roster import failed")?;
    println!(
      "Records added: {}.\nRecords unmodified: {}.\nRecords modified: {}.\n\
       Confirmations unlinked: {}.",
      counts.added,
      counts.unmodified,
      counts.modified,
      counts.confirmations_unlinked,
    );
    return Ok(());
  }

  let app = Router::new()
    .nest(
      "/api",
      canvass_api::api_router(Arc::new(store), SearchEngine::default()),
    )
    .layer(TraceLayer::new_for_http());

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
