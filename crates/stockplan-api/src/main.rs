//! stockplan-server binary.
//!
//! Layers defaults, an optional TOML file and `STOCKPLAN_*` environment
//! variables into a [`ServerConfig`], opens the SQLite planning store and
//! serves the JSON API under `/api`.
//!
//! ```text
//! stockplan-server --config config.toml --seed catalog.json
//! ```
//!
//! A seed file is a JSON [`CatalogSeed`]; products and regions whose code is
//! already present are skipped.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use axum::Router;
use clap::Parser;
use stockplan_api::ServerConfig;
use stockplan_core::catalog::CatalogSeed;
use stockplan_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Stock planning API server")]
struct Cli {
  /// TOML configuration file; missing is fine.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// JSON catalog to load before serving.
  #[arg(long)]
  seed: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let server_cfg = load_config(&cli.config)?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open planning store at {store_path:?}"))?;

  if let Some(seed_path) = &cli.seed {
    let seed = read_seed(seed_path)?;
    let report = store
      .seed_catalog(seed)
      .await
      .context("failed to seed catalog")?;
    tracing::info!(
      products = report.products_added,
      regions = report.regions_added,
      "catalog seeded from {}",
      seed_path.display()
    );
  }

  let app = Router::new().nest("/api", stockplan_api::api_router(Arc::new(store)));
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  tracing::info!("serving planning API on http://{address}/api");
  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

fn load_config(path: &Path) -> anyhow::Result<ServerConfig> {
  config::Config::builder()
    .set_default("host", "127.0.0.1")?
    .set_default("port", 8080_i64)?
    .set_default("store_path", "stockplan.db")?
    .add_source(config::File::from(path).required(false))
    .add_source(config::Environment::with_prefix("STOCKPLAN"))
    .build()
    .with_context(|| format!("failed to read config from {}", path.display()))?
    .try_deserialize()
    .context("invalid server configuration")
}

fn read_seed(path: &Path) -> anyhow::Result<CatalogSeed> {
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("failed to read seed file {}", path.display()))?;
  serde_json::from_str(&raw)
    .with_context(|| format!("malformed seed file {}", path.display()))
}

/// Expand a leading `~/` to `$HOME`.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
