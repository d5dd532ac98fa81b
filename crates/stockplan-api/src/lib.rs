//! JSON REST API for the stock planner.
//!
//! Exposes an axum [`Router`] backed by any
//! [`stockplan_core::store::PlanningStore`]. Auth, TLS, and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", stockplan_api::api_router(store.clone()))
//! ```

pub mod catalog;
pub mod error;
pub mod planning;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use serde::Deserialize;
use stockplan_core::store::PlanningStore;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `STOCKPLAN_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: PlanningStore + 'static,
{
  Router::new()
    // Catalog
    .route("/products", get(catalog::products::<S>))
    .route("/regions", get(catalog::regions::<S>))
    // Planning
    .route("/planning", get(planning::list::<S>))
    .route("/planning/upsert", post(planning::upsert::<S>))
    .route("/planning/pivot", get(planning::pivot_grid::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(store)
}
