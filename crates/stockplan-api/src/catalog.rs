//! Handlers for catalog endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/products` | All products |
//! | `GET`  | `/regions` | Optional `?active=true` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use serde::Deserialize;
use stockplan_core::{
  catalog::{Product, Region},
  store::PlanningStore,
};

use crate::error::ApiError;

/// `GET /products`
pub async fn products<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Product>>, ApiError>
where
  S: PlanningStore,
{
  let products = store.list_products().await.map_err(ApiError::store)?;
  Ok(Json(products))
}

#[derive(Debug, Deserialize)]
pub struct RegionParams {
  /// If `true`, only active regions are returned. Default `false`.
  #[serde(default)]
  pub active: bool,
}

/// `GET /regions[?active=true]`
pub async fn regions<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<RegionParams>,
) -> Result<Json<Vec<Region>>, ApiError>
where
  S: PlanningStore,
{
  let mut regions = store.list_regions().await.map_err(ApiError::store)?;
  if params.active {
    regions.retain(|r| r.active);
  }
  Ok(Json(regions))
}
