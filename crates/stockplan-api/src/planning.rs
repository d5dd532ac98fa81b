//! Handlers for `/planning` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/planning` | `?region_id&start=YYYY-MM&end=YYYY-MM[&category=AMB]` |
//! | `POST` | `/planning/upsert` | Body: `[WriteRecord]`; all-or-nothing |
//! | `GET`  | `/planning/pivot` | `?region_id&year&start_month&end_month[&category]` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use serde::Deserialize;
use stockplan_core::{
  catalog::Category,
  month::{MonthKey, MonthRange},
  pivot::{PivotRequest, PivotRow, pivot},
  planning::{PlanningRecord, WriteRecord},
  store::{PlanningQuery, PlanningStore},
};
use uuid::Uuid;

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub region_id: Uuid,
  /// Inclusive first month, `YYYY-MM`.
  pub start:     MonthKey,
  /// Inclusive last month, `YYYY-MM`.
  pub end:       MonthKey,
  pub category:  Option<Category>,
}

/// `GET /planning?region_id=<id>&start=<YYYY-MM>&end=<YYYY-MM>[&category=AMB]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<PlanningRecord>>, ApiError>
where
  S: PlanningStore,
{
  if params.start > params.end {
    return Err(ApiError::BadRequest(format!(
      "start {} is after end {}",
      params.start, params.end
    )));
  }

  let records = store
    .list_planning_records(PlanningQuery {
      region_id: params.region_id,
      category:  params.category,
      start:     params.start,
      end:       params.end,
    })
    .await
    .map_err(ApiError::store)?;
  Ok(Json(records))
}

// ─── Upsert ───────────────────────────────────────────────────────────────────

/// `POST /planning/upsert`
///
/// Returns the persisted records in input order.
///
/// Every write is validated before any is sent to the store.
pub async fn upsert<S>(
  State(store): State<Arc<S>>,
  Json(writes): Json<Vec<WriteRecord>>,
) -> Result<Json<Vec<PlanningRecord>>, ApiError>
where
  S: PlanningStore,
{
  for (index, write) in writes.iter().enumerate() {
    write
      .validate()
      .map_err(|source| ApiError::InvalidWrite { index, source })?;
  }

  let count = writes.len();
  let written = store
    .upsert_planning_records(writes)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(count, "planning batch upserted");
  Ok(Json(written))
}

// ─── Pivot ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PivotParams {
  pub region_id:   Uuid,
  pub year:        i32,
  pub start_month: u32,
  pub end_month:   u32,
  pub category:    Option<Category>,
}

/// `GET /planning/pivot?region_id&year&start_month&end_month[&category]`
///
/// The grid as the planner sees it before any edits.
pub async fn pivot_grid<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<PivotParams>,
) -> Result<Json<Vec<PivotRow>>, ApiError>
where
  S: PlanningStore,
{
  let range = MonthRange::new(params.year, params.start_month, params.end_month)?;
  let request = PivotRequest {
    region_id: params.region_id,
    category: params.category,
    range,
  };
  let query = PlanningQuery {
    region_id: params.region_id,
    category:  params.category,
    start:     range.start(),
    end:       range.end(),
  };

  let (products, records) = tokio::try_join!(
    async { store.list_products().await.map_err(ApiError::store) },
    async { store.list_planning_records(query).await.map_err(ApiError::store) },
  )?;

  Ok(Json(pivot(&products, &request, &records)))
}
