//! The `PlanningStore` trait and its query type.
//!
//! The trait is implemented by storage backends (e.g. `stockplan-store-sqlite`
//! or the HTTP client in `stockplan-client`). The session depends on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  catalog::{Category, Product, Region},
  month::MonthKey,
  planning::{PlanningRecord, WriteRecord},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`PlanningStore::list_planning_records`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanningQuery {
  pub region_id: Uuid,
  /// Optional upstream category filter; the pivot filters again regardless.
  pub category:  Option<Category>,
  /// Inclusive lower bound.
  pub start:     MonthKey,
  /// Inclusive upper bound.
  pub end:       MonthKey,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the catalog and planning-record backends.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait PlanningStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Catalog ───────────────────────────────────────────────────────────

  fn list_products(
    &self,
  ) -> impl Future<Output = Result<Vec<Product>, Self::Error>> + Send + '_;

  fn list_regions(
    &self,
  ) -> impl Future<Output = Result<Vec<Region>, Self::Error>> + Send + '_;

  // ── Planning records ──────────────────────────────────────────────────

  /// Records for one region whose month lies in `[start, end]`.
  fn list_planning_records(
    &self,
    query: PlanningQuery,
  ) -> impl Future<Output = Result<Vec<PlanningRecord>, Self::Error>> + Send + '_;

  /// Insert or update every record, keyed on (product, region, month).
  ///
  /// All-or-nothing: on error no record of the batch is written. Returns the
  /// persisted records in input order.
  fn upsert_planning_records(
    &self,
    records: Vec<WriteRecord>,
  ) -> impl Future<Output = Result<Vec<PlanningRecord>, Self::Error>> + Send + '_;
}
