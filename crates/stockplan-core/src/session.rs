//! [`PlanningSession`]: one editing session over one region/month window.
//!
//! The session owns the fetched catalog and records, the grid derived from
//! them, and the tracker of unsaved edits. It is an ordinary value: several
//! sessions over the same or different stores can coexist.
//!
//! All state sits behind a single coarse lock that is never held across an
//! await point. Remote work (fetches and the commit upsert) is serialised by a
//! busy flag; while it is set, edits, discards and further remote work are
//! rejected with [`Error::Busy`].

use std::sync::{
  Arc, Mutex, MutexGuard, PoisonError,
  atomic::{AtomicBool, Ordering},
};

use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  catalog::{Product, Region},
  edit::{CellKey, EditTracker, EditValue, EditableField},
  filter::{FilterEffect, FilterState, FilterUpdate},
  grid::PlanningGrid,
  month::MonthKey,
  pivot::{MonthCell, PivotRow, pivot},
  planning::{PlanningRecord, WriteRecord},
  store::{PlanningQuery, PlanningStore},
};

const EVENT_CAPACITY: usize = 256;

// ─── Events ──────────────────────────────────────────────────────────────────

/// Change notifications for whatever renders the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
  /// One cell was edited locally.
  CellUpdated { key: CellKey, cell: MonthCell },
  /// The grid was rebuilt from records; every row may have changed.
  GridRefreshed { rows: usize },
  /// A batch was persisted.
  Committed { written: usize },
  /// Pending edits were thrown away.
  Discarded { dropped: usize },
}

/// The result of a successful [`PlanningSession::commit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutcome {
  /// Records as persisted by the store, in write order.
  pub written:   Vec<PlanningRecord>,
  /// `false` when the post-commit re-fetch failed and the grid was rebuilt
  /// from the cache merged with `written` instead.
  pub refreshed: bool,
}

// ─── State ───────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct SessionState {
  filter:   FilterState,
  products: Vec<Product>,
  regions:  Vec<Region>,
  /// The last fetched records; `discard` re-pivots from these.
  records:  Vec<PlanningRecord>,
  grid:     PlanningGrid,
  tracker:  EditTracker,
}

impl SessionState {
  fn rebuild(&mut self) -> usize {
    let rows = pivot(&self.products, &self.filter.pivot_request(), &self.records);
    let count = rows.len();
    self.grid = PlanningGrid::new(rows);
    count
  }
}

/// Holds the session's busy flag; released on drop.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
  fn acquire(flag: &'a AtomicBool) -> Result<Self> {
    flag
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .map_err(|_| Error::Busy)?;
    Ok(Self(flag))
  }
}

impl Drop for BusyGuard<'_> {
  fn drop(&mut self) { self.0.store(false, Ordering::Release); }
}

// ─── Session ─────────────────────────────────────────────────────────────────

pub struct PlanningSession<S> {
  store:  Arc<S>,
  state:  Mutex<SessionState>,
  busy:   AtomicBool,
  events: broadcast::Sender<SessionEvent>,
}

impl<S: PlanningStore> PlanningSession<S> {
  /// Create an empty session. Call [`load`](Self::load) before editing.
  pub fn new(store: Arc<S>, filter: FilterState) -> Self {
    let (events, _) = broadcast::channel(EVENT_CAPACITY);
    Self {
      store,
      state: Mutex::new(SessionState {
        filter,
        products: Vec::new(),
        regions: Vec::new(),
        records: Vec::new(),
        grid: PlanningGrid::default(),
        tracker: EditTracker::new(),
      }),
      busy: AtomicBool::new(false),
      events,
    }
  }

  fn state(&self) -> MutexGuard<'_, SessionState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn emit(&self, event: SessionEvent) {
    // No receivers is fine.
    let _ = self.events.send(event);
  }

  /// Receive every subsequent [`SessionEvent`].
  pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
    self.events.subscribe()
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  pub fn filter(&self) -> FilterState { self.state().filter }

  pub fn products(&self) -> Vec<Product> { self.state().products.clone() }

  pub fn regions(&self) -> Vec<Region> { self.state().regions.clone() }

  pub fn rows(&self) -> Vec<PivotRow> { self.state().grid.rows().to_vec() }

  pub fn cell(&self, product_id: Uuid, month: MonthKey) -> Option<MonthCell> {
    self.state().grid.cell(product_id, month).copied()
  }

  pub fn has_unsaved_changes(&self) -> bool { !self.state().tracker.is_empty() }

  pub fn pending_count(&self) -> usize { self.state().tracker.len() }

  /// Snapshots of every unsaved cell, in key order.
  pub fn pending_edits(&self) -> Vec<(CellKey, MonthCell)> {
    self
      .state()
      .tracker
      .iter()
      .map(|(k, c)| (*k, *c))
      .collect()
  }

  // ── Fetching ──────────────────────────────────────────────────────────────

  async fn fetch_records(&self, query: PlanningQuery) -> Result<Vec<PlanningRecord>> {
    self
      .store
      .list_planning_records(query)
      .await
      .map_err(Error::store)
  }

  /// Fetch the catalog and the window's records, then rebuild the grid.
  ///
  /// On failure nothing changes: the previous grid (or the empty one) stays.
  pub async fn load(&self) -> Result<()> {
    let _busy = BusyGuard::acquire(&self.busy)?;
    let query = {
      let st = self.state();
      if !st.tracker.is_empty() {
        return Err(Error::UnsavedChanges(st.tracker.len()));
      }
      st.filter.query()
    };

    let (products, regions, records) = tokio::try_join!(
      async { self.store.list_products().await.map_err(Error::store) },
      async { self.store.list_regions().await.map_err(Error::store) },
      self.fetch_records(query),
    )
    .inspect_err(|e| warn!(error = %e, "planning load failed"))?;

    let rows = {
      let mut st = self.state();
      st.products = products;
      st.regions = regions;
      st.records = records;
      st.rebuild()
    };
    info!(rows, "planning grid loaded");
    self.emit(SessionEvent::GridRefreshed { rows });
    Ok(())
  }

  /// Change the region, category or month range.
  ///
  /// Region and range changes re-fetch records; a category change only
  /// re-pivots the cached ones. Refused while edits are pending.
  pub async fn update_filter(&self, update: FilterUpdate) -> Result<FilterEffect> {
    let _busy = BusyGuard::acquire(&self.busy)?;
    let (mut next, pending) = {
      let st = self.state();
      (st.filter, st.tracker.len())
    };

    let effect = next.apply(update);
    if effect == FilterEffect::Unchanged {
      return Ok(effect);
    }
    if pending > 0 {
      return Err(Error::UnsavedChanges(pending));
    }

    let records = match effect {
      FilterEffect::Refetch => Some(self.fetch_records(next.query()).await?),
      _ => None,
    };

    let rows = {
      let mut st = self.state();
      st.filter = next;
      if let Some(records) = records {
        st.records = records;
      }
      st.rebuild()
    };
    debug!(?effect, rows, "filter updated");
    self.emit(SessionEvent::GridRefreshed { rows });
    Ok(effect)
  }

  // ── Editing ───────────────────────────────────────────────────────────────

  /// Set one field of one cell and track the cell as unsaved.
  ///
  /// Editing an opening stock, order or estimated-sale quantity recomputes
  /// the cell's closing stock. The value is checked against `field` first; a
  /// negative quantity, a value of the wrong kind or an overflowing closing
  /// stock is rejected and never reaches the tracker.
  pub fn apply_edit(
    &self,
    product_id: Uuid,
    month: MonthKey,
    field: EditableField,
    value: EditValue,
  ) -> Result<MonthCell> {
    let key = CellKey { product_id, month };
    let cell = {
      let mut st = self.state();
      if self.busy.load(Ordering::Acquire) {
        return Err(Error::Busy);
      }
      let cell = st.grid.apply_edit(product_id, month, field, value)?;
      st.tracker.record(key, cell);
      cell
    };
    self.emit(SessionEvent::CellUpdated { key, cell });
    Ok(cell)
  }

  /// Like [`apply_edit`](Self::apply_edit), from raw cell input.
  pub fn apply_input(
    &self,
    product_id: Uuid,
    month: MonthKey,
    field: EditableField,
    raw: &str,
  ) -> Result<MonthCell> {
    let value = EditValue::parse(field, raw)?;
    self.apply_edit(product_id, month, field, value)
  }

  // ── Reconciliation ────────────────────────────────────────────────────────

  /// Persist every tracked edit as one batch upsert.
  ///
  /// On failure the tracker is left intact so the same commit can be retried.
  /// On success the tracker is cleared and the grid rebuilt from freshly
  /// fetched records.
  pub async fn commit(&self) -> Result<CommitOutcome> {
    let _busy = BusyGuard::acquire(&self.busy)?;
    let (writes, query) = {
      let st = self.state();
      let region_id = st.filter.region_id;
      let writes: Vec<WriteRecord> = st
        .tracker
        .iter()
        .map(|(key, cell)| WriteRecord {
          record_id: cell.record_id,
          product_id: key.product_id,
          region_id,
          month: key.month,
          figures: cell.figures,
        })
        .collect();
      (writes, st.filter.query())
    };

    if writes.is_empty() {
      return Ok(CommitOutcome { written: Vec::new(), refreshed: false });
    }

    let count = writes.len();
    let written = self
      .store
      .upsert_planning_records(writes)
      .await
      .map_err(Error::store)
      .inspect_err(|e| warn!(error = %e, count, "commit failed; edits kept"))?;
    info!(count, "committed planning edits");

    let fresh = self
      .fetch_records(query)
      .await
      .inspect_err(|e| {
        warn!(error = %e, "re-fetch after commit failed; using merged cache")
      })
      .ok();
    let refreshed = fresh.is_some();

    let rows = {
      let mut st = self.state();
      st.tracker.clear();
      match fresh {
        Some(records) => st.records = records,
        None => merge_records(&mut st.records, &written),
      }
      st.rebuild()
    };
    self.emit(SessionEvent::Committed { written: written.len() });
    self.emit(SessionEvent::GridRefreshed { rows });

    Ok(CommitOutcome { written, refreshed })
  }

  /// Drop every tracked edit and rebuild the grid from the cached records.
  ///
  /// Does not touch the store. Returns how many cells were discarded.
  pub fn discard(&self) -> Result<usize> {
    let _busy = BusyGuard::acquire(&self.busy)?;
    let (dropped, rows) = {
      let mut st = self.state();
      let dropped = st.tracker.len();
      st.tracker.clear();
      (dropped, st.rebuild())
    };
    debug!(dropped, "discarded planning edits");
    self.emit(SessionEvent::Discarded { dropped });
    self.emit(SessionEvent::GridRefreshed { rows });
    Ok(dropped)
  }
}

/// Overlay `written` onto `cache` by natural key.
fn merge_records(cache: &mut Vec<PlanningRecord>, written: &[PlanningRecord]) {
  for record in written {
    match cache.iter_mut().find(|r| r.key() == record.key()) {
      Some(slot) => *slot = record.clone(),
      None => cache.push(record.clone()),
    }
  }
}
