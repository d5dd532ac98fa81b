//! [`SqliteStore`], the SQLite implementation of [`PlanningStore`].

use std::path::Path;

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use stockplan_core::{
  catalog::{CatalogSeed, NewProduct, NewRegion, Product, Region},
  planning::{PlanningRecord, WriteRecord},
  store::{PlanningQuery, PlanningStore},
};

use crate::{
  Result,
  encode::{
    RawPlanningRecord, RawProduct, RawRegion, encode_category, encode_decimal,
    encode_dt, encode_month, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A planning store backed by a single SQLite file.
///
/// Clones share one background connection thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// A [`WriteRecord`] with every column already encoded, ready to move onto
/// the database thread.
struct EncodedWrite {
  record_id:          String,
  product_id:         String,
  region_id:          String,
  month:              String,
  target_qty:         i64,
  estimated_sale_qty: i64,
  realized_sale_qty:  i64,
  opening_stock:      i64,
  closing_stock:      i64,
  order_qty:          i64,
  turnover_ratio:     String,
}

impl EncodedWrite {
  fn new(w: &WriteRecord) -> Self {
    Self {
      record_id:          encode_uuid(w.record_id.unwrap_or_else(Uuid::new_v4)),
      product_id:         encode_uuid(w.product_id),
      region_id:          encode_uuid(w.region_id),
      month:              encode_month(w.month),
      target_qty:         w.figures.target_qty,
      estimated_sale_qty: w.figures.estimated_sale_qty,
      realized_sale_qty:  w.figures.realized_sale_qty,
      opening_stock:      w.figures.opening_stock,
      closing_stock:      w.figures.closing_stock,
      order_qty:          w.figures.order_qty,
      turnover_ratio:     encode_decimal(w.figures.turnover_ratio),
    }
  }
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open a fresh in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Catalog admin ─────────────────────────────────────────────────────────

  /// Insert a product. Fails if its code is already taken.
  pub async fn add_product(&self, input: NewProduct) -> Result<Product> {
    let product = Product {
      product_id:       Uuid::new_v4(),
      code:             input.code,
      name:             input.name,
      spec:             input.spec,
      category:         input.category,
      units_per_pallet: input.units_per_pallet,
      units_per_box:    input.units_per_box,
    };

    let id_str       = encode_uuid(product.product_id);
    let code         = product.code.clone();
    let name         = product.name.clone();
    let spec         = product.spec.clone();
    let category_str = encode_category(product.category);
    let per_pallet   = product.units_per_pallet;
    let per_box      = product.units_per_box;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO products (
             product_id, code, name, spec, category, units_per_pallet, units_per_box
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![id_str, code, name, spec, category_str, per_pallet, per_box],
        )?;
        Ok(())
      })
      .await?;

    Ok(product)
  }

  /// Insert a region. Fails if its code is already taken.
  pub async fn add_region(&self, input: NewRegion) -> Result<Region> {
    let region = Region {
      region_id: Uuid::new_v4(),
      code:      input.code,
      name:      input.name,
      active:    input.active,
    };

    let id_str = encode_uuid(region.region_id);
    let code   = region.code.clone();
    let name   = region.name.clone();
    let active = region.active;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO regions (region_id, code, name, active) VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, code, name, active],
        )?;
        Ok(())
      })
      .await?;

    Ok(region)
  }

  /// Insert every product and region of `seed` whose code is not taken yet.
  ///
  /// Existing rows are left untouched, so a seed file can be applied on every
  /// start. Runs in one transaction.
  pub async fn seed_catalog(&self, seed: CatalogSeed) -> Result<SeedReport> {
    let products: Vec<_> = seed
      .products
      .into_iter()
      .map(|p| {
        (
          encode_uuid(Uuid::new_v4()),
          p.code,
          p.name,
          p.spec,
          encode_category(p.category),
          p.units_per_pallet,
          p.units_per_box,
        )
      })
      .collect();
    let regions: Vec<_> = seed
      .regions
      .into_iter()
      .map(|r| (encode_uuid(Uuid::new_v4()), r.code, r.name, r.active))
      .collect();

    let report = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut report = SeedReport::default();
        {
          let mut insert_product = tx.prepare(
            "INSERT INTO products (
               product_id, code, name, spec, category, units_per_pallet, units_per_box
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT (code) DO NOTHING",
          )?;
          for (id, code, name, spec, category, per_pallet, per_box) in &products {
            report.products_added += insert_product.execute(rusqlite::params![
              id, code, name, spec, category, per_pallet, per_box
            ])?;
          }

          let mut insert_region = tx.prepare(
            "INSERT INTO regions (region_id, code, name, active)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (code) DO NOTHING",
          )?;
          for (id, code, name, active) in &regions {
            report.regions_added +=
              insert_region.execute(rusqlite::params![id, code, name, active])?;
          }
        }
        tx.commit()?;
        Ok(report)
      })
      .await?;

    debug!(
      products = report.products_added,
      regions = report.regions_added,
      "seeded catalog"
    );
    Ok(report)
  }
}

/// How many rows [`SqliteStore::seed_catalog`] actually inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
  pub products_added: usize,
  pub regions_added:  usize,
}

// ─── PlanningStore impl ──────────────────────────────────────────────────────

impl PlanningStore for SqliteStore {
  type Error = crate::Error;

  // ── Catalog ───────────────────────────────────────────────────────────────

  async fn list_products(&self) -> Result<Vec<Product>> {
    let raws: Vec<RawProduct> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM products ORDER BY category, code",
          RawProduct::COLUMNS
        ))?;
        let rows = stmt
          .query_map([], RawProduct::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProduct::into_product).collect()
  }

  async fn list_regions(&self) -> Result<Vec<Region>> {
    let raws: Vec<RawRegion> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM regions ORDER BY code",
          RawRegion::COLUMNS
        ))?;
        let rows = stmt
          .query_map([], RawRegion::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRegion::into_region).collect()
  }

  // ── Planning records ──────────────────────────────────────────────────────

  async fn list_planning_records(
    &self,
    query: PlanningQuery,
  ) -> Result<Vec<PlanningRecord>> {
    let region_str   = encode_uuid(query.region_id);
    let start_str    = encode_month(query.start);
    let end_str      = encode_month(query.end);
    let category_str = query.category.map(encode_category);

    let raws: Vec<RawPlanningRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {}
           FROM planning_records p
           JOIN products pr ON pr.product_id = p.product_id
           WHERE p.region_id = ?1
             AND p.month >= ?2
             AND p.month <= ?3
             AND (?4 IS NULL OR pr.category = ?4)
           ORDER BY pr.category, pr.code, p.month",
          RawPlanningRecord::COLUMNS
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![region_str, start_str, end_str, category_str],
            RawPlanningRecord::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPlanningRecord::into_record).collect()
  }

  async fn upsert_planning_records(
    &self,
    records: Vec<WriteRecord>,
  ) -> Result<Vec<PlanningRecord>> {
    if records.is_empty() {
      return Ok(Vec::new());
    }

    let writes: Vec<EncodedWrite> = records.iter().map(EncodedWrite::new).collect();
    let count = writes.len();
    let now_str = encode_dt(Utc::now());

    // One transaction for the whole batch; dropping `tx` on error rolls back.
    let raws: Vec<RawPlanningRecord> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut out = Vec::with_capacity(writes.len());
        {
          let mut upsert = tx.prepare(
            "INSERT INTO planning_records (
               record_id, product_id, region_id, month,
               target_qty, estimated_sale_qty, realized_sale_qty,
               opening_stock, closing_stock, order_qty, turnover_ratio,
               updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT (product_id, region_id, month) DO UPDATE SET
               target_qty         = excluded.target_qty,
               estimated_sale_qty = excluded.estimated_sale_qty,
               realized_sale_qty  = excluded.realized_sale_qty,
               opening_stock      = excluded.opening_stock,
               closing_stock      = excluded.closing_stock,
               order_qty          = excluded.order_qty,
               turnover_ratio     = excluded.turnover_ratio,
               updated_at         = excluded.updated_at",
          )?;
          let mut fetch = tx.prepare(&format!(
            "SELECT {} FROM planning_records p
             WHERE p.product_id = ?1 AND p.region_id = ?2 AND p.month = ?3",
            RawPlanningRecord::COLUMNS
          ))?;

          for w in &writes {
            upsert.execute(rusqlite::params![
              w.record_id,
              w.product_id,
              w.region_id,
              w.month,
              w.target_qty,
              w.estimated_sale_qty,
              w.realized_sale_qty,
              w.opening_stock,
              w.closing_stock,
              w.order_qty,
              w.turnover_ratio,
              now_str,
            ])?;
            out.push(fetch.query_row(
              rusqlite::params![w.product_id, w.region_id, w.month],
              RawPlanningRecord::from_row,
            )?);
          }
        }
        tx.commit()?;
        Ok(out)
      })
      .await?;

    debug!(count, "upserted planning records");
    raws.into_iter().map(RawPlanningRecord::into_record).collect()
  }
}
