//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, months are the first day of the month as
//! `YYYY-MM-DD`, decimals are their canonical string form and UUIDs are
//! hyphenated lowercase strings.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use stockplan_core::{
  catalog::{Category, Product, Region},
  month::MonthKey,
  planning::{PlanningFigures, PlanningRecord},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── MonthKey ────────────────────────────────────────────────────────────────

pub fn encode_month(month: MonthKey) -> String {
  month.first_day().format("%Y-%m-%d").to_string()
}

pub fn decode_month(s: &str) -> Result<MonthKey> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map(MonthKey::from_date)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Category ────────────────────────────────────────────────────────────────

pub fn encode_category(c: Category) -> &'static str { c.into() }

pub fn decode_category(s: &str) -> Result<Category> {
  Category::from_str(s).map_err(|_| Error::UnknownCategory(s.to_owned()))
}

// ─── Decimal ─────────────────────────────────────────────────────────────────

pub fn encode_decimal(d: Decimal) -> String { d.normalize().to_string() }

pub fn decode_decimal(s: &str) -> Result<Decimal> { Ok(Decimal::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `products` row.
pub struct RawProduct {
  pub product_id:       String,
  pub code:             String,
  pub name:             String,
  pub spec:             String,
  pub category:         String,
  pub units_per_pallet: u32,
  pub units_per_box:    u32,
}

impl RawProduct {
  pub const COLUMNS: &'static str =
    "product_id, code, name, spec, category, units_per_pallet, units_per_box";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      product_id:       row.get(0)?,
      code:             row.get(1)?,
      name:             row.get(2)?,
      spec:             row.get(3)?,
      category:         row.get(4)?,
      units_per_pallet: row.get(5)?,
      units_per_box:    row.get(6)?,
    })
  }

  pub fn into_product(self) -> Result<Product> {
    Ok(Product {
      product_id:       decode_uuid(&self.product_id)?,
      code:             self.code,
      name:             self.name,
      spec:             self.spec,
      category:         decode_category(&self.category)?,
      units_per_pallet: self.units_per_pallet,
      units_per_box:    self.units_per_box,
    })
  }
}

/// Raw values read directly from a `regions` row.
pub struct RawRegion {
  pub region_id: String,
  pub code:      String,
  pub name:      String,
  pub active:    bool,
}

impl RawRegion {
  pub const COLUMNS: &'static str = "region_id, code, name, active";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      region_id: row.get(0)?,
      code:      row.get(1)?,
      name:      row.get(2)?,
      active:    row.get(3)?,
    })
  }

  pub fn into_region(self) -> Result<Region> {
    Ok(Region {
      region_id: decode_uuid(&self.region_id)?,
      code:      self.code,
      name:      self.name,
      active:    self.active,
    })
  }
}

/// Raw values read directly from a `planning_records` row.
pub struct RawPlanningRecord {
  pub record_id:          String,
  pub product_id:         String,
  pub region_id:          String,
  pub month:              String,
  pub target_qty:         i64,
  pub estimated_sale_qty: i64,
  pub realized_sale_qty:  i64,
  pub opening_stock:      i64,
  pub closing_stock:      i64,
  pub order_qty:          i64,
  pub turnover_ratio:     String,
  pub updated_at:         String,
}

impl RawPlanningRecord {
  /// Column list matching [`RawPlanningRecord::from_row`], qualified with `p.`.
  pub const COLUMNS: &'static str = "p.record_id, p.product_id, p.region_id, \
     p.month, p.target_qty, p.estimated_sale_qty, p.realized_sale_qty, \
     p.opening_stock, p.closing_stock, p.order_qty, p.turnover_ratio, \
     p.updated_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      record_id:          row.get(0)?,
      product_id:         row.get(1)?,
      region_id:          row.get(2)?,
      month:              row.get(3)?,
      target_qty:         row.get(4)?,
      estimated_sale_qty: row.get(5)?,
      realized_sale_qty:  row.get(6)?,
      opening_stock:      row.get(7)?,
      closing_stock:      row.get(8)?,
      order_qty:          row.get(9)?,
      turnover_ratio:     row.get(10)?,
      updated_at:         row.get(11)?,
    })
  }

  pub fn into_record(self) -> Result<PlanningRecord> {
    Ok(PlanningRecord {
      record_id:  decode_uuid(&self.record_id)?,
      product_id: decode_uuid(&self.product_id)?,
      region_id:  decode_uuid(&self.region_id)?,
      month:      decode_month(&self.month)?,
      figures:    PlanningFigures {
        target_qty:         self.target_qty,
        estimated_sale_qty: self.estimated_sale_qty,
        realized_sale_qty:  self.realized_sale_qty,
        opening_stock:      self.opening_stock,
        closing_stock:      self.closing_stock,
        order_qty:          self.order_qty,
        turnover_ratio:     decode_decimal(&self.turnover_ratio)?,
      },
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}
