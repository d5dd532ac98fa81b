//! Planning records, the persisted per-(product, region, month) facts.
//!
//! At most one record exists per [`NaturalKey`]. Writes go through an upsert
//! keyed on that triple, so the same [`WriteRecord`] can be replayed safely.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, edit::EditableField, month::MonthKey};

// ─── Figures ─────────────────────────────────────────────────────────────────

/// The seven planning fields shared by records, grid cells and writes.
///
/// Quantities are whole units. `closing_stock` is derived and may go negative
/// to signal a shortfall.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanningFigures {
  pub target_qty:         i64,
  pub estimated_sale_qty: i64,
  pub realized_sale_qty:  i64,
  pub opening_stock:      i64,
  pub closing_stock:      i64,
  pub order_qty:          i64,
  /// Inventory turnover; entered by hand, never derived here.
  pub turnover_ratio:     Decimal,
}

impl PlanningFigures {
  /// `opening + order - estimated`, or [`Error::QuantityOverflow`] when that
  /// does not fit in an `i64`.
  pub fn expected_closing(&self) -> Result<i64> {
    self
      .opening_stock
      .checked_add(self.order_qty)
      .and_then(|sum| sum.checked_sub(self.estimated_sale_qty))
      .ok_or(Error::QuantityOverflow {
        opening_stock:      self.opening_stock,
        order_qty:          self.order_qty,
        estimated_sale_qty: self.estimated_sale_qty,
      })
  }

  /// Re-derive `closing_stock`. Leaves it untouched on overflow.
  pub fn recompute_closing(&mut self) -> Result<()> {
    self.closing_stock = self.expected_closing()?;
    Ok(())
  }

  pub fn closing_is_consistent(&self) -> bool {
    self
      .expected_closing()
      .is_ok_and(|expected| expected == self.closing_stock)
  }
}

// ─── Keys ────────────────────────────────────────────────────────────────────

/// The uniqueness constraint of a planning record.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct NaturalKey {
  pub product_id: Uuid,
  pub region_id:  Uuid,
  pub month:      MonthKey,
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// A persisted planning fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanningRecord {
  pub record_id:  Uuid,
  pub product_id: Uuid,
  pub region_id:  Uuid,
  pub month:      MonthKey,
  #[serde(flatten)]
  pub figures:    PlanningFigures,
  /// Set by the store on every insert or update.
  pub updated_at: DateTime<Utc>,
}

impl PlanningRecord {
  pub fn key(&self) -> NaturalKey {
    NaturalKey {
      product_id: self.product_id,
      region_id:  self.region_id,
      month:      self.month,
    }
  }
}

/// Whether a write creates a new record or overwrites a known one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteIntent {
  Create,
  Update(Uuid),
}

/// One row of a batch upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteRecord {
  /// The record this cell was loaded from, if any.
  pub record_id:  Option<Uuid>,
  pub product_id: Uuid,
  pub region_id:  Uuid,
  pub month:      MonthKey,
  #[serde(flatten)]
  pub figures:    PlanningFigures,
}

impl WriteRecord {
  pub fn key(&self) -> NaturalKey {
    NaturalKey {
      product_id: self.product_id,
      region_id:  self.region_id,
      month:      self.month,
    }
  }

  pub fn intent(&self) -> WriteIntent {
    match self.record_id {
      Some(id) => WriteIntent::Update(id),
      None => WriteIntent::Create,
    }
  }

  /// Check that entered quantities are non-negative and closing stock is
  /// derived from them.
  pub fn validate(&self) -> Result<()> {
    let f = &self.figures;
    let entered = [
      (EditableField::TargetQty, f.target_qty),
      (EditableField::EstimatedSaleQty, f.estimated_sale_qty),
      (EditableField::RealizedSaleQty, f.realized_sale_qty),
      (EditableField::OpeningStock, f.opening_stock),
      (EditableField::OrderQty, f.order_qty),
    ];
    if let Some((field, value)) = entered.into_iter().find(|(_, v)| *v < 0) {
      return Err(Error::NegativeQuantity { field, value: value.to_string() });
    }
    let expected = f.expected_closing()?;
    if f.closing_stock != expected {
      return Err(Error::InconsistentClosing { expected, actual: f.closing_stock });
    }
    Ok(())
  }
}
