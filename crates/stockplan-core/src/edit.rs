//! Editable fields, edit-input validation and the edit tracker.
//!
//! Only six fields can be edited. `closing_stock` is never set directly: it
//! is recomputed whenever one of its three inputs changes.

use std::{collections::BTreeMap, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::{
  Error, Result,
  month::MonthKey,
  pivot::MonthCell,
  planning::PlanningFigures,
};

// ─── Fields ──────────────────────────────────────────────────────────────────

/// A grid column the planner may type into.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EditableField {
  OpeningStock,
  OrderQty,
  EstimatedSaleQty,
  TargetQty,
  RealizedSaleQty,
  TurnoverRatio,
}

impl EditableField {
  /// Parse a field name, mapping failure to [`Error::UnknownField`].
  pub fn parse(name: &str) -> Result<Self> {
    Self::from_str(name).map_err(|_| Error::UnknownField(name.to_owned()))
  }

  /// Whether changing this field re-derives `closing_stock`.
  pub fn recomputes_closing(self) -> bool {
    matches!(
      self,
      Self::OpeningStock | Self::OrderQty | Self::EstimatedSaleQty
    )
  }

  pub fn is_quantity(self) -> bool { !matches!(self, Self::TurnoverRatio) }

  /// The integer slot a quantity field writes to; `None` for the ratio.
  fn quantity_slot(self, figures: &mut PlanningFigures) -> Option<&mut i64> {
    match self {
      Self::OpeningStock => Some(&mut figures.opening_stock),
      Self::OrderQty => Some(&mut figures.order_qty),
      Self::EstimatedSaleQty => Some(&mut figures.estimated_sale_qty),
      Self::TargetQty => Some(&mut figures.target_qty),
      Self::RealizedSaleQty => Some(&mut figures.realized_sale_qty),
      Self::TurnoverRatio => None,
    }
  }

  /// Write `value` into `figures` and recompute closing stock if required.
  ///
  /// `value` is checked with [`EditValue::check`] first. On any error
  /// `figures` is left exactly as it was.
  pub fn apply(
    self,
    figures: &mut PlanningFigures,
    value: EditValue,
  ) -> Result<()> {
    let mut next = *figures;
    match value.check(self)? {
      EditValue::Quantity(q) => {
        let slot = self.quantity_slot(&mut next).ok_or(Error::MismatchedValue {
          field:    self,
          expected: "decimal",
        })?;
        *slot = q;
      }
      EditValue::Ratio(r) => next.turnover_ratio = r,
    }
    if self.recomputes_closing() {
      next.recompute_closing()?;
    }
    *figures = next;
    Ok(())
  }
}

// ─── Values ──────────────────────────────────────────────────────────────────

/// A typed value for one [`EditableField`], checked by [`EditValue::check`]
/// before it is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EditValue {
  Quantity(i64),
  Ratio(Decimal),
}

impl EditValue {
  /// Validate a numeric value for `field`.
  ///
  /// Quantities must be whole and non-negative. The turnover ratio accepts any
  /// decimal.
  pub fn for_field(field: EditableField, value: Decimal) -> Result<Self> {
    if !field.is_quantity() {
      return Ok(Self::Ratio(value));
    }
    if value.is_sign_negative() && !value.is_zero() {
      return Err(Error::NegativeQuantity { field, value: value.to_string() });
    }
    if !value.fract().is_zero() {
      return Err(Error::FractionalQuantity { field, value: value.to_string() });
    }
    i64::try_from(value)
      .map(Self::Quantity)
      .map_err(|_| Error::MalformedInput { field, input: value.to_string() })
  }

  /// Check a value built elsewhere against `field`: its kind must match and
  /// a quantity must not be negative.
  pub fn check(self, field: EditableField) -> Result<Self> {
    match (field.is_quantity(), self) {
      (true, Self::Quantity(q)) if q < 0 => Err(Error::NegativeQuantity {
        field,
        value: q.to_string(),
      }),
      (true, Self::Quantity(_)) | (false, Self::Ratio(_)) => Ok(self),
      (true, Self::Ratio(_)) => Err(Error::MismatchedValue {
        field,
        expected: "whole-number",
      }),
      (false, Self::Quantity(_)) => Err(Error::MismatchedValue {
        field,
        expected: "decimal",
      }),
    }
  }

  /// Parse raw cell input for `field`.
  ///
  /// Blank input is zero. Anything else must be a number that passes
  /// [`EditValue::for_field`]; it is rejected, never clamped.
  pub fn parse(field: EditableField, raw: &str) -> Result<Self> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
      return Self::for_field(field, Decimal::ZERO);
    }
    let value = Decimal::from_str(trimmed).map_err(|_| Error::MalformedInput {
      field,
      input: raw.to_owned(),
    })?;
    Self::for_field(field, value)
  }
}

// ─── Tracker ─────────────────────────────────────────────────────────────────

/// Addresses one grid cell.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct CellKey {
  pub product_id: Uuid,
  pub month:      MonthKey,
}

/// Locally modified cells that have not been persisted yet.
///
/// Each entry is a snapshot of the cell after its latest edit; a later edit
/// to the same cell replaces the snapshot.
#[derive(Debug, Clone, Default)]
pub struct EditTracker {
  entries: BTreeMap<CellKey, MonthCell>,
}

impl EditTracker {
  pub fn new() -> Self { Self::default() }

  pub fn record(&mut self, key: CellKey, snapshot: MonthCell) {
    self.entries.insert(key, snapshot);
  }

  pub fn get(&self, key: &CellKey) -> Option<&MonthCell> {
    self.entries.get(key)
  }

  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  pub fn clear(&mut self) { self.entries.clear(); }

  /// Entries in key order.
  pub fn iter(&self) -> impl Iterator<Item = (&CellKey, &MonthCell)> {
    self.entries.iter()
  }
}

#[cfg(test)]
mod tests {
  use rust_decimal_macros::dec;
  use strum::IntoEnumIterator;

  use super::*;

  #[test]
  fn field_names_are_snake_case() {
    assert_eq!(EditableField::EstimatedSaleQty.to_string(), "estimated_sale_qty");
    assert_eq!(
      EditableField::parse("turnover_ratio").unwrap(),
      EditableField::TurnoverRatio
    );
    assert!(matches!(
      EditableField::parse("closing_stock"),
      Err(Error::UnknownField(_))
    ));
  }

  #[test]
  fn exactly_three_fields_drive_closing_stock() {
    let driving: Vec<_> = EditableField::iter()
      .filter(|f| f.recomputes_closing())
      .collect();
    assert_eq!(driving, [
      EditableField::OpeningStock,
      EditableField::OrderQty,
      EditableField::EstimatedSaleQty,
    ]);
  }

  #[test]
  fn apply_recomputes_for_stock_inputs() {
    let mut figures = PlanningFigures::default();
    EditableField::OpeningStock
      .apply(&mut figures, EditValue::Quantity(40))
      .unwrap();
    assert_eq!(figures.closing_stock, 40);
    EditableField::EstimatedSaleQty
      .apply(&mut figures, EditValue::Quantity(55))
      .unwrap();
    assert_eq!(figures.closing_stock, -15);
    EditableField::OrderQty
      .apply(&mut figures, EditValue::Quantity(20))
      .unwrap();
    assert_eq!(figures.closing_stock, 5);
  }

  #[test]
  fn apply_leaves_closing_alone_for_other_fields() {
    let mut figures = PlanningFigures { closing_stock: 99, ..Default::default() };
    EditableField::TargetQty
      .apply(&mut figures, EditValue::Quantity(10))
      .unwrap();
    EditableField::RealizedSaleQty
      .apply(&mut figures, EditValue::Quantity(4))
      .unwrap();
    EditableField::TurnoverRatio
      .apply(&mut figures, EditValue::Ratio(dec!(2.5)))
      .unwrap();
    assert_eq!(figures.closing_stock, 99);
    assert_eq!(figures.target_qty, 10);
    assert_eq!(figures.realized_sale_qty, 4);
    assert_eq!(figures.turnover_ratio, dec!(2.5));
  }

  #[test]
  fn apply_rejects_unchecked_values_without_touching_figures() {
    let mut figures = PlanningFigures {
      opening_stock: 8,
      closing_stock: 8,
      ..Default::default()
    };
    let before = figures;

    assert!(matches!(
      EditableField::OpeningStock.apply(&mut figures, EditValue::Quantity(-5)),
      Err(Error::NegativeQuantity { field: EditableField::OpeningStock, .. })
    ));
    assert!(matches!(
      EditableField::OrderQty.apply(&mut figures, EditValue::Ratio(dec!(2.7))),
      Err(Error::MismatchedValue { field: EditableField::OrderQty, .. })
    ));
    assert!(matches!(
      EditableField::TurnoverRatio.apply(&mut figures, EditValue::Quantity(3)),
      Err(Error::MismatchedValue { field: EditableField::TurnoverRatio, .. })
    ));
    assert_eq!(figures, before);
  }

  #[test]
  fn apply_reports_overflow_and_keeps_previous_figures() {
    let mut figures = PlanningFigures::default();
    EditableField::OpeningStock
      .apply(&mut figures, EditValue::Quantity(i64::MAX))
      .unwrap();
    let before = figures;

    assert!(matches!(
      EditableField::OrderQty.apply(&mut figures, EditValue::Quantity(1)),
      Err(Error::QuantityOverflow { .. })
    ));
    assert_eq!(figures, before);
    assert!(figures.closing_is_consistent());
  }

  #[test]
  fn parse_blank_is_zero() {
    assert_eq!(
      EditValue::parse(EditableField::OrderQty, "  ").unwrap(),
      EditValue::Quantity(0)
    );
    assert_eq!(
      EditValue::parse(EditableField::TurnoverRatio, "").unwrap(),
      EditValue::Ratio(Decimal::ZERO)
    );
  }

  #[test]
  fn parse_rejects_bad_quantities() {
    assert!(matches!(
      EditValue::parse(EditableField::OpeningStock, "-3"),
      Err(Error::NegativeQuantity { .. })
    ));
    assert!(matches!(
      EditValue::parse(EditableField::OpeningStock, "2.5"),
      Err(Error::FractionalQuantity { .. })
    ));
    assert!(matches!(
      EditValue::parse(EditableField::OpeningStock, "twelve"),
      Err(Error::MalformedInput { .. })
    ));
    assert_eq!(
      EditValue::parse(EditableField::OpeningStock, "12.0").unwrap(),
      EditValue::Quantity(12)
    );
  }

  #[test]
  fn turnover_ratio_is_unconstrained() {
    assert_eq!(
      EditValue::parse(EditableField::TurnoverRatio, "-0.75").unwrap(),
      EditValue::Ratio(dec!(-0.75))
    );
  }

  #[test]
  fn tracker_keeps_latest_snapshot_per_cell() {
    let key = CellKey {
      product_id: Uuid::new_v4(),
      month:      MonthKey::new(2026, 2).unwrap(),
    };
    let mut tracker = EditTracker::new();
    let mut cell = MonthCell { modified: true, ..Default::default() };
    cell.figures.opening_stock = 1;
    tracker.record(key, cell);
    cell.figures.opening_stock = 2;
    tracker.record(key, cell);

    assert_eq!(tracker.len(), 1);
    assert_eq!(tracker.get(&key).unwrap().figures.opening_stock, 2);
    tracker.clear();
    assert!(tracker.is_empty());
  }
}
