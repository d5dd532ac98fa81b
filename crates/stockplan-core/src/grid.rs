//! The in-memory planning grid: pivot rows addressable by product and month.

use std::collections::HashMap;

use uuid::Uuid;

use crate::{
  Error, Result,
  edit::{EditValue, EditableField},
  month::MonthKey,
  pivot::{MonthCell, PivotRow},
};

/// Pivot rows plus an index from product id to row position.
#[derive(Debug, Clone, Default)]
pub struct PlanningGrid {
  rows:  Vec<PivotRow>,
  index: HashMap<Uuid, usize>,
}

impl PlanningGrid {
  pub fn new(rows: Vec<PivotRow>) -> Self {
    let index = rows
      .iter()
      .enumerate()
      .map(|(i, row)| (row.product_id(), i))
      .collect();
    Self { rows, index }
  }

  pub fn rows(&self) -> &[PivotRow] { &self.rows }

  pub fn into_rows(self) -> Vec<PivotRow> { self.rows }

  pub fn row(&self, product_id: Uuid) -> Option<&PivotRow> {
    self.index.get(&product_id).map(|&i| &self.rows[i])
  }

  pub fn cell(&self, product_id: Uuid, month: MonthKey) -> Option<&MonthCell> {
    self.row(product_id)?.cell(month)
  }

  /// Set `field` on one cell, mark it modified and return the resulting
  /// snapshot.
  ///
  /// Setting a field to its current value still marks the cell modified. A
  /// rejected value leaves the cell untouched.
  pub fn apply_edit(
    &mut self,
    product_id: Uuid,
    month: MonthKey,
    field: EditableField,
    value: EditValue,
  ) -> Result<MonthCell> {
    let cell = self
      .index
      .get(&product_id)
      .and_then(|&i| self.rows[i].months.get_mut(&month))
      .ok_or(Error::CellNotFound { product_id, month })?;

    field.apply(&mut cell.figures, value)?;
    cell.modified = true;
    Ok(*cell)
  }
}
