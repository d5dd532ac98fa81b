//! The pivot transformer: flat planning records in, one grid row per product
//! out.
//!
//! [`pivot`] is pure. Identical inputs always produce an identical sequence,
//! which lets a discarded grid be rebuilt exactly from cached records.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::trace;
use uuid::Uuid;

use crate::{
  catalog::{Category, Product},
  month::{MonthKey, MonthRange},
  planning::{PlanningFigures, PlanningRecord},
};

// ─── Grid shapes ─────────────────────────────────────────────────────────────

/// One month's worth of planning fields within a [`PivotRow`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthCell {
  /// `None` means no record exists yet for this key.
  pub record_id: Option<Uuid>,
  #[serde(flatten)]
  pub figures:   PlanningFigures,
  /// Set by a local edit; cleared whenever the grid is rebuilt.
  pub modified:  bool,
}

impl MonthCell {
  fn from_record(record: &PlanningRecord) -> Self {
    Self {
      record_id: Some(record.record_id),
      figures:   record.figures,
      modified:  false,
    }
  }
}

/// The grid-ready view of one product across the requested months.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotRow {
  pub product: Product,
  pub months:  BTreeMap<MonthKey, MonthCell>,
}

impl PivotRow {
  pub fn product_id(&self) -> Uuid { self.product.product_id }

  pub fn cell(&self, month: MonthKey) -> Option<&MonthCell> {
    self.months.get(&month)
  }
}

// ─── Transform ───────────────────────────────────────────────────────────────

/// Which slice of the planning data a pivot covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PivotRequest {
  pub region_id: Uuid,
  pub category:  Option<Category>,
  pub range:     MonthRange,
}

/// Build the dense grid for `request`.
///
/// Every product matching the category filter gets a row, and every row gets
/// a zeroed cell for each month of the range. Records then overwrite their
/// cell. Records for another region, a month outside the range, or a product
/// that is filtered out or missing from the catalog are dropped silently.
///
/// Rows are sorted by category, then product code.
pub fn pivot(
  products: &[Product],
  request: &PivotRequest,
  records: &[PlanningRecord],
) -> Vec<PivotRow> {
  let mut candidates: Vec<&Product> = products
    .iter()
    .filter(|p| request.category.is_none_or(|c| p.category == c))
    .collect();
  candidates.sort_by(|a, b| {
    a.category
      .cmp(&b.category)
      .then_with(|| a.code.cmp(&b.code))
      .then_with(|| a.product_id.cmp(&b.product_id))
  });

  let blank: BTreeMap<MonthKey, MonthCell> = request
    .range
    .months()
    .map(|m| (m, MonthCell::default()))
    .collect();

  let mut rows: Vec<PivotRow> = candidates
    .into_iter()
    .map(|product| PivotRow {
      product: product.clone(),
      months:  blank.clone(),
    })
    .collect();

  let index: HashMap<Uuid, usize> = rows
    .iter()
    .enumerate()
    .map(|(i, row)| (row.product_id(), i))
    .collect();

  let mut dropped = 0usize;
  for record in records {
    if record.region_id != request.region_id {
      dropped += 1;
      continue;
    }
    let Some(&i) = index.get(&record.product_id) else {
      dropped += 1;
      continue;
    };
    match rows[i].months.get_mut(&record.month) {
      Some(cell) => *cell = MonthCell::from_record(record),
      None => dropped += 1,
    }
  }

  if dropped > 0 {
    trace!(dropped, "pivot skipped records outside the requested slice");
  }

  rows
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;

  fn product(code: &str, category: Category) -> Product {
    Product {
      product_id:       Uuid::new_v4(),
      code:             code.into(),
      name:             format!("Battery {code}"),
      spec:             "12V".into(),
      category,
      units_per_pallet: 48,
      units_per_box:    1,
    }
  }

  fn record(
    product_id: Uuid,
    region_id: Uuid,
    month: MonthKey,
    figures: PlanningFigures,
  ) -> PlanningRecord {
    PlanningRecord {
      record_id: Uuid::new_v4(),
      product_id,
      region_id,
      month,
      figures,
      updated_at: Utc::now(),
    }
  }

  fn jan_to_mar(region_id: Uuid, category: Option<Category>) -> PivotRequest {
    PivotRequest {
      region_id,
      category,
      range: MonthRange::new(2026, 1, 3).unwrap(),
    }
  }

  #[test]
  fn existing_record_fills_its_cell_and_others_stay_zero() {
    let p1 = product("P1", Category::Amb);
    let region = Uuid::new_v4();
    let jan = MonthKey::new(2026, 1).unwrap();
    let figures = PlanningFigures {
      opening_stock: 100,
      order_qty: 50,
      estimated_sale_qty: 60,
      closing_stock: 90,
      ..Default::default()
    };
    let rec = record(p1.product_id, region, jan, figures);

    let rows = pivot(&[p1.clone()], &jan_to_mar(region, None), &[rec.clone()]);

    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.months.len(), 3);

    let jan_cell = row.cell(jan).unwrap();
    assert_eq!(jan_cell.record_id, Some(rec.record_id));
    assert_eq!(jan_cell.figures, figures);
    assert!(!jan_cell.modified);

    for m in [2, 3] {
      let cell = row.cell(MonthKey::new(2026, m).unwrap()).unwrap();
      assert_eq!(*cell, MonthCell::default());
    }
  }

  #[test]
  fn rows_sort_by_category_then_code() {
    let products = vec![
      product("Z9", Category::Amb),
      product("B2", Category::Mf),
      product("A1", Category::Mf),
      product("C3", Category::Amb),
    ];
    let rows = pivot(&products, &jan_to_mar(Uuid::new_v4(), None), &[]);
    let codes: Vec<&str> = rows.iter().map(|r| r.product.code.as_str()).collect();
    assert_eq!(codes, ["C3", "Z9", "A1", "B2"]);
  }

  #[test]
  fn category_filter_drops_rows_and_their_records() {
    let amb = product("A", Category::Amb);
    let mf = product("M", Category::Mf);
    let region = Uuid::new_v4();
    let jan = MonthKey::new(2026, 1).unwrap();
    let records = vec![
      record(amb.product_id, region, jan, PlanningFigures::default()),
      record(mf.product_id, region, jan, PlanningFigures::default()),
    ];

    let rows = pivot(
      &[amb.clone(), mf],
      &jan_to_mar(region, Some(Category::Amb)),
      &records,
    );
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].product_id(), amb.product_id);
  }

  #[test]
  fn dangling_foreign_and_out_of_range_records_are_ignored() {
    let p = product("P", Category::Amb);
    let region = Uuid::new_v4();
    let filled = PlanningFigures { target_qty: 7, ..Default::default() };
    let records = vec![
      // Product no longer in the catalog.
      record(Uuid::new_v4(), region, MonthKey::new(2026, 1).unwrap(), filled),
      // Another region.
      record(p.product_id, Uuid::new_v4(), MonthKey::new(2026, 1).unwrap(), filled),
      // Outside Jan..Mar.
      record(p.product_id, region, MonthKey::new(2026, 4).unwrap(), filled),
    ];

    let rows = pivot(&[p], &jan_to_mar(region, None), &records);
    assert_eq!(rows.len(), 1);
    assert!(rows[0].months.values().all(|c| *c == MonthCell::default()));
  }

  #[test]
  fn pivot_is_deterministic_and_leaves_inputs_alone() {
    let products = vec![product("B", Category::Amb), product("A", Category::Amb)];
    let region = Uuid::new_v4();
    let records = vec![record(
      products[0].product_id,
      region,
      MonthKey::new(2026, 2).unwrap(),
      PlanningFigures { order_qty: 3, ..Default::default() },
    )];
    let before = (products.clone(), records.clone());

    let first = pivot(&products, &jan_to_mar(region, None), &records);
    let second = pivot(&products, &jan_to_mar(region, None), &records);

    assert_eq!(first, second);
    assert_eq!((products, records), before);
  }
}
