//! The filter/range controller: which region, category and months the grid
//! shows, and what a change to each costs.

use serde::Serialize;
use uuid::Uuid;

use crate::{catalog::Category, month::MonthRange, pivot::PivotRequest, store::PlanningQuery};

/// The active grid window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FilterState {
  pub region_id: Uuid,
  pub category:  Option<Category>,
  pub range:     MonthRange,
}

/// A single change to the [`FilterState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterUpdate {
  Region(Uuid),
  Category(Option<Category>),
  Range(MonthRange),
}

/// What the caller must do after a filter change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterEffect {
  /// Nothing changed.
  Unchanged,
  /// The cached records still cover the window; only re-pivot.
  Repivot,
  /// The cached records are stale; fetch again.
  Refetch,
}

impl FilterState {
  pub fn new(region_id: Uuid, range: MonthRange) -> Self {
    Self { region_id, category: None, range }
  }

  /// Apply `update` and report its effect.
  ///
  /// The category only narrows which products are pivoted, so changing it
  /// never needs a fetch.
  pub fn apply(&mut self, update: FilterUpdate) -> FilterEffect {
    match update {
      FilterUpdate::Region(id) if id == self.region_id => FilterEffect::Unchanged,
      FilterUpdate::Region(id) => {
        self.region_id = id;
        FilterEffect::Refetch
      }
      FilterUpdate::Range(range) if range == self.range => FilterEffect::Unchanged,
      FilterUpdate::Range(range) => {
        self.range = range;
        FilterEffect::Refetch
      }
      FilterUpdate::Category(c) if c == self.category => FilterEffect::Unchanged,
      FilterUpdate::Category(c) => {
        self.category = c;
        FilterEffect::Repivot
      }
    }
  }

  /// The store query for the current window.
  ///
  /// Category is left to the pivot so that a later category change can reuse
  /// the fetched records.
  pub fn query(&self) -> PlanningQuery {
    PlanningQuery {
      region_id: self.region_id,
      category:  None,
      start:     self.range.start(),
      end:       self.range.end(),
    }
  }

  pub fn pivot_request(&self) -> PivotRequest {
    PivotRequest {
      region_id: self.region_id,
      category:  self.category,
      range:     self.range,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn state() -> FilterState {
    FilterState::new(Uuid::new_v4(), MonthRange::new(2026, 1, 3).unwrap())
  }

  #[test]
  fn region_and_range_changes_refetch() {
    let mut s = state();
    assert_eq!(s.apply(FilterUpdate::Region(Uuid::new_v4())), FilterEffect::Refetch);
    assert_eq!(
      s.apply(FilterUpdate::Range(MonthRange::new(2026, 4, 6).unwrap())),
      FilterEffect::Refetch
    );
    assert_eq!(s.query().start.to_string(), "2026-04");
    assert_eq!(s.query().end.to_string(), "2026-06");
  }

  #[test]
  fn category_change_only_repivots() {
    let mut s = state();
    assert_eq!(
      s.apply(FilterUpdate::Category(Some(Category::Mf))),
      FilterEffect::Repivot
    );
    assert_eq!(s.pivot_request().category, Some(Category::Mf));
    assert_eq!(s.query().category, None);
  }

  #[test]
  fn same_values_are_unchanged() {
    let mut s = state();
    let region = s.region_id;
    let range = s.range;
    assert_eq!(s.apply(FilterUpdate::Region(region)), FilterEffect::Unchanged);
    assert_eq!(s.apply(FilterUpdate::Range(range)), FilterEffect::Unchanged);
    assert_eq!(s.apply(FilterUpdate::Category(None)), FilterEffect::Unchanged);
  }
}
