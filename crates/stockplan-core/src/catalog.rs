//! Reference data: products and regions.
//!
//! Both are owned by the catalog and immutable from the planner's point of
//! view; they are created and edited by an admin workflow elsewhere.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;

/// The two product lines a product can belong to.
///
/// The declaration order is the grid's primary sort order.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Category {
  Amb,
  Mf,
}

/// A sellable battery SKU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
  pub product_id:       Uuid,
  /// Unique short code; the grid's secondary sort key.
  pub code:             String,
  pub name:             String,
  /// Free-text type/spec string, e.g. "12V 45Ah".
  pub spec:             String,
  pub category:         Category,
  pub units_per_pallet: u32,
  pub units_per_box:    u32,
}

/// A sales region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
  pub region_id: Uuid,
  pub code:      String,
  pub name:      String,
  pub active:    bool,
}

/// Input for creating a [`Product`]; the identifier is assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
  pub code:             String,
  pub name:             String,
  #[serde(default)]
  pub spec:             String,
  pub category:         Category,
  #[serde(default)]
  pub units_per_pallet: u32,
  #[serde(default)]
  pub units_per_box:    u32,
}

impl NewProduct {
  /// Convenience constructor with empty spec and zero packing constants.
  pub fn new(
    code: impl Into<String>,
    name: impl Into<String>,
    category: Category,
  ) -> Self {
    Self {
      code: code.into(),
      name: name.into(),
      spec: String::new(),
      category,
      units_per_pallet: 0,
      units_per_box: 0,
    }
  }
}

/// Input for creating a [`Region`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRegion {
  pub code:   String,
  pub name:   String,
  #[serde(default = "default_active")]
  pub active: bool,
}

impl NewRegion {
  pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
    Self { code: code.into(), name: name.into(), active: true }
  }
}

fn default_active() -> bool { true }

/// A catalog to load into an empty or partially filled store, keyed by code.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSeed {
  #[serde(default)]
  pub products: Vec<NewProduct>,
  #[serde(default)]
  pub regions:  Vec<NewRegion>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn category_names_match_wire_tags() {
    assert_eq!(Category::Amb.to_string(), "AMB");
    assert_eq!("MF".parse::<Category>().unwrap(), Category::Mf);
    assert_eq!(serde_json::to_string(&Category::Mf).unwrap(), "\"MF\"");
    assert!("amb".parse::<Category>().is_err());
    assert_eq!(<&'static str>::from(Category::Amb), "AMB");
  }

  #[test]
  fn category_orders_amb_before_mf() {
    assert!(Category::Amb < Category::Mf);
  }
}
