//! Error types for `stockplan-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::{edit::EditableField, month::MonthKey};

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid month: {0:?}")]
  InvalidMonth(String),

  #[error("invalid month range: start month {start} is after end month {end}")]
  InvalidMonthRange { start: u32, end: u32 },

  #[error("unknown editable field: {0:?}")]
  UnknownField(String),

  #[error("malformed input for {field}: {input:?}")]
  MalformedInput { field: EditableField, input: String },

  #[error("{field} cannot be negative (got {value})")]
  NegativeQuantity { field: EditableField, value: String },

  #[error("{field} must be a whole number (got {value})")]
  FractionalQuantity { field: EditableField, value: String },

  #[error("{field} expects a {expected} value")]
  MismatchedValue { field: EditableField, expected: &'static str },

  #[error(
    "closing stock overflows: {opening_stock} + {order_qty} - {estimated_sale_qty}"
  )]
  QuantityOverflow {
    opening_stock:      i64,
    order_qty:          i64,
    estimated_sale_qty: i64,
  },

  #[error("closing stock {actual} does not match opening + order - estimated = {expected}")]
  InconsistentClosing { expected: i64, actual: i64 },

  #[error("no cell for product {product_id} in {month}")]
  CellNotFound { product_id: Uuid, month: MonthKey },

  /// A commit or fetch is already in flight for this session.
  #[error("session is busy with another commit or fetch")]
  Busy,

  #[error("{0} unsaved edit(s) must be committed or discarded first")]
  UnsavedChanges(usize),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box a backend error into [`Error::Store`].
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
