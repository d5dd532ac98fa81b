//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error body is `{"error": "<message>"}`. A rejected upsert batch
//! also carries the `index` of the first offending write.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  /// A domain rule rejected the request (bad month range, bad quantity...).
  #[error(transparent)]
  Invalid(stockplan_core::Error),

  #[error("write {index} rejected: {source}")]
  InvalidWrite {
    index:  usize,
    #[source]
    source: stockplan_core::Error,
  },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

impl From<stockplan_core::Error> for ApiError {
  fn from(e: stockplan_core::Error) -> Self {
    match e {
      stockplan_core::Error::Store(inner) => Self::Store(inner),
      other => Self::Invalid(other),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, json!({ "error": m })),
      ApiError::Invalid(e) => {
        (StatusCode::BAD_REQUEST, json!({ "error": e.to_string() }))
      }
      ApiError::InvalidWrite { index, source } => (
        StatusCode::BAD_REQUEST,
        json!({ "error": source.to_string(), "index": index }),
      ),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "planning store failed");
        (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": e.to_string() }))
      }
    };
    (status, Json(body)).into_response()
  }
}
