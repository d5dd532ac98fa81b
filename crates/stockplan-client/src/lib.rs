//! [`HttpStore`]: a [`PlanningStore`] that talks to a remote
//! `stockplan-server` over its JSON API.
//!
//! Lets a [`stockplan_core::session::PlanningSession`] run on a different
//! machine from the database.

pub mod error;

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use stockplan_core::{
  catalog::{Product, Region},
  planning::{PlanningRecord, WriteRecord},
  store::{PlanningQuery, PlanningStore},
};
use tracing::debug;

pub use error::{Error, Result};

/// Async HTTP client for the planning API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Debug, Clone)]
pub struct HttpStore {
  client:   Client,
  base_url: String,
}

impl HttpStore {
  /// `base_url` is the server root; requests go to `<base_url>/api/...`.
  pub fn new(base_url: impl Into<String>) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()?;
    Ok(Self { client, base_url: base_url.into() })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.base_url.trim_end_matches('/'), path)
  }

  /// Send `req` and decode a JSON body, turning non-2xx replies into
  /// [`Error::Status`].
  async fn send<T: DeserializeOwned>(&self, path: &str, req: RequestBuilder) -> Result<T> {
    let resp = req.send().await?;
    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(Error::Status {
        path: path.to_owned(),
        status: status.as_u16(),
        body,
      });
    }
    debug!(path, %status, "api request ok");
    Ok(resp.json().await?)
  }
}

impl PlanningStore for HttpStore {
  type Error = Error;

  /// `GET /api/products`
  async fn list_products(&self) -> Result<Vec<Product>> {
    self.send("/products", self.client.get(self.url("/products"))).await
  }

  /// `GET /api/regions`
  async fn list_regions(&self) -> Result<Vec<Region>> {
    self.send("/regions", self.client.get(self.url("/regions"))).await
  }

  /// `GET /api/planning?region_id&start&end[&category]`
  async fn list_planning_records(
    &self,
    query: PlanningQuery,
  ) -> Result<Vec<PlanningRecord>> {
    let mut params = vec![
      ("region_id", query.region_id.to_string()),
      ("start", query.start.to_string()),
      ("end", query.end.to_string()),
    ];
    if let Some(category) = query.category {
      params.push(("category", category.to_string()));
    }
    let req = self.client.get(self.url("/planning")).query(&params);
    self.send("/planning", req).await
  }

  /// `POST /api/planning/upsert`
  async fn upsert_planning_records(
    &self,
    records: Vec<WriteRecord>,
  ) -> Result<Vec<PlanningRecord>> {
    let req = self
      .client
      .post(self.url("/planning/upsert"))
      .json(&records);
    self.send("/planning/upsert", req).await
  }
}
