//! A `PlanningSession` driving a live server through `HttpStore`.

use std::sync::Arc;

use rust_decimal_macros::dec;
use stockplan_client::{Error, HttpStore};
use stockplan_core::{
  catalog::{Category, NewProduct, NewRegion, Product, Region},
  edit::{EditValue, EditableField},
  filter::{FilterState, FilterUpdate},
  month::{MonthKey, MonthRange},
  planning::{PlanningFigures, WriteRecord},
  session::PlanningSession,
  store::{PlanningQuery, PlanningStore},
};
use stockplan_store_sqlite::SqliteStore;

struct Server {
  base_url: String,
  amb:      Product,
  mf:       Product,
  region:   Region,
}

fn month(m: u32) -> MonthKey { MonthKey::new(2026, m).unwrap() }

/// Serve the API over a fresh in-memory database on an ephemeral port, with
/// one January record for the AMB product (100 + 50 - 60 = 90).
async fn serve() -> Server {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let amb = store
    .add_product(NewProduct::new("NS60", "Aki NS60", Category::Amb))
    .await
    .unwrap();
  let mf = store
    .add_product(NewProduct::new("MF70", "Aki MF70", Category::Mf))
    .await
    .unwrap();
  let region = store.add_region(NewRegion::new("R1", "Region One")).await.unwrap();

  let mut figures = PlanningFigures {
    opening_stock: 100,
    order_qty: 50,
    estimated_sale_qty: 60,
    ..Default::default()
  };
  figures.recompute_closing().unwrap();
  store
    .upsert_planning_records(vec![WriteRecord {
      record_id: None,
      product_id: amb.product_id,
      region_id: region.region_id,
      month: month(1),
      figures,
    }])
    .await
    .unwrap();

  let app = axum::Router::new().nest("/api", stockplan_api::api_router(Arc::new(store)));
  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

  Server { base_url: format!("http://{addr}"), amb, mf, region }
}

#[tokio::test]
async fn edit_commit_and_reload_over_http() {
  let server = serve().await;
  let http = Arc::new(HttpStore::new(&server.base_url).unwrap());
  let filter = FilterState::new(server.region.region_id, MonthRange::new(2026, 1, 3).unwrap());
  let session = PlanningSession::new(Arc::clone(&http), filter);
  session.load().await.unwrap();

  let rows = session.rows();
  assert_eq!(rows.len(), 2);
  assert_eq!(rows[0].product.code, "NS60");
  let jan = session.cell(server.amb.product_id, month(1)).unwrap();
  assert_eq!(jan.figures.closing_stock, 90);
  assert!(session.cell(server.amb.product_id, month(2)).unwrap().record_id.is_none());

  session
    .apply_input(server.amb.product_id, month(2), EditableField::OpeningStock, "40")
    .unwrap();
  session
    .apply_input(server.mf.product_id, month(3), EditableField::TurnoverRatio, "1.25")
    .unwrap();
  assert_eq!(session.pending_count(), 2);

  let outcome = session.commit().await.unwrap();
  assert_eq!(outcome.written.len(), 2);
  assert!(outcome.refreshed);
  assert!(!session.has_unsaved_changes());

  let feb = session.cell(server.amb.product_id, month(2)).unwrap();
  assert!(feb.record_id.is_some());
  assert!(!feb.modified);
  assert_eq!(feb.figures.closing_stock, 40);
  let mar = session.cell(server.mf.product_id, month(3)).unwrap();
  assert_eq!(mar.figures.turnover_ratio, dec!(1.25));

  // A second session sees the committed state.
  let other = PlanningSession::new(http, filter);
  other.load().await.unwrap();
  assert_eq!(other.rows(), session.rows());
}

#[tokio::test]
async fn category_filter_is_honoured_remotely() {
  let server = serve().await;
  let http = HttpStore::new(format!("{}/", server.base_url)).unwrap();

  let records = http
    .list_planning_records(PlanningQuery {
      region_id: server.region.region_id,
      category:  Some(Category::Mf),
      start:     month(1),
      end:       month(12),
    })
    .await
    .unwrap();
  assert!(records.is_empty());

  let filter = FilterState::new(server.region.region_id, MonthRange::full_year(2026).unwrap());
  let session = PlanningSession::new(Arc::new(http), filter);
  session.load().await.unwrap();
  session
    .update_filter(FilterUpdate::Category(Some(Category::Amb)))
    .await
    .unwrap();
  let rows = session.rows();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].months.len(), 12);
}

#[tokio::test]
async fn rejected_batches_surface_the_status() {
  let server = serve().await;
  let http = HttpStore::new(&server.base_url).unwrap();

  let mut figures = PlanningFigures { opening_stock: 10, ..Default::default() };
  figures.closing_stock = 3;
  let err = http
    .upsert_planning_records(vec![WriteRecord {
      record_id: None,
      product_id: server.amb.product_id,
      region_id: server.region.region_id,
      month: month(5),
      figures,
    }])
    .await
    .unwrap_err();

  match err {
    Error::Status { status, body, .. } => {
      assert_eq!(status, 400);
      assert!(body.contains("closing stock"));
    }
    other => panic!("expected a status error, got {other}"),
  }
}
