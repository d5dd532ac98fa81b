//! Core types and the planning-grid engine for the stock planner.
//!
//! This crate is deliberately free of HTTP and database dependencies. It turns
//! sparse per-(product, region, month) planning records into a dense grid,
//! tracks local edits against that grid, and reconciles them back to any
//! [`store::PlanningStore`] backend.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod catalog;
pub mod edit;
pub mod error;
pub mod filter;
pub mod grid;
pub mod month;
pub mod pivot;
pub mod planning;
pub mod session;
pub mod store;

pub use error::{Error, Result};
