//! SQL schema for the planning store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS products (
    product_id       TEXT PRIMARY KEY,
    code             TEXT NOT NULL UNIQUE,
    name             TEXT NOT NULL,
    spec             TEXT NOT NULL DEFAULT '',
    category         TEXT NOT NULL CHECK (category IN ('AMB', 'MF')),
    units_per_pallet INTEGER NOT NULL DEFAULT 0 CHECK (units_per_pallet >= 0),
    units_per_box    INTEGER NOT NULL DEFAULT 0 CHECK (units_per_box >= 0)
);

CREATE TABLE IF NOT EXISTS regions (
    region_id TEXT PRIMARY KEY,
    code      TEXT NOT NULL UNIQUE,
    name      TEXT NOT NULL,
    active    INTEGER NOT NULL DEFAULT 1
);

-- One row per (product, region, month). closing_stock is derived by the
-- client and may be negative.
CREATE TABLE IF NOT EXISTS planning_records (
    record_id          TEXT PRIMARY KEY,
    product_id         TEXT NOT NULL REFERENCES products(product_id),
    region_id          TEXT NOT NULL REFERENCES regions(region_id),
    month              TEXT NOT NULL,   -- first day of month, YYYY-MM-DD
    target_qty         INTEGER NOT NULL DEFAULT 0 CHECK (target_qty >= 0),
    estimated_sale_qty INTEGER NOT NULL DEFAULT 0 CHECK (estimated_sale_qty >= 0),
    realized_sale_qty  INTEGER NOT NULL DEFAULT 0 CHECK (realized_sale_qty >= 0),
    opening_stock      INTEGER NOT NULL DEFAULT 0 CHECK (opening_stock >= 0),
    closing_stock      INTEGER NOT NULL DEFAULT 0,
    order_qty          INTEGER NOT NULL DEFAULT 0 CHECK (order_qty >= 0),
    turnover_ratio     TEXT NOT NULL DEFAULT '0',  -- decimal as text
    updated_at         TEXT NOT NULL,              -- ISO 8601 UTC
    UNIQUE (product_id, region_id, month)
);

CREATE INDEX IF NOT EXISTS planning_region_month_idx
    ON planning_records(region_id, month);

PRAGMA user_version = 1;
";
