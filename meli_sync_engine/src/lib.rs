//! # MercadoLibre → Odoo sync engine
//!
//! Core logic for the order-sync gateway, independent of any web framework:
//!
//! 1. The order store ([`mod@db`]): an idempotent, SQLite-backed record of every
//!    ingested marketplace order, keyed by the marketplace order id and carrying the
//!    Odoo cross-references once an order has been propagated.
//! 2. The fulfillment synchronizer ([`mod@fulfillment`]): projects a stored order onto
//!    Odoo entities (partner, sales document, order lines) and reconciles delivered
//!    shipments into validated pickings.
//! 3. The ingestion orchestrator ([`mod@ingest`]): the single entry point for webhook
//!    notifications and the polling fallback. Deduplicates, persists, propagates and
//!    reconciles.
//!
//! Backends are abstracted behind the traits in [`mod@traits`] so every flow can be
//! exercised against mocks.

mod db;

pub mod db_types;
pub mod fulfillment;
pub mod helpers;
pub mod ingest;
pub mod traits;

pub use db::sqlite::{db_url, SqliteDatabase};
pub use ingest::{IngestApi, IngestOutcome, PollReport, ShipmentOutcome};
pub use traits::{MarketplaceClient, OrderStore, SyncError};
