//! The ingestion orchestrator: the single entry point for webhook notifications and
//! the polling fallback.

mod api;
mod normalize;

pub use api::{IngestApi, IngestOutcome, PollReport, ShipmentOutcome};
pub use normalize::new_order_from_meli;
