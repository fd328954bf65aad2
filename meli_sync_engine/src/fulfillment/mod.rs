//! Projection of stored orders onto Odoo.
//!
//! The synchronizer owns every write the gateway makes against the ERP: partners,
//! sales documents, order lines and delivery validation.

mod address;
mod matcher;
mod objects;
mod sync;

pub use address::{parse_address, ParsedAddress};
pub use matcher::PartnerMatcher;
pub use objects::{FulfillmentConfig, FulfillmentSnapshot, PickingOutcome, PropagationResult, SkuWarning};
pub use sync::FulfillmentSync;
