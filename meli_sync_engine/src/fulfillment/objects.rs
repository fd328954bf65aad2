use log::*;
use serde::Serialize;
use serde_json::Value;

use crate::db_types::PickingRef;

pub const DEFAULT_PARTNER_TAG: &str = "MercadoLibre";
pub const DEFAULT_ORIGIN_PREFIX: &str = "MELI";

/// Static knobs for the Odoo projection.
#[derive(Debug, Clone)]
pub struct FulfillmentConfig {
    /// Prefix for the sales document origin, e.g. "MELI" gives origin "MELI-12345".
    pub origin_prefix: String,
    /// Partner category every marketplace buyer is tagged with.
    pub partner_tag: String,
    /// Warehouse code (stock.warehouse `code`) for seller-shipped orders.
    pub seller_warehouse_code: String,
    /// Warehouse code for orders shipped from the marketplace's own warehouse.
    pub fulfillment_warehouse_code: String,
}

impl Default for FulfillmentConfig {
    fn default() -> Self {
        Self {
            origin_prefix: DEFAULT_ORIGIN_PREFIX.to_string(),
            partner_tag: DEFAULT_PARTNER_TAG.to_string(),
            seller_warehouse_code: "WH".to_string(),
            fulfillment_warehouse_code: "FULL".to_string(),
        }
    }
}

impl FulfillmentConfig {
    pub fn new_from_env_or_default() -> Self {
        let defaults = Self::default();
        let partner_tag = std::env::var("MOG_PARTNER_TAG").unwrap_or_else(|_| {
            warn!("MOG_PARTNER_TAG not set, tagging buyers as '{}'", defaults.partner_tag);
            defaults.partner_tag
        });
        let seller_warehouse_code = std::env::var("MOG_SELLER_WAREHOUSE").unwrap_or_else(|_| {
            warn!("MOG_SELLER_WAREHOUSE not set, using warehouse code '{}'", defaults.seller_warehouse_code);
            defaults.seller_warehouse_code
        });
        let fulfillment_warehouse_code = std::env::var("MOG_FULFILLMENT_WAREHOUSE").unwrap_or_else(|_| {
            warn!(
                "MOG_FULFILLMENT_WAREHOUSE not set, using warehouse code '{}'",
                defaults.fulfillment_warehouse_code
            );
            defaults.fulfillment_warehouse_code
        });
        Self {
            origin_prefix: defaults.origin_prefix,
            partner_tag,
            seller_warehouse_code,
            fulfillment_warehouse_code,
        }
    }
}

/// A line item whose SKU could not be resolved to an Odoo product. The line is
/// skipped, not fatal.
#[derive(Debug, Clone, Serialize)]
pub struct SkuWarning {
    pub sku: String,
    pub title: String,
}

/// Per-picking result of a delivery validation pass.
#[derive(Debug, Clone, Serialize)]
pub struct PickingOutcome {
    pub picking_id: i64,
    pub name: String,
    pub validated: bool,
    /// Failure detail when `validated` is false.
    pub detail: Option<String>,
}

/// Everything `propagate_order` produced in Odoo, to be written back onto the stored
/// order.
#[derive(Debug, Clone)]
pub struct PropagationResult {
    pub odoo_order_id: i64,
    pub reference: String,
    pub client_ref: String,
    pub pickings: Vec<PickingRef>,
    pub warnings: Vec<SkuWarning>,
}

/// Read-only view of a sales document and its fulfillment state, for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct FulfillmentSnapshot {
    pub order: Value,
    pub pickings: Vec<Value>,
    pub moves: Vec<Value>,
}
