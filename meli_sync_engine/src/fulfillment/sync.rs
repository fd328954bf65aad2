use log::*;
use odoo_tools::OdooRpc;
use serde_json::{json, Map, Value};

use crate::{
    db_types::{Order, PickingRef},
    fulfillment::{
        matcher::PartnerMatcher,
        objects::{FulfillmentConfig, FulfillmentSnapshot, PickingOutcome, PropagationResult, SkuWarning},
        parse_address,
    },
    traits::SyncError,
};

const PARTNER: &str = "res.partner";
const PARTNER_CATEGORY: &str = "res.partner.category";
const COUNTRY_STATE: &str = "res.country.state";
const SALE_ORDER: &str = "sale.order";
const SALE_ORDER_LINE: &str = "sale.order.line";
const PRODUCT: &str = "product.product";
const WAREHOUSE: &str = "stock.warehouse";
const PICKING: &str = "stock.picking";
const STOCK_MOVE: &str = "stock.move";

const PARTNER_FIELDS: &[&str] = &["id", "name", "email", "phone", "vat", "street", "city", "zip"];

/// Projects stored orders onto Odoo and reconciles deliveries.
#[derive(Debug, Clone)]
pub struct FulfillmentSync<R> {
    rpc: R,
    config: FulfillmentConfig,
}

impl<R: OdooRpc> FulfillmentSync<R> {
    pub fn new(rpc: R, config: FulfillmentConfig) -> Self {
        Self { rpc, config }
    }

    pub fn rpc(&self) -> &R {
        &self.rpc
    }

    /// Runs the full projection for a freshly stored order: partner, sales document,
    /// order lines, and the initial picking set.
    pub async fn propagate_order(&self, order: &Order) -> Result<PropagationResult, SyncError> {
        let partner_id = self.upsert_partner(order).await?;
        let (odoo_order_id, reference, client_ref) = self.create_sales_document(order, partner_id).await?;
        let warnings = self.add_line_items(order, odoo_order_id).await?;
        let pickings = self.fetch_pickings(odoo_order_id).await?;
        info!(
            "💼️ Order {} propagated as {reference} (id {odoo_order_id}, {} picking(s), {} skipped line(s))",
            order.order_id,
            pickings.len(),
            warnings.len()
        );
        Ok(PropagationResult { odoo_order_id, reference, client_ref, pickings, warnings })
    }

    /// Finds the Odoo partner for the buyer, or creates one. Lookup strategies run in
    /// a fixed order (name, tax id, email, phone) and the first hit wins. When a
    /// partner is found, only the contact fields that differ are written.
    pub async fn upsert_partner(&self, order: &Order) -> Result<i64, SyncError> {
        let buyer = &*order.buyer;
        let tag_id = self.ensure_partner_tag().await?;
        let desired = self.partner_values(order).await;
        for matcher in PartnerMatcher::PIPELINE {
            let Some(domain) = matcher.domain(buyer) else { continue };
            let hits = self.rpc.search_read(PARTNER, domain, PARTNER_FIELDS).await?;
            let Some(partner) = hits.first() else { continue };
            let partner_id = partner["id"]
                .as_i64()
                .ok_or_else(|| SyncError::Rpc(odoo_tools::OdooRpcError::JsonError("partner id missing".into())))?;
            debug!("💼️ Buyer {} matched partner {partner_id} via {matcher:?}", buyer.id);
            let diff = diff_partner(&desired, partner);
            if !diff.is_empty() {
                debug!("💼️ Updating partner {partner_id} fields: {:?}", diff.keys().collect::<Vec<_>>());
                self.rpc.write(PARTNER, &[partner_id], Value::Object(diff)).await?;
            }
            // Link (not replace) the marketplace tag.
            self.rpc.write(PARTNER, &[partner_id], json!({ "category_id": [[4, tag_id]] })).await?;
            return Ok(partner_id);
        }
        let mut values = desired;
        values.insert("category_id".to_string(), json!([[6, 0, [tag_id]]]));
        let partner_id = self.rpc.create(PARTNER, Value::Object(values)).await?;
        info!("💼️ Created partner {partner_id} for buyer '{}'", buyer.display_name());
        Ok(partner_id)
    }

    /// Creates the sales document and, when the primary payment is already approved,
    /// confirms it. Returns (id, document name, client reference).
    pub async fn create_sales_document(
        &self,
        order: &Order,
        partner_id: i64,
    ) -> Result<(i64, String, String), SyncError> {
        let origin = format!("{}-{}", self.config.origin_prefix, order.order_id);
        let client_ref = format!("{} / {origin}", order.buyer.display_name());
        let mut values = Map::new();
        values.insert("partner_id".to_string(), json!(partner_id));
        values.insert("origin".to_string(), json!(origin));
        values.insert("client_order_ref".to_string(), json!(client_ref));
        let is_fulfillment = order.shipping.as_ref().map(|s| s.is_fulfillment()).unwrap_or(false);
        if let Some(warehouse_id) = self.resolve_warehouse(is_fulfillment).await? {
            values.insert("warehouse_id".to_string(), json!(warehouse_id));
        }
        let so_id = self.rpc.create(SALE_ORDER, Value::Object(values)).await?;
        info!("💼️ Created sales document {so_id} with origin {origin}");
        if order.primary_payment_approved() {
            self.confirm_document(so_id).await?;
        }
        let reference = self.document_name(so_id).await?;
        Ok((so_id, reference, client_ref))
    }

    /// Confirms a sales document. A no-op when it is already confirmed or cancelled.
    pub async fn confirm_document(&self, so_id: i64) -> Result<(), SyncError> {
        let rows = self.rpc.read(SALE_ORDER, &[so_id], &["state"]).await?;
        let state = rows.first().and_then(|r| r["state"].as_str()).unwrap_or("draft");
        match state {
            "sale" | "done" => {
                debug!("💼️ Sales document {so_id} is already confirmed");
                Ok(())
            },
            "cancel" => {
                warn!("💼️ Sales document {so_id} is cancelled and will not be confirmed");
                Ok(())
            },
            _ => {
                self.rpc.call_button(SALE_ORDER, "action_confirm", &[so_id]).await?;
                info!("💼️ Confirmed sales document {so_id}");
                Ok(())
            },
        }
    }

    /// Adds one order line per resolvable line item. Unresolvable SKUs are reported
    /// back as warnings, never as errors.
    pub async fn add_line_items(&self, order: &Order, so_id: i64) -> Result<Vec<SkuWarning>, SyncError> {
        let mut warnings = Vec::new();
        for item in order.line_items.iter() {
            let sku = item.sku.as_deref().unwrap_or("").trim();
            if sku.is_empty() {
                warn!("💼️ Line '{}' on document {so_id} has no SKU. Skipping.", item.title);
                warnings.push(SkuWarning { sku: String::new(), title: item.title.clone() });
                continue;
            }
            let product_ids = self.rpc.search(PRODUCT, json!([["default_code", "=", sku]])).await?;
            let Some(product_id) = product_ids.first() else {
                warn!("💼️ No product with reference '{sku}' in Odoo. Skipping line '{}'.", item.title);
                warnings.push(SkuWarning { sku: sku.to_string(), title: item.title.clone() });
                continue;
            };
            let values = json!({
                "order_id": so_id,
                "product_id": product_id,
                "name": item.title,
                "product_uom_qty": item.quantity,
                "price_unit": item.unit_price,
            });
            self.rpc.create(SALE_ORDER_LINE, values).await?;
        }
        Ok(warnings)
    }

    /// Validates every delivery order attached to the sales document, recording a
    /// per-picking outcome. One picking failing does not stop the others.
    ///
    /// If the document has no pickings yet (the confirmation may not have produced
    /// them at propagation time), a single confirm-and-refetch cycle is attempted.
    pub async fn confirm_delivery(&self, so_id: i64) -> Result<Vec<PickingOutcome>, SyncError> {
        let mut pickings = self.fetch_pickings(so_id).await?;
        if pickings.is_empty() {
            warn!("🚚️ Sales document {so_id} has no delivery orders. Confirming and refetching once.");
            self.confirm_document(so_id).await?;
            pickings = self.fetch_pickings(so_id).await?;
            if pickings.is_empty() {
                warn!("🚚️ Still no delivery orders on {so_id}. Nothing to validate.");
                return Ok(Vec::new());
            }
        }
        let mut outcomes = Vec::with_capacity(pickings.len());
        for picking in pickings {
            if picking.status == "done" {
                debug!("🚚️ Picking {} is already done", picking.name);
                outcomes.push(PickingOutcome {
                    picking_id: picking.id,
                    name: picking.name,
                    validated: true,
                    detail: None,
                });
                continue;
            }
            let outcome = match self.validate_picking(picking.id).await {
                Ok(()) => {
                    info!("🚚️ Validated picking {} ({})", picking.name, picking.id);
                    PickingOutcome { picking_id: picking.id, name: picking.name, validated: true, detail: None }
                },
                Err(e) => {
                    error!("🚚️ Could not validate picking {} ({}). {e}", picking.name, picking.id);
                    PickingOutcome {
                        picking_id: picking.id,
                        name: picking.name,
                        validated: false,
                        detail: Some(e.to_string()),
                    }
                },
            };
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Diagnostic view: the sales document plus its pickings and moves.
    pub async fn fulfillment_snapshot(&self, so_id: i64) -> Result<FulfillmentSnapshot, SyncError> {
        let fields = &["name", "state", "origin", "client_order_ref", "partner_id", "amount_total"];
        let order = self
            .rpc
            .read(SALE_ORDER, &[so_id], fields)
            .await?
            .into_iter()
            .next()
            .ok_or(SyncError::ErpDocumentNotFound(so_id))?;
        let pickings = self
            .rpc
            .search_read(PICKING, json!([["sale_id", "=", so_id]]), &["id", "name", "state", "scheduled_date"])
            .await?;
        let picking_ids: Vec<i64> = pickings.iter().filter_map(|p| p["id"].as_i64()).collect();
        let moves = if picking_ids.is_empty() {
            Vec::new()
        } else {
            self.rpc
                .search_read(
                    STOCK_MOVE,
                    json!([["picking_id", "in", picking_ids]]),
                    &["id", "picking_id", "product_id", "product_uom_qty", "quantity_done"],
                )
                .await?
        };
        Ok(FulfillmentSnapshot { order, pickings, moves })
    }

    async fn validate_picking(&self, picking_id: i64) -> Result<(), SyncError> {
        let moves = self
            .rpc
            .search_read(
                STOCK_MOVE,
                json!([["picking_id", "=", picking_id]]),
                &["id", "product_uom_qty", "reserved_availability"],
            )
            .await?;
        for mv in &moves {
            let Some(move_id) = mv["id"].as_i64() else { continue };
            let planned = mv["reserved_availability"]
                .as_f64()
                .filter(|q| *q > 0.0)
                .or_else(|| mv["product_uom_qty"].as_f64().filter(|q| *q > 0.0))
                .unwrap_or(1.0);
            self.rpc.write(STOCK_MOVE, &[move_id], json!({ "quantity_done": planned })).await?;
        }
        self.rpc.call_button(PICKING, "button_validate", &[picking_id]).await?;
        Ok(())
    }

    pub async fn fetch_pickings(&self, so_id: i64) -> Result<Vec<PickingRef>, SyncError> {
        let rows =
            self.rpc.search_read(PICKING, json!([["sale_id", "=", so_id]]), &["id", "name", "state"]).await?;
        let pickings = rows
            .into_iter()
            .filter_map(|row| {
                Some(PickingRef {
                    id: row["id"].as_i64()?,
                    name: row["name"].as_str().unwrap_or("").to_string(),
                    status: row["state"].as_str().unwrap_or("").to_string(),
                })
            })
            .collect();
        Ok(pickings)
    }

    async fn document_name(&self, so_id: i64) -> Result<String, SyncError> {
        let rows = self.rpc.read(SALE_ORDER, &[so_id], &["name"]).await?;
        let name = rows.first().and_then(|r| r["name"].as_str()).unwrap_or_default().to_string();
        Ok(name)
    }

    async fn ensure_partner_tag(&self) -> Result<i64, SyncError> {
        let tag = self.config.partner_tag.as_str();
        let ids = self.rpc.search(PARTNER_CATEGORY, json!([["name", "=", tag]])).await?;
        if let Some(id) = ids.first() {
            return Ok(*id);
        }
        let id = self.rpc.create(PARTNER_CATEGORY, json!({ "name": tag })).await?;
        info!("💼️ Created partner category '{tag}' (id {id})");
        Ok(id)
    }

    async fn resolve_warehouse(&self, is_fulfillment: bool) -> Result<Option<i64>, SyncError> {
        let code = if is_fulfillment {
            self.config.fulfillment_warehouse_code.as_str()
        } else {
            self.config.seller_warehouse_code.as_str()
        };
        let ids = self.rpc.search(WAREHOUSE, json!([["code", "=", code]])).await?;
        if ids.is_empty() {
            warn!("💼️ No warehouse with code '{code}'. The document will use the Odoo default.");
        }
        Ok(ids.first().copied())
    }

    /// The partner field values derived from the buyer and shipping snapshots. State
    /// resolution is best effort; a failed lookup only drops the state field.
    async fn partner_values(&self, order: &Order) -> Map<String, Value> {
        let buyer = &*order.buyer;
        let mut values = Map::new();
        values.insert("name".to_string(), json!(buyer.display_name()));
        if let Some(email) = buyer.email.as_deref().filter(|s| !s.is_empty()) {
            values.insert("email".to_string(), json!(email));
        }
        if let Some(phone) = buyer.phone.as_deref().filter(|s| !s.is_empty()) {
            values.insert("phone".to_string(), json!(phone));
        }
        if let Some(vat) = buyer.identification_number.as_deref().filter(|s| !s.is_empty()) {
            values.insert("vat".to_string(), json!(vat));
        }
        if let Some(shipping) = order.shipping.as_ref() {
            values.insert("street".to_string(), json!(shipping.address));
            let parsed = parse_address(&shipping.address);
            if let Some(city) = parsed.city {
                values.insert("city".to_string(), json!(city));
            }
            if let Some(zip) = parsed.zip {
                values.insert("zip".to_string(), json!(zip));
            }
            if let Some(state) = parsed.state {
                match self.rpc.search(COUNTRY_STATE, json!([["name", "=ilike", state]])).await {
                    Ok(ids) => {
                        if let Some(state_id) = ids.first() {
                            values.insert("state_id".to_string(), json!(state_id));
                        }
                    },
                    Err(e) => warn!("💼️ Could not resolve state '{state}'. Leaving it unset. {e}"),
                }
            }
        }
        values
    }
}

/// The subset of `desired` whose values differ from what the partner record holds.
/// Only plain scalar fields take part; relational fields are handled separately.
fn diff_partner(desired: &Map<String, Value>, existing: &Value) -> Map<String, Value> {
    let mut diff = Map::new();
    for key in ["name", "email", "phone", "vat", "street", "city", "zip"] {
        let Some(want) = desired.get(key).and_then(Value::as_str) else { continue };
        let have = existing[key].as_str().unwrap_or("");
        if want != have {
            diff.insert(key.to_string(), json!(want));
        }
    }
    diff
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::diff_partner;

    #[test]
    fn diff_reports_only_changed_fields() {
        let mut desired = serde_json::Map::new();
        desired.insert("name".to_string(), json!("Jane Doe"));
        desired.insert("email".to_string(), json!("jane@example.com"));
        desired.insert("street".to_string(), json!("Main - 123"));
        let existing = json!({ "id": 5, "name": "Jane Doe", "email": "old@example.com", "street": false });
        let diff = diff_partner(&desired, &existing);
        assert_eq!(diff.len(), 2);
        assert_eq!(diff["email"], json!("jane@example.com"));
        assert_eq!(diff["street"], json!("Main - 123"));
        assert!(!diff.contains_key("name"));
    }

    #[test]
    fn identical_records_produce_an_empty_diff() {
        let mut desired = serde_json::Map::new();
        desired.insert("name".to_string(), json!("Jane Doe"));
        let existing = json!({ "id": 5, "name": "Jane Doe" });
        assert!(diff_partner(&desired, &existing).is_empty());
    }
}
