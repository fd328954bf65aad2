#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use meli_sync_engine::{db_types::NewOrder, ingest::new_order_from_meli, MarketplaceClient, SqliteDatabase};
use meli_tools::{
    MeliApiError,
    MeliBuyer,
    MeliOrder,
    MeliOrderSummary,
    MeliShipment,
    OrderBuyer,
    OrderItem,
    OrderPayment,
    ShippingDetails,
};
use mockall::mock;
use odoo_tools::{OdooRpc, OdooRpcError};
use serde_json::{json, Value};
use tempfile::NamedTempFile;

mock! {
    pub Marketplace {}

    impl MarketplaceClient for Marketplace {
        async fn fetch_order(&self, order_id: i64) -> Result<MeliOrder, MeliApiError>;
        async fn fetch_buyer(&self, buyer_id: i64) -> Result<MeliBuyer, MeliApiError>;
        async fn fetch_shipment(&self, shipment_id: i64) -> Result<MeliShipment, MeliApiError>;
        async fn fetch_orders(&self) -> Result<Vec<MeliOrderSummary>, MeliApiError>;
    }
}

mock! {
    pub Rpc {}

    impl OdooRpc for Rpc {
        async fn execute(&self, model: &str, method: &str, args: Value, kwargs: Value)
            -> Result<Value, OdooRpcError>;
    }
}

/// Every `execute` call a scripted RPC mock received, as (model, method, args).
pub type CallLog = Arc<Mutex<Vec<(String, String, Value)>>>;

pub fn call_count(log: &CallLog, model: &str, method: &str) -> usize {
    log.lock().unwrap().iter().filter(|(m, me, _)| m == model && me == method).count()
}

/// A mock Odoo that behaves like a small but self-consistent instance: no partner on
/// record, one warehouse, sales documents created as id 55 and named S00055, one
/// assigned picking with one move. Product lookups resolve every SKU except those
/// starting with "MISSING".
pub fn scripted_rpc(log: CallLog) -> MockRpc {
    let mut rpc = MockRpc::new();
    rpc.expect_execute().returning(move |model, method, args, _kwargs| {
        log.lock().unwrap().push((model.to_string(), method.to_string(), args.clone()));
        respond(model, method, &args)
    });
    rpc
}

fn respond(model: &str, method: &str, args: &Value) -> Result<Value, OdooRpcError> {
    match (model, method) {
        ("res.partner.category", "search") => Ok(json!([31])),
        ("res.partner.category", "create") => Ok(json!(31)),
        ("res.partner", "search_read") => Ok(json!([])),
        ("res.partner", "create") => Ok(json!(501)),
        ("res.partner", "write") => Ok(json!(true)),
        ("res.country.state", "search") => Ok(json!([])),
        ("stock.warehouse", "search") => Ok(json!([7])),
        ("sale.order", "create") => Ok(json!(55)),
        ("sale.order", "read") => Ok(json!([{ "id": 55, "name": "S00055", "state": "draft" }])),
        ("sale.order", "action_confirm") => Ok(json!(true)),
        ("product.product", "search") => {
            let sku = args[0][0][2].as_str().unwrap_or("");
            if sku.starts_with("MISSING") {
                Ok(json!([]))
            } else {
                Ok(json!([101]))
            }
        },
        ("sale.order.line", "create") => Ok(json!(601)),
        ("stock.picking", "search_read") => {
            Ok(json!([{ "id": 901, "name": "WH/OUT/00001", "state": "assigned" }]))
        },
        ("stock.picking", "button_validate") => Ok(json!(true)),
        ("stock.move", "search_read") => {
            Ok(json!([{ "id": 801, "product_uom_qty": 2.0, "reserved_availability": 2.0 }]))
        },
        ("stock.move", "write") => Ok(json!(true)),
        (model, method) => {
            Err(OdooRpcError::Fault { code: 0, message: format!("unscripted call {model}.{method}") })
        },
    }
}

pub fn sample_buyer() -> OrderBuyer {
    OrderBuyer {
        id: 7,
        nickname: Some("JDOE".to_string()),
        email: Some("jane@example.com".to_string()),
        phone: Some("555-0100".to_string()),
        first_name: Some("Jane".to_string()),
        last_name: Some("Doe".to_string()),
        identification_type: Some("DNI".to_string()),
        identification_number: Some("12345678".to_string()),
        tax_payer_type: None,
    }
}

pub fn sample_order(id: i64, delivered: bool, skus: &[(&str, f64)]) -> MeliOrder {
    let tags = if delivered { vec!["delivered".to_string()] } else { vec!["paid".to_string()] };
    let items = skus
        .iter()
        .map(|(sku, qty)| OrderItem {
            sku: Some(sku.to_string()),
            title: format!("Item {sku}"),
            quantity: *qty,
            unit_price: 750.0,
            currency: Some("ARS".to_string()),
        })
        .collect::<Vec<OrderItem>>();
    let total: f64 = items.iter().map(|i| i.quantity * i.unit_price).sum();
    MeliOrder {
        id,
        status: "paid".to_string(),
        date_created: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
        total_amount: total,
        currency: "ARS".to_string(),
        buyer: sample_buyer(),
        shipping_info: Some(ShippingDetails {
            shipment_id: 4000 + id,
            receiver_name: Some("Jane Doe".to_string()),
            receiver_phone: None,
            address: "Main - 123 - 00100 - Metropolis, NY".to_string(),
            status: if delivered { "delivered".to_string() } else { "ready_to_ship".to_string() },
            substatus: None,
            tags,
            logistic_type: Some("drop_off".to_string()),
        }),
        billing_address: Some("Main - 123 - 00100 - Metropolis, NY".to_string()),
        order_items: items,
        payments: vec![OrderPayment {
            id: 9000 + id,
            status: "approved".to_string(),
            total_paid: Some(total),
            date_approved: Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 5, 0).unwrap()),
        }],
    }
}

pub fn sample_new_order(id: i64) -> NewOrder {
    let order = sample_order(id, false, &[("SKU-1", 2.0)]);
    new_order_from_meli(&order, &order.buyer)
}

pub fn delivered_shipment(shipment_id: i64, order_id: i64) -> MeliShipment {
    serde_json::from_value(json!({
        "id": shipment_id,
        "order_id": order_id,
        "status": "shipped",
        "tags": ["delivered"],
        "logistic_type": "drop_off"
    }))
    .unwrap()
}

pub async fn temp_store() -> (SqliteDatabase, NamedTempFile) {
    let file = NamedTempFile::new().expect("could not create a temporary database file");
    let url = format!("sqlite://{}", file.path().display());
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("could not open the order store");
    (db, file)
}
