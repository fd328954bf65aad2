//! HTTP surface of the gateway.
//!
//! The webhook route always answers 200 (the marketplace retries anything else); the
//! diagnostic routes use regular status codes.

use actix_web::{get, post, web, HttpRequest, HttpResponse};
use log::*;
use meli_sync_engine::{IngestApi, IngestOutcome, ShipmentOutcome, SqliteDatabase, SyncError};
use meli_tools::MeliApi;
use odoo_tools::OdooApi;
use serde::Deserialize;

use crate::{
    data_objects::{JsonResponse, WebhookNotification},
    errors::ServerError,
};

/// The fully wired orchestrator the routes run against.
pub type Ingest = IngestApi<SqliteDatabase, MeliApi, OdooApi>;

#[get("/health")]
pub async fn health() -> HttpResponse {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

#[post("/notifications")]
pub async fn meli_webhook(
    req: HttpRequest,
    body: web::Json<WebhookNotification>,
    api: web::Data<Ingest>,
) -> HttpResponse {
    trace!("🔔️ Received webhook request: {}", req.uri());
    let notification = body.into_inner();
    let Some(resource_id) = notification.resource_id() else {
        warn!("🔔️ Notification with unusable resource '{}'. Acknowledging anyway.", notification.resource);
        return HttpResponse::Ok().json(JsonResponse::failure("Could not parse a resource id."));
    };
    let response = match notification.topic.as_str() {
        "orders_v2" | "orders" => handle_order_notification(&api, resource_id).await,
        "shipments" => handle_shipment_notification(&api, resource_id).await,
        topic => {
            debug!("🔔️ Ignoring notification for topic '{topic}'");
            JsonResponse::success(format!("Topic {topic} is not handled."))
        },
    };
    HttpResponse::Ok().json(response)
}

async fn handle_order_notification(api: &Ingest, order_id: i64) -> JsonResponse {
    match api.process_order_notification(order_id).await {
        Ok(IngestOutcome::Ingested(order)) => {
            info!("🔔️ Order {} ingested.", order.order_id);
            JsonResponse::success("Order processed successfully.")
        },
        Ok(IngestOutcome::AlreadyProcessed(order)) => {
            info!("🔔️ Order {} already exists.", order.order_id);
            JsonResponse::success("Order already exists.")
        },
        Ok(IngestOutcome::Locked(id)) => {
            info!("🔔️ Order {id} is being processed already.");
            JsonResponse::success("Order is already being processed.")
        },
        Err(SyncError::Marketplace(e)) => {
            warn!("🔔️ Could not fetch order {order_id} from the marketplace. {e}");
            JsonResponse::failure(e.to_string())
        },
        Err(e) => {
            warn!("🔔️ Unexpected error while handling an order notification. {e}");
            JsonResponse::failure("Unexpected error handling the order.")
        },
    }
}

async fn handle_shipment_notification(api: &Ingest, shipment_id: i64) -> JsonResponse {
    match api.process_shipment_notification(shipment_id).await {
        Ok(ShipmentOutcome::Completed { order, outcomes }) => {
            let validated = outcomes.iter().filter(|o| o.validated).count();
            info!("🚚️ Order {} completed. {validated}/{} picking(s) validated.", order.order_id, outcomes.len());
            JsonResponse::success("Delivery reconciled.")
        },
        Ok(ShipmentOutcome::NotDelivered(id)) => {
            debug!("🚚️ Shipment of order {id} is not delivered yet.");
            JsonResponse::success("Shipment is not delivered yet.")
        },
        Ok(ShipmentOutcome::NotPropagated(id)) => {
            info!("🚚️ Order {id} has no sales document yet. Reconciliation deferred.");
            JsonResponse::success("Order is not propagated yet.")
        },
        Ok(ShipmentOutcome::UnknownOrder(id)) => {
            info!("🚚️ Shipment belongs to unknown order {id}.");
            JsonResponse::success("Order is not ingested yet.")
        },
        Ok(ShipmentOutcome::Unresolvable(id)) => {
            warn!("🚚️ Shipment {id} does not name an owning order.");
            JsonResponse::failure("Shipment has no owning order.")
        },
        Err(e) => {
            warn!("🚚️ Unexpected error while handling a shipment notification. {e}");
            JsonResponse::failure("Unexpected error handling the shipment.")
        },
    }
}

#[derive(Debug, Deserialize)]
pub struct AuthParams {
    code: String,
}

/// OAuth2 redirect target: exchanges the authorization code for tokens.
#[get("/auth/user")]
pub async fn meli_auth(params: web::Query<AuthParams>, api: web::Data<MeliApi>) -> HttpResponse {
    match api.exchange_code(&params.code).await {
        Ok(tokens) => {
            info!("🔑️ Marketplace authorization complete for user {:?}", tokens.user_id);
            HttpResponse::Ok().json(JsonResponse::success(format!(
                "Authorized as user {}.",
                tokens.user_id.map(|u| u.to_string()).unwrap_or_else(|| "unknown".to_string())
            )))
        },
        Err(e) => {
            error!("🔑️ Authorization-code exchange failed. {e}");
            HttpResponse::BadRequest().json(JsonResponse::failure(e.to_string()))
        },
    }
}

/// Diagnostic ingest of a single order: runs the same flow as the webhook and
/// returns the stored record. Unlike the webhook, errors surface as failure codes.
#[get("/orders/{order_id}")]
pub async fn ingest_order(path: web::Path<i64>, api: web::Data<Ingest>) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    match api.process_order_notification(order_id).await? {
        IngestOutcome::Ingested(order) | IngestOutcome::AlreadyProcessed(order) => {
            Ok(HttpResponse::Ok().json(order))
        },
        IngestOutcome::Locked(id) => {
            Ok(HttpResponse::Accepted().json(JsonResponse::success(format!("Order {id} is being processed."))))
        },
    }
}

/// Diagnostic view of the seller's marketplace listings.
#[get("/products")]
pub async fn seller_products(api: web::Data<MeliApi>) -> Result<HttpResponse, ServerError> {
    let products = api.fetch_products().await.map_err(|e| ServerError::BackendError(e.to_string()))?;
    Ok(HttpResponse::Ok().json(products))
}

/// Diagnostic view of a sales document and its fulfillment state in Odoo.
#[get("/snapshot/{so_id}")]
pub async fn fulfillment_snapshot(
    path: web::Path<i64>,
    api: web::Data<Ingest>,
) -> Result<HttpResponse, ServerError> {
    let snapshot = api.fulfillment().fulfillment_snapshot(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

/// Connection test against the Odoo instance.
#[get("/version")]
pub async fn odoo_version(api: web::Data<OdooApi>) -> Result<HttpResponse, ServerError> {
    let version = api.version().await.map_err(|e| ServerError::BackendError(e.to_string()))?;
    Ok(HttpResponse::Ok().json(version))
}
