use meli_tools::{MeliApi, MeliApiError, MeliBuyer, MeliOrder, MeliOrderSummary, MeliShipment};
use thiserror::Error;

use crate::db_types::{NewOrder, OdooRefs, Order, OrderId, OrderStatus};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} is not in the local store")]
    OrderNotFound(OrderId),
    #[error("Sales document {0} does not exist in Odoo")]
    ErpDocumentNotFound(i64),
    #[error("Marketplace error: {0}")]
    Marketplace(#[from] MeliApiError),
    #[error("ERP error: {0}")]
    Rpc(#[from] odoo_tools::OdooRpcError),
}

impl From<sqlx::Error> for SyncError {
    fn from(e: sqlx::Error) -> Self {
        SyncError::DatabaseError(e.to_string())
    }
}

/// Persistence seam for ingested orders.
#[allow(async_fn_in_trait)]
pub trait OrderStore: Clone {
    /// Inserts the order if its marketplace id is not present yet. Returns the stored
    /// row and a flag that is `true` iff this call created it.
    async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), SyncError>;

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, SyncError>;

    /// Writes the Odoo cross-references back onto the stored order.
    async fn set_odoo_refs(&self, order_id: &OrderId, refs: OdooRefs) -> Result<Order, SyncError>;

    async fn update_status(&self, order_id: &OrderId, status: OrderStatus) -> Result<Order, SyncError>;

    /// Marks the order completed and refreshes the stored shipping status and tags
    /// with what the shipment reported.
    async fn mark_completed(&self, order_id: &OrderId, shipping_status: &str, tags: &[String])
        -> Result<Order, SyncError>;
}

/// Read seam over the marketplace REST API, so the orchestrator can be exercised
/// without network access.
#[allow(async_fn_in_trait)]
pub trait MarketplaceClient {
    async fn fetch_order(&self, order_id: i64) -> Result<MeliOrder, MeliApiError>;
    async fn fetch_buyer(&self, buyer_id: i64) -> Result<MeliBuyer, MeliApiError>;
    async fn fetch_shipment(&self, shipment_id: i64) -> Result<MeliShipment, MeliApiError>;
    async fn fetch_orders(&self) -> Result<Vec<MeliOrderSummary>, MeliApiError>;
}

impl MarketplaceClient for MeliApi {
    async fn fetch_order(&self, order_id: i64) -> Result<MeliOrder, MeliApiError> {
        MeliApi::fetch_order(self, order_id).await
    }

    async fn fetch_buyer(&self, buyer_id: i64) -> Result<MeliBuyer, MeliApiError> {
        MeliApi::fetch_buyer(self, buyer_id).await
    }

    async fn fetch_shipment(&self, shipment_id: i64) -> Result<MeliShipment, MeliApiError> {
        MeliApi::fetch_shipment(self, shipment_id).await
    }

    async fn fetch_orders(&self) -> Result<Vec<MeliOrderSummary>, MeliApiError> {
        MeliApi::fetch_orders(self).await
    }
}
