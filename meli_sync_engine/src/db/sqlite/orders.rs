use chrono::Utc;
use log::*;
use sqlx::{types::Json, SqliteConnection};

use crate::{
    db_types::{NewOrder, OdooRefs, Order, OrderId, OrderStatus},
    traits::SyncError,
};

const ORDER_COLUMNS: &str = "id, order_id, status, created_at, total_amount, currency, buyer, shipping, \
     line_items, payments, odoo_order_id, odoo_reference, odoo_client_ref, odoo_pickings, updated_at";

/// Inserts the order unless its marketplace id is already present. The UNIQUE
/// constraint on `order_id` is the backstop against races between two ingestions of
/// the same notification; the loser of the race gets the existing row back.
pub async fn idempotent_insert(
    order: NewOrder,
    conn: &mut SqliteConnection,
) -> Result<(Order, bool), SyncError> {
    let oid = order.order_id.clone();
    if let Some(existing) = fetch_order_by_order_id(&oid, conn).await? {
        debug!("📝️ Order {oid} is already in the store. Returning the stored record.");
        return Ok((existing, false));
    }
    match insert_order(order, &mut *conn).await {
        Ok(order) => Ok((order, true)),
        Err(SyncError::DatabaseError(msg)) if msg.contains("UNIQUE constraint") => {
            // Lost an insert race. The winner's row is authoritative.
            let existing = fetch_order_by_order_id(&oid, conn)
                .await?
                .ok_or(SyncError::DatabaseError(msg))?;
            Ok((existing, false))
        },
        Err(e) => Err(e),
    }
}

async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, SyncError> {
    let q = format!(
        "INSERT INTO orders (order_id, status, created_at, total_amount, currency, buyer, shipping, line_items, \
         payments, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING {ORDER_COLUMNS}"
    );
    let now = Utc::now();
    let inserted = sqlx::query_as::<_, Order>(&q)
        .bind(&order.order_id)
        .bind(order.status)
        .bind(order.created_at)
        .bind(order.total_amount)
        .bind(&order.currency)
        .bind(Json(&order.buyer))
        .bind(order.shipping.as_ref().map(Json))
        .bind(Json(&order.line_items))
        .bind(Json(&order.payments))
        .bind(now)
        .fetch_one(conn)
        .await?;
    Ok(inserted)
}

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, SyncError> {
    let q = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = ?");
    let order = sqlx::query_as::<_, Order>(&q).bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn set_odoo_refs(
    order_id: &OrderId,
    refs: OdooRefs,
    conn: &mut SqliteConnection,
) -> Result<Order, SyncError> {
    let q = format!(
        "UPDATE orders SET odoo_order_id = ?, odoo_reference = ?, odoo_client_ref = ?, odoo_pickings = ?, \
         updated_at = ? WHERE order_id = ? RETURNING {ORDER_COLUMNS}"
    );
    let order = sqlx::query_as::<_, Order>(&q)
        .bind(refs.order_id)
        .bind(&refs.reference)
        .bind(&refs.client_ref)
        .bind(Json(&refs.pickings))
        .bind(Utc::now())
        .bind(order_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| SyncError::OrderNotFound(order_id.clone()))?;
    Ok(order)
}

pub async fn update_order_status(
    order_id: &OrderId,
    status: OrderStatus,
    conn: &mut SqliteConnection,
) -> Result<Order, SyncError> {
    let q = format!("UPDATE orders SET status = ?, updated_at = ? WHERE order_id = ? RETURNING {ORDER_COLUMNS}");
    let order = sqlx::query_as::<_, Order>(&q)
        .bind(status)
        .bind(Utc::now())
        .bind(order_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| SyncError::OrderNotFound(order_id.clone()))?;
    Ok(order)
}

/// Flips the order to completed and refreshes the stored shipping snapshot with the
/// status and tags the shipment last reported.
pub async fn mark_completed(
    order_id: &OrderId,
    shipping_status: &str,
    tags: &[String],
    conn: &mut SqliteConnection,
) -> Result<Order, SyncError> {
    let existing = fetch_order_by_order_id(order_id, &mut *conn)
        .await?
        .ok_or_else(|| SyncError::OrderNotFound(order_id.clone()))?;
    let shipping = existing.shipping.map(|Json(mut s)| {
        s.status = shipping_status.to_string();
        s.tags = tags.to_vec();
        Json(s)
    });
    let q = format!(
        "UPDATE orders SET status = ?, shipping = ?, updated_at = ? WHERE order_id = ? RETURNING {ORDER_COLUMNS}"
    );
    let order = sqlx::query_as::<_, Order>(&q)
        .bind(OrderStatus::Completed)
        .bind(shipping)
        .bind(Utc::now())
        .bind(order_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| SyncError::OrderNotFound(order_id.clone()))?;
    info!("✅️ Order {order_id} marked completed in the store");
    Ok(order)
}
