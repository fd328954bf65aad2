use log::*;
use sqlx::SqlitePool;

use crate::{
    db::sqlite::{create_schema, db_url, new_pool, orders},
    db_types::{NewOrder, OdooRefs, Order, OrderId, OrderStatus},
    traits::{OrderStore, SyncError},
};

/// The SQLite-backed order store. Clones share the connection pool.
#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl std::fmt::Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteDatabase ({})", self.url)
    }
}

impl SqliteDatabase {
    /// Connects using `MOG_DATABASE_URL`, creating the database and schema if needed.
    pub async fn new(max_connections: u32) -> Result<Self, SyncError> {
        let url = db_url();
        Self::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SyncError> {
        let pool = new_pool(url, max_connections).await?;
        create_schema(&pool).await?;
        info!("📝️ Order store ready at {url}");
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }
}

impl OrderStore for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), SyncError> {
        let mut conn = self.pool.acquire().await?;
        orders::idempotent_insert(order, &mut conn).await
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, SyncError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_order_id(order_id, &mut conn).await
    }

    async fn set_odoo_refs(&self, order_id: &OrderId, refs: OdooRefs) -> Result<Order, SyncError> {
        let mut conn = self.pool.acquire().await?;
        orders::set_odoo_refs(order_id, refs, &mut conn).await
    }

    async fn update_status(&self, order_id: &OrderId, status: OrderStatus) -> Result<Order, SyncError> {
        let mut conn = self.pool.acquire().await?;
        orders::update_order_status(order_id, status, &mut conn).await
    }

    async fn mark_completed(
        &self,
        order_id: &OrderId,
        shipping_status: &str,
        tags: &[String],
    ) -> Result<Order, SyncError> {
        let mut conn = self.pool.acquire().await?;
        orders::mark_completed(order_id, shipping_status, tags, &mut conn).await
    }
}
