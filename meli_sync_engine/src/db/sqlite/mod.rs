//! SQLite backend for the order store.

mod orders;
mod sqlite_impl;

use std::str::FromStr;

use log::*;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

pub use sqlite_impl::SqliteDatabase;

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS orders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        order_id TEXT NOT NULL UNIQUE,
        status TEXT NOT NULL DEFAULT 'created',
        created_at TIMESTAMP NOT NULL,
        total_amount REAL NOT NULL,
        currency TEXT NOT NULL,
        buyer TEXT NOT NULL,
        shipping TEXT NULL,
        line_items TEXT NOT NULL,
        payments TEXT NOT NULL,
        odoo_order_id INTEGER NULL,
        odoo_reference TEXT NULL,
        odoo_client_ref TEXT NULL,
        odoo_pickings TEXT NULL,
        updated_at TIMESTAMP NOT NULL
    )"#,
    "CREATE INDEX IF NOT EXISTS orders_status_idx ON orders (status)",
];

/// The database URL, or the on-disk default if the environment doesn't specify one.
pub fn db_url() -> String {
    std::env::var("MOG_DATABASE_URL").unwrap_or_else(|_| {
        warn!("MOG_DATABASE_URL is not set. Using the default, sqlite://data/mog.db");
        "sqlite://data/mog.db".to_string()
    })
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await
}

pub(crate) async fn create_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    debug!("📝️ Order store schema is in place");
    Ok(())
}
