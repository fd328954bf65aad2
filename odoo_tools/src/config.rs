use log::*;
use mog_common::Secret;

#[derive(Debug, Clone, Default)]
pub struct OdooConfig {
    /// Base URL of the Odoo instance, e.g. "http://localhost:8069".
    pub url: String,
    /// Database name to authenticate against.
    pub db: String,
    pub username: String,
    pub password: Secret<String>,
}

impl OdooConfig {
    pub fn new_from_env_or_default() -> Self {
        let url = std::env::var("ODOO_URL").unwrap_or_else(|_| {
            warn!("ODOO_URL not set, using http://localhost:8069 as default");
            "http://localhost:8069".to_string()
        });
        let db = std::env::var("ODOO_DB").unwrap_or_else(|_| {
            warn!("ODOO_DB not set, using (probably useless) default");
            "odoo".to_string()
        });
        let username = std::env::var("ODOO_USER").unwrap_or_else(|_| {
            warn!("ODOO_USER not set, using (probably useless) default");
            "admin".to_string()
        });
        let password = Secret::new(std::env::var("ODOO_PASSWORD").unwrap_or_else(|_| {
            warn!("ODOO_PASSWORD not set, using (probably useless) default");
            "admin".to_string()
        }));
        Self { url, db, username, password }
    }
}
