use std::{env, time::Duration};

use log::*;
use meli_sync_engine::fulfillment::FulfillmentConfig;
use meli_tools::MeliConfig;
use odoo_tools::OdooConfig;

const DEFAULT_MOG_HOST: &str = "127.0.0.1";
const DEFAULT_MOG_PORT: u16 = 3000;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// How often the polling fallback walks the seller's recent orders.
    pub poll_interval: Duration,
    pub meli: MeliConfig,
    pub odoo: OdooConfig,
    pub fulfillment: FulfillmentConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_MOG_HOST.to_string(),
            port: DEFAULT_MOG_PORT,
            database_url: String::default(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            meli: MeliConfig::default(),
            odoo: OdooConfig::default(),
            fulfillment: FulfillmentConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.into(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("MOG_HOST").ok().unwrap_or_else(|| {
            warn!("MOG_HOST is not set. Using the default, {DEFAULT_MOG_HOST}");
            DEFAULT_MOG_HOST.into()
        });
        let port = env::var("MOG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!("{s} is not a valid port for MOG_PORT. {e} Using the default, {DEFAULT_MOG_PORT}");
                    DEFAULT_MOG_PORT
                })
            })
            .unwrap_or_else(|_| {
                warn!("MOG_PORT is not set. Using the default, {DEFAULT_MOG_PORT}");
                DEFAULT_MOG_PORT
            });
        let database_url = meli_sync_engine::db_url();
        let poll_interval = env::var("MOG_POLL_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| {
                warn!("MOG_POLL_INTERVAL_SECS is not set. Polling every {DEFAULT_POLL_INTERVAL_SECS}s.");
                Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS)
            });
        Self {
            host,
            port,
            database_url,
            poll_interval,
            meli: MeliConfig::new_from_env_or_default(),
            odoo: OdooConfig::new_from_env_or_default(),
            fulfillment: FulfillmentConfig::new_from_env_or_default(),
        }
    }
}
