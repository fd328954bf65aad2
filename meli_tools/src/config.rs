use log::*;
use mog_common::Secret;

pub const DEFAULT_MELI_BASE_URL: &str = "https://api.mercadolibre.com";

#[derive(Debug, Clone, Default)]
pub struct MeliConfig {
    /// Base URL of the MercadoLibre REST API. Overridable for tests.
    pub base_url: String,
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub redirect_uri: String,
    /// The seller account whose orders and listings this gateway synchronizes.
    pub seller_id: String,
}

impl MeliConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("MELI_BASE_URL").unwrap_or_else(|_| DEFAULT_MELI_BASE_URL.to_string());
        let client_id = std::env::var("MELI_CLIENT_ID").unwrap_or_else(|_| {
            warn!("MELI_CLIENT_ID not set, using (probably useless) default");
            "0000000000000000".to_string()
        });
        let client_secret = Secret::new(std::env::var("MELI_CLIENT_SECRET").unwrap_or_else(|_| {
            warn!("MELI_CLIENT_SECRET not set, using (probably useless) default");
            "00000000000000".to_string()
        }));
        let redirect_uri = std::env::var("MELI_REDIRECT_URI").unwrap_or_else(|_| {
            warn!("MELI_REDIRECT_URI not set, using (probably useless) default");
            "https://localhost/meli/auth/user".to_string()
        });
        let seller_id = std::env::var("MELI_SELLER_ID").unwrap_or_else(|_| {
            warn!("MELI_SELLER_ID not set, using (probably useless) default");
            "0".to_string()
        });
        Self { base_url, client_id, client_secret, redirect_uri, seller_id }
    }
}
