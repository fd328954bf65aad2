use std::sync::Arc;

use chrono::{Duration, Utc};
use log::*;
use mog_common::Secret;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};

use crate::{
    config::MeliConfig,
    data_objects::{ItemsSearchResponse, OrderWire, OrdersSearchResponse},
    token::{TokenHolder, TokenSet},
    MeliApiError,
    MeliBuyer,
    MeliOrder,
    MeliOrderSummary,
    MeliProduct,
    MeliShipment,
};

/// Page size for the paginated order search. The API caps this at 51.
const ORDER_PAGE_SIZE: i64 = 50;

/// Grant lifetime to assume when the token response omits `expires_in`. Access
/// tokens are documented to live six hours.
const TOKEN_TTL_FALLBACK_SECS: i64 = 21_600;

#[derive(Deserialize)]
struct TokenResponseWire {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    user_id: Option<i64>,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Authenticated client for the MercadoLibre REST API.
///
/// Handles the OAuth2 token lifecycle (authorization-code exchange and refresh) and
/// the order/buyer/shipment resources the gateway needs. Pagination is hidden from
/// callers. Clones share the underlying HTTP client and token state.
#[derive(Clone)]
pub struct MeliApi {
    config: MeliConfig,
    client: Arc<Client>,
    tokens: TokenHolder,
}

impl MeliApi {
    pub fn new(config: MeliConfig, tokens: TokenHolder) -> Result<Self, MeliApiError> {
        let client = Client::builder().build().map_err(|e| MeliApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client), tokens })
    }

    pub fn tokens(&self) -> &TokenHolder {
        &self.tokens
    }

    //------------------------------------   Token lifecycle   -------------------------------------------------------

    /// Exchanges an authorization code for an access/refresh token pair and stores the
    /// result in the shared token holder.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenSet, MeliApiError> {
        let form = [
            ("grant_type", "authorization_code"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.reveal().as_str()),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];
        let tokens = self.token_request(&form).await?;
        info!("🛒️ Access token obtained for user {:?}", tokens.user_id);
        Ok(tokens)
    }

    /// Refreshes the access token. Fails with [`MeliApiError::NoRefreshToken`] if the
    /// authorization-code flow has not been completed in this process's lifetime.
    pub async fn refresh_access_token(&self) -> Result<TokenSet, MeliApiError> {
        let refresh_token = self.tokens.refresh_token().ok_or(MeliApiError::NoRefreshToken)?;
        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.reveal().as_str()),
            ("refresh_token", refresh_token.as_str()),
        ];
        let tokens = self.token_request(&form).await?;
        info!("🛒️ Access token refreshed");
        Ok(tokens)
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenSet, MeliApiError> {
        let url = format!("{}/oauth/token", self.config.base_url);
        let response =
            self.client.post(url).form(form).send().await.map_err(|e| MeliApiError::RestResponseError(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(MeliApiError::Auth(format!("Token grant rejected ({status}). {message}")));
        }
        let wire =
            response.json::<TokenResponseWire>().await.map_err(|e| MeliApiError::JsonError(e.to_string()))?;
        // Refresh grants may omit the refresh token. Keep the one we already hold.
        let refresh_token = wire.refresh_token.map(Secret::new).or_else(|| self.tokens.refresh_token().map(Secret::new));
        let tokens = TokenSet {
            access_token: Secret::new(wire.access_token),
            refresh_token,
            user_id: wire.user_id.or_else(|| self.tokens.user_id()),
            expires_at: Utc::now() + Duration::seconds(wire.expires_in.unwrap_or(TOKEN_TTL_FALLBACK_SECS)),
        };
        self.tokens.set(tokens.clone());
        Ok(tokens)
    }

    //------------------------------------   REST plumbing   ---------------------------------------------------------

    /// Performs an authenticated GET. A token past its grant lifetime is refreshed
    /// before the call; a 401 still triggers exactly one refresh-and-retry, and any
    /// further rejection propagates to the caller.
    async fn rest_get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<T, MeliApiError> {
        if self.tokens.is_expired() {
            debug!("🛒️ Access token is past its expiry. Refreshing before calling {path}.");
            if let Err(e) = self.refresh_access_token().await {
                warn!("🛒️ Could not refresh the expired token. Sending the held one anyway. {e}");
            }
        }
        match self.try_get(path, params).await {
            Err(e) if e.is_auth_rejection() => {
                debug!("🛒️ Access token rejected on {path}. Refreshing and retrying once.");
                self.refresh_access_token().await?;
                self.try_get(path, params).await
            },
            other => other,
        }
    }

    async fn try_get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<T, MeliApiError> {
        let token = self.tokens.access_token().ok_or(MeliApiError::MissingAccessToken)?;
        let url = format!("{}{path}", self.config.base_url);
        trace!("🛒️ Sending REST query: {url}");
        let mut req = self.client.get(url).bearer_auth(token);
        if !params.is_empty() {
            req = req.query(params);
        }
        let response = req.send().await.map_err(|e| MeliApiError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            trace!("🛒️ REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| MeliApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| MeliApiError::RestResponseError(e.to_string()))?;
            Err(MeliApiError::QueryError { status, message })
        }
    }

    //------------------------------------   Resources   -------------------------------------------------------------

    /// Fetches a single order and, when it carries a shipping reference, joins in the
    /// shipment detail so the result carries a composed address and delivery tags.
    pub async fn fetch_order(&self, order_id: i64) -> Result<MeliOrder, MeliApiError> {
        debug!("🛒️ Fetching order #{order_id}");
        let order: OrderWire = self.rest_get(&format!("/orders/{order_id}"), &[]).await?;
        let shipment = match order.shipping.as_ref().and_then(|s| s.id) {
            Some(shipment_id) => {
                debug!("🛒️ Fetching shipment #{shipment_id} for order #{order_id}");
                Some(self.fetch_shipment(shipment_id).await?)
            },
            None => {
                warn!("🛒️ Order #{order_id} has no shipping reference. Shipping fields will be absent.");
                None
            },
        };
        info!("🛒️ Fetched order #{order_id}");
        Ok(MeliOrder::assemble(order, shipment))
    }

    /// Fetches the seller's recent orders, flattening the API's pagination into a
    /// single sequence.
    pub async fn fetch_orders(&self) -> Result<Vec<MeliOrderSummary>, MeliApiError> {
        let mut summaries = Vec::new();
        let mut offset = 0i64;
        loop {
            let params = [
                ("seller", self.config.seller_id.clone()),
                ("offset", offset.to_string()),
                ("limit", ORDER_PAGE_SIZE.to_string()),
            ];
            let page: OrdersSearchResponse = self.rest_get("/orders/search", &params).await?;
            let fetched = page.results.len() as i64;
            summaries.extend(page.results.into_iter().map(MeliOrderSummary::from));
            offset += fetched;
            if fetched == 0 || offset >= page.paging.total {
                break;
            }
        }
        debug!("🛒️ Fetched {} orders for seller {}", summaries.len(), self.config.seller_id);
        Ok(summaries)
    }

    pub async fn fetch_buyer(&self, buyer_id: i64) -> Result<MeliBuyer, MeliApiError> {
        debug!("🛒️ Fetching buyer #{buyer_id}");
        self.rest_get(&format!("/users/{buyer_id}"), &[]).await
    }

    pub async fn fetch_shipment(&self, shipment_id: i64) -> Result<MeliShipment, MeliApiError> {
        self.rest_get(&format!("/shipments/{shipment_id}"), &[]).await
    }

    /// Fetches the seller's listings: one search call for the ids, then one call per
    /// item for the stock detail.
    pub async fn fetch_products(&self) -> Result<Vec<MeliProduct>, MeliApiError> {
        let path = format!("/users/{}/items/search", self.config.seller_id);
        let ids: ItemsSearchResponse = self.rest_get(&path, &[]).await?;
        let mut products = Vec::with_capacity(ids.results.len());
        for item_id in &ids.results {
            let product: MeliProduct = self.rest_get(&format!("/items/{item_id}"), &[]).await?;
            products.push(product);
        }
        info!("🛒️ Fetched {} listings", products.len());
        Ok(products)
    }
}
