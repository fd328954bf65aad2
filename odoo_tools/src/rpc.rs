use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use log::*;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::{config::OdooConfig, OdooRpcError};

/// The generic ERP transport seam.
///
/// Everything the gateway asks of Odoo goes through [`OdooRpc::execute`], so callers
/// (and tests) only need to provide that one method. The model/method helpers are
/// provided in terms of it.
#[allow(async_fn_in_trait)]
pub trait OdooRpc {
    /// Invokes `execute_kw(model, method, args, kwargs)` on the remote instance.
    async fn execute(&self, model: &str, method: &str, args: Value, kwargs: Value) -> Result<Value, OdooRpcError>;

    async fn execute_as<T: DeserializeOwned>(
        &self,
        model: &str,
        method: &str,
        args: Value,
        kwargs: Value,
    ) -> Result<T, OdooRpcError> {
        let value = self.execute(model, method, args, kwargs).await?;
        serde_json::from_value(value).map_err(|e| OdooRpcError::JsonError(e.to_string()))
    }

    async fn search(&self, model: &str, domain: Value) -> Result<Vec<i64>, OdooRpcError> {
        self.execute_as(model, "search", json!([domain]), json!({})).await
    }

    async fn search_read(&self, model: &str, domain: Value, fields: &[&str]) -> Result<Vec<Value>, OdooRpcError> {
        self.execute_as(model, "search_read", json!([domain]), json!({ "fields": fields })).await
    }

    async fn read(&self, model: &str, ids: &[i64], fields: &[&str]) -> Result<Vec<Value>, OdooRpcError> {
        self.execute_as(model, "read", json!([ids]), json!({ "fields": fields })).await
    }

    async fn create(&self, model: &str, values: Value) -> Result<i64, OdooRpcError> {
        self.execute_as(model, "create", json!([values]), json!({})).await
    }

    async fn write(&self, model: &str, ids: &[i64], values: Value) -> Result<(), OdooRpcError> {
        self.execute(model, "write", json!([ids, values]), json!({})).await?;
        Ok(())
    }

    /// Invokes a workflow method (e.g. `action_confirm`, `button_validate`) on a set
    /// of records.
    async fn call_button(&self, model: &str, method: &str, ids: &[i64]) -> Result<Value, OdooRpcError> {
        self.execute(model, method, json!([ids]), json!({})).await
    }
}

/// JSON-RPC client for an Odoo instance.
///
/// Authentication is lazy: the user id is established on the first call and cached
/// process-wide. Concurrent callers share an in-flight authentication (the session
/// mutex is held across the login call), and a call that fails for auth reasons
/// re-authenticates and retries exactly once. Clones share the session.
#[derive(Clone)]
pub struct OdooApi {
    config: OdooConfig,
    client: Arc<Client>,
    session: Arc<Mutex<Option<i64>>>,
    next_id: Arc<AtomicU64>,
}

impl OdooApi {
    pub fn new(config: OdooConfig) -> Result<Self, OdooRpcError> {
        let client = Client::builder().build().map_err(|e| OdooRpcError::Initialization(e.to_string()))?;
        Ok(Self {
            config,
            client: Arc::new(client),
            session: Arc::new(Mutex::new(None)),
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    async fn call_service(&self, service: &str, method: &str, args: Value) -> Result<Value, OdooRpcError> {
        let url = format!("{}/jsonrpc", self.config.url);
        let body = json!({
            "jsonrpc": "2.0",
            "method": "call",
            "params": { "service": service, "method": method, "args": args },
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
        });
        trace!("⚙️ RPC call {service}.{method}");
        let response =
            self.client.post(url).json(&body).send().await.map_err(|e| OdooRpcError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(OdooRpcError::Transport(format!("HTTP {} from Odoo", response.status())));
        }
        let envelope = response.json::<Value>().await.map_err(|e| OdooRpcError::JsonError(e.to_string()))?;
        if let Some(error) = envelope.get("error") {
            let code = error["code"].as_i64().unwrap_or(0);
            let name = error["data"]["name"].as_str().unwrap_or("");
            let message = error["data"]["message"]
                .as_str()
                .or_else(|| error["message"].as_str())
                .unwrap_or("Unknown RPC fault");
            return Err(OdooRpcError::Fault { code, message: format!("{name} {message}").trim().to_string() });
        }
        Ok(envelope.get("result").cloned().unwrap_or(Value::Null))
    }

    /// Returns the cached session uid, authenticating first if none is held. The lock
    /// is held across the login call so concurrent callers share one authentication.
    async fn uid(&self) -> Result<i64, OdooRpcError> {
        let mut session = self.session.lock().await;
        if let Some(uid) = *session {
            return Ok(uid);
        }
        let args = json!([self.config.db, self.config.username, self.config.password.reveal(), {}]);
        let result = self.call_service("common", "authenticate", args).await?;
        let uid = result
            .as_i64()
            .ok_or_else(|| OdooRpcError::Auth(format!("Login rejected for user {}", self.config.username)))?;
        info!("⚙️ Authenticated against Odoo db '{}' as uid {uid}", self.config.db);
        *session = Some(uid);
        Ok(uid)
    }

    async fn invalidate_session(&self) {
        let mut session = self.session.lock().await;
        *session = None;
    }

    async fn execute_with_uid(
        &self,
        uid: i64,
        model: &str,
        method: &str,
        args: &Value,
        kwargs: &Value,
    ) -> Result<Value, OdooRpcError> {
        let call_args = json!([
            self.config.db,
            uid,
            self.config.password.reveal(),
            model,
            method,
            args,
            kwargs,
        ]);
        self.call_service("object", "execute_kw", call_args).await
    }

    /// Reports the server version. Unauthenticated; useful as a connection test.
    pub async fn version(&self) -> Result<Value, OdooRpcError> {
        self.call_service("common", "version", json!([])).await
    }
}

impl OdooRpc for OdooApi {
    async fn execute(&self, model: &str, method: &str, args: Value, kwargs: Value) -> Result<Value, OdooRpcError> {
        let uid = self.uid().await?;
        match self.execute_with_uid(uid, model, method, &args, &kwargs).await {
            Err(e) if e.is_auth_failure() => {
                warn!("⚙️ Session rejected on {model}.{method}. Re-authenticating and retrying once. {e}");
                self.invalidate_session().await;
                let uid = self.uid().await?;
                self.execute_with_uid(uid, model, method, &args, &kwargs).await
            },
            other => other,
        }
    }
}
