mod config;
mod error;
mod rpc;

pub use config::OdooConfig;
pub use error::OdooRpcError;
pub use rpc::{OdooApi, OdooRpc};
