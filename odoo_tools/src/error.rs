use thiserror::Error;

#[derive(Debug, Error)]
pub enum OdooRpcError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Invalid RPC response: {0}")]
    Transport(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("RPC fault {code}: {message}")]
    Fault { code: i64, message: String },
}

impl OdooRpcError {
    /// True when the error indicates a rejected or expired session, i.e. the call may
    /// succeed after re-authenticating.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            OdooRpcError::Auth(_) => true,
            OdooRpcError::Fault { message, .. } => {
                message.contains("AccessDenied") || message.contains("SessionExpired") || message.contains("Session expired")
            },
            _ => false,
        }
    }
}
