use thiserror::Error;

#[derive(Debug, Error)]
pub enum MeliApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Authorization failed: {0}")]
    Auth(String),
    #[error("No access token is held. Complete the authorization-code flow first.")]
    MissingAccessToken,
    #[error("No refresh token is held. Complete the authorization-code flow first.")]
    NoRefreshToken,
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
}

impl MeliApiError {
    /// Permanent errors will never succeed on redelivery, so callers may stop retrying
    /// (and release any processing locks) immediately.
    pub fn is_permanent(&self) -> bool {
        matches!(self, MeliApiError::QueryError { status: 404 | 403 | 410, .. })
    }

    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, MeliApiError::QueryError { status: 401, .. })
    }
}
