use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use mog_common::Secret;

/// The result of an OAuth2 token grant.
///
/// Note that refresh tokens are held in memory only. A process restart loses marketplace
/// access until a human completes the authorization-code flow again.
#[derive(Debug, Clone, Default)]
pub struct TokenSet {
    pub access_token: Secret<String>,
    pub refresh_token: Option<Secret<String>>,
    pub user_id: Option<i64>,
    pub expires_at: DateTime<Utc>,
}

impl TokenSet {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Shared, mutable token state for the marketplace client.
///
/// The holder is created by the composition root and injected into [`crate::MeliApi`],
/// so token lifecycle is explicit rather than ambient. Clones share the same state.
#[derive(Clone, Default)]
pub struct TokenHolder {
    inner: Arc<RwLock<Option<TokenSet>>>,
}

impl TokenHolder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, tokens: TokenSet) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(tokens);
    }

    pub fn access_token(&self) -> Option<String> {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        guard.as_ref().map(|t| t.access_token.reveal().clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        guard.as_ref().and_then(|t| t.refresh_token.as_ref()).map(|t| t.reveal().clone())
    }

    pub fn user_id(&self) -> Option<i64> {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        guard.as_ref().and_then(|t| t.user_id)
    }

    pub fn is_authorized(&self) -> bool {
        self.access_token().is_some()
    }

    /// True when a token is held and its grant lifetime has lapsed. An empty holder
    /// is not "expired"; there is nothing to refresh yet.
    pub fn is_expired(&self) -> bool {
        let guard = self.inner.read().unwrap_or_else(|e| e.into_inner());
        guard.as_ref().map(|t| t.is_expired_at(Utc::now())).unwrap_or(false)
    }
}

#[cfg(test)]
mod test {
    use chrono::{Duration, Utc};
    use mog_common::Secret;

    use super::{TokenHolder, TokenSet};

    fn token_set(expires_at: chrono::DateTime<Utc>) -> TokenSet {
        TokenSet {
            access_token: Secret::new("APP_USR-abc".to_string()),
            refresh_token: Some(Secret::new("TG-def".to_string())),
            user_id: Some(123),
            expires_at,
        }
    }

    #[test]
    fn a_lapsed_grant_reads_as_expired() {
        let holder = TokenHolder::new();
        holder.set(token_set(Utc::now() - Duration::seconds(1)));
        assert!(holder.is_expired());
    }

    #[test]
    fn a_live_grant_is_not_expired() {
        let holder = TokenHolder::new();
        holder.set(token_set(Utc::now() + Duration::hours(6)));
        assert!(!holder.is_expired());
    }

    #[test]
    fn an_empty_holder_is_not_expired() {
        let holder = TokenHolder::new();
        assert!(!holder.is_expired());
        assert!(!holder.is_authorized());
    }
}
