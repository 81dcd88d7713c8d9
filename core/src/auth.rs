//! Read-only access to the bearer token.
//!
//! The client never reads or writes token storage itself; it asks a
//! [`TokenProvider`] right before each authenticated dispatch. Providers can
//! be a fixed value, a synchronous closure, or anything async.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::storage::TokenStore;

#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// The current token, or `None` when no one is logged in.
    async fn token(&self) -> Option<String>;

    /// The server answered 401 to a request that carried `token`.
    fn rejected(&self, _token: &str) {}
}

/// A token fixed at construction.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: &str) -> Self {
        Self(token.to_string())
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticToken(<redacted>)")
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// A token resolved synchronously by a closure on every call.
pub struct FnToken<F>(F);

impl<F> FnToken<F>
where
    F: Fn() -> Option<String> + Send + Sync,
{
    pub fn new(resolve: F) -> Self {
        Self(resolve)
    }
}

#[async_trait]
impl<F> TokenProvider for FnToken<F>
where
    F: Fn() -> Option<String> + Send + Sync,
{
    async fn token(&self) -> Option<String> {
        (self.0)()
    }
}

/// Reads whatever the session last persisted.
pub struct StoredToken {
    store: Arc<dyn TokenStore>,
}

impl StoredToken {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl TokenProvider for StoredToken {
    async fn token(&self) -> Option<String> {
        match self.store.get() {
            Ok(token) => token,
            Err(error) => {
                tracing::warn!(
                    %error,
                    "failed to read stored token; sending request without it"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryTokenStore;

    #[tokio::test]
    async fn static_token_always_yields_value() {
        assert_eq!(StaticToken::new("abc").token().await.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn fn_token_is_resolved_per_call() {
        let provider = FnToken::new(|| Some("from-closure".to_string()));
        assert_eq!(provider.token().await.as_deref(), Some("from-closure"));
    }

    #[tokio::test]
    async fn stored_token_follows_store() {
        let store = Arc::new(MemoryTokenStore::new());
        let provider = StoredToken::new(store.clone());
        assert_eq!(provider.token().await, None);
        store.set("persisted").unwrap();
        assert_eq!(provider.token().await.as_deref(), Some("persisted"));
        store.clear().unwrap();
        assert_eq!(provider.token().await, None);
    }

    #[test]
    fn static_token_debug_hides_value() {
        assert_eq!(format!("{:?}", StaticToken::new("secret")), "StaticToken(<redacted>)");
    }
}
