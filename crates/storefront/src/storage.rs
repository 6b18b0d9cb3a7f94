//! Injectable client-state persistence.
//!
//! The cart and the auth session cache both persist small string snapshots
//! under well-known keys. [`StateStorage`] abstracts over where those
//! snapshots live so the stores can be unit-tested against an in-memory map
//! and run in production against the visitor's session.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use tower_sessions::Session;

/// Storage keys for persisted client state.
pub mod keys {
    /// Serialized cart line list.
    pub const CART: &str = "agah_cart";

    /// Opaque auth token from the backend.
    pub const AUTH_TOKEN: &str = "auth_token";

    /// Cached user record (JSON).
    pub const AUTH_USER: &str = "auth_user";

    /// Path to return to after a forced login.
    pub const REDIRECT_AFTER_LOGIN: &str = "redirect_after_login";

    /// Opaque identifier scoping the visitor's toast queue.
    pub const VISITOR_ID: &str = "agah_visitor";
}

/// Key-value persistence for client state snapshots.
///
/// Implementations are best-effort: a failed write is logged and dropped
/// rather than propagated, matching the worst case of losing one snapshot.
pub trait StateStorage {
    /// Load the value stored under `key`, if any.
    fn load(&self, key: &str) -> impl Future<Output = Option<String>> + Send;

    /// Store `value` under `key`, replacing any previous value.
    fn save(&self, key: &str, value: String) -> impl Future<Output = ()> + Send;

    /// Delete the value stored under `key`.
    fn remove(&self, key: &str) -> impl Future<Output = ()> + Send;
}

/// In-memory storage for tests and tools.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    /// Create an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a key currently holds a value.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values
            .lock()
            .map(|map| map.contains_key(key))
            .unwrap_or(false)
    }
}

impl StateStorage for MemoryStorage {
    async fn load(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    async fn save(&self, key: &str, value: String) {
        if let Ok(mut map) = self.values.lock() {
            map.insert(key.to_owned(), value);
        }
    }

    async fn remove(&self, key: &str) {
        if let Ok(mut map) = self.values.lock() {
            map.remove(key);
        }
    }
}

/// Session-backed storage for the web layer.
///
/// Wraps a `tower_sessions::Session`; each visitor gets an isolated set of
/// keys, which is the server-side analogue of per-browser local storage.
#[derive(Debug, Clone)]
pub struct SessionStorage {
    session: Session,
}

impl SessionStorage {
    /// Wrap a request session.
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

impl StateStorage for SessionStorage {
    async fn load(&self, key: &str) -> Option<String> {
        match self.session.get::<String>(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to read session state");
                None
            }
        }
    }

    async fn save(&self, key: &str, value: String) {
        if let Err(e) = self.session.insert(key, value).await {
            tracing::warn!(key, error = %e, "failed to write session state");
        }
    }

    async fn remove(&self, key: &str) {
        if let Err(e) = self.session.remove::<String>(key).await {
            tracing::warn!(key, error = %e, "failed to clear session state");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.load("k").await, None);

        storage.save("k", "v".to_owned()).await;
        assert_eq!(storage.load("k").await, Some("v".to_owned()));
        assert!(storage.contains("k"));

        storage.remove("k").await;
        assert_eq!(storage.load("k").await, None);
        assert!(!storage.contains("k"));
    }

    #[tokio::test]
    async fn test_memory_storage_overwrites() {
        let storage = MemoryStorage::new();
        storage.save("k", "first".to_owned()).await;
        storage.save("k", "second".to_owned()).await;
        assert_eq!(storage.load("k").await, Some("second".to_owned()));
    }
}
