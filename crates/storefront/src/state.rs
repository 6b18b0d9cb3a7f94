//! Application state shared across handlers.

use std::sync::Arc;

use tower_sessions::Session;
use uuid::Uuid;

use crate::auth::AuthEvents;
use crate::backend::BackendClient;
use crate::config::StorefrontConfig;
use crate::notify::{ToastCenter, ToastRegistry};
use crate::storage::{SessionStorage, StateStorage, keys};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the backend client and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    backend: BackendClient,
    toasts: ToastRegistry,
    auth_events: AuthEvents,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let backend = BackendClient::new(&config.backend);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                toasts: ToastRegistry::new(),
                auth_events: AuthEvents::new(),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the backend API client.
    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }

    /// Get a reference to the per-visitor toast registry.
    #[must_use]
    pub fn toasts(&self) -> &ToastRegistry {
        &self.inner.toasts
    }

    /// The calling visitor's own toast queue.
    ///
    /// Keyed by an opaque identifier held in the session, minted on first
    /// use, so one visitor's toasts are never rendered for another.
    pub async fn visitor_toasts(&self, session: &Session) -> ToastCenter {
        let storage = SessionStorage::new(session.clone());
        let visitor: String = match storage.load(keys::VISITOR_ID).await {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4().to_string();
                storage.save(keys::VISITOR_ID, id.clone()).await;
                id
            }
        };
        self.inner.toasts.for_visitor(&visitor)
    }

    /// Get a reference to the auth notification channel.
    #[must_use]
    pub fn auth_events(&self) -> &AuthEvents {
        &self.inner.auth_events
    }
}
