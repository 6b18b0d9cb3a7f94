//! Observable auth session cache.

use tracing::instrument;

use crate::auth::events::{AuthChange, AuthEvents};
use crate::auth::{AuthError, AuthSession};
use crate::backend::{BackendClient, BackendError, RegisterRequest, User};
use crate::storage::{StateStorage, keys};

/// Cached auth state bound to a persistence backend.
///
/// At most one session is cached. Authentication is delegated entirely to
/// the backend; this store only caches the resulting token and user and
/// tells subscribers when that cache changes. A cached user without a token
/// (or vice versa) counts as signed out.
pub struct AuthStore<S> {
    storage: S,
    backend: BackendClient,
    events: AuthEvents,
}

impl<S: StateStorage> AuthStore<S> {
    pub fn new(storage: S, backend: BackendClient, events: AuthEvents) -> Self {
        Self {
            storage,
            backend,
            events,
        }
    }

    /// The cached session, when both halves are present and readable.
    pub async fn session(&self) -> Option<AuthSession> {
        let token = self.storage.load(keys::AUTH_TOKEN).await?;
        let raw_user = self.storage.load(keys::AUTH_USER).await?;
        match serde_json::from_str::<User>(&raw_user) {
            Ok(user) => Some(AuthSession { token, user }),
            Err(e) => {
                tracing::warn!(error = %e, "discarding corrupted cached user");
                None
            }
        }
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session().await.is_some()
    }

    pub async fn current_user(&self) -> Option<User> {
        self.session().await.map(|s| s.user)
    }

    pub async fn token(&self) -> Option<String> {
        self.session().await.map(|s| s.token)
    }

    /// Log in against the backend. On success the session is cached and
    /// subscribers are notified exactly once; on failure nothing is cached
    /// and the backend's error text is surfaced.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let payload = self.backend.login(email, password).await?;
        self.complete_login(payload.token, payload.user.clone())
            .await;
        Ok(payload.user)
    }

    /// Register a new account; the backend logs it in, so this behaves as
    /// login on success.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn register(&self, form: &RegisterRequest) -> Result<User, AuthError> {
        let payload = self.backend.register(form).await?;
        self.complete_login(payload.token, payload.user.clone())
            .await;
        Ok(payload.user)
    }

    /// Cache a session obtained from the backend and notify subscribers.
    pub async fn complete_login(&self, token: String, user: User) {
        self.storage.save(keys::AUTH_TOKEN, token).await;
        self.save_user(&user).await;
        self.events.notify(AuthChange::LoggedIn);
    }

    /// Log out. The backend call is best-effort: the cache is cleared and
    /// subscribers notified even when the token invalidation fails.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        if let Some(token) = self.storage.load(keys::AUTH_TOKEN).await
            && let Err(e) = self.backend.logout(&token).await
        {
            tracing::warn!(error = %e, "backend logout failed, clearing session anyway");
        }

        self.clear().await;
        self.events.notify(AuthChange::LoggedOut);
    }

    /// Refresh the cached user after a profile edit. No notification; the
    /// session identity did not change.
    pub async fn update_user(&self, user: &User) {
        self.save_user(user).await;
    }

    /// Run an authenticated backend call. A 401 clears the cache and
    /// notifies `SessionExpired` without the caller invoking `logout`.
    pub async fn authorized<T, F, Fut>(&self, call: F) -> Result<T, AuthError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<T, BackendError>>,
    {
        let token = self.token().await.ok_or(AuthError::NotAuthenticated)?;

        match call(token).await {
            Ok(value) => Ok(value),
            Err(BackendError::Unauthorized) => {
                self.clear().await;
                self.events.notify(AuthChange::SessionExpired);
                Err(AuthError::SessionExpired)
            }
            Err(e) => Err(AuthError::Backend(e)),
        }
    }

    async fn save_user(&self, user: &User) {
        match serde_json::to_string(user) {
            Ok(raw) => self.storage.save(keys::AUTH_USER, raw).await,
            Err(e) => tracing::error!(error = %e, "failed to serialize cached user"),
        }
    }

    async fn clear(&self) {
        self.storage.remove(keys::AUTH_TOKEN).await;
        self.storage.remove(keys::AUTH_USER).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::BackendConfig;
    use crate::storage::MemoryStorage;

    use agah_core::UserId;

    fn store() -> (AuthStore<MemoryStorage>, AuthEvents) {
        let events = AuthEvents::new();
        let config = BackendConfig {
            api_url: "http://backend.test".parse().unwrap(),
        };
        let store = AuthStore::new(
            MemoryStorage::new(),
            BackendClient::new(&config),
            events.clone(),
        );
        (store, events)
    }

    fn user() -> User {
        serde_json::from_str(
            r#"{"id": 1, "email": "ana@example.com", "first_name": "Ana", "last_name": "Gomez"}"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_login_caches_and_notifies_once() {
        let (store, events) = store();
        let watcher = events.subscribe();
        assert!(!store.is_authenticated().await);

        store.complete_login("tok-123".to_owned(), user()).await;

        assert!(store.is_authenticated().await);
        assert_eq!(store.token().await.as_deref(), Some("tok-123"));
        assert_eq!(store.current_user().await.unwrap().id, UserId::new(1));

        let signal = watcher.latest();
        assert_eq!(signal.seq, 1);
        assert_eq!(signal.last, Some(AuthChange::LoggedIn));
    }

    #[tokio::test]
    async fn test_token_without_user_is_signed_out() {
        let (store, _) = store();
        store
            .storage
            .save(keys::AUTH_TOKEN, "orphan".to_owned())
            .await;

        assert!(!store.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_corrupted_user_is_signed_out() {
        let (store, _) = store();
        store.storage.save(keys::AUTH_TOKEN, "tok".to_owned()).await;
        store
            .storage
            .save(keys::AUTH_USER, "not json".to_owned())
            .await;

        assert!(!store.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_unauthorized_call_forces_logout() {
        let (store, events) = store();
        store.complete_login("stale".to_owned(), user()).await;
        let watcher = events.subscribe();

        let result: Result<(), AuthError> = store
            .authorized(|_token| async { Err(BackendError::Unauthorized) })
            .await;

        assert!(matches!(result, Err(AuthError::SessionExpired)));
        assert!(!store.is_authenticated().await);
        assert_eq!(watcher.latest().last, Some(AuthChange::SessionExpired));
    }

    #[tokio::test]
    async fn test_authorized_passes_token_through() {
        let (store, _) = store();
        store.complete_login("tok-xyz".to_owned(), user()).await;

        let seen = store
            .authorized(|token| async move { Ok::<_, BackendError>(token) })
            .await
            .unwrap();
        assert_eq!(seen, "tok-xyz");
    }

    #[tokio::test]
    async fn test_authorized_without_session_rejects() {
        let (store, _) = store();
        let result: Result<(), AuthError> = store
            .authorized(|_token| async { Ok(()) })
            .await;
        assert!(matches!(result, Err(AuthError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn test_other_backend_errors_keep_session() {
        let (store, events) = store();
        store.complete_login("tok".to_owned(), user()).await;
        let watcher = events.subscribe();
        let seq_before = watcher.latest().seq;

        let result: Result<(), AuthError> = store
            .authorized(|_token| async { Err(BackendError::Rejected("quota".to_owned())) })
            .await;

        assert!(matches!(result, Err(AuthError::Backend(_))));
        assert!(store.is_authenticated().await);
        assert_eq!(watcher.latest().seq, seq_before);
    }

    #[tokio::test]
    async fn test_update_user_refreshes_cache_silently() {
        let (store, events) = store();
        store.complete_login("tok".to_owned(), user()).await;
        let seq_before = events.subscribe().latest().seq;

        let mut updated = user();
        updated.first_name = "Anita".to_owned();
        store.update_user(&updated).await;

        assert_eq!(
            store.current_user().await.unwrap().first_name,
            "Anita"
        );
        assert_eq!(events.subscribe().latest().seq, seq_before);
    }
}
