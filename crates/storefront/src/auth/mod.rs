//! Auth session cache and change notifications.
//!
//! Authentication lives on the backend; this module caches the issued token
//! and user per visitor and exposes the cache as an observable store.
//! Independently mounted pieces of the UI (the navbar fragment, the route
//! guard) subscribe to [`AuthEvents`] instead of polling.
//!
//! State machine: Anonymous -> login/register success -> Authenticated ->
//! logout or backend 401 -> Anonymous. There is no refresh or silent
//! renewal; an expired token is discovered on the next authenticated call.

mod events;
mod store;

pub use events::{AuthChange, AuthEvents, AuthSignal, AuthWatcher};
pub use store::AuthStore;

use thiserror::Error;

use crate::backend::{BackendError, User};

/// A cached session: both halves must be present to count as signed in.
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// Opaque credential issued by the backend. Never logged.
    pub token: String,
    pub user: User,
}

/// Errors from auth operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No cached session for an operation that needs one.
    #[error("not signed in")]
    NotAuthenticated,

    /// The backend rejected the cached token; the session has been cleared.
    #[error("session expired")]
    SessionExpired,

    /// The backend call itself failed.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl AuthError {
    /// Text suitable for an error toast.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotAuthenticated => "Please sign in to continue.".to_owned(),
            Self::SessionExpired => {
                "Your session has expired. Please sign in again.".to_owned()
            }
            Self::Backend(e) => e.user_message(),
        }
    }
}
