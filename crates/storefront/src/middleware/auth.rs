//! Authentication middleware and extractors.
//!
//! Provides extractors that gate route handlers on the cached auth session.
//! The session itself is created and destroyed by [`crate::auth::AuthStore`];
//! these extractors only read it.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::auth::AuthSession;
use crate::backend::User;
use crate::storage::keys;

/// Extractor that requires a signed-in user.
///
/// If the visitor has no complete auth session, the attempted path is
/// recorded under `redirect_after_login` and the request is redirected to
/// the login page. API paths get a bare 401 instead.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(session): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", session.user.display_name())
/// }
/// ```
pub struct RequireAuth(pub AuthSession);

/// Error returned when authentication is required but the visitor is not
/// signed in.
pub enum AuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// Unauthorized response (for API requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

/// Read the cached session from the visitor's session store. Both halves
/// must be present and the user must parse; anything else is signed out.
async fn load_session(session: &Session) -> Option<AuthSession> {
    let token: String = session.get(keys::AUTH_TOKEN).await.ok().flatten()?;
    let raw_user: String = session.get(keys::AUTH_USER).await.ok().flatten()?;
    let user: User = serde_json::from_str(&raw_user).ok()?;
    Some(AuthSession { token, user })
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?;

        if let Some(auth) = load_session(session).await {
            return Ok(Self(auth));
        }

        let is_api = parts.uri.path().starts_with("/api/");
        if is_api {
            return Err(AuthRejection::Unauthorized);
        }

        // Remember where the visitor was headed so login can return there.
        let attempted = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path().to_owned(), ToString::to_string);
        if let Err(e) = session.insert(keys::REDIRECT_AFTER_LOGIN, attempted).await {
            tracing::warn!(error = %e, "failed to record login redirect");
        }

        Err(AuthRejection::RedirectToLogin)
    }
}

/// Extractor that optionally gets the current session.
///
/// Unlike `RequireAuth`, this never rejects; the navbar region uses it to
/// render either account links or a login prompt.
pub struct OptionalAuth(pub Option<AuthSession>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth = match parts.extensions.get::<Session>() {
            Some(session) => load_session(session).await,
            None => None,
        };

        Ok(Self(auth))
    }
}

/// Pop the recorded post-login destination, defaulting to the account page.
pub async fn take_login_redirect(session: &Session) -> String {
    match session.remove::<String>(keys::REDIRECT_AFTER_LOGIN).await {
        Ok(Some(path)) if path.starts_with('/') && !path.starts_with("//") => path,
        Ok(_) => "/auth/profile".to_owned(),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read login redirect");
            "/auth/profile".to_owned()
        }
    }
}
