//! Authentication route handlers.
//!
//! Handles login, registration, password reset, and profile management by
//! delegating to the backend through [`AuthStore`]. The store caches the
//! issued token and user in the visitor's session and notifies subscribers
//! on every transition.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::auth::{AuthError, AuthStore};
use crate::backend::{ChangePasswordRequest, ProfileUpdate, RegisterRequest, ResetPasswordRequest, User};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth, take_login_redirect};
use crate::state::AppState;
use crate::storage::SessionStorage;

/// Build the visitor's auth store from the request session.
fn auth_store(state: &AppState, session: Session) -> AuthStore<SessionStorage> {
    AuthStore::new(
        SessionStorage::new(session),
        state.backend().clone(),
        state.auth_events().clone(),
    )
}

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Forgot password form data.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    pub email: String,
}

/// Reset password form data.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordForm {
    pub token: String,
    pub password: String,
    pub password_confirm: String,
}

/// Profile edit form data.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Change password form data.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub new_password_confirm: String,
}

/// Query parameters for error/success display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Query parameters for the reset-password page.
#[derive(Debug, Deserialize)]
pub struct ResetQuery {
    pub token: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub error: Option<String>,
}

/// Forgot password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/forgot_password.html")]
pub struct ForgotPasswordTemplate {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Reset password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/reset_password.html")]
pub struct ResetPasswordTemplate {
    pub error: Option<String>,
    pub token: String,
}

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/profile.html")]
pub struct ProfileTemplate {
    pub user: ProfileView,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// User display data for the profile page.
#[derive(Clone)]
pub struct ProfileView {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub display_name: String,
}

impl From<&User> for ProfileView {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone: user.phone.clone().unwrap_or_default(),
            display_name: user.display_name(),
        }
    }
}

/// Navbar account fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/nav_account.html")]
pub struct NavAccountTemplate {
    pub user: Option<NavUserView>,
}

/// Signed-in user display data for the navbar.
#[derive(Clone)]
pub struct NavUserView {
    pub display_name: String,
}

// =============================================================================
// Navbar Fragment
// =============================================================================

/// Render the account region of the navbar: a sign-in link for anonymous
/// visitors, the account name and sign-out button otherwise.
pub async fn nav_account(OptionalAuth(auth): OptionalAuth) -> impl IntoResponse {
    NavAccountTemplate {
        user: auth.map(|session| NavUserView {
            display_name: session.user.display_name(),
        }),
    }
}

// =============================================================================
// Login / Logout
// =============================================================================

/// Display the login page.
pub async fn login_page(Query(query): Query<MessageQuery>) -> impl IntoResponse {
    LoginTemplate {
        error: query.error,
        success: query.success,
    }
}

/// Handle login form submission.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let store = auth_store(&state, session.clone());

    match store.login(form.email.trim(), &form.password).await {
        Ok(user) => {
            set_sentry_user(&user.id, Some(&user.email));
            state
                .visitor_toasts(&session)
                .await
                .success(format!("Welcome back, {}!", user.display_name()));
            Redirect::to(&take_login_redirect(&session).await).into_response()
        }
        Err(e) => LoginTemplate {
            error: Some(e.user_message()),
            success: None,
        }
        .into_response(),
    }
}

/// Handle logout. Always clears the local session, even when the backend
/// token invalidation fails.
#[instrument(skip(state, session))]
pub async fn logout(State(state): State<AppState>, session: Session) -> Redirect {
    let store = auth_store(&state, session.clone());
    store.logout().await;
    clear_sentry_user();
    state
        .visitor_toasts(&session)
        .await
        .info("You have been signed out.");
    Redirect::to("/")
}

// =============================================================================
// Registration
// =============================================================================

/// Display the registration page.
pub async fn register_page(Query(query): Query<MessageQuery>) -> impl IntoResponse {
    RegisterTemplate { error: query.error }
}

/// Handle registration form submission. A successful registration logs the
/// account in directly.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Response {
    if form.password != form.password_confirm {
        return RegisterTemplate {
            error: Some("Passwords do not match".to_owned()),
        }
        .into_response();
    }

    let request = RegisterRequest {
        email: form.email.trim().to_lowercase(),
        password: form.password,
        first_name: form.first_name.trim().to_owned(),
        last_name: form.last_name.trim().to_owned(),
        phone: form.phone.filter(|p| !p.trim().is_empty()),
    };

    let store = auth_store(&state, session.clone());
    match store.register(&request).await {
        Ok(user) => {
            set_sentry_user(&user.id, Some(&user.email));
            state
                .visitor_toasts(&session)
                .await
                .success(format!("Welcome, {}!", user.display_name()));
            Redirect::to("/").into_response()
        }
        Err(e) => RegisterTemplate {
            error: Some(e.user_message()),
        }
        .into_response(),
    }
}

// =============================================================================
// Password Reset
// =============================================================================

/// Display the forgot-password page.
pub async fn forgot_password_page() -> impl IntoResponse {
    ForgotPasswordTemplate {
        error: None,
        success: None,
    }
}

/// Handle forgot-password submission. The backend answers success for
/// unknown addresses too, so the response leaks nothing.
#[instrument(skip(state, form), fields(email = %form.email))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Form(form): Form<ForgotPasswordForm>,
) -> impl IntoResponse {
    match state
        .backend()
        .request_password_reset(form.email.trim())
        .await
    {
        Ok(()) => ForgotPasswordTemplate {
            error: None,
            success: Some(
                "If an account exists for that address, a reset link is on its way.".to_owned(),
            ),
        },
        Err(e) => ForgotPasswordTemplate {
            error: Some(e.user_message()),
            success: None,
        },
    }
}

/// Display the reset-password page reached from the emailed link.
pub async fn reset_password_page(Query(query): Query<ResetQuery>) -> Response {
    match query.token {
        Some(token) if !token.is_empty() => ResetPasswordTemplate { error: None, token }.into_response(),
        _ => Redirect::to("/auth/forgot-password").into_response(),
    }
}

/// Handle reset-password submission.
#[instrument(skip(state, form))]
pub async fn reset_password(
    State(state): State<AppState>,
    Form(form): Form<ResetPasswordForm>,
) -> Response {
    if form.password != form.password_confirm {
        return ResetPasswordTemplate {
            error: Some("Passwords do not match".to_owned()),
            token: form.token,
        }
        .into_response();
    }

    let request = ResetPasswordRequest {
        token: form.token.clone(),
        new_password: form.password,
    };

    match state.backend().reset_password(&request).await {
        Ok(()) => {
            Redirect::to("/auth/login?success=Password+updated.+Please+sign+in.").into_response()
        }
        Err(e) => ResetPasswordTemplate {
            error: Some(e.user_message()),
            token: form.token,
        }
        .into_response(),
    }
}

// =============================================================================
// Profile
// =============================================================================

/// Redirect target when the backend rejects the cached token mid-request.
fn session_expired_redirect() -> Response {
    Redirect::to("/auth/login?error=Your+session+has+expired.+Please+sign+in+again.")
        .into_response()
}

/// Display the profile page with a freshly fetched user record.
#[instrument(skip(state, session))]
pub async fn profile(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
) -> Response {
    let store = auth_store(&state, session);
    let backend = state.backend().clone();

    match store
        .authorized(|token| async move { backend.profile(&token).await })
        .await
    {
        Ok(user) => {
            store.update_user(&user).await;
            ProfileTemplate {
                user: ProfileView::from(&user),
                error: None,
                success: None,
            }
            .into_response()
        }
        Err(AuthError::SessionExpired | AuthError::NotAuthenticated) => session_expired_redirect(),
        Err(e) => {
            // Fall back to the cached record rather than blanking the page.
            tracing::warn!("Failed to refresh profile: {e}");
            ProfileTemplate {
                user: ProfileView::from(&auth.user),
                error: Some(e.user_message()),
                success: None,
            }
            .into_response()
        }
    }
}

/// Handle profile edit submission.
#[instrument(skip(state, session, form))]
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    Form(form): Form<ProfileForm>,
) -> Response {
    let update = ProfileUpdate {
        first_name: form.first_name.trim().to_owned(),
        last_name: form.last_name.trim().to_owned(),
        phone: form.phone.filter(|p| !p.trim().is_empty()),
    };

    let store = auth_store(&state, session.clone());
    let backend = state.backend().clone();

    match store
        .authorized(|token| async move { backend.update_profile(&token, &update).await })
        .await
    {
        Ok(user) => {
            store.update_user(&user).await;
            state.visitor_toasts(&session).await.success("Profile updated.");
            ProfileTemplate {
                user: ProfileView::from(&user),
                error: None,
                success: Some("Profile updated.".to_owned()),
            }
            .into_response()
        }
        Err(AuthError::SessionExpired | AuthError::NotAuthenticated) => session_expired_redirect(),
        Err(e) => ProfileTemplate {
            user: ProfileView::from(&auth.user),
            error: Some(e.user_message()),
            success: None,
        }
        .into_response(),
    }
}

/// Handle change-password submission.
#[instrument(skip(state, session, form))]
pub async fn change_password(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(auth): RequireAuth,
    Form(form): Form<ChangePasswordForm>,
) -> Response {
    if form.new_password != form.new_password_confirm {
        return ProfileTemplate {
            user: ProfileView::from(&auth.user),
            error: Some("New passwords do not match".to_owned()),
            success: None,
        }
        .into_response();
    }

    let request = ChangePasswordRequest {
        current_password: form.current_password,
        new_password: form.new_password,
    };

    let store = auth_store(&state, session.clone());
    let backend = state.backend().clone();

    match store
        .authorized(|token| async move { backend.change_password(&token, &request).await })
        .await
    {
        Ok(()) => {
            state.visitor_toasts(&session).await.success("Password changed.");
            ProfileTemplate {
                user: ProfileView::from(&auth.user),
                error: None,
                success: Some("Password changed.".to_owned()),
            }
            .into_response()
        }
        Err(AuthError::SessionExpired | AuthError::NotAuthenticated) => session_expired_redirect(),
        Err(e) => ProfileTemplate {
            user: ProfileView::from(&auth.user),
            error: Some(e.user_message()),
            success: None,
        }
        .into_response(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_nav_account_signed_out_offers_sign_in() {
        let html = NavAccountTemplate { user: None }.render().unwrap();
        assert!(html.contains("/auth/login"));
        assert!(html.contains("Sign in"));
        assert!(!html.contains("Sign out"));
    }

    #[test]
    fn test_nav_account_signed_in_shows_name_and_sign_out() {
        let html = NavAccountTemplate {
            user: Some(NavUserView {
                display_name: "Ana Gomez".to_owned(),
            }),
        }
        .render()
        .unwrap();
        assert!(html.contains("Ana Gomez"));
        assert!(html.contains("/auth/profile"));
        assert!(html.contains("Sign out"));
        assert!(!html.contains("Sign in"));
    }
}
