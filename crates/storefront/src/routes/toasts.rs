//! Toast notification fragment handlers (HTMX).
//!
//! The toast region polls this fragment; dismiss posts back the toast ID.
//! Both handlers resolve the calling visitor's own queue from the session,
//! so no visitor ever sees another's notifications.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::IntoResponse,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::notify::{Toast, ToastCenter, ToastId};
use crate::state::AppState;

/// Toast display data.
#[derive(Clone)]
pub struct ToastView {
    pub id: ToastId,
    pub message: String,
    pub css_class: String,
    /// Removing toasts render with the exit animation class.
    pub is_removing: bool,
}

impl From<&Toast> for ToastView {
    fn from(toast: &Toast) -> Self {
        Self {
            id: toast.id,
            message: toast.message.clone(),
            css_class: toast.kind.css_class().to_owned(),
            is_removing: toast.is_removing,
        }
    }
}

/// Toast stack fragment template, newest first.
#[derive(Template, WebTemplate)]
#[template(path = "partials/toasts.html")]
pub struct ToastsTemplate {
    pub toasts: Vec<ToastView>,
}

/// Dismiss form data.
#[derive(Debug, Deserialize)]
pub struct DismissForm {
    pub id: ToastId,
}

/// Get the calling visitor's toast stack fragment.
pub async fn fragment(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    render(&state.visitor_toasts(&session).await)
}

/// Dismiss one of the visitor's toasts and return the updated stack.
#[instrument(skip(state, session))]
pub async fn dismiss(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<DismissForm>,
) -> impl IntoResponse {
    let center = state.visitor_toasts(&session).await;
    center.remove(form.id);
    render(&center)
}

fn render(center: &ToastCenter) -> ToastsTemplate {
    let mut toasts: Vec<ToastView> = center.toasts().iter().map(ToastView::from).collect();
    toasts.reverse();
    ToastsTemplate { toasts }
}
