//! Contact page and form route handlers.
//!
//! Validation runs before any network call; field errors are re-rendered
//! inline and only a clean form reaches the backend.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::{CompanyInfo, ContactRequest};
use crate::error::AppError;
use crate::filters;
use crate::state::AppState;

/// Contact form data.
#[derive(Debug, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
}

/// Contact info shown beside the form.
#[derive(Clone)]
pub struct ContactInfoView {
    pub email: String,
    pub phone: String,
    pub address: String,
    pub response_time_hours: Option<u32>,
}

impl From<&CompanyInfo> for ContactInfoView {
    fn from(info: &CompanyInfo) -> Self {
        Self {
            email: info.contact_email.clone(),
            phone: info.phone.clone(),
            address: info.address.clone(),
            response_time_hours: info.response_time_hours,
        }
    }
}

/// Contact page template.
#[derive(Template, WebTemplate)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub info: Option<ContactInfoView>,
    /// `(field, message)` pairs from validation.
    pub field_errors: Vec<(&'static str, String)>,
    pub submitted: bool,
}

/// Display the contact page.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> impl IntoResponse {
    let info = match state.backend().company().await {
        Ok(info) => Some(ContactInfoView::from(&info)),
        Err(e) => {
            tracing::warn!("Failed to fetch company info for contact page: {e}");
            None
        }
    };

    ContactTemplate {
        info,
        field_errors: Vec::new(),
        submitted: false,
    }
}

/// Handle contact form submission.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ContactForm>,
) -> Result<Response, AppError> {
    let request = ContactRequest {
        name: form.name.trim().to_owned(),
        email: form.email.trim().to_lowercase(),
        phone: form.phone.as_deref().map(str::trim).map(ToOwned::to_owned),
        subject: form.subject.trim().to_owned(),
        message: form.message.trim().to_owned(),
    };

    // Inline validation; invalid forms never reach the backend.
    if let Err(field_errors) = request.validate() {
        let info = state
            .backend()
            .company()
            .await
            .ok()
            .map(|info| ContactInfoView::from(&info));
        return Ok(ContactTemplate {
            info,
            field_errors,
            submitted: false,
        }
        .into_response());
    }

    state.backend().contact(&request).await?;
    state
        .visitor_toasts(&session)
        .await
        .success("Message sent. We'll get back to you soon.");

    let info = state
        .backend()
        .company()
        .await
        .ok()
        .map(|info| ContactInfoView::from(&info));
    Ok(ContactTemplate {
        info,
        field_errors: Vec::new(),
        submitted: true,
    }
    .into_response())
}
