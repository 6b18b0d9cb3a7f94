//! Fabrication service catalog route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use rust_decimal::Decimal;
use tracing::instrument;

use agah_core::ServiceId;

use crate::backend::{BackendError, Service};
use crate::error::AppError;
use crate::filters;
use crate::state::AppState;

/// Service display data for templates.
#[derive(Clone)]
pub struct ServiceView {
    pub id: i32,
    pub service_type: String,
    pub name: String,
    pub description: String,
    pub short_description: String,
    pub base_price: Option<String>,
    pub is_featured: bool,
    pub image: Option<String>,
}

/// Format a decimal amount as a price string.
pub fn format_price(amount: &Decimal) -> String {
    format!("${:.2}", amount.round_dp(2))
}

impl From<&Service> for ServiceView {
    fn from(service: &Service) -> Self {
        Self {
            id: service.id.as_i32(),
            service_type: service.service_type.clone(),
            name: service.name.clone(),
            description: service.description.clone(),
            short_description: service.short_description.clone(),
            base_price: service.base_price.as_ref().map(format_price),
            is_featured: service.is_featured,
            image: service.image.clone(),
        }
    }
}

/// Service listing template.
#[derive(Template, WebTemplate)]
#[template(path = "services/index.html")]
pub struct ServicesIndexTemplate {
    pub services: Vec<ServiceView>,
}

/// Service detail template.
#[derive(Template, WebTemplate)]
#[template(path = "services/show.html")]
pub struct ServiceShowTemplate {
    pub service: ServiceView,
}

/// Display the service listing. Inactive services are filtered out.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let services = state.backend().services().await?;

    Ok(ServicesIndexTemplate {
        services: services
            .iter()
            .filter(|s| s.active)
            .map(ServiceView::from)
            .collect(),
    })
}

/// Display one service with its order form.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let service = state
        .backend()
        .service(ServiceId::new(id))
        .await
        .map_err(|e| match e {
            BackendError::NotFound => AppError::NotFound(format!("service {id}")),
            other => AppError::Backend(other),
        })?;

    Ok(ServiceShowTemplate {
        service: ServiceView::from(&service),
    })
}
