//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::backend::{CompanyInfo, HomepageStats};
use crate::filters;
use crate::routes::services::ServiceView;
use crate::state::AppState;

/// Company display data for the hero and footer.
#[derive(Clone)]
pub struct CompanyView {
    pub name: String,
    pub tagline: String,
    pub about: String,
    pub contact_email: String,
    pub phone: String,
    pub address: String,
}

impl From<&CompanyInfo> for CompanyView {
    fn from(info: &CompanyInfo) -> Self {
        Self {
            name: info.company_name.clone(),
            tagline: info.tagline.clone(),
            about: info.about_us.clone(),
            contact_email: info.contact_email.clone(),
            phone: info.phone.clone(),
            address: info.address.clone(),
        }
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    /// Featured services for the grid.
    pub featured_services: Vec<ServiceView>,
    /// Company profile for the hero; `None` when the backend is unreachable.
    pub company: Option<CompanyView>,
    /// Headline numbers (completed orders, years in business).
    pub stats: HomepageStats,
}

/// Display the home page.
///
/// A backend failure degrades to an empty hero rather than a 502: the home
/// page must render even when the backend is down.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> impl IntoResponse {
    match state.backend().homepage().await {
        Ok(data) => HomeTemplate {
            featured_services: data.featured_services.iter().map(ServiceView::from).collect(),
            company: Some(CompanyView::from(&data.company_info)),
            stats: data.stats,
        },
        Err(e) => {
            tracing::error!("Failed to fetch homepage data: {e}");
            HomeTemplate {
                featured_services: Vec::new(),
                company: None,
                stats: HomepageStats::default(),
            }
        }
    }
}
