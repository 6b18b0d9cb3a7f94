//! Static-ish content pages backed by the company profile.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::backend::CompanyInfo;
use crate::error::AppError;
use crate::filters;
use crate::state::AppState;

/// About page template.
#[derive(Template, WebTemplate)]
#[template(path = "about.html")]
pub struct AboutTemplate {
    pub company_name: String,
    pub about_us: String,
    pub mission: String,
    pub vision: String,
}

impl From<&CompanyInfo> for AboutTemplate {
    fn from(info: &CompanyInfo) -> Self {
        Self {
            company_name: info.company_name.clone(),
            about_us: info.about_us.clone(),
            mission: info.mission.clone(),
            vision: info.vision.clone(),
        }
    }
}

/// Display the about page.
#[instrument(skip(state))]
pub async fn about(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let info = state.backend().company().await?;
    Ok(AboutTemplate::from(&info))
}
