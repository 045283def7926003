// Route definitions for the wizard pages

use askama::Template;
use axum::{
    response::Html,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{error::AppResult, wizard::WizardStep, AppState};

mod results;
mod vehicle;
mod vin_entry;

#[cfg(test)]
mod tests;

// One route per wizard step, plus the form posts that move between them.
pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route(WizardStep::VinEntry.route(), get(vin_entry::vin_entry_page))
        .route("/vin-lookup", post(vin_entry::handle_vin_lookup))
        .route("/restart", post(vin_entry::handle_restart))
        .route(WizardStep::VehicleConfirmation.route(), get(vehicle::vehicle_details_page))
        .route(
            WizardStep::Questionnaire.route(),
            get(vehicle::questionnaire_page).post(vehicle::handle_questionnaire),
        )
        .route(WizardStep::Results.route(), get(results::results_page))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

// Renders an askama template, turning a render failure into a 500
pub(crate) fn render<T: Template>(template: &T) -> AppResult<Html<String>> {
    match template.render() {
        Ok(html) => Ok(Html(html)),
        Err(e) => {
            tracing::error!("Failed to render template: {}", e);
            Err(e.into())
        }
    }
}
