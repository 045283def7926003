// Step 1: VIN entry, lookup, and the restart action every later step links to.

use anyhow::Context;
use askama::Template;
use axum::{
    extract::{Form, State},
    response::{Html, IntoResponse, Redirect, Response},
};

use crate::{
    error::{AppResult, ValidationError},
    models::VinForm,
    session_cookie::WizardSession,
    vin::{is_valid_vin, normalize_vin_input, VIN_LENGTH},
    wizard::WizardStep,
    AppState,
};

use super::render;

#[derive(Template, Default)]
#[template(path = "vin_entry.html")]
struct VinEntryTemplate {
    step: u8,
    vin: String,
    vin_length: usize,
    vin_error: Option<String>,
    page_error: Option<String>,
}

impl VinEntryTemplate {
    fn new(vin: String) -> Self {
        Self { step: WizardStep::VinEntry.number(), vin, vin_length: VIN_LENGTH, ..Default::default() }
    }
}

// GET / - always renders, whatever the session holds
pub async fn vin_entry_page(session: WizardSession) -> AppResult<Html<String>> {
    tracing::debug!("[HANDLER] / - Session state {:?}", session.state());
    render(&VinEntryTemplate::new(String::new()))
}

// POST /vin-lookup
pub async fn handle_vin_lookup(
    State(app_state): State<AppState>,
    mut session: WizardSession,
    Form(form): Form<VinForm>,
) -> AppResult<Response> {
    let vin = normalize_vin_input(&form.vin);

    // Invalid VINs never reach the backend
    if !is_valid_vin(&vin) {
        tracing::info!("[HANDLER] /vin-lookup - Rejected malformed VIN input: {:?}", vin);
        let template = VinEntryTemplate {
            vin_error: Some(ValidationError::invalid_vin().message),
            ..VinEntryTemplate::new(vin)
        };
        return Ok(render(&template)?.into_response());
    }

    // A new lookup starts from an empty session
    session.clear();
    tracing::info!("[HANDLER] /vin-lookup - Looking up VIN {}", vin);

    match app_state.valuation.lookup_vin(&vin).await {
        Ok(identity) => {
            session
                .set_identity(identity)
                .context("Failed to persist vehicle data in session")?;
            let next = Redirect::to(WizardStep::VehicleConfirmation.route());
            Ok((session, next).into_response())
        }
        Err(e) => {
            let template = VinEntryTemplate {
                page_error: Some(e.message().to_string()),
                ..VinEntryTemplate::new(vin)
            };
            Ok((session, render(&template)?).into_response())
        }
    }
}

// POST /restart - "Back to VIN Entry", "Try a different VIN", "Generate New Prediction"
pub async fn handle_restart(mut session: WizardSession) -> impl IntoResponse {
    tracing::info!("[HANDLER] /restart - Clearing vehicle data from session");
    session.clear();
    (session, Redirect::to(WizardStep::VinEntry.route()))
}
