// Steps 2 and 3: vehicle confirmation and the questionnaire that produces a
// prediction.

use askama::Template;
use axum::{
    extract::{Form, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Datelike;

use crate::{
    dashboard::title_case,
    error::{AppResult, ValidationError},
    models::{QuestionnaireAnswers, QuestionnaireForm, VehicleIdentity},
    normalizer::normalize,
    session_cookie::WizardSession,
    wizard::{results_path, WizardStep},
    AppState,
};

use super::render;

// Display copy of the session identity, title-cased for the cards
pub(crate) struct VehicleView {
    pub year: String,
    pub make: String,
    pub model: String,
    pub trim: String,
    pub vin: String,
}

impl VehicleView {
    pub fn headline(&self) -> String {
        [self.year.as_str(), self.make.as_str(), self.model.as_str()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl From<&VehicleIdentity> for VehicleView {
    fn from(identity: &VehicleIdentity) -> Self {
        let text = |value: &Option<String>| value.as_deref().map(title_case).unwrap_or_default();
        VehicleView {
            year: identity.year.map(|y| y.to_string()).unwrap_or_default(),
            make: text(&identity.make_name),
            model: text(&identity.model_name),
            trim: text(&identity.trim),
            vin: identity.vin.clone(),
        }
    }
}

#[derive(Template)]
#[template(path = "vehicle_details.html")]
struct VehicleDetailsTemplate {
    step: u8,
    vehicle: VehicleView,
}

// A yes/no selector on the questionnaire
struct YesNoField {
    name: &'static str,
    label: &'static str,
    value: bool,
}

#[derive(Template)]
#[template(path = "questionnaire.html")]
struct QuestionnaireTemplate {
    step: u8,
    vehicle: VehicleView,
    mileage: String,
    zip: String,
    exterior_color: String,
    interior_color: String,
    yes_no_fields: Vec<YesNoField>,
    has_loan: bool,
    loan_balance: String,
    monthly_payment: String,
    interest_rate: String,
    remaining_months: String,
    mileage_error: Option<String>,
    loan_error: Option<String>,
    page_error: Option<String>,
}

impl QuestionnaireTemplate {
    // Re-populates the form from the answers so nothing has to be re-entered
    fn new(identity: &VehicleIdentity, answers: &QuestionnaireAnswers) -> Self {
        let loan = answers.loan.clone().unwrap_or_default();
        QuestionnaireTemplate {
            step: WizardStep::Questionnaire.number(),
            vehicle: VehicleView::from(identity),
            mileage: answers.mileage.clone(),
            zip: answers.zip_or_city.clone(),
            exterior_color: answers.exterior_color.clone(),
            interior_color: answers.interior_color.clone(),
            yes_no_fields: vec![
                YesNoField { name: "first_owner", label: "First Owner?", value: answers.first_owner },
                YesNoField { name: "frame_damage", label: "Frame Damage?", value: answers.frame_damage },
                YesNoField { name: "has_accidents", label: "Previous Accidents?", value: answers.has_accidents },
                YesNoField { name: "salvage_title", label: "Salvage Title?", value: answers.salvage_title },
                YesNoField { name: "theft_title", label: "Theft Title?", value: answers.theft_title },
            ],
            has_loan: answers.has_loan(),
            loan_balance: loan.loan_balance,
            monthly_payment: loan.monthly_payment,
            interest_rate: loan.interest_rate,
            remaining_months: loan.remaining_months,
            mileage_error: None,
            loan_error: None,
            page_error: None,
        }
    }

    fn with_validation_error(mut self, error: ValidationError) -> Self {
        if error.field == "mileage" {
            self.mileage_error = Some(error.message);
        } else {
            self.loan_error = Some(error.message);
        }
        self
    }
}

// GET /vehicle-details
pub async fn vehicle_details_page(session: WizardSession) -> AppResult<Response> {
    let identity = match session.require_identity(WizardStep::VehicleConfirmation) {
        Ok(identity) => identity,
        Err(redirect) => return Ok(redirect.into_response()),
    };
    let template = VehicleDetailsTemplate {
        step: WizardStep::VehicleConfirmation.number(),
        vehicle: VehicleView::from(identity),
    };
    Ok(render(&template)?.into_response())
}

// GET /vehicle-questionnaire
pub async fn questionnaire_page(session: WizardSession) -> AppResult<Response> {
    let identity = match session.require_identity(WizardStep::Questionnaire) {
        Ok(identity) => identity,
        Err(redirect) => return Ok(redirect.into_response()),
    };
    let template = QuestionnaireTemplate::new(identity, &QuestionnaireAnswers::default());
    Ok(render(&template)?.into_response())
}

// POST /vehicle-questionnaire
pub async fn handle_questionnaire(
    State(app_state): State<AppState>,
    session: WizardSession,
    Form(form): Form<QuestionnaireForm>,
) -> AppResult<Response> {
    let identity = match session.require_identity(WizardStep::Questionnaire) {
        Ok(identity) => identity,
        Err(redirect) => return Ok(redirect.into_response()),
    };
    let answers = QuestionnaireAnswers::from(form);

    let current_year = chrono::Local::now().year();
    let request = match normalize(identity, &answers, current_year) {
        Ok(request) => request,
        Err(e) => {
            tracing::info!("[HANDLER] /vehicle-questionnaire - Invalid {}: {}", e.field, e.message);
            let template = QuestionnaireTemplate::new(identity, &answers).with_validation_error(e);
            return Ok(render(&template)?.into_response());
        }
    };

    match app_state.valuation.submit_prediction(&request).await {
        Ok(prediction_id) => Ok(Redirect::to(&results_path(&prediction_id)).into_response()),
        Err(e) => {
            let mut template = QuestionnaireTemplate::new(identity, &answers);
            template.page_error = Some(e.message().to_string());
            Ok(render(&template)?.into_response())
        }
    }
}
