// Wizard steps and the navigation guard every step evaluates before rendering.

use crate::models::VehicleIdentity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    VinEntry,
    VehicleConfirmation,
    Questionnaire,
    Results,
}

impl WizardStep {
    #[cfg(test)]
    pub const ALL: [WizardStep; 4] = [
        WizardStep::VinEntry,
        WizardStep::VehicleConfirmation,
        WizardStep::Questionnaire,
        WizardStep::Results,
    ];

    // Route pattern as mounted on the router
    pub fn route(self) -> &'static str {
        match self {
            WizardStep::VinEntry => "/",
            WizardStep::VehicleConfirmation => "/vehicle-details",
            WizardStep::Questionnaire => "/vehicle-questionnaire",
            WizardStep::Results => "/results/:id",
        }
    }

    // 1-based position shown in the progress indicator
    pub fn number(self) -> u8 {
        match self {
            WizardStep::VinEntry => 1,
            WizardStep::VehicleConfirmation => 2,
            WizardStep::Questionnaire => 3,
            WizardStep::Results => 4,
        }
    }
}

pub fn results_path(prediction_id: &str) -> String {
    format!("/results/{}", urlencoding::encode(prediction_id))
}

/// True when `step` may render with the given session identity.
///
/// VIN entry always renders; every later step interpolates identity fields
/// into its view and needs a non-empty identity.
pub fn can_render(step: WizardStep, identity: Option<&VehicleIdentity>) -> bool {
    step == WizardStep::VinEntry || identity.is_some()
}
