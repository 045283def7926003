// Data structures for the wizard: vehicle identity, questionnaire answers,
// and the payload/result shapes exchanged with the prediction backend.

use serde::{Deserialize, Deserializer, Serialize};

// Vehicle identity returned by the VIN lookup. This is also the shape persisted
// in the session entry, so keys stay snake_case in both places.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct VehicleIdentity {
    pub vin: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub make_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trim: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transmission: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wheel_system_display: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horsepower: Option<f64>,
}

// Lookup data as the backend sends it: everything optional, the VIN is the one
// the user submitted.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct VehicleLookupData {
    pub year: Option<i32>,
    pub make_name: Option<String>,
    pub model_name: Option<String>,
    pub trim: Option<String>,
    pub body_type: Option<String>,
    pub engine_type: Option<String>,
    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
    pub wheel_system_display: Option<String>,
    pub horsepower: Option<f64>,
}

impl VehicleLookupData {
    pub fn into_identity(self, vin: String) -> VehicleIdentity {
        VehicleIdentity {
            vin,
            year: self.year,
            make_name: self.make_name,
            model_name: self.model_name,
            trim: self.trim,
            body_type: self.body_type,
            engine_type: self.engine_type,
            fuel_type: self.fuel_type,
            transmission: self.transmission,
            wheel_system_display: self.wheel_system_display,
            horsepower: self.horsepower,
        }
    }
}

// Form posted from the VIN entry page
#[derive(Debug, Deserialize)]
pub struct VinForm {
    #[serde(default)]
    pub vin: String,
}

// Loan sub-record; only present when the user said they have a loan.
// Values are kept as typed text until normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoanDetails {
    pub loan_balance: String,
    pub monthly_payment: String,
    pub interest_rate: String,
    pub remaining_months: String,
}

// Questionnaire answers: transient form state, never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionnaireAnswers {
    pub mileage: String, // Raw text, reduced to digits when the payload is built
    pub zip_or_city: String,
    pub exterior_color: String,
    pub interior_color: String,
    pub first_owner: bool,
    pub frame_damage: bool,
    pub has_accidents: bool,
    pub salvage_title: bool,
    pub theft_title: bool,
    pub loan: Option<LoanDetails>,
}

impl QuestionnaireAnswers {
    pub fn has_loan(&self) -> bool {
        self.loan.is_some()
    }
}

// Questionnaire form as posted by the browser. Field names must match the
// 'name' attributes in questionnaire.html; yes/no selects become booleans.
#[derive(Debug, Deserialize, Default)]
pub struct QuestionnaireForm {
    #[serde(default)]
    pub mileage: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub exterior_color: String,
    #[serde(default)]
    pub interior_color: String,
    #[serde(default, deserialize_with = "yes_no")]
    pub first_owner: bool,
    #[serde(default, deserialize_with = "yes_no")]
    pub frame_damage: bool,
    #[serde(default, deserialize_with = "yes_no")]
    pub has_accidents: bool,
    #[serde(default, deserialize_with = "yes_no")]
    pub salvage_title: bool,
    #[serde(default, deserialize_with = "yes_no")]
    pub theft_title: bool,
    #[serde(default, deserialize_with = "yes_no")]
    pub has_loan: bool,
    #[serde(default)]
    pub loan_balance: String,
    #[serde(default)]
    pub monthly_payment: String,
    #[serde(default)]
    pub interest_rate: String,
    #[serde(default)]
    pub remaining_months: String,
}

impl From<QuestionnaireForm> for QuestionnaireAnswers {
    fn from(form: QuestionnaireForm) -> Self {
        let loan = form.has_loan.then(|| LoanDetails {
            loan_balance: form.loan_balance,
            monthly_payment: form.monthly_payment,
            interest_rate: form.interest_rate,
            remaining_months: form.remaining_months,
        });
        QuestionnaireAnswers {
            mileage: form.mileage,
            zip_or_city: form.zip,
            exterior_color: form.exterior_color,
            interior_color: form.interior_color,
            first_owner: form.first_owner,
            frame_damage: form.frame_damage,
            has_accidents: form.has_accidents,
            salvage_title: form.salvage_title,
            theft_title: form.theft_title,
            loan,
        }
    }
}

// Only an explicit "yes" is true; anything else (including a missing field) is false.
fn yes_no<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(value.trim().eq_ignore_ascii_case("yes"))
}

// Legacy encoding the model was trained with
pub fn flag(value: bool) -> &'static str {
    if value { "TRUE" } else { "FALSE" }
}

// Normalized payload for POST /api/predict. Field order is fixed, so two equal
// payloads serialize to identical bytes.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PredictionRequest {
    pub vin: String,

    // Vehicle data from the VIN lookup
    pub year: Option<i32>,
    pub make_name: Option<String>,
    pub model_name: Option<String>,
    pub trim_name: Option<String>,
    pub body_type: Option<String>,
    pub engine_type: Option<String>,
    pub fuel_type: Option<String>,
    pub horsepower: Option<f64>,
    pub transmission: Option<String>,
    pub wheel_system_display: Option<String>,

    // Required by the model but not collectible from the user
    pub torque: Option<f64>,
    pub city_fuel_economy: Option<f64>,
    pub highway_fuel_economy: Option<f64>,
    pub combine_fuel_economy: Option<f64>,

    // Questionnaire inputs
    pub mileage: u64,
    pub dealer_zip: String,
    pub exterior_color: String,
    pub interior_color: String,
    pub exterior_color_base: String,
    pub interior_color_base: String,
    pub owner_count: u8,
    pub frame_damaged: String,
    pub has_accidents: String,
    pub salvage: String,
    pub theft_title: String,
    pub is_new: String,
    pub has_loan: String,
    pub loan_balance: Option<f64>,
    pub monthly_payment: Option<f64>,
    pub interest_rate: Option<f64>,
    pub remaining_months: Option<u32>,

    #[serde(rename = "daysonmarket")]
    pub days_on_market: u32,
}

// --- Backend response envelopes ---

#[derive(Debug, Serialize, Deserialize)]
pub struct VinLookupRequest {
    pub vin: String,
}

#[derive(Debug, Deserialize)]
pub struct VinLookupResponse {
    #[serde(default)]
    pub success: bool,
    pub data: Option<VehicleLookupData>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PredictResponse {
    pub prediction_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ResultsResponse {
    pub data: Option<PredictionRecord>,
}

// Body the backend sends alongside non-2xx statuses
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: Option<String>,
}

// --- Prediction results ---

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FutureValue {
    #[serde(default)]
    pub year: u32,
    pub value: f64,
    pub projected_mileage: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PredictionResult {
    pub current_value: f64,
    pub future_values: Vec<FutureValue>,
    #[serde(default)]
    pub annual_mileage: f64,
}

// Echo of the vehicle fields the backend stored with the prediction
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct SubmittedVehicle {
    pub year: Option<i32>,
    pub make_name: Option<String>,
    pub model_name: Option<String>,
    pub trim_name: Option<String>,
    pub body_type: Option<String>,
    pub engine_type: Option<String>,
    pub fuel_type: Option<String>,
    pub horsepower: Option<f64>,
    pub transmission: Option<String>,
    pub wheel_system_display: Option<String>,
}

// Echo of the user inputs the backend stored with the prediction
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct SubmittedInputs {
    pub mileage: Option<u64>,
    pub dealer_zip: Option<String>,
    pub exterior_color: Option<String>,
    pub interior_color: Option<String>,
    pub owner_count: Option<u8>,
    pub frame_damaged: Option<String>,
    pub has_accidents: Option<String>,
    pub salvage: Option<String>,
    pub theft_title: Option<String>,
    pub is_new: Option<String>,
}

// One stored prediction as returned by GET /api/results/{id}
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PredictionRecord {
    pub id: String,
    pub vin: Option<String>,
    #[serde(default)]
    pub vehicle_data: SubmittedVehicle,
    #[serde(default)]
    pub user_inputs: SubmittedInputs,
    pub prediction_results: PredictionResult,
}
