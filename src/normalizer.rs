// Builds the prediction payload from the session identity and the
// questionnaire answers. Pure: the reference year is passed in.

use crate::error::ValidationError;
use crate::models::{flag, LoanDetails, PredictionRequest, QuestionnaireAnswers, VehicleIdentity};

const UNKNOWN: &str = "unknown";
const DEFAULT_ZIP: &str = "00000";
// The model was trained with this field; it has no meaning for a private seller.
const DAYS_ON_MARKET: u32 = 30;

// Reduces free text such as "45,000 mi" to its digits.
pub fn parse_mileage(raw: &str) -> Result<u64, ValidationError> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(ValidationError::invalid_mileage());
    }
    digits.parse::<u64>().map_err(|_| ValidationError::invalid_mileage())
}

// Lower-cased identity string, or None when the lookup did not supply one.
fn identity_text(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
}

fn answer_text(value: &str, fallback: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_lowercase()
    }
}

// Accepts "12,500.50", "$320" or "4.9%"; blank means not provided.
fn parse_amount(raw: &str, field: &'static str, label: &str) -> Result<Option<f64>, ValidationError> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | '%' | ' '))
        .collect();
    if cleaned.is_empty() {
        return Ok(None);
    }
    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(Some(value)),
        _ => Err(ValidationError::new(field, format!("{} must be a non-negative number", label))),
    }
}

fn parse_months(raw: &str) -> Result<Option<u32>, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<u32>()
        .map(Some)
        .map_err(|_| ValidationError::new("remaining_months", "Remaining months must be a whole number"))
}

struct LoanFields {
    loan_balance: Option<f64>,
    monthly_payment: Option<f64>,
    interest_rate: Option<f64>,
    remaining_months: Option<u32>,
}

fn loan_fields(loan: Option<&LoanDetails>) -> Result<LoanFields, ValidationError> {
    let Some(loan) = loan else {
        return Ok(LoanFields {
            loan_balance: None,
            monthly_payment: None,
            interest_rate: None,
            remaining_months: None,
        });
    };
    Ok(LoanFields {
        loan_balance: parse_amount(&loan.loan_balance, "loan_balance", "Loan balance")?,
        monthly_payment: parse_amount(&loan.monthly_payment, "monthly_payment", "Monthly payment")?,
        interest_rate: parse_amount(&loan.interest_rate, "interest_rate", "Interest rate")?,
        remaining_months: parse_months(&loan.remaining_months)?,
    })
}

pub fn normalize(
    identity: &VehicleIdentity,
    answers: &QuestionnaireAnswers,
    current_year: i32,
) -> Result<PredictionRequest, ValidationError> {
    let mileage = parse_mileage(&answers.mileage)?;
    let loan = loan_fields(answers.loan.as_ref())?;

    let exterior_color = answer_text(&answers.exterior_color, UNKNOWN);
    let interior_color = answer_text(&answers.interior_color, UNKNOWN);
    let dealer_zip = match answers.zip_or_city.trim() {
        "" => DEFAULT_ZIP.to_string(),
        zip => zip.to_string(),
    };

    Ok(PredictionRequest {
        vin: identity.vin.clone(),
        year: identity.year,
        make_name: identity_text(identity.make_name.as_ref()),
        model_name: identity_text(identity.model_name.as_ref()),
        trim_name: identity_text(identity.trim.as_ref()),
        body_type: identity_text(identity.body_type.as_ref()),
        engine_type: identity_text(identity.engine_type.as_ref()),
        fuel_type: identity_text(identity.fuel_type.as_ref()),
        horsepower: identity.horsepower,
        transmission: identity_text(identity.transmission.as_ref()),
        wheel_system_display: identity_text(identity.wheel_system_display.as_ref()),

        torque: None,
        city_fuel_economy: None,
        highway_fuel_economy: None,
        combine_fuel_economy: None,

        mileage,
        dealer_zip,
        exterior_color_base: exterior_color.clone(),
        interior_color_base: interior_color.clone(),
        exterior_color,
        interior_color,
        owner_count: if answers.first_owner { 1 } else { 2 },
        frame_damaged: flag(answers.frame_damage).to_string(),
        has_accidents: flag(answers.has_accidents).to_string(),
        salvage: flag(answers.salvage_title).to_string(),
        theft_title: flag(answers.theft_title).to_string(),
        is_new: flag(identity.year == Some(current_year)).to_string(),
        has_loan: flag(answers.has_loan()).to_string(),
        loan_balance: loan.loan_balance,
        monthly_payment: loan.monthly_payment,
        interest_rate: loan.interest_rate,
        remaining_months: loan.remaining_months,

        days_on_market: DAYS_ON_MARKET,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> VehicleIdentity {
        VehicleIdentity {
            vin: "2T1BURHE0JC014025".to_string(),
            year: Some(2018),
            make_name: Some("TOYOTA".to_string()),
            model_name: Some("Corolla".to_string()),
            trim: Some(" LE ".to_string()),
            body_type: Some("sedan".to_string()),
            engine_type: Some("i4".to_string()),
            fuel_type: None,
            transmission: Some("CVT".to_string()),
            wheel_system_display: Some("".to_string()),
            horsepower: Some(132.0),
        }
    }

    fn answers() -> QuestionnaireAnswers {
        QuestionnaireAnswers {
            mileage: "45,000".to_string(),
            zip_or_city: "10001".to_string(),
            exterior_color: " Silver ".to_string(),
            interior_color: "".to_string(),
            first_owner: true,
            has_accidents: true,
            ..Default::default()
        }
    }

    #[test]
    fn mileage_with_separators_becomes_an_integer() {
        let request = normalize(&identity(), &answers(), 2026).unwrap();
        assert_eq!(request.mileage, 45000);
        assert_eq!(parse_mileage("12 500 mi").unwrap(), 12500);
        assert_eq!(parse_mileage("0").unwrap(), 0);
    }

    #[test]
    fn mileage_without_digits_is_rejected() {
        let err = parse_mileage("lots").unwrap_err();
        assert_eq!(err.field, "mileage");
        assert!(parse_mileage("").is_err());

        let mut bad = answers();
        bad.mileage = "n/a".to_string();
        assert_eq!(normalize(&identity(), &bad, 2026).unwrap_err().field, "mileage");
    }

    #[test]
    fn mileage_overflow_is_rejected() {
        assert!(parse_mileage("99999999999999999999999").is_err());
    }

    #[test]
    fn identity_strings_are_lowercased_and_missing_ones_null() {
        let request = normalize(&identity(), &answers(), 2026).unwrap();
        assert_eq!(request.make_name.as_deref(), Some("toyota"));
        assert_eq!(request.model_name.as_deref(), Some("corolla"));
        assert_eq!(request.trim_name.as_deref(), Some("le"));
        assert_eq!(request.transmission.as_deref(), Some("cvt"));
        assert_eq!(request.fuel_type, None);
        assert_eq!(request.wheel_system_display, None);
        assert_eq!(request.horsepower, Some(132.0));
        assert_eq!(request.vin, "2T1BURHE0JC014025");
    }

    #[test]
    fn answers_are_normalized_with_defaults() {
        let request = normalize(&identity(), &answers(), 2026).unwrap();
        assert_eq!(request.exterior_color, "silver");
        assert_eq!(request.exterior_color_base, "silver");
        assert_eq!(request.interior_color, "unknown");
        assert_eq!(request.interior_color_base, "unknown");
        assert_eq!(request.dealer_zip, "10001");

        let mut blank = answers();
        blank.zip_or_city = "  ".to_string();
        assert_eq!(normalize(&identity(), &blank, 2026).unwrap().dealer_zip, "00000");
    }

    #[test]
    fn booleans_use_legacy_strings_and_owner_count() {
        let request = normalize(&identity(), &answers(), 2026).unwrap();
        assert_eq!(request.owner_count, 1);
        assert_eq!(request.has_accidents, "TRUE");
        assert_eq!(request.frame_damaged, "FALSE");
        assert_eq!(request.salvage, "FALSE");
        assert_eq!(request.theft_title, "FALSE");
        assert_eq!(request.has_loan, "FALSE");

        let mut second_owner = answers();
        second_owner.first_owner = false;
        assert_eq!(normalize(&identity(), &second_owner, 2026).unwrap().owner_count, 2);
    }

    #[test]
    fn is_new_depends_on_injected_year() {
        assert_eq!(normalize(&identity(), &answers(), 2018).unwrap().is_new, "TRUE");
        assert_eq!(normalize(&identity(), &answers(), 2026).unwrap().is_new, "FALSE");

        let mut no_year = identity();
        no_year.year = None;
        assert_eq!(normalize(&no_year, &answers(), 2026).unwrap().is_new, "FALSE");
    }

    #[test]
    fn placeholders_are_fixed() {
        let request = normalize(&identity(), &answers(), 2026).unwrap();
        assert_eq!(request.torque, None);
        assert_eq!(request.city_fuel_economy, None);
        assert_eq!(request.highway_fuel_economy, None);
        assert_eq!(request.combine_fuel_economy, None);
        assert_eq!(request.days_on_market, 30);
    }

    #[test]
    fn output_is_byte_identical_across_calls() {
        let first = serde_json::to_vec(&normalize(&identity(), &answers(), 2026).unwrap()).unwrap();
        let second = serde_json::to_vec(&normalize(&identity(), &answers(), 2026).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn wire_format_uses_snake_case_and_legacy_keys() {
        let value = serde_json::to_value(normalize(&identity(), &answers(), 2026).unwrap()).unwrap();
        assert_eq!(value["daysonmarket"], 30);
        assert_eq!(value["trim_name"], "le");
        assert!(value["torque"].is_null());
        assert!(value["fuel_type"].is_null());
        assert_eq!(value["frame_damaged"], "FALSE");
    }

    #[test]
    fn loan_fields_are_parsed_when_present() {
        let mut with_loan = answers();
        with_loan.loan = Some(LoanDetails {
            loan_balance: "$12,500.50".to_string(),
            monthly_payment: "320".to_string(),
            interest_rate: "4.9%".to_string(),
            remaining_months: "36".to_string(),
        });
        let request = normalize(&identity(), &with_loan, 2026).unwrap();
        assert_eq!(request.has_loan, "TRUE");
        assert_eq!(request.loan_balance, Some(12500.5));
        assert_eq!(request.monthly_payment, Some(320.0));
        assert_eq!(request.interest_rate, Some(4.9));
        assert_eq!(request.remaining_months, Some(36));
    }

    #[test]
    fn invalid_loan_fields_are_validation_errors() {
        let mut with_loan = answers();
        with_loan.loan = Some(LoanDetails {
            loan_balance: "-5".to_string(),
            ..Default::default()
        });
        assert_eq!(normalize(&identity(), &with_loan, 2026).unwrap_err().field, "loan_balance");

        with_loan.loan = Some(LoanDetails {
            remaining_months: "two years".to_string(),
            ..Default::default()
        });
        assert_eq!(normalize(&identity(), &with_loan, 2026).unwrap_err().field, "remaining_months");
    }
}
