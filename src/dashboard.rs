// Summary cards, value timeline and insights for the results page, computed
// from a stored prediction. Display formatting helpers live here too.

use crate::models::{PredictionRecord, PredictionResult};

pub const PROJECTION_YEARS: usize = 5;
// Annual mileage above this is called out as accelerating depreciation
pub const AVERAGE_ANNUAL_MILEAGE: f64 = 15_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct TimelinePoint {
    pub label: String,
    pub value: f64,
    // Bar width relative to the largest value, 0-100
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValuationSummary {
    pub current_value: f64,
    pub five_year_value: f64,
    pub total_depreciation: f64,
    pub annual_depreciation: f64,
    pub projected_mileage: f64,
    pub annual_mileage: f64,
    pub mileage_above_average: bool,
    pub timeline: Vec<TimelinePoint>,
}

// None when the result does not carry exactly five yearly projections.
pub fn summarize(result: &PredictionResult) -> Option<ValuationSummary> {
    if result.future_values.len() != PROJECTION_YEARS {
        return None;
    }
    let last = result.future_values.last()?;
    let total_depreciation = result.current_value - last.value;

    let values = std::iter::once(result.current_value)
        .chain(result.future_values.iter().map(|fv| fv.value));
    let max = values.clone().fold(0.0_f64, f64::max);
    let timeline = values
        .enumerate()
        .map(|(i, value)| TimelinePoint {
            label: if i == 0 { "Now".to_string() } else { format!("Year {}", i) },
            value,
            percent: if max > 0.0 { (value.max(0.0) / max * 100.0).round() } else { 0.0 },
        })
        .collect();

    Some(ValuationSummary {
        current_value: result.current_value,
        five_year_value: last.value,
        total_depreciation,
        annual_depreciation: total_depreciation / PROJECTION_YEARS as f64,
        // Whole miles, fraction dropped
        projected_mileage: last.projected_mileage.trunc(),
        annual_mileage: result.annual_mileage,
        mileage_above_average: result.annual_mileage > AVERAGE_ANNUAL_MILEAGE,
        timeline,
    })
}

// "2018 Toyota Corolla Le" from the vehicle echo of a stored prediction
pub fn vehicle_title(record: &PredictionRecord) -> String {
    let vehicle = &record.vehicle_data;
    let year = vehicle.year.map(|y| y.to_string());
    [
        year.as_deref(),
        vehicle.make_name.as_deref(),
        vehicle.model_name.as_deref(),
        vehicle.trim_name.as_deref(),
    ]
    .into_iter()
    .flatten()
    .map(title_case)
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
}

pub fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// Groups the integer part with commas: "1234567" -> "1,234,567"
fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

// en-US style with two decimals, no currency symbol: 15000 -> "15,000.00"
pub fn format_currency(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (whole, fraction) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));
    let sign = if value < 0.0 && formatted != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, group_thousands(whole), fraction)
}

// Sign ahead of the symbol: -1234 -> "-$1,234.00"
pub fn format_dollars(value: f64) -> String {
    let formatted = format_currency(value);
    match formatted.strip_prefix('-') {
        Some(magnitude) => format!("-${}", magnitude),
        None => format!("${}", formatted),
    }
}

pub fn format_miles(value: f64) -> String {
    let rounded = format!("{:.0}", value.abs());
    let sign = if value < 0.0 && rounded != "0" { "-" } else { "" };
    format!("{}{}", sign, group_thousands(&rounded))
}
