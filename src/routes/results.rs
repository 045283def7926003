// Step 4: results dashboard for a stored prediction, addressed by id.

use askama::Template;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};

use crate::{
    dashboard::{format_dollars, format_miles, summarize, vehicle_title, ValuationSummary},
    error::AppResult,
    models::PredictionRecord,
    session_cookie::WizardSession,
    valuation_api::RESULTS_FAILED,
    wizard::WizardStep,
    AppState,
};

use super::render;

struct TimelineRow {
    label: String,
    value: String,
    percent: f64,
}

// Everything the dashboard shows, already formatted
struct DashboardView {
    vehicle_title: String,
    model_year: String,
    current_value: String,
    five_year_value: String,
    depreciation_change: String,
    annual_depreciation: String,
    projected_mileage: String,
    annual_mileage: String,
    mileage_above_average: bool,
    timeline: Vec<TimelineRow>,
}

impl DashboardView {
    fn new(record: &PredictionRecord, summary: ValuationSummary) -> Self {
        DashboardView {
            vehicle_title: vehicle_title(record),
            model_year: record.vehicle_data.year.map(|y| y.to_string()).unwrap_or_default(),
            current_value: format_dollars(summary.current_value),
            five_year_value: format_dollars(summary.five_year_value),
            // Shown as a loss, so a vehicle that gains value reads positive
            depreciation_change: format_dollars(-summary.total_depreciation),
            annual_depreciation: format_dollars(summary.annual_depreciation),
            projected_mileage: format_miles(summary.projected_mileage),
            annual_mileage: format_miles(summary.annual_mileage),
            mileage_above_average: summary.mileage_above_average,
            timeline: summary
                .timeline
                .into_iter()
                .map(|point| TimelineRow {
                    label: point.label,
                    value: format_dollars(point.value),
                    percent: point.percent,
                })
                .collect(),
        }
    }
}

#[derive(Template)]
#[template(path = "results.html")]
struct ResultsTemplate {
    step: u8,
    dashboard: Option<DashboardView>,
    page_error: Option<String>,
}

// GET /results/:id
pub async fn results_page(
    State(app_state): State<AppState>,
    session: WizardSession,
    Path(prediction_id): Path<String>,
) -> AppResult<Response> {
    if let Err(redirect) = session.require(WizardStep::Results) {
        return Ok(redirect.into_response());
    }
    tracing::info!("[HANDLER] /results/:id - Loading prediction {}", prediction_id);

    let (dashboard, page_error) = match app_state.valuation.fetch_results(&prediction_id).await {
        Ok(record) => match summarize(&record.prediction_results) {
            Some(summary) => (Some(DashboardView::new(&record, summary)), None),
            None => {
                tracing::warn!(
                    "[HANDLER] /results/:id - Prediction {} has {} yearly projections, expected 5",
                    prediction_id,
                    record.prediction_results.future_values.len()
                );
                (None, Some(RESULTS_FAILED.to_string()))
            }
        },
        // No automatic redirect; the page explains and offers a restart
        Err(e) => (None, Some(e.message().to_string())),
    };

    let template = ResultsTemplate {
        step: WizardStep::Results.number(),
        dashboard,
        page_error,
    };
    Ok(render(&template)?.into_response())
}
