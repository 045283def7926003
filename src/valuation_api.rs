// Client for the prediction backend (VIN lookup, prediction, stored results).
//
// Every failure is logged here with its detail and handed back to the page as
// the single message the user sees. No retries: the user re-submits.

use anyhow::{Context, Result};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;

use crate::{
    config::Settings,
    error::WizardError,
    models::{
        ErrorBody, PredictResponse, PredictionRecord, PredictionRequest, ResultsResponse,
        VehicleIdentity, VinLookupRequest, VinLookupResponse,
    },
};

pub const LOOKUP_FAILED: &str = "Vin lookup failed";
pub const SERVER_UNREACHABLE: &str = "Error connecting to the server";
pub const PREDICTION_FAILED: &str = "Failed to generate a prediction, please try again.";
pub const RESULTS_FAILED: &str = "Failed to load prediction results. Please try again.";

// Builds the shared reqwest client, routed through the configured proxy if any
pub fn build_http_client(settings: &Settings) -> Result<Client> {
    let mut builder = Client::builder().user_agent(concat!("vehicle_valuation/", env!("CARGO_PKG_VERSION")));
    if let Some(proxy_url) = settings.proxy_url.as_deref().filter(|p| !p.is_empty()) {
        let proxy = reqwest::Proxy::all(proxy_url)
            .with_context(|| format!("Invalid proxy_url '{}'", proxy_url))?;
        builder = builder.proxy(proxy);
        tracing::info!("Routing backend requests through configured proxy.");
    }
    builder.build().context("Failed to build shared reqwest client")
}

#[derive(Debug, Clone)]
pub struct ValuationClient {
    http: Client,
    base_url: Url,
}

impl ValuationClient {
    pub fn new(http: Client, base_url: &str) -> Result<Self> {
        // Trailing slash so endpoint paths append rather than replace
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized)
            .with_context(|| format!("Invalid api_base_url '{}'", base_url))?;
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("Failed to build backend URL for '{}'", path))
    }

    /// Looks up a validated VIN. The returned identity carries `vin` as given,
    /// whatever the backend echoes.
    pub async fn lookup_vin(&self, vin: &str) -> Result<VehicleIdentity, WizardError> {
        let url = self
            .endpoint("api/vin-lookup")
            .map_err(|e| lookup_failure(e, SERVER_UNREACHABLE))?;
        tracing::debug!(vin, %url, "Sending VIN lookup");

        let response = self
            .http
            .post(url)
            .json(&VinLookupRequest { vin: vin.to_string() })
            .send()
            .await
            .map_err(|e| lookup_failure(anyhow::Error::new(e), SERVER_UNREACHABLE))?;

        let status = response.status();
        if !status.is_success() {
            // The backend explains 4xx/5xx in an `error` field
            let message = error_message(response)
                .await
                .unwrap_or_else(|| SERVER_UNREACHABLE.to_string());
            tracing::warn!(vin, %status, "VIN lookup rejected: {}", message);
            return Err(WizardError::LookupFailure(message));
        }

        let body: VinLookupResponse = read_json(response)
            .await
            .map_err(|e| lookup_failure(e, SERVER_UNREACHABLE))?;

        match (body.success, body.data) {
            (true, Some(data)) => {
                tracing::info!(vin, "VIN lookup succeeded");
                Ok(data.into_identity(vin.to_string()))
            }
            (_, _) => {
                let message = body.error.unwrap_or_else(|| LOOKUP_FAILED.to_string());
                tracing::warn!(vin, "VIN lookup unsuccessful: {}", message);
                Err(WizardError::LookupFailure(message))
            }
        }
    }

    // Submits the normalized payload and returns the opaque prediction id.
    pub async fn submit_prediction(&self, request: &PredictionRequest) -> Result<String, WizardError> {
        let result: Result<PredictResponse> = async {
            let url = self.endpoint("api/predict")?;
            let response = self
                .http
                .post(url)
                .json(request)
                .send()
                .await
                .context("Network error submitting prediction")?
                .error_for_status()
                .context("Backend rejected prediction request")?;
            read_json(response).await
        }
        .await;

        match result {
            Ok(body) if !body.prediction_id.trim().is_empty() => {
                tracing::info!(vin = %request.vin, prediction_id = %body.prediction_id, "Prediction created");
                Ok(body.prediction_id)
            }
            Ok(_) => {
                tracing::error!(vin = %request.vin, "Backend returned an empty prediction id");
                Err(WizardError::PredictionFailure(PREDICTION_FAILED.to_string()))
            }
            Err(e) => {
                tracing::error!(vin = %request.vin, "Prediction request failed: {:?}", e);
                Err(WizardError::PredictionFailure(PREDICTION_FAILED.to_string()))
            }
        }
    }

    pub async fn fetch_results(&self, prediction_id: &str) -> Result<PredictionRecord, WizardError> {
        let result: Result<ResultsResponse> = async {
            let path = format!("api/results/{}", urlencoding::encode(prediction_id));
            let url = self.endpoint(&path)?;
            let response = self
                .http
                .get(url)
                .send()
                .await
                .context("Network error fetching results")?
                .error_for_status()
                .context("Backend rejected results request")?;
            read_json(response).await
        }
        .await;

        match result {
            Ok(ResultsResponse { data: Some(record) }) => {
                tracing::info!(prediction_id, "Fetched prediction results");
                Ok(record)
            }
            Ok(ResultsResponse { data: None }) => {
                tracing::warn!(prediction_id, "No prediction stored under this id");
                Err(WizardError::ResultsFetchFailure(RESULTS_FAILED.to_string()))
            }
            Err(e) => {
                tracing::error!(prediction_id, "Results request failed: {:?}", e);
                Err(WizardError::ResultsFetchFailure(RESULTS_FAILED.to_string()))
            }
        }
    }
}

fn lookup_failure(error: anyhow::Error, message: &str) -> WizardError {
    tracing::error!("VIN lookup failed: {:?}", error);
    WizardError::LookupFailure(message.to_string())
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let text = response.text().await.context("Failed to read backend response body")?;
    serde_json::from_str(&text).context("Failed to parse backend response JSON")
}

async fn error_message(response: Response) -> Option<String> {
    let body: ErrorBody = read_json(response).await.ok()?;
    body.error.filter(|e| !e.trim().is_empty())
}
