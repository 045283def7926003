// Router-level tests: real handlers, templates and session cookie, with an
// in-process prediction backend.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::Path,
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use reqwest::Client;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::create_router;
use crate::{
    config::Settings,
    session_store::VEHICLE_DATA_KEY,
    valuation_api::{ValuationClient, PREDICTION_FAILED, RESULTS_FAILED},
    AppState,
};

const VIN: &str = "2T1BURHE0JC014025";
// Predictions for this zip fail on the fake backend
const FAILING_ZIP: &str = "99999";

fn app_state(api_base_url: &str) -> AppState {
    let settings = Settings {
        server_address: "127.0.0.1:0".to_string(),
        api_base_url: api_base_url.to_string(),
        proxy_url: None,
        secure_cookies: false,
        static_dir: "static".to_string(),
    };
    let valuation = ValuationClient::new(Client::new(), api_base_url).unwrap();
    AppState { settings: Arc::new(settings), valuation: Arc::new(valuation) }
}

// For tests that must never reach a backend; nothing listens on the discard port
fn offline_app() -> Router {
    create_router(app_state("http://127.0.0.1:9"))
}

fn future_values(count: u32) -> Vec<Value> {
    (1..=count)
        .map(|year| json!({ "year": year, "value": 15000.0 - 800.0 * year as f64, "projected_mileage": 12000.0 * year as f64 }))
        .collect()
}

async fn fake_backend() -> String {
    let backend = Router::new()
        .route(
            "/api/vin-lookup",
            post(|Json(body): Json<Value>| async move {
                if body["vin"] == VIN {
                    Json(json!({
                        "success": true,
                        "data": { "year": 2018, "make_name": "toyota", "model_name": "corolla", "trim": "le" }
                    }))
                    .into_response()
                } else {
                    (StatusCode::NOT_FOUND, Json(json!({ "error": "No vehicle found" }))).into_response()
                }
            }),
        )
        .route(
            "/api/predict",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["vin"], VIN);
                if body["dealer_zip"] == FAILING_ZIP {
                    return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "model offline" })))
                        .into_response();
                }
                Json(json!({ "success": true, "prediction_id": "pred-1" })).into_response()
            }),
        )
        .route(
            "/api/results/:id",
            get(|Path(id): Path<String>| async move {
                let count = match id.as_str() {
                    "pred-1" => 5,
                    "partial" => 2,
                    _ => return (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))).into_response(),
                };
                Json(json!({
                    "success": true,
                    "data": {
                        "id": id,
                        "vin": VIN,
                        "vehicle_data": { "year": 2018, "make_name": "toyota", "model_name": "corolla" },
                        "user_inputs": { "mileage": 45000 },
                        "prediction_results": {
                            "current_value": 15000.0,
                            "annual_mileage": 12000.0,
                            "future_values": future_values(count)
                        }
                    }
                }))
                .into_response()
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, backend).await.unwrap();
    });
    format!("http://{}", addr)
}

fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn form_request(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn location(response: &Response) -> &str {
    response.headers().get(header::LOCATION).unwrap().to_str().unwrap()
}

// "vehicleData=..." as the browser would send it back
fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with(VEHICLE_DATA_KEY))
        .and_then(|value| value.split(';').next())
        .map(str::to_string)
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// Runs the VIN lookup step and returns the cookie it set
async fn identified_cookie(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(form_request("/vin-lookup", &format!("vin={}", VIN.to_lowercase()), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/vehicle-details");
    session_cookie(&response).expect("lookup sets the session cookie")
}

#[tokio::test]
async fn vin_entry_always_renders() {
    let response = offline_app().oneshot(get_request("/", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("name=\"vin\""));
}

#[tokio::test]
async fn guarded_steps_redirect_without_a_vehicle() {
    for uri in ["/vehicle-details", "/vehicle-questionnaire", "/results/pred-1"] {
        let response = offline_app().oneshot(get_request(uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{}", uri);
        assert_eq!(location(&response), "/");
    }
}

#[tokio::test]
async fn tampered_session_cookie_counts_as_empty() {
    let cookie = format!("{}=not-json", VEHICLE_DATA_KEY);
    let response = offline_app()
        .oneshot(get_request("/vehicle-details", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn invalid_vin_is_rejected_before_any_lookup() {
    // The offline backend would produce the connection message if it were called
    let response = offline_app()
        .oneshot(form_request("/vin-lookup", "vin=1HGCM82633A00435", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(session_cookie(&response).is_none());
    let body = body_text(response).await;
    assert!(body.contains("Invalid VIN format"));
    assert!(!body.contains("Error connecting to the server"));
}

#[tokio::test]
async fn failed_lookup_shows_message_and_stays_on_vin_entry() {
    let app = create_router(app_state(&fake_backend().await));
    let response = app
        .oneshot(form_request("/vin-lookup", "vin=1HGCM82633A004352", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(session_cookie(&response).is_none());
    assert!(body_text(response).await.contains("No vehicle found"));
}

#[tokio::test]
async fn full_wizard_flow() {
    let app = create_router(app_state(&fake_backend().await));
    let cookie = identified_cookie(&app).await;

    let response = app.clone().oneshot(get_request("/vehicle-details", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Toyota"));
    assert!(body.contains(VIN));

    let response = app
        .clone()
        .oneshot(get_request("/vehicle-questionnaire", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let form = "mileage=45%2C000&zip=90210&exterior_color=White&interior_color=&first_owner=yes&has_loan=no";
    let response = app
        .clone()
        .oneshot(form_request("/vehicle-questionnaire", form, Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/results/pred-1");

    let response = app.oneshot(get_request("/results/pred-1", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("2018 Toyota Corolla"));
    assert!(body.contains("15,000.00"));
    assert!(body.contains("11,000.00"));
    assert!(body.contains("Year 5"));
}

#[tokio::test]
async fn invalid_mileage_keeps_answers_and_skips_prediction() {
    let app = create_router(app_state(&fake_backend().await));
    let cookie = identified_cookie(&app).await;

    let response = app
        .oneshot(form_request(
            "/vehicle-questionnaire",
            "mileage=lots&zip=90210&salvage_title=yes",
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Please enter your current mileage as a number"));
    assert!(body.contains("value=\"90210\""));
}

// The <select> markup for one questionnaire field
fn select_markup<'a>(body: &'a str, name: &str) -> &'a str {
    let start = body.find(&format!("name=\"{}\"", name)).unwrap();
    let end = start + body[start..].find("</select>").unwrap();
    &body[start..end]
}

#[tokio::test]
async fn failed_prediction_keeps_answers_for_retry() {
    let app = create_router(app_state(&fake_backend().await));
    let cookie = identified_cookie(&app).await;

    let form = format!(
        "mileage=45%2C000&zip={}&exterior_color=Red&interior_color=Black&theft_title=yes&has_loan=no",
        FAILING_ZIP
    );
    let response = app
        .oneshot(form_request("/vehicle-questionnaire", &form, Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());

    let body = body_text(response).await;
    assert!(body.contains(PREDICTION_FAILED));
    assert!(body.contains("value=\"45,000\""));
    assert!(body.contains(&format!("value=\"{}\"", FAILING_ZIP)));
    assert!(body.contains("value=\"Red\""));
    assert!(body.contains("value=\"Black\""));
    assert!(select_markup(&body, "theft_title").contains("value=\"yes\" selected"));
    assert!(select_markup(&body, "first_owner").contains("value=\"no\" selected"));
}

#[tokio::test]
async fn incomplete_results_show_error_with_restart() {
    let app = create_router(app_state(&fake_backend().await));
    let cookie = identified_cookie(&app).await;

    for id in ["partial", "unknown"] {
        let response = app
            .clone()
            .oneshot(get_request(&format!("/results/{}", id), Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains(RESULTS_FAILED), "{}", id);
        assert!(body.contains("action=\"/restart\""));
    }
}

#[tokio::test]
async fn restart_clears_the_session() {
    let app = create_router(app_state(&fake_backend().await));
    let cookie = identified_cookie(&app).await;

    let response = app
        .oneshot(form_request("/restart", "", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    let removal = session_cookie(&response).expect("restart emits a removal cookie");
    assert_eq!(removal, format!("{}=", VEHICLE_DATA_KEY));
}
