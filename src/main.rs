use anyhow::{Context, Result};
use axum::{extract::FromRef, Router};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{config::Settings, valuation_api::ValuationClient};

mod config;
mod dashboard;
mod error;
mod models;
mod normalizer;
mod routes;
mod session_cookie;
mod session_store;
mod valuation_api;
mod vin;
mod wizard;

// Shared by every handler; the wizard session itself travels in the request cookie
#[derive(Clone, FromRef)]
struct AppState {
    settings: Arc<Settings>,
    valuation: Arc<ValuationClient>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file first. Ignore errors (e.g., file not found)
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vehicle_valuation=info,tower_http=info".into()),
        )
        .with(fmt::layer())
        .init();

    tracing::info!("Initializing vehicle valuation server...");

    let settings = match Settings::new() {
        Ok(s) => {
            tracing::info!("Configuration loaded successfully.");
            s
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };
    let settings = Arc::new(settings);

    let http_client = valuation_api::build_http_client(&settings)?;
    let valuation = ValuationClient::new(http_client, &settings.api_base_url)?;
    tracing::info!("Prediction backend at {}", settings.api_base_url);

    let app_state = AppState {
        settings: settings.clone(),
        valuation: Arc::new(valuation),
    };

    let router: Router = routes::create_router(app_state);
    let app = router.nest_service("/static", ServeDir::new(&settings.static_dir));

    let addr: SocketAddr = settings
        .server_address
        .parse()
        .with_context(|| format!("Invalid server address format: {}", settings.server_address))?;

    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => {
            tracing::info!("Server listening on {}", addr);
            l
        }
        Err(e) => {
            tracing::error!("Failed to bind to address {}: {}", addr, e);
            return Err(e.into());
        }
    };

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
