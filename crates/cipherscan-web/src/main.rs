//! Proxy server between the browser front-end and the inference service.
//!
//! The one non-static route, `POST /api/predict`, validates that the request
//! carries non-empty text and then forwards it to `{ML_API_URL}/predict`,
//! relaying the upstream's status and body verbatim. Transport failures are
//! logged here and reported to the caller only as a generic server error.
//! Everything else served is static front-end assets.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

/// Default base URL of the inference service.
const DEFAULT_ML_API_URL: &str = "http://127.0.0.1:8000";

/// Default listen port.
const DEFAULT_PORT: u16 = 5001;

/// Configuration and shared clients, injected into handlers at startup.
struct AppState {
    http: reqwest::Client,
    ml_base: String,
}

/// Incoming body for the proxy route. `text` may be absent; presence is
/// checked in the handler so the 400 payload stays under our control.
#[derive(Debug, Deserialize)]
struct PredictBody {
    #[serde(default)]
    text: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let ml_base = std::env::var("ML_API_URL").unwrap_or_else(|_| DEFAULT_ML_API_URL.to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let static_dir =
        std::env::var("CIPHERSCAN_STATIC_DIR").unwrap_or_else(|_| "static".to_string());

    let state = Arc::new(AppState {
        http: reqwest::Client::new(),
        ml_base,
    });
    let app = router(state, &static_dir);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>, static_dir: &str) -> Router {
    Router::new()
        .route("/api/predict", post(predict))
        .route("/api/health", get(health))
        .fallback_service(ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "cipherscan-web",
        "upstream": state.ml_base,
    }))
}

/// Forward a text prediction request to the inference service.
///
/// The upstream's status code and JSON body pass through unchanged, success
/// or not, so the front-end sees exactly what the service said.
async fn predict(State(state): State<Arc<AppState>>, Json(body): Json<PredictBody>) -> Response {
    let text = body.text.unwrap_or_default();
    if text.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Text required"})),
        )
            .into_response();
    }

    let url = format!("{}/predict", state.ml_base.trim_end_matches('/'));
    let upstream = state
        .http
        .post(&url)
        .json(&serde_json::json!({ "text": text }))
        .send()
        .await;

    match upstream {
        Ok(resp) => {
            let status = resp.status();
            match resp.bytes().await {
                Ok(bytes) => (
                    status,
                    [(header::CONTENT_TYPE, "application/json")],
                    bytes,
                )
                    .into_response(),
                Err(err) => server_error(err),
            }
        }
        Err(err) => server_error(err),
    }
}

/// Generic failure response for transport errors. The underlying error is
/// logged for the operator and never surfaced to the caller.
fn server_error(err: reqwest::Error) -> Response {
    error!("predict proxy error: {err}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({"error": "Server error"})),
    )
        .into_response()
}
