//! HTTP client for the cipher prediction inference service.
//!
//! Two request paths exist and they are deliberately different: text
//! predictions go through the local proxy route (`POST {api_base}/api/predict`)
//! while file uploads go straight to the inference service
//! (`POST {ml_base}/predict-file`). Both bases are injected via [`Endpoints`]
//! so tests can point either path at a stub server.

use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-request timeout; inference on large inputs can take a while.
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Fallback message when an error response carries no usable detail.
const GENERIC_PREDICTION_ERROR: &str = "Prediction failed";

#[derive(Error, Debug)]
pub enum ClientError {
    /// No response arrived: connection refused, DNS failure, timeout.
    #[error("network error")]
    Network(#[from] reqwest::Error),
    /// The service answered with a non-success status.
    #[error("{message}")]
    Api {
        status: reqwest::StatusCode,
        message: String,
    },
    /// The response claimed success but the body was not the expected JSON.
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Request body for the text path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub text: String,
}

/// A single candidate in a prediction's ranked list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopCandidate {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub prob: f64,
}

/// Prediction returned for a ciphertext string.
///
/// Field access is best-effort: the service is not required to send every
/// field, so each one defaults when absent rather than failing the decode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(default)]
    pub algorithm: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub top: Vec<TopCandidate>,
}

/// Analysis returned for one uploaded file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileAnalysis {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub algorithm: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub ciphertext_preview: String,
}

/// Base URLs for the two request paths.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Proxy base used by the text path.
    pub api_base: String,
    /// Inference service base used by direct file uploads and health checks.
    pub ml_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_base: "http://127.0.0.1:5001".to_string(),
            ml_base: "http://127.0.0.1:8000".to_string(),
        }
    }
}

impl Endpoints {
    /// Resolve endpoints from `CIPHERSCAN_API_URL` and `ML_API_URL`, falling
    /// back to the local defaults. Call this from `main`; nothing reads the
    /// environment at request time.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base: std::env::var("CIPHERSCAN_API_URL").unwrap_or(defaults.api_base),
            ml_base: std::env::var("ML_API_URL").unwrap_or(defaults.ml_base),
        }
    }
}

/// Client for the prediction endpoints. Cheap to clone; the inner
/// `reqwest::Client` is shared.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    http: reqwest::Client,
    endpoints: Endpoints,
}

impl InferenceClient {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoints,
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Submit ciphertext for prediction via the proxy route.
    ///
    /// Non-success responses yield [`ClientError::Api`] with the message
    /// extracted from the body's `detail` or `error` field.
    pub async fn predict_text(&self, text: &str) -> Result<Prediction, ClientError> {
        let url = join(&self.endpoints.api_base, "/api/predict");
        debug!("POST {url}");
        let resp = self
            .http
            .post(&url)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .json(&PredictionRequest {
                text: text.to_string(),
            })
            .send()
            .await?;

        let status = resp.status();
        let body = resp.bytes().await?;
        if !status.is_success() {
            return Err(ClientError::Api {
                status,
                message: extract_error_message(&body),
            });
        }
        Ok(serde_json::from_slice(&body)?)
    }

    /// Upload a single file for analysis, directly to the inference service.
    ///
    /// The bytes are sent as a multipart form under field name `file`. On a
    /// non-success status the raw response body text becomes the error
    /// message, as-is.
    pub async fn predict_file(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<FileAnalysis, ClientError> {
        let url = join(&self.endpoints.ml_base, "/predict-file");
        debug!("POST {url} ({filename}, {} bytes)", bytes.len());
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        let resp = self
            .http
            .post(&url)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .multipart(form)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await?;
            return Err(ClientError::Api { status, message });
        }
        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Probe the inference service's health endpoint.
    pub async fn health(&self) -> Result<serde_json::Value, ClientError> {
        let url = join(&self.endpoints.ml_base, "/health");
        debug!("GET {url}");
        let resp = self
            .http
            .get(&url)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .send()
            .await?;

        let status = resp.status();
        let body = resp.bytes().await?;
        if !status.is_success() {
            return Err(ClientError::Api {
                status,
                message: extract_error_message(&body),
            });
        }
        Ok(serde_json::from_slice(&body)?)
    }
}

fn join(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// Pull a human-readable message out of an error response body.
///
/// The inference service reports failures as `{"detail": ...}` and the proxy
/// as `{"error": ...}`; anything else falls back to a generic message.
fn extract_error_message(body: &[u8]) -> String {
    let value: serde_json::Value = match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(_) => return GENERIC_PREDICTION_ERROR.to_string(),
    };
    value
        .get("detail")
        .or_else(|| value.get("error"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| GENERIC_PREDICTION_ERROR.to_string())
}
