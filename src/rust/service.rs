//! The HTTP prediction service.
//!
//! A [`PredictionService`] only exists once its model has loaded, so a
//! half-initialised model can never serve a request. The classifier is
//! shared read-only across request handlers through an `Arc`.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::artifact;
use crate::classifier::SpamClassifier;
use crate::error::PipelineError;

/// Start-up lifecycle, reported in logs. A constructed service is always `Ready`.
#[derive(Debug, Clone, Copy)]
enum ServiceState {
    Unloaded,
    Loading,
    Ready,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictRequest {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub text: String,
    /// `"Spam"` or `"Ham"`.
    pub prediction: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// A per-request failure, reported to the caller as a client error.
#[derive(Debug)]
pub enum ServiceError {
    Validation(StatusCode, String),
}

impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        ServiceError::Validation(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        match self {
            ServiceError::Validation(status, detail) => {
                warn!("Rejected request ({}): {}", status, detail);
                (status, Json(ErrorBody { detail })).into_response()
            }
        }
    }
}

/// The loaded, ready-to-serve prediction service.
#[derive(Debug, Clone)]
pub struct PredictionService {
    classifier: Arc<SpamClassifier>,
}

impl PredictionService {
    /// Wraps an already fitted classifier.
    pub fn new(classifier: SpamClassifier) -> Self {
        Self {
            classifier: Arc::new(classifier),
        }
    }

    /// Loads the artifact at `path`. Any failure is returned and no service is created.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let mut state = ServiceState::Unloaded;
        debug!("Prediction service state: {:?}", state);

        state = ServiceState::Loading;
        info!("Loading model... ({:?})", state);
        let classifier = artifact::load(path)?;

        state = ServiceState::Ready;
        info!("Prediction service state: {:?}", state);
        Ok(Self::new(classifier))
    }

    pub fn classifier(&self) -> &SpamClassifier {
        &self.classifier
    }

    /// Classifies one text into a response body.
    pub fn predict(&self, text: String) -> PredictResponse {
        let label = self.classifier.predict(&text);
        PredictResponse {
            text,
            prediction: label.to_string(),
        }
    }

    /// Builds the router with the `POST /predict` endpoint.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/predict", post(predict_handler))
            .with_state(self.clone())
    }

    /// Serves on `listener` until Ctrl-C.
    pub async fn serve(self, listener: TcpListener) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        info!("Prediction service listening on http://{}", addr);
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
    }

    /// Binds `addr` and serves until Ctrl-C.
    pub async fn bind_and_serve(self, addr: SocketAddr) -> std::io::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener).await
    }
}

async fn predict_handler(
    State(service): State<PredictionService>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, ServiceError> {
    let Json(request) = payload?;
    let response = service.predict(request.text);
    debug!("Predicted {} for {} chars", response.prediction, response.text.len());
    Ok(Json(response))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down prediction service");
}
