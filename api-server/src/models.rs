use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use ikebana_qubo::{ArrangementError, BaseInputs, BaseReport};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Arrangement {
    pub id: i64,
    pub artist: String,
    pub comment: String,
    pub vase_width: f64,
    pub vase_height: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewArrangement {
    pub artist: String,
    pub comment: String,
    pub vase_width: f64,
    pub vase_height: f64,
}

/// One stored branch; attributes are NULL when the sampler left the group
/// unresolved.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Branch {
    pub id: i64,
    pub arr_id: i64,
    pub role: String,
    pub length: Option<f64>,
    pub azimuth: Option<f64>,
    pub elevation: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OptimizeQuery {
    pub vase: Option<String>,
    pub forced_flower: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OptimizeResponse {
    #[serde(flatten)]
    pub report: BaseReport,
    pub arr_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct ExtendRequest {
    pub arr_id: i64,
    #[serde(flatten)]
    pub base: BaseInputs,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Optimization failed: {0}")]
    Optimization(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ArrangementError> for ApiError {
    fn from(err: ArrangementError) -> Self {
        match err {
            ArrangementError::Sampler(_) => ApiError::Optimization(err.to_string()),
            _ => ApiError::InvalidRequest(err.to_string()),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Database(_) | ApiError::Optimization(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
