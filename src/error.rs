use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Message returned with a 404 when the provider has no bars for the window.
pub const NO_DATA_MESSAGE: &str = "No price data found";

/// Failures surfaced at the analytics request boundary.
///
/// Undefined indicator values are not errors; they travel as `None`/`null`.
#[derive(Debug)]
pub enum AnalyticsError {
    /// The provider returned zero candles for the ticker and window.
    NoData,
    /// Transport, status, or decoding failure talking to the provider.
    UpstreamFetch(String),
    /// The request itself could not be decoded (e.g. a repeated `apiKey`).
    BadRequest(String),
}

impl AnalyticsError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NoData => StatusCode::NOT_FOUND,
            Self::UpstreamFetch(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl std::fmt::Display for AnalyticsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoData => write!(f, "{NO_DATA_MESSAGE}"),
            Self::UpstreamFetch(msg) | Self::BadRequest(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for AnalyticsError {}

impl IntoResponse for AnalyticsError {
    fn into_response(self) -> Response {
        let body = json!({ "error": self.to_string() });
        (self.status(), axum::Json(body)).into_response()
    }
}

impl From<QueryRejection> for AnalyticsError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<anyhow::Error> for AnalyticsError {
    fn from(e: anyhow::Error) -> Self {
        // `{:#}` keeps the context chain on one line.
        Self::UpstreamFetch(format!("{e:#}"))
    }
}
