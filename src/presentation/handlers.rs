// HTTP request handlers
use crate::application::ndvi_service::{GenerateRequest, NdviError};
use crate::domain::ndvi::NdviChart;
use crate::infrastructure::http_response::artifact_response;
use crate::presentation::app_state::AppState;
use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::Response,
    Json,
};
use std::sync::Arc;

/// Body rejections share the JSON error shape of the other 400s
fn generate_request(
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<GenerateRequest, NdviError> {
    payload
        .map(|Json(request)| request)
        .map_err(|rejection| NdviError::InvalidRequest(rejection.body_text()))
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Chart data: parallel date/value sequences and month ticks
pub async fn time_series(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<NdviChart>, NdviError> {
    let request = generate_request(payload)?;
    Ok(Json(state.ndvi_service.chart(&request).await?))
}

/// `ndvi_time_series.csv` download
pub async fn time_series_csv(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Response<Body>, NdviError> {
    let request = generate_request(payload)?;
    Ok(artifact_response(state.ndvi_service.csv(&request).await?))
}

/// `ndvi_time_series.png` download
pub async fn time_series_png(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Response<Body>, NdviError> {
    let request = generate_request(payload)?;
    Ok(artifact_response(state.ndvi_service.png(&request).await?))
}
