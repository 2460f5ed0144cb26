// HTTP response utilities for artifacts and errors
use crate::application::ndvi_service::NdviError;
use crate::domain::artifact::Artifact;
use axum::{
    body::Body,
    http::{header, HeaderValue, Response, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::error::Error;

/// Serve an in-memory artifact as a file download
pub fn artifact_response(artifact: Artifact) -> Response<Body> {
    let disposition = format!("attachment; filename=\"{}\"", artifact.file_name);
    let length = artifact.bytes.len();

    let mut response = Response::new(Body::from(artifact.bytes));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(artifact.content_type),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    response
}

/// Display strings of `err` and each of its sources
pub fn error_chain(err: &dyn Error) -> Vec<String> {
    let mut chain = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push(cause.to_string());
        source = cause.source();
    }
    chain
}

impl NdviError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            NdviError::Geometry(_) | NdviError::Date(_) | NdviError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            NdviError::RemoteQuery(_) => StatusCode::BAD_GATEWAY,
            NdviError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for NdviError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let trace = error_chain(&self);

        if status.is_server_error() {
            tracing::error!("NDVI request failed: {}", trace.join(": "));
        } else {
            tracing::warn!("NDVI request rejected: {}", self);
        }

        (status, Json(json!({ "error": self.to_string(), "trace": trace }))).into_response()
    }
}
