// Backend trait for remote imagery computation
use crate::application::ndvi_query::NdviQuery;
use crate::domain::ndvi::SchemaError;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteQueryError {
    #[error("request to imagery service failed")]
    Transport(#[from] reqwest::Error),

    #[error("imagery service returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("imagery service error: {0}")]
    Service(String),

    #[error("imagery service response did not match the expected schema")]
    Schema(#[from] SchemaError),
}

#[async_trait]
pub trait ImageryBackend: Send + Sync {
    /// Evaluate the query remotely in one round trip, returning the raw
    /// feature collection
    async fn compute(&self, query: &NdviQuery) -> Result<serde_json::Value, RemoteQueryError>;
}
