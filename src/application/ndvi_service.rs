// NDVI service - Use case for generating a time series and its exports
use crate::application::imagery_backend::{ImageryBackend, RemoteQueryError};
use crate::domain::artifact::Artifact;
use crate::domain::date_range::{DateError, DateRange};
use crate::domain::ndvi::{NdviChart, NdviSeries};
use crate::domain::region::{GeometryError, Region};
use crate::infrastructure::config::{ChartSettings, QuerySettings};
use crate::infrastructure::export::ExportError;
use crate::infrastructure::{chart_png, csv_export};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NdviError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Date(#[from] DateError),

    #[error("invalid request body: {0}")]
    InvalidRequest(String),

    #[error("failed to fetch NDVI time series")]
    RemoteQuery(#[from] RemoteQueryError),

    #[error("failed to export NDVI time series")]
    Export(#[from] ExportError),
}

/// User input for one "Generate" action. Fields stay raw JSON so that the
/// domain parsers report bad dates and shapes with their own errors.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GenerateRequest {
    pub start_date: Option<Value>,
    pub end_date: Option<Value>,
    pub shape: Option<Value>,
}

#[derive(Clone)]
pub struct NdviService {
    backend: Arc<dyn ImageryBackend>,
    query_settings: QuerySettings,
    chart_settings: ChartSettings,
}

impl NdviService {
    pub fn new(
        backend: Arc<dyn ImageryBackend>,
        query_settings: QuerySettings,
        chart_settings: ChartSettings,
    ) -> Self {
        Self {
            backend,
            query_settings,
            chart_settings,
        }
    }

    /// Validate inputs, then evaluate the query in a single round trip
    pub async fn time_series(&self, request: &GenerateRequest) -> Result<NdviSeries, NdviError> {
        let region = Region::from_drawn_shape(request.shape.as_ref())?;
        let date_range =
            DateRange::from_json(request.start_date.as_ref(), request.end_date.as_ref())?;

        if date_range.is_inverted() {
            tracing::warn!(
                "Start date {} is after end date {}; the collection will likely be empty",
                date_range.start_str(),
                date_range.end_str()
            );
        }

        let query = self.query_settings.build_query(date_range, region);
        let series = query.evaluate(self.backend.as_ref()).await?;
        if series.is_empty() {
            tracing::warn!("No images matched the query; returning an empty series");
        }

        tracing::info!(
            "Fetched {} NDVI records for {} between {} and {}",
            series.len(),
            query.region.kind(),
            date_range.start_str(),
            date_range.end_str()
        );
        Ok(series)
    }

    pub async fn chart(&self, request: &GenerateRequest) -> Result<NdviChart, NdviError> {
        Ok(self.time_series(request).await?.to_chart())
    }

    pub async fn csv(&self, request: &GenerateRequest) -> Result<Artifact, NdviError> {
        let series = self.time_series(request).await?;
        Ok(csv_export::series_to_csv(&series)?)
    }

    pub async fn png(&self, request: &GenerateRequest) -> Result<Artifact, NdviError> {
        let series = self.time_series(request).await?;
        let settings = self.chart_settings.clone();

        let artifact = tokio::task::spawn_blocking(move || chart_png::render_png(&series, &settings))
            .await
            .map_err(|e| ExportError::Chart(e.to_string()))??;
        Ok(artifact)
    }
}
