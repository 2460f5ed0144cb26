// NDVI query builder - Accumulates remote query parameters, evaluated once
use crate::application::imagery_backend::{ImageryBackend, RemoteQueryError};
use crate::domain::date_range::DateRange;
use crate::domain::ndvi::NdviSeries;
use crate::domain::region::Region;

pub const DEFAULT_COLLECTION: &str = "COPERNICUS/S2_SR";
pub const DEFAULT_CLOUD_PROPERTY: &str = "CLOUDY_PIXEL_PERCENTAGE";
pub const DEFAULT_MAX_CLOUD: f64 = 20.0;
pub const DEFAULT_NIR_BAND: &str = "B8";
pub const DEFAULT_RED_BAND: &str = "B4";
pub const NDVI_BAND: &str = "NDVI";
pub const DEFAULT_SCALE_M: f64 = 10.0;
pub const DEFAULT_MAX_PIXELS: f64 = 1e8;
/// Joda-style pattern understood by the remote service
pub const REMOTE_DATE_PATTERN: &str = "YYYY-MM-dd";

/// Metadata filter: keep items whose `property` is strictly below `max`
#[derive(Debug, Clone, PartialEq)]
pub struct CloudFilter {
    pub property: String,
    pub max: f64,
}

/// `(nir - red) / (nir + red)` added to every item as band `output`
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedDifference {
    pub nir: String,
    pub red: String,
    pub output: String,
}

/// Mean of the derived band over the region at `scale` metres
#[derive(Debug, Clone, PartialEq)]
pub struct MeanReduction {
    pub scale: f64,
    pub max_pixels: f64,
    pub date_pattern: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NdviQuery {
    pub collection_id: String,
    pub date_range: DateRange,
    pub region: Region,
    pub cloud_filter: CloudFilter,
    pub index: NormalizedDifference,
    pub reduction: MeanReduction,
}

impl NdviQuery {
    /// Builds nothing remotely; `evaluate` is the only round trip
    pub fn new(collection_id: &str, date_range: DateRange, region: Region) -> Self {
        Self {
            collection_id: collection_id.to_string(),
            date_range,
            region,
            cloud_filter: CloudFilter {
                property: DEFAULT_CLOUD_PROPERTY.to_string(),
                max: DEFAULT_MAX_CLOUD,
            },
            index: NormalizedDifference {
                nir: DEFAULT_NIR_BAND.to_string(),
                red: DEFAULT_RED_BAND.to_string(),
                output: NDVI_BAND.to_string(),
            },
            reduction: MeanReduction {
                scale: DEFAULT_SCALE_M,
                max_pixels: DEFAULT_MAX_PIXELS,
                date_pattern: REMOTE_DATE_PATTERN.to_string(),
            },
        }
    }

    pub fn cloud_filter(mut self, property: &str, max: f64) -> Self {
        self.cloud_filter = CloudFilter {
            property: property.to_string(),
            max,
        };
        self
    }

    pub fn normalized_difference(mut self, nir: &str, red: &str) -> Self {
        self.index.nir = nir.to_string();
        self.index.red = red.to_string();
        self
    }

    pub fn reduce_mean(mut self, scale: f64, max_pixels: f64) -> Self {
        self.reduction.scale = scale;
        self.reduction.max_pixels = max_pixels;
        self
    }

    /// One blocking round trip; fails without partial results
    pub async fn evaluate(&self, backend: &dyn ImageryBackend) -> Result<NdviSeries, RemoteQueryError> {
        tracing::debug!(
            "Evaluating {} over {} for {}..{}",
            self.collection_id,
            self.region.kind(),
            self.date_range.start_str(),
            self.date_range.end_str()
        );

        let raw = backend.compute(self).await?;
        let series = NdviSeries::from_feature_collection(raw)?;

        tracing::debug!("Received {} NDVI records", series.len());
        Ok(series)
    }
}
