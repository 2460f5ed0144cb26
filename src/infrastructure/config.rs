use crate::application::ndvi_query::{
    DEFAULT_CLOUD_PROPERTY, DEFAULT_COLLECTION, DEFAULT_MAX_CLOUD, DEFAULT_MAX_PIXELS,
    DEFAULT_NIR_BAND, DEFAULT_RED_BAND, DEFAULT_SCALE_M, NdviQuery,
};
use crate::domain::date_range::DateRange;
use crate::domain::region::Region;
use serde::Deserialize;

pub const DEFAULT_EARTH_ENGINE_URL: &str = "https://earthengine.googleapis.com";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    pub earth_engine: EarthEngineSettings,
    #[serde(default)]
    pub query: QuerySettings,
    #[serde(default)]
    pub chart: ChartSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EarthEngineSettings {
    #[serde(default = "default_earth_engine_url")]
    pub base_url: String,
    pub project: String,
    #[serde(default)]
    pub access_token: String,
    /// Command printing a fresh token, e.g. `gcloud auth print-access-token`;
    /// takes precedence over `access_token`
    #[serde(default)]
    pub access_token_command: Option<String>,
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
    /// Unset means the round trip waits as long as the service takes
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct QuerySettings {
    pub collection_id: String,
    pub cloud_property: String,
    pub max_cloud_percentage: f64,
    pub nir_band: String,
    pub red_band: String,
    pub scale_m: f64,
    pub max_pixels: f64,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            collection_id: DEFAULT_COLLECTION.to_string(),
            cloud_property: DEFAULT_CLOUD_PROPERTY.to_string(),
            max_cloud_percentage: DEFAULT_MAX_CLOUD,
            nir_band: DEFAULT_NIR_BAND.to_string(),
            red_band: DEFAULT_RED_BAND.to_string(),
            scale_m: DEFAULT_SCALE_M,
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }
}

impl QuerySettings {
    pub fn build_query(&self, date_range: DateRange, region: Region) -> NdviQuery {
        NdviQuery::new(&self.collection_id, date_range, region)
            .cloud_filter(&self.cloud_property, self.max_cloud_percentage)
            .normalized_difference(&self.nir_band, &self.red_band)
            .reduce_mean(self.scale_m, self.max_pixels)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChartSettings {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 500,
            title: "NDVI Time Series".to_string(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_token_ttl_secs() -> u64 {
    // Earth Engine tokens live for an hour
    3000
}

fn default_earth_engine_url() -> String {
    DEFAULT_EARTH_ENGINE_URL.to_string()
}

/// `config/ndvi.{toml,...}` overlaid with `NDVI__SECTION__KEY` environment variables
pub fn load_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/ndvi").required(false))
        .add_source(config::Environment::with_prefix("NDVI").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}
