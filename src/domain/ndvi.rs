// NDVI time series domain models
use crate::domain::date_range::DATE_FORMAT;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("unexpected response shape: {0}")]
    Shape(#[from] serde_json::Error),

    #[error("feature {index} has invalid date '{value}'")]
    Date { index: usize, value: String },
}

/// One observation: acquisition date and the region mean, `None` when the
/// reduction had no valid pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct NdviRecord {
    pub date: NaiveDate,
    pub ndvi: Option<f64>,
}

impl NdviRecord {
    pub fn new(date: NaiveDate, ndvi: Option<f64>) -> Self {
        Self { date, ndvi }
    }

    pub fn date_str(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    pub fn month_str(&self) -> String {
        self.date.format("%Y-%m").to_string()
    }
}

#[derive(Debug, Deserialize)]
struct FeatureCollectionWire {
    features: Vec<FeatureWire>,
}

#[derive(Debug, Deserialize)]
struct FeatureWire {
    properties: PropertiesWire,
}

#[derive(Debug, Deserialize)]
struct PropertiesWire {
    date: String,
    // Earth Engine drops null-valued properties
    #[serde(default)]
    ndvi: Option<f64>,
}

/// Records in the order the remote service returned them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NdviSeries {
    pub records: Vec<NdviRecord>,
}

impl NdviSeries {
    pub fn new(records: Vec<NdviRecord>) -> Self {
        Self { records }
    }

    /// Strict parse of `{ "features": [ { "properties": { "date", "ndvi" } } ] }`
    pub fn from_feature_collection(value: serde_json::Value) -> Result<Self, SchemaError> {
        let wire: FeatureCollectionWire = serde_json::from_value(value)?;

        let records = wire
            .features
            .into_iter()
            .enumerate()
            .map(|(index, feature)| {
                let PropertiesWire { date, ndvi } = feature.properties;
                NaiveDate::parse_from_str(&date, DATE_FORMAT)
                    .map(|d| NdviRecord::new(d, ndvi))
                    .map_err(|_| SchemaError::Date { index, value: date })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(records))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn dates(&self) -> Vec<String> {
        self.records.iter().map(NdviRecord::date_str).collect()
    }

    pub fn values(&self) -> Vec<Option<f64>> {
        self.records.iter().map(|r| r.ndvi).collect()
    }

    /// Distinct `YYYY-MM` prefixes in first-occurrence order
    pub fn month_ticks(&self) -> Vec<String> {
        let mut months: Vec<String> = Vec::new();
        for record in &self.records {
            let month = record.month_str();
            if !months.contains(&month) {
                months.push(month);
            }
        }
        months
    }

    pub fn to_chart(&self) -> NdviChart {
        NdviChart {
            dates: self.dates(),
            values: self.values(),
            month_ticks: self.month_ticks(),
        }
    }
}

/// Chart-ready parallel sequences
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NdviChart {
    pub dates: Vec<String>,
    pub values: Vec<Option<f64>>,
    pub month_ticks: Vec<String>,
}
