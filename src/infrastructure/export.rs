// Export errors shared by the CSV and chart writers
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write CSV")]
    Csv(#[from] csv::Error),

    #[error("failed to draw chart: {0}")]
    Chart(String),

    #[error("failed to encode PNG")]
    Encode(#[from] image::ImageError),
}
