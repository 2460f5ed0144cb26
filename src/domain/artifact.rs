// Downloadable artifact produced from a time series

pub const CSV_FILE_NAME: &str = "ndvi_time_series.csv";
pub const PNG_FILE_NAME: &str = "ndvi_time_series.png";

#[derive(Debug, Clone)]
pub struct Artifact {
    pub file_name: &'static str,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn csv(bytes: Vec<u8>) -> Self {
        Self {
            file_name: CSV_FILE_NAME,
            content_type: "text/csv; charset=utf-8",
            bytes,
        }
    }

    pub fn png(bytes: Vec<u8>) -> Self {
        Self {
            file_name: PNG_FILE_NAME,
            content_type: "image/png",
            bytes,
        }
    }
}
