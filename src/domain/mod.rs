// Domain layer - Core data types for NDVI time series
pub mod artifact;
pub mod date_range;
pub mod ndvi;
pub mod region;
