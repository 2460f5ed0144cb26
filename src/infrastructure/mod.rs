// Infrastructure layer - External dependencies and adapters
pub mod access_token;
pub mod chart_png;
pub mod config;
pub mod csv_export;
pub mod earth_engine;
pub mod ee_expression;
pub mod export;
pub mod http_response;
