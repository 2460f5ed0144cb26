// Application layer - Use cases and the remote imagery seam
pub mod imagery_backend;
pub mod ndvi_query;
pub mod ndvi_service;
