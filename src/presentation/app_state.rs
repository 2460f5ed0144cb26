// Application state for HTTP handlers
use crate::application::ndvi_service::NdviService;

#[derive(Clone)]
pub struct AppState {
    pub ndvi_service: NdviService,
}
