use std::sync::Arc;
use uniride_core::{GeocodingProvider, NegotiationService, RoutingProvider};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    pub service: NegotiationService,
    pub routing: Arc<dyn RoutingProvider>,
    pub geocoding: Arc<dyn GeocodingProvider>,
    pub auth: AuthConfig,
}
