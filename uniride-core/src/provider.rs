use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Outcome of a best-effort enrichment call.
///
/// Providers never return `Err`: routing and geocoding exist to decorate the
/// primary workflow and must not be able to block it. `Failed` means the
/// upstream call errored and the caller should render its fallback.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    Empty,
    Failed,
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::Empty | Lookup::Failed => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Lookup::Failed)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RoutePoint {
    pub lat: f64,
    pub lng: f64,
}

/// Turns an origin/destination pair into a displayable waypoint polyline.
#[async_trait]
pub trait RoutingProvider: Send + Sync {
    async fn route(&self, origin: RoutePoint, destination: RoutePoint) -> Lookup<Vec<RoutePoint>>;
}

/// Turns a coordinate into a human-readable address.
#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    async fn reverse(&self, lat: f64, lng: f64) -> Lookup<String>;
}
