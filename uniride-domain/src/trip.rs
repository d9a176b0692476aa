use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A published trip. Read-only collaborator of the negotiation flow: it
/// supplies the driver identity for authorization and the origin/destination
/// context rendered around the pickup map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    pub id: Uuid,
    pub driver_id: Uuid,
    pub origin_lat: f64,
    pub origin_lng: f64,
    pub origin_label: String,
    pub destination_lat: f64,
    pub destination_lng: f64,
    pub destination_label: String,
    pub departs_at: DateTime<Utc>,
    pub seats_available: i32,
}
