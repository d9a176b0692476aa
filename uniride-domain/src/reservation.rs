use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::negotiation::NegotiationError;

/// Reservation lifecycle status.
///
/// Wire and database tokens are kept exactly as the mobile clients already
/// send them, including the Spanish `confirmada` for the driver-accepted
/// state. Only the Rust-side names are unified.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReservationStatus {
    #[serde(rename = "pending_driver")]
    PendingDriver,
    #[serde(rename = "confirmada")]
    DriverAccepted,
    #[serde(rename = "counter_proposed")]
    CounterProposed,
    #[serde(rename = "confirmed")]
    Confirmed,
    #[serde(rename = "cancelled")]
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::PendingDriver => "pending_driver",
            ReservationStatus::DriverAccepted => "confirmada",
            ReservationStatus::CounterProposed => "counter_proposed",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal states admit no further accept/counter/confirm/cancel.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReservationStatus::Confirmed | ReservationStatus::Cancelled
        )
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending_driver" => Ok(ReservationStatus::PendingDriver),
            "confirmada" => Ok(ReservationStatus::DriverAccepted),
            "counter_proposed" => Ok(ReservationStatus::CounterProposed),
            "confirmed" => Ok(ReservationStatus::Confirmed),
            "cancelled" => Ok(ReservationStatus::Cancelled),
            other => Err(format!("unknown reservation status: {}", other)),
        }
    }
}

/// A validated pickup coordinate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PickupPoint {
    pub lat: f64,
    pub lng: f64,
}

impl PickupPoint {
    pub fn new(lat: f64, lng: f64) -> Result<Self, NegotiationError> {
        if !lat.is_finite() || !lng.is_finite() || lat.abs() > 90.0 || lng.abs() > 180.0 {
            return Err(NegotiationError::InvalidCoordinate { lat, lng });
        }
        Ok(Self { lat, lng })
    }
}

/// A passenger's request to join a trip, carrying the negotiable pickup
/// coordinate. At most one row exists per (trip_id, passenger_id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub passenger_id: Uuid,
    pub pickup_lat: Option<f64>,
    pub pickup_lng: Option<f64>,
    pub status: ReservationStatus,
    pub driver_seen: bool,
    pub passenger_seen: bool,
    /// Optimistic-concurrency token; every persisted mutation is a
    /// compare-and-swap against this value.
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    pub fn new(trip_id: Uuid, passenger_id: Uuid, pickup: PickupPoint) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            trip_id,
            passenger_id,
            pickup_lat: Some(pickup.lat),
            pickup_lng: Some(pickup.lng),
            status: ReservationStatus::PendingDriver,
            driver_seen: false,
            passenger_seen: false,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn pickup(&self) -> Option<PickupPoint> {
        match (self.pickup_lat, self.pickup_lng) {
            (Some(lat), Some(lng)) => Some(PickupPoint { lat, lng }),
            _ => None,
        }
    }

    pub(crate) fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }
}
