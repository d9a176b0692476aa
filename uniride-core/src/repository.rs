use async_trait::async_trait;
use uniride_domain::{Reservation, Trip};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("reservation not found: {0}")]
    NotFound(Uuid),

    /// A conditional write missed its expected version: another writer got
    /// there first. Callers surface this instead of silently clobbering.
    #[error("concurrent update conflict on reservation {0}")]
    Conflict(Uuid),

    #[error("reservation already exists for trip {trip_id} and passenger {passenger_id}")]
    Duplicate { trip_id: Uuid, passenger_id: Uuid },

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Persistence adapter for reservation rows.
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Reservation>, StoreError>;

    /// The at-most-one-per-(trip, passenger) lookup backing the upsert.
    async fn find_for_trip_passenger(
        &self,
        trip_id: Uuid,
        passenger_id: Uuid,
    ) -> Result<Option<Reservation>, StoreError>;

    async fn insert(&self, reservation: &Reservation) -> Result<(), StoreError>;

    /// Writes the full row iff the stored version still equals
    /// `expected_version` (compare-and-swap). `Conflict` otherwise.
    async fn update_checked(
        &self,
        reservation: &Reservation,
        expected_version: i32,
    ) -> Result<(), StoreError>;

    /// Reservations awaiting a driver decision on `trip_id`, oldest first.
    async fn list_pending_for_trip(&self, trip_id: Uuid) -> Result<Vec<Reservation>, StoreError>;
}

/// Read-only trip lookup consumed by the negotiation flow.
#[async_trait]
pub trait TripRepository: Send + Sync {
    async fn get_trip(&self, id: Uuid) -> Result<Option<Trip>, StoreError>;
}
