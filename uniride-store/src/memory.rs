use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uniride_core::{ReservationRepository, StoreError, TripRepository};
use uniride_domain::{Reservation, ReservationStatus, Trip};
use uuid::Uuid;

/// HashMap-backed reservation store. Used by service and API tests and as a
/// development backend; mirrors the Postgres repository's semantics,
/// including the unique (trip, passenger) constraint and the
/// compare-and-swap update.
#[derive(Default)]
pub struct InMemoryReservationRepository {
    rows: RwLock<HashMap<Uuid, Reservation>>,
}

impl InMemoryReservationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }
}

#[async_trait]
impl ReservationRepository for InMemoryReservationRepository {
    async fn get(&self, id: Uuid) -> Result<Option<Reservation>, StoreError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn find_for_trip_passenger(
        &self,
        trip_id: Uuid,
        passenger_id: Uuid,
    ) -> Result<Option<Reservation>, StoreError> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .find(|r| r.trip_id == trip_id && r.passenger_id == passenger_id)
            .cloned())
    }

    async fn insert(&self, reservation: &Reservation) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;
        let duplicate = rows
            .values()
            .any(|r| r.trip_id == reservation.trip_id && r.passenger_id == reservation.passenger_id);
        if duplicate {
            return Err(StoreError::Duplicate {
                trip_id: reservation.trip_id,
                passenger_id: reservation.passenger_id,
            });
        }
        rows.insert(reservation.id, reservation.clone());
        Ok(())
    }

    async fn update_checked(
        &self,
        reservation: &Reservation,
        expected_version: i32,
    ) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(&reservation.id) {
            Some(stored) if stored.version == expected_version => {
                *stored = reservation.clone();
                Ok(())
            }
            Some(_) => Err(StoreError::Conflict(reservation.id)),
            None => Err(StoreError::NotFound(reservation.id)),
        }
    }

    async fn list_pending_for_trip(&self, trip_id: Uuid) -> Result<Vec<Reservation>, StoreError> {
        let mut pending: Vec<Reservation> = self
            .rows
            .read()
            .await
            .values()
            .filter(|r| r.trip_id == trip_id && r.status == ReservationStatus::PendingDriver)
            .cloned()
            .collect();
        pending.sort_by_key(|r| r.created_at);
        Ok(pending)
    }
}

#[derive(Default)]
pub struct InMemoryTripRepository {
    trips: RwLock<HashMap<Uuid, Trip>>,
}

impl InMemoryTripRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put_trip(&self, trip: Trip) {
        self.trips.write().await.insert(trip.id, trip);
    }
}

#[async_trait]
impl TripRepository for InMemoryTripRepository {
    async fn get_trip(&self, id: Uuid) -> Result<Option<Trip>, StoreError> {
        Ok(self.trips.read().await.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;
    use uniride_core::{CoreError, NegotiationService};
    use uniride_domain::{NegotiationError, PickupPoint};

    fn trip(driver_id: Uuid) -> Trip {
        Trip {
            id: Uuid::new_v4(),
            driver_id,
            origin_lat: 4.60,
            origin_lng: -74.08,
            origin_label: "Universidad Nacional".to_string(),
            destination_lat: 4.70,
            destination_lng: -74.04,
            destination_label: "Usaquén".to_string(),
            departs_at: Utc::now(),
            seats_available: 3,
        }
    }

    fn point(lat: f64, lng: f64) -> PickupPoint {
        PickupPoint::new(lat, lng).unwrap()
    }

    async fn setup() -> (
        NegotiationService,
        Arc<InMemoryReservationRepository>,
        Trip,
        Uuid,
    ) {
        let reservations = Arc::new(InMemoryReservationRepository::new());
        let trips = Arc::new(InMemoryTripRepository::new());
        let driver_id = Uuid::new_v4();
        let trip = trip(driver_id);
        trips.put_trip(trip.clone()).await;
        let service = NegotiationService::new(reservations.clone(), trips);
        (service, reservations, trip, driver_id)
    }

    #[tokio::test]
    async fn test_request_twice_yields_single_row_second_wins() {
        let (service, reservations, trip, _) = setup().await;
        let passenger_id = Uuid::new_v4();

        let first = service
            .request_pickup(trip.id, passenger_id, point(4.65, -74.05))
            .await
            .unwrap();
        let second = service
            .request_pickup(trip.id, passenger_id, point(4.67, -74.07))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(reservations.len().await, 1);
        let stored = reservations.get(first.id).await.unwrap().unwrap();
        assert_eq!(stored.pickup().unwrap(), point(4.67, -74.07));
        assert_eq!(stored.status, ReservationStatus::PendingDriver);
    }

    #[tokio::test]
    async fn test_accept_is_idempotent_through_service() {
        let (service, _, trip, driver_id) = setup().await;
        let passenger_id = Uuid::new_v4();
        let r = service
            .request_pickup(trip.id, passenger_id, point(4.65, -74.05))
            .await
            .unwrap();

        service.accept(r.id, driver_id).await.unwrap();
        let again = service.accept(r.id, driver_id).await.unwrap();
        assert_eq!(again.status, ReservationStatus::DriverAccepted);
    }

    #[tokio::test]
    async fn test_negotiation_scenario_counter_then_confirm() {
        let (service, reservations, trip, driver_id) = setup().await;
        let passenger_id = Uuid::new_v4();

        let r = service
            .request_pickup(trip.id, passenger_id, point(4.65, -74.05))
            .await
            .unwrap();
        assert_eq!(r.status, ReservationStatus::PendingDriver);

        let countered = service
            .counter_propose(r.id, driver_id, point(4.66, -74.06))
            .await
            .unwrap();
        assert_eq!(countered.status, ReservationStatus::CounterProposed);
        assert_eq!(countered.pickup().unwrap(), point(4.66, -74.06));

        service.confirm(r.id, passenger_id).await.unwrap();

        let final_state = reservations.get(r.id).await.unwrap().unwrap();
        assert_eq!(final_state.status, ReservationStatus::Confirmed);
        assert_eq!(final_state.pickup().unwrap(), point(4.66, -74.06));
    }

    #[tokio::test]
    async fn test_cancel_is_terminal_through_service() {
        let (service, _, trip, driver_id) = setup().await;
        let passenger_id = Uuid::new_v4();
        let r = service
            .request_pickup(trip.id, passenger_id, point(4.65, -74.05))
            .await
            .unwrap();

        service.cancel(r.id, passenger_id).await.unwrap();

        let err = service.accept(r.id, driver_id).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::Negotiation(NegotiationError::InvalidTransition { .. })
        ));
        let err = service
            .counter_propose(r.id, driver_id, point(4.66, -74.06))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Negotiation(NegotiationError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_concurrent_driver_writes_second_conflicts() {
        // Two sessions act on the same snapshot: the accept lands, the
        // stale counter-proposal is told about the conflict instead of
        // silently clobbering.
        let (service, reservations, trip, _) = setup().await;
        let passenger_id = Uuid::new_v4();
        let r = service
            .request_pickup(trip.id, passenger_id, point(4.65, -74.05))
            .await
            .unwrap();

        let mut session_a = reservations.get(r.id).await.unwrap().unwrap();
        let mut session_b = session_a.clone();
        let expected = session_a.version;

        session_a.driver_accept().unwrap();
        reservations
            .update_checked(&session_a, expected)
            .await
            .unwrap();

        session_b.driver_counter(point(4.66, -74.06)).unwrap();
        let err = reservations
            .update_checked(&session_b, expected)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(id) if id == r.id));

        let stored = reservations.get(r.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ReservationStatus::DriverAccepted);
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let (_, reservations, trip, _) = setup().await;
        let passenger_id = Uuid::new_v4();
        let a = Reservation::new(trip.id, passenger_id, point(4.65, -74.05));
        let b = Reservation::new(trip.id, passenger_id, point(4.66, -74.06));

        reservations.insert(&a).await.unwrap();
        let err = reservations.insert(&b).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn test_pending_queue_lists_only_pending_for_owner() {
        let (service, _, trip, driver_id) = setup().await;
        let pax_a = Uuid::new_v4();
        let pax_b = Uuid::new_v4();

        let a = service
            .request_pickup(trip.id, pax_a, point(4.65, -74.05))
            .await
            .unwrap();
        service
            .request_pickup(trip.id, pax_b, point(4.64, -74.04))
            .await
            .unwrap();
        service.accept(a.id, driver_id).await.unwrap();

        let pending = service.pending_for_trip(trip.id, driver_id).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].passenger_id, pax_b);

        // Someone else's driver id is rejected
        let err = service
            .pending_for_trip(trip.id, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_passenger_cannot_confirm_someone_elses_reservation() {
        let (service, _, trip, driver_id) = setup().await;
        let passenger_id = Uuid::new_v4();
        let r = service
            .request_pickup(trip.id, passenger_id, point(4.65, -74.05))
            .await
            .unwrap();
        service.accept(r.id, driver_id).await.unwrap();

        let err = service.confirm(r.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_request_for_unknown_trip_fails_preflight() {
        let (service, reservations, _, _) = setup().await;
        let err = service
            .request_pickup(Uuid::new_v4(), Uuid::new_v4(), point(4.65, -74.05))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::TripNotFound(_)));
        assert_eq!(reservations.len().await, 0);
    }
}
