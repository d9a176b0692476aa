use std::sync::Arc;

use tracing::info;
use uniride_domain::{PickupPoint, Reservation, Trip};
use uuid::Uuid;

use crate::repository::{ReservationRepository, TripRepository};
use crate::{CoreError, CoreResult};

/// Orchestrates pickup negotiation: load the row, run the pure transition,
/// persist with a conditional write.
///
/// Actor identity comes in explicitly on every call (no ambient current
/// user) and is re-checked against the loaded rows: driver operations must
/// come from the trip's driver, passenger operations from the reservation's
/// passenger.
#[derive(Clone)]
pub struct NegotiationService {
    reservations: Arc<dyn ReservationRepository>,
    trips: Arc<dyn TripRepository>,
}

impl NegotiationService {
    pub fn new(
        reservations: Arc<dyn ReservationRepository>,
        trips: Arc<dyn TripRepository>,
    ) -> Self {
        Self {
            reservations,
            trips,
        }
    }

    /// Passenger requests (or re-requests) a pickup point for a trip.
    /// Upsert: at most one reservation per (trip, passenger); an existing
    /// row is reset to `pending_driver` with the new coordinate.
    pub async fn request_pickup(
        &self,
        trip_id: Uuid,
        passenger_id: Uuid,
        point: PickupPoint,
    ) -> CoreResult<Reservation> {
        self.load_trip(trip_id).await?;

        match self
            .reservations
            .find_for_trip_passenger(trip_id, passenger_id)
            .await?
        {
            Some(mut reservation) => {
                let expected = reservation.version;
                reservation.request_pickup(point)?;
                self.reservations
                    .update_checked(&reservation, expected)
                    .await?;
                info!(reservation_id = %reservation.id, %trip_id, "pickup re-requested");
                Ok(reservation)
            }
            None => {
                let reservation = Reservation::new(trip_id, passenger_id, point);
                self.reservations.insert(&reservation).await?;
                info!(reservation_id = %reservation.id, %trip_id, "pickup requested");
                Ok(reservation)
            }
        }
    }

    /// Driver accepts the passenger's pickup as-is. Idempotent.
    pub async fn accept(&self, reservation_id: Uuid, driver_id: Uuid) -> CoreResult<Reservation> {
        let mut reservation = self.load_reservation(reservation_id).await?;
        self.require_trip_driver(reservation.trip_id, driver_id)
            .await?;

        let expected = reservation.version;
        reservation.driver_accept()?;
        // Idempotent no-op accept issues no write
        if reservation.version != expected {
            self.reservations
                .update_checked(&reservation, expected)
                .await?;
            info!(%reservation_id, "pickup accepted by driver");
        }
        Ok(reservation)
    }

    /// Driver proposes an alternate pickup coordinate. Coordinate and status
    /// land in one conditional write.
    pub async fn counter_propose(
        &self,
        reservation_id: Uuid,
        driver_id: Uuid,
        point: PickupPoint,
    ) -> CoreResult<Reservation> {
        let mut reservation = self.load_reservation(reservation_id).await?;
        self.require_trip_driver(reservation.trip_id, driver_id)
            .await?;

        let expected = reservation.version;
        reservation.driver_counter(point)?;
        self.reservations
            .update_checked(&reservation, expected)
            .await?;
        info!(%reservation_id, lat = point.lat, lng = point.lng, "driver counter-proposed pickup");
        Ok(reservation)
    }

    /// Passenger finalizes the negotiated pickup.
    pub async fn confirm(
        &self,
        reservation_id: Uuid,
        passenger_id: Uuid,
    ) -> CoreResult<Reservation> {
        let mut reservation = self.load_reservation(reservation_id).await?;
        Self::require_passenger(&reservation, passenger_id)?;

        let expected = reservation.version;
        reservation.passenger_confirm()?;
        self.reservations
            .update_checked(&reservation, expected)
            .await?;
        info!(%reservation_id, "pickup confirmed by passenger");
        Ok(reservation)
    }

    /// Passenger cancels. The row stays, status becomes terminal.
    pub async fn cancel(
        &self,
        reservation_id: Uuid,
        passenger_id: Uuid,
    ) -> CoreResult<Reservation> {
        let mut reservation = self.load_reservation(reservation_id).await?;
        Self::require_passenger(&reservation, passenger_id)?;

        let expected = reservation.version;
        reservation.passenger_cancel()?;
        self.reservations
            .update_checked(&reservation, expected)
            .await?;
        info!(%reservation_id, "reservation cancelled by passenger");
        Ok(reservation)
    }

    /// Reservation plus its trip, visible to the passenger and the trip's
    /// driver only.
    pub async fn view(
        &self,
        reservation_id: Uuid,
        actor_id: Uuid,
    ) -> CoreResult<(Reservation, Trip)> {
        let reservation = self.load_reservation(reservation_id).await?;
        let trip = self.load_trip(reservation.trip_id).await?;

        if actor_id != reservation.passenger_id && actor_id != trip.driver_id {
            return Err(CoreError::Forbidden(
                "reservation is only visible to its passenger and driver",
            ));
        }
        Ok((reservation, trip))
    }

    /// The driver review queue: reservations still awaiting a decision on
    /// one of the caller's trips.
    pub async fn pending_for_trip(
        &self,
        trip_id: Uuid,
        driver_id: Uuid,
    ) -> CoreResult<Vec<Reservation>> {
        self.require_trip_driver(trip_id, driver_id).await?;
        Ok(self.reservations.list_pending_for_trip(trip_id).await?)
    }

    async fn load_reservation(&self, id: Uuid) -> CoreResult<Reservation> {
        self.reservations
            .get(id)
            .await?
            .ok_or(CoreError::ReservationNotFound(id))
    }

    async fn load_trip(&self, id: Uuid) -> CoreResult<Trip> {
        self.trips
            .get_trip(id)
            .await?
            .ok_or(CoreError::TripNotFound(id))
    }

    async fn require_trip_driver(&self, trip_id: Uuid, driver_id: Uuid) -> CoreResult<Trip> {
        let trip = self.load_trip(trip_id).await?;
        if trip.driver_id != driver_id {
            return Err(CoreError::Forbidden("caller does not drive this trip"));
        }
        Ok(trip)
    }

    fn require_passenger(reservation: &Reservation, passenger_id: Uuid) -> CoreResult<()> {
        if reservation.passenger_id != passenger_id {
            return Err(CoreError::Forbidden(
                "caller is not the reservation's passenger",
            ));
        }
        Ok(())
    }
}
