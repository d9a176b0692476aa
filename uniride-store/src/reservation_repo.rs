use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uniride_core::{ReservationRepository, StoreError};
use uniride_domain::{Reservation, ReservationStatus};
use uuid::Uuid;

pub struct PostgresReservationRepository {
    pub pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct ReservationRow {
    id: Uuid,
    trip_id: Uuid,
    passenger_id: Uuid,
    pickup_lat: Option<f64>,
    pickup_lng: Option<f64>,
    status: String,
    driver_seen: bool,
    passenger_seen: bool,
    version: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ReservationRow {
    fn into_domain(self) -> Result<Reservation, StoreError> {
        let status: ReservationStatus = self.status.parse().map_err(StoreError::Backend)?;
        Ok(Reservation {
            id: self.id,
            trip_id: self.trip_id,
            passenger_id: self.passenger_id,
            pickup_lat: self.pickup_lat,
            pickup_lng: self.pickup_lng,
            status,
            driver_seen: self.driver_seen,
            passenger_seen: self.passenger_seen,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_COLUMNS: &str = "id, trip_id, passenger_id, pickup_lat, pickup_lng, status, \
     driver_seen, passenger_seen, version, created_at, updated_at";

#[async_trait]
impl ReservationRepository for PostgresReservationRepository {
    async fn get(&self, id: Uuid) -> Result<Option<Reservation>, StoreError> {
        let row = sqlx::query_as::<_, ReservationRow>(&format!(
            "SELECT {} FROM reservations WHERE id = $1",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;

        row.map(ReservationRow::into_domain).transpose()
    }

    async fn find_for_trip_passenger(
        &self,
        trip_id: Uuid,
        passenger_id: Uuid,
    ) -> Result<Option<Reservation>, StoreError> {
        let row = sqlx::query_as::<_, ReservationRow>(&format!(
            "SELECT {} FROM reservations WHERE trip_id = $1 AND passenger_id = $2",
            SELECT_COLUMNS
        ))
        .bind(trip_id)
        .bind(passenger_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;

        row.map(ReservationRow::into_domain).transpose()
    }

    async fn insert(&self, reservation: &Reservation) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO reservations
                (id, trip_id, passenger_id, pickup_lat, pickup_lng, status,
                 driver_seen, passenger_seen, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (trip_id, passenger_id) DO NOTHING
            "#,
        )
        .bind(reservation.id)
        .bind(reservation.trip_id)
        .bind(reservation.passenger_id)
        .bind(reservation.pickup_lat)
        .bind(reservation.pickup_lng)
        .bind(reservation.status.as_str())
        .bind(reservation.driver_seen)
        .bind(reservation.passenger_seen)
        .bind(reservation.version)
        .bind(reservation.created_at)
        .bind(reservation.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Duplicate {
                trip_id: reservation.trip_id,
                passenger_id: reservation.passenger_id,
            });
        }
        Ok(())
    }

    async fn update_checked(
        &self,
        reservation: &Reservation,
        expected_version: i32,
    ) -> Result<(), StoreError> {
        // Single conditional write: coordinate, status, flags and version
        // land together or not at all.
        let result = sqlx::query(
            r#"
            UPDATE reservations
            SET pickup_lat = $1, pickup_lng = $2, status = $3,
                driver_seen = $4, passenger_seen = $5, version = $6, updated_at = $7
            WHERE id = $8 AND version = $9
            "#,
        )
        .bind(reservation.pickup_lat)
        .bind(reservation.pickup_lng)
        .bind(reservation.status.as_str())
        .bind(reservation.driver_seen)
        .bind(reservation.passenger_seen)
        .bind(reservation.version)
        .bind(reservation.updated_at)
        .bind(reservation.id)
        .bind(expected_version)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict(reservation.id));
        }
        Ok(())
    }

    async fn list_pending_for_trip(&self, trip_id: Uuid) -> Result<Vec<Reservation>, StoreError> {
        let rows = sqlx::query_as::<_, ReservationRow>(&format!(
            "SELECT {} FROM reservations WHERE trip_id = $1 AND status = $2 ORDER BY created_at",
            SELECT_COLUMNS
        ))
        .bind(trip_id)
        .bind(ReservationStatus::PendingDriver.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;

        rows.into_iter().map(ReservationRow::into_domain).collect()
    }
}
