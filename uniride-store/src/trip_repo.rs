use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uniride_core::{StoreError, TripRepository};
use uniride_domain::Trip;
use uuid::Uuid;

pub struct PostgresTripRepository {
    pub pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct TripRow {
    id: Uuid,
    driver_id: Uuid,
    origin_lat: f64,
    origin_lng: f64,
    origin_label: String,
    destination_lat: f64,
    destination_lng: f64,
    destination_label: String,
    departs_at: DateTime<Utc>,
    seats_available: i32,
}

impl From<TripRow> for Trip {
    fn from(row: TripRow) -> Self {
        Trip {
            id: row.id,
            driver_id: row.driver_id,
            origin_lat: row.origin_lat,
            origin_lng: row.origin_lng,
            origin_label: row.origin_label,
            destination_lat: row.destination_lat,
            destination_lng: row.destination_lng,
            destination_label: row.destination_label,
            departs_at: row.departs_at,
            seats_available: row.seats_available,
        }
    }
}

#[async_trait]
impl TripRepository for PostgresTripRepository {
    async fn get_trip(&self, id: Uuid) -> Result<Option<Trip>, StoreError> {
        let row = sqlx::query_as::<_, TripRow>(
            r#"
            SELECT id, driver_id, origin_lat, origin_lng, origin_label,
                   destination_lat, destination_lng, destination_label,
                   departs_at, seats_available
            FROM trips WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(row.map(Trip::from))
    }
}
