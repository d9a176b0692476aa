use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uniride_core::RoutePoint;
use uniride_domain::{PickupPoint, Reservation, Trip};
use uuid::Uuid;

use crate::auth::Session;
use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/trips/{trip_id}/pickup", post(request_pickup))
        .route(
            "/v1/trips/{trip_id}/reservations/pending",
            get(pending_reservations),
        )
        .route("/v1/reservations/{id}", get(view_reservation))
        .route("/v1/reservations/{id}/accept", post(accept_pickup))
        .route("/v1/reservations/{id}/counter", post(counter_pickup))
        .route("/v1/reservations/{id}/confirm", post(confirm_pickup))
        .route("/v1/reservations/{id}/cancel", post(cancel_reservation))
}

#[derive(Debug, Deserialize)]
struct CoordinateRequest {
    lat: Option<f64>,
    lng: Option<f64>,
}

impl CoordinateRequest {
    /// Pre-flight validation: reject before any write is attempted.
    fn into_point(self) -> Result<PickupPoint, AppError> {
        let (Some(lat), Some(lng)) = (self.lat, self.lng) else {
            return Err(AppError::ValidationError(
                "a pickup coordinate must be selected".to_string(),
            ));
        };
        Ok(PickupPoint::new(lat, lng)?)
    }
}

/// Reservation plus everything the pickup map needs: trip context, a
/// best-effort route polyline and a best-effort pickup address. Route and
/// address are null when the providers degrade; the coordinates are always
/// present for the client to fall back on.
#[derive(Debug, Serialize)]
struct ReservationView {
    #[serde(flatten)]
    reservation: Reservation,
    trip: Trip,
    route: Option<Vec<RoutePoint>>,
    pickup_address: Option<String>,
}

async fn request_pickup(
    State(state): State<AppState>,
    session: Session,
    Path(trip_id): Path<Uuid>,
    Json(req): Json<CoordinateRequest>,
) -> Result<Json<Reservation>, AppError> {
    let point = req.into_point()?;
    let reservation = state
        .service
        .request_pickup(trip_id, session.user_id, point)
        .await?;
    Ok(Json(reservation))
}

async fn pending_reservations(
    State(state): State<AppState>,
    session: Session,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<Vec<Reservation>>, AppError> {
    let pending = state
        .service
        .pending_for_trip(trip_id, session.user_id)
        .await?;
    Ok(Json(pending))
}

async fn view_reservation(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<ReservationView>, AppError> {
    let (reservation, trip) = state.service.view(id, session.user_id).await?;

    let route = state
        .routing
        .route(
            RoutePoint {
                lat: trip.origin_lat,
                lng: trip.origin_lng,
            },
            RoutePoint {
                lat: trip.destination_lat,
                lng: trip.destination_lng,
            },
        )
        .await;
    if route.is_failed() {
        warn!(reservation_id = %id, "route lookup degraded, rendering without polyline");
    }

    let pickup_address = match reservation.pickup() {
        Some(point) => state.geocoding.reverse(point.lat, point.lng).await.found(),
        None => None,
    };

    Ok(Json(ReservationView {
        reservation,
        trip,
        route: route.found(),
        pickup_address,
    }))
}

async fn accept_pickup(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<Reservation>, AppError> {
    let reservation = state.service.accept(id, session.user_id).await?;
    Ok(Json(reservation))
}

async fn counter_pickup(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(req): Json<CoordinateRequest>,
) -> Result<Json<Reservation>, AppError> {
    let point = req.into_point()?;
    let reservation = state
        .service
        .counter_propose(id, session.user_id, point)
        .await?;
    Ok(Json(reservation))
}

async fn confirm_pickup(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<Reservation>, AppError> {
    let reservation = state.service.confirm(id, session.user_id).await?;
    Ok(Json(reservation))
}

async fn cancel_reservation(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<Reservation>, AppError> {
    let reservation = state.service.cancel(id, session.user_id).await?;
    Ok(Json(reservation))
}
