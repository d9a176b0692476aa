pub mod provider;
pub mod repository;
pub mod service;

pub use provider::{GeocodingProvider, Lookup, RoutePoint, RoutingProvider};
pub use repository::{ReservationRepository, StoreError, TripRepository};
pub use service::NegotiationService;

use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error(transparent)]
    Negotiation(#[from] uniride_domain::NegotiationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("trip not found: {0}")]
    TripNotFound(Uuid),

    #[error("reservation not found: {0}")]
    ReservationNotFound(Uuid),

    #[error("{0}")]
    Forbidden(&'static str),
}

pub type CoreResult<T> = Result<T, CoreError>;
