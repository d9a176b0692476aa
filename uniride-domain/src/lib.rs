pub mod negotiation;
pub mod reservation;
pub mod trip;

pub use negotiation::NegotiationError;
pub use reservation::{PickupPoint, Reservation, ReservationStatus};
pub use trip::Trip;
