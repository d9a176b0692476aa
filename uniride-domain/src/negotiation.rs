use crate::reservation::{PickupPoint, Reservation, ReservationStatus};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum NegotiationError {
    #[error("invalid pickup coordinate ({lat}, {lng})")]
    InvalidCoordinate { lat: f64, lng: f64 },

    #[error("invalid state transition from {from} to {to}")]
    InvalidTransition {
        from: ReservationStatus,
        to: ReservationStatus,
    },
}

/// Pickup negotiation state machine.
///
/// ```text
/// pending_driver -> { confirmada, counter_proposed } -> { confirmed, cancelled }
/// ```
///
/// `counter_proposed` may loop on itself (the driver can re-propose
/// indefinitely). `confirmed` and `cancelled` are terminal; the only way out
/// of `cancelled` is a fresh `request_pickup`, which starts a new round.
impl Reservation {
    /// Passenger (re-)requests a pickup at `point`. Overwrites the
    /// coordinate, resets status to `pending_driver` and clears both seen
    /// flags. Rejected once the reservation is confirmed.
    pub fn request_pickup(&mut self, point: PickupPoint) -> Result<(), NegotiationError> {
        if self.status == ReservationStatus::Confirmed {
            return Err(NegotiationError::InvalidTransition {
                from: self.status,
                to: ReservationStatus::PendingDriver,
            });
        }
        self.pickup_lat = Some(point.lat);
        self.pickup_lng = Some(point.lng);
        self.status = ReservationStatus::PendingDriver;
        self.driver_seen = false;
        self.passenger_seen = false;
        self.touch();
        Ok(())
    }

    /// Driver accepts the passenger's pickup as-is. Idempotent: accepting an
    /// already-accepted reservation succeeds without issuing a change.
    pub fn driver_accept(&mut self) -> Result<(), NegotiationError> {
        match self.status {
            ReservationStatus::DriverAccepted => Ok(()),
            ReservationStatus::PendingDriver => {
                self.status = ReservationStatus::DriverAccepted;
                self.driver_seen = true;
                self.touch();
                Ok(())
            }
            from => Err(NegotiationError::InvalidTransition {
                from,
                to: ReservationStatus::DriverAccepted,
            }),
        }
    }

    /// Driver proposes an alternate pickup. Coordinate and status change in
    /// the same mutation so they can never be observed diverged.
    pub fn driver_counter(&mut self, point: PickupPoint) -> Result<(), NegotiationError> {
        match self.status {
            ReservationStatus::PendingDriver | ReservationStatus::CounterProposed => {
                self.pickup_lat = Some(point.lat);
                self.pickup_lng = Some(point.lng);
                self.status = ReservationStatus::CounterProposed;
                self.driver_seen = true;
                self.touch();
                Ok(())
            }
            from => Err(NegotiationError::InvalidTransition {
                from,
                to: ReservationStatus::CounterProposed,
            }),
        }
    }

    /// Passenger finalizes the negotiated pickup. Terminal success state.
    pub fn passenger_confirm(&mut self) -> Result<(), NegotiationError> {
        match self.status {
            ReservationStatus::DriverAccepted | ReservationStatus::CounterProposed => {
                self.status = ReservationStatus::Confirmed;
                self.passenger_seen = true;
                self.touch();
                Ok(())
            }
            from => Err(NegotiationError::InvalidTransition {
                from,
                to: ReservationStatus::Confirmed,
            }),
        }
    }

    /// Passenger backs out. Terminal failure state; the row is kept, never
    /// deleted.
    pub fn passenger_cancel(&mut self) -> Result<(), NegotiationError> {
        if self.status.is_terminal() {
            return Err(NegotiationError::InvalidTransition {
                from: self.status,
                to: ReservationStatus::Cancelled,
            });
        }
        self.status = ReservationStatus::Cancelled;
        self.passenger_seen = true;
        self.touch();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn point(lat: f64, lng: f64) -> PickupPoint {
        PickupPoint::new(lat, lng).unwrap()
    }

    fn fresh() -> Reservation {
        Reservation::new(Uuid::new_v4(), Uuid::new_v4(), point(4.65, -74.05))
    }

    #[test]
    fn test_full_negotiation_lifecycle() {
        let mut r = fresh();
        assert_eq!(r.status, ReservationStatus::PendingDriver);
        assert_eq!(r.pickup().unwrap(), point(4.65, -74.05));

        // Driver counters with an alternate corner
        r.driver_counter(point(4.66, -74.06)).unwrap();
        assert_eq!(r.status, ReservationStatus::CounterProposed);
        assert_eq!(r.pickup().unwrap(), point(4.66, -74.06));
        assert!(r.driver_seen);

        // Passenger takes the counter
        r.passenger_confirm().unwrap();
        assert_eq!(r.status, ReservationStatus::Confirmed);
        assert_eq!(r.pickup().unwrap(), point(4.66, -74.06));
        assert!(r.passenger_seen);
    }

    #[test]
    fn test_accept_then_confirm() {
        let mut r = fresh();
        r.driver_accept().unwrap();
        assert_eq!(r.status, ReservationStatus::DriverAccepted);
        // Coordinate untouched by accept
        assert_eq!(r.pickup().unwrap(), point(4.65, -74.05));
        r.passenger_confirm().unwrap();
        assert_eq!(r.status, ReservationStatus::Confirmed);
    }

    #[test]
    fn test_accept_is_idempotent() {
        let mut r = fresh();
        r.driver_accept().unwrap();
        let version = r.version;
        r.driver_accept().unwrap();
        assert_eq!(r.status, ReservationStatus::DriverAccepted);
        // No-op accept issues no new version
        assert_eq!(r.version, version);
    }

    #[test]
    fn test_counter_updates_coordinate_and_status_together() {
        let mut r = fresh();
        r.driver_counter(point(4.70, -74.10)).unwrap();
        assert_eq!(r.status, ReservationStatus::CounterProposed);
        assert_eq!(r.pickup().unwrap(), point(4.70, -74.10));

        // Re-proposal loops are allowed
        r.driver_counter(point(4.71, -74.11)).unwrap();
        assert_eq!(r.status, ReservationStatus::CounterProposed);
        assert_eq!(r.pickup().unwrap(), point(4.71, -74.11));
    }

    #[test]
    fn test_cancel_is_terminal() {
        let mut r = fresh();
        r.passenger_cancel().unwrap();
        assert_eq!(r.status, ReservationStatus::Cancelled);

        assert!(r.driver_accept().is_err());
        assert!(r.driver_counter(point(4.66, -74.06)).is_err());
        assert!(r.passenger_confirm().is_err());
        assert!(r.passenger_cancel().is_err());
        assert_eq!(r.status, ReservationStatus::Cancelled);
    }

    #[test]
    fn test_rerequest_after_cancel_starts_new_round() {
        let mut r = fresh();
        r.passenger_cancel().unwrap();

        r.request_pickup(point(4.68, -74.08)).unwrap();
        assert_eq!(r.status, ReservationStatus::PendingDriver);
        assert_eq!(r.pickup().unwrap(), point(4.68, -74.08));
        assert!(!r.driver_seen);
        assert!(!r.passenger_seen);
    }

    #[test]
    fn test_rerequest_after_confirm_is_rejected() {
        let mut r = fresh();
        r.driver_accept().unwrap();
        r.passenger_confirm().unwrap();

        let err = r.request_pickup(point(4.68, -74.08)).unwrap_err();
        assert_eq!(
            err,
            NegotiationError::InvalidTransition {
                from: ReservationStatus::Confirmed,
                to: ReservationStatus::PendingDriver,
            }
        );
    }

    #[test]
    fn test_confirm_requires_driver_action_first() {
        let mut r = fresh();
        let result = r.passenger_confirm();
        assert!(result.is_err());
        assert_eq!(r.status, ReservationStatus::PendingDriver);
    }

    #[test]
    fn test_invalid_coordinate_rejected() {
        assert!(PickupPoint::new(91.0, 0.0).is_err());
        assert!(PickupPoint::new(0.0, -181.0).is_err());
        assert!(PickupPoint::new(f64::NAN, 0.0).is_err());
        assert!(PickupPoint::new(4.65, -74.05).is_ok());
    }

    #[test]
    fn test_status_tokens_round_trip() {
        for status in [
            ReservationStatus::PendingDriver,
            ReservationStatus::DriverAccepted,
            ReservationStatus::CounterProposed,
            ReservationStatus::Confirmed,
            ReservationStatus::Cancelled,
        ] {
            let parsed: ReservationStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
        // Legacy Spanish token maps to the accepted state
        assert_eq!(
            "confirmada".parse::<ReservationStatus>().unwrap(),
            ReservationStatus::DriverAccepted
        );
    }
}
