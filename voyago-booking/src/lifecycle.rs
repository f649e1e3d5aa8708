use chrono::Utc;
use uuid::Uuid;
use voyago_core::booking::{Booking, BookingStatus, HistoryEntry};

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

/// Validates a booking status transition.
///
/// Pending bookings can confirm, cancel, or expire. Confirmed bookings
/// can only cancel. Cancelled and expired are terminal.
pub fn check_transition(from: BookingStatus, to: BookingStatus) -> Result<(), LifecycleError> {
    use BookingStatus::*;
    let allowed = matches!(
        (from, to),
        (Pending, Confirmed) | (Pending, Cancelled) | (Pending, Expired) | (Confirmed, Cancelled)
    );
    if allowed {
        Ok(())
    } else {
        Err(LifecycleError::InvalidTransition {
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        })
    }
}

/// Audit trail entry for a validated transition.
pub fn history_entry(
    booking: &Booking,
    to: BookingStatus,
    note: Option<String>,
) -> HistoryEntry {
    HistoryEntry {
        id: Uuid::new_v4(),
        booking_id: booking.id,
        from_status: Some(booking.status),
        to_status: to,
        note,
        recorded_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_transitions() {
        assert!(check_transition(BookingStatus::Pending, BookingStatus::Confirmed).is_ok());
        assert!(check_transition(BookingStatus::Pending, BookingStatus::Cancelled).is_ok());
        assert!(check_transition(BookingStatus::Pending, BookingStatus::Expired).is_ok());
    }

    #[test]
    fn test_confirmed_can_only_cancel() {
        assert!(check_transition(BookingStatus::Confirmed, BookingStatus::Cancelled).is_ok());
        assert!(check_transition(BookingStatus::Confirmed, BookingStatus::Expired).is_err());
        assert!(check_transition(BookingStatus::Confirmed, BookingStatus::Pending).is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(check_transition(BookingStatus::Cancelled, BookingStatus::Confirmed).is_err());
        assert!(check_transition(BookingStatus::Expired, BookingStatus::Confirmed).is_err());
        assert!(check_transition(BookingStatus::Cancelled, BookingStatus::Cancelled).is_err());
    }
}
