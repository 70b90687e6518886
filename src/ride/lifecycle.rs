//! Ride lifecycle state machine.
//!
//! A ride moves strictly forward through
//! `pending -> confirmed -> en_route -> arrived -> in_progress -> completed`.
//! Cancellation is allowed from any state before the ride starts.
//! `completed` and `cancelled` are terminal.

use crate::error::AppError;
use crate::models::booking::RideStatus;

pub fn allowed_next(from: RideStatus) -> &'static [RideStatus] {
    match from {
        RideStatus::Pending => &[RideStatus::Confirmed, RideStatus::Cancelled],
        RideStatus::Confirmed => &[RideStatus::EnRoute, RideStatus::Cancelled],
        RideStatus::EnRoute => &[RideStatus::Arrived, RideStatus::Cancelled],
        RideStatus::Arrived => &[RideStatus::InProgress, RideStatus::Cancelled],
        RideStatus::InProgress => &[RideStatus::Completed],
        RideStatus::Completed | RideStatus::Cancelled => &[],
    }
}

pub fn can_transition(from: RideStatus, to: RideStatus) -> bool {
    allowed_next(from).contains(&to)
}

pub fn is_terminal(status: RideStatus) -> bool {
    allowed_next(status).is_empty()
}

pub fn is_active(status: RideStatus) -> bool {
    matches!(
        status,
        RideStatus::Confirmed | RideStatus::EnRoute | RideStatus::Arrived | RideStatus::InProgress
    )
}

pub fn transition(from: RideStatus, to: RideStatus) -> Result<RideStatus, AppError> {
    if can_transition(from, to) {
        Ok(to)
    } else {
        Err(AppError::InvalidTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HAPPY_PATH: [RideStatus; 6] = [
        RideStatus::Pending,
        RideStatus::Confirmed,
        RideStatus::EnRoute,
        RideStatus::Arrived,
        RideStatus::InProgress,
        RideStatus::Completed,
    ];

    #[test]
    fn happy_path_is_accepted_step_by_step() {
        for pair in HAPPY_PATH.windows(2) {
            assert_eq!(transition(pair[0], pair[1]).ok(), Some(pair[1]));
        }
    }

    #[test]
    fn skipping_a_step_is_rejected() {
        assert!(!can_transition(RideStatus::Pending, RideStatus::EnRoute));
        assert!(!can_transition(RideStatus::Confirmed, RideStatus::InProgress));
        assert!(matches!(
            transition(RideStatus::EnRoute, RideStatus::Completed),
            Err(AppError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn going_backwards_is_rejected() {
        for (later_idx, later) in HAPPY_PATH.iter().enumerate() {
            for earlier in &HAPPY_PATH[..later_idx] {
                assert!(!can_transition(*later, *earlier), "{later} -> {earlier}");
            }
        }
    }

    #[test]
    fn cannot_cancel_once_the_ride_has_started() {
        assert!(can_transition(RideStatus::Arrived, RideStatus::Cancelled));
        assert!(!can_transition(RideStatus::InProgress, RideStatus::Cancelled));
    }

    #[test]
    fn terminal_states_have_no_exits() {
        assert!(is_terminal(RideStatus::Completed));
        assert!(is_terminal(RideStatus::Cancelled));
        for status in RideStatus::ALL {
            assert!(!can_transition(RideStatus::Completed, status));
            assert!(!can_transition(RideStatus::Cancelled, status));
        }
    }

    #[test]
    fn self_transitions_are_not_allowed() {
        for status in RideStatus::ALL {
            assert!(!can_transition(status, status));
        }
    }
}
