use serde::Serialize;

use crate::models::booking::{Booking, RideStatus};
use crate::ride::display::{display, StatusDisplay};

const STEPS: [RideStatus; 6] = [
    RideStatus::Pending,
    RideStatus::Confirmed,
    RideStatus::EnRoute,
    RideStatus::Arrived,
    RideStatus::InProgress,
    RideStatus::Completed,
];

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EtaPanel {
    pub minutes: u32,
    pub distance_km: f64,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressStep {
    pub status: RideStatus,
    pub label: &'static str,
    pub done: bool,
}

/// What the customer sees while tracking a ride.
#[derive(Debug, Clone, Serialize)]
pub struct RideProgress {
    pub badge: StatusDisplay,
    pub step: Option<usize>,
    pub steps: Vec<ProgressStep>,
    pub eta_panel: Option<EtaPanel>,
}

impl RideProgress {
    pub fn for_booking(booking: &Booking) -> Self {
        let step = STEPS.iter().position(|s| *s == booking.ride_status);

        let steps = STEPS
            .iter()
            .enumerate()
            .map(|(idx, status)| ProgressStep {
                status: *status,
                label: display(*status).label,
                done: step.is_some_and(|current| idx <= current),
            })
            .collect();

        let eta_panel = booking.eta.as_ref().map(|eta| EtaPanel {
            minutes: eta.minutes,
            distance_km: eta.distance_km,
            text: format!("{} min away ({:.1} km)", eta.minutes, eta.distance_km),
        });

        Self {
            badge: display(booking.ride_status),
            step,
            steps,
            eta_panel,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::RideProgress;
    use crate::models::booking::{Booking, BookingStatus, Eta, RideStatus};

    fn booking(ride_status: RideStatus, eta: Option<Eta>) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            customer_name: "Wanjiku".to_string(),
            customer_phone: "0712345678".to_string(),
            pickup_location: "Kenyatta Avenue".to_string(),
            destination: "JKIA".to_string(),
            pickup_coords: None,
            destination_coords: None,
            pickup_date: "2026-10-18".to_string(),
            pickup_time: "08:30".to_string(),
            status: BookingStatus::from(ride_status),
            ride_status,
            accepted_by: Some(Uuid::new_v4()),
            driver_location: None,
            eta,
            fare: None,
            rating: None,
            review: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn en_route_without_eta_shows_badge_and_no_panel() {
        let progress = RideProgress::for_booking(&booking(RideStatus::EnRoute, None));

        assert_eq!(progress.badge.label, "Driver En Route");
        assert!(progress.eta_panel.is_none());
        assert_eq!(progress.step, Some(2));
        assert_eq!(progress.steps.iter().filter(|s| s.done).count(), 3);
    }

    #[test]
    fn eta_panel_appears_when_eta_is_known() {
        let eta = Eta {
            minutes: 7,
            distance_km: 2.4,
        };
        let progress = RideProgress::for_booking(&booking(RideStatus::EnRoute, Some(eta)));

        let panel = progress.eta_panel.expect("eta panel");
        assert_eq!(panel.minutes, 7);
        assert_eq!(panel.text, "7 min away (2.4 km)");
    }

    #[test]
    fn cancelled_ride_has_no_current_step() {
        let progress = RideProgress::for_booking(&booking(RideStatus::Cancelled, None));

        assert_eq!(progress.badge.label, "Cancelled");
        assert_eq!(progress.step, None);
        assert!(progress.steps.iter().all(|s| !s.done));
    }
}
