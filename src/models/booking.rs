use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::driver::GeoPoint;

/// Granular lifecycle of a ride. Transitions are governed by `ride::lifecycle`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RideStatus {
    Pending,
    Confirmed,
    EnRoute,
    Arrived,
    InProgress,
    Completed,
    Cancelled,
}

impl RideStatus {
    pub const ALL: [RideStatus; 7] = [
        RideStatus::Pending,
        RideStatus::Confirmed,
        RideStatus::EnRoute,
        RideStatus::Arrived,
        RideStatus::InProgress,
        RideStatus::Completed,
        RideStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RideStatus::Pending => "pending",
            RideStatus::Confirmed => "confirmed",
            RideStatus::EnRoute => "en_route",
            RideStatus::Arrived => "arrived",
            RideStatus::InProgress => "in_progress",
            RideStatus::Completed => "completed",
            RideStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RideStatus {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        RideStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == raw)
            .ok_or_else(|| format!("unknown ride status: {raw}"))
    }
}

/// Coarse booking status shown in booking lists.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Accepted,
    Completed,
    Cancelled,
}

impl From<RideStatus> for BookingStatus {
    fn from(value: RideStatus) -> Self {
        match value {
            RideStatus::Pending => BookingStatus::Pending,
            RideStatus::Confirmed
            | RideStatus::EnRoute
            | RideStatus::Arrived
            | RideStatus::InProgress => BookingStatus::Accepted,
            RideStatus::Completed => BookingStatus::Completed,
            RideStatus::Cancelled => BookingStatus::Cancelled,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Eta {
    pub minutes: u32,
    pub distance_km: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub customer_phone: String,
    pub pickup_location: String,
    pub destination: String,
    pub pickup_coords: Option<GeoPoint>,
    pub destination_coords: Option<GeoPoint>,
    pub pickup_date: String,
    pub pickup_time: String,
    pub status: BookingStatus,
    pub ride_status: RideStatus,
    pub accepted_by: Option<Uuid>,
    pub driver_location: Option<GeoPoint>,
    pub eta: Option<Eta>,
    pub fare: Option<f64>,
    pub rating: Option<u8>,
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Moves the ride to `next` and keeps the coarse status in step.
    /// Callers validate the transition first.
    pub fn apply_ride_status(&mut self, next: RideStatus) {
        self.ride_status = next;
        self.status = BookingStatus::from(next);
        self.updated_at = Utc::now();
    }
}

/// Event published to live booking listeners.
#[derive(Debug, Clone, Serialize)]
pub struct BookingEvent {
    pub booking_id: Uuid,
    pub ride_status: RideStatus,
    pub booking: Booking,
    pub at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::{BookingStatus, RideStatus};

    #[test]
    fn ride_status_parses_its_own_wire_names() {
        for status in RideStatus::ALL {
            assert_eq!(status.as_str().parse::<RideStatus>(), Ok(status));
        }
        assert!("on_the_way".parse::<RideStatus>().is_err());
    }

    #[test]
    fn coarse_status_groups_active_ride_states() {
        assert_eq!(BookingStatus::from(RideStatus::Pending), BookingStatus::Pending);
        assert_eq!(BookingStatus::from(RideStatus::EnRoute), BookingStatus::Accepted);
        assert_eq!(BookingStatus::from(RideStatus::InProgress), BookingStatus::Accepted);
        assert_eq!(BookingStatus::from(RideStatus::Cancelled), BookingStatus::Cancelled);
    }
}
