use serde::Serialize;

use crate::models::booking::RideStatus;

/// Badge shown wherever a ride status is rendered.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct StatusDisplay {
    pub label: &'static str,
    pub color: &'static str,
    pub icon: &'static str,
}

const UNKNOWN: StatusDisplay = StatusDisplay {
    label: "Unknown",
    color: "bg-gray-100 text-gray-800",
    icon: "help-circle",
};

pub fn display(status: RideStatus) -> StatusDisplay {
    let (label, color, icon) = match status {
        RideStatus::Pending => ("Pending", "bg-yellow-100 text-yellow-800", "clock"),
        RideStatus::Confirmed => ("Confirmed", "bg-blue-100 text-blue-800", "check-circle"),
        RideStatus::EnRoute => ("Driver En Route", "bg-indigo-100 text-indigo-800", "car"),
        RideStatus::Arrived => ("Driver Arrived", "bg-purple-100 text-purple-800", "map-pin"),
        RideStatus::InProgress => (
            "Ride In Progress",
            "bg-orange-100 text-orange-800",
            "navigation",
        ),
        RideStatus::Completed => ("Completed", "bg-green-100 text-green-800", "flag"),
        RideStatus::Cancelled => ("Cancelled", "bg-red-100 text-red-800", "x-circle"),
    };

    StatusDisplay { label, color, icon }
}

/// Same as [`display`] for a status stored as a raw string.
pub fn display_raw(raw: &str) -> StatusDisplay {
    raw.parse::<RideStatus>().map(display).unwrap_or(UNKNOWN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_status_has_its_label_and_color() {
        let expected = [
            (RideStatus::Pending, "Pending", "bg-yellow-100 text-yellow-800"),
            (RideStatus::Confirmed, "Confirmed", "bg-blue-100 text-blue-800"),
            (RideStatus::EnRoute, "Driver En Route", "bg-indigo-100 text-indigo-800"),
            (RideStatus::Arrived, "Driver Arrived", "bg-purple-100 text-purple-800"),
            (RideStatus::InProgress, "Ride In Progress", "bg-orange-100 text-orange-800"),
            (RideStatus::Completed, "Completed", "bg-green-100 text-green-800"),
            (RideStatus::Cancelled, "Cancelled", "bg-red-100 text-red-800"),
        ];

        for (status, label, color) in expected {
            let badge = display(status);
            assert_eq!((badge.label, badge.color), (label, color), "{status}");
            assert_eq!(display_raw(status.as_str()), badge);
        }
    }

    #[test]
    fn unrecognised_status_falls_back_to_unknown() {
        let badge = display_raw("teleporting");
        assert_eq!(badge.label, "Unknown");
        assert_eq!(badge.color, "bg-gray-100 text-gray-800");
        assert_eq!(display_raw(""), badge);
    }
}
