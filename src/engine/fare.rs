use crate::error::AppError;
use crate::geo::haversine_km;
use crate::models::booking::Booking;
use crate::models::pricing::DriverPricing;

pub const DEFAULT_CURRENCY: &str = "KES";

/// `max(minimum_fare, base_fare + per_km * distance)`, rounded to whole units.
pub fn estimate(pricing: &DriverPricing, distance_km: f64) -> f64 {
    let metered = pricing.base_fare + pricing.per_km * distance_km.max(0.0);
    metered.max(pricing.minimum_fare).round()
}

/// Fare for a booking when both ends have coordinates.
pub fn estimate_for_booking(pricing: &DriverPricing, booking: &Booking) -> Option<f64> {
    let pickup = booking.pickup_coords.as_ref()?;
    let destination = booking.destination_coords.as_ref()?;
    Some(estimate(pricing, haversine_km(pickup, destination)))
}

pub fn validate(pricing: &DriverPricing) -> Result<(), AppError> {
    let fields = [
        ("base_fare", pricing.base_fare),
        ("per_km", pricing.per_km),
        ("minimum_fare", pricing.minimum_fare),
    ];

    for (name, value) in fields {
        if !value.is_finite() || value < 0.0 {
            return Err(AppError::BadRequest(format!("{name} must be a non-negative number")));
        }
    }

    if pricing.currency.trim().is_empty() {
        return Err(AppError::BadRequest("currency cannot be empty".to_string()));
    }

    Ok(())
}
