use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::fare;
use crate::error::AppError;
use crate::geo;
use crate::models::booking::{Booking, BookingStatus, Eta, RideStatus};
use crate::models::driver::GeoPoint;
use crate::models::notification::NotificationKind;
use crate::models::user::Role;
use crate::notifications::NotificationBuilder;
use crate::payments::MpesaDetails;
use crate::ride::display::display;
use crate::ride::lifecycle;
use crate::ride::progress::RideProgress;
use crate::session::Session;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", post(create_booking).get(list_bookings))
        .route("/bookings/:id", get(get_booking))
        .route("/bookings/:id/progress", get(progress))
        .route("/bookings/:id/payment", get(payment_instructions))
        .route("/bookings/:id/accept", post(accept_booking))
        .route("/bookings/:id/status", post(update_ride_status))
        .route("/bookings/:id/cancel", post(cancel_booking))
        .route("/bookings/:id/review", post(review_booking))
        .route("/bookings/:id/driver-location", patch(update_driver_location))
}

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub pickup_location: String,
    pub destination: String,
    pub pickup_coords: Option<GeoPoint>,
    pub destination_coords: Option<GeoPoint>,
    pub pickup_date: String,
    pub pickup_time: String,
    pub fare: Option<f64>,
}

#[derive(Deserialize)]
pub struct BookingQuery {
    pub ride_status: Option<RideStatus>,
}

#[derive(Deserialize)]
pub struct RideStatusRequest {
    pub ride_status: RideStatus,
    pub eta: Option<Eta>,
}

#[derive(Deserialize)]
pub struct DriverLocationRequest {
    pub location: GeoPoint,
    pub eta: Option<Eta>,
}

#[derive(Deserialize)]
pub struct ReviewRequest {
    pub rating: u8,
    pub review: Option<String>,
}

#[derive(Serialize)]
pub struct PaymentInstructions {
    pub driver_id: Uuid,
    pub payment: MpesaDetails,
    pub amount: Option<f64>,
    pub steps: Vec<String>,
}

fn booking_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("booking {} not found", id))
}

pub(crate) fn can_view(session: &Session, booking: &Booking) -> bool {
    session.is_admin()
        || booking.customer_id == session.user_id
        || booking.accepted_by == Some(session.user_id)
        || (session.role == Role::Driver && booking.ride_status == RideStatus::Pending)
}

/// The ETA panel only makes sense while the driver is heading to pickup.
fn accepts_eta(status: RideStatus) -> bool {
    matches!(status, RideStatus::Confirmed | RideStatus::EnRoute)
}

fn required(field: &str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        Err(AppError::BadRequest(format!("{field} cannot be empty")))
    } else {
        Ok(value.to_string())
    }
}

fn check_coords(field: &str, point: Option<&GeoPoint>) -> Result<(), AppError> {
    match point {
        Some(point) if !geo::is_valid(point) => {
            Err(AppError::BadRequest(format!("{field} is out of range")))
        }
        _ => Ok(()),
    }
}

/// Bookkeeping shared by every successful ride status change.
fn after_transition(state: &AppState, booking: &Booking, from: RideStatus) {
    let to = booking.ride_status;

    state
        .metrics
        .ride_transitions_total
        .with_label_values(&[to.as_str()])
        .inc();

    if !lifecycle::is_active(from) && lifecycle::is_active(to) {
        state.metrics.active_rides.inc();
    } else if lifecycle::is_active(from) && !lifecycle::is_active(to) {
        state.metrics.active_rides.dec();
    }

    let badge = display(to);
    let kind = match to {
        RideStatus::Confirmed => NotificationKind::BookingAccepted,
        RideStatus::Cancelled => NotificationKind::BookingCancelled,
        _ => NotificationKind::RideStatusChanged,
    };

    let mut notice = NotificationBuilder::new(badge.label, kind)
        .body(format!(
            "{} to {}: {}",
            booking.pickup_location, booking.destination, badge.label
        ))
        .booking(booking.id)
        .to_user(booking.customer_id);
    if let Some(driver_id) = booking.accepted_by {
        notice = notice.to_driver(driver_id);
    }
    notice.send(state);

    state.publish(booking);

    info!(
        booking_id = %booking.id,
        from = %from,
        to = %to,
        "ride status changed"
    );
}

async fn create_booking(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<Json<Booking>, AppError> {
    if session.role != Role::Customer {
        return Err(AppError::auth("auth/forbidden"));
    }

    let pickup_location = required("pickup_location", &payload.pickup_location)?;
    let destination = required("destination", &payload.destination)?;
    let pickup_date = required("pickup_date", &payload.pickup_date)?;
    let pickup_time = required("pickup_time", &payload.pickup_time)?;
    check_coords("pickup_coords", payload.pickup_coords.as_ref())?;
    check_coords("destination_coords", payload.destination_coords.as_ref())?;

    if let Some(fare) = payload.fare {
        if !fare.is_finite() || fare < 0.0 {
            return Err(AppError::BadRequest("fare must be a non-negative number".to_string()));
        }
    }

    let customer = state
        .users
        .get(&session.user_id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| AppError::auth("auth/user-not-found"))?;

    let now = Utc::now();
    let booking = Booking {
        id: Uuid::new_v4(),
        customer_id: customer.id,
        customer_name: customer.name,
        customer_phone: customer.phone,
        pickup_location,
        destination,
        pickup_coords: payload.pickup_coords,
        destination_coords: payload.destination_coords,
        pickup_date,
        pickup_time,
        status: BookingStatus::Pending,
        ride_status: RideStatus::Pending,
        accepted_by: None,
        driver_location: None,
        eta: None,
        fare: payload.fare,
        rating: None,
        review: None,
        created_at: now,
        updated_at: now,
    };

    state.bookings.insert(booking.id, booking.clone());
    state.metrics.bookings_created_total.inc();

    let online: Vec<Uuid> = state
        .drivers
        .iter()
        .filter(|entry| entry.online)
        .map(|entry| entry.id)
        .collect();
    let mut notice = NotificationBuilder::new("New ride request", NotificationKind::BookingCreated)
        .body(format!(
            "{} to {} on {} at {}",
            booking.pickup_location, booking.destination, booking.pickup_date, booking.pickup_time
        ))
        .booking(booking.id);
    for driver_id in online {
        notice = notice.to_driver(driver_id);
    }
    let notified = notice.send(&state);

    state.publish(&booking);
    info!(booking_id = %booking.id, notified_drivers = notified, "booking created");

    Ok(Json(booking))
}

async fn list_bookings(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(query): Query<BookingQuery>,
) -> Json<Vec<Booking>> {
    let mut bookings: Vec<Booking> = state
        .bookings
        .iter()
        .filter(|entry| can_view(&session, entry.value()))
        .filter(|entry| query.ride_status.is_none_or(|status| entry.ride_status == status))
        .map(|entry| entry.value().clone())
        .collect();

    bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Json(bookings)
}

fn visible_booking(state: &AppState, session: &Session, id: Uuid) -> Result<Booking, AppError> {
    let booking = state
        .bookings
        .get(&id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| booking_not_found(id))?;

    if can_view(session, &booking) {
        Ok(booking)
    } else {
        Err(booking_not_found(id))
    }
}

async fn get_booking(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(visible_booking(&state, &session, id)?))
}

async fn progress(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<RideProgress>, AppError> {
    let booking = visible_booking(&state, &session, id)?;
    Ok(Json(RideProgress::for_booking(&booking)))
}

async fn payment_instructions(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<PaymentInstructions>, AppError> {
    let booking = visible_booking(&state, &session, id)?;

    let driver_id = booking
        .accepted_by
        .ok_or_else(|| AppError::Conflict(format!("booking {} has no driver yet", id)))?;

    let payment = state
        .drivers
        .get(&driver_id)
        .and_then(|driver| driver.payment.clone())
        .ok_or_else(|| {
            AppError::NotFound(format!("driver {} has no payment settings", driver_id))
        })?;

    Ok(Json(PaymentInstructions {
        driver_id,
        steps: payment.instructions(booking.fare),
        amount: booking.fare,
        payment,
    }))
}

async fn accept_booking(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    if session.role != Role::Driver {
        return Err(AppError::auth("auth/forbidden"));
    }

    let driver = state
        .drivers
        .get(&session.user_id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| AppError::NotFound(format!("driver {} not found", session.user_id)))?;

    if !driver.online {
        return Err(AppError::Conflict("driver is offline".to_string()));
    }

    let pricing = state
        .driver_pricing
        .get(&driver.id)
        .map(|entry| entry.value().clone());

    let (booking, from) = {
        let mut booking = state.bookings.get_mut(&id).ok_or_else(|| booking_not_found(id))?;

        if booking.accepted_by.is_some_and(|taken| taken != driver.id) {
            return Err(AppError::Conflict(format!(
                "booking {} was already accepted by another driver",
                id
            )));
        }

        let from = booking.ride_status;
        let next = lifecycle::transition(from, RideStatus::Confirmed)?;

        if booking.fare.is_none() {
            let estimate = pricing
                .as_ref()
                .and_then(|pricing| fare::estimate_for_booking(pricing, booking.value()));
            booking.fare = estimate;
        }
        booking.accepted_by = Some(driver.id);
        booking.driver_location = driver.location.clone();
        booking.apply_ride_status(next);

        (booking.clone(), from)
    };

    after_transition(&state, &booking, from);
    Ok(Json(booking))
}

async fn update_ride_status(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(payload): Json<RideStatusRequest>,
) -> Result<Json<Booking>, AppError> {
    match payload.ride_status {
        RideStatus::Confirmed => {
            return Err(AppError::BadRequest(
                "use the accept endpoint to confirm a booking".to_string(),
            ));
        }
        RideStatus::Cancelled => {
            return Err(AppError::BadRequest(
                "use the cancel endpoint to cancel a booking".to_string(),
            ));
        }
        _ => {}
    }

    let (booking, from) = {
        let mut booking = state.bookings.get_mut(&id).ok_or_else(|| booking_not_found(id))?;

        // Admins may cancel but never drive a ride forward.
        if booking.accepted_by != Some(session.user_id) {
            return Err(AppError::auth("auth/forbidden"));
        }

        let from = booking.ride_status;
        let next = lifecycle::transition(from, payload.ride_status)?;

        match next {
            RideStatus::EnRoute => {
                if payload.eta.is_some() {
                    booking.eta = payload.eta;
                }
            }
            _ => booking.eta = None,
        }
        booking.apply_ride_status(next);

        (booking.clone(), from)
    };

    if booking.ride_status == RideStatus::Completed {
        if let Some(mut driver) = booking.accepted_by.and_then(|d| state.drivers.get_mut(&d)) {
            driver.total_rides = driver.total_rides.saturating_add(1);
            driver.updated_at = Utc::now();
        }
    }

    after_transition(&state, &booking, from);
    Ok(Json(booking))
}

async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let (booking, from) = {
        let mut booking = state.bookings.get_mut(&id).ok_or_else(|| booking_not_found(id))?;

        let participant = booking.customer_id == session.user_id
            || booking.accepted_by == Some(session.user_id);
        if !participant && !session.is_admin() {
            return Err(AppError::auth("auth/forbidden"));
        }

        let from = booking.ride_status;
        let next = lifecycle::transition(from, RideStatus::Cancelled)?;
        booking.eta = None;
        booking.apply_ride_status(next);

        (booking.clone(), from)
    };

    after_transition(&state, &booking, from);
    Ok(Json(booking))
}

async fn review_booking(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReviewRequest>,
) -> Result<Json<Booking>, AppError> {
    if !(1..=5).contains(&payload.rating) {
        return Err(AppError::BadRequest("rating must be between 1 and 5".to_string()));
    }

    let booking = {
        let mut booking = state.bookings.get_mut(&id).ok_or_else(|| booking_not_found(id))?;

        if booking.customer_id != session.user_id {
            return Err(AppError::auth("auth/forbidden"));
        }
        if booking.ride_status != RideStatus::Completed {
            return Err(AppError::Conflict("only completed rides can be reviewed".to_string()));
        }
        if booking.rating.is_some() {
            return Err(AppError::Conflict(format!("booking {} was already reviewed", id)));
        }

        booking.rating = Some(payload.rating);
        booking.review = payload
            .review
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        booking.updated_at = Utc::now();
        booking.clone()
    };

    match booking.accepted_by.and_then(|d| state.drivers.get_mut(&d)) {
        Some(mut driver) => driver.record_rating(payload.rating),
        None => warn!(booking_id = %id, "reviewed booking has no driver profile"),
    }

    state.publish(&booking);
    Ok(Json(booking))
}

async fn update_driver_location(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(payload): Json<DriverLocationRequest>,
) -> Result<Json<Booking>, AppError> {
    if !geo::is_valid(&payload.location) {
        return Err(AppError::BadRequest("location is out of range".to_string()));
    }

    let booking = {
        let mut booking = state.bookings.get_mut(&id).ok_or_else(|| booking_not_found(id))?;

        if booking.accepted_by != Some(session.user_id) {
            return Err(AppError::auth("auth/forbidden"));
        }
        if !lifecycle::is_active(booking.ride_status) {
            return Err(AppError::Conflict(format!("booking {} is not an active ride", id)));
        }

        booking.driver_location = Some(payload.location.clone());
        if payload.eta.is_some() && accepts_eta(booking.ride_status) {
            booking.eta = payload.eta;
        }
        booking.updated_at = Utc::now();
        booking.clone()
    };

    if let Some(mut driver) = state.drivers.get_mut(&session.user_id) {
        driver.location = Some(payload.location);
        driver.updated_at = Utc::now();
    }

    state.publish(&booking);
    Ok(Json(booking))
}
