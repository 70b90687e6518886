use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::contact::{links_for, normalize_phone, ContactLinks};
use crate::engine::carousel::{eligible, Carousel, CarouselEntry};
use crate::engine::compliance::{alerts, ComplianceAlert};
use crate::engine::fare;
use crate::error::AppError;
use crate::geo;
use crate::models::driver::{ComplianceDocument, Driver, GeoPoint, Vehicle};
use crate::models::pricing::DriverPricing;
use crate::models::user::Role;
use crate::notifications::{feed_for, NotificationFeed};
use crate::payments::{MpesaDetails, MpesaForm};
use crate::session::Session;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drivers", post(create_driver).get(list_drivers))
        .route("/drivers/carousel", get(carousel))
        .route("/drivers/:id", get(get_driver))
        .route("/drivers/:id/availability", patch(update_availability))
        .route("/drivers/:id/location", patch(update_location))
        .route("/drivers/:id/verify", patch(verify_driver))
        .route("/drivers/:id/pricing", put(set_pricing).get(get_pricing))
        .route("/drivers/:id/payment", put(set_payment))
        .route("/drivers/:id/compliance", get(compliance))
        .route("/drivers/:id/contact", get(contact))
        .route("/drivers/:id/notifications", get(notifications))
}

#[derive(Deserialize)]
pub struct CreateDriverRequest {
    pub vehicle: Vehicle,
    pub whatsapp: Option<String>,
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub documents: Vec<ComplianceDocument>,
}

#[derive(Deserialize)]
pub struct AvailabilityRequest {
    pub online: bool,
}

#[derive(Deserialize)]
pub struct LocationRequest {
    pub location: GeoPoint,
}

#[derive(Deserialize)]
pub struct VerifyRequest {
    pub verified: bool,
}

#[derive(Deserialize)]
pub struct PricingRequest {
    pub base_fare: f64,
    pub per_km: f64,
    #[serde(default)]
    pub minimum_fare: f64,
    pub currency: Option<String>,
}

#[derive(Deserialize)]
pub struct CarouselQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    #[serde(default)]
    pub index: usize,
}

#[derive(Serialize)]
pub struct CarouselResponse {
    pub index: Option<usize>,
    pub featured: Option<CarouselEntry>,
    pub entries: Vec<CarouselEntry>,
}

/// Only the driver themself or an admin may manage a driver profile.
fn ensure_owner(session: &Session, driver_id: Uuid) -> Result<(), AppError> {
    if session.user_id == driver_id || session.is_admin() {
        Ok(())
    } else {
        Err(AppError::auth("auth/forbidden"))
    }
}

fn driver_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("driver {} not found", id))
}

async fn create_driver(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<CreateDriverRequest>,
) -> Result<Json<Driver>, AppError> {
    if session.role != Role::Driver {
        return Err(AppError::auth("auth/forbidden"));
    }

    if payload.vehicle.plate.trim().is_empty() {
        return Err(AppError::BadRequest("vehicle plate cannot be empty".to_string()));
    }

    if payload.vehicle.seats == 0 {
        return Err(AppError::BadRequest("vehicle seats must be > 0".to_string()));
    }

    if let Some(location) = &payload.location {
        if !geo::is_valid(location) {
            return Err(AppError::BadRequest("location is out of range".to_string()));
        }
    }

    let user = state
        .users
        .get(&session.user_id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| AppError::auth("auth/user-not-found"))?;

    let whatsapp = match payload.whatsapp.as_deref() {
        Some(raw) => Some(normalize_phone(raw).ok_or_else(|| {
            AppError::BadRequest("whatsapp is not a valid phone number".to_string())
        })?),
        None => None,
    };

    let now = Utc::now();
    let driver = Driver {
        id: user.id,
        name: user.name,
        phone: user.phone,
        whatsapp,
        vehicle: payload.vehicle,
        location: payload.location,
        online: false,
        verified: false,
        rating: 0.0,
        rating_count: 0,
        total_rides: 0,
        documents: payload.documents,
        payment: None,
        created_at: now,
        updated_at: now,
    };

    match state.drivers.entry(driver.id) {
        dashmap::mapref::entry::Entry::Occupied(_) => {
            return Err(AppError::Conflict(format!("driver profile {} already exists", driver.id)));
        }
        dashmap::mapref::entry::Entry::Vacant(slot) => {
            slot.insert(driver.clone());
        }
    }

    info!(driver_id = %driver.id, plate = %driver.vehicle.plate, "driver profile created");
    Ok(Json(driver))
}

async fn list_drivers(State(state): State<Arc<AppState>>) -> Json<Vec<Driver>> {
    let mut drivers: Vec<Driver> = state
        .drivers
        .iter()
        .map(|entry| entry.value().clone())
        .collect();
    drivers.sort_by(|a, b| a.name.cmp(&b.name));
    Json(drivers)
}

async fn get_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Driver>, AppError> {
    let driver = state.drivers.get(&id).ok_or_else(|| driver_not_found(id))?;
    Ok(Json(driver.value().clone()))
}

async fn update_availability(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(payload): Json<AvailabilityRequest>,
) -> Result<Json<Driver>, AppError> {
    ensure_owner(&session, id)?;

    let mut driver = state.drivers.get_mut(&id).ok_or_else(|| driver_not_found(id))?;
    driver.online = payload.online;
    driver.updated_at = Utc::now();

    info!(driver_id = %id, online = payload.online, "driver availability changed");
    Ok(Json(driver.clone()))
}

async fn update_location(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(payload): Json<LocationRequest>,
) -> Result<Json<Driver>, AppError> {
    ensure_owner(&session, id)?;

    if !geo::is_valid(&payload.location) {
        return Err(AppError::BadRequest("location is out of range".to_string()));
    }

    let mut driver = state.drivers.get_mut(&id).ok_or_else(|| driver_not_found(id))?;
    driver.location = Some(payload.location);
    driver.updated_at = Utc::now();

    Ok(Json(driver.clone()))
}

async fn verify_driver(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(payload): Json<VerifyRequest>,
) -> Result<Json<Driver>, AppError> {
    session.require(Role::Admin)?;

    let mut driver = state.drivers.get_mut(&id).ok_or_else(|| driver_not_found(id))?;
    driver.verified = payload.verified;
    driver.updated_at = Utc::now();

    info!(driver_id = %id, verified = payload.verified, "driver verification changed");
    Ok(Json(driver.clone()))
}

async fn set_pricing(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(payload): Json<PricingRequest>,
) -> Result<Json<DriverPricing>, AppError> {
    ensure_owner(&session, id)?;

    if !state.drivers.contains_key(&id) {
        return Err(driver_not_found(id));
    }

    let pricing = DriverPricing {
        driver_id: id,
        base_fare: payload.base_fare,
        per_km: payload.per_km,
        minimum_fare: payload.minimum_fare,
        currency: payload
            .currency
            .unwrap_or_else(|| fare::DEFAULT_CURRENCY.to_string()),
    };
    fare::validate(&pricing)?;

    state.driver_pricing.insert(id, pricing.clone());
    Ok(Json(pricing))
}

async fn get_pricing(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DriverPricing>, AppError> {
    let pricing = state
        .driver_pricing
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("pricing for driver {} not found", id)))?;
    Ok(Json(pricing.value().clone()))
}

async fn set_payment(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(form): Json<MpesaForm>,
) -> Result<Json<MpesaDetails>, AppError> {
    ensure_owner(&session, id)?;

    let details = form.validate()?;

    let mut driver = state.drivers.get_mut(&id).ok_or_else(|| driver_not_found(id))?;
    driver.payment = Some(details.clone());
    driver.updated_at = Utc::now();

    info!(driver_id = %id, "driver payment settings updated");
    Ok(Json(details))
}

async fn compliance(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ComplianceAlert>>, AppError> {
    ensure_owner(&session, id)?;

    let driver = state.drivers.get(&id).ok_or_else(|| driver_not_found(id))?;
    let today = Utc::now().date_naive();

    Ok(Json(alerts(
        driver.value(),
        today,
        state.settings.compliance_window_days,
    )))
}

async fn contact(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ContactLinks>, AppError> {
    let driver = state.drivers.get(&id).ok_or_else(|| driver_not_found(id))?;
    let links = links_for(driver.value())
        .ok_or_else(|| AppError::NotFound(format!("driver {} has no valid phone number", id)))?;
    Ok(Json(links))
}

async fn notifications(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<NotificationFeed>, AppError> {
    ensure_owner(&session, id)?;
    Ok(Json(feed_for(&state.driver_notifications, id)))
}

pub(crate) fn carousel_origin(
    lat: Option<f64>,
    lng: Option<f64>,
) -> Result<Option<GeoPoint>, AppError> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => {
            let origin = GeoPoint { lat, lng };
            if geo::is_valid(&origin) {
                Ok(Some(origin))
            } else {
                Err(AppError::BadRequest("origin is out of range".to_string()))
            }
        }
        (None, None) => Ok(None),
        _ => Err(AppError::BadRequest("lat and lng must be given together".to_string())),
    }
}

pub(crate) fn carousel_entries(state: &AppState, origin: Option<&GeoPoint>) -> Vec<CarouselEntry> {
    let drivers: Vec<Driver> = state
        .drivers
        .iter()
        .map(|entry| entry.value().clone())
        .collect();
    eligible(&drivers, origin)
}

async fn carousel(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CarouselQuery>,
) -> Result<Json<CarouselResponse>, AppError> {
    let origin = carousel_origin(query.lat, query.lng)?;
    let entries = carousel_entries(&state, origin.as_ref());

    let position = Carousel::starting_at(entries.len(), query.index);
    let index = position.current();
    let featured = index.and_then(|idx| entries.get(idx).cloned());

    Ok(Json(CarouselResponse {
        index,
        featured,
        entries,
    }))
}
