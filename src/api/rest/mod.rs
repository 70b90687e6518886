pub mod bookings;
pub mod drivers;
pub mod email;
pub mod issues;
pub mod notifications;
pub mod recommendations;
pub mod users;
pub mod ws;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(users::router())
        .merge(drivers::router())
        .merge(bookings::router())
        .merge(notifications::router())
        .merge(issues::router())
        .merge(recommendations::router())
        .merge(email::router())
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/ws/bookings", get(ws::bookings_ws))
        .route("/ws/carousel", get(ws::carousel_ws))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .fallback_service(ServeDir::new("static"))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    users: usize,
    drivers: usize,
    bookings: usize,
    open_issues: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let open_issues = state
        .issues
        .iter()
        .filter(|entry| entry.resolved_at.is_none())
        .count();

    Json(HealthResponse {
        status: "ok",
        users: state.users.len(),
        drivers: state.drivers.len(),
        bookings: state.bookings.len(),
        open_issues,
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}
