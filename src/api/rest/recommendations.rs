use std::sync::Arc;

use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;

use crate::engine::recommendation::{recommend, validate, DriverMatch, Recommendations};
use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/recommendations", post(recommendations))
}

#[derive(Deserialize)]
pub struct RecommendationRequest {
    pub matches: Vec<DriverMatch>,
}

async fn recommendations(
    Json(payload): Json<RecommendationRequest>,
) -> Result<Json<Recommendations>, AppError> {
    validate(&payload.matches)?;
    Ok(Json(recommend(&payload.matches)))
}
