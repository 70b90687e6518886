use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::contact::normalize_phone;
use crate::error::AppError;
use crate::models::user::{Role, User};
use crate::session::Session;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/:id", get(get_user))
}

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.ends_with('.')
        }
        None => false,
    }
}

async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<User>, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }

    let email = payload.email.trim().to_lowercase();
    if !looks_like_email(&email) {
        return Err(AppError::auth("auth/invalid-email"));
    }

    if payload.role == Role::Admin {
        return Err(AppError::auth("auth/forbidden"));
    }

    let phone = normalize_phone(&payload.phone)
        .ok_or_else(|| AppError::BadRequest("phone is not a valid phone number".to_string()))?;

    let user = User {
        id: Uuid::new_v4(),
        name: payload.name.trim().to_string(),
        email,
        phone,
        role: payload.role,
        created_at: Utc::now(),
    };

    let user = state
        .register(user)
        .ok_or_else(|| AppError::auth("auth/email-already-in-use"))?;
    info!(user_id = %user.id, role = ?user.role, "user registered");

    Ok(Json(user))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    if session.user_id != id && !session.is_admin() {
        return Err(AppError::auth("auth/forbidden"));
    }

    let user = state
        .users
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("user {} not found", id)))?;

    Ok(Json(user.value().clone()))
}
