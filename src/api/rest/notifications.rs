use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::notification::Notification;
use crate::notifications::{feed_for, NotificationFeed};
use crate::session::Session;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/:id/read", post(mark_read))
}

async fn list_notifications(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Json<NotificationFeed> {
    Json(feed_for(&state.notifications, session.user_id))
}

async fn mark_read(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>, AppError> {
    let mut notification = state
        .notifications
        .get_mut(&id)
        .or_else(|| state.driver_notifications.get_mut(&id))
        .ok_or_else(|| AppError::NotFound(format!("notification {} not found", id)))?;

    if notification.recipient_id != session.user_id && !session.is_admin() {
        return Err(AppError::auth("auth/forbidden"));
    }

    notification.read = true;
    Ok(Json(notification.clone()))
}
