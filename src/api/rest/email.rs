use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use tracing::{error, info};

use crate::email::EmailMessage;
use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/send-email", post(send_email))
}

#[derive(Serialize)]
pub struct SendEmailResponse {
    pub success: bool,
    pub id: String,
}

async fn send_email(
    State(state): State<Arc<AppState>>,
    Json(message): Json<EmailMessage>,
) -> Result<Json<SendEmailResponse>, AppError> {
    message.validate()?;

    match state.email.send(message).await {
        Ok(receipt) => {
            state
                .metrics
                .emails_sent_total
                .with_label_values(&["success"])
                .inc();
            info!(email_id = %receipt.id, "email relayed");
            Ok(Json(SendEmailResponse {
                success: true,
                id: receipt.id,
            }))
        }
        Err(err) => {
            state
                .metrics
                .emails_sent_total
                .with_label_values(&["error"])
                .inc();
            error!(error = %err, "failed to relay email");
            Err(err.into())
        }
    }
}
