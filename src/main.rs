use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use taxitao::api;
use taxitao::config::{Config, LogFormat};
use taxitao::email::HttpEmailSender;
use taxitao::error::AppError;
use taxitao::state::{AppState, Settings};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false);
    match config.log_format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Compact => subscriber.compact().init(),
    }

    let email = Arc::new(HttpEmailSender::new(config.email.clone()));
    if config.email.api_key.is_none() {
        tracing::warn!("EMAIL_API_KEY is not set; email relay will fail");
    }

    let app_state = AppState::new(config.event_buffer_size, Settings::from(&config), email);
    if let Some(seed) = &config.admin {
        if let Some(admin) = app_state.seed_admin(seed) {
            tracing::info!(user_id = %admin.id, email = %admin.email, "admin account seeded");
        }
    }
    let shared_state = Arc::new(app_state);

    let app = api::rest::router(shared_state);

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
