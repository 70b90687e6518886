use std::env;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub event_buffer_size: usize,
    pub carousel_interval_ms: u64,
    pub compliance_window_days: i64,
    pub email: EmailConfig,
    pub admin: Option<AdminSeed>,
}

/// Administrator account created at startup.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub from: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.resend.com/emails".to_string(),
            api_key: None,
            from: "TaxiTao <noreply@taxitao.app>".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let log_format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") | Err(_) => LogFormat::Compact,
            Ok(other) => {
                return Err(AppError::Internal(format!(
                    "invalid LOG_FORMAT: {other}, expected compact/json"
                )));
            }
        };

        let defaults = EmailConfig::default();
        let email = EmailConfig {
            api_url: env::var("EMAIL_API_URL").unwrap_or(defaults.api_url),
            api_key: env::var("EMAIL_API_KEY").ok().filter(|key| !key.trim().is_empty()),
            from: env::var("EMAIL_FROM").unwrap_or(defaults.from),
        };

        let admin = env::var("ADMIN_EMAIL")
            .ok()
            .filter(|email| !email.trim().is_empty())
            .map(|email| AdminSeed {
                name: env::var("ADMIN_NAME").unwrap_or_else(|_| "Administrator".to_string()),
                email: email.trim().to_lowercase(),
            });

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_format,
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            carousel_interval_ms: parse_or_default("CAROUSEL_INTERVAL_MS", 5000)?,
            compliance_window_days: parse_or_default("COMPLIANCE_WINDOW_DAYS", 30)?,
            email,
            admin,
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
