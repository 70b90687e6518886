use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{patch, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::issue::{Issue, IssueCategory, IssueStatus};
use crate::models::notification::NotificationKind;
use crate::models::user::Role;
use crate::notifications::NotificationBuilder;
use crate::session::Session;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/issues", post(report_issue).get(list_issues))
        .route("/issues/:id/resolve", patch(resolve_issue))
}

#[derive(Deserialize)]
pub struct ReportIssueRequest {
    pub booking_id: Option<Uuid>,
    pub category: IssueCategory,
    pub description: String,
}

#[derive(Deserialize)]
pub struct ResolveIssueRequest {
    pub resolution: String,
}

async fn report_issue(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<ReportIssueRequest>,
) -> Result<Json<Issue>, AppError> {
    let description = payload.description.trim();
    if description.is_empty() {
        return Err(AppError::BadRequest("description cannot be empty".to_string()));
    }

    if let Some(booking_id) = payload.booking_id {
        let booking = state
            .bookings
            .get(&booking_id)
            .ok_or_else(|| AppError::NotFound(format!("booking {} not found", booking_id)))?;
        let involved = booking.customer_id == session.user_id
            || booking.accepted_by == Some(session.user_id);
        if !involved && !session.is_admin() {
            return Err(AppError::auth("auth/forbidden"));
        }
    }

    let issue = Issue {
        id: Uuid::new_v4(),
        reporter_id: session.user_id,
        booking_id: payload.booking_id,
        category: payload.category,
        description: description.to_string(),
        status: IssueStatus::Open,
        resolution: None,
        created_at: Utc::now(),
        resolved_at: None,
    };

    state.issues.insert(issue.id, issue.clone());
    info!(issue_id = %issue.id, category = ?issue.category, "issue reported");

    Ok(Json(issue))
}

/// Admins see every issue, everyone else only their own. Open issues first.
async fn list_issues(State(state): State<Arc<AppState>>, session: Session) -> Json<Vec<Issue>> {
    let mut issues: Vec<Issue> = state
        .issues
        .iter()
        .filter(|entry| session.is_admin() || entry.reporter_id == session.user_id)
        .map(|entry| entry.value().clone())
        .collect();

    issues.sort_by(|a, b| {
        (a.status == IssueStatus::Resolved)
            .cmp(&(b.status == IssueStatus::Resolved))
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    Json(issues)
}

async fn resolve_issue(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(payload): Json<ResolveIssueRequest>,
) -> Result<Json<Issue>, AppError> {
    session.require(Role::Admin)?;

    let resolution = payload.resolution.trim();
    if resolution.is_empty() {
        return Err(AppError::BadRequest("resolution cannot be empty".to_string()));
    }

    let issue = {
        let mut issue = state
            .issues
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("issue {} not found", id)))?;

        if issue.status == IssueStatus::Resolved {
            return Err(AppError::Conflict(format!("issue {} is already resolved", id)));
        }

        issue.status = IssueStatus::Resolved;
        issue.resolution = Some(resolution.to_string());
        issue.resolved_at = Some(Utc::now());
        issue.clone()
    };

    NotificationBuilder::new("Issue resolved", NotificationKind::IssueResolved)
        .body(resolution.to_string())
        .to_user(issue.reporter_id)
        .send(&state);

    info!(issue_id = %id, "issue resolved");
    Ok(Json(issue))
}
