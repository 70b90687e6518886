use chrono::NaiveDate;
use serde::Serialize;

use crate::models::driver::{ComplianceDocument, DocumentKind, Driver};

const URGENT_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Expired,
    Urgent,
    Upcoming,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComplianceAlert {
    pub kind: DocumentKind,
    pub expires_on: NaiveDate,
    pub days: i64,
    pub severity: Severity,
    pub message: String,
}

/// Whole days from `today` until `due`. Zero when due today, negative once overdue.
pub fn days_until(due: NaiveDate, today: NaiveDate) -> i64 {
    (due - today).num_days()
}

fn plural_days(n: i64) -> String {
    if n == 1 {
        "1 day".to_string()
    } else {
        format!("{n} days")
    }
}

pub fn describe(days: i64) -> String {
    match days {
        0 => "Due today".to_string(),
        d if d > 0 => format!("Due in {}", plural_days(d)),
        d => format!("Overdue by {}", plural_days(-d)),
    }
}

fn severity(days: i64) -> Severity {
    if days < 0 {
        Severity::Expired
    } else if days <= URGENT_DAYS {
        Severity::Urgent
    } else {
        Severity::Upcoming
    }
}

fn alert_for(document: &ComplianceDocument, today: NaiveDate) -> ComplianceAlert {
    let days = days_until(document.expires_on, today);
    ComplianceAlert {
        kind: document.kind,
        expires_on: document.expires_on,
        days,
        severity: severity(days),
        message: describe(days),
    }
}

/// Documents that are overdue or expire within `window_days`, soonest first.
pub fn alerts(driver: &Driver, today: NaiveDate, window_days: i64) -> Vec<ComplianceAlert> {
    let mut alerts: Vec<ComplianceAlert> = driver
        .documents
        .iter()
        .map(|document| alert_for(document, today))
        .filter(|alert| alert.days <= window_days)
        .collect();

    alerts.sort_by_key(|alert| alert.days);
    alerts
}
