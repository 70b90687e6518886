use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::payments::MpesaDetails;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub make: String,
    pub model: String,
    pub plate: String,
    pub color: String,
    pub seats: u8,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    License,
    Insurance,
    Inspection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceDocument {
    pub kind: DocumentKind,
    pub expires_on: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub whatsapp: Option<String>,
    pub vehicle: Vehicle,
    pub location: Option<GeoPoint>,
    pub online: bool,
    pub verified: bool,
    pub rating: f64,
    pub rating_count: u32,
    pub total_rides: u32,
    pub documents: Vec<ComplianceDocument>,
    pub payment: Option<MpesaDetails>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Driver {
    /// Folds a new review into the running average rating.
    pub fn record_rating(&mut self, rating: u8) {
        let total = self.rating * self.rating_count as f64 + rating as f64;
        self.rating_count = self.rating_count.saturating_add(1);
        self.rating = (total / self.rating_count as f64).clamp(0.0, 5.0);
        self.updated_at = Utc::now();
    }
}
