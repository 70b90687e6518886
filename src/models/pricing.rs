use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverPricing {
    pub driver_id: Uuid,
    pub base_fare: f64,
    pub per_km: f64,
    pub minimum_fare: f64,
    pub currency: String,
}
