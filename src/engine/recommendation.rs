//! Picks the highlighted options out of an already computed match list.
//!
//! Matches arrive with their price, rating and an optional `match_score`
//! from the upstream matcher. Nothing here computes a score of its own:
//! "best value" is only reported when the matcher supplied one.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriverMatch {
    pub driver_id: Uuid,
    pub driver_name: String,
    pub price: f64,
    pub rating: f64,
    #[serde(default)]
    pub match_score: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Recommendations {
    pub best_value: Option<DriverMatch>,
    pub lowest_price: Option<DriverMatch>,
    pub best_rated: Option<DriverMatch>,
}

pub fn validate(matches: &[DriverMatch]) -> Result<(), AppError> {
    for candidate in matches {
        if !candidate.price.is_finite() || candidate.price < 0.0 {
            return Err(AppError::BadRequest(format!(
                "invalid price for driver {}",
                candidate.driver_id
            )));
        }
        if !candidate.rating.is_finite() {
            return Err(AppError::BadRequest(format!(
                "invalid rating for driver {}",
                candidate.driver_id
            )));
        }
    }
    Ok(())
}

pub fn recommend(matches: &[DriverMatch]) -> Recommendations {
    let best_value = matches
        .iter()
        .filter_map(|m| m.match_score.filter(|s| s.is_finite()).map(|s| (m, s)))
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(m, _)| m.clone());

    let lowest_price = matches
        .iter()
        .min_by(|a, b| {
            a.price
                .total_cmp(&b.price)
                .then_with(|| b.rating.total_cmp(&a.rating))
        })
        .cloned();

    let best_rated = matches
        .iter()
        .max_by(|a, b| match a.rating.total_cmp(&b.rating) {
            Ordering::Equal => b.price.total_cmp(&a.price),
            other => other,
        })
        .cloned();

    Recommendations {
        best_value,
        lowest_price,
        best_rated,
    }
}
