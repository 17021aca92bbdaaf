use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::encoder::RestaurantId;
use crate::error::{AppError, AppResult};

/// Raw user id as it appears in the ratings table
pub type UserId = u64;

/// A single (user, restaurant, rating) tuple
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub restaurant_id: RestaurantId,
    pub rating: f64,
}

impl Rating {
    pub fn new(user_id: UserId, restaurant_id: RestaurantId, rating: f64) -> Self {
        Self {
            user_id,
            restaurant_id,
            rating,
        }
    }
}

/// Historical ratings, immutable once loaded
#[derive(Debug, Clone)]
pub struct RatingsDataset {
    ratings: Vec<Rating>,
    max_user_id: UserId,
    restaurant_ids: Vec<RestaurantId>,
}

impl RatingsDataset {
    pub fn new(ratings: Vec<Rating>) -> AppResult<Self> {
        let max_user_id = ratings
            .iter()
            .map(|r| r.user_id)
            .max()
            .ok_or_else(|| AppError::Dataset("ratings table is empty".to_string()))?;

        if let Some(bad) = ratings.iter().find(|r| !r.rating.is_finite()) {
            return Err(AppError::Dataset(format!(
                "non-finite rating for user {} and restaurant {}",
                bad.user_id, bad.restaurant_id
            )));
        }

        let restaurant_ids = ratings
            .iter()
            .map(|r| r.restaurant_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        Ok(Self {
            ratings,
            max_user_id,
            restaurant_ids,
        })
    }

    pub fn ratings(&self) -> &[Rating] {
        &self.ratings
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    pub fn max_user_id(&self) -> UserId {
        self.max_user_id
    }

    /// Distinct restaurant ids that received at least one rating, ascending
    pub fn restaurant_ids(&self) -> &[RestaurantId] {
        &self.restaurant_ids
    }
}
