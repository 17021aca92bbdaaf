use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::dataset::{Rating, UserId};
use super::encoder::RestaurantId;
use crate::error::{AppError, AppResult};

/// Closed interval of valid ratings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingScale {
    pub min: f64,
    pub max: f64,
}

impl RatingScale {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn validate(&self) -> AppResult<()> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min >= self.max {
            return Err(AppError::FitFailure(format!(
                "degenerate rating scale [{}, {}]",
                self.min, self.max
            )));
        }
        Ok(())
    }

    pub fn contains(&self, rating: f64) -> bool {
        rating >= self.min && rating <= self.max
    }

    pub fn clip(&self, rating: f64) -> f64 {
        rating.clamp(self.min, self.max)
    }
}

impl Default for RatingScale {
    fn default() -> Self {
        Self::new(1.0, 5.0)
    }
}

/// Dense-indexed view of the rating tuples consumed by the fitter.
///
/// Raw ids are mapped to inner indices in order of first appearance. Every
/// tuple is kept, including repeated (user, restaurant) pairs.
#[derive(Debug, Clone)]
pub struct Trainset {
    scale: RatingScale,
    global_mean: f64,
    user_index: HashMap<UserId, usize>,
    item_index: HashMap<RestaurantId, usize>,
    /// Per inner user: (inner item, rating)
    user_ratings: Vec<Vec<(usize, f64)>>,
    /// (inner user, inner item, rating) in input order
    all_ratings: Vec<(usize, usize, f64)>,
    n_items: usize,
}

impl Trainset {
    pub fn build(ratings: &[Rating], scale: RatingScale) -> AppResult<Self> {
        scale.validate()?;
        if ratings.is_empty() {
            return Err(AppError::FitFailure("no ratings to train on".to_string()));
        }

        let mut user_index: HashMap<UserId, usize> = HashMap::new();
        let mut item_index: HashMap<RestaurantId, usize> = HashMap::new();
        let mut user_ratings: Vec<Vec<(usize, f64)>> = Vec::new();
        let mut all_ratings = Vec::with_capacity(ratings.len());
        let mut sum = 0.0;

        for r in ratings {
            if !scale.contains(r.rating) {
                return Err(AppError::FitFailure(format!(
                    "rating {} of user {} for restaurant {} is outside [{}, {}]",
                    r.rating, r.user_id, r.restaurant_id, scale.min, scale.max
                )));
            }

            let next_user = user_index.len();
            let u = *user_index.entry(r.user_id).or_insert(next_user);
            if u == user_ratings.len() {
                user_ratings.push(Vec::new());
            }

            let next_item = item_index.len();
            let i = *item_index.entry(r.restaurant_id).or_insert(next_item);

            user_ratings[u].push((i, r.rating));
            all_ratings.push((u, i, r.rating));
            sum += r.rating;
        }

        let n_items = item_index.len();
        Ok(Self {
            scale,
            global_mean: sum / ratings.len() as f64,
            user_index,
            item_index,
            user_ratings,
            all_ratings,
            n_items,
        })
    }

    pub fn scale(&self) -> RatingScale {
        self.scale
    }

    pub fn global_mean(&self) -> f64 {
        self.global_mean
    }

    pub fn n_users(&self) -> usize {
        self.user_ratings.len()
    }

    pub fn n_items(&self) -> usize {
        self.n_items
    }

    pub fn n_ratings(&self) -> usize {
        self.all_ratings.len()
    }

    pub fn inner_user(&self, user_id: UserId) -> Option<usize> {
        self.user_index.get(&user_id).copied()
    }

    pub fn inner_item(&self, restaurant_id: RestaurantId) -> Option<usize> {
        self.item_index.get(&restaurant_id).copied()
    }

    pub fn user_index(&self) -> &HashMap<UserId, usize> {
        &self.user_index
    }

    pub fn item_index(&self) -> &HashMap<RestaurantId, usize> {
        &self.item_index
    }

    pub fn user_ratings(&self, inner_user: usize) -> &[(usize, f64)] {
        &self.user_ratings[inner_user]
    }

    pub fn all_ratings(&self) -> &[(usize, usize, f64)] {
        &self.all_ratings
    }
}
