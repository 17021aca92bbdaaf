use std::sync::atomic::AtomicBool;

use super::dataset::UserId;
use super::encoder::RestaurantId;
use super::trainset::Trainset;
use crate::error::AppResult;

/// A fitted model that estimates how a user would rate a restaurant
pub trait RatingPredictor: Send {
    /// Estimated rating, already clipped into the trainset's rating scale
    fn predict(&self, user_id: UserId, restaurant_id: RestaurantId) -> f64;
}

/// Fits a fresh model over a trainset
///
/// Implementations must not keep state between calls: every request brings a
/// new pseudo-user that no earlier model has seen. Once `cancel` is set the fit
/// should stop at its next checkpoint and return an error.
#[cfg_attr(test, mockall::automock)]
pub trait ModelFitter: Send + Sync {
    fn fit(&self, trainset: &Trainset, cancel: &AtomicBool)
        -> AppResult<Box<dyn RatingPredictor>>;

    /// Fitter name for logging
    fn name(&self) -> &'static str;
}
