use super::dataset::{Rating, RatingsDataset, UserId};
use super::encoder::RestaurantId;
use crate::error::{AppError, AppResult};

/// Historical ratings plus the synthetic ratings of one pseudo-user
#[derive(Debug, Clone)]
pub struct AugmentedDataset {
    pub pseudo_user_id: UserId,
    pub ratings: Vec<Rating>,
}

/// Appends a fresh pseudo-user who gives `max_rating` to every favorite.
///
/// The pseudo-user id is one past the largest historical user id, so it never
/// collides with a real user.
pub fn augment(
    dataset: &RatingsDataset,
    favorite_ids: &[RestaurantId],
    max_rating: f64,
) -> AppResult<AugmentedDataset> {
    let pseudo_user_id = dataset
        .max_user_id()
        .checked_add(1)
        .ok_or_else(|| AppError::FitFailure("user id space exhausted".to_string()))?;

    let mut ratings = Vec::with_capacity(dataset.len() + favorite_ids.len());
    ratings.extend_from_slice(dataset.ratings());
    ratings.extend(
        favorite_ids
            .iter()
            .map(|&restaurant_id| Rating::new(pseudo_user_id, restaurant_id, max_rating)),
    );

    Ok(AugmentedDataset {
        pseudo_user_id,
        ratings,
    })
}
