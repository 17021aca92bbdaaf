use std::cmp::Ordering;
use std::collections::HashSet;

use super::dataset::UserId;
use super::encoder::{RestaurantEncoder, RestaurantId};
use super::model::RatingPredictor;
use crate::error::AppResult;
use crate::models::Recommendation;

/// Restaurants in `universe` that are not among the favorites
pub fn candidates(universe: &[RestaurantId], favorite_ids: &[RestaurantId]) -> Vec<RestaurantId> {
    let favorites: HashSet<RestaurantId> = favorite_ids.iter().copied().collect();
    universe
        .iter()
        .copied()
        .filter(|id| !favorites.contains(id))
        .collect()
}

/// Scores every candidate for `user_id` and keeps the best `k`.
///
/// Ordered by predicted rating descending, then by restaurant name ascending.
pub fn rank(
    model: &dyn RatingPredictor,
    user_id: UserId,
    candidates: &[RestaurantId],
    encoder: &RestaurantEncoder,
    k: usize,
) -> AppResult<Vec<Recommendation>> {
    let mut scored = candidates
        .iter()
        .map(|&id| {
            encoder
                .inverse_transform(id)
                .map(|name| (name, model.predict(user_id, id)))
        })
        .collect::<AppResult<Vec<(&str, f64)>>>()?;

    scored.sort_by(|(name_a, score_a), (name_b, score_b)| {
        score_b
            .partial_cmp(score_a)
            .unwrap_or(Ordering::Equal)
            .then_with(|| name_a.cmp(name_b))
    });

    Ok(scored
        .into_iter()
        .take(k)
        .map(|(name, predicted_rating)| Recommendation {
            name: name.to_string(),
            predicted_rating,
        })
        .collect())
}
