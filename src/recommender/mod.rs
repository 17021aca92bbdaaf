//! On-demand cold-start recommender.
//!
//! A request names 3 to 5 favorite restaurants. They are resolved through the
//! encoder, attached to a fresh pseudo-user with maximal ratings, and a new
//! SVD++ model is fitted over the historical ratings plus that pseudo-user.
//! Every restaurant the pseudo-user has not rated is then scored and ranked.
//!
//! Nothing here is mutated after construction; concurrent requests share a
//! [`RecommenderContext`] by reference.

pub mod augment;
pub mod dataset;
pub mod encoder;
pub mod model;
pub mod ranker;
pub mod svdpp;
pub mod trainset;
pub mod validator;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

pub use augment::{augment, AugmentedDataset};
pub use dataset::{Rating, RatingsDataset, UserId};
pub use encoder::{RestaurantEncoder, RestaurantId};
pub use model::{ModelFitter, RatingPredictor};
pub use svdpp::{FitParams, SvdPlusPlus, SvdPlusPlusFitter};
pub use trainset::{RatingScale, Trainset};
pub use validator::{check_selection, resolve_favorites, MAX_FAVORITES, MIN_FAVORITES};

use crate::error::{AppError, AppResult};
use crate::models::Recommendation;

/// Read-only inputs shared by every recommendation request
pub struct RecommenderContext {
    dataset: RatingsDataset,
    encoder: RestaurantEncoder,
    scale: RatingScale,
    fitter: Arc<dyn ModelFitter>,
}

impl std::fmt::Debug for RecommenderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecommenderContext")
            .field("ratings", &self.dataset.len())
            .field("restaurants", &self.encoder.len())
            .field("scale", &self.scale)
            .field("fitter", &self.fitter.name())
            .finish()
    }
}

impl RecommenderContext {
    pub fn new(
        dataset: RatingsDataset,
        encoder: RestaurantEncoder,
        scale: RatingScale,
        fitter: Arc<dyn ModelFitter>,
    ) -> AppResult<Self> {
        scale
            .validate()
            .map_err(|e| AppError::Dataset(e.to_string()))?;

        if let Some(id) = dataset
            .restaurant_ids()
            .iter()
            .find(|&&id| encoder.name_of(id).is_none())
        {
            return Err(AppError::Dataset(format!(
                "restaurant id {} has no name in the encoder",
                id
            )));
        }

        Ok(Self {
            dataset,
            encoder,
            scale,
            fitter,
        })
    }

    /// Context fitting SVD++ with `params` on every request
    pub fn with_svdpp(
        dataset: RatingsDataset,
        encoder: RestaurantEncoder,
        scale: RatingScale,
        params: FitParams,
    ) -> AppResult<Self> {
        Self::new(dataset, encoder, scale, Arc::new(SvdPlusPlusFitter::new(params)))
    }

    pub fn encoder(&self) -> &RestaurantEncoder {
        &self.encoder
    }

    /// Recommends up to `k` restaurants for a user whose favorites are `favorites`.
    ///
    /// Favorites are never recommended back. Fewer than `k` candidates yields a
    /// shorter list, and no candidates at all yields an empty one. Selection and
    /// name errors are raised before any model is fitted.
    pub fn recommend<S: AsRef<str>>(
        &self,
        favorites: &[S],
        k: usize,
    ) -> AppResult<Vec<Recommendation>> {
        self.recommend_cancellable(favorites, k, &AtomicBool::new(false))
    }

    /// Same as [`recommend`](Self::recommend), but the fit gives up once
    /// `cancel` is set.
    pub fn recommend_cancellable<S: AsRef<str>>(
        &self,
        favorites: &[S],
        k: usize,
        cancel: &AtomicBool,
    ) -> AppResult<Vec<Recommendation>> {
        if k == 0 {
            return Err(AppError::InvalidSelection(
                "number of recommendations must be positive".to_string(),
            ));
        }

        let favorite_ids = resolve_favorites(favorites, &self.encoder).map_err(|e| {
            if let AppError::NameNotFound(missing) = &e {
                tracing::warn!(missing = ?missing, "Unknown restaurant names in selection");
            }
            e
        })?;

        let candidates = ranker::candidates(self.dataset.restaurant_ids(), &favorite_ids);
        if candidates.is_empty() {
            tracing::warn!(
                favorites = favorite_ids.len(),
                "Every restaurant is a favorite, nothing left to recommend"
            );
            return Ok(Vec::new());
        }

        let augmented = augment(&self.dataset, &favorite_ids, self.scale.max)?;
        let trainset = Trainset::build(&augmented.ratings, self.scale)?;

        tracing::debug!(
            pseudo_user_id = augmented.pseudo_user_id,
            users = trainset.n_users(),
            items = trainset.n_items(),
            ratings = trainset.n_ratings(),
            "Trainset built"
        );

        let start = Instant::now();
        let model = self.fitter.fit(&trainset, cancel).map_err(|e| {
            tracing::error!(fitter = self.fitter.name(), error = %e, "Model fit failed");
            e
        })?;
        tracing::info!(
            fitter = self.fitter.name(),
            fit_ms = start.elapsed().as_millis(),
            "Model fitted"
        );

        let recommendations = ranker::rank(
            model.as_ref(),
            augmented.pseudo_user_id,
            &candidates,
            &self.encoder,
            k,
        )?;

        tracing::info!(
            favorites = favorite_ids.len(),
            candidates = candidates.len(),
            returned = recommendations.len(),
            "Recommendations ranked"
        );

        Ok(recommendations)
    }
}
