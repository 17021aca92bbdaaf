use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::{
    error::{AppError, AppResult},
    models::Recommendation,
    recommender::{check_selection, RecommenderContext},
};

/// Generates cold-start restaurant recommendations
///
/// Each request refits the model on tokio's blocking pool, so concurrent
/// requests run side by side and a failed fit only affects its own request.
/// The whole run is bounded by a request-scoped timeout.
#[derive(Clone)]
pub struct RecommendationService {
    context: Arc<RecommenderContext>,
    timeout: Duration,
    default_k: usize,
}

impl RecommendationService {
    pub fn new(context: Arc<RecommenderContext>, timeout: Duration, default_k: usize) -> Self {
        Self {
            context,
            timeout,
            default_k,
        }
    }

    pub fn context(&self) -> &RecommenderContext {
        &self.context
    }

    /// Sorted restaurant names for the selection form
    pub fn catalog(&self) -> Vec<String> {
        self.context.encoder().names().to_vec()
    }

    /// Recommends up to `k` (or the configured default) restaurants for `favorites`.
    ///
    /// Selection size and names are checked before a worker is taken. When the
    /// timeout fires, or the caller stops waiting, the fit is told to stop at its
    /// next epoch.
    pub async fn recommend(
        &self,
        favorites: Vec<String>,
        k: Option<usize>,
    ) -> AppResult<Vec<Recommendation>> {
        let k = k.unwrap_or(self.default_k);

        check_selection(&favorites)?;
        self.context.encoder().transform(&favorites)?;

        tracing::info!(
            favorites = favorites.len(),
            k,
            timeout_ms = self.timeout.as_millis(),
            "Starting recommendation"
        );

        let start = Instant::now();
        let cancel = CancelOnDrop::default();
        let flag = Arc::clone(&cancel.0);
        let context = Arc::clone(&self.context);
        let task = tokio::task::spawn_blocking(move || {
            context.recommend_cancellable(&favorites, k, &flag)
        });

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => {
                tracing::info!(
                    processing_time_ms = start.elapsed().as_millis(),
                    success = result.is_ok(),
                    "Recommendation finished"
                );
                result
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Recommendation worker failed");
                Err(AppError::Internal(format!("recommendation worker failed: {}", e)))
            }
            Err(_) => {
                cancel.cancel();
                tracing::error!(
                    timeout_ms = self.timeout.as_millis(),
                    "Recommendation timed out"
                );
                Err(AppError::Timeout(self.timeout))
            }
        }
    }
}

/// Stops the worker's fit when the awaiting request goes away
#[derive(Default)]
struct CancelOnDrop(Arc<AtomicBool>);

impl CancelOnDrop {
    fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.cancel();
    }
}
