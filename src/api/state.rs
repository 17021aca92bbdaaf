use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::Session;
use crate::services::{FeedbackSink, RecommendationService};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub recommendations: RecommendationService,
    pub feedback: Arc<dyn FeedbackSink>,
    pub sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
    session_ttl: chrono::Duration,
}

impl AppState {
    /// Creates state with no open sessions
    pub fn new(
        recommendations: RecommendationService,
        feedback: Arc<dyn FeedbackSink>,
        session_ttl: Duration,
    ) -> Self {
        Self {
            recommendations,
            feedback,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            session_ttl: chrono::Duration::from_std(session_ttl).unwrap_or(chrono::Duration::MAX),
        }
    }

    /// Applies `f` to the session `id` under the write lock
    pub async fn with_session<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut Session) -> AppResult<T>,
    ) -> AppResult<T> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("session {}", id)))?;
        f(session)
    }

    /// Drops every session opened longer than the TTL ago; returns how many went
    pub async fn evict_expired(&self) -> usize {
        let now = chrono::Local::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now, self.session_ttl));

        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!(evicted, remaining = sessions.len(), "Expired sessions dropped");
        }
        evicted
    }

    /// Runs [`evict_expired`](Self::evict_expired) every `period` in the background
    pub fn spawn_session_sweeper(&self, period: Duration) -> JoinHandle<()> {
        let state = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                state.evict_expired().await;
            }
        })
    }
}
