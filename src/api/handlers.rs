use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::request_id::RequestId;
use crate::models::{
    CatalogResponse, FeedbackEntry, FeedbackRequest, RecommendationRequest,
    RecommendationResponse, Session,
};
use crate::recommender::check_selection;

use super::AppState;

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Restaurants available for selection, sorted by name
pub async fn list_restaurants(State(state): State<AppState>) -> Json<CatalogResponse> {
    Json(CatalogResponse {
        restaurants: state.recommendations.catalog(),
    })
}

/// One-shot recommendation without session bookkeeping
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<RecommendationResponse>> {
    tracing::info!(
        request_id = %request_id,
        favorites = request.favorites.len(),
        "Processing recommendation request"
    );

    let recommendations = state
        .recommendations
        .recommend(request.favorites.clone(), request.k)
        .await?;

    Ok(Json(RecommendationResponse {
        favorites: request.favorites,
        recommendations,
    }))
}

/// Opens a new session in the selecting state
pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<Session>) {
    let session = Session::new();
    state
        .sessions
        .write()
        .await
        .insert(session.id, session.clone());

    tracing::debug!(session_id = %session.id, "Session created");
    (StatusCode::CREATED, Json(session))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Session>> {
    state
        .with_session(id, |session| Ok(Json(session.clone())))
        .await
}

/// Drops a session; the client starts over with a new one
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state
        .sessions
        .write()
        .await
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| AppError::NotFound(format!("session {}", id)))
}

/// Runs the selection through validation and recommendation for a session
pub async fn recommend_for_session(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<RecommendationResponse>> {
    let favorites = request.favorites;

    state
        .with_session(id, |session| session.submit_selection(favorites.clone()))
        .await?;

    let validation = check_selection(&favorites).and_then(|_| {
        state
            .recommendations
            .context()
            .encoder()
            .transform(&favorites)
            .map(|_| ())
    });
    if let Err(e) = validation {
        tracing::info!(request_id = %request_id, session_id = %id, error = %e, "Selection rejected");
        state.with_session(id, Session::reject_selection).await?;
        return Err(e);
    }

    state.with_session(id, Session::start_recommending).await?;

    tracing::info!(
        request_id = %request_id,
        session_id = %id,
        favorites = favorites.len(),
        "Processing session recommendation"
    );

    // The fit and the state change that follows it run in their own task, so a
    // client that hangs up cannot leave the session stuck in Recommending.
    let task_state = state.clone();
    let task_favorites = favorites.clone();
    let recommendations = tokio::spawn(async move {
        let result = task_state
            .recommendations
            .recommend(task_favorites, request.k)
            .await;
        let transition = match &result {
            Ok(recommendations) => {
                task_state
                    .with_session(id, |session| {
                        session.show_recommendations(recommendations.clone())
                    })
                    .await
            }
            Err(_) => task_state.with_session(id, Session::reject_selection).await,
        };
        transition.and(result)
    })
    .await
    .map_err(|e| AppError::Internal(format!("session recommendation task failed: {}", e)))??;

    Ok(Json(RecommendationResponse {
        favorites,
        recommendations,
    }))
}

/// Records the satisfaction survey, then forgets the session
pub async fn submit_feedback(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<FeedbackRequest>,
) -> AppResult<StatusCode> {
    let entry = state
        .with_session(id, |session| {
            session.submit_feedback(request.satisfaction)?;
            Ok(FeedbackEntry {
                submitted_at: chrono::Local::now(),
                selected: session.selected.clone(),
                recommended: session.recommended_names(),
                satisfaction: request.satisfaction,
            })
        })
        .await?;

    if let Err(e) = state.feedback.append(entry).await {
        tracing::error!(session_id = %id, error = %e, "Failed to log feedback");
        state.with_session(id, Session::reopen_feedback).await?;
        return Err(e);
    }

    // Nothing left to do with a submitted session
    state.sessions.write().await.remove(&id);
    tracing::debug!(session_id = %id, "Session closed");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::time::Duration;

    use axum_test::TestServer;
    use serde_json::json;

    use crate::api::create_router;
    use crate::models::SessionState;
    use crate::recommender::{
        ModelFitter, Rating, RatingPredictor, RatingScale, RatingsDataset, RecommenderContext,
        RestaurantEncoder, Trainset,
    };
    use crate::services::feedback::MockFeedbackSink;
    use crate::services::{FeedbackSink, RecommendationService};

    struct Flat;

    impl RatingPredictor for Flat {
        fn predict(&self, _user_id: u64, _restaurant_id: u32) -> f64 {
            3.0
        }
    }

    struct SlowFitter(Duration);

    impl ModelFitter for SlowFitter {
        fn fit(
            &self,
            _trainset: &Trainset,
            _cancel: &AtomicBool,
        ) -> AppResult<Box<dyn RatingPredictor>> {
            std::thread::sleep(self.0);
            Ok(Box::new(Flat))
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    fn state(fit_time: Duration, feedback: Arc<dyn FeedbackSink>) -> AppState {
        let encoder = RestaurantEncoder::fit(["A", "B", "C", "D", "E"]).unwrap();
        let ratings = (0..5u32).map(|i| Rating::new(1, i, 3.0)).collect();
        let dataset = RatingsDataset::new(ratings).unwrap();
        let context = RecommenderContext::new(
            dataset,
            encoder,
            RatingScale::default(),
            Arc::new(SlowFitter(fit_time)),
        )
        .unwrap();
        let service = RecommendationService::new(Arc::new(context), Duration::from_secs(5), 10);
        AppState::new(service, feedback, Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn test_feedback_is_logged_and_session_closed() {
        let mut sink = MockFeedbackSink::new();
        sink.expect_append()
            .times(1)
            .withf(|entry| {
                entry.selected == ["A", "B", "C"]
                    && entry.recommended == ["D", "E"]
                    && entry.satisfaction == 7
            })
            .returning(|_| Ok(()));

        let state = state(Duration::ZERO, Arc::new(sink));
        let server = TestServer::new(create_router(state.clone())).unwrap();

        let session: serde_json::Value = server.post("/api/v1/sessions").await.json();
        let id = session["id"].as_str().unwrap().to_string();

        server
            .post(&format!("/api/v1/sessions/{}/recommendations", id))
            .json(&json!({ "favorites": ["A", "B", "C"] }))
            .await
            .assert_status_ok();

        server
            .post(&format!("/api/v1/sessions/{}/feedback", id))
            .json(&json!({ "satisfaction": 7 }))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        server
            .get(&format!("/api/v1/sessions/{}", id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
        assert!(state.sessions.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_rejected_feedback_is_not_logged() {
        let mut sink = MockFeedbackSink::new();
        sink.expect_append().times(0);

        let state = state(Duration::ZERO, Arc::new(sink));
        let server = TestServer::new(create_router(state)).unwrap();

        let session: serde_json::Value = server.post("/api/v1/sessions").await.json();
        let id = session["id"].as_str().unwrap().to_string();

        server
            .post(&format!("/api/v1/sessions/{}/feedback", id))
            .json(&json!({ "satisfaction": 7 }))
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_session_advances_when_client_hangs_up() {
        let state = state(Duration::from_millis(100), Arc::new(MockFeedbackSink::new()));
        let session = Session::new();
        let id = session.id;
        state.sessions.write().await.insert(id, session);

        let request = RecommendationRequest {
            favorites: vec!["A".to_string(), "B".to_string(), "C".to_string()],
            k: None,
        };
        let handler = recommend_for_session(
            State(state.clone()),
            Extension(RequestId(Uuid::new_v4())),
            Path(id),
            Json(request),
        );

        // Dropped while the fit is still running
        assert!(tokio::time::timeout(Duration::from_millis(20), handler)
            .await
            .is_err());
        assert_eq!(
            state.sessions.read().await[&id].state,
            SessionState::Recommending
        );

        tokio::time::sleep(Duration::from_millis(400)).await;
        let sessions = state.sessions.read().await;
        assert_eq!(sessions[&id].state, SessionState::AwaitingFeedback);
        assert_eq!(sessions[&id].recommendations.len(), 2);
    }
}
