use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use resto_rec::{
    api::{create_router, AppState},
    config::Config,
    data::load_ratings,
    recommender::RecommenderContext,
    services::{CsvFeedbackLog, RecommendationService},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resto_rec=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    // Loaded once; every request reads the same immutable context
    let loaded = load_ratings(&config.ratings_path)
        .with_context(|| format!("Failed to load ratings from {}", config.ratings_path))?;
    let context = RecommenderContext::with_svdpp(
        loaded.dataset,
        loaded.encoder,
        config.rating_scale(),
        config.fit_params(),
    )?;
    tracing::info!(context = ?context, "Recommender ready");

    let recommendations = RecommendationService::new(
        Arc::new(context),
        Duration::from_secs(config.fit_timeout_secs),
        config.default_k,
    );
    let feedback = Arc::new(CsvFeedbackLog::new(&config.feedback_log_path));
    let session_ttl = Duration::from_secs(config.session_ttl_secs);
    let state = AppState::new(recommendations, feedback, session_ttl);
    // Sweep a few times per TTL so expired sessions do not linger long
    state.spawn_session_sweeper((session_ttl / 4).max(Duration::from_secs(1)));

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(address = %addr, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
