/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use reviewflow_api::{app::{build_router, AppState}, config::Config};
/// use reviewflow_shared::{directory::InMemoryDirectory, engine::ReviewEngine};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::load()?;
/// let engine = ReviewEngine::new(Arc::new(InMemoryDirectory::new()));
/// let app = build_router(AppState::new(engine, config));
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::rate_limit::RateLimiter};
use axum::{
    routing::{get, post},
    Router,
};
use reviewflow_shared::engine::ReviewEngine;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Reviewer-assignment engine
    pub engine: Arc<ReviewEngine>,

    /// Application configuration
    pub config: Arc<Config>,

    /// Global limiter; None when limiting is disabled
    pub rate_limiter: Option<Arc<RateLimiter>>,
}

impl AppState {
    /// Creates new application state
    pub fn new(engine: ReviewEngine, config: Config) -> Self {
        let rate_limiter = RateLimiter::from_config(&config.rate_limit).map(Arc::new);
        Self {
            engine: Arc::new(engine),
            config: Arc::new(config),
            rate_limiter,
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /health
/// ├── /team/
/// │   ├── POST /add
/// │   ├── GET  /get?team_name=
/// │   └── POST /deactivateMembers
/// ├── /users/
/// │   ├── POST /setIsActive
/// │   └── GET  /getReview?user_id=
/// ├── /pullRequest/
/// │   ├── POST /create
/// │   ├── POST /merge
/// │   └── POST /reassign
/// └── GET  /stats
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Rate limiting (all routes except `/health`)
/// 2. Logging (tower-http TraceLayer)
/// 3. CORS (permissive)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let team_routes = Router::new()
        .route("/add", post(routes::teams::add_team))
        .route("/get", get(routes::teams::get_team))
        .route("/deactivateMembers", post(routes::teams::deactivate_members));

    let user_routes = Router::new()
        .route("/setIsActive", post(routes::users::set_is_active))
        .route("/getReview", get(routes::users::get_review));

    let pull_request_routes = Router::new()
        .route("/create", post(routes::pull_requests::create_pull_request))
        .route("/merge", post(routes::pull_requests::merge_pull_request))
        .route("/reassign", post(routes::pull_requests::reassign_reviewer));

    let api_routes = Router::new()
        .nest("/team", team_routes)
        .nest("/users", user_routes)
        .nest("/pullRequest", pull_request_routes)
        .route("/stats", get(routes::stats::get_stats))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::rate_limit::rate_limit_layer,
        ));

    Router::new()
        .merge(health_routes)
        .merge(api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
