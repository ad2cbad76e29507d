//! HTTP surface: routing, auth, rate limiting and CORS

pub mod auth;
pub mod error;
pub mod health;
pub mod rate_limit;
pub mod recipes;

pub use auth::{AuthUser, TokenVerifier};
pub use error::{ApiError, ErrorResponse};
pub use rate_limit::RateLimiter;

use axum::{
    extract::MatchedPath,
    http::{header, HeaderValue, Method, Request},
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::config::Config;
use crate::service::RecipeService;

/// Prefix of every recipe route
pub const API_PREFIX: &str = "/api/v1";

/// Shared handles passed to every handler
#[derive(Clone)]
pub struct AppState {
    pub service: RecipeService,
    pub verifier: Arc<dyn TokenVerifier>,
    pub limiter: Arc<RateLimiter>,
    pub environment: Arc<str>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        service: RecipeService,
        verifier: Arc<dyn TokenVerifier>,
        config: &Config,
    ) -> Self {
        Self {
            service,
            verifier,
            limiter: Arc::new(RateLimiter::new(config.rate_limit.clone())),
            environment: Arc::from(config.environment.as_str()),
            started_at: Instant::now(),
        }
    }
}

/// Routes without CORS or tracing, ready for `oneshot` in tests
pub fn router(state: AppState) -> Router {
    let generation = Router::new()
        .route("/recipes/generate", post(recipes::generate_recipes))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ))
        .route("/recipes/test", post(recipes::test_generation))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::rate_limit,
        ));

    let protected = Router::new()
        .route(
            "/recipes/favorites",
            post(recipes::add_favorite).get(recipes::list_favorites),
        )
        .route("/recipes/favorites/:recipe_id", delete(recipes::remove_favorite))
        .route(
            "/recipes/favorites/check/:recipe_id",
            get(recipes::check_favorite),
        )
        .route("/recipes/user/account", delete(recipes::delete_account))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .nest(API_PREFIX, generation.merge(protected))
        .route("/health", get(health::health))
        .with_state(state)
}

/// CORS policy: any origin in development, the configured list otherwise
pub fn cors_layer(config: &Config) -> CorsLayer {
    let origin = if config.is_development() {
        AllowOrigin::mirror_request()
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
}

/// The full application with CORS and request tracing
pub fn app(state: AppState, config: &Config) -> Router {
    router(state).layer(cors_layer(config)).layer(
        TraceLayer::new_for_http()
            .make_span_with(|request: &Request<_>| {
                let matched_path = request
                    .extensions()
                    .get::<MatchedPath>()
                    .map(MatchedPath::as_str)
                    .unwrap_or(request.uri().path());

                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %matched_path,
                )
            })
            .on_request(|_request: &Request<_>, _span: &Span| {})
            .on_response(
                |response: &axum::http::Response<_>, latency: Duration, _span: &Span| {
                    let status = response.status().as_u16();
                    if status >= 500 {
                        tracing::error!(
                            status = %status,
                            latency_ms = %latency.as_millis(),
                            "request failed with server error"
                        );
                    } else {
                        tracing::info!(
                            status = %status,
                            latency_ms = %latency.as_millis(),
                            "request completed"
                        );
                    }
                },
            ),
    )
}
