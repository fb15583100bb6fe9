pub mod auth_routes;
pub mod health;
pub mod resume_routes;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::middleware::{auth::require_auth, rate_limit};
use crate::AppState;

/// Full HTTP surface. Transport layers (tracing, CORS) are added by the binary.
pub fn router(state: AppState) -> Router {
    let limiter = rate_limit::RateLimiter::new(state.config.auth_rps);

    let public_auth = Router::new()
        .route("/api/auth/signup", post(auth_routes::signup))
        .route("/api/auth/login", post(auth_routes::login))
        .layer(from_fn_with_state(limiter, rate_limit::rps_middleware));

    let protected = Router::new()
        .route("/api/auth/logout", post(auth_routes::logout))
        .route("/api/resumes", get(resume_routes::list_resumes))
        .route("/api/resumes/upload", post(resume_routes::upload_resumes))
        .route(
            "/api/resumes/:id",
            get(resume_routes::get_resume).delete(resume_routes::delete_resume),
        )
        .route("/api/resumes/:id/data", get(resume_routes::get_resume_data))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health::health))
        .merge(public_auth)
        .merge(protected)
        .layer(DefaultBodyLimit::max(state.config.upload.max_content_length))
        .with_state(state)
}
