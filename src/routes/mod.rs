pub mod account;
pub mod billing;
pub mod clerk_webhook;
pub mod health;
pub mod openapi;
pub mod reports;
pub mod stripe_webhook;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    middleware::{auth::require_session, rate_limit},
    AppState,
};

const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Full application router.
pub fn router(state: AppState, public_rps: u32) -> Router {
    let base_routes = Router::new()
        .route("/health", get(health::health))
        .route("/api/openapi.json", get(openapi::openapi_json));

    // Authenticated by signature only.
    let webhook_api = Router::new()
        .route("/api/clerk/webhooks", post(clerk_webhook::handle_clerk_webhook))
        .route("/api/webhooks", post(clerk_webhook::handle_clerk_webhook))
        .route("/api/stripe/webhooks", post(stripe_webhook::handle_stripe_webhook));

    let session_api = Router::new()
        .route(
            "/api/stripe/create-checkout-session",
            post(billing::create_checkout_session),
        )
        .route(
            "/api/stripe/create-portal-session",
            post(billing::create_portal_session),
        )
        .route("/api/account/disable", post(account::disable_account))
        .route(
            "/api/users/:user_id/subscription",
            get(reports::get_subscription),
        )
        .route("/api/users/:user_id/reports", get(reports::list_reports))
        .route(
            "/api/reports/:report_id/job-posts",
            get(reports::list_job_posts),
        )
        .route(
            "/api/reports/:report_id/job-posts/count",
            get(reports::count_job_posts),
        )
        .route("/api/match-scores", get(reports::get_match_score))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit::new_rps_state(public_rps),
            rate_limit::rps_middleware,
        ));

    base_routes
        .merge(webhook_api)
        .merge(session_api)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
}
