//! HTTP routes

mod badgify;
mod billing;

use axum::{middleware, routing::get, Router};
use shopgate_billing::GuardPolicy;

use crate::{
    auth::{require_entitlement, GuardState},
    state::AppState,
};

pub use billing::PlanOffer;

pub fn create_router(state: AppState) -> Router {
    // Premium features: entitled or trialing shops only
    let premium = GuardState::new(
        state.guard.clone(),
        GuardPolicy::premium_feature(state.config.billing.billing_url.clone()),
    );

    let premium_routes = Router::new()
        .route("/app/badgify", get(badgify::badgify))
        .route_layer(middleware::from_fn_with_state(premium, require_entitlement));

    Router::new()
        .route("/health", get(health))
        .route("/api/v1/billing/status", get(billing::status))
        .route("/app", get(billing::dashboard))
        .route("/app/billing", get(billing::overview))
        .merge(premium_routes)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
