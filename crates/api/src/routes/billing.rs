//! Billing status, dashboard and plan routes
//!
//! None of these are guarded: `/app/billing` is where denied requests land.

use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde::Serialize;
use shopgate_billing::{DashboardSummary, EntitlementState};

use crate::{auth::RequestTenant, state::AppState};

/// Plan offered on the billing page, with the shop's current standing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanOffer {
    pub plan_name: String,
    pub price_per_month: Decimal,
    pub trial_days: u32,
    pub entitlement: EntitlementState,
}

/// GET /api/v1/billing/status
///
/// A malformed subscription record is reported here with the route it hit,
/// then answered with the zero state like every other failure.
pub async fn status(
    State(state): State<AppState>,
    RequestTenant(ctx): RequestTenant,
) -> Json<EntitlementState> {
    match state.entitlements.try_check_tenant(&ctx).await {
        Ok(status) => Json(status.state),
        Err(e) => {
            tracing::error!(
                route = "/api/v1/billing/status",
                error = %e,
                "billing status: subscription record unusable, reporting zero state"
            );
            Json(EntitlementState::zero())
        }
    }
}

/// GET /app
pub async fn dashboard(
    State(state): State<AppState>,
    RequestTenant(ctx): RequestTenant,
) -> Json<DashboardSummary> {
    let status = state.entitlements.check_tenant(&ctx).await;
    Json(DashboardSummary::build(&status, &state.config.billing))
}

/// GET /app/billing
pub async fn overview(
    State(state): State<AppState>,
    RequestTenant(ctx): RequestTenant,
) -> Json<PlanOffer> {
    let billing = &state.config.billing;
    Json(PlanOffer {
        plan_name: billing.default_plan_name.clone(),
        price_per_month: billing.price_per_month,
        trial_days: billing.trial_days,
        entitlement: state.entitlements.check_status(&ctx).await,
    })
}
