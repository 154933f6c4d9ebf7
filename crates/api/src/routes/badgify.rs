//! Badge generator entry point (premium)

use axum::{Extension, Json};
use serde_json::{json, Value};
use shopgate_billing::TenantStatus;

/// GET /app/badgify
///
/// Only reachable through `require_entitlement`, which supplies the status.
pub async fn badgify(Extension(status): Extension<TenantStatus>) -> Json<Value> {
    Json(json!({ "shop": status.tenant }))
}
