//! Entitlement middleware for Axum

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{
        header::{ACCEPT, AUTHORIZATION, LOCATION},
        request::Parts,
        HeaderMap, HeaderValue, StatusCode, Uri,
    },
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use shopgate_billing::{EntitlementGuard, GuardDecision, GuardPolicy, TenantContext};

/// Query parameter carrying the session token on the initial embedded load
const ID_TOKEN_PARAM: &str = "id_token";

/// Guard plus the policy a group of routes declares
#[derive(Clone)]
pub struct GuardState {
    pub guard: EntitlementGuard,
    pub policy: GuardPolicy,
}

impl GuardState {
    pub fn new(guard: EntitlementGuard, policy: GuardPolicy) -> Self {
        Self { guard, policy }
    }
}

/// Extract the session token from the Authorization header or the
/// `id_token` query parameter. The header wins when both are present.
fn extract_session_token(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    if let Some(header) = headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok()) {
        if let Some(token) = header.strip_prefix("Bearer ") {
            let token = token.trim();
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }

    let query = uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, value)| key == ID_TOKEN_PARAM && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}

/// Build the [`TenantContext`] for a request
pub fn tenant_context(headers: &HeaderMap, uri: &Uri) -> TenantContext {
    TenantContext::new(extract_session_token(headers, uri)).with_path(uri.path())
}

/// Extractor for handlers that run their own (unguarded) entitlement checks
#[derive(Debug, Clone)]
pub struct RequestTenant(pub TenantContext);

impl<S: Send + Sync> FromRequestParts<S> for RequestTenant {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(tenant_context(&parts.headers, &parts.uri)))
    }
}

/// Middleware that admits a request only if the tenant satisfies the
/// route group's [`GuardPolicy`]. Admitted requests carry the resolved
/// [`shopgate_billing::TenantStatus`] in their extensions.
pub async fn require_entitlement(
    State(guard_state): State<GuardState>,
    mut request: Request,
    next: Next,
) -> Response {
    let ctx = tenant_context(request.headers(), request.uri());
    let wants_json = accepts_json(request.headers());

    match guard_state.guard.enforce(&ctx, &guard_state.policy).await {
        GuardDecision::Admit(status) => {
            request.extensions_mut().insert(status);
            next.run(request).await
        }
        GuardDecision::Deny { redirect_to, .. } => {
            if wants_json {
                payment_required_response(&redirect_to)
            } else {
                redirect_response(&redirect_to)
            }
        }
    }
}

fn accepts_json(headers: &HeaderMap) -> bool {
    headers
        .get(ACCEPT)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"))
}

fn redirect_response(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::SEE_OTHER, [(LOCATION, value)]).into_response(),
        Err(_) => {
            tracing::error!(location = %location, "guard redirect target is not a valid header value");
            payment_required_response(location)
        }
    }
}

/// Response for tenants without an active subscription or trial
fn payment_required_response(billing_url: &str) -> Response {
    let body = Json(json!({
        "error": "payment_required",
        "message": "An active subscription or free trial is required to use this feature.",
        "code": 402,
        "billing_url": billing_url
    }));

    (StatusCode::PAYMENT_REQUIRED, body).into_response()
}
