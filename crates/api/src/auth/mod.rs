//! Authentication and entitlement enforcement for Shopgate

pub mod middleware;
pub mod session_token;

pub use middleware::{require_entitlement, tenant_context, GuardState, RequestTenant};
pub use session_token::{SessionClaims, SessionTokenProvider};
