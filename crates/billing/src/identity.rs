//! Tenant identity
//!
//! The entitlement core never looks at HTTP requests. Hosts translate
//! whatever they receive into a [`TenantContext`] and plug in an
//! [`IdentityProvider`] that knows how to turn it into a [`TenantId`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BillingResult;

/// Identifier of a tenant (the shop's myshopify domain)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TenantId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TenantId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Host-supplied description of the request being checked
#[derive(Debug, Clone, Default)]
pub struct TenantContext {
    /// Raw session credential, if the request carried one
    pub session_token: Option<String>,
    /// Request path, only used for log context
    pub request_path: Option<String>,
}

impl TenantContext {
    pub fn new(session_token: Option<String>) -> Self {
        Self {
            session_token,
            request_path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.request_path = Some(path.into());
        self
    }

    /// Context with no credentials at all
    pub fn anonymous() -> Self {
        Self::default()
    }
}

/// Resolves the tenant behind a request.
///
/// Implementations fail with [`crate::BillingError::Unauthenticated`] when
/// the context has no valid session.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve(&self, ctx: &TenantContext) -> BillingResult<TenantId>;
}
