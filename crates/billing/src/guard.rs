//! Entitlement guard
//!
//! Enforcement point in front of protected features. Every call re-runs the
//! entitlement check; admission is never cached, so a trial that expires
//! mid-session blocks the very next protected call.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::entitlement::{EntitlementState, TenantStatus};
use crate::identity::TenantContext;
use crate::service::EntitlementService;

/// Access policy declared by a feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardPolicy {
    /// Tenant must be entitled to pass
    pub require_active: bool,
    /// A running trial satisfies `require_active` on its own
    pub allow_trial: bool,
    /// Where to send callers that do not satisfy the policy
    pub redirect_to: String,
}

impl GuardPolicy {
    /// Policy for paid features: entitled or trialing tenants only
    pub fn premium_feature(redirect_to: impl Into<String>) -> Self {
        Self {
            require_active: true,
            allow_trial: true,
            redirect_to: redirect_to.into(),
        }
    }

    /// Policy that admits everyone
    pub fn open() -> Self {
        Self {
            require_active: false,
            allow_trial: false,
            redirect_to: String::new(),
        }
    }

    /// `is_active` already covers trials today. The trial clause is kept
    /// separate so policies can diverge if that definition ever narrows.
    pub fn is_satisfied_by(&self, state: &EntitlementState) -> bool {
        !self.require_active || state.is_active || (self.allow_trial && state.is_in_trial)
    }
}

/// Outcome of [`EntitlementGuard::enforce`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Admit(TenantStatus),
    Deny {
        redirect_to: String,
        status: TenantStatus,
    },
}

impl GuardDecision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, GuardDecision::Admit(_))
    }

    pub fn status(&self) -> &TenantStatus {
        match self {
            GuardDecision::Admit(status) => status,
            GuardDecision::Deny { status, .. } => status,
        }
    }

    pub fn redirect_to(&self) -> Option<&str> {
        match self {
            GuardDecision::Admit(_) => None,
            GuardDecision::Deny { redirect_to, .. } => Some(redirect_to),
        }
    }
}

/// Result of running a feature behind the guard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission<T> {
    /// The feature ran and produced a value
    Granted(T),
    /// The feature did not run; the caller should be sent here
    Redirect(String),
}

#[derive(Clone)]
pub struct EntitlementGuard {
    service: EntitlementService,
}

impl EntitlementGuard {
    pub fn new(service: EntitlementService) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &EntitlementService {
        &self.service
    }

    /// Decide whether the tenant behind `ctx` may proceed under `policy`
    pub async fn enforce(&self, ctx: &TenantContext, policy: &GuardPolicy) -> GuardDecision {
        let status = self.service.check_tenant(ctx).await;

        if policy.is_satisfied_by(&status.state) {
            return GuardDecision::Admit(status);
        }

        tracing::info!(
            tenant = ?status.tenant,
            path = ?ctx.request_path,
            redirect_to = %policy.redirect_to,
            has_subscription = status.state.has_subscription,
            is_in_trial = status.state.is_in_trial,
            "guard: policy not satisfied, denying"
        );

        GuardDecision::Deny {
            redirect_to: policy.redirect_to.clone(),
            status,
        }
    }

    /// Run `feature` only if the policy admits the tenant.
    ///
    /// On deny the feature is never invoked and the redirect target is
    /// returned instead.
    pub async fn run<F, Fut, T>(
        &self,
        ctx: &TenantContext,
        policy: &GuardPolicy,
        feature: F,
    ) -> Admission<T>
    where
        F: FnOnce(TenantStatus) -> Fut,
        Fut: Future<Output = T>,
    {
        match self.enforce(ctx, policy).await {
            GuardDecision::Admit(status) => Admission::Granted(feature(status).await),
            GuardDecision::Deny { redirect_to, .. } => Admission::Redirect(redirect_to),
        }
    }
}
