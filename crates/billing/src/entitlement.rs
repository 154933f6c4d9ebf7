//! Entitlement Module
//!
//! Answers "may this tenant use premium features right now?".
//!
//! [`EntitlementState`] is derived per request by
//! [`crate::resolver::resolve_entitlement`] and never persisted. `is_active`
//! is computed, not stored, so it cannot disagree with the trial fields.

use serde::{Deserialize, Serialize};

use crate::identity::TenantId;
use crate::subscription::SubscriptionRecord;

/// Derived entitlement for one tenant at one instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementState {
    /// A subscription record exists for the tenant
    pub has_subscription: bool,
    /// `trial_ends_at` exists and is strictly after now
    pub is_in_trial: bool,
    /// Whole days left in the trial, rounded up; 0 exactly when not in trial
    pub trial_days_remaining: u32,
    /// In trial, or the subscription status is active
    pub is_active: bool,
    pub subscription: Option<SubscriptionRecord>,
}

impl EntitlementState {
    /// State used for no subscription and for every upstream failure
    pub fn zero() -> Self {
        Self {
            has_subscription: false,
            is_in_trial: false,
            trial_days_remaining: 0,
            is_active: false,
            subscription: None,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::zero()
    }
}

impl Default for EntitlementState {
    fn default() -> Self {
        Self::zero()
    }
}

/// Entitlement together with the tenant it was computed for.
///
/// `tenant` is `None` when identity could not be resolved; entitlement-wise
/// that is indistinguishable from "no plan", but views may want to tell the
/// two apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantStatus {
    pub tenant: Option<TenantId>,
    pub state: EntitlementState,
}

impl TenantStatus {
    pub fn anonymous() -> Self {
        Self {
            tenant: None,
            state: EntitlementState::zero(),
        }
    }

    /// Known tenant whose entitlement could not be determined
    pub fn fail_closed(tenant: TenantId) -> Self {
        Self {
            tenant: Some(tenant),
            state: EntitlementState::zero(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.tenant.is_some()
    }
}
