//! Entitlement service
//!
//! Orchestrates identity -> subscription store -> resolver and contains every
//! upstream failure. Entitlement is a monetization control, so anything that
//! prevents a definite answer yields the zero state (fail closed).

use std::sync::Arc;
use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::config::BillingConfig;
use crate::entitlement::{EntitlementState, TenantStatus};
use crate::error::{BillingError, BillingResult};
use crate::identity::{IdentityProvider, TenantContext, TenantId};
use crate::resolver::resolve_entitlement;
use crate::store::SubscriptionStore;
use crate::subscription::SubscriptionRecord;

/// Stateless entitlement lookup, cheap to clone and share across tasks
#[derive(Clone)]
pub struct EntitlementService {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn SubscriptionStore>,
    clock: Arc<dyn Clock>,
    store_timeout: Duration,
}

impl EntitlementService {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn SubscriptionStore>,
        config: &BillingConfig,
    ) -> Self {
        Self::with_clock(identity, store, Arc::new(SystemClock), config)
    }

    pub fn with_clock(
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn SubscriptionStore>,
        clock: Arc<dyn Clock>,
        config: &BillingConfig,
    ) -> Self {
        Self {
            identity,
            store,
            clock,
            store_timeout: config.store_timeout,
        }
    }

    /// Current entitlement for the tenant behind `ctx`. Never fails.
    pub async fn check_status(&self, ctx: &TenantContext) -> EntitlementState {
        self.check_tenant(ctx).await.state
    }

    /// Like [`Self::check_status`], also reporting which tenant was resolved
    pub async fn check_tenant(&self, ctx: &TenantContext) -> TenantStatus {
        match self.try_check_tenant(ctx).await {
            Ok(status) => status,
            Err(BillingError::MalformedRecord { tenant, reason }) => {
                tracing::error!(
                    tenant = %tenant,
                    reason = %reason,
                    path = ?ctx.request_path,
                    "check_status: malformed subscription record, failing closed"
                );
                TenantStatus::fail_closed(TenantId::new(tenant))
            }
            Err(e) => {
                tracing::error!(error = %e, "check_status: unexpected error, failing closed");
                TenantStatus::anonymous()
            }
        }
    }

    /// Entitlement check that surfaces malformed records as errors.
    ///
    /// Identity and store failures are still folded into the zero state; only
    /// [`BillingError::MalformedRecord`] is returned. For hosts that want to
    /// report that case themselves (the billing status route does).
    pub async fn try_check_tenant(&self, ctx: &TenantContext) -> BillingResult<TenantStatus> {
        let tenant = match self.identity.resolve(ctx).await {
            Ok(tenant) => tenant,
            Err(e) => {
                tracing::debug!(
                    path = ?ctx.request_path,
                    error = %e,
                    "check_status: identity not resolved, using zero state"
                );
                return Ok(TenantStatus::anonymous());
            }
        };

        let record = match self.fetch_record(&tenant).await {
            Ok(record) => record,
            Err(BillingError::MalformedRecord { reason, .. }) => {
                return Err(BillingError::malformed(tenant.as_str(), reason));
            }
            Err(e) => {
                tracing::error!(
                    tenant = %tenant,
                    path = ?ctx.request_path,
                    error = %e,
                    "check_status: subscription lookup failed, failing closed"
                );
                return Ok(TenantStatus::fail_closed(tenant));
            }
        };

        // Read the clock only after every suspension point
        let state = resolve_entitlement(record.as_ref(), self.clock.now());

        tracing::debug!(
            tenant = %tenant,
            has_subscription = state.has_subscription,
            is_active = state.is_active,
            is_in_trial = state.is_in_trial,
            trial_days_remaining = state.trial_days_remaining,
            "check_status: entitlement resolved"
        );

        Ok(TenantStatus {
            tenant: Some(tenant),
            state,
        })
    }

    /// Store read bounded by the configured timeout; a timeout is reported
    /// exactly like an unavailable store.
    async fn fetch_record(&self, tenant: &TenantId) -> BillingResult<Option<SubscriptionRecord>> {
        match tokio::time::timeout(self.store_timeout, self.store.fetch(tenant)).await {
            Ok(result) => result,
            Err(_) => Err(BillingError::StoreUnavailable(format!(
                "subscription lookup timed out after {}ms",
                self.store_timeout.as_millis()
            ))),
        }
    }
}
