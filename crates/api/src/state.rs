//! Application state

use std::sync::Arc;
use std::time::Duration;

use shopgate_billing::{
    Clock, EntitlementGuard, EntitlementService, IdentityProvider, PgSubscriptionStore,
    SubscriptionStore, SystemClock,
};
use sqlx::PgPool;

use crate::{auth::SessionTokenProvider, config::Config};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub entitlements: EntitlementService,
    pub guard: EntitlementGuard,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Self {
        let identity = Arc::new(SessionTokenProvider::new(
            &config.shopify_api_key,
            &config.shopify_api_secret,
        ));
        let store = Arc::new(PgSubscriptionStore::new(pool, config.billing.clone()));
        tracing::info!(
            billing_url = %config.billing.billing_url,
            store_timeout_ms = whole_millis(config.billing.store_timeout),
            "Entitlement service initialized with Postgres subscription store"
        );

        Self::from_parts(config, identity, store, Arc::new(SystemClock))
    }

    /// Assemble state from explicit collaborators
    pub fn from_parts(
        config: Config,
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn SubscriptionStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let entitlements = EntitlementService::with_clock(identity, store, clock, &config.billing);
        let guard = EntitlementGuard::new(entitlements.clone());

        Self {
            config,
            entitlements,
            guard,
        }
    }
}

/// Milliseconds for log fields, saturating at `u64::MAX`
fn whole_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
