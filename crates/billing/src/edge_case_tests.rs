// Test file - these are expected patterns in test code
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

//! Edge Case Tests for Entitlement Checks
//!
//! Tests failure containment and time-dependent behavior in:
//! - Service fallbacks (ENT-S01 to ENT-S08)
//! - Guard enforcement (ENT-G01 to ENT-G06)
//! - Concurrency (ENT-C01 to ENT-C02)

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use rust_decimal_macros::dec;
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

use crate::clock::ManualClock;
use crate::config::BillingConfig;
use crate::error::{BillingError, BillingResult};
use crate::guard::{Admission, EntitlementGuard, GuardPolicy};
use crate::identity::{IdentityProvider, TenantContext, TenantId};
use crate::service::EntitlementService;
use crate::store::{InMemorySubscriptionStore, SubscriptionStore};
use crate::subscription::{SubscriptionRecord, SubscriptionStatus};
use crate::EntitlementState;

const NOW: OffsetDateTime = datetime!(2026-10-16 12:00 UTC);

/// Treats the session token as the tenant id
struct TokenIsTenant;

#[async_trait]
impl IdentityProvider for TokenIsTenant {
    async fn resolve(&self, ctx: &TenantContext) -> BillingResult<TenantId> {
        ctx.session_token
            .as_deref()
            .map(TenantId::from)
            .ok_or_else(|| BillingError::Unauthenticated("no session".to_string()))
    }
}

/// Store that counts lookups and always fails
#[derive(Default)]
struct DownStore {
    calls: AtomicUsize,
}

#[async_trait]
impl SubscriptionStore for DownStore {
    async fn fetch(&self, _tenant: &TenantId) -> BillingResult<Option<SubscriptionRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(BillingError::StoreUnavailable("connection refused".to_string()))
    }
}

/// Store that never answers within any reasonable timeout
struct HangingStore;

#[async_trait]
impl SubscriptionStore for HangingStore {
    async fn fetch(&self, _tenant: &TenantId) -> BillingResult<Option<SubscriptionRecord>> {
        tokio::time::sleep(StdDuration::from_secs(30)).await;
        Ok(Some(record(SubscriptionStatus::Active, None)))
    }
}

/// Store that records whether a lookup ran to completion
#[derive(Default)]
struct SlowStore {
    started: AtomicBool,
    finished: AtomicBool,
}

#[async_trait]
impl SubscriptionStore for SlowStore {
    async fn fetch(&self, _tenant: &TenantId) -> BillingResult<Option<SubscriptionRecord>> {
        self.started.store(true, Ordering::SeqCst);
        tokio::time::sleep(StdDuration::from_millis(50)).await;
        self.finished.store(true, Ordering::SeqCst);
        Ok(None)
    }
}

/// Store whose data fails validation
struct CorruptStore;

#[async_trait]
impl SubscriptionStore for CorruptStore {
    async fn fetch(&self, tenant: &TenantId) -> BillingResult<Option<SubscriptionRecord>> {
        Err(BillingError::malformed(tenant.as_str(), "unknown subscription status 'frozen'"))
    }
}

fn record(status: SubscriptionStatus, trial_ends_at: Option<OffsetDateTime>) -> SubscriptionRecord {
    SubscriptionRecord {
        id: "gid://shopify/AppSubscription/7".to_string(),
        status,
        plan_name: "Basic Plan".to_string(),
        price: dec!(9.99),
        trial_ends_at,
        created_at: NOW - Duration::days(1),
    }
}

fn ctx(shop: &str) -> TenantContext {
    TenantContext::new(Some(shop.to_string())).with_path("/app/badgify")
}

fn service_with(
    store: Arc<dyn SubscriptionStore>,
    clock: Arc<ManualClock>,
    config: &BillingConfig,
) -> EntitlementService {
    EntitlementService::with_clock(Arc::new(TokenIsTenant), store, clock, config)
}

async fn in_memory_service(
    shop: &str,
    record: Option<SubscriptionRecord>,
) -> (EntitlementService, InMemorySubscriptionStore, Arc<ManualClock>) {
    let store = InMemorySubscriptionStore::new();
    if let Some(record) = record {
        store.insert(TenantId::from(shop), record).await;
    }
    let clock = Arc::new(ManualClock::new(NOW));
    let service = service_with(
        Arc::new(store.clone()),
        clock.clone(),
        &BillingConfig::default(),
    );
    (service, store, clock)
}

#[cfg(test)]
mod service_tests {
    use super::*;

    // =========================================================================
    // ENT-S01: Identity failure - zero state, no error, store never consulted
    // =========================================================================
    #[tokio::test]
    async fn test_identity_failure_returns_zero_state() {
        let store = Arc::new(DownStore::default());
        let service = service_with(
            store.clone(),
            Arc::new(ManualClock::new(NOW)),
            &BillingConfig::default(),
        );

        let status = service.check_tenant(&TenantContext::anonymous()).await;
        assert!(status.tenant.is_none());
        assert!(status.state.is_zero());
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    // =========================================================================
    // ENT-S02: Store unavailable - fail closed, tenant still reported
    // =========================================================================
    #[tokio::test]
    async fn test_store_unavailable_fails_closed() {
        let service = service_with(
            Arc::new(DownStore::default()),
            Arc::new(ManualClock::new(NOW)),
            &BillingConfig::default(),
        );

        let status = service.check_tenant(&ctx("acme.myshopify.com")).await;
        assert_eq!(status.tenant, Some(TenantId::from("acme.myshopify.com")));
        assert!(status.state.is_zero());
        assert!(!status.state.is_active);
    }

    // =========================================================================
    // ENT-S03: Outage after a good answer - no stale "active" leaks through
    // =========================================================================
    #[tokio::test]
    async fn test_outage_never_serves_previous_result() {
        let (service, store, _clock) = in_memory_service(
            "acme.myshopify.com",
            Some(record(SubscriptionStatus::Active, None)),
        )
        .await;

        assert!(service.check_status(&ctx("acme.myshopify.com")).await.is_active);

        store.set_available(false);
        let state = service.check_status(&ctx("acme.myshopify.com")).await;
        assert_eq!(state, EntitlementState::zero());
    }

    // =========================================================================
    // ENT-S04: Store slower than the configured timeout - same as unavailable
    // =========================================================================
    #[tokio::test]
    async fn test_store_timeout_fails_closed() {
        let config = BillingConfig {
            store_timeout: StdDuration::from_millis(20),
            ..BillingConfig::default()
        };
        let service = service_with(
            Arc::new(HangingStore),
            Arc::new(ManualClock::new(NOW)),
            &config,
        );

        let status = service.check_tenant(&ctx("slow.myshopify.com")).await;
        assert!(status.state.is_zero());
        assert!(status.tenant.is_some());
    }

    // =========================================================================
    // ENT-S05: Malformed record - surfaced by try_check_tenant, zero otherwise
    // =========================================================================
    #[tokio::test]
    async fn test_malformed_record_propagates_only_from_try() {
        let service = service_with(
            Arc::new(CorruptStore),
            Arc::new(ManualClock::new(NOW)),
            &BillingConfig::default(),
        );

        let err = service
            .try_check_tenant(&ctx("acme.myshopify.com"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BillingError::MalformedRecord { ref tenant, .. } if tenant == "acme.myshopify.com"
        ));

        let status = service.check_tenant(&ctx("acme.myshopify.com")).await;
        assert!(status.state.is_zero());
        assert_eq!(status.tenant, Some(TenantId::from("acme.myshopify.com")));
    }

    // =========================================================================
    // ENT-S06: Repeated checks with unchanged inputs - identical results
    // =========================================================================
    #[tokio::test]
    async fn test_check_status_is_idempotent() {
        let (service, _store, _clock) = in_memory_service(
            "acme.myshopify.com",
            Some(record(
                SubscriptionStatus::Pending,
                Some(NOW + Duration::hours(60)),
            )),
        )
        .await;

        let first = service.check_status(&ctx("acme.myshopify.com")).await;
        let second = service.check_status(&ctx("acme.myshopify.com")).await;
        assert_eq!(first, second);
        assert!(first.is_in_trial);
        assert_eq!(first.trial_days_remaining, 3);
    }

    // =========================================================================
    // ENT-S07: Tenant without record - has_subscription false
    // =========================================================================
    #[tokio::test]
    async fn test_missing_record_is_zero_with_tenant() {
        let (service, _store, _clock) = in_memory_service("other.myshopify.com", None).await;

        let status = service.check_tenant(&ctx("acme.myshopify.com")).await;
        assert!(status.is_authenticated());
        assert!(!status.state.has_subscription);
        assert!(status.state.is_zero());
    }

    // =========================================================================
    // ENT-S08: Inconsistent trial dates or price - active status still wins
    // =========================================================================
    #[tokio::test]
    async fn test_active_record_with_odd_fields_stays_active() {
        let mut odd = record(SubscriptionStatus::Active, Some(NOW - Duration::days(30)));
        odd.created_at = NOW - Duration::days(2);
        let (service, store, _clock) =
            in_memory_service("acme.myshopify.com", Some(odd.clone())).await;

        let state = service.check_status(&ctx("acme.myshopify.com")).await;
        assert!(state.is_active);
        assert!(state.has_subscription);
        assert!(!state.is_in_trial);
        assert_eq!(state.subscription, Some(odd.clone()));

        let mut negative = odd;
        negative.price = dec!(-0.01);
        store
            .insert(TenantId::from("acme.myshopify.com"), negative)
            .await;

        let state = service.check_status(&ctx("acme.myshopify.com")).await;
        assert!(state.is_active);
        assert!(state.has_subscription);
        assert!(service
            .try_check_tenant(&ctx("acme.myshopify.com"))
            .await
            .is_ok());
    }
}

#[cfg(test)]
mod guard_tests {
    use super::*;

    fn premium() -> GuardPolicy {
        GuardPolicy::premium_feature("/app/billing")
    }

    // =========================================================================
    // ENT-G01: Scenario C - expired trial on pending record is denied
    // =========================================================================
    #[tokio::test]
    async fn test_expired_trial_denied_with_redirect() {
        let (service, _store, _clock) = in_memory_service(
            "acme.myshopify.com",
            Some(record(
                SubscriptionStatus::Pending,
                Some(NOW - Duration::hours(1)),
            )),
        )
        .await;
        let guard = EntitlementGuard::new(service);

        let decision = guard.enforce(&ctx("acme.myshopify.com"), &premium()).await;
        assert!(!decision.is_admitted());
        assert_eq!(decision.redirect_to(), Some("/app/billing"));
        assert!(decision.status().state.has_subscription);
    }

    // =========================================================================
    // ENT-G02: Scenario D - no record for tenant is denied
    // =========================================================================
    #[tokio::test]
    async fn test_no_record_denied() {
        let (service, _store, _clock) = in_memory_service("acme.myshopify.com", None).await;
        let guard = EntitlementGuard::new(service);

        let decision = guard.enforce(&ctx("acme.myshopify.com"), &premium()).await;
        assert_eq!(decision.redirect_to(), Some("/app/billing"));
        assert!(!decision.status().state.has_subscription);
    }

    // =========================================================================
    // ENT-G03: require_active=false admits even with the store down
    // =========================================================================
    #[tokio::test]
    async fn test_open_policy_admits_during_outage() {
        let service = service_with(
            Arc::new(DownStore::default()),
            Arc::new(ManualClock::new(NOW)),
            &BillingConfig::default(),
        );
        let guard = EntitlementGuard::new(service);

        assert!(guard
            .enforce(&TenantContext::anonymous(), &GuardPolicy::open())
            .await
            .is_admitted());
        assert!(guard
            .enforce(&ctx("acme.myshopify.com"), &GuardPolicy::open())
            .await
            .is_admitted());
    }

    // =========================================================================
    // ENT-G04: Trial expires mid-session - next protected call is blocked
    // =========================================================================
    #[tokio::test]
    async fn test_trial_expiry_blocks_next_call() {
        let (service, _store, clock) = in_memory_service(
            "acme.myshopify.com",
            Some(record(
                SubscriptionStatus::Pending,
                Some(NOW + Duration::minutes(5)),
            )),
        )
        .await;
        let guard = EntitlementGuard::new(service);

        let first = guard.enforce(&ctx("acme.myshopify.com"), &premium()).await;
        assert!(first.is_admitted());
        assert_eq!(first.status().state.trial_days_remaining, 1);

        clock.advance(Duration::minutes(5));

        let second = guard.enforce(&ctx("acme.myshopify.com"), &premium()).await;
        assert!(!second.is_admitted());
    }

    // =========================================================================
    // ENT-G05: Denied feature never runs
    // =========================================================================
    #[tokio::test]
    async fn test_run_skips_feature_on_deny() {
        let (service, _store, _clock) = in_memory_service("acme.myshopify.com", None).await;
        let guard = EntitlementGuard::new(service);
        let ran = Arc::new(AtomicBool::new(false));

        let ran_in_feature = ran.clone();
        let outcome = guard
            .run(&ctx("acme.myshopify.com"), &premium(), |_status| async move {
                ran_in_feature.store(true, Ordering::SeqCst);
                "badge"
            })
            .await;

        assert_eq!(outcome, Admission::Redirect("/app/billing".to_string()));
        assert!(!ran.load(Ordering::SeqCst));
    }

    // =========================================================================
    // ENT-G06: Admitted feature runs with the resolved tenant
    // =========================================================================
    #[tokio::test]
    async fn test_run_executes_feature_on_admit() {
        let (service, _store, _clock) = in_memory_service(
            "acme.myshopify.com",
            Some(record(SubscriptionStatus::Active, None)),
        )
        .await;
        let guard = EntitlementGuard::new(service);

        let outcome = guard
            .run(&ctx("acme.myshopify.com"), &premium(), |status| async move {
                status.tenant.map(|t| t.to_string())
            })
            .await;

        assert_eq!(
            outcome,
            Admission::Granted(Some("acme.myshopify.com".to_string()))
        );
    }
}

#[cfg(test)]
mod concurrency_tests {
    use super::*;

    // =========================================================================
    // ENT-C01: Many tenants checked in parallel - no cross-talk
    // =========================================================================
    #[tokio::test]
    async fn test_parallel_checks_for_different_tenants() {
        let store = InMemorySubscriptionStore::new();
        for i in 0..20 {
            let status = if i % 2 == 0 {
                SubscriptionStatus::Active
            } else {
                SubscriptionStatus::Cancelled
            };
            store
                .insert(TenantId::new(format!("shop-{i}.myshopify.com")), record(status, None))
                .await;
        }
        let service = service_with(
            Arc::new(store),
            Arc::new(ManualClock::new(NOW)),
            &BillingConfig::default(),
        );

        let mut handles = vec![];
        for i in 0..20 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                let shop = format!("shop-{i}.myshopify.com");
                (i, service.check_status(&ctx(&shop)).await)
            }));
        }

        for handle in handles {
            let (i, state) = handle.await.unwrap();
            assert!(state.has_subscription);
            assert_eq!(state.is_active, i % 2 == 0, "shop-{i} has wrong entitlement");
        }
    }

    // =========================================================================
    // ENT-C02: Caller gives up mid-lookup - in-flight read is simply dropped
    // =========================================================================
    #[tokio::test]
    async fn test_abandoned_check_drops_lookup() {
        let store = Arc::new(SlowStore::default());
        let service = service_with(
            store.clone(),
            Arc::new(ManualClock::new(NOW)),
            &BillingConfig::default(),
        );

        let abandoned = tokio::time::timeout(
            StdDuration::from_millis(10),
            service.check_status(&ctx("acme.myshopify.com")),
        )
        .await;
        assert!(abandoned.is_err(), "caller gave up before the store answered");

        tokio::time::sleep(StdDuration::from_millis(100)).await;
        assert!(store.started.load(Ordering::SeqCst));
        assert!(!store.finished.load(Ordering::SeqCst));
    }
}
