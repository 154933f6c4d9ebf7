//! Subscription stores
//!
//! Read side of the billing provider's subscription records. The
//! entitlement core only ever calls [`SubscriptionStore::fetch`]; creating,
//! charging and cancelling subscriptions happen elsewhere.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::config::BillingConfig;
use crate::error::{BillingError, BillingResult};
use crate::identity::TenantId;
use crate::subscription::SubscriptionRecord;

/// Read-only access to subscription records.
///
/// Fails with [`BillingError::StoreUnavailable`] on transient failures and
/// [`BillingError::MalformedRecord`] when a stored record cannot be trusted.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn fetch(&self, tenant: &TenantId) -> BillingResult<Option<SubscriptionRecord>>;
}

/// Apply embedded migrations (creates the `subscriptions` table)
pub async fn run_migrations(pool: &PgPool) -> BillingResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| BillingError::StoreUnavailable(format!("migration failed: {e}")))
}

/// Raw row from the `subscriptions` table
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: String,
    status: String,
    plan_name: Option<String>,
    price: Option<Decimal>,
    trial_ends_at: Option<OffsetDateTime>,
    created_at: OffsetDateTime,
}

impl SubscriptionRow {
    /// Convert into a record, filling display defaults from config
    fn into_record(
        self,
        tenant: &TenantId,
        config: &BillingConfig,
    ) -> BillingResult<SubscriptionRecord> {
        let status = self
            .status
            .parse()
            .map_err(|reason: String| BillingError::malformed(tenant.as_str(), reason))?;

        let record = SubscriptionRecord {
            id: self.id,
            status,
            plan_name: self
                .plan_name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| config.default_plan_name.clone()),
            price: self.price.unwrap_or(config.price_per_month),
            trial_ends_at: self.trial_ends_at,
            created_at: self.created_at,
        };

        record.warn_anomalies(tenant.as_str());
        Ok(record)
    }
}

/// Postgres-backed store
#[derive(Clone)]
pub struct PgSubscriptionStore {
    pool: PgPool,
    config: BillingConfig,
}

impl PgSubscriptionStore {
    pub fn new(pool: PgPool, config: BillingConfig) -> Self {
        Self { pool, config }
    }
}

#[async_trait]
impl SubscriptionStore for PgSubscriptionStore {
    async fn fetch(&self, tenant: &TenantId) -> BillingResult<Option<SubscriptionRecord>> {
        // Newest record wins if a shop ever has more than one
        let row: Option<SubscriptionRow> = sqlx::query_as(
            r#"
            SELECT id, status, plan_name, price, trial_ends_at, created_at
            FROM subscriptions
            WHERE shop = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(tenant.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match BillingError::from(e) {
            BillingError::MalformedRecord { reason, .. } => {
                BillingError::malformed(tenant.as_str(), reason)
            }
            other => other,
        })?;

        row.map(|row| row.into_record(tenant, &self.config))
            .transpose()
    }
}

/// In-process store for local development and tests.
///
/// Can be switched to unavailable to simulate a provider outage.
#[derive(Clone, Default)]
pub struct InMemorySubscriptionStore {
    records: Arc<RwLock<HashMap<TenantId, SubscriptionRecord>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, tenant: TenantId, record: SubscriptionRecord) {
        self.records.write().await.insert(tenant, record);
    }

    pub async fn remove(&self, tenant: &TenantId) -> Option<SubscriptionRecord> {
        self.records.write().await.remove(tenant)
    }

    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn fetch(&self, tenant: &TenantId) -> BillingResult<Option<SubscriptionRecord>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(BillingError::StoreUnavailable(
                "in-memory store switched off".to_string(),
            ));
        }

        let record = self.records.read().await.get(tenant).cloned();
        if let Some(record) = &record {
            record.warn_anomalies(tenant.as_str());
        }
        Ok(record)
    }
}
