// Test code patterns (expected in test files):
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Shopgate Billing Module
//!
//! Decides whether a tenant may use premium features, based on the
//! subscription record reported by the billing provider and the trial clock.
//!
//! ## Features
//!
//! - **Resolver**: pure subscription + time -> [`EntitlementState`] derivation
//! - **Service**: identity -> store -> resolver, fail-closed on any upstream failure
//! - **Guard**: per-feature [`GuardPolicy`] enforcement with redirect on deny
//! - **Stores**: Postgres and in-memory subscription stores
//! - **Dashboard**: view model for the app's billing dashboard

pub mod clock;
pub mod config;
pub mod dashboard;
pub mod entitlement;
pub mod error;
pub mod guard;
pub mod identity;
pub mod resolver;
pub mod service;
pub mod store;
pub mod subscription;

#[cfg(test)]
mod edge_case_tests;

// Clock
pub use clock::{Clock, ManualClock, SystemClock};

// Config
pub use config::BillingConfig;

// Dashboard
pub use dashboard::{CallToAction, DashboardBanner, DashboardSummary};

// Entitlement
pub use entitlement::{EntitlementState, TenantStatus};

// Error
pub use error::{BillingError, BillingResult};

// Guard
pub use guard::{Admission, EntitlementGuard, GuardDecision, GuardPolicy};

// Identity
pub use identity::{IdentityProvider, TenantContext, TenantId};

// Resolver
pub use resolver::resolve_entitlement;

// Service
pub use service::EntitlementService;

// Stores
pub use store::{run_migrations, InMemorySubscriptionStore, PgSubscriptionStore, SubscriptionStore};

// Subscriptions
pub use subscription::{SubscriptionRecord, SubscriptionStatus};
