//! Subscription records as reported by the billing provider

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Provider-side status of a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    /// Created but not yet approved/charged by the merchant
    Pending,
    Active,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Pending => "pending",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Cancelled => "cancelled",
        }
    }

    /// Capitalised form shown on status badges
    pub fn label(&self) -> &'static str {
        match self {
            SubscriptionStatus::Pending => "Pending",
            SubscriptionStatus::Active => "Active",
            SubscriptionStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(SubscriptionStatus::Pending),
            "active" => Ok(SubscriptionStatus::Active),
            // Providers disagree on the spelling
            "cancelled" | "canceled" => Ok(SubscriptionStatus::Cancelled),
            other => Err(format!("unknown subscription status '{other}'")),
        }
    }
}

/// Snapshot of a tenant's subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRecord {
    pub id: String,
    pub status: SubscriptionStatus,
    pub plan_name: String,
    /// Monthly price in USD
    pub price: Decimal,
    /// Set when the record is created, never mutated
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub trial_ends_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl SubscriptionRecord {
    /// Data-quality problems with the record, if any.
    ///
    /// None of these affect entitlement: a record with `status == active`
    /// stays active whatever its price or trial dates say. Stores log them.
    pub fn anomalies(&self) -> Vec<String> {
        let mut found = Vec::new();

        if self.price < Decimal::ZERO {
            found.push(format!("negative price {}", self.price));
        }

        if let Some(trial_ends_at) = self.trial_ends_at {
            if trial_ends_at < self.created_at {
                found.push(format!(
                    "trial ends at {} before creation at {}",
                    trial_ends_at, self.created_at
                ));
            }
        }

        found
    }

    /// Log [`Self::anomalies`] for `tenant` at warn level
    pub fn warn_anomalies(&self, tenant: &str) {
        for anomaly in self.anomalies() {
            tracing::warn!(
                tenant = %tenant,
                subscription = %self.id,
                anomaly = %anomaly,
                "subscription record looks inconsistent, resolving anyway"
            );
        }
    }
}
