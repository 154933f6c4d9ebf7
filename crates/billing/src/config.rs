//! Billing configuration

use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;

use crate::error::{BillingError, BillingResult};

/// Pricing and entitlement settings threaded through the billing services
#[derive(Debug, Clone, PartialEq)]
pub struct BillingConfig {
    /// Monthly price in USD, used where a record carries no price
    pub price_per_month: Decimal,
    /// Trial length offered to new subscribers
    pub trial_days: u32,
    /// Plan name used where a record carries none
    pub default_plan_name: String,
    /// Billing/subscribe surface that denied requests are sent to
    pub billing_url: String,
    /// Upper bound on a single subscription lookup
    pub store_timeout: Duration,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            price_per_month: Decimal::new(999, 2),
            trial_days: 3,
            default_plan_name: "Basic Plan".to_string(),
            billing_url: "/app/billing".to_string(),
            store_timeout: Duration::from_millis(5_000),
        }
    }
}

impl BillingConfig {
    /// Load from environment variables, falling back to defaults for unset ones
    pub fn from_env() -> BillingResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> BillingResult<Self> {
        let defaults = Self::default();

        let price_per_month = parse_var(&lookup, "BILLING_PRICE_PER_MONTH")?
            .unwrap_or(defaults.price_per_month);
        if price_per_month < Decimal::ZERO {
            return Err(BillingError::Config(format!(
                "BILLING_PRICE_PER_MONTH must not be negative (got {price_per_month})"
            )));
        }

        let store_timeout = parse_var::<u64>(&lookup, "SUBSCRIPTION_STORE_TIMEOUT_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.store_timeout);
        if store_timeout.is_zero() {
            return Err(BillingError::Config(
                "SUBSCRIPTION_STORE_TIMEOUT_MS must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            price_per_month,
            trial_days: parse_var(&lookup, "BILLING_TRIAL_DAYS")?.unwrap_or(defaults.trial_days),
            default_plan_name: lookup("BILLING_PLAN_NAME")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.default_plan_name),
            billing_url: lookup("BILLING_URL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.billing_url),
            store_timeout,
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> BillingResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| BillingError::Config(format!("invalid {key} '{raw}': {e}"))),
    }
}
