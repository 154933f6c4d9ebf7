//! Dashboard view model
//!
//! Turns a [`TenantStatus`] into the flat data the app dashboard shows:
//! which banner, what status badge, price text, and whether premium entry
//! points are offered. All entitlement facts come from the resolver; this
//! module only chooses wording.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::BillingConfig;
use crate::entitlement::TenantStatus;
use crate::subscription::{SubscriptionRecord, SubscriptionStatus};

/// Banner shown above the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DashboardBanner {
    TrialActive { days_remaining: u32 },
    SubscriptionActive,
    /// Pending subscription whose trial is over
    TrialExpired,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToAction {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub shop: Option<String>,
    pub authenticated: bool,
    pub has_subscription: bool,
    pub is_active: bool,
    pub is_in_trial: bool,
    pub trial_days_remaining: u32,
    pub subscription: Option<SubscriptionRecord>,
    pub banner: Option<DashboardBanner>,
    pub status_label: Option<String>,
    pub price_label: String,
    /// Calendar date the trial ends, only while in trial
    pub trial_ends_on: Option<String>,
    pub show_premium_features: bool,
    pub call_to_action: CallToAction,
}

impl DashboardSummary {
    pub fn build(status: &TenantStatus, config: &BillingConfig) -> Self {
        let state = &status.state;
        let record = state.subscription.as_ref();

        let banner = if state.is_in_trial && state.trial_days_remaining > 0 {
            Some(DashboardBanner::TrialActive {
                days_remaining: state.trial_days_remaining,
            })
        } else if state.is_active && !state.is_in_trial {
            Some(DashboardBanner::SubscriptionActive)
        } else if record.is_some_and(|r| r.status == SubscriptionStatus::Pending) {
            Some(DashboardBanner::TrialExpired)
        } else {
            None
        };

        let status_label = record.map(|r| {
            if r.status == SubscriptionStatus::Active && state.is_in_trial {
                "Trial".to_string()
            } else {
                r.status.label().to_string()
            }
        });

        let trial_ends_on = record
            .and_then(|r| r.trial_ends_at)
            .filter(|_| state.is_in_trial)
            .map(|t| t.date().to_string());

        let call_to_action = CallToAction {
            label: if state.has_subscription {
                "Manage Subscription".to_string()
            } else {
                "Start Free Trial".to_string()
            },
            url: config.billing_url.clone(),
        };

        Self {
            shop: status.tenant.as_ref().map(|t| t.to_string()),
            authenticated: status.is_authenticated(),
            has_subscription: state.has_subscription,
            is_active: state.is_active,
            is_in_trial: state.is_in_trial,
            trial_days_remaining: state.trial_days_remaining,
            subscription: record.cloned(),
            banner,
            status_label,
            price_label: price_label(record.map(|r| r.price).unwrap_or(config.price_per_month)),
            trial_ends_on,
            show_premium_features: state.is_active || state.is_in_trial,
            call_to_action,
        }
    }
}

fn price_label(price: Decimal) -> String {
    let mut cents = price.round_dp(2);
    cents.rescale(2);
    format!("${cents} USD / month")
}
