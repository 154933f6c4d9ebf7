//! Entitlement resolver
//!
//! The only place trial arithmetic happens. Pure and total over any record,
//! including ones whose trial ends before they were created.

use time::OffsetDateTime;

use crate::entitlement::EntitlementState;
use crate::subscription::{SubscriptionRecord, SubscriptionStatus};

const NANOS_PER_DAY: i128 = 86_400 * 1_000_000_000;

/// Derive the entitlement state for `record` as of `now`
pub fn resolve_entitlement(
    record: Option<&SubscriptionRecord>,
    now: OffsetDateTime,
) -> EntitlementState {
    let Some(record) = record else {
        return EntitlementState::zero();
    };

    let trial_days_remaining = record
        .trial_ends_at
        .map(|trial_ends_at| trial_days_between(now, trial_ends_at))
        .unwrap_or(0);
    // Ceiling rounding keeps this in lockstep with is_in_trial
    let is_in_trial = trial_days_remaining > 0;

    EntitlementState {
        has_subscription: true,
        is_in_trial,
        trial_days_remaining,
        is_active: is_in_trial || record.status == SubscriptionStatus::Active,
        subscription: Some(record.clone()),
    }
}

/// Whole days from `now` until `trial_ends_at`, rounded up. Zero once the
/// trial end is reached.
fn trial_days_between(now: OffsetDateTime, trial_ends_at: OffsetDateTime) -> u32 {
    let remaining = (trial_ends_at - now).whole_nanoseconds();
    if remaining <= 0 {
        return 0;
    }

    let days = (remaining + NANOS_PER_DAY - 1) / NANOS_PER_DAY;
    u32::try_from(days).unwrap_or(u32::MAX)
}
