use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::enums::billing_cycles::BillingCycle;

/// Prices at or above this amount (minor units) always bill annually,
/// regardless of what the plan name suggests.
pub const ANNUAL_PRICE_THRESHOLD_MINOR: i64 = 99_000;

/// The gateway's schedule model has no "until cancelled" primitive, so a
/// large finite occurrence count stands in for indefinite recurrence.
pub const UNBOUNDED_OCCURRENCES: i32 = 9999;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BillingSchedule {
    pub interval_months: u32,
    pub start_date: NaiveDate,
    pub total_occurrences: i32,
}

/// Price is authoritative; the plan-name hint only applies below the
/// threshold.
pub fn determine_cycle(plan_name: &str, amount_minor: i64) -> BillingCycle {
    if amount_minor >= ANNUAL_PRICE_THRESHOLD_MINOR {
        return BillingCycle::Annual;
    }

    let name = plan_name.to_lowercase();
    if name.contains("annual") || name.contains("year") {
        BillingCycle::Annual
    } else {
        BillingCycle::Monthly
    }
}

pub fn build_schedule(amount_minor: i64, start_date: NaiveDate) -> BillingSchedule {
    let interval_months = if amount_minor >= ANNUAL_PRICE_THRESHOLD_MINOR {
        12
    } else {
        1
    };

    BillingSchedule {
        interval_months,
        start_date,
        total_occurrences: UNBOUNDED_OCCURRENCES,
    }
}

pub fn next_billing_date(cycle_start: NaiveDate, cycle: BillingCycle) -> NaiveDate {
    cycle_start + Months::new(cycle.interval_months())
}
