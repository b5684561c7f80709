//! Due-soon alerts
//!
//! Alerts compare a date against the reference date of the pass. The
//! difference is signed, so a milestone already behind us stays flagged.

use chrono::NaiveDate;
use testplan_core::{AlertFlag, Vehicle};

pub use testplan_core::AlertThresholds;

/// Signed number of days from `today` to `date`
pub fn days_until(date: NaiveDate, today: NaiveDate) -> i64 {
    (date - today).num_days()
}

fn within(date: NaiveDate, today: NaiveDate, window: i64) -> bool {
    days_until(date, today) <= window
}

/// Alerts for one scheduled test, in fixed order SOPM, LRM, END
pub fn alerts_for(
    vehicle: &Vehicle,
    end: NaiveDate,
    today: NaiveDate,
    thresholds: &AlertThresholds,
) -> Vec<AlertFlag> {
    let mut flags = Vec::new();
    if vehicle
        .sopm
        .is_some_and(|sopm| within(sopm, today, thresholds.sopm_days))
    {
        flags.push(AlertFlag::SopmImminent);
    }
    if vehicle
        .lrm
        .is_some_and(|lrm| within(lrm, today, thresholds.lrm_days))
    {
        flags.push(AlertFlag::LrmImminent);
    }
    if within(end, today, thresholds.test_end_days) {
        flags.push(AlertFlag::EndImminent);
    }
    flags
}
