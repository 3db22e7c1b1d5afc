//! Inventory ledger: pill counts per medication.
//!
//! All adjustments act on a single canonical `Medication` record. Untracked
//! stock (`pills_remaining == None`) is read as 0 by the adjusting
//! operations, which then start tracking it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_DAILY_DOSAGE, DEFAULT_REFILL_THRESHOLD, DEFAULT_TOTAL_PILLS};
use crate::models::Medication;

/// Days-of-supply band shown on calendar stock cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockLevel {
    /// Fewer than 3 days left.
    Critical,
    /// 3 to 7 days left.
    Low,
    Healthy,
}

/// One dose taken: `pills_remaining = max(0, pills_remaining - 1)`.
pub fn decrement(med: &mut Medication) {
    let pills = med.pills_remaining.unwrap_or(0);
    med.pills_remaining = Some(pills.saturating_sub(1));
}

/// One dose restored. Not clamped to `total_pills`.
pub fn increment(med: &mut Medication) {
    let pills = med.pills_remaining.unwrap_or(0);
    med.pills_remaining = Some(pills.saturating_add(1));
}

/// Manual stock correction. Capacity grows to fit the count, never shrinks.
pub fn set_stock(med: &mut Medication, count: u32) {
    med.pills_remaining = Some(count);
    med.total_pills = Some(med.total_pills.unwrap_or(0).max(count));
}

/// Refill to capacity and stamp the refill date.
pub fn apply_refill(med: &mut Medication, now: DateTime<Utc>) {
    med.pills_remaining = Some(capacity(med));
    med.last_refill_date = Some(now);
}

pub fn capacity(med: &Medication) -> u32 {
    med.total_pills.unwrap_or(DEFAULT_TOTAL_PILLS)
}

pub fn refill_threshold(med: &Medication) -> u32 {
    med.refill_threshold.unwrap_or(DEFAULT_REFILL_THRESHOLD)
}

/// `pills_remaining <= refill_threshold`. Untracked stock is never low.
pub fn is_low_stock(med: &Medication) -> bool {
    med.pills_remaining
        .is_some_and(|pills| pills <= refill_threshold(med))
}

pub fn low_stock_count(meds: &[Medication]) -> usize {
    meds.iter().filter(|m| is_low_stock(m)).count()
}

/// Whole days of supply at the prescribed daily dosage.
pub fn days_left(med: &Medication) -> u32 {
    let pills = med.pills_remaining.unwrap_or(0);
    let daily = med
        .daily_dosage_count
        .unwrap_or(DEFAULT_DAILY_DOSAGE)
        .max(1);
    pills / daily
}

pub fn stock_level(med: &Medication) -> StockLevel {
    match days_left(med) {
        0..=2 => StockLevel::Critical,
        3..=7 => StockLevel::Low,
        _ => StockLevel::Healthy,
    }
}

/// Fill percentage for stock bars, capped at 100.
pub fn stock_percent(med: &Medication) -> u8 {
    let total = capacity(med);
    if total == 0 {
        return 0;
    }
    let pills = u64::from(med.pills_remaining.unwrap_or(0));
    let percent = (pills * 100 / u64::from(total)).min(100);
    percent as u8
}


/// Property-based tests using proptest
#[cfg(test)]
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Any number of decrements leaves a non-negative count that never rises.
        #[test]
        fn decrement_never_goes_below_zero(start in 0u32..50, takes in 0usize..120) {
            let mut m = Medication::new("1", "Metformin", "500mg", "8:00 AM", "Diabetes").with_stock(start, 30);
            let mut previous = start;
            for _ in 0..takes {
                decrement(&mut m);
                let current = m.pills_remaining.unwrap_or(0);
                prop_assert!(current <= previous);
                previous = current;
            }
            prop_assert_eq!(m.pills_remaining, Some(start.saturating_sub(takes as u32)));
        }

        /// Increments are uncapped: the count grows past total_pills.
        #[test]
        fn increment_is_uncapped(total in 1u32..60, restores in 1u32..40) {
            let mut m = Medication::new("1", "Metformin", "500mg", "8:00 AM", "Diabetes").with_stock(total, total);
            for _ in 0..restores {
                increment(&mut m);
            }
            prop_assert_eq!(m.pills_remaining, Some(total + restores));
            prop_assert_eq!(m.total_pills, Some(total));
        }

        /// set_stock never shrinks capacity below its previous value.
        #[test]
        fn set_stock_capacity_is_monotonic(total in 0u32..100, count in 0u32..200) {
            let mut m = Medication::new("1", "Metformin", "500mg", "8:00 AM", "Diabetes").with_stock(0, total);
            set_stock(&mut m, count);
            prop_assert_eq!(m.total_pills, Some(total.max(count)));
            prop_assert_eq!(m.pills_remaining, Some(count));
        }
    }
}
