//! Daily status resolver: a per-date lens over the canonical medication
//! list. Pure: inputs are borrowed, the output is a fresh list.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dose_log::DoseLog;
use crate::inventory;
use crate::models::{DoseKey, DoseStatus, Medication};

/// Status of one of `owner_id`'s medications on one day. With no logged
/// event the answer is `Upcoming`, for past, present and future dates alike.
pub fn status_on(
    date: NaiveDate,
    owner_id: &str,
    medication: &Medication,
    log: &DoseLog,
) -> DoseStatus {
    let key = DoseKey::new(owner_id, &medication.id, date, &medication.scheduled_time);
    log.find(&key)
        .map(|event| event.status)
        .unwrap_or(DoseStatus::Upcoming)
}

/// Copy of `owner_id`'s `medications` with each `status` overwritten for
/// `date`.
pub fn resolve_status_for_date(
    date: NaiveDate,
    owner_id: &str,
    medications: &[Medication],
    log: &DoseLog,
) -> Vec<Medication> {
    medications
        .iter()
        .map(|med| Medication {
            status: status_on(date, owner_id, med, log),
            ..med.clone()
        })
        .collect()
}

/// Share of resolved medications marked Taken, rounded to a whole percent.
pub fn adherence_percent(resolved: &[Medication]) -> u8 {
    if resolved.is_empty() {
        return 0;
    }
    let taken = resolved
        .iter()
        .filter(|m| m.status == DoseStatus::Taken)
        .count();
    ((taken as f64 / resolved.len() as f64) * 100.0).round() as u8
}

/// Everything the home screen needs for one selected day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub medications: Vec<Medication>,
    pub adherence: u8,
    pub taken: usize,
    pub upcoming: usize,
    pub low_stock: usize,
}

pub fn summarize_day(
    date: NaiveDate,
    owner_id: &str,
    medications: &[Medication],
    log: &DoseLog,
) -> DaySummary {
    let resolved = resolve_status_for_date(date, owner_id, medications, log);
    let count = |status: DoseStatus| resolved.iter().filter(|m| m.status == status).count();

    DaySummary {
        date,
        adherence: adherence_percent(&resolved),
        taken: count(DoseStatus::Taken),
        upcoming: count(DoseStatus::Upcoming),
        low_stock: inventory::low_stock_count(&resolved),
        medications: resolved,
    }
}
