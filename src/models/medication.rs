use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::enums::DoseStatus;

/// A medication as the patient sees it.
///
/// `status` is only the fallback shown when no date lens is applied; the
/// dose log decides what happened on a given day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub id: String,
    pub name: String,
    pub dosage: String,
    #[serde(rename = "time")]
    pub scheduled_time: String,
    pub status: DoseStatus,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Custom reminder time set by a caregiver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pills_remaining: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pills: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_dosage_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refill_threshold: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_refill_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_taken_time: Option<DateTime<Utc>>,
}

impl Medication {
    pub fn new(id: &str, name: &str, dosage: &str, scheduled_time: &str, category: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            dosage: dosage.to_string(),
            scheduled_time: scheduled_time.to_string(),
            status: DoseStatus::Upcoming,
            category: category.to_string(),
            frequency: None,
            start_date: None,
            end_date: None,
            created_at: None,
            reminder_time: None,
            pills_remaining: None,
            total_pills: None,
            daily_dosage_count: None,
            refill_threshold: None,
            last_refill_date: None,
            last_taken_time: None,
        }
    }

    pub fn with_stock(mut self, pills_remaining: u32, total_pills: u32) -> Self {
        self.pills_remaining = Some(pills_remaining);
        self.total_pills = Some(total_pills);
        self
    }

    pub fn with_dosing(mut self, daily_dosage_count: u32, refill_threshold: Option<u32>) -> Self {
        self.daily_dosage_count = Some(daily_dosage_count);
        self.refill_threshold = refill_threshold;
        self
    }
}

/// Input for adding a medication; the repository assigns the id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationDraft {
    pub name: String,
    pub dosage: String,
    #[serde(rename = "time")]
    pub scheduled_time: String,
    pub category: String,
    pub frequency: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub pills_remaining: Option<u32>,
    pub total_pills: Option<u32>,
    pub daily_dosage_count: Option<u32>,
    pub refill_threshold: Option<u32>,
}

impl MedicationDraft {
    pub fn into_medication(self, id: String, created_at: DateTime<Utc>) -> Medication {
        Medication {
            id,
            name: self.name,
            dosage: self.dosage,
            scheduled_time: self.scheduled_time,
            status: DoseStatus::Upcoming,
            category: self.category,
            frequency: self.frequency,
            start_date: self.start_date,
            end_date: self.end_date,
            created_at: Some(created_at),
            reminder_time: None,
            pills_remaining: self.pills_remaining,
            total_pills: self.total_pills,
            daily_dosage_count: self.daily_dosage_count,
            refill_threshold: self.refill_threshold,
            last_refill_date: None,
            last_taken_time: None,
        }
    }
}

/// Partial update: only `Some` fields are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationUpdate {
    pub name: Option<String>,
    pub dosage: Option<String>,
    #[serde(rename = "time")]
    pub scheduled_time: Option<String>,
    pub category: Option<String>,
    pub frequency: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub pills_remaining: Option<u32>,
    pub total_pills: Option<u32>,
    pub daily_dosage_count: Option<u32>,
    pub refill_threshold: Option<u32>,
}

impl MedicationUpdate {
    pub fn apply(&self, med: &mut Medication) {
        if let Some(name) = &self.name {
            med.name = name.clone();
        }
        if let Some(dosage) = &self.dosage {
            med.dosage = dosage.clone();
        }
        if let Some(time) = &self.scheduled_time {
            med.scheduled_time = time.clone();
        }
        if let Some(category) = &self.category {
            med.category = category.clone();
        }
        if self.frequency.is_some() {
            med.frequency = self.frequency.clone();
        }
        if self.start_date.is_some() {
            med.start_date = self.start_date;
        }
        if self.end_date.is_some() {
            med.end_date = self.end_date;
        }
        if self.pills_remaining.is_some() {
            med.pills_remaining = self.pills_remaining;
        }
        if self.total_pills.is_some() {
            med.total_pills = self.total_pills;
        }
        if self.daily_dosage_count.is_some() {
            med.daily_dosage_count = self.daily_dosage_count;
        }
        if self.refill_threshold.is_some() {
            med.refill_threshold = self.refill_threshold;
        }
    }
}
