use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::enums::DoseStatus;
use super::user::GUEST_USER_ID;

/// Identity of one scheduled dose: whose list, which medication, which
/// calendar day, which scheduled time. Medication ids are only unique within
/// one owner's list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DoseKey {
    pub owner_id: String,
    pub medication_id: String,
    pub date: NaiveDate,
    pub scheduled_time: String,
}

impl DoseKey {
    pub fn new(owner_id: &str, medication_id: &str, date: NaiveDate, scheduled_time: &str) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            medication_id: medication_id.to_string(),
            date,
            scheduled_time: scheduled_time.to_string(),
        }
    }
}

/// A logged dose. At most one exists per `DoseKey`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoseEvent {
    /// Logs written before owners were recorded belong to the guest list.
    #[serde(rename = "userId", default = "guest_owner")]
    pub owner_id: String,
    pub medication_id: String,
    /// Serialised as `YYYY-MM-DD`.
    pub date: NaiveDate,
    #[serde(rename = "time")]
    pub scheduled_time: String,
    pub status: DoseStatus,
    #[serde(rename = "timestamp")]
    pub logged_at: DateTime<Utc>,
}

impl DoseEvent {
    pub fn taken(key: DoseKey, logged_at: DateTime<Utc>) -> Self {
        Self {
            owner_id: key.owner_id,
            medication_id: key.medication_id,
            date: key.date,
            scheduled_time: key.scheduled_time,
            status: DoseStatus::Taken,
            logged_at,
        }
    }

    pub fn matches(&self, key: &DoseKey) -> bool {
        self.owner_id == key.owner_id
            && self.medication_id == key.medication_id
            && self.date == key.date
            && self.scheduled_time == key.scheduled_time
    }

    pub fn key(&self) -> DoseKey {
        DoseKey::new(&self.owner_id, &self.medication_id, self.date, &self.scheduled_time)
    }
}

fn guest_owner() -> String {
    GUEST_USER_ID.to_string()
}

/// Calendar day of an instant, in UTC.
pub fn calendar_day(instant: DateTime<Utc>) -> NaiveDate {
    instant.date_naive()
}
