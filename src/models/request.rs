use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::ApprovalStatus;
use super::medication::Medication;
use super::user::User;

/// Kind-specific payload of a change request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequestKind {
    #[serde(rename_all = "camelCase")]
    ScheduleChange {
        old_time: String,
        new_time: String,
        reason: String,
    },
    #[serde(rename_all = "camelCase")]
    Refill { pills_remaining: u32 },
}

/// A patient-initiated proposal that a caregiver approves or rejects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRequest {
    pub id: Uuid,
    pub patient_id: String,
    pub patient_name: String,
    pub medication_id: String,
    pub medication_name: String,
    pub status: ApprovalStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: RequestKind,
}

impl ChangeRequest {
    pub fn schedule_change(
        requester: &User,
        medication: &Medication,
        new_time: &str,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            patient_id: requester.id.clone(),
            patient_name: requester.name.clone(),
            medication_id: medication.id.clone(),
            medication_name: medication.name.clone(),
            status: ApprovalStatus::Pending,
            timestamp: now,
            kind: RequestKind::ScheduleChange {
                old_time: medication.scheduled_time.clone(),
                new_time: new_time.to_string(),
                reason: reason.to_string(),
            },
        }
    }

    /// Snapshot of the stock at request time; untracked stock counts as 0.
    pub fn refill(requester: &User, medication: &Medication, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            patient_id: requester.id.clone(),
            patient_name: requester.name.clone(),
            medication_id: medication.id.clone(),
            medication_name: medication.name.clone(),
            status: ApprovalStatus::Pending,
            timestamp: now,
            kind: RequestKind::Refill {
                pills_remaining: medication.pills_remaining.unwrap_or(0),
            },
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == ApprovalStatus::Pending
    }

    pub fn is_refill(&self) -> bool {
        matches!(self.kind, RequestKind::Refill { .. })
    }
}
