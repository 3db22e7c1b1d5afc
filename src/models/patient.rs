use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::medication::Medication;

/// A patient on a caregiver's roster.
///
/// Medications are not embedded: the roster looks them up in the canonical
/// medication book by patient id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientProfile {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_display_id: Option<String>,
    pub age: u32,
    pub gender: String,
    pub condition: String,
    /// Adherence percentage, 0-100.
    pub adherence: u8,
    #[serde(default)]
    pub avatar: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<f32>,
    /// Newest first.
    #[serde(default)]
    pub notes: Vec<PatientNote>,
}

/// Stored form of a roster entry: the profile with its medications embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    #[serde(flatten)]
    pub profile: PatientProfile,
    #[serde(default)]
    pub meds: Vec<Medication>,
}

/// Free-text care note left by a caregiver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientNote {
    pub id: Uuid,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl PatientNote {
    pub fn new(text: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.to_string(),
            timestamp: now,
        }
    }
}
