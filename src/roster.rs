//! Caregiver roster: the patients a caregiver looks after, their care
//! notes, and the dashboard's search and ordering.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{PatientNote, PatientProfile};

/// Adherence below this flags the patient for follow-up.
pub const LOW_ADHERENCE_PERCENT: u8 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RosterSort {
    #[default]
    AdherenceDesc,
    AdherenceAsc,
    NameAsc,
    NameDesc,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    patients: Vec<PatientProfile>,
}

impl Roster {
    pub fn new(patients: Vec<PatientProfile>) -> Self {
        Self { patients }
    }

    pub fn patients(&self) -> &[PatientProfile] {
        &self.patients
    }

    pub fn get(&self, patient_id: &str) -> Option<&PatientProfile> {
        self.patients.iter().find(|p| p.id == patient_id)
    }

    pub fn contains(&self, patient_id: &str) -> bool {
        self.get(patient_id).is_some()
    }

    /// Prepend a care note. `None` when the patient is not on the roster.
    pub fn add_note(
        &mut self,
        patient_id: &str,
        text: &str,
        now: DateTime<Utc>,
    ) -> Option<&PatientNote> {
        let patient = self.patients.iter_mut().find(|p| p.id == patient_id)?;
        patient.notes.insert(0, PatientNote::new(text, now));
        patient.notes.first()
    }

    /// Case-insensitive match on name or condition, then ordered.
    pub fn search(&self, query: &str, sort: RosterSort) -> Vec<&PatientProfile> {
        let needle = query.trim().to_lowercase();
        let mut result: Vec<&PatientProfile> = self
            .patients
            .iter()
            .filter(|p| {
                needle.is_empty()
                    || p.name.to_lowercase().contains(&needle)
                    || p.condition.to_lowercase().contains(&needle)
            })
            .collect();
        result.sort_by(|a, b| compare(a, b, sort));
        result
    }

    pub fn needing_attention(&self) -> impl Iterator<Item = &PatientProfile> {
        self.patients
            .iter()
            .filter(|p| p.adherence < LOW_ADHERENCE_PERCENT)
    }
}

fn compare(a: &PatientProfile, b: &PatientProfile, sort: RosterSort) -> Ordering {
    match sort {
        RosterSort::AdherenceDesc => b.adherence.cmp(&a.adherence),
        RosterSort::AdherenceAsc => a.adherence.cmp(&b.adherence),
        RosterSort::NameAsc => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        RosterSort::NameDesc => b.name.to_lowercase().cmp(&a.name.to_lowercase()),
    }
}
