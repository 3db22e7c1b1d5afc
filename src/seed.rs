//! Built-in data used when a snapshot slot is missing or unreadable, and
//! when logout resets the own list.

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use crate::config::DEFAULT_REFILL_THRESHOLD;
use crate::models::{Medication, PatientNote, PatientProfile, PatientRecord};

pub fn default_medications() -> Vec<Medication> {
    let threshold = Some(DEFAULT_REFILL_THRESHOLD);
    vec![
        Medication::new("1", "Metformin", "500mg", "8:00 AM", "Diabetes")
            .with_stock(12, 30)
            .with_dosing(2, threshold),
        Medication::new("2", "Lisinopril", "10mg", "8:00 AM", "Blood Pressure")
            .with_stock(8, 30)
            .with_dosing(1, threshold),
        Medication::new("3", "Atorvastatin", "20mg", "2:00 PM", "Cholesterol")
            .with_stock(25, 30)
            .with_dosing(1, threshold),
        Medication::new("4", "Aspirin", "81mg", "8:00 PM", "Heart")
            .with_stock(2, 30)
            .with_dosing(1, threshold),
    ]
}

pub fn initial_patients() -> Vec<PatientRecord> {
    let noted_at = Utc
        .with_ymd_and_hms(2024, 10, 22, 9, 15, 0)
        .single()
        .unwrap_or_else(Utc::now);

    vec![PatientRecord {
        profile: PatientProfile {
            id: "p1".into(),
            name: "Robert Anderson".into(),
            patient_display_id: Some("PC-88231".into()),
            age: 68,
            gender: "Male".into(),
            condition: "Type 2 Diabetes".into(),
            adherence: 88,
            avatar: "https://i.pravatar.cc/150?u=robert".into(),
            weight_kg: None,
            height_cm: None,
            notes: vec![PatientNote {
                id: Uuid::from_u128(1),
                text: "Robert mentioned feeling slight dizziness after the morning dose. \
                       Monitoring closely."
                    .into(),
                timestamp: noted_at,
            }],
        },
        meds: vec![
            Medication::new("1", "Metformin", "500mg", "8:00 AM", "Diabetes")
                .with_stock(12, 30)
                .with_dosing(1, None),
            Medication::new("3", "Atorvastatin", "20mg", "2:00 PM", "Cholesterol")
                .with_stock(24, 30)
                .with_dosing(1, None),
        ],
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory;

    #[test]
    fn default_list_has_one_low_stock_medication() {
        let meds = default_medications();
        assert_eq!(meds.len(), 4);
        assert_eq!(inventory::low_stock_count(&meds), 1);
        assert_eq!(meds[3].name, "Aspirin");
    }

    #[test]
    fn roster_seed_embeds_medications() {
        let patients = initial_patients();
        assert_eq!(patients[0].profile.id, "p1");
        assert_eq!(patients[0].meds.len(), 2);
        assert_eq!(patients[0].profile.notes.len(), 1);
    }
}
