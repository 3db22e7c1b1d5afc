//! SQLite-backed medication repository.
//!
//! Each row holds the medication as a JSON document next to the columns
//! used for lookup and ordering.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{open_database, open_memory_database, DatabaseError};
use crate::models::{Medication, MedicationDraft, MedicationUpdate};
use crate::services::{MedicationRepository, RepositoryError};

pub struct SqliteMedicationRepository {
    conn: Mutex<Connection>,
}

impl SqliteMedicationRepository {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        Ok(Self::new(open_database(path)?))
    }

    pub fn in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::new(open_memory_database()?))
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)
    }
}

fn insert_medication(
    conn: &Connection,
    user_id: &str,
    med: &Medication,
    created_at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO medications (user_id, id, name, payload, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user_id,
            med.id,
            med.name,
            serde_json::to_string(med)?,
            created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn get_medication(
    conn: &Connection,
    user_id: &str,
    medication_id: &str,
) -> Result<Option<Medication>, DatabaseError> {
    let payload: Option<String> = conn
        .query_row(
            "SELECT payload FROM medications WHERE user_id = ?1 AND id = ?2",
            params![user_id, medication_id],
            |row| row.get(0),
        )
        .optional()?;

    match payload {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

fn get_medications_for_user(
    conn: &Connection,
    user_id: &str,
) -> Result<Vec<Medication>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT payload FROM medications WHERE user_id = ?1
         ORDER BY created_at DESC, rowid DESC",
    )?;
    let rows = stmt.query_map(params![user_id], |row| row.get::<_, String>(0))?;

    let mut meds = Vec::new();
    for row in rows {
        meds.push(serde_json::from_str(&row?)?);
    }
    Ok(meds)
}

fn replace_medication(
    conn: &Connection,
    user_id: &str,
    med: &Medication,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE medications SET name = ?3, payload = ?4, updated_at = datetime('now')
         WHERE user_id = ?1 AND id = ?2",
        params![user_id, med.id, med.name, serde_json::to_string(med)?],
    )?;
    Ok(())
}

impl MedicationRepository for SqliteMedicationRepository {
    fn list(&self, user_id: &str) -> Result<Vec<Medication>, RepositoryError> {
        let conn = self.conn()?;
        Ok(get_medications_for_user(&conn, user_id)?)
    }

    fn add(&self, user_id: &str, draft: MedicationDraft) -> Result<Medication, RepositoryError> {
        let now = Utc::now();
        let med = draft.into_medication(Uuid::new_v4().to_string(), now);
        let conn = self.conn()?;
        insert_medication(&conn, user_id, &med, now)?;
        tracing::debug!(user_id, medication_id = %med.id, "Medication stored");
        Ok(med)
    }

    fn update(
        &self,
        user_id: &str,
        medication_id: &str,
        update: &MedicationUpdate,
    ) -> Result<(), RepositoryError> {
        let conn = self.conn()?;
        let mut med = get_medication(&conn, user_id, medication_id)?
            .ok_or_else(|| RepositoryError::NotFound(medication_id.to_string()))?;
        update.apply(&mut med);
        replace_medication(&conn, user_id, &med)?;
        Ok(())
    }

    fn delete(&self, user_id: &str, medication_id: &str) -> Result<(), RepositoryError> {
        let conn = self.conn()?;
        let removed = conn
            .execute(
                "DELETE FROM medications WHERE user_id = ?1 AND id = ?2",
                params![user_id, medication_id],
            )
            .map_err(DatabaseError::from)?;
        if removed == 0 {
            return Err(RepositoryError::NotFound(medication_id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str) -> MedicationDraft {
        MedicationDraft {
            name: name.into(),
            dosage: "10mg".into(),
            scheduled_time: "9:00 AM".into(),
            category: "General".into(),
            pills_remaining: Some(20),
            total_pills: Some(30),
            ..Default::default()
        }
    }

    #[test]
    fn add_assigns_id_and_created_at() {
        let repo = SqliteMedicationRepository::in_memory().unwrap();
        let med = repo.add("u1", draft("Metformin")).unwrap();
        assert!(Uuid::parse_str(&med.id).is_ok());
        assert!(med.created_at.is_some());
        assert_eq!(repo.list("u1").unwrap(), vec![med]);
    }

    #[test]
    fn list_is_newest_first_and_per_user() {
        let repo = SqliteMedicationRepository::in_memory().unwrap();
        repo.add("u1", draft("First")).unwrap();
        repo.add("u1", draft("Second")).unwrap();
        repo.add("u2", draft("Other")).unwrap();

        let names: Vec<_> = repo.list("u1").unwrap().into_iter().map(|m| m.name).collect();
        assert_eq!(names, ["Second", "First"]);
        assert_eq!(repo.list("u2").unwrap().len(), 1);
        assert!(repo.list("u3").unwrap().is_empty());
    }

    #[test]
    fn update_is_partial() {
        let repo = SqliteMedicationRepository::in_memory().unwrap();
        let med = repo.add("u1", draft("Metformin")).unwrap();
        let update = MedicationUpdate {
            scheduled_time: Some("8:15 AM".into()),
            ..Default::default()
        };
        repo.update("u1", &med.id, &update).unwrap();

        let stored = &repo.list("u1").unwrap()[0];
        assert_eq!(stored.scheduled_time, "8:15 AM");
        assert_eq!(stored.dosage, "10mg");
        assert_eq!(stored.pills_remaining, Some(20));
    }

    #[test]
    fn missing_rows_are_not_found() {
        let repo = SqliteMedicationRepository::in_memory().unwrap();
        let med = repo.add("u1", draft("Metformin")).unwrap();

        assert!(matches!(
            repo.update("u2", &med.id, &MedicationUpdate::default()),
            Err(RepositoryError::NotFound(_))
        ));
        assert!(matches!(repo.delete("u1", "nope"), Err(RepositoryError::NotFound(_))));

        repo.delete("u1", &med.id).unwrap();
        assert!(repo.list("u1").unwrap().is_empty());
    }
}
