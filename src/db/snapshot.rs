//! Local snapshot store: named JSON slots in the `snapshots` table.
//!
//! Each slot loads on its own: a missing or unreadable slot falls back to
//! its seed without affecting the others. Saving rewrites every slot in a
//! single transaction.

use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::DatabaseError;
use crate::care_state::CareSnapshot;
use crate::seed;

pub const SLOT_MEDS: &str = "pillcare_meds";
pub const SLOT_PATIENTS: &str = "pillcare_patients";
pub const SLOT_AI_REQUESTS: &str = "pillcare_ai_requests";
pub const SLOT_REFILL_REQUESTS: &str = "pillcare_refill_requests";
pub const SLOT_MED_LOGS: &str = "pillcare_med_logs";
pub const SLOT_SESSION: &str = "pillcare_session";

/// Read and decode one slot. `Ok(None)` when the slot was never written.
pub fn read_slot<T: DeserializeOwned>(
    conn: &Connection,
    key: &str,
) -> Result<Option<T>, DatabaseError> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value FROM snapshots WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;

    match raw {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

pub fn write_slot<T: Serialize>(
    conn: &Connection,
    key: &str,
    value: &T,
) -> Result<(), DatabaseError> {
    let json = serde_json::to_string(value)?;
    conn.execute(
        "INSERT INTO snapshots (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, json],
    )?;
    Ok(())
}

fn load_or<T, F>(conn: &Connection, key: &str, fallback: F) -> T
where
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    match read_slot(conn, key) {
        Ok(Some(value)) => value,
        Ok(None) => fallback(),
        Err(e) => {
            tracing::warn!(slot = key, error = %e, "Snapshot slot unreadable, using default");
            fallback()
        }
    }
}

/// Assemble the stored state, seeding any slot that is absent or unreadable.
pub fn load_snapshot(conn: &Connection) -> CareSnapshot {
    CareSnapshot {
        session: load_or(conn, SLOT_SESSION, || None),
        meds: load_or(conn, SLOT_MEDS, seed::default_medications),
        patients: load_or(conn, SLOT_PATIENTS, seed::initial_patients),
        ai_requests: load_or(conn, SLOT_AI_REQUESTS, Vec::new),
        refill_requests: load_or(conn, SLOT_REFILL_REQUESTS, Vec::new),
        med_logs: load_or(conn, SLOT_MED_LOGS, Vec::new),
    }
}

/// Persist every slot together.
pub fn save_snapshot(conn: &Connection, snapshot: &CareSnapshot) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;

    write_slot(&tx, SLOT_MEDS, &snapshot.meds)?;
    write_slot(&tx, SLOT_PATIENTS, &snapshot.patients)?;
    write_slot(&tx, SLOT_AI_REQUESTS, &snapshot.ai_requests)?;
    write_slot(&tx, SLOT_REFILL_REQUESTS, &snapshot.refill_requests)?;
    write_slot(&tx, SLOT_MED_LOGS, &snapshot.med_logs)?;
    match &snapshot.session {
        Some(user) => write_slot(&tx, SLOT_SESSION, user)?,
        None => {
            tx.execute("DELETE FROM snapshots WHERE key = ?1", params![SLOT_SESSION])?;
        }
    }

    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::{DoseEvent, DoseKey, User, UserRole};
    use chrono::{NaiveDate, Utc};

    #[test]
    fn empty_store_loads_seeds() {
        let conn = open_memory_database().unwrap();
        let snapshot = load_snapshot(&conn);
        assert_eq!(snapshot.meds, seed::default_medications());
        assert_eq!(snapshot.patients, seed::initial_patients());
        assert!(snapshot.session.is_none());
        assert!(snapshot.med_logs.is_empty());
    }

    #[test]
    fn saved_snapshot_loads_back() {
        let conn = open_memory_database().unwrap();
        let mut snapshot = load_snapshot(&conn);
        snapshot.meds.truncate(1);
        snapshot.session = Some(User::new("u1", "Dana", UserRole::Patient, "dana@example.com"));
        let key = DoseKey::new("u1", "1", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), "8:00 AM");
        snapshot.med_logs.push(DoseEvent::taken(key, Utc::now()));

        save_snapshot(&conn, &snapshot).unwrap();
        assert_eq!(load_snapshot(&conn), snapshot);
    }

    #[test]
    fn corrupt_slot_falls_back_without_affecting_others() {
        let conn = open_memory_database().unwrap();
        write_slot(&conn, SLOT_MEDS, &Vec::<crate::models::Medication>::new()).unwrap();
        conn.execute(
            "INSERT INTO snapshots (key, value) VALUES (?1, 'not json')",
            params![SLOT_PATIENTS],
        )
        .unwrap();

        let snapshot = load_snapshot(&conn);
        assert!(snapshot.meds.is_empty());
        assert_eq!(snapshot.patients, seed::initial_patients());
    }

    #[test]
    fn signing_out_clears_session_slot() {
        let conn = open_memory_database().unwrap();
        let mut snapshot = load_snapshot(&conn);
        snapshot.session = Some(User::guest(UserRole::Caregiver));
        save_snapshot(&conn, &snapshot).unwrap();

        snapshot.session = None;
        save_snapshot(&conn, &snapshot).unwrap();
        let stored: Option<User> = read_slot(&conn, SLOT_SESSION).unwrap();
        assert!(stored.is_none());
    }

    #[test]
    fn slots_survive_reopening_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pillcare.db");
        {
            let conn = crate::db::sqlite::open_database(&path).unwrap();
            let mut snapshot = load_snapshot(&conn);
            snapshot.meds.remove(0);
            save_snapshot(&conn, &snapshot).unwrap();
        }
        let conn = crate::db::sqlite::open_database(&path).unwrap();
        assert_eq!(load_snapshot(&conn).meds.len(), 3);
    }
}
