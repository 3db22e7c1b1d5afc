//! Dose event log: the record of which scheduled doses were taken on
//! which calendar day. Source of truth for per-date status.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::inventory;
use crate::models::{DoseEvent, DoseKey, DoseStatus, Medication};

/// Logged doses, newest first, at most one per `DoseKey`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DoseLog {
    events: Vec<DoseEvent>,
}

impl DoseLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from stored events, keeping only the first (newest) event per key.
    pub fn from_events(events: Vec<DoseEvent>) -> Self {
        let mut log = Self::new();
        for event in events {
            if log.find(&event.key()).is_none() {
                log.events.push(event);
            }
        }
        log
    }

    pub fn events(&self) -> &[DoseEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn find(&self, key: &DoseKey) -> Option<&DoseEvent> {
        self.events.iter().find(|e| e.matches(key))
    }

    pub fn events_on(&self, date: NaiveDate) -> impl Iterator<Item = &DoseEvent> {
        self.events.iter().filter(move |e| e.date == date)
    }

    /// Replace-on-write insert: any event for the same key is dropped first.
    pub fn insert(&mut self, event: DoseEvent) {
        let key = event.key();
        self.events.retain(|e| !e.matches(&key));
        self.events.insert(0, event);
    }

    pub fn remove(&mut self, key: &DoseKey) -> Option<DoseEvent> {
        let index = self.events.iter().position(|e| e.matches(key))?;
        Some(self.events.remove(index))
    }

    /// Hand every event logged against `from`'s list to `to`.
    pub fn transfer(&mut self, from: &str, to: &str) {
        for event in self.events.iter_mut().filter(|e| e.owner_id == from) {
            event.owner_id = to.to_string();
        }
    }

    /// Log `owner_id`'s `medication` as taken for `(date, scheduled_time)`
    /// and take one pill from its stock.
    pub fn record_taken(
        &mut self,
        owner_id: &str,
        medication: &mut Medication,
        date: NaiveDate,
        scheduled_time: &str,
        now: DateTime<Utc>,
    ) -> DoseEvent {
        let key = DoseKey::new(owner_id, &medication.id, date, scheduled_time);
        let event = DoseEvent::taken(key, now);
        self.insert(event.clone());

        inventory::decrement(medication);
        medication.last_taken_time = Some(now);

        tracing::debug!(
            owner_id,
            medication_id = %medication.id,
            %date,
            scheduled_time,
            pills_remaining = ?medication.pills_remaining,
            "Dose recorded as taken"
        );
        event
    }

    /// Remove the event for the key. Stock is restored only when the removed
    /// event was `Taken`. No event, no change.
    pub fn undo(
        &mut self,
        owner_id: &str,
        medication: &mut Medication,
        date: NaiveDate,
        scheduled_time: &str,
    ) -> Option<DoseEvent> {
        let key = DoseKey::new(owner_id, &medication.id, date, scheduled_time);
        let removed = self.remove(&key)?;

        if removed.status == DoseStatus::Taken {
            inventory::increment(medication);
        }

        tracing::debug!(
            owner_id,
            medication_id = %medication.id,
            %date,
            scheduled_time,
            pills_remaining = ?medication.pills_remaining,
            "Dose undone"
        );
        Some(removed)
    }

    /// Redo is mark-as-taken again for the date passed in, not a replay of
    /// the undone event: a fresh timestamp, and whatever date the caller
    /// currently has selected.
    pub fn redo(
        &mut self,
        owner_id: &str,
        medication: &mut Medication,
        date: NaiveDate,
        scheduled_time: &str,
        now: DateTime<Utc>,
    ) -> DoseEvent {
        self.record_taken(owner_id, medication, date, scheduled_time, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    const OWNER: &str = "u1";

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, min, 0).unwrap()
    }

    fn metformin(pills: u32) -> Medication {
        Medication::new("1", "Metformin", "500mg", "8:00 AM", "Diabetes").with_stock(pills, 30)
    }

    #[test]
    fn record_then_undo_round_trips_inventory() {
        let mut log = DoseLog::new();
        let mut med = metformin(1);

        log.record_taken(OWNER, &mut med, day(2024, 1, 1), "8:00 AM", at(8, 5));
        assert_eq!(med.pills_remaining, Some(0));
        assert_eq!(log.len(), 1);

        let removed = log.undo(OWNER, &mut med, day(2024, 1, 1), "8:00 AM");
        assert!(removed.is_some());
        assert_eq!(med.pills_remaining, Some(1));
        assert!(log.is_empty());
    }

    #[test]
    fn recording_twice_replaces_the_event() {
        let mut log = DoseLog::new();
        let mut med = metformin(10);
        let key = DoseKey::new(OWNER, "1", day(2024, 1, 1), "8:00 AM");

        log.record_taken(OWNER, &mut med, day(2024, 1, 1), "8:00 AM", at(8, 0));
        log.record_taken(OWNER, &mut med, day(2024, 1, 1), "8:00 AM", at(8, 30));

        assert_eq!(log.events().iter().filter(|e| e.matches(&key)).count(), 1);
        assert_eq!(log.find(&key).unwrap().logged_at, at(8, 30));
        // Each call still takes a pill.
        assert_eq!(med.pills_remaining, Some(8));
    }

    #[test]
    fn undo_without_event_is_noop() {
        let mut log = DoseLog::new();
        let mut med = metformin(4);
        assert!(log.undo(OWNER, &mut med, day(2024, 1, 1), "8:00 AM").is_none());
        assert_eq!(med.pills_remaining, Some(4));
    }

    #[test]
    fn undo_of_non_taken_event_keeps_stock() {
        let mut log = DoseLog::new();
        log.insert(DoseEvent {
            owner_id: OWNER.into(),
            medication_id: "1".into(),
            date: day(2024, 1, 1),
            scheduled_time: "8:00 AM".into(),
            status: DoseStatus::Missed,
            logged_at: at(20, 0),
        });
        let mut med = metformin(4);

        let removed = log.undo(OWNER, &mut med, day(2024, 1, 1), "8:00 AM").unwrap();
        assert_eq!(removed.status, DoseStatus::Missed);
        assert_eq!(med.pills_remaining, Some(4));
    }

    #[test]
    fn taking_with_empty_stock_stays_at_zero() {
        let mut log = DoseLog::new();
        let mut med = metformin(0);
        for offset in 0..5 {
            let date = day(2024, 1, 1) + Duration::days(offset);
            log.record_taken(OWNER, &mut med, date, "8:00 AM", at(8, 0));
        }
        assert_eq!(med.pills_remaining, Some(0));
        assert_eq!(log.len(), 5);
    }

    #[test]
    fn undo_restores_past_total() {
        let mut log = DoseLog::new();
        let mut med = metformin(30);
        log.record_taken(OWNER, &mut med, day(2024, 1, 1), "8:00 AM", at(8, 0));
        med.pills_remaining = Some(30); // manual correction in between
        log.undo(OWNER, &mut med, day(2024, 1, 1), "8:00 AM");
        assert_eq!(med.pills_remaining, Some(31));
    }

    #[test]
    fn redo_creates_fresh_event_on_given_date() {
        let mut log = DoseLog::new();
        let mut med = metformin(10);

        log.record_taken(OWNER, &mut med, day(2024, 1, 1), "8:00 AM", at(8, 0));
        log.undo(OWNER, &mut med, day(2024, 1, 1), "8:00 AM");

        // The selected date moved on before redo was pressed.
        let redone = log.redo(OWNER, &mut med, day(2024, 1, 2), "8:00 AM", at(9, 0));
        assert_eq!(redone.date, day(2024, 1, 2));
        assert_eq!(redone.logged_at, at(9, 0));
        assert!(log.find(&DoseKey::new(OWNER, "1", day(2024, 1, 1), "8:00 AM")).is_none());
        assert_eq!(med.pills_remaining, Some(9));
    }

    #[test]
    fn record_stamps_last_taken_time() {
        let mut log = DoseLog::new();
        let mut med = metformin(10);
        log.record_taken(OWNER, &mut med, day(2024, 1, 1), "8:00 AM", at(8, 12));
        assert_eq!(med.last_taken_time, Some(at(8, 12)));
    }

    #[test]
    fn from_events_keeps_newest_per_key() {
        let older = DoseEvent::taken(DoseKey::new(OWNER, "1", day(2024, 1, 1), "8:00 AM"), at(8, 0));
        let newer = DoseEvent::taken(DoseKey::new(OWNER, "1", day(2024, 1, 1), "8:00 AM"), at(8, 30));
        let other = DoseEvent::taken(DoseKey::new(OWNER, "2", day(2024, 1, 1), "8:00 AM"), at(8, 1));

        let log = DoseLog::from_events(vec![newer.clone(), older, other]);
        assert_eq!(log.len(), 2);
        assert_eq!(log.events()[0], newer);
    }

    #[test]
    fn events_on_filters_by_day() {
        let mut log = DoseLog::new();
        let mut med = metformin(10);
        log.record_taken(OWNER, &mut med, day(2024, 1, 1), "8:00 AM", at(8, 0));
        log.record_taken(OWNER, &mut med, day(2024, 1, 2), "8:00 AM", at(8, 0));
        assert_eq!(log.events_on(day(2024, 1, 2)).count(), 1);
    }

    #[test]
    fn owners_with_same_medication_id_are_separate() {
        let mut log = DoseLog::new();
        let mut mine = metformin(10);
        let mut theirs = metformin(10);
        log.record_taken(OWNER, &mut mine, day(2024, 1, 1), "8:00 AM", at(8, 0));

        assert!(log.find(&DoseKey::new("p1", "1", day(2024, 1, 1), "8:00 AM")).is_none());
        assert!(log.undo("p1", &mut theirs, day(2024, 1, 1), "8:00 AM").is_none());
        assert_eq!(log.len(), 1);
        assert_eq!(theirs.pills_remaining, Some(10));
    }

    #[test]
    fn transfer_moves_only_the_given_owner() {
        let mut log = DoseLog::new();
        let mut med = metformin(10);
        log.record_taken("guest", &mut med, day(2024, 1, 1), "8:00 AM", at(8, 0));
        log.record_taken("p1", &mut med, day(2024, 1, 1), "8:00 AM", at(8, 0));

        log.transfer("guest", OWNER);
        assert!(log.find(&DoseKey::new(OWNER, "1", day(2024, 1, 1), "8:00 AM")).is_some());
        assert!(log.find(&DoseKey::new("p1", "1", day(2024, 1, 1), "8:00 AM")).is_some());
        assert!(log.events().iter().all(|e| e.owner_id != "guest"));
    }
}
