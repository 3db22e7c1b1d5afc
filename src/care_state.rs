//! Canonical care state and the operations that coordinate the dose log,
//! inventory ledger and request workflow.
//!
//! Each medication exists once, in a [`MedicationBook`] keyed by the id of
//! the patient who takes it. The caregiver roster and the signed-in user's
//! own list are both id lookups into that book, so an approval writes one
//! record and every view sees it.
//!
//! Operations return `CareError::NotFound` for missing ids without touching
//! any state; turning that into a silent no-op is the session's job.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::daily_status::{self, DaySummary};
use crate::dose_log::DoseLog;
use crate::inventory;
use crate::models::{
    ChangeRequest, DoseEvent, Medication, MedicationUpdate, PatientNote, PatientRecord,
    RequestKind, User, GUEST_USER_ID,
};
use crate::requests::{RequestError, RequestQueue};
use crate::roster::Roster;

#[derive(Error, Debug, PartialEq)]
pub enum CareError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: &'static str, id: String },

    #[error("Change request {0} is already resolved")]
    AlreadyResolved(Uuid),

    #[error("No signed-in user")]
    NotSignedIn,
}

impl CareError {
    fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<RequestError> for CareError {
    fn from(e: RequestError) -> Self {
        match e {
            RequestError::NotFound(id) => CareError::not_found("change_request", id),
            RequestError::AlreadyResolved { id, .. } => CareError::AlreadyResolved(id),
        }
    }
}

// ═══════════════════════════════════════════
// Medication book
// ═══════════════════════════════════════════

/// Medication records grouped by owning patient id, each list newest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MedicationBook {
    lists: BTreeMap<String, Vec<Medication>>,
}

impl MedicationBook {
    pub fn list(&self, owner_id: &str) -> &[Medication] {
        self.lists.get(owner_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_owner(&self, owner_id: &str) -> bool {
        self.lists.contains_key(owner_id)
    }

    pub fn get(&self, owner_id: &str, medication_id: &str) -> Option<&Medication> {
        self.list(owner_id).iter().find(|m| m.id == medication_id)
    }

    pub fn get_mut(&mut self, owner_id: &str, medication_id: &str) -> Option<&mut Medication> {
        self.lists
            .get_mut(owner_id)?
            .iter_mut()
            .find(|m| m.id == medication_id)
    }

    pub fn replace_list(&mut self, owner_id: &str, medications: Vec<Medication>) {
        self.lists.insert(owner_id.to_string(), medications);
    }

    pub fn prepend(&mut self, owner_id: &str, medication: Medication) {
        self.lists
            .entry(owner_id.to_string())
            .or_default()
            .insert(0, medication);
    }

    pub fn remove(&mut self, owner_id: &str, medication_id: &str) -> Option<Medication> {
        let list = self.lists.get_mut(owner_id)?;
        let index = list.iter().position(|m| m.id == medication_id)?;
        Some(list.remove(index))
    }

    /// Hand a whole list to a new owner, leaving `from` empty.
    pub fn transfer(&mut self, from: &str, to: &str) {
        if let Some(list) = self.lists.remove(from) {
            self.lists.insert(to.to_string(), list);
        }
    }
}

// ═══════════════════════════════════════════
// Snapshot
// ═══════════════════════════════════════════

/// Whole care state as stored in the local snapshot slots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CareSnapshot {
    pub session: Option<User>,
    pub meds: Vec<Medication>,
    pub patients: Vec<PatientRecord>,
    pub ai_requests: Vec<ChangeRequest>,
    pub refill_requests: Vec<ChangeRequest>,
    pub med_logs: Vec<DoseEvent>,
}

// ═══════════════════════════════════════════
// CareState
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CareState {
    book: MedicationBook,
    roster: Roster,
    requests: RequestQueue,
    dose_log: DoseLog,
    active_user: Option<User>,
}

impl CareState {
    /// Rebuild from snapshot slots. The own-list slot wins over a roster
    /// copy of the same patient.
    pub fn from_snapshot(snapshot: CareSnapshot) -> Self {
        let mut book = MedicationBook::default();
        let mut profiles = Vec::with_capacity(snapshot.patients.len());
        for record in snapshot.patients {
            book.replace_list(&record.profile.id, record.meds);
            profiles.push(record.profile);
        }

        let owner = snapshot
            .session
            .as_ref()
            .map(|u| u.id.clone())
            .unwrap_or_else(|| GUEST_USER_ID.to_string());
        book.replace_list(&owner, snapshot.meds);

        let mut requests = snapshot.ai_requests;
        requests.extend(snapshot.refill_requests);

        Self {
            book,
            roster: Roster::new(profiles),
            requests: RequestQueue::from_requests(requests),
            dose_log: DoseLog::from_events(snapshot.med_logs),
            active_user: snapshot.session,
        }
    }

    pub fn to_snapshot(&self) -> CareSnapshot {
        CareSnapshot {
            session: self.active_user.clone(),
            meds: self.medications().to_vec(),
            patients: self
                .roster
                .patients()
                .iter()
                .map(|profile| PatientRecord {
                    profile: profile.clone(),
                    meds: self.book.list(&profile.id).to_vec(),
                })
                .collect(),
            ai_requests: self.requests.schedule_changes().cloned().collect(),
            refill_requests: self.requests.refills().cloned().collect(),
            med_logs: self.dose_log.events().to_vec(),
        }
    }

    // ── Views ──────────────────────────────────────────────

    pub fn active_user(&self) -> Option<&User> {
        self.active_user.as_ref()
    }

    fn own_owner(&self) -> &str {
        self.active_user
            .as_ref()
            .map(|u| u.id.as_str())
            .unwrap_or(GUEST_USER_ID)
    }

    /// The signed-in user's own medications (the guest list when signed out).
    pub fn medications(&self) -> &[Medication] {
        self.book.list(self.own_owner())
    }

    pub fn medication(&self, medication_id: &str) -> Option<&Medication> {
        self.book.get(self.own_owner(), medication_id)
    }

    /// Roster view of one patient's medications.
    pub fn patient_medications(&self, patient_id: &str) -> &[Medication] {
        self.book.list(patient_id)
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn requests(&self) -> &RequestQueue {
        &self.requests
    }

    pub fn dose_log(&self) -> &DoseLog {
        &self.dose_log
    }

    pub fn resolve_for_date(&self, date: NaiveDate) -> Vec<Medication> {
        daily_status::resolve_status_for_date(
            date,
            self.own_owner(),
            self.medications(),
            &self.dose_log,
        )
    }

    pub fn summarize_day(&self, date: NaiveDate) -> DaySummary {
        daily_status::summarize_day(date, self.own_owner(), self.medications(), &self.dose_log)
    }

    /// Day summary of a roster patient, resolved against the doses logged
    /// on that patient's own list.
    pub fn summarize_patient_day(&self, patient_id: &str, date: NaiveDate) -> DaySummary {
        daily_status::summarize_day(
            date,
            patient_id,
            self.patient_medications(patient_id),
            &self.dose_log,
        )
    }

    // ── Identity ───────────────────────────────────────────

    /// Make `user` the active user. A user with no list of their own takes
    /// over the list built up while signed out.
    pub fn sign_in(&mut self, user: User) {
        if !self.book.has_owner(&user.id) {
            let from = self.own_owner().to_string();
            self.book.transfer(&from, &user.id);
            self.dose_log.transfer(&from, &user.id);
        }
        tracing::info!(user_id = %user.id, role = %user.role, "User signed in");
        self.active_user = Some(user);
    }

    /// Drop the active user and reset the signed-out list to `defaults`.
    pub fn sign_out(&mut self, defaults: Vec<Medication>) {
        if let Some(user) = self.active_user.take() {
            tracing::info!(user_id = %user.id, "User signed out");
        }
        self.book.replace_list(GUEST_USER_ID, defaults);
    }

    /// Replace the own list, e.g. with the list fetched from the repository.
    pub fn replace_medications(&mut self, medications: Vec<Medication>) {
        let owner = self.own_owner().to_string();
        self.book.replace_list(&owner, medications);
    }

    // ── Own medication list ────────────────────────────────

    pub fn add_medication(&mut self, medication: Medication) {
        let owner = self.own_owner().to_string();
        self.book.prepend(&owner, medication);
    }

    pub fn update_medication(
        &mut self,
        medication_id: &str,
        update: &MedicationUpdate,
    ) -> Result<&Medication, CareError> {
        let med = self.own_medication_mut(medication_id)?;
        update.apply(med);
        Ok(&*med)
    }

    pub fn delete_medication(&mut self, medication_id: &str) -> Result<Medication, CareError> {
        let owner = self.own_owner().to_string();
        self.book
            .remove(&owner, medication_id)
            .ok_or_else(|| CareError::not_found("medication", medication_id))
    }

    fn own_medication_mut(&mut self, medication_id: &str) -> Result<&mut Medication, CareError> {
        let owner = self.own_owner().to_string();
        self.book
            .get_mut(&owner, medication_id)
            .ok_or_else(|| CareError::not_found("medication", medication_id))
    }

    // ── Dose event log ─────────────────────────────────────

    /// Mark the medication taken on `date` at its scheduled time.
    pub fn record_taken(
        &mut self,
        medication_id: &str,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<DoseEvent, CareError> {
        let owner = self.own_owner().to_string();
        let med = self
            .book
            .get_mut(&owner, medication_id)
            .ok_or_else(|| CareError::not_found("medication", medication_id))?;
        let time = med.scheduled_time.clone();
        Ok(self.dose_log.record_taken(&owner, med, date, &time, now))
    }

    pub fn undo(
        &mut self,
        medication_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DoseEvent>, CareError> {
        let owner = self.own_owner().to_string();
        let med = self
            .book
            .get_mut(&owner, medication_id)
            .ok_or_else(|| CareError::not_found("medication", medication_id))?;
        let time = med.scheduled_time.clone();
        Ok(self.dose_log.undo(&owner, med, date, &time))
    }

    /// Mark-as-taken again for `date`, which is whatever date is selected
    /// now, not necessarily the date of the undone event.
    pub fn redo(
        &mut self,
        medication_id: &str,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<DoseEvent, CareError> {
        let owner = self.own_owner().to_string();
        let med = self
            .book
            .get_mut(&owner, medication_id)
            .ok_or_else(|| CareError::not_found("medication", medication_id))?;
        let time = med.scheduled_time.clone();
        Ok(self.dose_log.redo(&owner, med, date, &time, now))
    }

    // ── Inventory ledger ───────────────────────────────────

    pub fn update_stock(&mut self, medication_id: &str, count: u32) -> Result<&Medication, CareError> {
        let med = self.own_medication_mut(medication_id)?;
        inventory::set_stock(med, count);
        Ok(&*med)
    }

    // ── Change-request workflow ────────────────────────────

    fn requester(&self) -> Result<User, CareError> {
        self.active_user.clone().ok_or(CareError::NotSignedIn)
    }

    pub fn submit_schedule_change(
        &mut self,
        medication_id: &str,
        new_time: &str,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Uuid, CareError> {
        let requester = self.requester()?;
        let med = self
            .book
            .get(&requester.id, medication_id)
            .ok_or_else(|| CareError::not_found("medication", medication_id))?;
        let request = ChangeRequest::schedule_change(&requester, med, new_time, reason, now);
        Ok(self.requests.submit(request).id)
    }

    pub fn submit_refill(
        &mut self,
        medication_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Uuid, CareError> {
        let requester = self.requester()?;
        let med = self
            .book
            .get(&requester.id, medication_id)
            .ok_or_else(|| CareError::not_found("medication", medication_id))?;
        let request = ChangeRequest::refill(&requester, med, now);
        Ok(self.requests.submit(request).id)
    }

    /// Approve and apply: a schedule change rewrites the scheduled time, a
    /// refill restocks to capacity. Nothing changes unless both the request
    /// and its target medication exist. Does not refuse already-resolved
    /// requests; see [`CareState::approve_pending`].
    pub fn approve_request(
        &mut self,
        request_id: &Uuid,
        now: DateTime<Utc>,
    ) -> Result<ChangeRequest, CareError> {
        let request = self
            .requests
            .get(request_id)
            .ok_or_else(|| CareError::not_found("change_request", request_id))?
            .clone();

        let med = self
            .book
            .get_mut(&request.patient_id, &request.medication_id)
            .ok_or_else(|| CareError::not_found("medication", &request.medication_id))?;

        match &request.kind {
            RequestKind::ScheduleChange { new_time, .. } => {
                med.scheduled_time = new_time.clone();
            }
            RequestKind::Refill { .. } => {
                inventory::apply_refill(med, now);
            }
        }

        let approved = self.requests.approve(request_id)?.clone();
        tracing::info!(
            request_id = %approved.id,
            patient_id = %approved.patient_id,
            medication_id = %approved.medication_id,
            refill = approved.is_refill(),
            "Change request approved"
        );
        Ok(approved)
    }

    pub fn reject_request(&mut self, request_id: &Uuid) -> Result<ChangeRequest, CareError> {
        let rejected = self.requests.reject(request_id)?.clone();
        tracing::info!(request_id = %rejected.id, "Change request rejected");
        Ok(rejected)
    }

    /// Approval gated on the request still being Pending.
    pub fn approve_pending(
        &mut self,
        request_id: &Uuid,
        now: DateTime<Utc>,
    ) -> Result<ChangeRequest, CareError> {
        self.requests.ensure_pending(request_id)?;
        self.approve_request(request_id, now)
    }

    /// Rejection gated on the request still being Pending.
    pub fn reject_pending(&mut self, request_id: &Uuid) -> Result<ChangeRequest, CareError> {
        self.requests.ensure_pending(request_id)?;
        self.reject_request(request_id)
    }

    // ── Caregiver roster ───────────────────────────────────

    pub fn add_note(
        &mut self,
        patient_id: &str,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<PatientNote, CareError> {
        self.roster
            .add_note(patient_id, text, now)
            .cloned()
            .ok_or_else(|| CareError::not_found("patient", patient_id))
    }

    pub fn set_reminder(
        &mut self,
        patient_id: &str,
        medication_id: &str,
        reminder_time: Option<String>,
    ) -> Result<&Medication, CareError> {
        if !self.roster.contains(patient_id) {
            return Err(CareError::not_found("patient", patient_id));
        }
        let med = self
            .book
            .get_mut(patient_id, medication_id)
            .ok_or_else(|| CareError::not_found("medication", medication_id))?;
        med.reminder_time = reminder_time;
        Ok(&*med)
    }
}
