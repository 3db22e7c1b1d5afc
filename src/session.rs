//! PillCare session: the caller-facing layer over [`CareState`].
//!
//! Owns the selected calendar date, the collaborators and the snapshot
//! connection. Missing ids are logged and ignored, collaborator failures
//! become a [`Notice`] with state untouched, and every successful change is
//! written back to the snapshot store.

use std::fmt;
use std::path::Path;

use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use thiserror::Error;
use uuid::Uuid;

use crate::care_state::{CareError, CareState};
use crate::daily_status::DaySummary;
use crate::db::{self, DatabaseError};
use crate::models::{
    calendar_day, DoseEvent, Medication, MedicationDraft, MedicationUpdate, PatientNote, User,
    UserRole,
};
use crate::seed;
use crate::services::{
    IdentityError, IdentityProvider, InsightProvider, InsightResponse, InsightService,
    MedicationRepository, SignUpDetails, SuggestedChange,
};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("{0}")]
    Identity(#[from] IdentityError),
}

/// Short user-facing confirmation or failure message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    MedicationAdded,
    MedicationAddFailed,
    MedicationUpdated,
    MedicationUpdateFailed,
    MedicationDeleted,
    MedicationDeleteFailed,
    StockUpdated,
    StatusReverted,
    RefillRequested,
    ChangeRequested,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Self::MedicationAdded => "Medicine added successfully!",
            Self::MedicationAddFailed => "Failed to add medicine.",
            Self::MedicationUpdated => "Medicine updated successfully!",
            Self::MedicationUpdateFailed => "Failed to update medicine.",
            Self::MedicationDeleted => "Medicine deleted successfully!",
            Self::MedicationDeleteFailed => "Failed to delete medicine.",
            Self::StockUpdated => "Stock updated successfully",
            Self::StatusReverted => "Status reverted",
            Self::RefillRequested => "Refill request sent to caregiver!",
            Self::ChangeRequested => "Change request sent to caregiver!",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::MedicationAddFailed | Self::MedicationUpdateFailed | Self::MedicationDeleteFailed
        )
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

pub struct PillCareSession {
    state: CareState,
    selected_date: NaiveDate,
    store: Connection,
    identity: Box<dyn IdentityProvider>,
    repository: Box<dyn MedicationRepository>,
}

impl PillCareSession {
    /// Open the snapshot database at `path` and restore the stored state.
    pub fn open(
        path: &Path,
        identity: Box<dyn IdentityProvider>,
        repository: Box<dyn MedicationRepository>,
    ) -> Result<Self, SessionError> {
        let conn = db::open_database(path)?;
        Ok(Self::with_store(conn, identity, repository))
    }

    /// Restore from an already-migrated connection.
    pub fn with_store(
        store: Connection,
        identity: Box<dyn IdentityProvider>,
        repository: Box<dyn MedicationRepository>,
    ) -> Self {
        let state = CareState::from_snapshot(db::load_snapshot(&store));
        tracing::info!(
            signed_in = state.active_user().is_some(),
            medications = state.medications().len(),
            patients = state.roster().patients().len(),
            "Session restored"
        );
        Self {
            state,
            selected_date: calendar_day(Utc::now()),
            store,
            identity,
            repository,
        }
    }

    pub fn state(&self) -> &CareState {
        &self.state
    }

    pub fn selected_date(&self) -> NaiveDate {
        self.selected_date
    }

    pub fn select_date(&mut self, date: NaiveDate) {
        self.selected_date = date;
    }

    /// Own medications resolved for the selected date.
    pub fn medications_for_selected_date(&self) -> Vec<Medication> {
        self.state.resolve_for_date(self.selected_date)
    }

    pub fn day_summary(&self) -> DaySummary {
        self.state.summarize_day(self.selected_date)
    }

    fn persist(&self) {
        if let Err(e) = db::save_snapshot(&self.store, &self.state.to_snapshot()) {
            tracing::warn!(error = %e, "Failed to save snapshot");
        }
    }

    /// Persist on success; log and swallow care errors.
    fn settle<T>(&self, operation: &'static str, result: Result<T, CareError>) -> Option<T> {
        match result {
            Ok(value) => {
                self.persist();
                Some(value)
            }
            Err(e) => {
                tracing::warn!(operation, error = %e, "Ignoring operation");
                None
            }
        }
    }

    fn active_user_id(&self) -> Option<String> {
        self.state.active_user().map(|u| u.id.clone())
    }

    // ── Identity ───────────────────────────────────────────

    pub fn sign_up(
        &mut self,
        email: &str,
        password: &str,
        name: &str,
        role: UserRole,
        details: SignUpDetails,
    ) -> Result<User, SessionError> {
        let user = self.identity.sign_up(email, password, name, role, details)?;
        self.activate(user.clone());
        Ok(user)
    }

    pub fn sign_in(&mut self, email: &str, password: &str) -> Result<User, SessionError> {
        let user = self.identity.sign_in(email, password)?;
        self.activate(user.clone());
        Ok(user)
    }

    /// Proceed without an account.
    pub fn continue_as_guest(&mut self, role: UserRole) {
        self.state.sign_in(User::guest(role));
        self.persist();
    }

    /// Sign out and reset the own list to the defaults.
    pub fn sign_out(&mut self) -> Result<(), SessionError> {
        self.identity.sign_out()?;
        self.state.sign_out(seed::default_medications());
        self.persist();
        Ok(())
    }

    /// Make `user` active; patients pick up their stored medications when
    /// the repository has any.
    fn activate(&mut self, user: User) {
        let fetch = user.is_patient().then(|| user.id.clone());
        self.state.sign_in(user);

        if let Some(user_id) = fetch {
            match self.repository.list(&user_id) {
                Ok(meds) if !meds.is_empty() => self.state.replace_medications(meds),
                Ok(_) => {}
                Err(e) => tracing::warn!(user_id = %user_id, error = %e, "Failed to fetch medications"),
            }
        }
        self.persist();
    }

    // ── Medication CRUD ────────────────────────────────────

    /// `None` when nobody is signed in.
    pub fn add_medication(&mut self, draft: MedicationDraft) -> Option<Notice> {
        let user_id = self.active_user_id()?;
        match self.repository.add(&user_id, draft) {
            Ok(med) => {
                self.state.add_medication(med);
                self.persist();
                Some(Notice::MedicationAdded)
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Failed to add medication");
                Some(Notice::MedicationAddFailed)
            }
        }
    }

    /// `None` when nobody is signed in or the own list has no such id.
    pub fn update_medication(
        &mut self,
        medication_id: &str,
        update: &MedicationUpdate,
    ) -> Option<Notice> {
        let user_id = self.active_user_id()?;
        if let Err(e) = self.repository.update(&user_id, medication_id, update) {
            tracing::warn!(medication_id, error = %e, "Failed to update medication");
            return Some(Notice::MedicationUpdateFailed);
        }
        let result = self.state.update_medication(medication_id, update).map(|_| ());
        self.settle("update_medication", result)
            .map(|()| Notice::MedicationUpdated)
    }

    pub fn delete_medication(&mut self, medication_id: &str) -> Option<Notice> {
        let user_id = self.active_user_id()?;
        if let Err(e) = self.repository.delete(&user_id, medication_id) {
            tracing::warn!(medication_id, error = %e, "Failed to delete medication");
            return Some(Notice::MedicationDeleteFailed);
        }
        let result = self.state.delete_medication(medication_id);
        self.settle("delete_medication", result);
        Some(Notice::MedicationDeleted)
    }

    // ── Dose log ───────────────────────────────────────────

    pub fn mark_taken(&mut self, medication_id: &str) -> Option<DoseEvent> {
        let result = self
            .state
            .record_taken(medication_id, self.selected_date, Utc::now());
        self.settle("mark_taken", result)
    }

    /// Revert the selected date's status. The notice offers a redo.
    pub fn undo(&mut self, medication_id: &str) -> Option<Notice> {
        let result = self.state.undo(medication_id, self.selected_date);
        self.settle("undo", result).map(|_| Notice::StatusReverted)
    }

    /// Mark as taken again for whatever date is selected now.
    pub fn redo(&mut self, medication_id: &str) -> Option<DoseEvent> {
        let result = self
            .state
            .redo(medication_id, self.selected_date, Utc::now());
        self.settle("redo", result)
    }

    pub fn update_stock(&mut self, medication_id: &str, count: u32) -> Option<Notice> {
        let result = self.state.update_stock(medication_id, count).map(|_| ());
        self.settle("update_stock", result).map(|_| Notice::StockUpdated)
    }

    // ── Change requests ────────────────────────────────────

    pub fn request_refill(&mut self, medication_id: &str) -> Option<Notice> {
        let result = self.state.submit_refill(medication_id, Utc::now());
        self.settle("request_refill", result).map(|_| Notice::RefillRequested)
    }

    pub fn request_schedule_change(
        &mut self,
        medication_id: &str,
        new_time: &str,
        reason: &str,
    ) -> Option<Uuid> {
        let result = self
            .state
            .submit_schedule_change(medication_id, new_time, reason, Utc::now());
        self.settle("request_schedule_change", result)
    }

    /// Forward an insight's suggestion for caregiver approval. Skipped while
    /// the user already has a schedule change pending.
    pub fn apply_suggested_change(&mut self, change: &SuggestedChange) -> Option<Notice> {
        let user_id = self.active_user_id()?;
        let already_pending = self
            .state
            .requests()
            .pending_for_patient(&user_id)
            .any(|r| !r.is_refill());
        if already_pending {
            tracing::debug!(medication_id = %change.medication_id, "Schedule change already pending");
            return None;
        }
        self.request_schedule_change(&change.medication_id, &change.new_time, &change.reason)
            .map(|_| Notice::ChangeRequested)
    }

    pub fn approve_request(&mut self, request_id: &Uuid) -> bool {
        let result = self.state.approve_pending(request_id, Utc::now());
        self.settle("approve_request", result).is_some()
    }

    pub fn reject_request(&mut self, request_id: &Uuid) -> bool {
        let result = self.state.reject_pending(request_id);
        self.settle("reject_request", result).is_some()
    }

    // ── Caregiver roster ───────────────────────────────────

    pub fn add_note(&mut self, patient_id: &str, text: &str) -> Option<PatientNote> {
        let result = self.state.add_note(patient_id, text, Utc::now());
        self.settle("add_note", result)
    }

    pub fn set_reminder(
        &mut self,
        patient_id: &str,
        medication_id: &str,
        reminder_time: Option<String>,
    ) -> bool {
        let result = self
            .state
            .set_reminder(patient_id, medication_id, reminder_time)
            .map(|_| ());
        self.settle("set_reminder", result).is_some()
    }

    // ── Insights ───────────────────────────────────────────

    /// Insight for the selected day's schedule and adherence.
    pub fn health_insights<P: InsightProvider>(&self, service: &InsightService<P>) -> InsightResponse {
        let summary = self.day_summary();
        service.health_insights(&summary.medications, summary.adherence)
    }
}
