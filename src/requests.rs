//! Change-request workflow: schedule-change and refill requests share one
//! Pending → Approved | Rejected state machine.
//!
//! The queue does not refuse to re-resolve a terminal request. Callers that
//! must not double-apply side effects gate on [`RequestQueue::ensure_pending`].

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ApprovalStatus, ChangeRequest};

#[derive(Error, Debug, PartialEq)]
pub enum RequestError {
    #[error("Change request not found: {0}")]
    NotFound(Uuid),

    #[error("Change request {id} is already {status}")]
    AlreadyResolved { id: Uuid, status: ApprovalStatus },
}

/// Requests of both kinds, newest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestQueue {
    requests: Vec<ChangeRequest>,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_requests(mut requests: Vec<ChangeRequest>) -> Self {
        requests.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Self { requests }
    }

    pub fn requests(&self) -> &[ChangeRequest] {
        &self.requests
    }

    pub fn get(&self, id: &Uuid) -> Option<&ChangeRequest> {
        self.requests.iter().find(|r| &r.id == id)
    }

    pub fn submit(&mut self, request: ChangeRequest) -> &ChangeRequest {
        tracing::info!(
            request_id = %request.id,
            patient_id = %request.patient_id,
            medication_id = %request.medication_id,
            refill = request.is_refill(),
            "Change request submitted"
        );
        self.requests.insert(0, request);
        &self.requests[0]
    }

    pub fn pending(&self) -> impl Iterator<Item = &ChangeRequest> {
        self.requests.iter().filter(|r| r.is_pending())
    }

    pub fn pending_for_patient<'a>(
        &'a self,
        patient_id: &'a str,
    ) -> impl Iterator<Item = &'a ChangeRequest> {
        self.pending().filter(move |r| r.patient_id == patient_id)
    }

    pub fn schedule_changes(&self) -> impl Iterator<Item = &ChangeRequest> {
        self.requests.iter().filter(|r| !r.is_refill())
    }

    pub fn refills(&self) -> impl Iterator<Item = &ChangeRequest> {
        self.requests.iter().filter(|r| r.is_refill())
    }

    /// Caller-side guard: the request exists and is still Pending.
    pub fn ensure_pending(&self, id: &Uuid) -> Result<&ChangeRequest, RequestError> {
        let request = self.get(id).ok_or(RequestError::NotFound(*id))?;
        if request.status.is_terminal() {
            return Err(RequestError::AlreadyResolved {
                id: *id,
                status: request.status,
            });
        }
        Ok(request)
    }

    /// Write the status unconditionally.
    pub fn set_status(
        &mut self,
        id: &Uuid,
        status: ApprovalStatus,
    ) -> Result<&ChangeRequest, RequestError> {
        let request = self
            .requests
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or(RequestError::NotFound(*id))?;

        if request.status.is_terminal() {
            tracing::warn!(
                request_id = %id,
                from = %request.status,
                to = %status,
                "Re-resolving a request that was already resolved"
            );
        }
        request.status = status;
        Ok(request)
    }

    pub fn approve(&mut self, id: &Uuid) -> Result<&ChangeRequest, RequestError> {
        self.set_status(id, ApprovalStatus::Approved)
    }

    pub fn reject(&mut self, id: &Uuid) -> Result<&ChangeRequest, RequestError> {
        self.set_status(id, ApprovalStatus::Rejected)
    }
}
