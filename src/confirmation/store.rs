//! In-memory confirmation request store.

use std::collections::HashMap;

use chrono::Utc;
use parking_lot::Mutex;

use super::{
    ConfirmationRequest, ConfirmationStatus, ExecutionRecord, NewConfirmation, RequestId,
    Resolution, ResolutionNote,
};
use crate::{Error, Result};

#[derive(Default)]
struct StoreInner {
    sequence: u64,
    requests: Vec<ConfirmationRequest>,
    index: HashMap<RequestId, usize>,
}

impl StoreInner {
    fn request_mut(&mut self, id: &RequestId) -> Result<&mut ConfirmationRequest> {
        let position = *self
            .index
            .get(id)
            .ok_or_else(|| Error::RequestNotFound { id: id.clone() })?;
        Ok(&mut self.requests[position])
    }

    fn reindex(&mut self) {
        self.index = self
            .requests
            .iter()
            .enumerate()
            .map(|(position, request)| (request.id.clone(), position))
            .collect();
    }
}

fn runnable(request: &ConfirmationRequest) -> Result<()> {
    if request.status != ConfirmationStatus::Approved {
        return Err(Error::NotApproved {
            id: request.id.clone(),
            status: request.status,
        });
    }
    if request.executed {
        return Err(Error::AlreadyExecuted {
            id: request.id.clone(),
        });
    }
    Ok(())
}

/// Registry of confirmation requests.
///
/// Every operation runs inside one short critical section, so id
/// assignment and insertion are a single step and two resolutions of the
/// same id cannot both succeed. Requests are kept in creation order.
/// Sequence numbers are never reused, even after removal.
#[derive(Default)]
pub struct ConfirmationStore {
    inner: Mutex<StoreInner>,
}

impl ConfirmationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, new: NewConfirmation) -> RequestId {
        let mut inner = self.inner.lock();
        inner.sequence += 1;
        let id = RequestId::from_sequence(inner.sequence);

        let request = ConfirmationRequest::open(id.clone(), new);
        tracing::info!(
            request_id = %id,
            operation = %request.operation,
            severity = %request.severity,
            "Confirmation request created"
        );

        let position = inner.requests.len();
        inner.requests.push(request);
        inner.index.insert(id.clone(), position);
        id
    }

    pub fn get(&self, id: &RequestId) -> Result<ConfirmationRequest> {
        let inner = self.inner.lock();
        inner
            .index
            .get(id)
            .map(|&position| inner.requests[position].clone())
            .ok_or_else(|| {
                tracing::debug!(request_id = %id, "Confirmation request not found");
                Error::RequestNotFound { id: id.clone() }
            })
    }

    /// Requests in `status`, oldest first.
    pub fn list_by_status(&self, status: ConfirmationStatus) -> Vec<ConfirmationRequest> {
        self.inner
            .lock()
            .requests
            .iter()
            .filter(|request| request.status == status)
            .cloned()
            .collect()
    }

    /// Moves a PENDING request to a terminal status.
    pub fn resolve(
        &self,
        id: &RequestId,
        resolution: Resolution,
        note: ResolutionNote,
    ) -> Result<ConfirmationRequest> {
        let mut inner = self.inner.lock();
        let request = inner.request_mut(id)?;
        if request.status.is_terminal() {
            return Err(Error::AlreadyResolved {
                id: id.clone(),
                status: request.status,
            });
        }

        request.status = resolution.status();
        request.resolved_at = Some(Utc::now());
        request.resolved_by = note.actor;
        request.reason = note.reason;

        tracing::info!(
            request_id = %id,
            status = %request.status,
            resolved_by = request.resolved_by.as_deref().unwrap_or(""),
            reason = request.reason.as_deref().unwrap_or(""),
            "Confirmation request resolved"
        );

        Ok(request.clone())
    }

    pub fn cancel(&self, id: &RequestId, note: ResolutionNote) -> Result<ConfirmationRequest> {
        self.resolve(id, Resolution::Cancel, note)
    }

    /// Reserves an APPROVED request for execution. Only one caller can hold
    /// the claim; it is released by [`record_execution`](Self::record_execution).
    pub fn claim_execution(&self, id: &RequestId) -> Result<ConfirmationRequest> {
        let mut inner = self.inner.lock();
        let request = inner.request_mut(id)?;
        runnable(request)?;
        if request.execution_claimed {
            return Err(Error::AlreadyExecuted { id: id.clone() });
        }
        request.execution_claimed = true;
        Ok(request.clone())
    }

    /// Stores the result of running an APPROVED request. A request records
    /// at most one execution.
    pub fn record_execution(
        &self,
        id: &RequestId,
        record: ExecutionRecord,
    ) -> Result<ConfirmationRequest> {
        let mut inner = self.inner.lock();
        let request = inner.request_mut(id)?;
        runnable(request)?;

        request.executed = true;
        request.execution_claimed = false;
        request.executed_at = Some(Utc::now());
        request.rows_affected = record.rows_affected;
        request.execution_error = record.error;

        match &request.execution_error {
            Some(error) => tracing::warn!(request_id = %id, error = %error, "Confirmed request failed"),
            None => tracing::info!(
                request_id = %id,
                rows_affected = request.rows_affected.unwrap_or(0),
                "Confirmed request executed"
            ),
        }

        Ok(request.clone())
    }

    /// Drops a request regardless of its status.
    pub fn remove(&self, id: &RequestId) -> Result<ConfirmationRequest> {
        let mut inner = self.inner.lock();
        let position = inner
            .index
            .remove(id)
            .ok_or_else(|| Error::RequestNotFound { id: id.clone() })?;
        let request = inner.requests.remove(position);
        inner.reindex();

        tracing::debug!(request_id = %id, status = %request.status, "Confirmation request removed");
        Ok(request)
    }

    /// Drops every settled request and returns their ids. PENDING requests
    /// and APPROVED requests not yet executed are kept.
    pub fn prune_resolved(&self) -> Vec<RequestId> {
        let mut inner = self.inner.lock();
        let mut pruned = Vec::new();
        inner.requests.retain(|request| {
            if request.is_settled() {
                pruned.push(request.id.clone());
                false
            } else {
                true
            }
        });
        if !pruned.is_empty() {
            inner.reindex();
            tracing::debug!(count = pruned.len(), "Pruned settled confirmation requests");
        }
        pruned
    }

    pub fn count(&self, status: ConfirmationStatus) -> usize {
        self.inner
            .lock()
            .requests
            .iter()
            .filter(|request| request.status == status)
            .count()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ConfirmationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmationStore")
            .field("len", &self.len())
            .finish()
    }
}
