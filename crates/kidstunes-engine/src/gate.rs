// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Moderator decisions: approve, reject and retry.
//!
//! Every decision is a conditional write against the persisted status, so of
//! any number of concurrent or repeated signals on one record at most one
//! moves it. Only the caller whose write succeeded launches a job or tells
//! the requester. Unauthorized actors and unknown surfaces are dropped
//! without a trace outside the debug log.
//!
//! Chat updates are best-effort and run on the tracker, so a slow transport
//! never holds up the next signal. The `Downloading` surface is posted by the
//! launched job itself, ahead of its terminal stage.

use std::sync::Arc;

use kidstunes_core::types::{Decision, Signal, SignalKind, SurfaceStage};
use kidstunes_core::{
    KidsTunesError, Notifier, Request, RequestId, RequestStatus, RequestStore, RequestUpdate,
};
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::launcher::JobLauncher;

/// What happened to a signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalOutcome {
    Unauthorized,
    NotFound,
    /// The record had already left `pending`; nothing changed.
    AlreadyDecided(RequestId),
    Approved(RequestId),
    Rejected(RequestId),
}

/// What happened to a retry command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome {
    Unauthorized,
    NotFound,
    /// The record exists but is not `failed`.
    NotRetryable(RequestStatus),
    Relaunched(RequestId),
}

/// Turns moderator gestures into lifecycle transitions.
pub struct ApprovalGate {
    store: Arc<dyn RequestStore>,
    launcher: Arc<dyn JobLauncher>,
    notifier: Option<Arc<dyn Notifier>>,
    tracker: TaskTracker,
    moderator_role: String,
}

impl ApprovalGate {
    pub fn new(
        store: Arc<dyn RequestStore>,
        launcher: Arc<dyn JobLauncher>,
        moderator_role: impl Into<String>,
    ) -> Self {
        Self {
            store,
            launcher,
            notifier: None,
            tracker: TaskTracker::new(),
            moderator_role: moderator_role.into(),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Run notifications on `tracker` so shutdown drains them with the jobs.
    pub fn with_tracker(mut self, tracker: TaskTracker) -> Self {
        self.tracker = tracker;
        self
    }

    fn is_moderator(&self, roles: &[String]) -> bool {
        roles.iter().any(|r| *r == self.moderator_role)
    }

    /// Apply an approve or reject gesture.
    ///
    /// Only persistence failures are returned as errors.
    pub async fn on_signal(&self, signal: &Signal) -> Result<SignalOutcome, KidsTunesError> {
        if !self.is_moderator(&signal.actor_roles) {
            debug!(approval_ref = %signal.approval_ref, "signal from non-moderator ignored");
            return Ok(SignalOutcome::Unauthorized);
        }

        let Some(mut request) = self.store.get_by_approval_ref(&signal.approval_ref).await? else {
            debug!(approval_ref = %signal.approval_ref, "signal for unknown surface ignored");
            return Ok(SignalOutcome::NotFound);
        };
        let id = request.id;

        let target = match signal.kind {
            SignalKind::Approve => RequestStatus::Approved,
            SignalKind::Reject => RequestStatus::Rejected,
        };
        let claimed = self
            .store
            .update(id, &RequestUpdate::transition(RequestStatus::Pending, target))
            .await?;
        if !claimed {
            debug!(request_id = %id, kind = %signal.kind, "request already decided, signal ignored");
            return Ok(SignalOutcome::AlreadyDecided(id));
        }
        request.status = target;
        info!(request_id = %id, status = %target, "request decided");

        match signal.kind {
            SignalKind::Approve => {
                self.launcher.launch(&request);
                self.announce(request, None, Decision::Approved);
                Ok(SignalOutcome::Approved(id))
            }
            SignalKind::Reject => {
                self.announce(request, Some(SurfaceStage::Rejected), Decision::Rejected);
                Ok(SignalOutcome::Rejected(id))
            }
        }
    }

    /// Re-arm a failed request and run its pipeline again.
    pub async fn on_retry(
        &self,
        id: RequestId,
        actor_roles: &[String],
    ) -> Result<RetryOutcome, KidsTunesError> {
        if !self.is_moderator(actor_roles) {
            debug!(request_id = %id, "retry from non-moderator ignored");
            return Ok(RetryOutcome::Unauthorized);
        }

        let Some(request) = self.store.get(id).await? else {
            return Ok(RetryOutcome::NotFound);
        };
        let rearmed = self
            .store
            .update(
                id,
                &RequestUpdate::transition(RequestStatus::Failed, RequestStatus::Approved),
            )
            .await?;
        if !rearmed {
            return Ok(RetryOutcome::NotRetryable(request.status));
        }

        let request = Request {
            status: RequestStatus::Approved,
            ..request
        };
        info!(request_id = %id, "retrying failed request");
        self.launcher.launch(&request);
        Ok(RetryOutcome::Relaunched(id))
    }

    /// Update the approval surface, then tell the requester, on the tracker.
    fn announce(&self, request: Request, stage: Option<SurfaceStage>, decision: Decision) {
        let Some(notifier) = self.notifier.clone() else {
            return;
        };
        self.tracker.spawn(async move {
            let id = request.id;
            if let Some(stage) = stage
                && request.approval_ref.is_some()
                && let Err(e) = notifier.update_surface(&request, &stage).await
            {
                warn!(request_id = %id, error = %e, "failed to update approval surface");
            }
            if let Some(origin) = &request.origin
                && let Err(e) = notifier.notify_requester(origin, decision).await
            {
                warn!(request_id = %id, error = %e, "failed to notify requester");
            }
        });
    }
}
