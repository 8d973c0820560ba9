// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! New requests: resolve, then persist as `pending`.

use std::sync::Arc;

use kidstunes_core::types::IntakeRequest;
use kidstunes_core::{ApprovalRef, KidsTunesError, NewRequest, Request, RequestId, RequestStore};
use kidstunes_resolver::MetadataResolver;
use tracing::info;

pub struct Intake {
    store: Arc<dyn RequestStore>,
    resolver: MetadataResolver,
}

impl Intake {
    pub fn new(store: Arc<dyn RequestStore>, resolver: MetadataResolver) -> Self {
        Self { store, resolver }
    }

    /// Create a `pending` record for `request` and return it.
    ///
    /// Resolution never fails the intake; a blank query does.
    pub async fn submit(&self, request: IntakeRequest) -> Result<Request, KidsTunesError> {
        let query = request.query.trim();
        if query.is_empty() {
            return Err(KidsTunesError::InvalidRequest(
                "request query is empty".to_string(),
            ));
        }

        let resolution = self.resolver.resolve(query).await;
        let new = NewRequest {
            requester_id: request.requester_id,
            requester_name: request.requester_name,
            original_query: query.to_string(),
            origin: request.origin,
            resolution,
        };
        let id = self.store.create(&new).await?;
        info!(
            request_id = %id,
            requester = %new.requester_name,
            query = %new.original_query,
            refined = %new.resolution.refined_query,
            "request created"
        );

        self.store
            .get(id)
            .await?
            .ok_or_else(|| KidsTunesError::Internal(format!("request {id} vanished after create")))
    }

    /// Tie the moderation surface to the record. Returns `false` if one was
    /// already attached.
    pub async fn attach_approval_ref(
        &self,
        id: RequestId,
        approval_ref: &ApprovalRef,
    ) -> Result<bool, KidsTunesError> {
        self.store.attach_approval_ref(id, approval_ref).await
    }
}
