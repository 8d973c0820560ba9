// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable request store contract.

use async_trait::async_trait;

use crate::error::KidsTunesError;
use crate::lifecycle::RequestStatus;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ApprovalRef, NewRequest, Request, RequestId, RequestUpdate};

/// Single source of truth for request lifecycle state.
///
/// Every failure surfaced here is a persistence error and is fatal to the
/// triggering operation.
#[async_trait]
pub trait RequestStore: PluginAdapter {
    /// Persists a new `pending` record and returns its identifier.
    async fn create(&self, request: &NewRequest) -> Result<RequestId, KidsTunesError>;

    /// Fetches a record by identifier.
    async fn get(&self, id: RequestId) -> Result<Option<Request>, KidsTunesError>;

    /// Fetches the record tied to an approval surface.
    async fn get_by_approval_ref(
        &self,
        approval_ref: &ApprovalRef,
    ) -> Result<Option<Request>, KidsTunesError>;

    /// Fetches every record whose library file is `file_path`.
    async fn get_by_file_path(&self, file_path: &str) -> Result<Vec<Request>, KidsTunesError>;

    /// Lists records currently in `status`, oldest first.
    async fn list_by_status(&self, status: RequestStatus) -> Result<Vec<Request>, KidsTunesError>;

    /// Ties an approval surface to a record. Succeeds at most once per record;
    /// returns `false` when the record already has one or does not exist.
    async fn attach_approval_ref(
        &self,
        id: RequestId,
        approval_ref: &ApprovalRef,
    ) -> Result<bool, KidsTunesError>;

    /// Applies a partial update. When the update carries a status change, the
    /// write is a single compare-and-set and returns `false` if the persisted
    /// status was no longer `from` or the edge is not in the lifecycle graph.
    async fn update(&self, id: RequestId, update: &RequestUpdate) -> Result<bool, KidsTunesError>;
}
