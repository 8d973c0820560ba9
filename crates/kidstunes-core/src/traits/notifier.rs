// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound side of the chat transport.

use async_trait::async_trait;

use crate::error::KidsTunesError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Decision, OriginRef, Request, SurfaceStage};

/// Signals back to humans through the chat platform.
///
/// Every call is best-effort from the engine's point of view: a failure is
/// logged and never rolls back a state transition.
#[async_trait]
pub trait Notifier: PluginAdapter {
    /// Tells the requester what the moderator decided.
    async fn notify_requester(
        &self,
        origin: &OriginRef,
        decision: Decision,
    ) -> Result<(), KidsTunesError>;

    /// Re-renders the approval surface of `request` at `stage`.
    async fn update_surface(
        &self,
        request: &Request,
        stage: &SurfaceStage,
    ) -> Result<(), KidsTunesError>;
}
