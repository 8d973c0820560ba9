// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recording stand-ins for the chat transport and the job launcher.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use kidstunes_core::types::{Decision, OriginRef, SurfaceStage};
use kidstunes_core::{
    AdapterType, HealthStatus, KidsTunesError, Notifier, PluginAdapter, Request, RequestId,
    ResolverBackend,
};
use kidstunes_engine::JobLauncher;

/// Captures every notification instead of sending it.
#[derive(Default)]
pub struct RecordingNotifier {
    decisions: Mutex<Vec<(OriginRef, Decision)>>,
    surfaces: Mutex<Vec<(RequestId, SurfaceStage)>>,
    fail: AtomicBool,
    hang: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later call fail after recording it.
    pub fn fail_from_now(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Make every later call record itself and then never return.
    pub fn hang_from_now(&self) {
        self.hang.store(true, Ordering::SeqCst);
    }

    pub fn decisions(&self) -> Vec<(OriginRef, Decision)> {
        self.decisions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Surface stages rendered for `id`, in order.
    pub fn surfaces_for(&self, id: RequestId) -> Vec<SurfaceStage> {
        self.surfaces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(rid, _)| *rid == id)
            .map(|(_, stage)| stage.clone())
            .collect()
    }

    async fn outcome(&self) -> Result<(), KidsTunesError> {
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            Err(KidsTunesError::Transport {
                message: "recording notifier set to fail".into(),
                source: None,
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PluginAdapter for RecordingNotifier {
    fn name(&self) -> &str {
        "recording-notifier"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, KidsTunesError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_requester(
        &self,
        origin: &OriginRef,
        decision: Decision,
    ) -> Result<(), KidsTunesError> {
        self.decisions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((origin.clone(), decision));
        self.outcome().await
    }

    async fn update_surface(
        &self,
        request: &Request,
        stage: &SurfaceStage,
    ) -> Result<(), KidsTunesError> {
        self.surfaces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((request.id, stage.clone()));
        self.outcome().await
    }
}

/// A launcher that only counts, for asserting how often a pipeline would run.
#[derive(Default)]
pub struct CountingLauncher {
    launched: Mutex<Vec<RequestId>>,
}

impl CountingLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn launched(&self) -> Vec<RequestId> {
        self.launched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self) -> usize {
        self.launched().len()
    }
}

impl JobLauncher for CountingLauncher {
    fn launch(&self, request: &Request) {
        self.launched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.id);
    }
}

/// A resolver backend that always answers with the same text.
pub struct StubResolverBackend {
    answer: Result<String, String>,
}

impl StubResolverBackend {
    pub fn answering(content: &str) -> Self {
        Self {
            answer: Ok(content.to_string()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            answer: Err(message.to_string()),
        }
    }
}

#[async_trait]
impl PluginAdapter for StubResolverBackend {
    fn name(&self) -> &str {
        "stub-resolver"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Resolver
    }

    async fn health_check(&self) -> Result<HealthStatus, KidsTunesError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ResolverBackend for StubResolverBackend {
    async fn refine(&self, _query: &str) -> Result<String, KidsTunesError> {
        self.answer.clone().map_err(|message| KidsTunesError::Resolver {
            message,
            source: None,
        })
    }
}
