// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single ordered entry point for everything the transport delivers.
//!
//! The transport holds an [`EngineHandle`] and sends typed
//! [`EngineCommand`]s; the [`Dispatcher`] consumes them in arrival order.
//! Signals and retries are applied inline (one conditional write each).
//! Intake runs on a tracked task because resolution may take seconds and
//! touches no existing record.

use std::sync::Arc;

use kidstunes_core::types::{IntakeRequest, Signal};
use kidstunes_core::{ApprovalRef, KidsTunesError, Request, RequestId};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::gate::{ApprovalGate, RetryOutcome, SignalOutcome};
use crate::intake::Intake;

/// Default command queue depth.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

type Reply<T> = oneshot::Sender<Result<T, KidsTunesError>>;

/// A typed message routed to the engine.
#[derive(Debug)]
pub enum EngineCommand {
    Submit {
        request: IntakeRequest,
        reply: Reply<Request>,
    },
    AttachApprovalRef {
        id: RequestId,
        approval_ref: ApprovalRef,
        reply: Reply<bool>,
    },
    Signal {
        signal: Signal,
        reply: Reply<SignalOutcome>,
    },
    Retry {
        id: RequestId,
        actor_roles: Vec<String>,
        reply: Reply<RetryOutcome>,
    },
}

/// Cloneable sender side of the dispatcher.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    async fn call<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> EngineCommand,
    ) -> Result<T, KidsTunesError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| KidsTunesError::Cancelled)?;
        rx.await.map_err(|_| KidsTunesError::Cancelled)?
    }

    pub async fn submit(&self, request: IntakeRequest) -> Result<Request, KidsTunesError> {
        self.call(|reply| EngineCommand::Submit { request, reply })
            .await
    }

    pub async fn attach_approval_ref(
        &self,
        id: RequestId,
        approval_ref: ApprovalRef,
    ) -> Result<bool, KidsTunesError> {
        self.call(|reply| EngineCommand::AttachApprovalRef {
            id,
            approval_ref,
            reply,
        })
        .await
    }

    pub async fn signal(&self, signal: Signal) -> Result<SignalOutcome, KidsTunesError> {
        self.call(|reply| EngineCommand::Signal { signal, reply })
            .await
    }

    pub async fn retry(
        &self,
        id: RequestId,
        actor_roles: Vec<String>,
    ) -> Result<RetryOutcome, KidsTunesError> {
        self.call(|reply| EngineCommand::Retry {
            id,
            actor_roles,
            reply,
        })
        .await
    }
}

/// Consumes [`EngineCommand`]s until cancelled.
pub struct Dispatcher {
    rx: mpsc::Receiver<EngineCommand>,
    gate: Arc<ApprovalGate>,
    intake: Arc<Intake>,
    tracker: TaskTracker,
}

impl Dispatcher {
    pub fn new(
        gate: Arc<ApprovalGate>,
        intake: Arc<Intake>,
        tracker: TaskTracker,
        capacity: usize,
    ) -> (Self, EngineHandle) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                rx,
                gate,
                intake,
                tracker,
            },
            EngineHandle { tx },
        )
    }

    /// Run until `cancel` fires or every handle is dropped.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!("dispatcher running");
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping dispatcher");
                    break;
                }
                command = self.rx.recv() => {
                    match command {
                        Some(command) => self.dispatch(command).await,
                        None => {
                            debug!("all engine handles dropped");
                            break;
                        }
                    }
                }
            }
        }
        self.rx.close();
    }

    async fn dispatch(&self, command: EngineCommand) {
        match command {
            EngineCommand::Submit { request, reply } => {
                let intake = self.intake.clone();
                self.tracker.spawn(async move {
                    let result = intake.submit(request).await;
                    log_failure("submit", &result);
                    let _ = reply.send(result);
                });
            }
            EngineCommand::AttachApprovalRef {
                id,
                approval_ref,
                reply,
            } => {
                let result = self.intake.attach_approval_ref(id, &approval_ref).await;
                log_failure("attach approval ref", &result);
                let _ = reply.send(result);
            }
            EngineCommand::Signal { signal, reply } => {
                let result = self.gate.on_signal(&signal).await;
                log_failure("signal", &result);
                let _ = reply.send(result);
            }
            EngineCommand::Retry {
                id,
                actor_roles,
                reply,
            } => {
                let result = self.gate.on_retry(id, &actor_roles).await;
                log_failure("retry", &result);
                let _ = reply.send(result);
            }
        }
    }
}

fn log_failure<T>(operation: &str, result: &Result<T, KidsTunesError>) {
    match result {
        Err(e) if e.is_fatal() => error!(operation, error = %e, "engine command failed"),
        Err(e) => warn!(operation, error = %e, "engine command rejected"),
        Ok(_) => {}
    }
}
