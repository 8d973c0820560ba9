// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request lifecycle orchestration for KidsTunes.
//!
//! The engine sits between the chat transport and the collaborators:
//! - [`Intake`] resolves and persists new requests
//! - [`ApprovalGate`] applies moderator decisions and retries exactly once
//! - [`TrackedLauncher`] runs approved requests on download workers
//! - [`Dispatcher`] serializes inbound commands onto one ordered path
//! - [`recovery`] reconciles records interrupted by a restart
//! - [`shutdown`] handles signals and drains in-flight jobs

pub mod dispatcher;
pub mod gate;
pub mod intake;
pub mod launcher;
pub mod recovery;
pub mod shutdown;

pub use dispatcher::{DEFAULT_QUEUE_CAPACITY, Dispatcher, EngineCommand, EngineHandle};
pub use gate::{ApprovalGate, RetryOutcome, SignalOutcome};
pub use intake::Intake;
pub use launcher::{JobLauncher, TrackedLauncher};
pub use recovery::{INTERRUPTED_MESSAGE, RecoveryReport, recover};
pub use shutdown::{DEFAULT_DRAIN_TIMEOUT, drain_jobs, install_signal_handler};
