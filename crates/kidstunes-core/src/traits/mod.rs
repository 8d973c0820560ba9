// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the external collaborators of the engine.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod media;
pub mod notifier;
pub mod resolver;
pub mod store;

pub use adapter::PluginAdapter;
pub use media::{MediaFetcher, MediaSearch, TagTool};
pub use notifier::Notifier;
pub use resolver::ResolverBackend;
pub use store::RequestStore;
