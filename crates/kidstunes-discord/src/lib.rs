// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Discord transport for KidsTunes.
//!
//! Turns `!request` / `!retry` commands and ✅/❌ reactions into engine
//! commands, and implements [`Notifier`](kidstunes_core::Notifier) by
//! editing moderation embeds and reacting on requester messages.

pub mod command;
pub mod handler;
pub mod notifier;
pub mod surface;

use std::sync::Arc;

use kidstunes_core::KidsTunesError;
use serenity::Client;
use serenity::http::Http;
use serenity::model::gateway::GatewayIntents;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub use command::{Command, parse_command};
pub use handler::{APPROVE_EMOJI, Handler, REJECT_EMOJI, Scope};
pub use notifier::DiscordNotifier;
pub use surface::{SurfaceView, render};

/// Gateway intents the bot needs: guild messages with content, and reactions.
pub fn intents() -> GatewayIntents {
    GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_MESSAGE_REACTIONS
}

/// A REST client for outbound calls made outside gateway events.
pub fn http_client(token: &str) -> Arc<Http> {
    Arc::new(Http::new(token))
}

/// Connect to the gateway and deliver events to `handler` until `cancel` fires.
pub async fn run_gateway(
    token: &str,
    handler: Handler,
    cancel: CancellationToken,
) -> Result<(), KidsTunesError> {
    let mut client = Client::builder(token, intents())
        .event_handler(handler)
        .await
        .map_err(|e| KidsTunesError::Transport {
            message: "failed to build Discord client".into(),
            source: Some(Box::new(e)),
        })?;

    let shards = client.shard_manager.clone();
    tokio::select! {
        result = client.start() => {
            result.map_err(|e| KidsTunesError::Transport {
                message: "Discord gateway stopped".into(),
                source: Some(Box::new(e)),
            })?;
            warn!("Discord gateway returned without error");
        }
        _ = cancel.cancelled() => {
            info!("disconnecting from Discord");
            shards.shutdown_all().await;
        }
    }
    Ok(())
}
