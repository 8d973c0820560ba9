// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound Discord calls: approval surfaces and requester reactions.

use std::sync::Arc;

use async_trait::async_trait;
use kidstunes_core::types::{Decision, OriginRef, SurfaceStage};
use kidstunes_core::{
    AdapterType, ApprovalRef, HealthStatus, KidsTunesError, Notifier, PluginAdapter, Request,
};
use serenity::builder::{CreateMessage, EditMessage};
use serenity::http::Http;
use serenity::model::channel::ReactionType;
use serenity::model::id::{ChannelId, MessageId};
use tracing::debug;

use crate::handler::{APPROVE_EMOJI, REJECT_EMOJI};
use crate::surface::render;

/// Parse a stored snowflake. Zero is not a valid Discord id.
pub fn parse_snowflake(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok().filter(|id| *id != 0)
}

fn transport(message: impl Into<String>, source: serenity::Error) -> KidsTunesError {
    KidsTunesError::Transport {
        message: message.into(),
        source: Some(Box::new(source)),
    }
}

fn unicode(emoji: &str) -> ReactionType {
    ReactionType::Unicode(emoji.to_string())
}

/// Posts and edits approval surfaces in the approval channel and reacts on
/// requester messages.
pub struct DiscordNotifier {
    http: Arc<Http>,
    approval_channel: ChannelId,
}

impl DiscordNotifier {
    /// `approval_channel_id` must be non-zero.
    pub fn new(http: Arc<Http>, approval_channel_id: u64) -> Result<Self, KidsTunesError> {
        if approval_channel_id == 0 {
            return Err(KidsTunesError::Config(
                "discord.approval_channel_id must be set".into(),
            ));
        }
        Ok(Self {
            http,
            approval_channel: ChannelId::new(approval_channel_id),
        })
    }

    /// Post the pending surface for `request`, seeded with both decision
    /// reactions. Returns the reference to tie to the record.
    pub async fn post_surface(&self, request: &Request) -> Result<ApprovalRef, KidsTunesError> {
        let view = render(request, &SurfaceStage::Pending);
        let message = self
            .approval_channel
            .send_message(&*self.http, CreateMessage::new().embed(view.to_embed()))
            .await
            .map_err(|e| transport("failed to post approval surface", e))?;

        for emoji in [APPROVE_EMOJI, REJECT_EMOJI] {
            self.approval_channel
                .create_reaction(&*self.http, message.id, unicode(emoji))
                .await
                .map_err(|e| transport("failed to seed approval reaction", e))?;
        }
        debug!(request_id = %request.id, message_id = %message.id, "approval surface posted");
        Ok(ApprovalRef(message.id.to_string()))
    }
}

#[async_trait]
impl PluginAdapter for DiscordNotifier {
    fn name(&self) -> &str {
        "discord"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, KidsTunesError> {
        match self.http.get_current_user().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!("Discord unreachable: {e}"))),
        }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn notify_requester(
        &self,
        origin: &OriginRef,
        decision: Decision,
    ) -> Result<(), KidsTunesError> {
        let (Some(channel), Some(message)) = (
            parse_snowflake(&origin.channel_id),
            parse_snowflake(&origin.message_id),
        ) else {
            return Err(KidsTunesError::NotFound {
                what: format!("origin message {}/{}", origin.channel_id, origin.message_id),
            });
        };
        let emoji = match decision {
            Decision::Approved => APPROVE_EMOJI,
            Decision::Rejected => REJECT_EMOJI,
        };
        ChannelId::new(channel)
            .create_reaction(&*self.http, MessageId::new(message), unicode(emoji))
            .await
            .map_err(|e| transport("failed to react on request message", e))
    }

    async fn update_surface(
        &self,
        request: &Request,
        stage: &SurfaceStage,
    ) -> Result<(), KidsTunesError> {
        let Some(message) = request
            .approval_ref
            .as_ref()
            .and_then(|r| parse_snowflake(&r.0))
        else {
            return Err(KidsTunesError::NotFound {
                what: format!("approval surface of request {}", request.id),
            });
        };
        let view = render(request, stage);
        self.approval_channel
            .edit_message(
                &*self.http,
                MessageId::new(message),
                EditMessage::new().embed(view.to_embed()),
            )
            .await
            .map(|_| ())
            .map_err(|e| transport("failed to edit approval surface", e))
    }
}
