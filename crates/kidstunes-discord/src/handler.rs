// SPDX-FileCopyrightText: 2026 KidsTunes Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway event routing: commands and reactions into engine commands.
//!
//! All filtering (channel scoping, bot authors, emoji vocabulary) happens
//! here; authorization is left to the engine, which receives the actor's
//! role ids.

use std::sync::Arc;

use async_trait::async_trait;
use kidstunes_config::model::DiscordConfig;
use kidstunes_core::types::{IntakeRequest, OriginRef, Signal, SignalKind};
use kidstunes_core::{ApprovalRef, KidsTunesError, RequestId};
use kidstunes_engine::{EngineHandle, RetryOutcome, SignalOutcome};
use serenity::client::{Context, EventHandler};
use serenity::model::channel::{Message, Reaction, ReactionType};
use serenity::model::gateway::Ready;
use serenity::model::id::RoleId;
use tracing::{debug, error, info, warn};

use crate::command::{Command, parse_command};
use crate::notifier::DiscordNotifier;

pub const APPROVE_EMOJI: &str = "✅";
pub const REJECT_EMOJI: &str = "❌";

/// Reply to a retry that names no failed request.
pub const RETRY_INVALID_REPLY: &str = "Invalid request ID or request is not failed.";

/// Map a reaction emoji to a decision.
pub fn signal_kind(emoji: &ReactionType) -> Option<SignalKind> {
    match emoji {
        ReactionType::Unicode(s) if s == APPROVE_EMOJI => Some(SignalKind::Approve),
        ReactionType::Unicode(s) if s == REJECT_EMOJI => Some(SignalKind::Reject),
        _ => None,
    }
}

pub fn role_strings(roles: &[RoleId]) -> Vec<String> {
    roles.iter().map(|r| r.get().to_string()).collect()
}

/// Channel and role ids the handler scopes by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub request_channel_id: u64,
    pub approval_channel_id: u64,
    pub moderator_role_id: u64,
    pub command_prefix: String,
}

impl From<&DiscordConfig> for Scope {
    fn from(config: &DiscordConfig) -> Self {
        Self {
            request_channel_id: config.request_channel_id,
            approval_channel_id: config.approval_channel_id,
            moderator_role_id: config.moderator_role_id,
            command_prefix: config.command_prefix.clone(),
        }
    }
}

/// Serenity event handler forwarding into the engine.
pub struct Handler {
    engine: EngineHandle,
    notifier: Arc<DiscordNotifier>,
    scope: Scope,
}

impl Handler {
    pub fn new(engine: EngineHandle, notifier: Arc<DiscordNotifier>, scope: Scope) -> Self {
        Self {
            engine,
            notifier,
            scope,
        }
    }

    async fn handle_request(&self, msg: &Message, query: String) {
        if msg.channel_id.get() != self.scope.request_channel_id {
            debug!(channel_id = %msg.channel_id, "request outside the request channel ignored");
            return;
        }

        let requester_name = msg
            .member
            .as_ref()
            .and_then(|m| m.nick.clone())
            .unwrap_or_else(|| msg.author.display_name().to_string());
        let intake = IntakeRequest {
            requester_id: msg.author.id.to_string(),
            requester_name,
            query,
            origin: Some(OriginRef {
                channel_id: msg.channel_id.to_string(),
                message_id: msg.id.to_string(),
            }),
        };

        let request = match self.engine.submit(intake).await {
            Ok(request) => request,
            Err(KidsTunesError::InvalidRequest(reason)) => {
                debug!(%reason, "empty request ignored");
                return;
            }
            Err(e) => {
                error!(error = %e, "failed to create request");
                return;
            }
        };

        let approval_ref = match self.notifier.post_surface(&request).await {
            Ok(approval_ref) => approval_ref,
            Err(e) => {
                error!(request_id = %request.id, error = %e, "failed to post approval surface");
                return;
            }
        };
        match self
            .engine
            .attach_approval_ref(request.id, approval_ref)
            .await
        {
            Ok(true) => info!(request_id = %request.id, "request awaiting approval"),
            Ok(false) => warn!(request_id = %request.id, "request already had an approval surface"),
            Err(e) => error!(request_id = %request.id, error = %e, "failed to attach approval surface"),
        }
    }

    async fn handle_retry(&self, ctx: &Context, msg: &Message, id: Option<i64>) {
        let roles = msg
            .member
            .as_ref()
            .map(|m| role_strings(&m.roles))
            .unwrap_or_default();
        let is_moderator = roles
            .iter()
            .any(|r| *r == self.scope.moderator_role_id.to_string());

        let reply = match id {
            None if is_moderator => Some(RETRY_INVALID_REPLY.to_string()),
            None => None,
            Some(id) => match self.engine.retry(RequestId(id), roles).await {
                Ok(RetryOutcome::Relaunched(id)) => Some(format!("Retrying request #{id}.")),
                Ok(RetryOutcome::NotFound | RetryOutcome::NotRetryable(_)) => {
                    Some(RETRY_INVALID_REPLY.to_string())
                }
                Ok(RetryOutcome::Unauthorized) => None,
                Err(e) => {
                    error!(request_id = id, error = %e, "retry failed");
                    None
                }
            },
        };

        if let Some(reply) = reply
            && let Err(e) = msg.channel_id.say(&ctx.http, reply).await
        {
            warn!(error = %e, "failed to reply to retry command");
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(user = %ready.user.name, guilds = ready.guilds.len(), "connected to Discord");
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        let Some(command) = parse_command(&msg.content, &self.scope.command_prefix) else {
            return;
        };
        match command {
            Command::Request(query) => self.handle_request(&msg, query).await,
            Command::Retry(id) => self.handle_retry(&ctx, &msg, id).await,
        }
    }

    async fn reaction_add(&self, _ctx: Context, reaction: Reaction) {
        if reaction.channel_id.get() != self.scope.approval_channel_id {
            return;
        }
        let Some(kind) = signal_kind(&reaction.emoji) else {
            return;
        };
        let Some(member) = reaction.member.as_ref() else {
            debug!(message_id = %reaction.message_id, "reaction without member data ignored");
            return;
        };
        if member.user.bot {
            return;
        }

        let signal = Signal {
            kind,
            actor_roles: role_strings(&member.roles),
            approval_ref: ApprovalRef(reaction.message_id.to_string()),
        };
        match self.engine.signal(signal).await {
            Ok(SignalOutcome::Approved(id) | SignalOutcome::Rejected(id)) => {
                info!(request_id = %id, %kind, user = %member.user.name, "decision applied");
            }
            Ok(outcome) => debug!(?outcome, "signal had no effect"),
            Err(e) => error!(error = %e, "failed to apply signal"),
        }
    }
}
