//! Per-event authorization and dispatch.
//!
//! `EventRouter::handle` is pure: it maps one event and a server snapshot to the outbound
//! actions it warrants. `EventRouter::dispatch` applies them through a `ProtocolEngine` while
//! holding a gate permit, so at most `capacity` dispatches are ever in flight.

use std::collections::BTreeMap;

use wutbot_irc::{is_channel_target, InboundEvent, IrcEventKind, REPLY_TAG_NAME};

use crate::bot_identity::BotIdentity;
use crate::concurrency_gate::ConcurrencyGate;
use crate::outbound::OutboundAction;
use crate::owner_command::parse_owner_command;
use crate::protocol_engine::{EventHandler, ProtocolEngine, ServerView};

/// Reply to non-owners who address the bot in a channel.
pub const MENTION_REPLY_TEXT: &str = "don't @ me, mortal";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Enumerates supported `DispatchOutcome` values.
pub enum DispatchOutcome {
    /// The event warranted no action.
    Idle,
    /// Actions were applied; `failed` of them were rejected by the engine.
    Dispatched { actions: usize, failed: usize },
    /// The gate was full and the actions were skipped.
    Throttled { actions: usize },
}

/// Splits a comma-delimited channel list, trimming entries and dropping empty ones.
pub fn parse_channel_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|channel| !channel.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone)]
/// Stateless router over a read-only identity and the shared concurrency gate.
pub struct EventRouter {
    identity: BotIdentity,
    channels: Vec<String>,
    gate: ConcurrencyGate,
}

impl EventRouter {
    pub fn new(identity: BotIdentity, channels: Vec<String>, gate: ConcurrencyGate) -> Self {
        Self {
            identity,
            channels,
            gate,
        }
    }

    pub fn identity(&self) -> &BotIdentity {
        &self.identity
    }

    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    pub fn handle(&self, event: &InboundEvent, server: &ServerView) -> Vec<OutboundAction> {
        match event.kind() {
            IrcEventKind::Connect => self.on_connect(server),
            IrcEventKind::Message => self.on_message(event, server),
            IrcEventKind::Invite => self.on_invite(event),
            IrcEventKind::Other => Vec::new(),
        }
    }

    /// Computes and applies the actions for `event`. Never blocks on the gate.
    pub fn dispatch(&self, event: &InboundEvent, engine: &dyn ProtocolEngine) -> DispatchOutcome {
        let actions = self.handle(event, &ServerView::from_engine(engine));
        self.apply_actions(event.kind(), &actions, engine)
    }

    /// Sets the bot mode and joins the configured channels once registration completes.
    pub fn dispatch_connect(&self, engine: &dyn ProtocolEngine) -> DispatchOutcome {
        let actions = self.on_connect(&ServerView::from_engine(engine));
        self.apply_actions(IrcEventKind::Connect, &actions, engine)
    }

    fn apply_actions(
        &self,
        event_kind: IrcEventKind,
        actions: &[OutboundAction],
        engine: &dyn ProtocolEngine,
    ) -> DispatchOutcome {
        if actions.is_empty() {
            return DispatchOutcome::Idle;
        }

        let Some(_permit) = self.gate.try_acquire() else {
            tracing::debug!(
                event_kind = event_kind.as_str(),
                actions = actions.len(),
                capacity = self.gate.capacity(),
                "concurrency gate full; skipping dispatch"
            );
            return DispatchOutcome::Throttled {
                actions: actions.len(),
            };
        };

        let mut failed = 0;
        for action in actions {
            if let Err(error) = action.apply(engine) {
                failed += 1;
                tracing::warn!(
                    event_kind = event_kind.as_str(),
                    action = action.kind(),
                    error = %error,
                    "outbound action failed"
                );
            }
        }
        DispatchOutcome::Dispatched {
            actions: actions.len(),
            failed,
        }
    }

    fn on_connect(&self, server: &ServerView) -> Vec<OutboundAction> {
        let mut actions = Vec::with_capacity(self.channels.len() + 1);
        if let Some(mode) = server.bot_mode() {
            actions.push(OutboundAction::Raw {
                command: "MODE".to_string(),
                params: vec![server.current_nick.clone(), format!("+{mode}")],
            });
        }
        actions.extend(self.channels.iter().map(|channel| OutboundAction::Join {
            channel: channel.clone(),
        }));
        actions
    }

    fn on_message(&self, event: &InboundEvent, server: &ServerView) -> Vec<OutboundAction> {
        let target = event.target();
        let body = event.body();
        let from_owner = self.identity.is_owner(event.account_tag());

        if !is_channel_target(target, server.chantypes()) && !from_owner {
            tracing::debug!(
                source = event.source().unwrap_or_default(),
                "ignoring direct message from non-owner"
            );
            return Vec::new();
        }

        if from_owner {
            return match parse_owner_command(body, self.identity.nick()) {
                Some(command) => {
                    tracing::info!(
                        verb = command.verb(),
                        reply_target = target,
                        "executing owner command"
                    );
                    command.actions(target)
                }
                None => Vec::new(),
            };
        }

        if !body.starts_with(self.identity.nick()) {
            return Vec::new();
        }
        vec![mention_reply(target, event.message_id())]
    }

    fn on_invite(&self, event: &InboundEvent) -> Vec<OutboundAction> {
        if !self.identity.is_owner(event.account_tag()) {
            tracing::debug!(
                source = event.source().unwrap_or_default(),
                "ignoring invite from non-owner"
            );
            return Vec::new();
        }
        event
            .invite_channel()
            .map(|channel| {
                vec![OutboundAction::Join {
                    channel: channel.to_string(),
                }]
            })
            .unwrap_or_default()
    }
}

impl EventHandler for EventRouter {
    fn on_connect(&self, engine: &dyn ProtocolEngine) {
        let outcome = self.dispatch_connect(engine);
        tracing::debug!(?outcome, "connect handled");
    }

    fn on_event(&self, event: &InboundEvent, engine: &dyn ProtocolEngine) {
        let outcome = self.dispatch(event, engine);
        tracing::trace!(event_kind = event.kind().as_str(), ?outcome, "event handled");
    }
}

fn mention_reply(target: &str, message_id: Option<&str>) -> OutboundAction {
    match message_id {
        Some(msgid) => OutboundAction::TaggedNotice {
            tags: BTreeMap::from([(REPLY_TAG_NAME.to_string(), msgid.to_string())]),
            target: target.to_string(),
            text: MENTION_REPLY_TEXT.to_string(),
        },
        None => OutboundAction::Notice {
            target: target.to_string(),
            text: MENTION_REPLY_TEXT.to_string(),
        },
    }
}
