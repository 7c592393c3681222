//! Capability seam between the router and the connection engine.

use std::collections::BTreeMap;

use anyhow::Result;
use wutbot_irc::{chantypes, InboundEvent, ISUPPORT_BOT};

/// Outbound primitives and introspection the router needs from a connected engine.
///
/// Sends are fire-and-forget: `Ok` means the line was accepted for delivery, not that the
/// server received it.
pub trait ProtocolEngine: Send + Sync {
    fn send_raw(&self, command: &str, params: &[&str]) -> Result<()>;

    fn send_with_tags(
        &self,
        tags: &BTreeMap<String, String>,
        command: &str,
        params: &[&str],
    ) -> Result<()>;

    fn notice(&self, target: &str, text: &str) -> Result<()> {
        self.send_raw("NOTICE", &[target, text])
    }

    fn privmsg(&self, target: &str, text: &str) -> Result<()> {
        self.send_raw("PRIVMSG", &[target, text])
    }

    fn join(&self, channel: &str) -> Result<()> {
        self.send_raw("JOIN", &[channel])
    }

    /// Requests disconnection with the engine's configured farewell. Safe to call repeatedly.
    fn quit(&self) -> Result<()>;

    fn current_nick(&self) -> String;

    fn isupport(&self) -> BTreeMap<String, String>;
}

/// Receives the connection lifecycle and every delivered message or invite.
pub trait EventHandler: Send + Sync {
    /// Called once per established connection, after registration completes.
    fn on_connect(&self, engine: &dyn ProtocolEngine);

    fn on_event(&self, event: &InboundEvent, engine: &dyn ProtocolEngine);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Point-in-time view of engine introspection used by pure routing.
pub struct ServerView {
    pub current_nick: String,
    pub isupport: BTreeMap<String, String>,
}

impl ServerView {
    pub fn from_engine(engine: &dyn ProtocolEngine) -> Self {
        Self {
            current_nick: engine.current_nick(),
            isupport: engine.isupport(),
        }
    }

    /// Bot user mode letter, when the server advertises one.
    pub fn bot_mode(&self) -> Option<&str> {
        self.isupport
            .get(ISUPPORT_BOT)
            .map(String::as_str)
            .filter(|mode| !mode.is_empty())
    }

    pub fn chantypes(&self) -> &str {
        chantypes(&self.isupport)
    }
}
