//! Normalized inbound events handed from the connection engine to the router.

use crate::irc_message::IrcMessage;

/// Tag carrying the server-assigned message id used for reply threading.
pub const MSGID_TAG_NAME: &str = "msgid";
/// Client tag associating an outgoing message with the message it answers.
pub const REPLY_TAG_NAME: &str = "+draft/reply";
/// Reserved tag carrying the services account the server verified for the sender.
pub const ACCOUNT_TAG_NAME: &str = "account";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Enumerates supported `IrcEventKind` values.
pub enum IrcEventKind {
    Connect,
    Invite,
    Message,
    Other,
}

impl IrcEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Invite => "invite",
            Self::Message => "message",
            Self::Other => "other",
        }
    }

    fn for_command(command: &str) -> Self {
        if command.eq_ignore_ascii_case("PRIVMSG") {
            Self::Message
        } else if command.eq_ignore_ascii_case("INVITE") {
            Self::Invite
        } else {
            Self::Other
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One inbound protocol event. Consumed by a single handler call and then dropped.
pub struct InboundEvent {
    kind: IrcEventKind,
    message: IrcMessage,
}

impl InboundEvent {
    /// Builds the event kind from the message command.
    pub fn from_message(message: IrcMessage) -> Self {
        Self {
            kind: IrcEventKind::for_command(&message.command),
            message,
        }
    }

    /// Wraps the message that completed registration as the connection-established event.
    pub fn connected(message: IrcMessage) -> Self {
        Self {
            kind: IrcEventKind::Connect,
            message,
        }
    }

    pub fn kind(&self) -> IrcEventKind {
        self.kind
    }

    pub fn message(&self) -> &IrcMessage {
        &self.message
    }

    pub fn params(&self) -> &[String] {
        &self.message.params
    }

    pub fn tag(&self, name: &str) -> Option<&str> {
        self.message.tag(name)
    }

    pub fn source(&self) -> Option<&str> {
        self.message.source.as_deref()
    }

    pub fn source_nick(&self) -> Option<&str> {
        self.message.source_nick()
    }

    /// Services account asserted by the server for the sender, if any.
    pub fn account_tag(&self) -> Option<&str> {
        self.tag(ACCOUNT_TAG_NAME)
    }

    /// Message id for reply threading. An empty id counts as absent.
    pub fn message_id(&self) -> Option<&str> {
        self.tag(MSGID_TAG_NAME).filter(|msgid| !msgid.is_empty())
    }

    /// First param: channel or recipient for messages, invitee for invites.
    pub fn target(&self) -> &str {
        self.message.param(0).unwrap_or_default()
    }

    /// Second param: message text for PRIVMSG.
    pub fn body(&self) -> &str {
        self.message.param(1).unwrap_or_default()
    }

    /// Channel named by an INVITE.
    pub fn invite_channel(&self) -> Option<&str> {
        match self.kind {
            IrcEventKind::Invite => self.message.param(1).filter(|channel| !channel.is_empty()),
            _ => None,
        }
    }
}

/// Returns true when `target` starts with one of the advertised channel prefixes.
pub fn is_channel_target(target: &str, chantypes: &str) -> bool {
    target
        .chars()
        .next()
        .is_some_and(|first| chantypes.contains(first))
}
