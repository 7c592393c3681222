//! Owner command parsing: `<nick>[:] <verb> [args...]`.

use crate::outbound::OutboundAction;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Enumerates supported `OwnerCommand` values.
pub enum OwnerCommand {
    /// Taunt `subject`. Without a subject the command is accepted and does nothing.
    Abuse { subject: Option<String> },
    Quit,
}

impl OwnerCommand {
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Abuse { .. } => "abuse",
            Self::Quit => "quit",
        }
    }

    /// Actions this command performs when issued in `target`.
    pub fn actions(&self, target: &str) -> Vec<OutboundAction> {
        match self {
            Self::Abuse {
                subject: Some(subject),
            } => vec![OutboundAction::Privmsg {
                target: target.to_string(),
                text: render_taunt(subject),
            }],
            Self::Abuse { subject: None } => Vec::new(),
            Self::Quit => vec![OutboundAction::Quit],
        }
    }
}

pub fn render_taunt(subject: &str) -> String {
    format!("{subject} isn't a real programmer")
}

/// Parses an owner command addressed to `bot_nick`.
///
/// The body must start with `bot_nick` exactly (case-sensitive). One `:` directly after the
/// nick is skipped. The verb is matched case-insensitively; arguments are kept verbatim.
/// Unknown verbs and empty commands return `None`.
pub fn parse_owner_command(body: &str, bot_nick: &str) -> Option<OwnerCommand> {
    let remainder = body.strip_prefix(bot_nick)?;
    let remainder = remainder.strip_prefix(':').unwrap_or(remainder);
    let mut tokens = remainder.split_whitespace();
    let verb = tokens.next()?.to_lowercase();
    match verb.as_str() {
        "abuse" => Some(OwnerCommand::Abuse {
            subject: tokens.next().map(str::to_string),
        }),
        "quit" => Some(OwnerCommand::Quit),
        _ => None,
    }
}
