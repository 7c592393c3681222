use std::collections::BTreeMap;

use anyhow::Result;

use crate::protocol_engine::ProtocolEngine;

#[derive(Debug, Clone, PartialEq, Eq)]
/// One side effect requested by the router, applied later through a `ProtocolEngine`.
pub enum OutboundAction {
    Raw {
        command: String,
        params: Vec<String>,
    },
    Join {
        channel: String,
    },
    Privmsg {
        target: String,
        text: String,
    },
    Notice {
        target: String,
        text: String,
    },
    TaggedNotice {
        tags: BTreeMap<String, String>,
        target: String,
        text: String,
    },
    Quit,
}

impl OutboundAction {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Raw { .. } => "raw",
            Self::Join { .. } => "join",
            Self::Privmsg { .. } => "privmsg",
            Self::Notice { .. } => "notice",
            Self::TaggedNotice { .. } => "tagged_notice",
            Self::Quit => "quit",
        }
    }

    pub fn apply(&self, engine: &dyn ProtocolEngine) -> Result<()> {
        match self {
            Self::Raw { command, params } => {
                let params = params.iter().map(String::as_str).collect::<Vec<_>>();
                engine.send_raw(command, &params)
            }
            Self::Join { channel } => engine.join(channel),
            Self::Privmsg { target, text } => engine.privmsg(target, text),
            Self::Notice { target, text } => engine.notice(target, text),
            Self::TaggedNotice { tags, target, text } => {
                engine.send_with_tags(tags, "NOTICE", &[target, text])
            }
            Self::Quit => engine.quit(),
        }
    }
}
