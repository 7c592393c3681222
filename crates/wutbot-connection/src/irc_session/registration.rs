//! Connection-level protocol handling: CAP negotiation, SASL PLAIN, keepalive and the
//! bookkeeping behind `current_nick` and ISUPPORT.

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use wutbot_irc::{apply_isupport_tokens, InboundEvent, IrcEventKind, IrcMessage, RPL_ISUPPORT};

use crate::connection_config::{ConnectionConfig, SaslCredentials, REQUESTED_CAPABILITIES};

const SASL_CAPABILITY: &str = "sasl";
const SASL_CHUNK_BYTES: usize = 400;
const CTCP_DELIMITER: char = '\u{1}';

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Server-facing state readable by event handlers.
pub struct SessionState {
    pub current_nick: String,
    pub isupport: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
/// What the session loop must do after one inbound message.
pub(crate) struct Reaction {
    pub replies: Vec<IrcMessage>,
    pub event: Option<InboundEvent>,
    pub closed: bool,
}

pub(crate) struct Registration {
    nick: String,
    username: String,
    realname: String,
    sasl: Option<SaslCredentials>,
    version: String,
    offered_caps: Vec<String>,
    sasl_in_progress: bool,
    welcomed: bool,
    connected: bool,
}

impl Registration {
    pub fn new(config: &ConnectionConfig) -> Self {
        Self {
            nick: config.nick.clone(),
            username: config.username.clone(),
            realname: config.realname.clone(),
            sasl: config.sasl.clone(),
            version: config.version.clone(),
            offered_caps: Vec::new(),
            sasl_in_progress: false,
            welcomed: false,
            connected: false,
        }
    }

    pub fn opening_messages(&self) -> Vec<IrcMessage> {
        vec![
            IrcMessage::new("CAP", ["LS", "302"]),
            IrcMessage::new("NICK", [self.nick.as_str()]),
            IrcMessage::new(
                "USER",
                [
                    self.username.as_str(),
                    "0",
                    "*",
                    self.realname.as_str(),
                ],
            ),
        ]
    }

    pub fn react(&mut self, message: IrcMessage, state: &mut SessionState) -> Result<Reaction> {
        let mut reaction = Reaction::default();
        let command = message.command.clone();
        match command.as_str() {
            "PING" => {
                reaction
                    .replies
                    .push(IrcMessage::new("PONG", message.params.clone()));
            }
            "CAP" => self.on_cap(&message, &mut reaction)?,
            "AUTHENTICATE" => {
                if let (true, Some("+"), Some(credentials)) =
                    (self.sasl_in_progress, message.param(0), self.sasl.as_ref())
                {
                    reaction.replies.extend(sasl_plain_messages(credentials));
                }
            }
            "903" => {
                tracing::info!("SASL authentication succeeded");
                self.sasl_in_progress = false;
                reaction.replies.push(cap_end());
            }
            "902" | "904" | "905" | "906" => {
                bail!(
                    "SASL authentication failed ({command}): {}",
                    message.params.last().map(String::as_str).unwrap_or_default()
                );
            }
            "001" => {
                self.welcomed = true;
                if let Some(nick) = message.param(0) {
                    state.current_nick = nick.to_string();
                }
            }
            RPL_ISUPPORT => apply_isupport_tokens(&mut state.isupport, &message),
            "376" | "422" => {
                if !self.connected {
                    self.connected = true;
                    tracing::info!(nick = %state.current_nick, "registration complete");
                    reaction.event = Some(InboundEvent::connected(message));
                }
            }
            "433" | "437" if !self.welcomed => {
                self.nick.push('_');
                tracing::info!(nick = %self.nick, "nick unavailable; retrying");
                state.current_nick = self.nick.clone();
                reaction
                    .replies
                    .push(IrcMessage::new("NICK", [self.nick.as_str()]));
            }
            "NICK" => {
                if message.source_nick() == Some(state.current_nick.as_str()) {
                    if let Some(nick) = message.param(0) {
                        state.current_nick = nick.to_string();
                    }
                }
            }
            "ERROR" => {
                tracing::warn!(
                    reason = message.params.last().map(String::as_str).unwrap_or_default(),
                    "server closed the session"
                );
                reaction.closed = true;
            }
            "PRIVMSG" if message.param(1).is_some_and(is_ctcp) => {
                reaction.replies.extend(self.ctcp_reply(&message));
            }
            _ => {
                let event = InboundEvent::from_message(message);
                if event.kind() != IrcEventKind::Other {
                    reaction.event = Some(event);
                }
            }
        }
        Ok(reaction)
    }

    fn on_cap(&mut self, message: &IrcMessage, reaction: &mut Reaction) -> Result<()> {
        let subcommand = message.param(1).unwrap_or_default().to_ascii_uppercase();
        let listed = if message.params.len() >= 3 {
            message.params.last().map(String::as_str).unwrap_or_default()
        } else {
            ""
        };

        match subcommand.as_str() {
            "LS" => {
                self.offered_caps.extend(
                    listed
                        .split_whitespace()
                        .map(|cap| cap.split('=').next().unwrap_or(cap).to_string()),
                );
                let continued = message.params.len() >= 4 && message.param(2) == Some("*");
                if continued {
                    return Ok(());
                }

                let mut wanted = REQUESTED_CAPABILITIES
                    .iter()
                    .copied()
                    .filter(|cap| self.offers(cap))
                    .collect::<Vec<_>>();
                if self.sasl.is_some() {
                    if !self.offers(SASL_CAPABILITY) {
                        bail!("SASL credentials are configured but the server does not offer SASL");
                    }
                    wanted.push(SASL_CAPABILITY);
                }
                if wanted.is_empty() {
                    reaction.replies.push(cap_end());
                } else {
                    reaction
                        .replies
                        .push(IrcMessage::new("CAP", ["REQ".to_string(), wanted.join(" ")]));
                }
            }
            "ACK" => {
                let sasl_acked = listed
                    .split_whitespace()
                    .any(|cap| cap == SASL_CAPABILITY);
                if self.sasl.is_some() && sasl_acked {
                    self.sasl_in_progress = true;
                    reaction
                        .replies
                        .push(IrcMessage::new("AUTHENTICATE", ["PLAIN"]));
                } else {
                    reaction.replies.push(cap_end());
                }
            }
            "NAK" => {
                if self.sasl.is_some() {
                    bail!("server refused capability request: {listed}");
                }
                reaction.replies.push(cap_end());
            }
            _ => {}
        }
        Ok(())
    }

    fn offers(&self, cap: &str) -> bool {
        self.offered_caps.iter().any(|offered| offered == cap)
    }

    fn ctcp_reply(&self, message: &IrcMessage) -> Option<IrcMessage> {
        let body = message.param(1)?.trim_matches(CTCP_DELIMITER);
        let verb = body.split_whitespace().next()?;
        if !verb.eq_ignore_ascii_case("VERSION") {
            return None;
        }
        let sender = message.source_nick()?;
        Some(IrcMessage::new(
            "NOTICE",
            [
                sender.to_string(),
                format!("{CTCP_DELIMITER}VERSION {}{CTCP_DELIMITER}", self.version),
            ],
        ))
    }
}

fn cap_end() -> IrcMessage {
    IrcMessage::new("CAP", ["END"])
}

fn is_ctcp(body: &str) -> bool {
    body.starts_with(CTCP_DELIMITER)
}

/// SASL PLAIN response split into 400-byte AUTHENTICATE chunks.
pub(crate) fn sasl_plain_messages(credentials: &SaslCredentials) -> Vec<IrcMessage> {
    let payload = STANDARD.encode(format!(
        "{login}\0{login}\0{password}",
        login = credentials.login,
        password = credentials.password
    ));
    let mut messages = payload
        .as_bytes()
        .chunks(SASL_CHUNK_BYTES)
        .map(|chunk| IrcMessage::new("AUTHENTICATE", [String::from_utf8_lossy(chunk).into_owned()]))
        .collect::<Vec<_>>();
    if payload.len() % SASL_CHUNK_BYTES == 0 {
        messages.push(IrcMessage::new("AUTHENTICATE", ["+"]));
    }
    messages
}
