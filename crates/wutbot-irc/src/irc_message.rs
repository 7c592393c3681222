//! IRCv3 message parsing and serialization.
//!
//! Lines have the shape `[@tags ][:source ]<command>[ params][ :trailing]`. Tag values use
//! the IRCv3 escaping rules; outgoing fields are rejected if they would break framing.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use thiserror::Error;

/// Upper bound on a received line including tags, as allowed by IRCv3 message-tags.
pub const MAX_IRC_LINE_BYTES: usize = 8_191 + 512;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Enumerates supported `IrcParseError` values.
pub enum IrcParseError {
    #[error("irc line is empty")]
    Empty,
    #[error("irc line exceeds {MAX_IRC_LINE_BYTES} bytes")]
    TooLong,
    #[error("irc line has no command")]
    MissingCommand,
    #[error("irc line contains a bare tag section")]
    EmptyTags,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Enumerates supported `IrcSerializeError` values.
pub enum IrcSerializeError {
    #[error("irc command '{0}' is invalid")]
    InvalidCommand(String),
    #[error("irc parameter {index} contains a forbidden character")]
    ForbiddenCharacter { index: usize },
    #[error("irc parameter {index} must be non-empty and free of spaces and leading ':'")]
    InvalidMiddleParam { index: usize },
    #[error("irc tag name '{0}' is invalid")]
    InvalidTagName(String),
    #[error("irc tag '{0}' has a value containing NUL")]
    ForbiddenTagValue(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// One protocol message with its tags, optional source, command and params.
pub struct IrcMessage {
    pub tags: BTreeMap<String, String>,
    pub source: Option<String>,
    pub command: String,
    pub params: Vec<String>,
}

impl IrcMessage {
    pub fn new<I, S>(command: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: BTreeMap::new(),
            source: None,
            command: command.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_tags(mut self, tags: BTreeMap<String, String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Tag lookup: `None` when absent, `Some("")` for a valueless tag.
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(String::as_str)
    }

    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    /// Nick portion of a `nick!user@host` source.
    pub fn source_nick(&self) -> Option<&str> {
        let source = self.source.as_deref()?;
        let nick = source.split(['!', '@']).next().unwrap_or(source);
        (!nick.is_empty()).then_some(nick)
    }

    pub fn is_command(&self, command: &str) -> bool {
        self.command.eq_ignore_ascii_case(command)
    }

    /// Renders the message as a wire line without the trailing CRLF.
    pub fn to_line(&self) -> Result<String, IrcSerializeError> {
        if self.command.is_empty() || !self.command.chars().all(|ch| ch.is_ascii_alphanumeric())
        {
            return Err(IrcSerializeError::InvalidCommand(self.command.clone()));
        }

        let mut line = String::new();
        if !self.tags.is_empty() {
            line.push('@');
            for (index, (name, value)) in self.tags.iter().enumerate() {
                if !is_valid_tag_name(name) {
                    return Err(IrcSerializeError::InvalidTagName(name.clone()));
                }
                if value.contains('\0') {
                    return Err(IrcSerializeError::ForbiddenTagValue(name.clone()));
                }
                if index > 0 {
                    line.push(';');
                }
                line.push_str(name);
                if !value.is_empty() {
                    line.push('=');
                    line.push_str(&escape_tag_value(value));
                }
            }
            line.push(' ');
        }
        if let Some(source) = &self.source {
            let _ = write!(line, ":{source} ");
        }
        line.push_str(&self.command);

        let last = self.params.len().saturating_sub(1);
        for (index, param) in self.params.iter().enumerate() {
            if param.contains(['\r', '\n', '\0']) {
                return Err(IrcSerializeError::ForbiddenCharacter { index });
            }
            line.push(' ');
            if index == last {
                if param.is_empty() || param.contains(' ') || param.starts_with(':') {
                    line.push(':');
                }
            } else if param.is_empty() || param.contains(' ') || param.starts_with(':') {
                return Err(IrcSerializeError::InvalidMiddleParam { index });
            }
            line.push_str(param);
        }
        Ok(line)
    }
}

/// Parses one received line. A trailing CR and/or LF is ignored.
pub fn parse_irc_line(raw: &str) -> Result<IrcMessage, IrcParseError> {
    if raw.len() > MAX_IRC_LINE_BYTES {
        return Err(IrcParseError::TooLong);
    }
    let mut rest = raw.trim_end_matches(['\r', '\n']);
    if rest.trim().is_empty() {
        return Err(IrcParseError::Empty);
    }

    let mut message = IrcMessage::default();

    if let Some(tagged) = rest.strip_prefix('@') {
        let (tags, remainder) = tagged.split_once(' ').unwrap_or((tagged, ""));
        if tags.is_empty() {
            return Err(IrcParseError::EmptyTags);
        }
        for raw_tag in tags.split(';').filter(|raw_tag| !raw_tag.is_empty()) {
            let (name, value) = raw_tag.split_once('=').unwrap_or((raw_tag, ""));
            message
                .tags
                .insert(name.to_string(), unescape_tag_value(value));
        }
        rest = remainder;
    }

    rest = rest.trim_start_matches(' ');
    if let Some(prefixed) = rest.strip_prefix(':') {
        let (source, remainder) = prefixed.split_once(' ').unwrap_or((prefixed, ""));
        if !source.is_empty() {
            message.source = Some(source.to_string());
        }
        rest = remainder;
    }

    rest = rest.trim_start_matches(' ');
    let (command, mut rest) = rest.split_once(' ').unwrap_or((rest, ""));
    if command.is_empty() {
        return Err(IrcParseError::MissingCommand);
    }
    message.command = command.to_ascii_uppercase();

    loop {
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            break;
        }
        if let Some(trailing) = rest.strip_prefix(':') {
            message.params.push(trailing.to_string());
            break;
        }
        let (param, remainder) = rest.split_once(' ').unwrap_or((rest, ""));
        message.params.push(param.to_string());
        rest = remainder;
    }

    Ok(message)
}

pub fn escape_tag_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            ';' => escaped.push_str("\\:"),
            ' ' => escaped.push_str("\\s"),
            '\\' => escaped.push_str("\\\\"),
            '\r' => escaped.push_str("\\r"),
            '\n' => escaped.push_str("\\n"),
            other => escaped.push(other),
        }
    }
    escaped
}

pub fn unescape_tag_value(raw: &str) -> String {
    let mut value = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            value.push(ch);
            continue;
        }
        // A lone trailing backslash is dropped.
        match chars.next() {
            Some(':') => value.push(';'),
            Some('s') => value.push(' '),
            Some('\\') => value.push('\\'),
            Some('r') => value.push('\r'),
            Some('n') => value.push('\n'),
            Some(other) => value.push(other),
            None => {}
        }
    }
    value
}

fn is_valid_tag_name(name: &str) -> bool {
    let name = name.strip_prefix('+').unwrap_or(name);
    !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '/' | '.'))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{
        escape_tag_value, parse_irc_line, unescape_tag_value, IrcMessage, IrcParseError,
        IrcSerializeError,
    };

    #[test]
    fn unit_parse_irc_line_extracts_tags_source_and_params() {
        let message = parse_irc_line(
            "@account=slingamn;msgid=abc123;time=2022-02-13T00:00:00.000Z :slingamn!s@host PRIVMSG #chat :wutbot: abuse someone\r\n",
        )
        .expect("parse privmsg");
        assert_eq!(message.tag("account"), Some("slingamn"));
        assert_eq!(message.tag("msgid"), Some("abc123"));
        assert_eq!(message.source.as_deref(), Some("slingamn!s@host"));
        assert_eq!(message.source_nick(), Some("slingamn"));
        assert_eq!(message.command, "PRIVMSG");
        assert_eq!(message.params, vec!["#chat", "wutbot: abuse someone"]);
    }

    #[test]
    fn unit_parse_irc_line_handles_untagged_and_sourceless_lines() {
        let message = parse_irc_line("PING :irc.example.net").expect("parse ping");
        assert!(message.tags.is_empty());
        assert!(message.source.is_none());
        assert_eq!(message.params, vec!["irc.example.net"]);

        let message = parse_irc_line(":irc.example.net 005 wutbot BOT=B CHANTYPES=# :are supported")
            .expect("parse isupport");
        assert_eq!(message.command, "005");
        assert_eq!(
            message.params,
            vec!["wutbot", "BOT=B", "CHANTYPES=#", "are supported"]
        );
    }

    #[test]
    fn unit_parse_irc_line_distinguishes_valueless_and_absent_tags() {
        let message = parse_irc_line("@draft/bot;+typing=active :a!b@c TAGMSG #x").expect("parse");
        assert_eq!(message.tag("draft/bot"), Some(""));
        assert_eq!(message.tag("+typing"), Some("active"));
        assert_eq!(message.tag("account"), None);
    }

    #[test]
    fn unit_parse_irc_line_rejects_malformed_lines() {
        assert_eq!(parse_irc_line(""), Err(IrcParseError::Empty));
        assert_eq!(parse_irc_line("\r\n"), Err(IrcParseError::Empty));
        assert_eq!(parse_irc_line(":source.only"), Err(IrcParseError::MissingCommand));
        assert_eq!(parse_irc_line("@ PING"), Err(IrcParseError::EmptyTags));
        let oversized = format!("PRIVMSG #x :{}", "a".repeat(super::MAX_IRC_LINE_BYTES));
        assert_eq!(parse_irc_line(&oversized), Err(IrcParseError::TooLong));
    }

    #[test]
    fn unit_tag_value_escaping_follows_ircv3_rules() {
        assert_eq!(escape_tag_value("a b;c\\d"), "a\\sb\\:c\\\\d");
        assert_eq!(unescape_tag_value("a\\sb\\:c\\\\d"), "a b;c\\d");
        assert_eq!(unescape_tag_value("trailing\\"), "trailing");
        assert_eq!(unescape_tag_value("\\x"), "x");
    }

    #[test]
    fn functional_to_line_prefixes_trailing_param_only_when_needed() {
        let line = IrcMessage::new("JOIN", ["#chat"]).to_line().expect("join");
        assert_eq!(line, "JOIN #chat");

        let line = IrcMessage::new("PRIVMSG", ["#chat", "hello world"])
            .to_line()
            .expect("privmsg");
        assert_eq!(line, "PRIVMSG #chat :hello world");

        let line = IrcMessage::new("MODE", ["wutbot", "+B"]).to_line().expect("mode");
        assert_eq!(line, "MODE wutbot +B");

        let line = IrcMessage::new("PRIVMSG", ["#chat", ":)"]).to_line().expect("smile");
        assert_eq!(line, "PRIVMSG #chat ::)");
    }

    #[test]
    fn functional_to_line_renders_escaped_tags() {
        let tags = BTreeMap::from([("+draft/reply".to_string(), "id with space".to_string())]);
        let line = IrcMessage::new("NOTICE", ["#chat", "don't @ me, mortal"])
            .with_tags(tags)
            .to_line()
            .expect("tagged notice");
        assert_eq!(
            line,
            "@+draft/reply=id\\swith\\sspace NOTICE #chat :don't @ me, mortal"
        );
    }

    #[test]
    fn regression_to_line_rejects_line_injection() {
        let error = IrcMessage::new("PRIVMSG", ["#chat", "hi\r\nQUIT :bye"])
            .to_line()
            .expect_err("crlf must be rejected");
        assert_eq!(error, IrcSerializeError::ForbiddenCharacter { index: 1 });

        let error = IrcMessage::new("JOIN", ["#a b", "key"])
            .to_line()
            .expect_err("space in middle param");
        assert_eq!(error, IrcSerializeError::InvalidMiddleParam { index: 0 });

        let error = IrcMessage::new("PRIV MSG", ["#chat"])
            .to_line()
            .expect_err("space in command");
        assert!(matches!(error, IrcSerializeError::InvalidCommand(_)));
    }

    #[test]
    fn regression_to_line_rejects_nul_in_echoed_tag_value() {
        let tags = BTreeMap::from([("+draft/reply".to_string(), "m1\0QUIT".to_string())]);
        let error = IrcMessage::new("NOTICE", ["#chat", "hi"])
            .with_tags(tags)
            .to_line()
            .expect_err("nul in tag value must be rejected");
        assert_eq!(
            error,
            IrcSerializeError::ForbiddenTagValue("+draft/reply".to_string())
        );
    }

    #[test]
    fn regression_parse_irc_line_keeps_empty_trailing_param() {
        let message = parse_irc_line(":nick!u@h PRIVMSG #chat :").expect("parse");
        assert_eq!(message.params, vec!["#chat", ""]);
    }
}
