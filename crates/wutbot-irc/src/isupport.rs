//! RPL_ISUPPORT (005) token handling.

use std::collections::BTreeMap;

use crate::irc_message::IrcMessage;

pub const RPL_ISUPPORT: &str = "005";
/// Feature whose value is the user mode marking a client as a bot.
pub const ISUPPORT_BOT: &str = "BOT";
pub const ISUPPORT_CHANTYPES: &str = "CHANTYPES";
pub const DEFAULT_CHANTYPES: &str = "#";

/// Folds the tokens of one 005 reply into `features`.
///
/// The first param is our nick and the last is the human-readable trailer; everything between
/// is `NAME`, `NAME=value` or `-NAME` (withdraws a previously advertised feature).
pub fn apply_isupport_tokens(features: &mut BTreeMap<String, String>, message: &IrcMessage) {
    if !message.is_command(RPL_ISUPPORT) || message.params.len() < 3 {
        return;
    }
    let tokens = &message.params[1..message.params.len() - 1];
    for token in tokens {
        if let Some(withdrawn) = token.strip_prefix('-') {
            features.remove(withdrawn);
            continue;
        }
        let (name, value) = token.split_once('=').unwrap_or((token.as_str(), ""));
        if name.is_empty() {
            continue;
        }
        features.insert(name.to_string(), unescape_isupport_value(value));
    }
}

/// Channel prefixes advertised by the server, or `#` when unadvertised.
pub fn chantypes(features: &BTreeMap<String, String>) -> &str {
    features
        .get(ISUPPORT_CHANTYPES)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_CHANTYPES)
}

// ISUPPORT values escape bytes as `\xHH`.
fn unescape_isupport_value(raw: &str) -> String {
    let mut bytes = Vec::with_capacity(raw.len());
    let raw_bytes = raw.as_bytes();
    let mut index = 0;
    while index < raw_bytes.len() {
        if raw_bytes[index] == b'\\' && raw_bytes.get(index + 1) == Some(&b'x') {
            let decoded = raw
                .get(index + 2..index + 4)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok());
            if let Some(byte) = decoded {
                bytes.push(byte);
                index += 4;
                continue;
            }
        }
        bytes.push(raw_bytes[index]);
        index += 1;
    }
    String::from_utf8_lossy(&bytes).into_owned()
}
