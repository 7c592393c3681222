//! IRCv3 wire codec and inbound event model for wutbot.
//!
//! ```rust
//! use wutbot_irc::{parse_irc_line, InboundEvent, IrcEventKind};
//!
//! let message = parse_irc_line("@account=op;msgid=42 :op!u@h PRIVMSG #chat :wutbot: quit")
//!     .expect("valid line");
//! let event = InboundEvent::from_message(message);
//! assert_eq!(event.kind(), IrcEventKind::Message);
//! assert_eq!(event.account_tag(), Some("op"));
//! assert_eq!(event.message_id(), Some("42"));
//! ```

pub mod irc_event;
pub mod irc_message;
pub mod isupport;

pub use irc_event::*;
pub use irc_message::*;
pub use isupport::*;
