//! Owner authorization for wutbot.
//!
//! Privileged behavior is gated on the IRCv3 `account` tag the server attaches to each
//! message, never on anything the sender controls.

pub mod owner_identity;

pub use owner_identity::*;
