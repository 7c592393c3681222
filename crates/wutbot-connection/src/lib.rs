//! IRC connection engine for wutbot.
//!
//! Opens a TLS session, negotiates IRCv3 capabilities (with optional SASL PLAIN), answers
//! keepalives and hands each message and invite to an `EventHandler` through the
//! `ProtocolEngine` seam. Reconnection is left to the caller.

pub mod connection_config;
pub mod irc_session;
pub mod tls_transport;

pub use connection_config::*;
pub use irc_session::*;
pub use tls_transport::*;
