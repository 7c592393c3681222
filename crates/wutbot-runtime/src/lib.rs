//! Event dispatch and authorization core for wutbot.
//!
//! Routes connect, message and invite events, authorizes the owner through the server's
//! `account` tag, interprets owner commands and bounds concurrent dispatch with a
//! fixed-capacity gate. Side effects go through the [`ProtocolEngine`] seam.

pub mod bot_identity;
pub mod concurrency_gate;
pub mod event_router;
pub mod outbound;
pub mod owner_command;
pub mod protocol_engine;

pub use bot_identity::*;
pub use concurrency_gate::*;
pub use event_router::*;
pub use outbound::*;
pub use owner_command::*;
pub use protocol_engine::*;
