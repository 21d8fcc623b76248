//! IRC transport.
//!
//! A single long-lived connection, owned by one task, that drains the relay
//! queue into `PRIVMSG`s. The task connects, registers (optionally with SASL
//! PLAIN), joins every routed channel, and reconnects with backoff whenever
//! the connection drops.
//!
//! - [`codec`] frames CRLF-terminated protocol lines
//! - [`message`] parses inbound lines and builds outbound commands
//! - [`registration`] is the pure connection-registration state machine
//! - [`backoff`] computes reconnect delays
//! - [`client`] owns the socket and the event loop

pub mod backoff;
pub mod client;
pub mod codec;
pub mod error;
pub mod message;
pub mod registration;

pub use backoff::ReconnectPolicy;
pub use client::{IrcClient, IrcConfig};
pub use error::IrcError;
