//! Hook Relay - posts GitHub webhook activity to IRC channels.
//!
//! This library provides signature verification, event parsing and line
//! rendering, repository to channel routing, and the IRC transport that
//! delivers the lines.

pub mod config;
pub mod irc;
pub mod relay;
pub mod routing;
pub mod server;
pub mod types;
pub mod webhooks;

#[cfg(test)]
pub mod test_utils;
