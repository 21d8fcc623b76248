//! Core domain types for the hook relay.
//!
//! Repository and channel names are distinct newtypes so that a lookup keyed
//! by one can never be handed the other by accident.

pub mod ids;
pub mod message;

pub use ids::{ChannelName, RepoName};
pub use message::OutboundMessage;
