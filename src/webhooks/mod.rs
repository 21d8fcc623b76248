//! Webhook handling for GitHub events.
//!
//! This module provides:
//! - Signature verification for webhook payloads (HMAC-SHA1)
//! - The recognized event kinds and their typed payloads
//! - Payload parsing and per-event chat line synthesis
//! - Free-text condensing for single-line display

pub mod events;
pub mod format;
pub mod handlers;
pub mod parser;
pub mod signature;

pub use events::{EventKind, GitHubEvent, UnsupportedEventKind};
pub use format::format_summary;
pub use handlers::{HandlerResult, dispatch, handle_event};
pub use parser::{ParseError, parse_event};
pub use signature::{
    compute_signature, format_signature_header, parse_signature_header, verify_signature,
};
