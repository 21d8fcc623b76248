//! The unit of work handed from request handlers to the relay.

use super::ChannelName;

/// A single line of text bound for one channel.
///
/// Constructed by the router, enqueued on the relay, sent, and dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub channel: ChannelName,
    pub text: String,
}

impl OutboundMessage {
    pub fn new(channel: ChannelName, text: impl Into<String>) -> Self {
        OutboundMessage {
            channel,
            text: text.into(),
        }
    }
}
