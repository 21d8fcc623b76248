//! IRC message parsing and command construction.
//!
//! Parsing covers what the client reacts to: an optional prefix, the command
//! (word or three-digit numeric) and its parameters. IRCv3 message tags are
//! skipped. Builders produce single protocol lines without the trailing CRLF,
//! which the codec adds.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::types::ChannelName;

/// Maximum line length allowed by RFC 1459, excluding the CRLF.
pub const MAX_LINE_BYTES: usize = 510;

/// Room left for the `:nick!user@host ` prefix the server prepends when
/// relaying our messages to other clients.
const PREFIX_RESERVE: usize = 100;

/// Longest chunk of a base64 `AUTHENTICATE` payload.
const SASL_CHUNK: usize = 400;

/// A parsed inbound IRC line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Source of the message (`server.name` or `nick!user@host`).
    pub prefix: Option<String>,

    /// Command word or numeric reply, e.g. `PING` or `001`.
    pub command: String,

    /// Parameters, with the trailing parameter (if any) last.
    pub params: Vec<String>,
}

impl Message {
    /// Parses a protocol line. Returns `None` for lines with no command.
    pub fn parse(line: &str) -> Option<Message> {
        let mut rest = line;

        if rest.starts_with('@') {
            rest = rest.split_once(' ')?.1;
        }
        rest = rest.trim_start_matches(' ');

        let prefix = match rest.strip_prefix(':') {
            Some(after) => {
                let (prefix, after) = after.split_once(' ')?;
                rest = after;
                Some(prefix.to_string())
            }
            None => None,
        };
        rest = rest.trim_start_matches(' ');

        let (command, mut rest) = rest.split_once(' ').unwrap_or((rest, ""));
        if command.is_empty() {
            return None;
        }

        let mut params = Vec::new();
        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }
            if let Some(trailing) = rest.strip_prefix(':') {
                params.push(trailing.to_string());
                break;
            }
            match rest.split_once(' ') {
                Some((param, after)) => {
                    params.push(param.to_string());
                    rest = after;
                }
                None => {
                    params.push(rest.to_string());
                    break;
                }
            }
        }

        Some(Message {
            prefix,
            command: command.to_ascii_uppercase(),
            params,
        })
    }

    /// Returns the parameter at `index`, if present.
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    /// Returns the last parameter, which carries the free-text part.
    pub fn trailing(&self) -> Option<&str> {
        self.params.last().map(String::as_str)
    }

    /// Returns the nick portion of a `nick!user@host` prefix.
    pub fn source_nick(&self) -> Option<&str> {
        let prefix = self.prefix.as_deref()?;
        Some(prefix.split_once('!').map_or(prefix, |(nick, _)| nick))
    }
}

pub fn nick(nick: &str) -> String {
    format!("NICK {nick}")
}

pub fn user(username: &str, realname: &str) -> String {
    format!("USER {username} 0 * :{}", sanitize(realname))
}

pub fn join(channel: &ChannelName) -> String {
    format!("JOIN {channel}")
}

pub fn pong(token: &str) -> String {
    format!("PONG :{token}")
}

pub fn ping(token: &str) -> String {
    format!("PING :{token}")
}

pub fn quit(reason: &str) -> String {
    format!("QUIT :{}", sanitize(reason))
}

pub fn cap_req(capability: &str) -> String {
    format!("CAP REQ :{capability}")
}

pub fn cap_end() -> String {
    "CAP END".to_string()
}

pub fn authenticate(arg: &str) -> String {
    format!("AUTHENTICATE {arg}")
}

/// Builds the `AUTHENTICATE` lines carrying a SASL PLAIN response.
///
/// The payload is `authzid NUL authcid NUL password`, base64 encoded and split
/// into 400-byte chunks. A payload that is an exact multiple of 400 bytes is
/// followed by `AUTHENTICATE +` to mark its end.
pub fn sasl_plain(username: &str, password: &[u8]) -> Vec<String> {
    let mut raw = Vec::with_capacity(username.len() * 2 + password.len() + 2);
    raw.extend_from_slice(username.as_bytes());
    raw.push(0);
    raw.extend_from_slice(username.as_bytes());
    raw.push(0);
    raw.extend_from_slice(password);

    let encoded = STANDARD.encode(&raw);
    let mut lines: Vec<String> = encoded
        .as_bytes()
        .chunks(SASL_CHUNK)
        // base64 output is ASCII, so every chunk is valid UTF-8
        .map(|chunk| authenticate(&String::from_utf8_lossy(chunk)))
        .collect();

    if encoded.len() % SASL_CHUNK == 0 {
        lines.push(authenticate("+"));
    }
    lines
}

/// Builds a `PRIVMSG` carrying `text`, made safe for the wire.
///
/// Line breaks become spaces, NULs are removed, and the text is clipped on a
/// character boundary so the relayed line stays within the protocol limit.
pub fn privmsg(channel: &ChannelName, text: &str) -> String {
    let head = format!("PRIVMSG {channel} :");
    let budget = MAX_LINE_BYTES
        .saturating_sub(PREFIX_RESERVE)
        .saturating_sub(head.len());
    let text = sanitize(text);
    format!("{head}{}", clip(&text, budget))
}

/// Replaces CR and LF with spaces and drops NUL.
fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| *c != '\0')
        .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
        .collect()
}

/// Returns the longest prefix of `text` that fits in `max_bytes`.
fn clip(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
