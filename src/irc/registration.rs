//! Connection registration and protocol housekeeping.
//!
//! [`Registration`] is a pure state machine: it is fed parsed server messages
//! and returns the lines to send back. It performs no I/O, so the whole
//! handshake (SASL included) is testable without a socket.
//!
//! ```text
//!   greeting ──► [CAP REQ :sasl] NICK USER
//!   CAP ACK sasl ──► AUTHENTICATE PLAIN
//!   AUTHENTICATE + ──► AUTHENTICATE <base64>
//!   903 / 904 / 905 / 906 / CAP NAK ──► CAP END
//!   433 (nick taken) ──► NICK <nick>_
//!   001 ──► JOIN each channel; registered
//! ```

use tracing::{debug, info, warn};

use crate::config::Secret;
use crate::types::ChannelName;

use super::client::IrcConfig;
use super::error::IrcError;
use super::message::{self, Message};

/// Registration state for one connection.
#[derive(Debug, Clone)]
pub struct Registration {
    nick: String,
    username: String,
    realname: String,
    password: Option<Secret>,
    channels: Vec<ChannelName>,
    registered: bool,
}

impl Registration {
    pub fn new(config: &IrcConfig) -> Self {
        Registration {
            nick: config.nick.clone(),
            username: config.nick.clone(),
            realname: config.realname.clone(),
            password: config.password.clone(),
            channels: config.channels.clone(),
            registered: false,
        }
    }

    /// Returns true once the server has sent `001`.
    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// The nick currently in use (or being attempted).
    pub fn nick(&self) -> &str {
        &self.nick
    }

    /// Lines to send immediately after connecting.
    pub fn greeting(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(3);
        if self.password.is_some() {
            lines.push(message::cap_req("sasl"));
        }
        lines.push(message::nick(&self.nick));
        lines.push(message::user(&self.username, &self.realname));
        lines
    }

    /// Processes one server message, returning the replies to send.
    pub fn handle(&mut self, msg: &Message) -> Result<Vec<String>, IrcError> {
        match msg.command.as_str() {
            "PING" => Ok(vec![message::pong(msg.trailing().unwrap_or_default())]),

            "CAP" => Ok(self.handle_cap(msg)),

            "AUTHENTICATE" if msg.param(0) == Some("+") => Ok(match &self.password {
                Some(password) => message::sasl_plain(&self.username, password.expose()),
                None => vec![message::authenticate("*")],
            }),

            // RPL_SASLSUCCESS
            "903" => {
                info!(nick = %self.nick, "SASL authentication succeeded");
                Ok(vec![message::cap_end()])
            }

            // ERR_SASLFAIL, ERR_SASLTOOLONG, ERR_SASLABORTED
            "904" | "905" | "906" => {
                warn!(
                    nick = %self.nick,
                    reply = %msg.command,
                    "SASL authentication failed; continuing unauthenticated"
                );
                Ok(vec![message::cap_end()])
            }

            // RPL_WELCOME
            "001" => {
                if let Some(confirmed) = msg.param(0) {
                    self.nick = confirmed.to_string();
                }
                self.registered = true;
                info!(nick = %self.nick, channels = self.channels.len(), "Registered with IRC server");
                Ok(self.channels.iter().map(message::join).collect())
            }

            // ERR_NICKNAMEINUSE
            "433" if !self.registered => {
                self.nick.push('_');
                debug!(nick = %self.nick, "Nick in use, retrying");
                Ok(vec![message::nick(&self.nick)])
            }

            // ERR_ERRONEUSNICKNAME
            "432" => Err(IrcError::ServerError(format!(
                "erroneous nickname {}",
                self.nick
            ))),

            "KICK" if msg.param(1) == Some(self.nick.as_str()) => {
                let Some(channel) = msg.param(0) else {
                    return Ok(Vec::new());
                };
                warn!(channel = %channel, reason = ?msg.param(2), "Kicked from channel, rejoining");
                Ok(vec![message::join(&ChannelName::new(channel))])
            }

            "NICK" if msg.source_nick() == Some(self.nick.as_str()) => {
                if let Some(new_nick) = msg.param(0) {
                    self.nick = new_nick.to_string();
                }
                Ok(Vec::new())
            }

            "ERROR" => Err(IrcError::ServerError(
                msg.trailing().unwrap_or("ERROR").to_string(),
            )),

            _ => Ok(Vec::new()),
        }
    }

    fn handle_cap(&mut self, msg: &Message) -> Vec<String> {
        let subcommand = msg.param(1).unwrap_or_default();
        let capabilities = msg.trailing().unwrap_or_default();
        let sasl_listed = capabilities.split(' ').any(|cap| cap == "sasl");

        match subcommand {
            "ACK" if sasl_listed && self.password.is_some() => {
                vec![message::authenticate("PLAIN")]
            }
            "NAK" => {
                warn!(capabilities = %capabilities, "Server refused capability request");
                vec![message::cap_end()]
            }
            _ => Vec::new(),
        }
    }
}
