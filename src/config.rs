//! Process configuration loaded from the environment.
//!
//! Every setting is read once at startup. Afterwards [`clear_env`] removes the
//! variables so that neither the secret nor the IRC password is inherited by
//! child processes or shows up in a dumped environment.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `GITHUB_HOOKS_SECRET` | required |
//! | `GITHUB_HOOKS_ROUTE` | required |
//! | `GITHUB_HOOKS_IRC_PASSWORD` | unset (no SASL) |
//! | `GITHUB_HOOKS_IRC_NICK` | `gitbot` |
//! | `GITHUB_HOOKS_IRC_REALNAME` | `GitHub Hook Relay` |
//! | `GITHUB_HOOKS_IRC_SERVER` | `irc.libera.chat` |
//! | `GITHUB_HOOKS_IRC_PORT` | `6697` |
//! | `GITHUB_HOOKS_IRC_TLS` | `true` |
//! | `GITHUB_HOOKS_CHANNELS` | empty |
//! | `GITHUB_HOOKS_LISTEN` | `0.0.0.0:3000` |
//! | `GITHUB_HOOKS_QUEUE` | `256` |

use std::fmt;
use std::net::SocketAddr;

use thiserror::Error;

use crate::irc::IrcConfig;
use crate::relay::DEFAULT_QUEUE_CAPACITY;
use crate::routing::{ChannelMap, ChannelMapError};

pub const ENV_SECRET: &str = "GITHUB_HOOKS_SECRET";
pub const ENV_ROUTE: &str = "GITHUB_HOOKS_ROUTE";
pub const ENV_IRC_PASSWORD: &str = "GITHUB_HOOKS_IRC_PASSWORD";
pub const ENV_IRC_NICK: &str = "GITHUB_HOOKS_IRC_NICK";
pub const ENV_IRC_REALNAME: &str = "GITHUB_HOOKS_IRC_REALNAME";
pub const ENV_IRC_SERVER: &str = "GITHUB_HOOKS_IRC_SERVER";
pub const ENV_IRC_PORT: &str = "GITHUB_HOOKS_IRC_PORT";
pub const ENV_IRC_TLS: &str = "GITHUB_HOOKS_IRC_TLS";
pub const ENV_CHANNELS: &str = "GITHUB_HOOKS_CHANNELS";
pub const ENV_LISTEN: &str = "GITHUB_HOOKS_LISTEN";
pub const ENV_QUEUE: &str = "GITHUB_HOOKS_QUEUE";

/// All variables this module reads, and therefore clears.
pub const ALL_VARS: [&str; 11] = [
    ENV_SECRET,
    ENV_ROUTE,
    ENV_IRC_PASSWORD,
    ENV_IRC_NICK,
    ENV_IRC_REALNAME,
    ENV_IRC_SERVER,
    ENV_IRC_PORT,
    ENV_IRC_TLS,
    ENV_CHANNELS,
    ENV_LISTEN,
    ENV_QUEUE,
];

const DEFAULT_NICK: &str = "gitbot";
const DEFAULT_REALNAME: &str = "GitHub Hook Relay";
const DEFAULT_SERVER: &str = "irc.libera.chat";
const DEFAULT_PORT: u16 = 6697;
const DEFAULT_LISTEN: &str = "0.0.0.0:3000";

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("{0} must be set")]
    Missing(&'static str),

    /// A variable is set to something unusable.
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },

    /// The channel map could not be parsed.
    #[error("GITHUB_HOOKS_CHANNELS is invalid: {0}")]
    Channels(#[from] ChannelMapError),
}

/// A byte string that must never be printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Vec<u8>);

impl Secret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Secret(bytes.into())
    }

    /// Returns the raw bytes, for use as a key or credential.
    pub fn expose(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret([redacted])")
    }
}

/// Complete process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HMAC key for webhook signatures.
    pub secret: Secret,

    /// Path the webhook endpoint is mounted at.
    pub route: String,

    /// HTTP bind address.
    pub listen: SocketAddr,

    /// Repository → channel routing table.
    pub channels: ChannelMap,

    /// Capacity of the queue between handlers and the IRC connection.
    pub queue_capacity: usize,

    /// IRC connection settings.
    pub irc: IrcConfig,
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let secret = get(ENV_SECRET)
            .map(Secret::new)
            .ok_or(ConfigError::Missing(ENV_SECRET))?;

        let route = get(ENV_ROUTE).ok_or(ConfigError::Missing(ENV_ROUTE))?;
        validate_route(&route)?;

        let listen: SocketAddr = get(ENV_LISTEN)
            .unwrap_or_else(|| DEFAULT_LISTEN.to_string())
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                var: ENV_LISTEN,
                reason: e.to_string(),
            })?;

        let channels: ChannelMap = get(ENV_CHANNELS).unwrap_or_default().parse()?;

        let queue_capacity = match get(ENV_QUEUE) {
            Some(v) => parse_capacity(&v)?,
            None => DEFAULT_QUEUE_CAPACITY,
        };

        let port: u16 = match get(ENV_IRC_PORT) {
            Some(v) => v.parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                var: ENV_IRC_PORT,
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let tls = match get(ENV_IRC_TLS) {
            Some(v) => parse_bool(ENV_IRC_TLS, &v)?,
            None => true,
        };

        let nick = get(ENV_IRC_NICK).unwrap_or_else(|| DEFAULT_NICK.to_string());
        if nick.contains(|c: char| c.is_whitespace() || c == ':' || c == '\0') {
            return Err(ConfigError::Invalid {
                var: ENV_IRC_NICK,
                reason: "nick may not contain whitespace, ':' or NUL".to_string(),
            });
        }

        let irc = IrcConfig {
            server: get(ENV_IRC_SERVER).unwrap_or_else(|| DEFAULT_SERVER.to_string()),
            port,
            tls,
            realname: get(ENV_IRC_REALNAME).unwrap_or_else(|| DEFAULT_REALNAME.to_string()),
            password: get(ENV_IRC_PASSWORD).map(Secret::new),
            channels: channels.channels(),
            nick,
        };

        Ok(Config {
            secret,
            route,
            listen,
            channels,
            queue_capacity,
            irc,
        })
    }
}

/// Removes every variable in [`ALL_VARS`] from the process environment.
///
/// # Safety
///
/// Must be called while the process is still single-threaded (before the
/// async runtime is built), since modifying the environment concurrently with
/// reads from other threads is undefined behavior.
pub unsafe fn clear_env() {
    for var in ALL_VARS {
        // SAFETY: upheld by the caller.
        unsafe { std::env::remove_var(var) };
    }
}

fn validate_route(route: &str) -> Result<(), ConfigError> {
    let reason = if !route.starts_with('/') {
        "must start with '/'"
    } else if route.contains(['{', '}', '*']) {
        "must not contain path parameters or wildcards"
    } else if route.contains(char::is_whitespace) {
        "must not contain whitespace"
    } else {
        return Ok(());
    };

    Err(ConfigError::Invalid {
        var: ENV_ROUTE,
        reason: reason.to_string(),
    })
}

fn parse_capacity(value: &str) -> Result<usize, ConfigError> {
    match value.parse::<usize>() {
        Ok(0) => Err(ConfigError::Invalid {
            var: ENV_QUEUE,
            reason: "must be greater than zero".to_string(),
        }),
        Ok(n) => Ok(n),
        Err(e) => Err(ConfigError::Invalid {
            var: ENV_QUEUE,
            reason: e.to_string(),
        }),
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid {
            var,
            reason: format!("expected a boolean, got {other:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChannelName, RepoName};
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![(ENV_SECRET, "s3cret"), (ENV_ROUTE, "/hooks/github")]
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = Config::from_lookup(lookup(&minimal())).unwrap();

        assert_eq!(config.secret.expose(), b"s3cret");
        assert_eq!(config.route, "/hooks/github");
        assert_eq!(config.listen, "0.0.0.0:3000".parse().unwrap());
        assert!(config.channels.is_empty());
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert_eq!(config.irc.server, "irc.libera.chat");
        assert_eq!(config.irc.port, 6697);
        assert!(config.irc.tls);
        assert_eq!(config.irc.nick, "gitbot");
        assert!(config.irc.password.is_none());
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = Config::from_lookup(lookup(&[(ENV_ROUTE, "/x")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(ENV_SECRET)));
    }

    #[test]
    fn empty_secret_counts_as_missing() {
        let err =
            Config::from_lookup(lookup(&[(ENV_SECRET, ""), (ENV_ROUTE, "/x")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(ENV_SECRET)));
    }

    #[test]
    fn missing_route_is_an_error() {
        let err = Config::from_lookup(lookup(&[(ENV_SECRET, "s")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(ENV_ROUTE)));
    }

    #[test]
    fn route_must_be_absolute_and_literal() {
        for bad in ["hooks", "/hooks/{id}", "/hooks/*rest", "/a b"] {
            let err = Config::from_lookup(lookup(&[(ENV_SECRET, "s"), (ENV_ROUTE, bad)]))
                .unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { var: ENV_ROUTE, .. }),
                "{bad} accepted"
            );
        }
    }

    #[test]
    fn channels_feed_both_router_and_irc() {
        let mut vars = minimal();
        vars.push((ENV_CHANNELS, "sequel=#sequel,sequel_pg=#sequel,roda=#roda"));
        let config = Config::from_lookup(lookup(&vars)).unwrap();

        assert_eq!(
            config.channels.resolve(&RepoName::new("sequel_pg")),
            Some(&ChannelName::new("#sequel"))
        );
        assert_eq!(
            config.irc.channels,
            vec![ChannelName::new("#roda"), ChannelName::new("#sequel")]
        );
    }

    #[test]
    fn bad_channel_map_is_an_error() {
        let mut vars = minimal();
        vars.push((ENV_CHANNELS, "sequel"));
        let err = Config::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Channels(_)));
    }

    #[test]
    fn irc_overrides() {
        let mut vars = minimal();
        vars.extend([
            (ENV_IRC_SERVER, "irc.example.net"),
            (ENV_IRC_PORT, "6667"),
            (ENV_IRC_TLS, "false"),
            (ENV_IRC_NICK, "hookbot"),
            (ENV_IRC_PASSWORD, "hunter2"),
        ]);
        let config = Config::from_lookup(lookup(&vars)).unwrap();

        assert_eq!(config.irc.server, "irc.example.net");
        assert_eq!(config.irc.port, 6667);
        assert!(!config.irc.tls);
        assert_eq!(config.irc.nick, "hookbot");
        assert_eq!(
            config.irc.password.as_ref().map(Secret::expose),
            Some(&b"hunter2"[..])
        );
    }

    #[test]
    fn invalid_port_and_bool_are_errors() {
        let mut vars = minimal();
        vars.push((ENV_IRC_PORT, "seventy"));
        assert!(Config::from_lookup(lookup(&vars)).is_err());

        let mut vars = minimal();
        vars.push((ENV_IRC_TLS, "maybe"));
        assert!(Config::from_lookup(lookup(&vars)).is_err());
    }

    #[test]
    fn zero_queue_capacity_is_rejected() {
        let mut vars = minimal();
        vars.push((ENV_QUEUE, "0"));
        let err = Config::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: ENV_QUEUE, .. }));
    }

    #[test]
    fn nick_with_space_is_rejected() {
        let mut vars = minimal();
        vars.push((ENV_IRC_NICK, "git bot"));
        assert!(Config::from_lookup(lookup(&vars)).is_err());
    }

    #[test]
    fn secrets_are_redacted_in_debug_output() {
        let mut vars = minimal();
        vars.push((ENV_IRC_PASSWORD, "hunter2"));
        let config = Config::from_lookup(lookup(&vars)).unwrap();

        let debug = format!("{config:?}");
        assert!(!debug.contains("s3cret"));
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[redacted]"));
    }
}
