//! Repository → channel routing.
//!
//! The [`ChannelMap`] is built once from configuration and shared read-only
//! by every request. Several repositories may share a channel; a repository
//! with no entry is simply not announced.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use thiserror::Error;

use crate::types::{ChannelName, OutboundMessage, RepoName};

/// A malformed `repo=#channel` list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelMapError {
    /// An entry without `=`.
    #[error("channel map entry {0:?} is not of the form repo=#channel")]
    MissingSeparator(String),

    /// An entry with an empty repository name.
    #[error("channel map entry {0:?} has an empty repository name")]
    EmptyRepo(String),

    /// An entry whose channel is not a valid IRC channel name.
    #[error("channel map entry for {repo:?} has invalid channel {channel:?}")]
    InvalidChannel { repo: String, channel: String },

    /// The same repository listed twice.
    #[error("repository {0:?} is mapped more than once")]
    DuplicateRepo(String),
}

/// Read-only table mapping repository names to channel names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelMap {
    routes: BTreeMap<RepoName, ChannelName>,
}

impl ChannelMap {
    /// Builds a map from `(repo, channel)` pairs.
    ///
    /// Later pairs for the same repository replace earlier ones; use
    /// [`FromStr`] when duplicates should be rejected.
    pub fn new<I, R, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (R, C)>,
        R: Into<RepoName>,
        C: Into<ChannelName>,
    {
        ChannelMap {
            routes: pairs
                .into_iter()
                .map(|(r, c)| (r.into(), c.into()))
                .collect(),
        }
    }

    /// Returns the channel for a repository, if one is configured.
    pub fn resolve(&self, repo: &RepoName) -> Option<&ChannelName> {
        self.routes.get(repo)
    }

    /// Returns every distinct channel, sorted. These are the channels the
    /// relay joins.
    pub fn channels(&self) -> Vec<ChannelName> {
        self.routes
            .values()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Pairs each line with the repository's channel.
    ///
    /// Returns an empty list when the repository is unknown or absent, so the
    /// caller never reaches the transport for an unmapped repository.
    pub fn route(&self, repo: Option<&RepoName>, lines: Vec<String>) -> Vec<OutboundMessage> {
        let Some(channel) = repo.and_then(|r| self.resolve(r)) else {
            return Vec::new();
        };
        lines
            .into_iter()
            .map(|text| OutboundMessage::new(channel.clone(), text))
            .collect()
    }
}

/// Parses `repo=#channel` entries separated by commas or whitespace.
///
/// ```
/// use hook_relay::routing::ChannelMap;
/// use hook_relay::types::{ChannelName, RepoName};
///
/// let map: ChannelMap = "sequel=#sequel, sequel_pg=#sequel".parse().unwrap();
/// assert_eq!(map.resolve(&RepoName::new("sequel_pg")), Some(&ChannelName::new("#sequel")));
/// ```
impl FromStr for ChannelMap {
    type Err = ChannelMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut routes = BTreeMap::new();

        for entry in s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|e| !e.is_empty())
        {
            let (repo, channel) = entry
                .split_once('=')
                .ok_or_else(|| ChannelMapError::MissingSeparator(entry.to_string()))?;

            if repo.is_empty() {
                return Err(ChannelMapError::EmptyRepo(entry.to_string()));
            }

            let channel = ChannelName::new(channel);
            if !channel.is_valid() {
                return Err(ChannelMapError::InvalidChannel {
                    repo: repo.to_string(),
                    channel: channel.0,
                });
            }

            if routes.insert(RepoName::new(repo), channel).is_some() {
                return Err(ChannelMapError::DuplicateRepo(repo.to_string()));
            }
        }

        Ok(ChannelMap { routes })
    }
}
