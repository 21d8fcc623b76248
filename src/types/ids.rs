//! Newtype wrappers for the names that flow through the relay.

use std::fmt;

/// A repository name as it appears in `repository.name` of a webhook payload.
///
/// This is the bare name (`sequel`), not the `owner/name` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoName(pub String);

impl RepoName {
    pub fn new(s: impl Into<String>) -> Self {
        RepoName(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RepoName {
    fn from(s: &str) -> Self {
        RepoName(s.to_string())
    }
}

impl From<String> for RepoName {
    fn from(s: String) -> Self {
        RepoName(s)
    }
}

/// An IRC channel name, including its sigil (e.g. `#sequel`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelName(pub String);

impl ChannelName {
    pub fn new(s: impl Into<String>) -> Self {
        ChannelName(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the name starts with one of the standard IRC channel
    /// prefixes and contains no characters that would break a protocol line.
    pub fn is_valid(&self) -> bool {
        let mut chars = self.0.chars();
        let Some(prefix) = chars.next() else {
            return false;
        };
        matches!(prefix, '#' | '&' | '+' | '!')
            && self.0.len() > 1
            && !self
                .0
                .chars()
                .any(|c| matches!(c, ' ' | ',' | '\x07' | '\r' | '\n' | '\0'))
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ChannelName {
    fn from(s: &str) -> Self {
        ChannelName(s.to_string())
    }
}

impl From<String> for ChannelName {
    fn from(s: String) -> Self {
        ChannelName(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_name_display() {
        assert_eq!(RepoName::new("sequel").to_string(), "sequel");
    }

    #[test]
    fn channel_name_display() {
        assert_eq!(ChannelName::new("#roda").to_string(), "#roda");
    }

    #[test]
    fn channel_name_validity() {
        assert!(ChannelName::new("#sequel").is_valid());
        assert!(ChannelName::new("&local").is_valid());
        assert!(!ChannelName::new("sequel").is_valid());
        assert!(!ChannelName::new("#").is_valid());
        assert!(!ChannelName::new("").is_valid());
        assert!(!ChannelName::new("#a b").is_valid());
        assert!(!ChannelName::new("#a,#b").is_valid());
    }
}
