//! GitHub webhook payload parser.
//!
//! Turns the raw JSON body into a typed [`GitHubEvent`] once the event kind is
//! known. Unknown fields are ignored; any field the relay prints is required,
//! and its absence is a [`ParseError`] for that delivery only.
//!
//! The kind comes from the `X-GitHub-Event` header and is resolved to an
//! [`EventKind`] before this module is reached, so there is no "unknown event"
//! case here.

use serde::Deserialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use thiserror::Error;

use crate::types::RepoName;

use super::events::{
    CommitCommentEvent, CreateEvent, EventKind, GitHubEvent, IssueCommentEvent, IssueEvent,
    PageBuildEvent, PullRequestEvent, PushCommit, PushEvent,
};

/// A payload that cannot be turned into an event of its declared kind.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Body is not JSON, or a required field is missing or mistyped.
    #[error("malformed {kind} payload: {source}")]
    Malformed {
        kind: EventKind,
        #[source]
        source: serde_json::Error,
    },
}

impl ParseError {
    /// Returns the event kind whose payload failed to parse.
    pub fn kind(&self) -> EventKind {
        match self {
            ParseError::Malformed { kind, .. } => *kind,
        }
    }
}

/// Parses a webhook payload into a typed event of the given kind.
///
/// # Examples
///
/// ```
/// use hook_relay::webhooks::{EventKind, GitHubEvent, parse_event};
///
/// let payload = br#"{
///     "ref": "v1.0",
///     "ref_type": "tag",
///     "repository": { "name": "roda" }
/// }"#;
///
/// let event = parse_event(EventKind::Create, payload).unwrap();
/// assert!(matches!(event, GitHubEvent::Create(_)));
/// ```
pub fn parse_event(kind: EventKind, payload: &[u8]) -> Result<GitHubEvent, ParseError> {
    match kind {
        EventKind::Ping => {
            decode::<IgnoredAny>(kind, payload)?;
            Ok(GitHubEvent::Ping)
        }
        EventKind::Create => decode(kind, payload).map(|raw: RawCreatePayload| {
            GitHubEvent::Create(CreateEvent {
                repo: raw.repository.into(),
                ref_type: raw.ref_type,
                ref_name: raw.git_ref,
            })
        }),
        EventKind::Push => decode(kind, payload).map(|raw: RawPushPayload| {
            GitHubEvent::Push(PushEvent {
                repo: raw.repository.into(),
                git_ref: raw.git_ref,
                commits: raw
                    .commits
                    .into_iter()
                    .map(|c| PushCommit {
                        author_name: c.author.name,
                        message: c.message,
                        url: c.url,
                    })
                    .collect(),
                compare: raw.compare,
            })
        }),
        EventKind::Issues => decode(kind, payload).map(|raw: RawIssuesPayload| {
            GitHubEvent::Issues(IssueEvent {
                repo: raw.repository.into(),
                action: raw.action,
                number: raw.issue.number,
                title: raw.issue.title,
                sender: raw.sender.login,
                url: raw.issue.html_url,
            })
        }),
        EventKind::IssueComment => decode(kind, payload).map(|raw: RawIssueCommentPayload| {
            GitHubEvent::IssueComment(IssueCommentEvent {
                repo: raw.repository.into(),
                action: raw.action,
                number: raw.issue.number,
                body: raw.comment.body,
                sender: raw.sender.login,
                url: raw.comment.html_url,
            })
        }),
        EventKind::PullRequest => decode(kind, payload).map(|raw: RawPullRequestPayload| {
            GitHubEvent::PullRequest(PullRequestEvent {
                repo: raw.repository.into(),
                action: raw.action,
                number: raw.pull_request.number,
                title: raw.pull_request.title,
                sender: raw.sender.login,
                url: raw.pull_request.html_url,
            })
        }),
        EventKind::CommitComment => decode(kind, payload).map(|raw: RawCommitCommentPayload| {
            GitHubEvent::CommitComment(CommitCommentEvent {
                repo: raw.repository.into(),
                action: raw.action,
                body: raw.comment.body,
                sender: raw.sender.login,
                url: raw.comment.html_url,
            })
        }),
        EventKind::PageBuild => decode(kind, payload).map(|raw: RawPageBuildPayload| {
            GitHubEvent::PageBuild(PageBuildEvent {
                repo: raw.repository.into(),
                status: raw.build.status,
                error: raw
                    .build
                    .error
                    .and_then(|e| e.message)
                    .filter(|m| !m.is_empty()),
            })
        }),
    }
}

fn decode<T: DeserializeOwned>(kind: EventKind, payload: &[u8]) -> Result<T, ParseError> {
    serde_json::from_slice(payload).map_err(|source| ParseError::Malformed { kind, source })
}

// ============================================================================
// Raw payload structures for deserialization
//
// These mirror the parts of GitHub's webhook JSON that the relay prints.
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawRepository {
    name: String,
}

impl From<RawRepository> for RepoName {
    fn from(raw: RawRepository) -> Self {
        RepoName(raw.name)
    }
}

#[derive(Debug, Deserialize)]
struct RawSender {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RawCreatePayload {
    #[serde(rename = "ref")]
    git_ref: String,
    ref_type: String,
    repository: RawRepository,
}

#[derive(Debug, Deserialize)]
struct RawPushPayload {
    #[serde(rename = "ref")]
    git_ref: String,
    commits: Vec<RawCommit>,
    compare: String,
    repository: RawRepository,
}

#[derive(Debug, Deserialize)]
struct RawCommit {
    author: RawCommitAuthor,
    message: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct RawCommitAuthor {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawIssuesPayload {
    action: String,
    issue: RawIssue,
    sender: RawSender,
    repository: RawRepository,
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    number: u64,
    title: String,
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct RawIssueCommentPayload {
    action: String,
    issue: RawIssueRef,
    comment: RawComment,
    sender: RawSender,
    repository: RawRepository,
}

#[derive(Debug, Deserialize)]
struct RawIssueRef {
    number: u64,
}

#[derive(Debug, Deserialize)]
struct RawComment {
    body: String,
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct RawPullRequestPayload {
    action: String,
    pull_request: RawPullRequest,
    sender: RawSender,
    repository: RawRepository,
}

#[derive(Debug, Deserialize)]
struct RawPullRequest {
    number: u64,
    title: String,
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct RawCommitCommentPayload {
    action: String,
    comment: RawComment,
    sender: RawSender,
    repository: RawRepository,
}

#[derive(Debug, Deserialize)]
struct RawPageBuildPayload {
    build: RawBuild,
    repository: RawRepository,
}

#[derive(Debug, Deserialize)]
struct RawBuild {
    status: String,
    error: Option<RawBuildError>,
}

#[derive(Debug, Deserialize)]
struct RawBuildError {
    message: Option<String>,
}
