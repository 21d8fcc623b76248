//! GitHub webhook event types.
//!
//! [`EventKind`] is the closed table of `X-GitHub-Event` values the relay
//! understands; anything else is rejected before the body is parsed.
//! [`GitHubEvent`] holds the fields each kind needs to produce its chat lines.
//!
//! | Event | Lines produced |
//! |-------|----------------|
//! | `ping` | none |
//! | `create` | one |
//! | `push` | one per commit (up to six) plus an overflow summary |
//! | `issues` | one |
//! | `issue_comment` | one |
//! | `pull_request` | one |
//! | `commit_comment` | one |
//! | `page_build` | one |

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::types::RepoName;

/// An `X-GitHub-Event` value that is not in the recognized set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported event kind: {0}")]
pub struct UnsupportedEventKind(pub String);

/// A recognized webhook event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Ping,
    Create,
    Push,
    Issues,
    IssueComment,
    PullRequest,
    CommitComment,
    PageBuild,
}

impl EventKind {
    /// Every recognized kind, in header-name order.
    pub const ALL: [EventKind; 8] = [
        EventKind::Ping,
        EventKind::Create,
        EventKind::Push,
        EventKind::Issues,
        EventKind::IssueComment,
        EventKind::PullRequest,
        EventKind::CommitComment,
        EventKind::PageBuild,
    ];

    /// Returns the header value GitHub uses for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Ping => "ping",
            EventKind::Create => "create",
            EventKind::Push => "push",
            EventKind::Issues => "issues",
            EventKind::IssueComment => "issue_comment",
            EventKind::PullRequest => "pull_request",
            EventKind::CommitComment => "commit_comment",
            EventKind::PageBuild => "page_build",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = UnsupportedEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnsupportedEventKind(s.to_string()))
    }
}

/// A parsed webhook event carrying only the fields the relay prints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitHubEvent {
    /// Liveness check sent when a hook is first configured.
    Ping,

    /// A branch or tag was created.
    Create(CreateEvent),

    /// Commits were pushed to a ref.
    Push(PushEvent),

    /// An issue was opened, closed, edited, etc.
    Issues(IssueEvent),

    /// A comment on an issue or pull request conversation.
    IssueComment(IssueCommentEvent),

    /// A pull request was opened, closed, synchronized, etc.
    PullRequest(PullRequestEvent),

    /// A comment on a commit.
    CommitComment(CommitCommentEvent),

    /// A GitHub Pages build finished.
    PageBuild(PageBuildEvent),
}

impl GitHubEvent {
    /// Returns the kind this event was parsed as.
    pub fn kind(&self) -> EventKind {
        match self {
            GitHubEvent::Ping => EventKind::Ping,
            GitHubEvent::Create(_) => EventKind::Create,
            GitHubEvent::Push(_) => EventKind::Push,
            GitHubEvent::Issues(_) => EventKind::Issues,
            GitHubEvent::IssueComment(_) => EventKind::IssueComment,
            GitHubEvent::PullRequest(_) => EventKind::PullRequest,
            GitHubEvent::CommitComment(_) => EventKind::CommitComment,
            GitHubEvent::PageBuild(_) => EventKind::PageBuild,
        }
    }

    /// Returns the repository the event belongs to.
    ///
    /// `None` for `ping`, which organization hooks send without a repository.
    pub fn repo(&self) -> Option<&RepoName> {
        match self {
            GitHubEvent::Ping => None,
            GitHubEvent::Create(e) => Some(&e.repo),
            GitHubEvent::Push(e) => Some(&e.repo),
            GitHubEvent::Issues(e) => Some(&e.repo),
            GitHubEvent::IssueComment(e) => Some(&e.repo),
            GitHubEvent::PullRequest(e) => Some(&e.repo),
            GitHubEvent::CommitComment(e) => Some(&e.repo),
            GitHubEvent::PageBuild(e) => Some(&e.repo),
        }
    }
}

/// A `create` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateEvent {
    pub repo: RepoName,
    /// `branch` or `tag`.
    pub ref_type: String,
    /// The short ref name (no `refs/heads/` prefix).
    pub ref_name: String,
}

/// A single commit inside a `push` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushCommit {
    pub author_name: String,
    pub message: String,
    pub url: String,
}

/// A `push` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushEvent {
    pub repo: RepoName,
    /// The full ref, e.g. `refs/heads/master`.
    pub git_ref: String,
    /// Commits in the order GitHub listed them.
    pub commits: Vec<PushCommit>,
    /// URL comparing the before and after states of the ref.
    pub compare: String,
}

impl PushEvent {
    /// Returns the ref with any `refs/heads/` prefix removed.
    pub fn branch(&self) -> &str {
        self.git_ref
            .strip_prefix("refs/heads/")
            .unwrap_or(&self.git_ref)
    }
}

/// An `issues` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueEvent {
    pub repo: RepoName,
    pub action: String,
    pub number: u64,
    pub title: String,
    pub sender: String,
    pub url: String,
}

/// An `issue_comment` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueCommentEvent {
    pub repo: RepoName,
    pub action: String,
    pub number: u64,
    pub body: String,
    pub sender: String,
    /// The comment's URL, not the issue's.
    pub url: String,
}

/// A `pull_request` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestEvent {
    pub repo: RepoName,
    pub action: String,
    pub number: u64,
    pub title: String,
    pub sender: String,
    pub url: String,
}

/// A `commit_comment` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitCommentEvent {
    pub repo: RepoName,
    pub action: String,
    pub body: String,
    pub sender: String,
    pub url: String,
}

/// A `page_build` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageBuildEvent {
    pub repo: RepoName,
    /// `built`, `errored`, etc.
    pub status: String,
    /// Present only when the build failed.
    pub error: Option<String>,
}
