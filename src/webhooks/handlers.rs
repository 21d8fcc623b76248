//! Turns parsed webhook events into chat lines.
//!
//! Handlers are pure functions: they take an event and return the lines to
//! post, in order, without knowing where the lines will go. Channel routing and
//! delivery happen in the caller.
//!
//! # Line formats
//!
//! | Event | Line |
//! |-------|------|
//! | `create` | `{repo}: {ref_type} {ref} created` |
//! | `push` | `{repo}/{branch}: {author} committed: {message} {url}` |
//! | `issues` | `{repo}: issue #{n} {action} by {user}: {title} {url}` |
//! | `issue_comment` | `{repo}: comment on issue #{n} {action} by {user}: {body} {url}` |
//! | `pull_request` | `{repo}: pull request #{n} {action} by {user}: {title} {url}` |
//! | `commit_comment` | `{repo}: comment on commit {action} by {user}: {body} {url}` |
//! | `page_build` | `{repo}: pages {status} {error}` |

use crate::types::RepoName;

use super::events::{
    CommitCommentEvent, CreateEvent, EventKind, GitHubEvent, IssueCommentEvent, IssueEvent,
    PageBuildEvent, PullRequestEvent, PushEvent,
};
use super::format::format_summary;
use super::parser::{ParseError, parse_event};

/// Number of commits from a push that get their own line.
pub const MAX_PUSH_COMMITS: usize = 6;

/// Lines produced for one delivery, with the repository they concern.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HandlerResult {
    /// The repository named in the payload; `None` for `ping`.
    pub repo: Option<RepoName>,

    /// Chat lines in the order they should be posted.
    pub lines: Vec<String>,
}

impl HandlerResult {
    /// Returns true if there is nothing to post.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Parses a payload of the given kind and renders its chat lines.
///
/// A payload missing any field the lines need yields `Err` and no lines at
/// all; a partial message is never produced.
pub fn dispatch(kind: EventKind, payload: &[u8]) -> Result<HandlerResult, ParseError> {
    let event = parse_event(kind, payload)?;
    Ok(HandlerResult {
        repo: event.repo().cloned(),
        lines: handle_event(&event),
    })
}

/// Renders the chat lines for a parsed event.
pub fn handle_event(event: &GitHubEvent) -> Vec<String> {
    match event {
        GitHubEvent::Ping => Vec::new(),
        GitHubEvent::Create(e) => vec![handle_create(e)],
        GitHubEvent::Push(e) => handle_push(e),
        GitHubEvent::Issues(e) => vec![handle_issues(e)],
        GitHubEvent::IssueComment(e) => vec![handle_issue_comment(e)],
        GitHubEvent::PullRequest(e) => vec![handle_pull_request(e)],
        GitHubEvent::CommitComment(e) => vec![handle_commit_comment(e)],
        GitHubEvent::PageBuild(e) => vec![handle_page_build(e)],
    }
}

fn handle_create(e: &CreateEvent) -> String {
    format!("{}: {} {} created", e.repo, e.ref_type, e.ref_name)
}

fn handle_push(e: &PushEvent) -> Vec<String> {
    let branch = e.branch();

    let mut lines: Vec<String> = e
        .commits
        .iter()
        .take(MAX_PUSH_COMMITS)
        .map(|c| {
            format!(
                "{}/{}: {} committed: {} {}",
                e.repo,
                branch,
                c.author_name,
                format_summary(&c.message),
                c.url
            )
        })
        .collect();

    let remaining = e.commits.len().saturating_sub(MAX_PUSH_COMMITS);
    if remaining > 0 {
        lines.push(format!(
            "{}/{}: ... and {} more commits added {}",
            e.repo, branch, remaining, e.compare
        ));
    }

    lines
}

fn handle_issues(e: &IssueEvent) -> String {
    format!(
        "{}: issue #{} {} by {}: {} {}",
        e.repo,
        e.number,
        e.action,
        e.sender,
        format_summary(&e.title),
        e.url
    )
}

fn handle_issue_comment(e: &IssueCommentEvent) -> String {
    format!(
        "{}: comment on issue #{} {} by {}: {} {}",
        e.repo,
        e.number,
        e.action,
        e.sender,
        format_summary(&e.body),
        e.url
    )
}

fn handle_pull_request(e: &PullRequestEvent) -> String {
    format!(
        "{}: pull request #{} {} by {}: {} {}",
        e.repo,
        e.number,
        e.action,
        e.sender,
        format_summary(&e.title),
        e.url
    )
}

fn handle_commit_comment(e: &CommitCommentEvent) -> String {
    format!(
        "{}: comment on commit {} by {}: {} {}",
        e.repo,
        e.action,
        e.sender,
        format_summary(&e.body),
        e.url
    )
}

fn handle_page_build(e: &PageBuildEvent) -> String {
    match &e.error {
        Some(error) => format!("{}: pages {} {}", e.repo, e.status, format_summary(error)),
        None => format!("{}: pages {}", e.repo, e.status),
    }
}
