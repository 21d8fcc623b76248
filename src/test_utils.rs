//! Shared test utilities: a recording message sink and payload builders.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{Value, json};

use crate::relay::{MessageSink, RelayError};
use crate::types::OutboundMessage;

/// A [`MessageSink`] that remembers everything it was given.
///
/// A failing sink counts calls but rejects every message, standing in for a
/// saturated queue.
#[derive(Debug, Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<OutboundMessage>>,
    calls: AtomicUsize,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        RecordingSink {
            fail: true,
            ..Self::default()
        }
    }

    /// Messages accepted so far, in order.
    pub fn messages(&self) -> Vec<OutboundMessage> {
        self.messages.lock().unwrap().clone()
    }

    /// Texts accepted so far, in order.
    pub fn texts(&self) -> Vec<String> {
        self.messages().into_iter().map(|m| m.text).collect()
    }

    /// Number of `send` calls, successful or not.
    pub fn send_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl MessageSink for RecordingSink {
    fn send(&self, message: OutboundMessage) -> Result<(), RelayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RelayError::QueueFull(message.channel));
        }
        self.messages.lock().unwrap().push(message);
        Ok(())
    }
}

/// A `push` payload for `repo` on `master` with `n` commits.
pub fn push_payload(repo: &str, n: usize) -> Value {
    let commits: Vec<Value> = (1..=n)
        .map(|i| {
            json!({
                "id": format!("{i:040x}"),
                "author": { "name": "Jeremy Evans", "email": "code@jeremyevans.net" },
                "message": format!("Commit {i}\n\nLonger description"),
                "url": format!("https://github.com/jeremyevans/{repo}/commit/{i}"),
            })
        })
        .collect();

    json!({
        "ref": "refs/heads/master",
        "compare": format!("https://github.com/jeremyevans/{repo}/compare/a...b"),
        "commits": commits,
        "repository": { "name": repo, "full_name": format!("jeremyevans/{repo}") },
        "sender": { "login": "jeremyevans" },
    })
}

/// An `issues` payload for `repo`.
pub fn issues_payload(repo: &str, action: &str, number: u64, title: &str) -> Value {
    json!({
        "action": action,
        "issue": {
            "number": number,
            "title": title,
            "html_url": format!("https://github.com/jeremyevans/{repo}/issues/{number}"),
        },
        "sender": { "login": "octocat" },
        "repository": { "name": repo },
    })
}
