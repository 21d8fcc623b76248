//! Webhook endpoint handler.
//!
//! Verifies the signature, resolves the event kind, renders chat lines and
//! enqueues them for the IRC connection. The response is sent as soon as the
//! lines are enqueued; delivery happens later, on the relay task.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::AppState;
use crate::webhooks::{EventKind, HandlerResult, UnsupportedEventKind, dispatch, verify_signature};

/// Header name for GitHub event type.
pub const HEADER_EVENT: &str = "x-github-event";
/// Header name for GitHub's HMAC-SHA1 signature.
pub const HEADER_SIGNATURE: &str = "x-hub-signature";

/// Response body for a failed signature check.
pub const BODY_BAD_SIGNATURE: &str = "Signatures didn't match!";
/// Response body for an unrecognized event type.
pub const BODY_UNKNOWN_EVENT: &str = "Event type not recognized";
/// Response body for any other path or method.
pub const BODY_NOT_FOUND: &str = "Page Not Found";

/// Errors that reject a webhook delivery.
///
/// Malformed payloads and transport failures are deliberately absent: they
/// are logged and the delivery is still acknowledged.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Missing, malformed or mismatched signature.
    #[error("invalid signature")]
    InvalidSignature,

    /// Event type header missing or not in the recognized set.
    #[error(transparent)]
    UnsupportedEventKind(#[from] UnsupportedEventKind),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let message = match self {
            WebhookError::InvalidSignature => BODY_BAD_SIGNATURE,
            WebhookError::UnsupportedEventKind(_) => BODY_UNKNOWN_EVENT,
        };
        (StatusCode::BAD_REQUEST, message).into_response()
    }
}

/// Webhook handler.
///
/// # Request
///
/// - Method: POST, at the configured route
/// - Required headers:
///   - `X-Hub-Signature`: `sha1=<hex HMAC of the body>`
///   - `X-GitHub-Event`: one of the recognized event types
/// - Body: JSON webhook payload
///
/// # Response
///
/// - 204 No Content: accepted (whether or not any line was routed)
/// - 400 Bad Request: bad signature or unrecognized event type
///
/// # Example
///
/// ```ignore
/// POST /hooks/github HTTP/1.1
/// X-GitHub-Event: create
/// X-Hub-Signature: sha1=...
/// Content-Type: application/json
///
/// {"ref": "v1.0", "ref_type": "tag", "repository": {"name": "roda"}}
///
/// HTTP/1.1 204 No Content
/// ```
pub async fn webhook_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, WebhookError> {
    let event_type = get_header(&headers, HEADER_EVENT).unwrap_or_default();

    // Signature first: nothing about the body is trusted, or even parsed,
    // until it checks out.
    let signature = get_header(&headers, HEADER_SIGNATURE).unwrap_or_default();
    if !verify_signature(&body, signature, app_state.webhook_secret()) {
        warn!(event_type = %event_type, "Invalid webhook signature");
        return Err(WebhookError::InvalidSignature);
    }

    let kind: EventKind = event_type.parse().map_err(|e: UnsupportedEventKind| {
        warn!(event_type = %event_type, "Unrecognized webhook event type");
        WebhookError::from(e)
    })?;

    let result = match dispatch(kind, &body) {
        Ok(result) => result,
        Err(e) => {
            warn!(event_type = %kind, error = %e, "Malformed webhook payload, nothing relayed");
            return Ok(StatusCode::NO_CONTENT);
        }
    };

    relay(&app_state, kind, result);
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for every other path and method.
pub async fn not_found_handler() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, BODY_NOT_FOUND)
}

/// Routes rendered lines to the repository's channel and enqueues them.
///
/// Returns the number of messages successfully enqueued.
fn relay(app_state: &AppState, kind: EventKind, result: HandlerResult) -> usize {
    if result.is_empty() {
        debug!(event_type = %kind, "Event produced no lines");
        return 0;
    }

    let line_count = result.lines.len();
    let messages = app_state
        .channels()
        .route(result.repo.as_ref(), result.lines);

    if messages.is_empty() {
        debug!(
            event_type = %kind,
            repo = ?result.repo,
            lines = line_count,
            "No channel configured for repository"
        );
        return 0;
    }

    let mut enqueued = 0;
    for message in messages {
        let channel = message.channel.clone();
        match app_state.relay().send(message) {
            Ok(()) => enqueued += 1,
            Err(e) => warn!(channel = %channel, error = %e, "Failed to enqueue chat message"),
        }
    }

    info!(
        event_type = %kind,
        repo = ?result.repo,
        enqueued,
        "Webhook relayed"
    );
    enqueued
}

/// Returns a header value as a string, if present and valid UTF-8.
fn get_header<'a>(headers: &'a HeaderMap, name: &'static str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::routing::ChannelMap;
    use crate::test_utils::RecordingSink;
    use crate::types::{ChannelName, RepoName};

    fn state(sink: Arc<RecordingSink>) -> AppState {
        AppState::new(b"secret".to_vec(), ChannelMap::new([("roda", "#roda")]), sink)
    }

    #[test]
    fn get_header_present() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_EVENT, "push".parse().unwrap());
        assert_eq!(get_header(&headers, HEADER_EVENT), Some("push"));
    }

    #[test]
    fn get_header_missing() {
        assert_eq!(get_header(&HeaderMap::new(), HEADER_EVENT), None);
    }

    #[test]
    fn relay_enqueues_every_line_for_mapped_repo() {
        let sink = Arc::new(RecordingSink::new());
        let app_state = state(sink.clone());

        let result = HandlerResult {
            repo: Some(RepoName::new("roda")),
            lines: vec!["one".to_string(), "two".to_string()],
        };
        assert_eq!(relay(&app_state, EventKind::Push, result), 2);

        let sent = sink.messages();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|m| m.channel == ChannelName::new("#roda")));
    }

    #[test]
    fn relay_skips_unmapped_repo() {
        let sink = Arc::new(RecordingSink::new());
        let app_state = state(sink.clone());

        let result = HandlerResult {
            repo: Some(RepoName::new("rails")),
            lines: vec!["one".to_string()],
        };
        assert_eq!(relay(&app_state, EventKind::Push, result), 0);
        assert_eq!(sink.send_calls(), 0);
    }

    #[test]
    fn relay_survives_transport_failure() {
        let sink = Arc::new(RecordingSink::failing());
        let app_state = state(sink.clone());

        let result = HandlerResult {
            repo: Some(RepoName::new("roda")),
            lines: vec!["one".to_string(), "two".to_string()],
        };
        assert_eq!(relay(&app_state, EventKind::Issues, result), 0);
        assert_eq!(sink.send_calls(), 2);
    }

    #[test]
    fn error_responses_are_400() {
        let response = WebhookError::InvalidSignature.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response =
            WebhookError::UnsupportedEventKind(UnsupportedEventKind("x".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
