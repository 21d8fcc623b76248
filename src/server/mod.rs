//! HTTP server for the hook relay.
//!
//! This module implements the HTTP server that:
//! - Accepts webhooks from GitHub at the configured route
//! - Validates signatures and turns recognized events into chat lines
//! - Hands those lines to the relay queue without waiting for delivery
//!
//! # Endpoints
//!
//! - `POST <route>` - Accepts GitHub webhook deliveries (returns 204 No Content)
//!
//! Every other path, and every other method on the route, answers
//! `404 Page Not Found`.

use std::sync::Arc;

use crate::config::Secret;
use crate::relay::MessageSink;
use crate::routing::ChannelMap;

pub mod webhook;

pub use webhook::{WebhookError, not_found_handler, webhook_handler};

/// Largest request body accepted. GitHub caps webhook payloads at 25 MB.
pub const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Shared application state.
///
/// This is passed to all handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Webhook secret for HMAC-SHA1 signature verification.
    webhook_secret: Secret,

    /// Repository to channel routing table.
    channels: ChannelMap,

    /// Where rendered lines are enqueued.
    relay: Arc<dyn MessageSink>,
}

impl AppState {
    /// Creates a new `AppState`.
    ///
    /// # Arguments
    ///
    /// * `webhook_secret` - Secret for verifying webhook signatures
    /// * `channels` - Repository to channel routing table
    /// * `relay` - Sink that accepts outbound chat lines
    pub fn new(
        webhook_secret: impl Into<Vec<u8>>,
        channels: ChannelMap,
        relay: Arc<dyn MessageSink>,
    ) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                webhook_secret: Secret::new(webhook_secret),
                channels,
                relay,
            }),
        }
    }

    /// Returns the webhook secret.
    pub fn webhook_secret(&self) -> &[u8] {
        self.inner.webhook_secret.expose()
    }

    /// Returns the routing table.
    pub fn channels(&self) -> &ChannelMap {
        &self.inner.channels
    }

    /// Returns the relay sink.
    pub fn relay(&self) -> &dyn MessageSink {
        self.inner.relay.as_ref()
    }
}

/// Builds the axum Router serving the webhook at `route`.
pub fn build_router(route: &str, app_state: AppState) -> axum::Router {
    use axum::extract::DefaultBodyLimit;
    use axum::routing::post;

    axum::Router::new()
        .route(route, post(webhook_handler).fallback(not_found_handler))
        .fallback(not_found_handler)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::RecordingSink;

    #[test]
    fn app_state_accessors_work() {
        let secret = b"test-secret";
        let channels = ChannelMap::new([("roda", "#roda")]);

        let state = AppState::new(secret.to_vec(), channels.clone(), Arc::new(RecordingSink::new()));

        assert_eq!(state.webhook_secret(), secret);
        assert_eq!(state.channels(), &channels);
    }

    #[test]
    fn app_state_is_clone() {
        let state = AppState::new(
            b"secret".to_vec(),
            ChannelMap::default(),
            Arc::new(RecordingSink::new()),
        );
        let cloned = state.clone();

        assert_eq!(state.webhook_secret(), cloned.webhook_secret());
    }
}
