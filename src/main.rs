use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hook_relay::config::{self, Config};
use hook_relay::irc::IrcClient;
use hook_relay::relay::RelayHandle;
use hook_relay::server::{AppState, build_router};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hook_relay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("failed to load configuration")?;

    // SAFETY: no other threads exist yet; the runtime is built below.
    unsafe { config::clear_env() };

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?
        .block_on(run(config))
}

async fn run(config: Config) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    if config.channels.is_empty() {
        warn!("No repositories are routed to a channel; every event will be dropped");
    }

    let (relay, rx) = RelayHandle::channel(config.queue_capacity);
    let irc = IrcClient::new(config.irc);
    info!(
        server = %irc.config().server,
        port = irc.config().port,
        tls = irc.config().tls,
        nick = %irc.config().nick,
        "Starting IRC connection"
    );
    let irc_task = tokio::spawn(irc.run(rx, cancel.clone()));

    let app_state = AppState::new(config.secret.expose(), config.channels, Arc::new(relay));
    let app = build_router(&config.route, app_state);

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;
    info!(addr = %config.listen, route = %config.route, "listening");

    let shutdown = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutting down");
            shutdown.cancel();
        })
        .await
        .context("HTTP server failed")?;

    // The server can also stop on its own; make sure the IRC task follows.
    cancel.cancel();
    irc_task.await.context("IRC task panicked")?;
    Ok(())
}
