//! The long-lived IRC connection task.
//!
//! [`IrcClient::run`] is spawned once at startup and owns the connection for
//! the life of the process. It is the only consumer of the relay queue.
//!
//! # Event Loop
//!
//! Each session multiplexes:
//! - Inbound server lines (registration, `PING`, `KICK`, `ERROR`)
//! - Outbound relay messages, drained only once registered
//! - A housekeeping tick for registration and ping timeouts
//! - Shutdown via cancellation token
//!
//! When a session ends for any reason other than shutdown, the client waits
//! according to its [`ReconnectPolicy`] and connects again. A message taken
//! off the queue by a session that then fails is lost.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_rustls::TlsConnector;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{self, ClientConfig, RootCertStore};
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::Secret;
use crate::types::{ChannelName, OutboundMessage};

use super::backoff::ReconnectPolicy;
use super::codec::IrcCodec;
use super::error::IrcError;
use super::message::{self, Message};
use super::registration::Registration;

/// Bound on TCP connect plus TLS handshake.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Bound on the time from connecting to receiving `001`.
const REGISTRATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Silence after which we ping the server ourselves.
const IDLE_PING_AFTER: Duration = Duration::from_secs(120);

/// Silence after which the connection is considered dead.
const IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// How often timeouts are checked.
const TICK_INTERVAL: Duration = Duration::from_secs(5);

/// Minimum spacing between relayed messages, to stay under flood limits.
const SEND_INTERVAL: Duration = Duration::from_millis(500);

/// IRC connection settings.
#[derive(Debug, Clone)]
pub struct IrcConfig {
    /// Server hostname.
    pub server: String,

    /// Server port.
    pub port: u16,

    /// Whether to wrap the connection in TLS.
    pub tls: bool,

    /// Nick, also used as the username and SASL identity.
    pub nick: String,

    /// Free-form real name shown in WHOIS.
    pub realname: String,

    /// SASL PLAIN password. SASL is skipped when unset.
    pub password: Option<Secret>,

    /// Channels to join after registering.
    pub channels: Vec<ChannelName>,
}

/// Anything a session can run over: a TCP socket, a TLS stream, or an
/// in-memory pipe in tests.
pub trait IrcStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> IrcStream for T {}

/// How a session ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The cancellation token fired.
    Shutdown,

    /// Every relay handle was dropped; nothing more will be sent.
    QueueClosed,
}

/// Owns the IRC connection and drains the relay queue into it.
#[derive(Debug, Clone)]
pub struct IrcClient {
    config: IrcConfig,
    reconnect: ReconnectPolicy,
    send_interval: Duration,
}

impl IrcClient {
    pub fn new(config: IrcConfig) -> Self {
        IrcClient {
            config,
            reconnect: ReconnectPolicy::DEFAULT,
            send_interval: SEND_INTERVAL,
        }
    }

    /// Sets a custom reconnect policy.
    pub fn with_reconnect_policy(mut self, reconnect: ReconnectPolicy) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Sets the minimum spacing between relayed messages.
    pub fn with_send_interval(mut self, send_interval: Duration) -> Self {
        self.send_interval = send_interval;
        self
    }

    pub fn config(&self) -> &IrcConfig {
        &self.config
    }

    /// Runs sessions until shutdown or until the relay queue closes.
    ///
    /// Connection failures are logged and retried; they never end the task.
    #[instrument(skip_all, fields(server = %self.config.server, port = self.config.port))]
    pub async fn run(self, mut rx: mpsc::Receiver<OutboundMessage>, cancel: CancellationToken) {
        let mut attempt: u32 = 0;

        loop {
            info!(tls = self.config.tls, "Connecting to IRC server");

            let connected = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("IRC client shut down while connecting");
                    return;
                }
                result = self.connect() => result,
            };

            let mut registered = false;
            let outcome = match connected {
                Ok(stream) => {
                    self.session(stream, &mut rx, &cancel, &mut registered)
                        .await
                }
                Err(e) => Err(e),
            };

            match outcome {
                Ok(SessionEnd::Shutdown) => {
                    info!("IRC client shut down");
                    return;
                }
                Ok(SessionEnd::QueueClosed) => {
                    info!("Relay queue closed, IRC client exiting");
                    return;
                }
                Err(e) => {
                    if registered {
                        attempt = 0;
                    }
                    let delay = self.reconnect.delay_for_attempt(attempt);
                    attempt = attempt.saturating_add(1);
                    warn!(
                        error = %e,
                        retry_in_ms = delay.as_millis() as u64,
                        "IRC connection lost"
                    );

                    tokio::select! {
                        _ = cancel.cancelled() => {
                            info!("IRC client shut down while reconnecting");
                            return;
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }

    /// Opens the connection, bounded by [`CONNECT_TIMEOUT`].
    async fn connect(&self) -> Result<Box<dyn IrcStream>, IrcError> {
        tokio::time::timeout(CONNECT_TIMEOUT, self.open_stream())
            .await
            .map_err(|_| {
                IrcError::ConnectTimeout(format!("{}:{}", self.config.server, self.config.port))
            })?
    }

    /// Opens the TCP connection and, if configured, the TLS session.
    async fn open_stream(&self) -> Result<Box<dyn IrcStream>, IrcError> {
        let tcp = TcpStream::connect((self.config.server.as_str(), self.config.port)).await?;
        tcp.set_nodelay(true)?;

        if !self.config.tls {
            return Ok(Box::new(tcp));
        }

        let server_name = ServerName::try_from(self.config.server.clone())
            .map_err(|_| IrcError::InvalidServerName(self.config.server.clone()))?;
        let tls = tls_connector()?.connect(server_name, tcp).await?;
        Ok(Box::new(tls))
    }

    /// Runs one registered-or-registering session over `stream`.
    ///
    /// `registered` is set once the server welcomes us, so the caller can
    /// tell a session that worked for a while from one that never got going.
    pub async fn session<S: IrcStream>(
        &self,
        stream: S,
        rx: &mut mpsc::Receiver<OutboundMessage>,
        cancel: &CancellationToken,
        registered: &mut bool,
    ) -> Result<SessionEnd, IrcError> {
        let mut framed = Framed::new(stream, IrcCodec::new());
        let mut registration = Registration::new(&self.config);

        for line in registration.greeting() {
            framed.send(line).await?;
        }

        let started = Instant::now();
        let mut last_activity = Instant::now();
        let mut ping_outstanding = false;
        let mut next_send = Instant::now();

        let mut tick = tokio::time::interval(TICK_INTERVAL);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    let _ = framed.send(message::quit("Shutting down")).await;
                    return Ok(SessionEnd::Shutdown);
                }

                incoming = framed.next() => {
                    let line = match incoming {
                        Some(line) => line?,
                        None => return Err(IrcError::ConnectionClosed),
                    };
                    last_activity = Instant::now();
                    ping_outstanding = false;

                    let Some(msg) = Message::parse(&line) else {
                        debug!(line = %line, "Ignoring unparseable line");
                        continue;
                    };
                    for reply in registration.handle(&msg)? {
                        framed.send(reply).await?;
                    }
                    *registered = registration.is_registered();
                }

                outgoing = rx.recv(), if registration.is_registered() => {
                    let Some(outbound) = outgoing else {
                        let _ = framed.send(message::quit("Relay stopped")).await;
                        return Ok(SessionEnd::QueueClosed);
                    };

                    tokio::time::sleep_until(next_send).await;
                    if let Err(e) = framed
                        .send(message::privmsg(&outbound.channel, &outbound.text))
                        .await
                    {
                        warn!(channel = %outbound.channel, "Dropped message: connection failed while sending");
                        return Err(e.into());
                    }
                    next_send = Instant::now() + self.send_interval;
                    debug!(channel = %outbound.channel, "Relayed message");
                }

                _ = tick.tick() => {
                    if !registration.is_registered() && started.elapsed() > REGISTRATION_TIMEOUT {
                        return Err(IrcError::RegistrationTimeout);
                    }
                    let idle = last_activity.elapsed();
                    if idle > IDLE_TIMEOUT {
                        return Err(IrcError::PingTimeout);
                    }
                    if idle > IDLE_PING_AFTER && !ping_outstanding {
                        framed.send(message::ping("keepalive")).await?;
                        ping_outstanding = true;
                    }
                }
            }
        }
    }
}

fn tls_connector() -> Result<TlsConnector, IrcError> {
    let roots = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };
    let config = ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()?
    .with_root_certificates(roots)
    .with_no_client_auth();

    Ok(TlsConnector::from(Arc::new(config)))
}
