//! WebSocket client for the OBS control connection.
//!
//! Owns the socket, runs the `Hello` → `Identify` → `Identified` handshake,
//! routes `RequestResponse` frames to the correlator, and keeps the public
//! [`ConnectionSnapshot`] up to date.
//!
//! Architecture:
//! - [`ObsClient`] is the handle the rest of the app holds.  It is cheap to
//!   share behind an `Arc` and every method takes `&self`.
//! - Each `connect` spawns one *reactor* task that owns the socket.  The
//!   reactor `select!`s between outbound commands and inbound frames and
//!   handles inbound frames one at a time, in arrival order.
//! - Outbound frames reach the reactor through an unbounded `mpsc` channel,
//!   so any number of callers can send requests concurrently without ever
//!   touching the socket.
//! - State lives in a `tokio::sync::watch` channel.  The reactor is the only
//!   writer; readers either call the accessors or subscribe.
//!
//! ```text
//!  callers ──send_request──> RequestCorrelator ──Outbound::Frame──┐
//!                                  ^                              v
//!                                  │ resolve            ┌──── reactor ────┐
//!                                  └────────────────────│ select! {       │
//!  ObsClient accessors <── watch<ConnectionSnapshot> <──│   outbound,     │<──> OBS
//!                                                       │   socket.next() │
//!                                                       │ }               │
//!                                                       └─────────────────┘
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use midi_obs_core::protocol::messages::ObsMessage;
use midi_obs_core::{decode_message, encode_message};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};

use crate::application::connection_state::{ConnectionSnapshot, ConnectionStatus};
use crate::application::correlator::{FrameSink, RequestCorrelator, SinkError};
use crate::application::{handshake, scene_sync};

/// Default wait for a single request before it resolves to `None`.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// OBS application close codes (e.g. 4009 authentication failed).
const OBS_CLOSE_CODES: std::ops::RangeInclusive<u16> = 4000..=4999;

type WsWrite = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Settings the client needs beyond the address passed to `connect`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObsClientConfig {
    /// Password for servers that require authentication.
    pub password: Option<String>,
    /// Per-request timeout; `None` waits until a response or disconnect.
    pub request_timeout: Option<Duration>,
}

impl Default for ObsClientConfig {
    fn default() -> Self {
        Self {
            password: None,
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
        }
    }
}

/// Commands from client handles to the reactor.
#[derive(Debug)]
enum Outbound {
    Frame(String),
    Close,
}

/// [`FrameSink`] that queues frames for the reactor.
struct SessionSink {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl FrameSink for SessionSink {
    fn send_frame(&self, frame: String) -> Result<(), SinkError> {
        self.tx
            .send(Outbound::Frame(frame))
            .map_err(|_| SinkError::Closed)
    }
}

/// The client's view of the live session.
struct Session {
    generation: u64,
    sink: Arc<SessionSink>,
    correlator: Arc<RequestCorrelator>,
}

/// Everything the reactor and its helper tasks need, cloned into each task.
#[derive(Clone)]
struct SessionContext {
    generation: u64,
    endpoint: String,
    password: Option<String>,
    state: Arc<watch::Sender<ConnectionSnapshot>>,
    sink: Arc<SessionSink>,
    correlator: Arc<RequestCorrelator>,
}

impl SessionContext {
    fn update(&self, transition: impl FnOnce(&mut ConnectionSnapshot) -> bool) -> bool {
        self.state.send_if_modified(transition)
    }
}

/// Handle to one OBS WebSocket connection.
///
/// Dropping the handle closes the connection.
pub struct ObsClient {
    config: ObsClientConfig,
    state: Arc<watch::Sender<ConnectionSnapshot>>,
    session: Mutex<Option<Session>>,
}

impl ObsClient {
    /// Creates a disconnected client.
    pub fn new(config: ObsClientConfig) -> Self {
        let (state, _) = watch::channel(ConnectionSnapshot::default());
        Self {
            config,
            state: Arc::new(state),
            session: Mutex::new(None),
        }
    }

    fn session_slot(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Read side ────────────────────────────────────────────────────────────

    /// Current connection status.
    pub fn status(&self) -> ConnectionStatus {
        self.state.borrow().status
    }

    /// Error text for the `Error` status; empty otherwise.
    pub fn error(&self) -> String {
        self.state.borrow().error.clone()
    }

    /// Scene names, top of the OBS scene list first.
    pub fn scenes(&self) -> Vec<String> {
        self.state.borrow().scenes.clone()
    }

    /// Status, error text, and scenes read together.
    pub fn snapshot(&self) -> ConnectionSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver that is notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionSnapshot> {
        self.state.subscribe()
    }

    // ── Commands ─────────────────────────────────────────────────────────────

    /// Connects to the OBS WebSocket server at `host:port`.
    ///
    /// Any existing connection is closed first.  Returns as soon as the
    /// attempt has started; progress shows up in [`status`](Self::status).
    /// If the address cannot form a WebSocket URL, or no Tokio runtime is
    /// available to drive the socket, the status becomes `Error` right away.
    pub fn connect(&self, host: &str, port: u16) {
        let mut slot = self.session_slot();
        close_session(&mut slot);

        let mut generation = 0;
        self.state.send_modify(|s| generation = s.begin_connect());

        let endpoint = format!("{host}:{port}");
        let url = format!("ws://{endpoint}");
        let request = match url.as_str().into_client_request() {
            Ok(request) => request,
            Err(e) => {
                warn!("invalid OBS address {endpoint}: {e}");
                self.state.send_if_modified(|s| {
                    s.fail(generation, format!("Invalid OBS address {endpoint}: {e}"))
                });
                return;
            }
        };
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!("cannot connect to OBS at {endpoint}: {e}");
                self.state.send_if_modified(|s| {
                    s.fail(generation, format!("Cannot connect to OBS at {endpoint}: {e}"))
                });
                return;
            }
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let ctx = SessionContext {
            generation,
            endpoint,
            password: self.config.password.clone(),
            state: Arc::clone(&self.state),
            sink: Arc::new(SessionSink { tx }),
            correlator: Arc::new(RequestCorrelator::new(self.config.request_timeout)),
        };
        *slot = Some(Session {
            generation,
            sink: Arc::clone(&ctx.sink),
            correlator: Arc::clone(&ctx.correlator),
        });

        info!("connecting to OBS at {url}");
        runtime.spawn(run_session(ctx, request, rx));
    }

    /// Closes the connection, if any, and resets to a clean `Disconnected`.
    ///
    /// Every request still waiting for a response resolves to `None`.
    pub fn disconnect(&self) {
        let mut slot = self.session_slot();
        close_session(&mut slot);
        self.state.send_modify(ConnectionSnapshot::reset);
    }

    /// Sends an OBS request and waits for its `responseData`.
    ///
    /// Returns `None` when there is no connection, the request failed or
    /// timed out, or the connection closed before OBS answered.
    pub async fn send_request(&self, request_type: &str) -> Option<Value> {
        let (sink, correlator, _) = self.current_session()?;
        correlator.send(request_type, &*sink).await
    }

    /// Fetches the scene list again and publishes it.
    ///
    /// Returns `true` if a new list was published.  On failure the previous
    /// list stays in place.
    pub async fn refresh_scenes(&self) -> bool {
        let Some((sink, correlator, generation)) = self.current_session() else {
            return false;
        };
        refresh_and_publish(&self.state, generation, &correlator, &*sink).await
    }

    fn current_session(&self) -> Option<(Arc<SessionSink>, Arc<RequestCorrelator>, u64)> {
        self.session_slot().as_ref().map(|session| {
            (
                Arc::clone(&session.sink),
                Arc::clone(&session.correlator),
                session.generation,
            )
        })
    }
}

impl Drop for ObsClient {
    fn drop(&mut self) {
        close_session(&mut self.session_slot());
    }
}

/// Asks the reactor to close the socket and cancels every pending request.
fn close_session(slot: &mut Option<Session>) {
    let Some(session) = slot.take() else {
        return;
    };
    // The reactor may already be gone; then there is nothing to close.
    let _ = session.sink.tx.send(Outbound::Close);
    let drained = session.correlator.drain_all();
    if drained > 0 {
        debug!("cancelled {drained} pending request(s) on disconnect");
    }
}

async fn refresh_and_publish(
    state: &watch::Sender<ConnectionSnapshot>,
    generation: u64,
    correlator: &RequestCorrelator,
    sink: &dyn FrameSink,
) -> bool {
    let Some(scenes) = scene_sync::fetch_scene_list(correlator, sink).await else {
        return false;
    };
    let count = scenes.len();
    let published = state.send_if_modified(|s| s.publish_scenes(generation, scenes));
    if published {
        info!("scene list updated ({count} scenes)");
    }
    published
}

// ── Reactor ───────────────────────────────────────────────────────────────────

async fn run_session(
    ctx: SessionContext,
    request: Request,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
) {
    let socket = match connect_async(request).await {
        Ok((socket, _response)) => socket,
        Err(e) => {
            warn!("could not connect to OBS at {}: {e}", ctx.endpoint);
            ctx.update(|s| {
                s.fail(
                    ctx.generation,
                    format!(
                        "Could not connect to OBS at {} ({e}). \
                         Is OBS running with WebSocket Server enabled?",
                        ctx.endpoint
                    ),
                )
            });
            finish_session(&ctx, &mut outbound);
            return;
        }
    };
    debug!("socket open to {}; waiting for Hello", ctx.endpoint);
    let (mut write, mut read) = socket.split();

    loop {
        tokio::select! {
            command = outbound.recv() => match command {
                Some(Outbound::Frame(frame)) => {
                    if let Err(e) = write.send(Message::Text(frame)).await {
                        lost_connection(&ctx, &e);
                        break;
                    }
                }
                Some(Outbound::Close) | None => {
                    debug!("closing socket to {}", ctx.endpoint);
                    if let Err(e) = write.close().await {
                        debug!("close handshake with {} failed: {e}", ctx.endpoint);
                    }
                    break;
                }
            },
            incoming = read.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if let Err(e) = handle_frame(&ctx, &mut write, &text).await {
                        lost_connection(&ctx, &e);
                        break;
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    server_closed(&ctx, frame.as_ref());
                    // Flushes the close reply tungstenite queued on receipt.
                    if let Err(e) = write.close().await {
                        debug!("close reply to {} failed: {e}", ctx.endpoint);
                    }
                    break;
                }
                // Ping/pong are answered by tungstenite; OBS never sends binary.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    lost_connection(&ctx, &e);
                    break;
                }
                None => {
                    debug!("socket to {} ended", ctx.endpoint);
                    break;
                }
            },
        }
    }

    finish_session(&ctx, &mut outbound);
}

/// Handles one inbound text frame.  Only a failed socket write is an error.
async fn handle_frame(ctx: &SessionContext, write: &mut WsWrite, text: &str) -> Result<(), WsError> {
    let message = match decode_message(text) {
        Ok(message) => message,
        Err(e) => {
            debug!("dropping frame from {}: {e}", ctx.endpoint);
            return Ok(());
        }
    };
    trace!("received {}", message.kind_name());

    match message {
        ObsMessage::Hello(hello) => {
            if let Some(version) = &hello.obs_web_socket_version {
                info!("OBS WebSocket {version} (rpc v{}) at {}", hello.rpc_version, ctx.endpoint);
            }
            let identify = handshake::identify_for(&hello, ctx.password.as_deref());
            if hello.authentication.is_some() && identify.authentication.is_none() {
                warn!("OBS at {} requires a password but none is configured", ctx.endpoint);
            }
            match encode_message(&ObsMessage::Identify(identify)) {
                Ok(frame) => write.send(Message::Text(frame)).await?,
                Err(e) => warn!("could not encode Identify: {e}"),
            }
        }
        ObsMessage::Identified(_) => {
            if ctx.update(|s| s.identified(ctx.generation)) {
                info!("identified with OBS at {}", ctx.endpoint);
                // Refresh on its own task: the reactor must keep reading to
                // receive the response it waits for.
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    refresh_and_publish(&ctx.state, ctx.generation, &ctx.correlator, &*ctx.sink)
                        .await;
                });
            }
        }
        ObsMessage::RequestResponse(response) => {
            let status = &response.request_status;
            if !status.result {
                debug!(
                    "request {} failed (code {:?}): {}",
                    response.request_id,
                    status.code,
                    status.comment.as_deref().unwrap_or("no comment")
                );
            }
            ctx.correlator
                .resolve(&response.request_id, status.result, response.response_data);
        }
        other => debug!("ignoring {} from server", other.kind_name()),
    }
    Ok(())
}

fn server_closed(ctx: &SessionContext, frame: Option<&CloseFrame<'_>>) {
    let Some(frame) = frame else {
        info!("OBS at {} closed the connection", ctx.endpoint);
        return;
    };
    let code = u16::from(frame.code);
    if !OBS_CLOSE_CODES.contains(&code) {
        info!("OBS at {} closed the connection ({code})", ctx.endpoint);
        return;
    }
    let reason = if frame.reason.is_empty() {
        "no reason given"
    } else {
        frame.reason.as_ref()
    };
    warn!("OBS at {} refused the session: {reason} ({code})", ctx.endpoint);
    ctx.update(|s| {
        s.fail(
            ctx.generation,
            format!("OBS at {} closed the connection: {reason} ({code})", ctx.endpoint),
        )
    });
}

fn lost_connection(ctx: &SessionContext, error: &WsError) {
    warn!("lost connection to OBS at {}: {error}", ctx.endpoint);
    ctx.update(|s| {
        s.fail(
            ctx.generation,
            format!("Lost connection to OBS at {}: {error}", ctx.endpoint),
        )
    });
}

/// Tears down the session's shared state once the reactor stops.
fn finish_session(ctx: &SessionContext, outbound: &mut mpsc::UnboundedReceiver<Outbound>) {
    // Closing first makes late senders fail fast instead of waiting on a
    // table that has already been drained.
    outbound.close();
    ctx.update(|s| s.closed(ctx.generation));
    let drained = ctx.correlator.drain_all();
    info!(
        "connection to OBS at {} closed ({drained} pending request(s) cancelled)",
        ctx.endpoint
    );
}

// ── Tests ─────────────────────────────────────────────────────────────────────
