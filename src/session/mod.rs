//! Realtime session engine
//!
//! A [`Session`] owns one logical connection to a namespace endpoint and
//! everything hanging off it: lazy connection establishment with coalescing of
//! concurrent attempts, room membership commands, validated outbound event
//! emission, and the dispatch loop feeding registered listeners.
//!
//! Sessions are constructed values, not globals; the application builds one
//! per namespace at startup and hands references to whoever needs them. Tests
//! inject fake token providers and connectors through the same constructors.

mod dispatcher;

pub use dispatcher::{Dispatcher, ListenerSet, Subscription};

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tokio::time::timeout;

use crate::auth::{AuthError, TokenProvider};
use crate::protocol::OutboundEvent;
use crate::transport::{ConnectAuth, Connector, TransportHandle};

/// Default ceiling on a single connect attempt (token fetch included)
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Logical realtime channels; each gets its own session and shares nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Chat,
    Tracking,
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Chat => "chat",
            Namespace::Tracking => "tracking",
        }
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A room the session can declare interest in
///
/// Join/leave are fire-and-forget intent; the session does not track which
/// rooms are currently joined and nothing is rejoined after a reconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomId {
    /// Per-booking chat room
    Booking(String),
    /// Per-trip tracking room
    Trip(String),
}

impl RoomId {
    fn id(&self) -> &str {
        match self {
            RoomId::Booking(id) | RoomId::Trip(id) => id,
        }
    }

    fn join_event(&self) -> OutboundEvent {
        match self {
            RoomId::Booking(id) => OutboundEvent::JoinBooking {
                booking_id: id.clone(),
            },
            RoomId::Trip(id) => OutboundEvent::JoinTrip {
                trip_id: id.clone(),
            },
        }
    }

    fn leave_event(&self) -> OutboundEvent {
        match self {
            RoomId::Booking(id) => OutboundEvent::LeaveBooking {
                booking_id: id.clone(),
            },
            RoomId::Trip(id) => OutboundEvent::LeaveTrip {
                trip_id: id.clone(),
            },
        }
    }
}

/// Failures surfaced to callers of the session layer
///
/// `Clone` so one failed connect attempt can be delivered to every coalesced
/// waiter. Server-pushed errors never appear here; they reach error listeners
/// through the dispatcher instead.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("Authentication unavailable: {0}")]
    AuthUnavailable(String),

    #[error("Connect failed: {0}")]
    ConnectFailure(String),

    #[error("Connect timed out after {0:?}")]
    ConnectTimeout(Duration),

    #[error("Not connected")]
    NotConnected,
}

impl From<AuthError> for SessionError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unavailable(reason) => SessionError::AuthUnavailable(reason),
        }
    }
}

type ConnectResult = Result<TransportHandle, SessionError>;

/// Connection state machine: Idle -> Connecting -> Connected, with failure
/// and transport disconnect dropping back to Idle
enum ConnState {
    Idle,
    Connecting(watch::Receiver<Option<ConnectResult>>),
    Connected(TransportHandle),
}

struct SessionInner<P, C> {
    provider: P,
    connector: C,
    endpoint: String,
    namespace: Namespace,
    connect_timeout: Duration,
    state: Mutex<ConnState>,
    dispatcher: Dispatcher,
}

/// One authenticated realtime session per namespace
///
/// Cloning shares the session; all clones observe the same connection.
pub struct Session<P, C> {
    inner: Arc<SessionInner<P, C>>,
}

impl<P, C> Clone for Session<P, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: TokenProvider, C: Connector> Session<P, C> {
    /// Create a session for `namespace` at `endpoint`; no connection is opened
    /// until the first call that needs one
    pub fn new(
        provider: P,
        connector: C,
        endpoint: impl Into<String>,
        namespace: Namespace,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                provider,
                connector,
                endpoint: endpoint.into(),
                namespace,
                connect_timeout,
                state: Mutex::new(ConnState::Idle),
                dispatcher: Dispatcher::new(),
            }),
        }
    }

    /// Listener registries for this session's inbound events
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    /// Return a live connection handle, connecting first if necessary
    ///
    /// Concurrent callers while a connect is in flight all await that same
    /// attempt and share its outcome; exactly one credential fetch and one
    /// transport connect happen per attempt. A failed attempt clears the
    /// in-flight marker so the next call may retry; this layer never retries
    /// on its own.
    pub async fn ensure_connected(&self) -> ConnectResult {
        let mut result_rx = {
            let mut state = self.inner.state.lock().await;
            match &*state {
                ConnState::Connected(handle) if handle.is_alive() => return Ok(handle.clone()),
                ConnState::Connecting(rx) => rx.clone(),
                // Idle, or a handle the transport has since marked dead
                _ => {
                    let (tx, rx) = watch::channel(None);
                    *state = ConnState::Connecting(rx.clone());
                    let inner = Arc::clone(&self.inner);
                    tokio::spawn(async move {
                        let result = inner.connect_once().await;
                        {
                            let mut state = inner.state.lock().await;
                            *state = match &result {
                                Ok(handle) => ConnState::Connected(handle.clone()),
                                Err(_) => ConnState::Idle,
                            };
                        }
                        // State is settled before waiters observe the result
                        let _ = tx.send(Some(result));
                    });
                    rx
                }
            }
        };

        loop {
            if let Some(result) = result_rx.borrow().clone() {
                return result;
            }
            if result_rx.changed().await.is_err() {
                return Err(SessionError::ConnectFailure(
                    "connect attempt aborted".to_string(),
                ));
            }
        }
    }

    /// Declare interest in a room; connects first if necessary
    ///
    /// Joining the same room twice sends two join commands; deduplication is
    /// the server's concern.
    pub async fn join(&self, room: &RoomId) -> Result<(), SessionError> {
        if room.id().is_empty() {
            tracing::debug!("[{}] Ignoring join with empty room id", self.inner.namespace);
            return Ok(());
        }
        let handle = self.ensure_connected().await?;
        handle.emit(room.join_event()).await
    }

    /// Withdraw interest in a room
    ///
    /// Emits only on an existing live connection; never connects just to
    /// leave. A no-op when disconnected or the id is empty.
    pub async fn leave(&self, room: &RoomId) -> Result<(), SessionError> {
        if room.id().is_empty() {
            return Ok(());
        }
        let Some(handle) = self.current_handle().await else {
            return Ok(());
        };
        handle.emit(room.leave_event()).await
    }

    /// Emit a command, connecting first if necessary
    ///
    /// Fire-and-forget: no acknowledgement is awaited. Callers validate their
    /// arguments before building the event.
    pub async fn send(&self, event: OutboundEvent) -> Result<(), SessionError> {
        let handle = self.ensure_connected().await?;
        handle.emit(event).await
    }

    /// The live handle, if this session is currently connected
    async fn current_handle(&self) -> Option<TransportHandle> {
        let state = self.inner.state.lock().await;
        match &*state {
            ConnState::Connected(handle) if handle.is_alive() => Some(handle.clone()),
            _ => None,
        }
    }
}

impl<P: TokenProvider, C: Connector> SessionInner<P, C> {
    /// One full connect attempt: token fetch, transport connect, dispatch
    /// loop spawn. Bounded by the configured connect timeout.
    async fn connect_once(&self) -> ConnectResult {
        let attempt = async {
            let token = self.provider.access_token().await?;
            self.connector
                .connect(&self.endpoint, self.namespace.as_str(), ConnectAuth { token })
                .await
        };

        let connection = match timeout(self.connect_timeout, attempt).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(
                    "[{}] Connect attempt timed out after {:?}",
                    self.namespace,
                    self.connect_timeout
                );
                return Err(SessionError::ConnectTimeout(self.connect_timeout));
            }
        };

        tracing::info!("[{}] Connected to {}", self.namespace, self.endpoint);

        let dispatcher = self.dispatcher.clone();
        let namespace = self.namespace;
        let mut inbound = connection.inbound;
        tokio::spawn(async move {
            while let Some(event) = inbound.recv().await {
                dispatcher.dispatch(event);
            }
            tracing::info!("[{}] Disconnected", namespace);
        });

        Ok(connection.handle)
    }
}
