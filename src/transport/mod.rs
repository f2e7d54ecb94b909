//! Transport abstraction for realtime sessions
//!
//! The session layer treats the underlying connection as a capability: it can
//! be opened with a credential, events can be emitted on it, inbound events
//! arrive on a channel, and it reports loss of liveness. Keep-alive and
//! transport-internal reconnection are the transport's own business; the
//! session never recreates a handle that still reports itself alive.

pub mod tcp;

pub use tcp::TcpConnector;

use std::future::Future;

use tokio::sync::{mpsc, watch};

use crate::protocol::{InboundEvent, OutboundEvent};
use crate::session::SessionError;

/// Capacity of the outbound event channel per connection
pub const OUTBOUND_CHANNEL_CAPACITY: usize = 64;

/// Capacity of the inbound event channel per connection
pub const INBOUND_CHANNEL_CAPACITY: usize = 256;

/// Credential attached when opening a transport
#[derive(Debug, Clone)]
pub struct ConnectAuth {
    pub token: String,
}

/// Opens authenticated connections to a namespace endpoint
///
/// Implemented by [`TcpConnector`] in production and by scripted fakes in
/// tests, so the session's coalescing and state machine are testable without
/// a server.
pub trait Connector: Send + Sync + 'static {
    /// Open a connection to `<endpoint>/<namespace>` authenticated with `auth`
    fn connect(
        &self,
        endpoint: &str,
        namespace: &str,
        auth: ConnectAuth,
    ) -> impl Future<Output = Result<Connection, SessionError>> + Send;
}

/// A freshly opened connection: the cloneable handle plus the inbound stream
///
/// The inbound receiver is handed to the session's dispatch loop exactly once;
/// the handle may be cloned freely by callers issuing outbound events.
pub struct Connection {
    pub handle: TransportHandle,
    pub inbound: mpsc::Receiver<InboundEvent>,
}

/// Cheap, cloneable handle to a live connection
///
/// Events emitted by one caller are delivered to the transport in emit order.
#[derive(Debug, Clone)]
pub struct TransportHandle {
    outbound: mpsc::Sender<OutboundEvent>,
    alive: watch::Receiver<bool>,
}

impl TransportHandle {
    /// Create a handle and the liveness flag its transport flips on disconnect
    pub fn new(outbound: mpsc::Sender<OutboundEvent>) -> (Self, watch::Sender<bool>) {
        let (alive_tx, alive_rx) = watch::channel(true);
        (
            Self {
                outbound,
                alive: alive_rx,
            },
            alive_tx,
        )
    }

    /// Whether the transport still considers this connection live
    pub fn is_alive(&self) -> bool {
        *self.alive.borrow()
    }

    /// Queue an event for delivery to the server
    pub async fn emit(&self, event: OutboundEvent) -> Result<(), SessionError> {
        self.outbound
            .send(event)
            .await
            .map_err(|_| SessionError::NotConnected)
    }
}
