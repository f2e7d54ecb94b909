//! Shared test doubles: scripted token providers and transports

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use ridelink::auth::{AuthError, TokenProvider};
use ridelink::protocol::{InboundEvent, OutboundEvent};
use ridelink::session::SessionError;
use ridelink::transport::{ConnectAuth, Connection, Connector, TransportHandle};

/// Token provider that counts fetches and can be told to fail
#[derive(Clone)]
pub struct CountingProvider {
    token: String,
    fail: bool,
    fetches: Arc<AtomicUsize>,
}

impl CountingProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            fail: false,
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            token: String::new(),
            fail: true,
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl TokenProvider for CountingProvider {
    async fn access_token(&self) -> Result<String, AuthError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AuthError::Unavailable("not signed in".to_string()));
        }
        Ok(self.token.clone())
    }
}

/// The test-side ends of one fake connection
pub struct FakeLink {
    /// Events the session emitted
    pub outbound: mpsc::Receiver<OutboundEvent>,
    /// Feed events to the session as if the server pushed them
    pub inbound: mpsc::Sender<InboundEvent>,
    /// Token the session attached at connect time
    pub token: String,
    alive: watch::Sender<bool>,
}

impl FakeLink {
    /// Simulate a transport-level disconnect
    pub fn kill(&self) {
        let _ = self.alive.send(false);
    }
}

struct FakeState {
    attempts: AtomicUsize,
    delay: Duration,
    fail: bool,
    links: Mutex<VecDeque<FakeLink>>,
}

/// Connector that hands out in-memory connections the test can script
#[derive(Clone)]
pub struct FakeConnector {
    inner: Arc<FakeState>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    /// Connect attempts suspend for `delay` before completing, so concurrent
    /// callers genuinely overlap
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            inner: Arc::new(FakeState {
                attempts: AtomicUsize::new(0),
                delay,
                fail: false,
                links: Mutex::new(VecDeque::new()),
            }),
        }
    }

    pub fn failing() -> Self {
        Self::failing_with_delay(Duration::ZERO)
    }

    pub fn failing_with_delay(delay: Duration) -> Self {
        Self {
            inner: Arc::new(FakeState {
                attempts: AtomicUsize::new(0),
                delay,
                fail: true,
                links: Mutex::new(VecDeque::new()),
            }),
        }
    }

    /// How many connect attempts have been made
    pub fn attempts(&self) -> usize {
        self.inner.attempts.load(Ordering::SeqCst)
    }

    /// Take the oldest established connection's test-side ends
    pub fn take_link(&self) -> Option<FakeLink> {
        self.inner.links.lock().unwrap().pop_front()
    }
}

impl Connector for FakeConnector {
    async fn connect(
        &self,
        _endpoint: &str,
        _namespace: &str,
        auth: ConnectAuth,
    ) -> Result<Connection, SessionError> {
        self.inner.attempts.fetch_add(1, Ordering::SeqCst);
        if self.inner.delay > Duration::ZERO {
            tokio::time::sleep(self.inner.delay).await;
        }
        if self.inner.fail {
            return Err(SessionError::ConnectFailure("connection refused".to_string()));
        }

        let (outbound_tx, outbound_rx) = mpsc::channel(64);
        let (inbound_tx, inbound_rx) = mpsc::channel(64);
        let (handle, alive) = TransportHandle::new(outbound_tx);

        self.inner.links.lock().unwrap().push_back(FakeLink {
            outbound: outbound_rx,
            inbound: inbound_tx,
            token: auth.token,
            alive,
        });

        Ok(Connection {
            handle,
            inbound: inbound_rx,
        })
    }
}
