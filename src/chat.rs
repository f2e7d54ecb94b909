//! Booking chat client
//!
//! Thin typed façade over a [`Session`] on the `chat` namespace. Commands
//! validate their arguments locally and silently drop malformed intent (an
//! empty booking id, blank message text) instead of erroring; connect-time
//! failures still propagate.

use std::time::Duration;

use crate::auth::TokenProvider;
use crate::config::RealtimeConfig;
use crate::protocol::{ChatMessage, OutboundEvent};
use crate::session::{Namespace, RoomId, Session, SessionError, Subscription};
use crate::transport::Connector;

/// Client for per-booking chat rooms
pub struct ChatClient<P, C> {
    session: Session<P, C>,
}

impl<P: TokenProvider, C: Connector> ChatClient<P, C> {
    /// Build a chat client against an explicit endpoint
    pub fn new(
        provider: P,
        connector: C,
        endpoint: impl Into<String>,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            session: Session::new(provider, connector, endpoint, Namespace::Chat, connect_timeout),
        }
    }

    /// Build a chat client from the application config
    pub fn from_config(config: &RealtimeConfig, provider: P, connector: C) -> Self {
        Self::new(
            provider,
            connector,
            config.endpoint_for(Namespace::Chat),
            config.connect_timeout(),
        )
    }

    /// Receive every chat message pushed on this session
    pub fn subscribe_to_messages(
        &self,
        listener: impl Fn(&ChatMessage) + Send + Sync + 'static,
    ) -> Subscription {
        self.session.dispatcher().subscribe_messages(listener)
    }

    /// Receive server-pushed error notifications
    pub fn subscribe_to_errors(
        &self,
        listener: impl Fn(&String) + Send + Sync + 'static,
    ) -> Subscription {
        self.session.dispatcher().subscribe_errors(listener)
    }

    /// Join the chat room for a booking, connecting first if necessary
    pub async fn join_booking_room(&self, booking_id: &str) -> Result<(), SessionError> {
        self.session
            .join(&RoomId::Booking(booking_id.to_string()))
            .await
    }

    /// Leave the chat room for a booking; never connects just to leave
    pub async fn leave_booking_room(&self, booking_id: &str) -> Result<(), SessionError> {
        self.session
            .leave(&RoomId::Booking(booking_id.to_string()))
            .await
    }

    /// Send a chat message to a booking room
    ///
    /// Dropped without error when the booking id is empty or the content is
    /// blank.
    pub async fn send_booking_message(
        &self,
        booking_id: &str,
        content: &str,
    ) -> Result<(), SessionError> {
        if booking_id.is_empty() || content.trim().is_empty() {
            tracing::debug!("[chat] Dropping malformed send_message");
            return Ok(());
        }
        self.session
            .send(OutboundEvent::SendMessage {
                booking_id: booking_id.to_string(),
                content: content.to_string(),
            })
            .await
    }

    /// Request the message history for a booking room
    ///
    /// The history arrives asynchronously as `new_message` events.
    pub async fn request_booking_messages(&self, booking_id: &str) -> Result<(), SessionError> {
        if booking_id.is_empty() {
            return Ok(());
        }
        self.session
            .send(OutboundEvent::GetMessages {
                booking_id: booking_id.to_string(),
            })
            .await
    }
}
