//! Event types carried over the realtime namespaces

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sent once by the client immediately after the transport opens.
///
/// The credential is attached here, at connect time; it is never re-sent on
/// an established connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectRequest {
    pub protocol_version: u32,
    /// Namespace path being joined ("chat" or "tracking")
    pub namespace: String,
    /// Opaque access token from the token provider
    pub token: String,
}

/// Server response to a [`ConnectRequest`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ConnectAck {
    /// Handshake accepted
    Welcome {
        session_id: Uuid,
        protocol_version: u32,
    },

    /// Handshake refused (bad token, unknown namespace)
    Refused { reason: String },
}

/// Events emitted by the client
///
/// Tagged with the event name the server routes on. All sends are
/// fire-and-forget; confirmations, if any, arrive as [`InboundEvent`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum OutboundEvent {
    /// Join the per-booking chat room
    JoinBooking { booking_id: String },

    /// Leave the per-booking chat room
    LeaveBooking { booking_id: String },

    /// Send a chat message to a booking room
    SendMessage { booking_id: String, content: String },

    /// Request message history for a booking room
    GetMessages { booking_id: String },

    /// Join the per-trip tracking room
    JoinTrip { trip_id: String },

    /// Leave the per-trip tracking room
    LeaveTrip { trip_id: String },

    /// Publish the driver's current position for a trip
    DriverLocationUpdate {
        trip_id: String,
        coordinates: (f64, f64),
    },

    /// Request the last known driver position for a trip
    GetDriverLocation { trip_id: String },
}

/// Events pushed by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum InboundEvent {
    /// A new chat message in a joined booking room
    NewMessage(ChatMessage),

    /// A driver position update in a joined trip room
    DriverLocation(DriverLocationUpdate),

    /// Server-side error notification; not tied to any outstanding call
    Error { message: Option<String> },
}

/// A chat message as delivered to booking-room members
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub booking_id: String,
    pub sender_id: String,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

/// A driver position update as delivered to trip-room members
///
/// Coordinates are `None` while the driver has not reported a position yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverLocationUpdate {
    pub trip_id: String,
    pub coordinates: Option<(f64, f64)>,
    pub updated_at: Option<DateTime<Utc>>,
}
