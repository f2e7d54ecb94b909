//! Wire protocol for the realtime namespaces
//!
//! Uses MessagePack for efficient binary serialization. Frames are
//! length-prefixed so events can be streamed over an ordered transport.

mod event;

pub use event::{
    ChatMessage, ConnectAck, ConnectRequest, DriverLocationUpdate, InboundEvent, OutboundEvent,
};

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Protocol version for compatibility checking
pub const PROTOCOL_VERSION: u32 = 1;

/// Protocol-specific errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Protocol version mismatch: client={client}, server={server}")]
    VersionMismatch { client: u32, server: u32 },

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    #[error("Frame too large: {size} bytes (max: {max})")]
    FrameTooLarge { size: u32, max: u32 },

    #[error("Connection rejected by server: {0}")]
    Rejected(String),
}

/// Maximum frame size; realtime events are small, anything bigger is garbage (1 MB)
pub const MAX_FRAME_SIZE: u32 = 1024 * 1024;

/// Serialize an event to MessagePack bytes
pub fn serialize<T: Serialize>(event: &T) -> Result<Vec<u8>> {
    Ok(rmp_serde::to_vec_named(event)?)
}

/// Deserialize an event from MessagePack bytes
pub fn deserialize<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T> {
    rmp_serde::from_slice(bytes).map_err(|e| {
        anyhow!(ProtocolError::MalformedEvent(format!(
            "Failed to deserialize: {}",
            e
        )))
    })
}

/// Frame an event payload with a length prefix for streaming
///
/// Frame format: [4-byte length BE][payload]
pub fn frame_event(payload: &[u8]) -> Vec<u8> {
    let len = payload.len() as u32;
    let mut framed = Vec::with_capacity(4 + payload.len());
    framed.extend_from_slice(&len.to_be_bytes());
    framed.extend_from_slice(payload);
    framed
}

/// Unframe an event from a byte buffer
///
/// Returns (payload, remaining_bytes) on success, or None if not enough data
pub fn unframe_event(buffer: &[u8]) -> Result<Option<(Vec<u8>, &[u8])>> {
    // Need at least 4 bytes for length prefix
    if buffer.len() < 4 {
        return Ok(None);
    }

    let length_bytes: [u8; 4] = buffer[0..4]
        .try_into()
        .map_err(|_| anyhow!(ProtocolError::InvalidFrame("Invalid length prefix".into())))?;
    let frame_length = u32::from_be_bytes(length_bytes);

    if frame_length > MAX_FRAME_SIZE {
        bail!(ProtocolError::FrameTooLarge {
            size: frame_length,
            max: MAX_FRAME_SIZE
        });
    }

    let total_length = 4 + frame_length as usize;
    if buffer.len() < total_length {
        return Ok(None);
    }

    let payload = buffer[4..total_length].to_vec();
    let remaining = &buffer[total_length..];

    Ok(Some((payload, remaining)))
}

/// Check if client and server protocol versions are compatible
pub fn check_version_compatibility(client_version: u32, server_version: u32) -> Result<()> {
    if client_version != server_version {
        bail!(ProtocolError::VersionMismatch {
            client: client_version,
            server: server_version
        });
    }
    Ok(())
}

/// Serialize and frame an event in one operation
pub fn serialize_and_frame<T: Serialize>(event: &T) -> Result<Vec<u8>> {
    let payload = serialize(event)?;
    Ok(frame_event(&payload))
}

/// Unframe and deserialize an event in one operation
///
/// Returns the decoded event and the number of bytes consumed from the buffer.
pub fn unframe_and_deserialize<T>(buffer: &[u8]) -> Result<Option<(T, usize)>>
where
    T: for<'de> Deserialize<'de>,
{
    match unframe_event(buffer)? {
        Some((payload, remaining)) => {
            let event = deserialize(&payload)?;
            let consumed = buffer.len() - remaining.len();
            Ok(Some((event, consumed)))
        }
        None => Ok(None),
    }
}
