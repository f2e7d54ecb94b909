//! Framed-TCP transport
//!
//! One TCP stream per namespace. The client opens the stream, performs the
//! [`ConnectRequest`]/[`ConnectAck`] handshake carrying the access token, then
//! splits the stream into a writer task (draining the outbound event channel)
//! and a reader task (decoding inbound frames). Either task ending marks the
//! handle dead and closes the inbound channel.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};

use crate::protocol::{
    deserialize, frame_event, serialize, ConnectAck, ConnectRequest, InboundEvent, OutboundEvent,
    ProtocolError, MAX_FRAME_SIZE, PROTOCOL_VERSION,
};
use crate::session::SessionError;

use super::{
    ConnectAuth, Connection, Connector, TransportHandle, INBOUND_CHANNEL_CAPACITY,
    OUTBOUND_CHANNEL_CAPACITY,
};

/// Connector that opens length-prefixed MessagePack streams over TCP
#[derive(Debug, Clone, Default)]
pub struct TcpConnector;

impl TcpConnector {
    pub fn new() -> Self {
        Self
    }
}

impl Connector for TcpConnector {
    async fn connect(
        &self,
        endpoint: &str,
        namespace: &str,
        auth: ConnectAuth,
    ) -> Result<Connection, SessionError> {
        let mut stream = TcpStream::connect(endpoint)
            .await
            .map_err(|e| SessionError::ConnectFailure(format!("tcp connect: {}", e)))?;

        let request = ConnectRequest {
            protocol_version: PROTOCOL_VERSION,
            namespace: namespace.to_string(),
            token: auth.token,
        };
        handshake(&mut stream, &request)
            .await
            .map_err(|e| SessionError::ConnectFailure(e.to_string()))?;

        let (reader, writer) = stream.into_split();
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CHANNEL_CAPACITY);
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CHANNEL_CAPACITY);
        let (handle, alive_tx) = TransportHandle::new(outbound_tx);
        let alive_tx = Arc::new(alive_tx);

        tokio::spawn(writer_task(writer, outbound_rx, Arc::clone(&alive_tx)));
        tokio::spawn(reader_task(reader, inbound_tx, alive_tx));

        Ok(Connection {
            handle,
            inbound: inbound_rx,
        })
    }
}

/// Perform the connect handshake on a fresh stream
async fn handshake(stream: &mut TcpStream, request: &ConnectRequest) -> Result<()> {
    let payload = serialize(request)?;
    write_event(stream, &payload).await?;

    let ack_bytes = read_event(stream)
        .await?
        .ok_or_else(|| anyhow!("Connection closed during handshake"))?;
    match deserialize::<ConnectAck>(&ack_bytes)? {
        ConnectAck::Welcome { session_id, .. } => {
            tracing::info!("Connected to namespace '{}' (session {})", request.namespace, session_id);
            Ok(())
        }
        ConnectAck::Refused { reason } => Err(anyhow!(ProtocolError::Rejected(reason))),
    }
}

/// Read a length-prefixed event from a stream
pub async fn read_event<R: AsyncReadExt + Unpin>(reader: &mut R) -> Result<Option<Vec<u8>>> {
    let mut len_bytes = [0u8; 4];

    match reader.read_exact(&mut len_bytes).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_be_bytes(len_bytes);
    if len > MAX_FRAME_SIZE {
        return Err(anyhow!("Frame too large: {} bytes", len));
    }

    let mut buffer = vec![0u8; len as usize];
    reader.read_exact(&mut buffer).await?;

    Ok(Some(buffer))
}

/// Write a length-prefixed event to a stream
pub async fn write_event<W: AsyncWriteExt + Unpin>(writer: &mut W, payload: &[u8]) -> Result<()> {
    let framed = frame_event(payload);
    writer.write_all(&framed).await?;
    writer.flush().await?;
    Ok(())
}

/// Task draining outbound events onto the wire
async fn writer_task<W: AsyncWriteExt + Unpin>(
    mut writer: W,
    mut outbound: mpsc::Receiver<OutboundEvent>,
    alive: Arc<watch::Sender<bool>>,
) {
    while let Some(event) = outbound.recv().await {
        match serialize(&event) {
            Ok(payload) => {
                if let Err(e) = write_event(&mut writer, &payload).await {
                    tracing::error!("Failed to write event: {}", e);
                    break;
                }
            }
            Err(e) => {
                tracing::error!("Failed to serialize event: {}", e);
            }
        }
    }

    let _ = alive.send(false);
    tracing::debug!("Transport writer task finished");
}

/// Task decoding inbound frames and forwarding them to the session
async fn reader_task<R: AsyncReadExt + Unpin>(
    mut reader: R,
    inbound: mpsc::Sender<InboundEvent>,
    alive: Arc<watch::Sender<bool>>,
) {
    loop {
        match read_event(&mut reader).await {
            Ok(Some(bytes)) => match deserialize::<InboundEvent>(&bytes) {
                Ok(event) => {
                    if inbound.send(event).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    // Unknown events from newer servers are skipped, not fatal
                    tracing::warn!("Dropping undecodable inbound event: {}", e);
                }
            },
            Ok(None) => {
                tracing::info!("Transport closed by server");
                break;
            }
            Err(e) => {
                tracing::error!("Transport read error: {}", e);
                break;
            }
        }
    }

    let _ = alive.send(false);
    tracing::debug!("Transport reader task finished");
}
