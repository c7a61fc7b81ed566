//! Gated exchanges on a persistent `StreamCircuit`.
//!
//! The caller holds the connection's gate for the whole exchange: from before
//! the request frame is written until the matching reply has been read. The
//! guard is released when the caller drops it (reply, timeout, cancellation).

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio_tungstenite::tungstenite::Message;

use crate::circuit::{StreamCircuit, WsStream};
use crate::fetch::{Payload, RpcRequest};
use crate::transport::reply::{extract_result, next_request_id, reply_id};
use crate::transport::TransportError;

/// Send `request` on `socket`, the gated socket of `connection`, and wait for its reply.
pub async fn exchange(
    socket: &mut WsStream,
    connection: &StreamCircuit,
    request: &RpcRequest,
) -> Result<Payload, TransportError> {
    let id = next_request_id();
    let frame = request.envelope(&id).to_string();
    socket.send(Message::Text(frame.into())).await?;

    loop {
        let Some(message) = socket.next().await else {
            return Err(TransportError::Closed);
        };

        let reply: Value = match message? {
            Message::Text(text) => parse(text.as_bytes())?,
            Message::Binary(bytes) => parse(&bytes)?,
            Message::Close(_) => return Err(TransportError::Closed),
            // Ping/pong are answered by tungstenite itself.
            _ => continue,
        };

        // Frames left over from an earlier, abandoned request, or notifications.
        if reply_id(&reply) != Some(id.as_str()) {
            tracing::trace!(connection_id = %connection.id(), "Skipping unrelated frame");
            continue;
        }

        return extract_result(reply, &id);
    }
}

fn parse(bytes: &[u8]) -> Result<Value, TransportError> {
    serde_json::from_slice(bytes).map_err(|e| TransportError::Malformed(e.to_string()))
}
