//! Shared mock nodes for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// How a mock node answers one request.
#[derive(Debug, Clone)]
pub enum NodeReply {
    Result(Value),
    Error { code: i64, message: String },
    Status(u16),
    Hang,
}

/// A running mock JSON-RPC node.
pub struct MockNode {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl MockNode {
    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Start an HTTP JSON-RPC node whose answers come from `handler(method, params)`.
pub async fn start_rpc_node<F>(handler: F) -> MockNode
where
    F: Fn(&str, &[Value]) -> NodeReply + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let handler = Arc::new(handler);

    let counter = hits.clone();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let handler = handler.clone();
            let counter = counter.clone();
            tokio::spawn(async move {
                let Some(request) = read_request(&mut socket).await else {
                    return;
                };
                counter.fetch_add(1, Ordering::SeqCst);

                let method = request["method"].as_str().unwrap_or_default().to_string();
                let params = request["params"].as_array().cloned().unwrap_or_default();
                let (status, body) = match handler(&method, &params) {
                    NodeReply::Result(result) => (
                        200,
                        json!({"jsonrpc": "2.0", "id": request["id"], "result": result}).to_string(),
                    ),
                    NodeReply::Error { code, message } => (
                        200,
                        json!({"jsonrpc": "2.0", "id": request["id"], "error": {"code": code, "message": message}})
                            .to_string(),
                    ),
                    NodeReply::Status(status) => (status, "upstream failure".to_string()),
                    NodeReply::Hang => {
                        tokio::time::sleep(Duration::from_secs(3600)).await;
                        return;
                    }
                };

                let status_text = match status {
                    200 => "200 OK",
                    429 => "429 Too Many Requests",
                    500 => "500 Internal Server Error",
                    502 => "502 Bad Gateway",
                    503 => "503 Service Unavailable",
                    _ => "500 Internal Server Error",
                };
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_text,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    MockNode { addr, hits }
}

/// Node that answers every method with `result`.
pub async fn start_fixed_node(result: Value) -> MockNode {
    start_rpc_node(move |_, _| NodeReply::Result(result.clone())).await
}

async fn read_request(socket: &mut TcpStream) -> Option<Value> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    serde_json::from_slice(&buf[header_end..header_end + length]).ok()
}

/// What a WebSocket node observed, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WsEvent {
    Received,
    Replied,
}

/// A running mock WebSocket JSON-RPC node.
pub struct WsNode {
    pub addr: SocketAddr,
    events: Arc<Mutex<Vec<WsEvent>>>,
}

impl WsNode {
    pub fn url(&self) -> String {
        format!("ws://{}/", self.addr)
    }

    pub fn events(&self) -> Vec<WsEvent> {
        self.events.lock().unwrap().clone()
    }
}

/// Start a WebSocket node that answers every request with `result` after `delay`.
///
/// Frames are read as soon as they arrive, independently of replies, so the
/// event log shows whether a client waited before sending its next frame.
pub async fn start_ws_node(delay: Duration, result: Value) -> WsNode {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let events = Arc::new(Mutex::new(Vec::new()));

    let log = events.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let log = log.clone();
            let result = result.clone();
            tokio::spawn(async move {
                let Ok(ws) = tokio_tungstenite::accept_async(socket).await else {
                    return;
                };
                let (mut sink, mut stream) = ws.split();
                let (tx, mut rx) = mpsc::unbounded_channel::<Value>();

                let replies = {
                    let log = log.clone();
                    tokio::spawn(async move {
                        while let Some(request) = rx.recv().await {
                            tokio::time::sleep(delay).await;
                            let reply = json!({"jsonrpc": "2.0", "id": request["id"], "result": result});
                            log.lock().unwrap().push(WsEvent::Replied);
                            if sink.send(Message::Text(reply.to_string().into())).await.is_err() {
                                break;
                            }
                        }
                    })
                };

                while let Some(Ok(message)) = stream.next().await {
                    if let Message::Text(text) = message {
                        let Ok(request) = serde_json::from_str::<Value>(text.as_str()) else {
                            continue;
                        };
                        log.lock().unwrap().push(WsEvent::Received);
                        if tx.send(request).is_err() {
                            break;
                        }
                    }
                }
                drop(tx);
                let _ = replies.await;
            });
        }
    });

    WsNode { addr, events }
}
