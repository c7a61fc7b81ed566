//! Persistent stream connections serialize their requests.

use std::sync::Arc;
use std::time::Duration;

use relay_consensus::chain::ChainId;
use relay_consensus::circuit::{CircuitId, Connection, StreamCircuit};
use relay_consensus::config::{ChainConfig, CircuitConfig, FetcherConfig};
use relay_consensus::fetch::{FetchError, Fetcher, RpcRequest};
use relay_consensus::lifecycle::Session;
use relay_consensus::transport::{RelayTransport, Transport, TransportError};
use serde_json::json;
use tokio_util::sync::CancellationToken;

mod common;
use common::{start_ws_node, WsEvent};

#[tokio::test]
async fn test_second_request_waits_for_first_reply() {
    let node = start_ws_node(Duration::from_millis(100), json!("0x1")).await;
    let connection: Connection = StreamCircuit::connect(CircuitId::new("s"), node.url().parse().unwrap())
        .await
        .unwrap()
        .into();

    let transport = RelayTransport::default();
    let cancel = CancellationToken::new();
    let first = RpcRequest::new(1u64, "eth_blockNumber", vec![]);
    let second = RpcRequest::new(1u64, "eth_chainId", vec![]);

    let (a, b) = tokio::join!(
        transport.send(&connection, &first, Duration::from_secs(5), &cancel),
        transport.send(&connection, &second, Duration::from_secs(5), &cancel),
    );

    assert_eq!(a.unwrap(), json!("0x1"));
    assert_eq!(b.unwrap(), json!("0x1"));
    assert_eq!(
        node.events(),
        vec![WsEvent::Received, WsEvent::Replied, WsEvent::Received, WsEvent::Replied]
    );
}

#[tokio::test]
async fn test_queued_request_deadline_starts_at_gate() {
    let node = start_ws_node(Duration::from_millis(300), json!("0x3")).await;
    let connection: Connection = StreamCircuit::connect(CircuitId::new("s"), node.url().parse().unwrap())
        .await
        .unwrap()
        .into();

    let transport = RelayTransport::default();
    let cancel = CancellationToken::new();
    let first = RpcRequest::new(1u64, "eth_blockNumber", vec![]);
    let second = RpcRequest::new(1u64, "eth_blockNumber", vec![]);

    // The second reply lands about 600ms after both were issued, past the
    // 450ms timeout, but only about 300ms after the second request held the gate.
    let (a, b) = tokio::join!(
        transport.send(&connection, &first, Duration::from_millis(450), &cancel),
        transport.send(&connection, &second, Duration::from_millis(450), &cancel),
    );

    assert_eq!(a.unwrap(), json!("0x3"));
    assert_eq!(b.unwrap(), json!("0x3"));
}

#[tokio::test]
async fn test_cancelled_request_leaves_gate_queue() {
    let node = start_ws_node(Duration::from_millis(300), json!("0x4")).await;
    let connection: Connection = StreamCircuit::connect(CircuitId::new("s"), node.url().parse().unwrap())
        .await
        .unwrap()
        .into();

    let transport = RelayTransport::default();
    let request = RpcRequest::new(1u64, "eth_blockNumber", vec![]);
    let holder = CancellationToken::new();
    let waiter = CancellationToken::new();

    let trigger = waiter.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let (held, queued) = tokio::join!(
        transport.send(&connection, &request, Duration::from_secs(5), &holder),
        async {
            let outcome = transport
                .send(&connection, &request, Duration::from_secs(5), &waiter)
                .await;
            (outcome, started.elapsed())
        },
    );

    assert_eq!(held.unwrap(), json!("0x4"));
    let (outcome, waited) = queued;
    assert_eq!(
        outcome.unwrap_err(),
        FetchError::Transport(TransportError::Cancelled)
    );
    assert!(waited < Duration::from_millis(250));
}

#[tokio::test]
async fn test_stream_gate_released_after_timeout() {
    let node = start_ws_node(Duration::from_millis(300), json!("0x2")).await;
    let connection: Connection = StreamCircuit::connect(CircuitId::new("s"), node.url().parse().unwrap())
        .await
        .unwrap()
        .into();

    let transport = RelayTransport::default();
    let cancel = CancellationToken::new();
    let request = RpcRequest::new(1u64, "eth_blockNumber", vec![]);

    let timed_out = transport
        .send(&connection, &request, Duration::from_millis(50), &cancel)
        .await;
    assert!(timed_out.is_err());

    // The late reply to the abandoned request carries a different id and is skipped.
    let answered = transport
        .send(&connection, &request, Duration::from_secs(5), &cancel)
        .await;
    assert_eq!(answered.unwrap(), json!("0x2"));
}

#[tokio::test]
async fn test_stream_and_url_circuits_agree() {
    let ws = start_ws_node(Duration::from_millis(10), json!("0x64")).await;
    let http = common::start_fixed_node(json!("0x64")).await;

    let mut config = FetcherConfig::default();
    config.chains.push(ChainConfig {
        chain_id: ChainId(1),
        circuits: vec![
            CircuitConfig {
                name: "stream".into(),
                proxy: None,
                endpoints: vec![ws.url()],
            },
            CircuitConfig {
                name: "url".into(),
                proxy: None,
                endpoints: vec![http.url()],
            },
        ],
    });

    let session = Arc::new(Session::connect(&config).await.unwrap());
    let fetcher = Fetcher::from_config(session.clone(), &config.fetch);

    let payload = fetcher
        .fetch(&RpcRequest::new(1u64, "eth_blockNumber", vec![]), None)
        .await
        .unwrap();
    assert_eq!(payload, json!("0x64"));
    assert_eq!(http.hits(), 1);

    drop(fetcher);
    if let Ok(session) = Arc::try_unwrap(session) {
        session.close().await;
    }
}
