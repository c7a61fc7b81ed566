//! One-shot HTTP exchanges on a `UrlCircuit`.

use serde_json::Value;

use crate::circuit::UrlCircuit;
use crate::fetch::{Payload, RpcRequest};
use crate::transport::reply::{extract_result, next_request_id};
use crate::transport::TransportError;

/// POST `request` to the connection's endpoint and return the reply's result.
pub async fn exchange(connection: &UrlCircuit, request: &RpcRequest) -> Result<Payload, TransportError> {
    let id = next_request_id();
    let response = connection
        .client()
        .post(connection.endpoint().clone())
        .json(&request.envelope(&id))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(TransportError::Status(status.as_u16()));
    }

    let reply: Value = response.json().await?;
    extract_result(reply, &id)
}
