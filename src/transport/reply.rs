//! JSON-RPC 2.0 reply parsing shared by both connection kinds.

use serde_json::Value;

use crate::fetch::Payload;
use crate::transport::TransportError;

/// Generate a fresh request id. Random, so ids do not correlate requests across circuits.
pub(crate) fn next_request_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Id carried by a reply, if it is a string id.
pub(crate) fn reply_id(reply: &Value) -> Option<&str> {
    reply.get("id").and_then(Value::as_str)
}

/// Extract the `result` of a reply to the request with id `expected_id`.
pub(crate) fn extract_result(reply: Value, expected_id: &str) -> Result<Payload, TransportError> {
    let Value::Object(mut fields) = reply else {
        return Err(TransportError::Malformed("reply is not an object".to_string()));
    };

    match fields.get("id").and_then(Value::as_str) {
        Some(id) if id == expected_id => {}
        Some(_) => return Err(TransportError::Malformed("reply id mismatch".to_string())),
        None => return Err(TransportError::Malformed("reply has no string id".to_string())),
    }

    if let Some(error) = fields.remove("error") {
        let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        return Err(TransportError::Rpc { code, message });
    }

    fields
        .remove("result")
        .ok_or_else(|| TransportError::Malformed("reply has neither result nor error".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_extracted() {
        let reply = json!({"jsonrpc": "2.0", "id": "abc", "result": "0x2a"});
        assert_eq!(extract_result(reply, "abc").unwrap(), json!("0x2a"));
    }

    #[test]
    fn test_null_result_is_a_payload() {
        let reply = json!({"jsonrpc": "2.0", "id": "abc", "result": null});
        assert_eq!(extract_result(reply, "abc").unwrap(), Value::Null);
    }

    #[test]
    fn test_rpc_error_mapped() {
        let reply = json!({"jsonrpc": "2.0", "id": "abc", "error": {"code": -32601, "message": "nope"}});
        assert_eq!(
            extract_result(reply, "abc").unwrap_err(),
            TransportError::Rpc { code: -32601, message: "nope".into() }
        );
    }

    #[test]
    fn test_malformed_replies() {
        assert!(matches!(
            extract_result(json!([1, 2]), "abc"),
            Err(TransportError::Malformed(_))
        ));
        assert!(matches!(
            extract_result(json!({"id": "other", "result": 1}), "abc"),
            Err(TransportError::Malformed(_))
        ));
        assert!(matches!(
            extract_result(json!({"id": "abc"}), "abc"),
            Err(TransportError::Malformed(_))
        ));
    }

    #[test]
    fn test_request_ids_are_unique() {
        assert_ne!(next_request_id(), next_request_id());
    }
}
