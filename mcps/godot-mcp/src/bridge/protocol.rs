//! Wire frames exchanged with the Godot editor plugin
//!
//! Requests: `{"id": "cmd_1", "command": "read_file", "params": {...}}`
//!
//! Responses: `{"id": "cmd_1", "success": true, "result": ...}` or
//! `{"id": "cmd_1", "success": false, "error": "..."}`

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
struct RequestFrame<'a> {
    id: &'a str,
    command: &'a str,
    params: &'a Value,
}

#[derive(Debug, Deserialize)]
struct RawResponse {
    success: bool,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

/// A decoded response frame
#[derive(Debug, PartialEq)]
pub struct Response {
    pub id: String,
    /// `Ok(result)` on success, `Err(message)` when Godot reported a failure
    pub outcome: Result<Value, String>,
}

/// A frame that is not a valid response
///
/// `id` is kept when it could be recovered, so the matching caller can be
/// failed instead of waiting for its timeout.
#[derive(Debug, PartialEq)]
pub struct FrameError {
    pub id: Option<String>,
    pub reason: String,
}

pub fn encode_request(id: &str, command: &str, params: &Value) -> serde_json::Result<String> {
    serde_json::to_string(&RequestFrame {
        id,
        command,
        params,
    })
}

pub fn decode_response(text: &str) -> Result<Response, FrameError> {
    let value: Value = serde_json::from_str(text).map_err(|e| FrameError {
        id: None,
        reason: format!("invalid JSON: {}", e),
    })?;

    let id = match value.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => {
            return Err(FrameError {
                id: None,
                reason: "frame has no correlation id".to_string(),
            })
        }
    };

    let raw: RawResponse = serde_json::from_value(value).map_err(|e| FrameError {
        id: Some(id.clone()),
        reason: format!("malformed response: {}", e),
    })?;

    let outcome = if raw.success {
        Ok(raw.result)
    } else {
        Err(raw.error.unwrap_or_else(|| "Unknown error".to_string()))
    };
    Ok(Response { id, outcome })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_request_shape() {
        let frame = encode_request("cmd_7", "read_file", &json!({"identifier": "res://a.txt"}))
            .unwrap();
        let value: Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(
            value,
            json!({"id": "cmd_7", "command": "read_file", "params": {"identifier": "res://a.txt"}})
        );
    }

    #[test]
    fn test_decode_success() {
        let response =
            decode_response(r#"{"id":"cmd_1","success":true,"result":{"content":"X"}}"#).unwrap();
        assert_eq!(response.id, "cmd_1");
        assert_eq!(response.outcome, Ok(json!({"content": "X"})));
    }

    #[test]
    fn test_decode_success_without_result_is_null() {
        let response = decode_response(r#"{"id":"cmd_2","success":true}"#).unwrap();
        assert_eq!(response.outcome, Ok(Value::Null));
    }

    #[test]
    fn test_decode_remote_failure() {
        let response =
            decode_response(r#"{"id":"cmd_3","success":false,"error":"no such node"}"#).unwrap();
        assert_eq!(response.outcome, Err("no such node".to_string()));

        let response = decode_response(r#"{"id":"cmd_4","success":false}"#).unwrap();
        assert_eq!(response.outcome, Err("Unknown error".to_string()));
    }

    #[test]
    fn test_decode_numeric_id() {
        let response = decode_response(r#"{"id":12,"success":true,"result":1}"#).unwrap();
        assert_eq!(response.id, "12");
    }

    #[test]
    fn test_decode_malformed_keeps_id() {
        let err = decode_response(r#"{"id":"cmd_5","result":1}"#).unwrap_err();
        assert_eq!(err.id.as_deref(), Some("cmd_5"));
    }

    #[test]
    fn test_decode_without_id() {
        let err = decode_response(r#"{"event":"scene_changed"}"#).unwrap_err();
        assert!(err.id.is_none());

        let err = decode_response("not json").unwrap_err();
        assert!(err.id.is_none());
        assert!(err.reason.starts_with("invalid JSON"));
    }
}
