//! JSON-RPC 2.0 envelope codec
//!
//! Parses raw request bodies into validated [`Request`]s, builds success and
//! error [`Response`]s, and defines the five protocol error codes. Nothing in
//! here performs I/O.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Protocol version every envelope carries
pub const JSONRPC_VERSION: &str = "2.0";

/// Malformed payload
pub const PARSE_ERROR: i64 = -32700;
/// Structurally invalid envelope
pub const INVALID_REQUEST: i64 = -32600;
/// Unknown method
pub const METHOD_NOT_FOUND: i64 = -32601;
/// Handler rejected the arguments
pub const INVALID_PARAMS: i64 = -32602;
/// Any other failure during dispatch
pub const INTERNAL_ERROR: i64 = -32603;

/// Protocol error value, carried in the `error` member of a response
#[derive(Error, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[error("JSON-RPC error {code}: {message}")]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(code: i64, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            code,
            message: message.into(),
            data,
        }
    }

    pub fn parse_error(detail: impl fmt::Display) -> Self {
        Self::new(PARSE_ERROR, "Parse error", Some(Value::String(detail.to_string())))
    }

    pub fn invalid_request(detail: impl Into<String>) -> Self {
        Self::new(INVALID_REQUEST, "Invalid Request", Some(Value::String(detail.into())))
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            METHOD_NOT_FOUND,
            "Method not found",
            Some(Value::String(format!("Method '{}' is not supported", method))),
        )
    }

    pub fn invalid_params(detail: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, "Invalid params", Some(Value::String(detail.into())))
    }

    /// Internal error; `data` carries "<category>: <message>"
    pub fn internal(category: &str, message: impl fmt::Display) -> Self {
        Self::new(
            INTERNAL_ERROR,
            "Internal error",
            Some(Value::String(format!("{}: {}", category, message))),
        )
    }
}

/// Request identifier: a string or a number
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Number(serde_json::Number),
    Str(String),
}

impl From<i64> for Id {
    fn from(value: i64) -> Self {
        Id::Number(value.into())
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Id::Str(value.to_string())
    }
}

impl From<String> for Id {
    fn from(value: String) -> Self {
        Id::Str(value)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Number(n) => write!(f, "{}", n),
            Id::Str(s) => write!(f, "{}", s),
        }
    }
}

/// Method arguments: by name or by position
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Params {
    Object(Map<String, Value>),
    Array(Vec<Value>),
}

impl Params {
    /// Wrap a JSON value; anything but an object or array yields `None`
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Params::Object(map)),
            Value::Array(items) => Some(Params::Array(items)),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        match self {
            Params::Object(map) => Some(map),
            Params::Array(_) => None,
        }
    }
}

/// Validated request envelope
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Params>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
}

impl Request {
    /// Build a call expecting a response
    pub fn call(method: impl Into<String>, id: impl Into<Id>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params: Params::from_value(params),
            id: Some(id.into()),
        }
    }

    /// Build a notification (no id, no response)
    pub fn notification(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params: Params::from_value(params),
            id: None,
        }
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Parse and validate a raw request body
pub fn parse_request(body: &[u8]) -> Result<Request, RpcError> {
    let data: Value = serde_json::from_slice(body).map_err(RpcError::parse_error)?;

    let Value::Object(mut object) = data else {
        return Err(RpcError::invalid_request("Request must be a JSON object"));
    };

    match object.get("jsonrpc") {
        None => return Err(RpcError::invalid_request("Missing 'jsonrpc' field")),
        Some(Value::String(version)) if version == JSONRPC_VERSION => {}
        Some(_) => return Err(RpcError::invalid_request("'jsonrpc' must be '2.0'")),
    }

    let method = match object.remove("method") {
        None => return Err(RpcError::invalid_request("Missing 'method' field")),
        Some(Value::String(method)) => method,
        Some(_) => return Err(RpcError::invalid_request("'method' must be a string")),
    };

    let params = match object.remove("params") {
        None | Some(Value::Null) => None,
        Some(value) => Some(
            Params::from_value(value)
                .ok_or_else(|| RpcError::invalid_request("'params' must be an object or array"))?,
        ),
    };

    let id = match object.remove("id") {
        None | Some(Value::Null) => None,
        Some(Value::String(id)) => Some(Id::Str(id)),
        Some(Value::Number(id)) => Some(Id::Number(id)),
        Some(_) => {
            return Err(RpcError::invalid_request(
                "'id' must be a string, number, or null",
            ))
        }
    };

    Ok(Request {
        jsonrpc: JSONRPC_VERSION.to_string(),
        method,
        params,
        id,
    })
}

/// Exactly one of `result` / `error`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Payload {
    Result(Value),
    Error(RpcError),
}

/// Response envelope
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Id>,
    #[serde(flatten)]
    pub payload: Payload,
}

impl Response {
    pub fn success(id: Option<Id>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            payload: Payload::Result(result),
        }
    }

    pub fn error(id: Option<Id>, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            payload: Payload::Error(error),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.payload, Payload::Error(_))
    }

    pub fn into_result(self) -> Result<Value, RpcError> {
        match self.payload {
            Payload::Result(value) => Ok(value),
            Payload::Error(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Result<Request, RpcError> {
        parse_request(&serde_json::to_vec(&value).unwrap())
    }

    #[test]
    fn test_valid_request_with_object_params() {
        let request = parse(json!({
            "jsonrpc": "2.0",
            "method": "test_method",
            "params": {"key": "value"},
            "id": 1
        }))
        .unwrap();

        assert_eq!(request.method, "test_method");
        assert_eq!(request.id, Some(Id::from(1)));
        assert_eq!(
            request.params.as_ref().and_then(Params::as_object).unwrap()["key"],
            "value"
        );
        assert!(!request.is_notification());
    }

    #[test]
    fn test_valid_request_with_array_params_and_string_id() {
        let request = parse(json!({
            "jsonrpc": "2.0",
            "method": "test_method",
            "params": [1, 2, 3],
            "id": "test-id"
        }))
        .unwrap();

        assert_eq!(request.params, Some(Params::Array(vec![json!(1), json!(2), json!(3)])));
        assert_eq!(request.id, Some(Id::from("test-id")));
    }

    #[test]
    fn test_missing_id_is_notification() {
        let request = parse(json!({"jsonrpc": "2.0", "method": "notify_me"})).unwrap();
        assert!(request.is_notification());
        assert!(request.params.is_none());

        let request = parse(json!({"jsonrpc": "2.0", "method": "notify_me", "id": null})).unwrap();
        assert!(request.is_notification());
    }

    #[test]
    fn test_malformed_body_is_parse_error() {
        let error = parse_request(b"{bad").unwrap_err();
        assert_eq!(error.code, PARSE_ERROR);
        assert_eq!(error.message, "Parse error");
        assert!(error.data.is_some());
    }

    #[test]
    fn test_structural_violations_are_invalid_request() {
        let cases = [
            json!([1, 2]),
            json!({"method": "m", "id": 1}),
            json!({"jsonrpc": "1.0", "method": "m", "id": 1}),
            json!({"jsonrpc": 2.0, "method": "m", "id": 1}),
            json!({"jsonrpc": "2.0", "id": 1}),
            json!({"jsonrpc": "2.0", "method": 5, "id": 1}),
            json!({"jsonrpc": "2.0", "method": "m", "params": "text", "id": 1}),
            json!({"jsonrpc": "2.0", "method": "m", "params": 3, "id": 1}),
            json!({"jsonrpc": "2.0", "method": "m", "id": {"nested": true}}),
            json!({"jsonrpc": "2.0", "method": "m", "id": [1]}),
            json!({"jsonrpc": "2.0", "method": "m", "id": true}),
        ];

        for case in cases {
            let error = parse(case.clone()).unwrap_err();
            assert_eq!(error.code, INVALID_REQUEST, "case: {}", case);
            assert!(matches!(error.data, Some(Value::String(_))), "case: {}", case);
        }
    }

    #[test]
    fn test_success_response_shape() {
        let response = Response::success(Some(Id::from(7)), json!({"ok": true}));
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value, json!({"jsonrpc": "2.0", "id": 7, "result": {"ok": true}}));
    }

    #[test]
    fn test_error_response_omits_absent_data() {
        let error = RpcError::new(INTERNAL_ERROR, "Internal error", None);
        let value = serde_json::to_value(Response::error(None, error)).unwrap();

        assert_eq!(
            value,
            json!({"jsonrpc": "2.0", "id": null, "error": {"code": -32603, "message": "Internal error"}})
        );
    }

    #[test]
    fn test_parse_error_response_matches_wire_format() {
        let error = parse_request(b"{bad").unwrap_err();
        let value = serde_json::to_value(Response::error(None, error)).unwrap();

        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["id"], Value::Null);
        assert_eq!(value["error"]["code"], -32700);
        assert!(value.get("result").is_none());
    }

    #[test]
    fn test_response_decodes_either_member() {
        let ok: Response =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": 1, "result": {"choice": "odd"}}))
                .unwrap();
        assert_eq!(ok.into_result().unwrap()["choice"], "odd");

        let err: Response = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32601, "message": "Method not found"}
        }))
        .unwrap();
        assert!(err.is_error());
        assert_eq!(err.into_result().unwrap_err().code, METHOD_NOT_FOUND);
    }

    #[test]
    fn test_error_constructors() {
        assert_eq!(RpcError::method_not_found("foo").code, METHOD_NOT_FOUND);
        assert_eq!(RpcError::invalid_params("bad").code, INVALID_PARAMS);

        let internal = RpcError::internal("ValueError", "boom");
        assert_eq!(internal.code, INTERNAL_ERROR);
        assert_eq!(internal.data, Some(json!("ValueError: boom")));
    }

    #[test]
    fn test_encoded_request_parses_back() {
        let request = Request::call("parity_choose", 2, json!({"game_id": "g1"}));
        let parsed = parse_request(&request.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed, request);

        let notification = Request::notification("notify_match_result", json!({"game_id": "g1"}));
        let parsed = parse_request(&notification.to_bytes().unwrap()).unwrap();
        assert!(parsed.is_notification());
        assert_eq!(parsed, notification);
    }
}
