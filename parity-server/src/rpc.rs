//! JSON-RPC dispatch for the `/mcp` endpoints
//!
//! Protocol failures always produce a well-formed envelope with HTTP 200;
//! notifications are executed and answered with 204.

use async_trait::async_trait;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use parity_core::rpc::{parse_request, Params, Response as RpcResponse, RpcError};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, error, warn};

/// Failure inside a method handler
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HandlerError {
    #[error("method '{0}' not found")]
    MethodNotFound(String),

    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("{category}: {message}")]
    Internal { category: String, message: String },
}

impl HandlerError {
    pub fn internal(category: &str, message: impl ToString) -> Self {
        HandlerError::Internal {
            category: category.to_string(),
            message: message.to_string(),
        }
    }
}

impl From<HandlerError> for RpcError {
    fn from(err: HandlerError) -> Self {
        match err {
            HandlerError::MethodNotFound(method) => RpcError::method_not_found(&method),
            HandlerError::InvalidParams(detail) => RpcError::invalid_params(detail),
            HandlerError::Internal { category, message } => RpcError::internal(&category, message),
        }
    }
}

/// Method table of one agent
#[async_trait]
pub trait RpcHandler: Send + Sync {
    async fn handle(&self, method: &str, params: Option<&Params>) -> Result<Value, HandlerError>;
}

/// Decode a request body, run it, and encode the reply
pub async fn dispatch<H>(handler: &H, body: &[u8]) -> Response
where
    H: RpcHandler + ?Sized,
{
    let request = match parse_request(body) {
        Ok(request) => request,
        Err(error) => {
            warn!("Invalid JSON-RPC request: {}", error.message);
            return Json(RpcResponse::error(None, error)).into_response();
        }
    };

    debug!("JSON-RPC request: method={}, id={:?}", request.method, request.id);
    let outcome = handler.handle(&request.method, request.params.as_ref()).await;

    if request.is_notification() {
        if let Err(e) = outcome {
            error!("Error processing notification {}: {}", request.method, e);
        }
        return StatusCode::NO_CONTENT.into_response();
    }

    let envelope = match outcome {
        Ok(result) => RpcResponse::success(request.id, result),
        Err(e) => {
            warn!("Method {} failed: {}", request.method, e);
            RpcResponse::error(request.id, e.into())
        }
    };
    Json(envelope).into_response()
}

/// Named params, or `INVALID_PARAMS`
pub fn object_params(params: Option<&Params>) -> Result<&Map<String, Value>, HandlerError> {
    params
        .and_then(Params::as_object)
        .ok_or_else(|| HandlerError::InvalidParams("params must be an object".to_string()))
}

/// Optional string member; other types count as absent
pub fn str_param(params: &Map<String, Value>, key: &str) -> Option<String> {
    params.get(key).and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parity_core::rpc::{INTERNAL_ERROR, INVALID_PARAMS, METHOD_NOT_FOUND};
    use serde_json::json;

    #[test]
    fn test_error_mapping() {
        let err: RpcError = HandlerError::MethodNotFound("dance".into()).into();
        assert_eq!(err.code, METHOD_NOT_FOUND);
        assert_eq!(err.data, Some(json!("Method 'dance' is not supported")));

        let err: RpcError = HandlerError::InvalidParams("nope".into()).into();
        assert_eq!(err.code, INVALID_PARAMS);

        let err: RpcError = HandlerError::internal("IoError", "disk full").into();
        assert_eq!(err.code, INTERNAL_ERROR);
        assert_eq!(err.data, Some(json!("IoError: disk full")));
    }

    #[test]
    fn test_object_params() {
        assert!(object_params(None).is_err());
        let array = Params::Array(vec![json!(1)]);
        assert!(object_params(Some(&array)).is_err());

        let object = Params::from_value(json!({ "game_id": "g1", "n": 3 })).unwrap();
        let map = object_params(Some(&object)).unwrap();
        assert_eq!(str_param(map, "game_id").as_deref(), Some("g1"));
        assert_eq!(str_param(map, "n"), None);
        assert_eq!(str_param(map, "missing"), None);
    }
}
