//! Outbound JSON-RPC transport
//!
//! Level 4 - the seam between the referees and the network. The referees only
//! see [`RpcTransport`]; production uses [`HttpTransport`], tests script
//! in-memory agents.

use async_trait::async_trait;
use parity_core::rpc::{Request, Response};
use serde_json::Value;
use std::time::Duration;

use crate::error::TransportError;

/// Sends one request to an agent endpoint and returns the `result` member
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn call(&self, endpoint: &str, request: Request) -> Result<Value, TransportError>;
}

/// Call with a deadline; exceeding it is reported as a network error
pub async fn call_with_timeout(
    transport: &dyn RpcTransport,
    endpoint: &str,
    request: Request,
    timeout: Duration,
) -> Result<Value, TransportError> {
    match tokio::time::timeout(timeout, transport.call(endpoint, request)).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Network(format!(
            "no reply from {} within {:?}",
            endpoint, timeout
        ))),
    }
}

/// JSON-RPC over HTTP POST
#[derive(Clone, Debug, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuse an existing client (connection pool, proxy settings)
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn call(&self, endpoint: &str, request: Request) -> Result<Value, TransportError> {
        let response = self.client.post(endpoint).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let envelope: Response = response
            .json()
            .await
            .map_err(|e| TransportError::Malformed(e.to_string()))?;

        Ok(envelope.into_result()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct SlowTransport;

    #[async_trait]
    impl RpcTransport for SlowTransport {
        async fn call(&self, _endpoint: &str, _request: Request) -> Result<Value, TransportError> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(json!({}))
        }
    }

    #[tokio::test]
    async fn test_timeout_is_network_error() {
        let request = Request::call("ping", 1, json!({}));
        let err = call_with_timeout(&SlowTransport, "http://slow", request, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Network(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let transport = HttpTransport::new();
        let request = Request::call("ping", 1, json!({}));
        // Port 9 (discard) on localhost is closed in test environments
        let err = call_with_timeout(
            &transport,
            "http://127.0.0.1:9/mcp",
            request,
            Duration::from_secs(2),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, TransportError::Network(_)));
    }
}
