//! Generic HTTP transport capability used by the action invoker.
//!
//! The transport reports a response for any status code it receives; mapping
//! non-2xx statuses to invocation failures is the invoker's concern. Only
//! failures to get a response at all (timeout, connection refused) surface
//! as `TransportError`.

use crate::action::HttpMethod;
use crate::error::TransportError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A fully-rendered HTTP request, ready to dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpRequestSpec {
    pub method: HttpMethod,
    pub url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub query: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

/// The response from a dispatched request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpResponse {
    pub status: u16,
    /// Parsed JSON body when the endpoint returned JSON, else a string value.
    pub body: serde_json::Value,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The external HTTP execution capability.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn dispatch(
        &self,
        request: HttpRequestSpec,
    ) -> std::result::Result<HttpResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range() {
        let ok = HttpResponse { status: 204, body: serde_json::Value::Null };
        assert!(ok.is_success());
        let err = HttpResponse { status: 404, body: serde_json::Value::Null };
        assert!(!err.is_success());
    }

    #[test]
    fn request_spec_serialization() {
        let spec = HttpRequestSpec {
            method: HttpMethod::Get,
            url: "https://api.x/bal/7".into(),
            headers: BTreeMap::from([("Accept".to_string(), "application/json".to_string())]),
            query: BTreeMap::new(),
            body: None,
        };
        let json = serde_json::to_string(&spec).unwrap();
        assert!(json.contains("GET"));
        assert!(json.contains("https://api.x/bal/7"));
        assert!(!json.contains("body"));
    }
}
