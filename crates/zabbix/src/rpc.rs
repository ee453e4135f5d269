//! JSON-RPC 2.0 envelope

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// Request body
#[derive(Debug, Serialize)]
pub struct Request<'a, P: Serialize> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    pub params: P,
    pub id: u64,
    /// Session or API token for servers that predate header authentication
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<&'a str>,
}

impl<'a, P: Serialize> Request<'a, P> {
    pub fn new(method: &'a str, params: P, id: u64) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method,
            params,
            id,
            auth: None,
        }
    }

    #[must_use]
    pub fn with_auth(mut self, token: Option<&'a str>) -> Self {
        self.auth = token;
        self
    }
}

/// Error member of a response
#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: String,
}

/// Response body; exactly one of `result` and `error` is set
#[derive(Debug, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcError>,
    #[serde(default)]
    pub id: Option<Value>,
}

impl Response {
    /// Unwrap the envelope into the result value or a typed error
    pub fn into_result(self) -> Result<Value> {
        if let Some(err) = self.error {
            return Err(Error::Api {
                code: err.code,
                message: err.message,
                data: err.data,
            });
        }
        if self.jsonrpc != JSONRPC_VERSION {
            return Err(Error::Protocol(format!(
                "unexpected jsonrpc version '{}'",
                self.jsonrpc
            )));
        }
        self.result
            .ok_or_else(|| Error::Protocol("response has neither result nor error".into()))
    }
}
