//! Blocking JSON-RPC client for the item API.
//!
//! # Example
//!
//! ```no_run
//! use zabbix::{Client, ClientConfig};
//! use serde_json::json;
//!
//! let mut client = Client::new(ClientConfig::new("https://zabbix.example.com/api_jsonrpc.php"));
//! client.login("Admin", "zabbix").unwrap();
//! let items = client.items_get(&json!({"itemids": ["28510"]})).unwrap();
//! println!("Found {} items", items.len());
//! ```

use crate::error::{Error, Result};
use crate::retry::{LogCallback, RetryConfig, with_retry};
use crate::rpc::{Request, Response};
use crate::types::{Item, ItemIds};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

const CONTENT_TYPE: &str = "application/json-rpc";

/// Where the token travels on authenticated calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TokenPlacement {
    /// `Authorization: Bearer` header (Zabbix 6.4 and later)
    #[default]
    Header,
    /// `auth` member of the request body (Zabbix 5.4 to 7.0)
    Body,
}

/// Connection settings
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Full URL of `api_jsonrpc.php`
    pub url: String,
    /// Per-request timeout
    pub timeout: Duration,
    pub retry: RetryConfig,
    pub token_placement: TokenPlacement,
}

impl ClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
            token_placement: TokenPlacement::default(),
        }
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn token_placement(mut self, placement: TokenPlacement) -> Self {
        self.token_placement = placement;
        self
    }
}

/// API client.
///
/// The agent is shared and thread-safe, so one client can serve several
/// concurrent operations once authenticated.
pub struct Client {
    agent: ureq::Agent,
    url: String,
    token: Option<String>,
    retry: RetryConfig,
    token_placement: TokenPlacement,
    next_id: AtomicU64,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        let agent_config = ureq::Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(agent_config),
            url: config.url,
            token: None,
            retry: config.retry,
            token_placement: config.token_placement,
            next_id: AtomicU64::new(1),
        }
    }

    /// Authenticate with a pre-issued API token
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Obtain a session token with `user.login`
    pub fn login(&mut self, username: &str, password: &str) -> Result<()> {
        log::debug!("Logging in to {} as {username}", self.url);
        let params = json!({"username": username, "password": password});
        let token: String = with_retry(&self.retry, Some(&LogCallback), || {
            self.call_unauthenticated("user.login", &params)
        })
        .map_err(|e| match e {
            Error::Api { data, message, .. } => Error::Auth(format!("{message} {data}")),
            other => other,
        })?;
        self.token = Some(token);
        Ok(())
    }

    /// `item.create`; returns the new identifiers in submission order.
    ///
    /// Not retried: a request that reached the server before the connection
    /// dropped may already have created the items.
    pub fn items_create(&self, items: &[Item]) -> Result<Vec<String>> {
        let ids: ItemIds = self.call("item.create", items)?;
        Ok(ids.item_ids)
    }

    /// `item.get` with caller-supplied parameters
    pub fn items_get(&self, params: &Value) -> Result<Vec<Item>> {
        with_retry(&self.retry, Some(&LogCallback), || {
            self.call("item.get", params)
        })
    }

    /// `item.update`; every item must carry its identifier
    pub fn items_update(&self, items: &[Item]) -> Result<Vec<String>> {
        let ids: ItemIds = with_retry(&self.retry, Some(&LogCallback), || {
            self.call("item.update", items)
        })?;
        Ok(ids.item_ids)
    }

    /// `item.delete`
    pub fn items_delete(&self, ids: &[String]) -> Result<Vec<String>> {
        let ids: ItemIds = with_retry(&self.retry, Some(&LogCallback), || {
            self.call("item.delete", ids)
        })?;
        Ok(ids.item_ids)
    }

    fn call<P, T>(&self, method: &str, params: &P) -> Result<T>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| Error::Auth(format!("no credentials for {method}")))?;
        self.send(method, params, Some(token))
    }

    fn call_unauthenticated<P, T>(&self, method: &str, params: &P) -> Result<T>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(method, params, None)
    }

    fn send<P, T>(&self, method: &str, params: &P, token: Option<&str>) -> Result<T>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (body, authorization) =
            encode_request(method, params, id, token, self.token_placement)?;
        log::debug!("POST {} {method} (id {id})", self.url);
        log::trace!("request body: {}", redact(method, &body));

        let mut request = self
            .agent
            .post(&self.url)
            .header("Content-Type", CONTENT_TYPE);
        if let Some(value) = authorization {
            request = request.header("Authorization", &value);
        }
        let response: Response = request.send(body)?.body_mut().read_json()?;

        let result = response.into_result()?;
        log::trace!("{method} result: {result}");
        Ok(serde_json::from_value(result)?)
    }
}

/// Request body plus the `Authorization` header value, if any
fn encode_request<P>(
    method: &str,
    params: &P,
    id: u64,
    token: Option<&str>,
    placement: TokenPlacement,
) -> Result<(String, Option<String>)>
where
    P: Serialize + ?Sized,
{
    let request = Request::new(method, params, id);
    match placement {
        TokenPlacement::Header => Ok((
            serde_json::to_string(&request)?,
            token.map(|t| format!("Bearer {t}")),
        )),
        TokenPlacement::Body => Ok((serde_json::to_string(&request.with_auth(token))?, None)),
    }
}

fn redact<'a>(method: &str, body: &'a str) -> &'a str {
    if method == "user.login" {
        "<credentials>"
    } else {
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ClientConfig::new("http://localhost/api_jsonrpc.php")
            .timeout(Duration::from_secs(5))
            .retry(RetryConfig::no_retry());
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.retry.max_attempts, 1);
    }

    #[test]
    fn test_token_authentication() {
        let client = Client::new(ClientConfig::new("http://localhost/api_jsonrpc.php"));
        assert!(!client.is_authenticated());
        let client = client.with_token("abc");
        assert!(client.is_authenticated());
        assert_eq!(client.url(), "http://localhost/api_jsonrpc.php");
    }

    #[test]
    fn test_unauthenticated_call_fails_without_request() {
        let client = Client::new(ClientConfig::new("http://127.0.0.1:9/api_jsonrpc.php"));
        let err = client.items_delete(&["1".to_string()]).unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[test]
    fn test_token_in_header_by_default() {
        let (body, authorization) =
            encode_request("item.get", &json!({}), 3, Some("tok"), TokenPlacement::default())
                .unwrap();
        assert_eq!(authorization.as_deref(), Some("Bearer tok"));
        let value: Value = serde_json::from_str(&body).unwrap();
        assert!(value.get("auth").is_none());
    }

    #[test]
    fn test_token_in_body_for_older_servers() {
        let (body, authorization) =
            encode_request("item.get", &json!({}), 3, Some("tok"), TokenPlacement::Body).unwrap();
        assert!(authorization.is_none());
        let value: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["auth"], "tok");
        assert_eq!(value["id"], 3);

        let (body, _) =
            encode_request("user.login", &json!({}), 1, None, TokenPlacement::Body).unwrap();
        assert!(!body.contains("\"auth\""));
    }

    #[test]
    fn test_login_body_is_redacted() {
        assert_eq!(redact("user.login", "{\"password\":\"x\"}"), "<credentials>");
        assert_eq!(redact("item.get", "{}"), "{}");
    }
}
