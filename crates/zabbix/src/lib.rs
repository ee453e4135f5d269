//! # zabbix
//!
//! Blocking client for the item part of the Zabbix JSON-RPC API.
//!
//! This crate provides:
//! - The JSON-RPC 2.0 envelope and typed API errors
//! - Token or `user.login` authentication
//! - `item.create`, `item.get`, `item.update` and `item.delete`
//! - Retry with exponential backoff for transient transport failures
//! - [`declarative::RemoteApi`] for [`Client`], so it can back a reconciler
//!
//! ## Example
//!
//! ```no_run
//! use zabbix::{Client, ClientConfig, Item, HTTP_AGENT};
//!
//! let client = Client::new(ClientConfig::new("https://zabbix.example.com/api_jsonrpc.php"))
//!     .with_token("0424bd59b807674191e7d77572075f33");
//!
//! let item = Item {
//!     host_id: "10084".into(),
//!     key: "web.health".into(),
//!     name: "Web health".into(),
//!     item_type: HTTP_AGENT.into(),
//!     value_type: "3".into(),
//!     url: "https://example.com/health".into(),
//!     ..Default::default()
//! };
//! let ids = client.items_create(&[item]).expect("create failed");
//! println!("Created item {}", ids[0]);
//! ```

#![warn(clippy::all)]

pub mod client;
pub mod error;
pub mod remote;
pub mod retry;
pub mod rpc;
pub mod types;

pub use client::{Client, ClientConfig, TokenPlacement};
pub use error::{Error, ErrorCategory, Result};
pub use retry::RetryConfig;
pub use types::{HTTP_AGENT, Item, Preprocessor};
