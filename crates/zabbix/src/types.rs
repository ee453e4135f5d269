//! Wire types for the item API

use serde::{Deserialize, Serialize};

/// Item type code of an HTTP agent item
pub const HTTP_AGENT: &str = "19";

/// One preprocessing step as the API stores it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preprocessor {
    #[serde(rename = "type")]
    pub step_type: String,
    #[serde(default)]
    pub params: String,
    #[serde(default)]
    pub error_handler: String,
    #[serde(default)]
    pub error_handler_params: String,
}

/// An item record.
///
/// Every scalar travels as a string, including numeric codes and flags.
/// Fields the API returns but this crate does not manage are ignored on
/// deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Server-assigned identifier, empty before create
    #[serde(rename = "itemid", default, skip_serializing_if = "String::is_empty")]
    pub item_id: String,
    #[serde(rename = "hostid", default)]
    pub host_id: String,
    #[serde(rename = "interfaceid", default)]
    pub interface_id: String,
    #[serde(rename = "key_", default)]
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub item_type: String,
    #[serde(default)]
    pub value_type: String,
    #[serde(default)]
    pub delay: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub request_method: String,
    #[serde(default)]
    pub post_type: String,
    #[serde(default)]
    pub posts: String,
    #[serde(default)]
    pub status_codes: String,
    #[serde(default)]
    pub timeout: String,
    #[serde(default)]
    pub verify_host: String,
    #[serde(default)]
    pub verify_peer: String,
    /// Always sent, so an update with an empty list clears the pipeline
    #[serde(rename = "preprocessing", default)]
    pub preprocessors: Vec<Preprocessor>,
}

impl Item {
    pub fn is_http_agent(&self) -> bool {
        self.item_type == HTTP_AGENT
    }
}

/// Identifiers returned by `item.create`, `item.update` and `item.delete`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemIds {
    #[serde(rename = "itemids", default)]
    pub item_ids: Vec<String>,
}
