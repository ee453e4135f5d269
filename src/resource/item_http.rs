//! HTTP agent item resource
//!
//! Maps an `[item_http.<name>]` configuration block onto an item of type
//! HTTP agent. Field groups mirror how items are described elsewhere: fields
//! every item has, the polling interval, the host interface, and the
//! HTTP-specific request settings.

use super::preprocessing::{self, PreprocessingStep};
use declarative::{
    EnumTable, Error, FieldKind, FieldSpec, ResourceCodec, ResourceSchema, Result, decode_flag,
    encode_flag,
};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use zabbix::{HTTP_AGENT, Item};

pub const RESOURCE_TYPE: &str = "item_http";

/// Value type names and their wire codes
pub static VALUE_TYPES: LazyLock<EnumTable> = LazyLock::new(|| {
    EnumTable::new(
        "value type",
        &[
            ("float", "0"),
            ("character", "1"),
            ("log", "2"),
            ("unsigned", "3"),
            ("text", "4"),
        ],
    )
});

/// Configuration of one HTTP agent item.
///
/// Required fields are plain strings and fail encoding when empty. Optional
/// fields are `None` until materialized with their declared default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpItemConfig {
    pub hostid: String,
    pub key: String,
    pub name: String,
    pub valuetype: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interfaceid: Option<String>,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posts: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_codes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    pub verify_host: bool,
    pub verify_peer: bool,
    pub preprocessor: Vec<PreprocessingStep>,
}

fn common_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::required("hostid", "Host the item belongs to"),
        FieldSpec::required("key", "Item key, unique per host"),
        FieldSpec::required("name", "Item name"),
        FieldSpec::required("valuetype", "Type of collected value").with_kind(FieldKind::Enum {
            symbols: VALUE_TYPES.symbols(),
        }),
        FieldSpec::optional("preprocessor", "Ordered preprocessing steps").with_kind(
            FieldKind::List {
                item: "preprocessing step",
            },
        ),
    ]
}

fn delay_fields() -> Vec<FieldSpec> {
    vec![FieldSpec::string_default("delay", "1m", "Update interval")]
}

fn interface_fields() -> Vec<FieldSpec> {
    vec![FieldSpec::string_default(
        "interfaceid",
        "0",
        "Host interface, 0 for none",
    )]
}

fn http_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::required("url", "URL to poll"),
        FieldSpec::string_default("request_method", "0", "0 GET, 1 POST, 2 PUT, 3 HEAD"),
        FieldSpec::string_default("post_type", "0", "0 raw, 2 JSON, 3 XML"),
        FieldSpec::optional("posts", "Request body"),
        FieldSpec::string_default("status_codes", "200", "Accepted HTTP status codes"),
        FieldSpec::string_default("timeout", "3s", "Request timeout"),
        FieldSpec::bool_default("verify_host", false, "Verify the host name in the certificate"),
        FieldSpec::bool_default("verify_peer", false, "Verify the peer certificate"),
    ]
}

/// Descriptor of the `item_http` resource
pub fn schema() -> ResourceSchema {
    ResourceSchema::new(RESOURCE_TYPE)
        .merge(&common_fields())
        .merge(&delay_fields())
        .merge(&interface_fields())
        .merge(&http_fields())
}

/// Codec between [`HttpItemConfig`] and [`zabbix::Item`]
pub struct HttpItemCodec {
    schema: ResourceSchema,
}

impl HttpItemCodec {
    pub fn new() -> Self {
        Self { schema: schema() }
    }

    fn optional(&self, name: &str, value: Option<&String>) -> String {
        self.schema.resolve(name, value.map(String::as_str)).to_string()
    }
}

impl Default for HttpItemCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceCodec for HttpItemCodec {
    type Config = HttpItemConfig;
    type Entity = Item;

    fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    fn encode(&self, config: &HttpItemConfig) -> Result<Item> {
        let s = &self.schema;
        let valuetype = s.require("valuetype", &config.valuetype)?;
        Ok(Item {
            item_id: String::new(),
            host_id: s.require("hostid", &config.hostid)?.to_string(),
            interface_id: self.optional("interfaceid", config.interfaceid.as_ref()),
            key: s.require("key", &config.key)?.to_string(),
            name: s.require("name", &config.name)?.to_string(),
            item_type: HTTP_AGENT.to_string(),
            value_type: VALUE_TYPES.to_code(valuetype)?.to_string(),
            delay: self.optional("delay", config.delay.as_ref()),
            url: s.require("url", &config.url)?.to_string(),
            request_method: self.optional("request_method", config.request_method.as_ref()),
            post_type: self.optional("post_type", config.post_type.as_ref()),
            posts: self.optional("posts", config.posts.as_ref()),
            status_codes: self.optional("status_codes", config.status_codes.as_ref()),
            timeout: self.optional("timeout", config.timeout.as_ref()),
            verify_host: encode_flag(config.verify_host),
            verify_peer: encode_flag(config.verify_peer),
            preprocessors: preprocessing::to_remote(&config.preprocessor)?,
        })
    }

    fn decode(&self, item: &Item) -> Result<HttpItemConfig> {
        if !item.is_http_agent() {
            return Err(Error::unknown_enum("item type", item.item_type.clone()));
        }
        Ok(HttpItemConfig {
            hostid: item.host_id.clone(),
            key: item.key.clone(),
            name: item.name.clone(),
            valuetype: VALUE_TYPES.to_symbol(&item.value_type)?.to_string(),
            delay: Some(item.delay.clone()),
            interfaceid: Some(item.interface_id.clone()),
            url: item.url.clone(),
            request_method: Some(item.request_method.clone()),
            post_type: Some(item.post_type.clone()),
            posts: Some(item.posts.clone()),
            status_codes: Some(item.status_codes.clone()),
            timeout: Some(item.timeout.clone()),
            verify_host: decode_flag(&item.verify_host),
            verify_peer: decode_flag(&item.verify_peer),
            preprocessor: preprocessing::from_remote(&item.preprocessors)?,
        })
    }

    fn materialize(&self, config: &HttpItemConfig) -> HttpItemConfig {
        HttpItemConfig {
            delay: Some(self.optional("delay", config.delay.as_ref())),
            interfaceid: Some(self.optional("interfaceid", config.interfaceid.as_ref())),
            request_method: Some(self.optional("request_method", config.request_method.as_ref())),
            post_type: Some(self.optional("post_type", config.post_type.as_ref())),
            posts: Some(self.optional("posts", config.posts.as_ref())),
            status_codes: Some(self.optional("status_codes", config.status_codes.as_ref())),
            timeout: Some(self.optional("timeout", config.timeout.as_ref())),
            preprocessor: preprocessing::materialize(&config.preprocessor),
            ..config.clone()
        }
    }
}
