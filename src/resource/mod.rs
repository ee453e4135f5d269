//! Managed resource kinds
//!
//! Every configured object is addressed as `<resource_type>.<name>`, e.g.
//! `item_http.web_health`. The address is the key in both the config file and
//! the state file.

pub mod item_http;
pub mod preprocessing;

pub use item_http::{HttpItemCodec, HttpItemConfig};

use anyhow::{Result, bail};

/// Build the address of a named resource
pub fn address(resource_type: &str, name: &str) -> String {
    format!("{resource_type}.{name}")
}

/// Split an address into (resource type, name), checking the type is known
pub fn parse_address(address: &str) -> Result<(&str, &str)> {
    let Some((resource_type, name)) = address.split_once('.') else {
        bail!("Invalid address '{address}', expected <type>.<name>");
    };
    if name.is_empty() || name.contains('.') {
        bail!("Invalid resource name in '{address}'");
    }
    if resource_type != item_http::RESOURCE_TYPE {
        bail!(
            "Unknown resource type '{resource_type}' (supported: {})",
            item_http::RESOURCE_TYPE
        );
    }
    Ok((resource_type, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address() {
        assert_eq!(address("item_http", "web"), "item_http.web");
    }

    #[test]
    fn test_parse_address() {
        assert_eq!(
            parse_address("item_http.web").unwrap(),
            ("item_http", "web")
        );
        assert!(parse_address("item_http").is_err());
        assert!(parse_address("item_http.").is_err());
        assert!(parse_address("item_http.a.b").is_err());
        assert!(parse_address("trigger.web").is_err());
    }
}
