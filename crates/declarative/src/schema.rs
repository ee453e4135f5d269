//! Resource descriptors
//!
//! A [`ResourceSchema`] declares the field set of a resource kind: names,
//! kinds, required/optional, and defaults. Codecs read defaults from it and
//! hosts print or validate against it. Shared field groups are declared once
//! and composed with [`ResourceSchema::merge`].

use crate::error::{Error, Result};
use serde::Serialize;

/// Kind of value a field holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FieldKind {
    String,
    Bool,
    /// Symbolic string translated through a named table
    Enum { symbols: Vec<&'static str> },
    /// Ordered list of sub-records
    List { item: &'static str },
}

/// Declared default for an optional field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DefaultValue {
    String(&'static str),
    Bool(bool),
}

/// A single field declaration
#[derive(Debug, Clone, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    #[serde(flatten)]
    pub kind: FieldKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
    pub description: &'static str,
}

impl FieldSpec {
    /// A required string field
    pub fn required(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::String,
            required: true,
            default: None,
            description,
        }
    }

    /// An optional string field with no default
    pub fn optional(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::String,
            required: false,
            default: None,
            description,
        }
    }

    /// An optional string field with a default
    pub fn string_default(
        name: &'static str,
        default: &'static str,
        description: &'static str,
    ) -> Self {
        Self {
            default: Some(DefaultValue::String(default)),
            ..Self::optional(name, description)
        }
    }

    /// An optional bool field with a default
    pub fn bool_default(name: &'static str, default: bool, description: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Bool,
            required: false,
            default: Some(DefaultValue::Bool(default)),
            description,
        }
    }

    /// Set the kind (used for enum and list fields)
    pub fn with_kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Field set of one resource kind
#[derive(Debug, Clone, Serialize)]
pub struct ResourceSchema {
    pub resource_type: &'static str,
    pub fields: Vec<FieldSpec>,
}

impl ResourceSchema {
    pub fn new(resource_type: &'static str) -> Self {
        Self {
            resource_type,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.retain(|f| f.name != spec.name);
        self.fields.push(spec);
        self
    }

    /// Append every field of `group`; later declarations replace earlier ones
    pub fn merge(self, group: &[FieldSpec]) -> Self {
        group.iter().cloned().fold(self, Self::field)
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.required)
    }

    /// Declared string default, or empty when the field has none
    pub fn string_default(&self, name: &str) -> &'static str {
        match self.get(name).and_then(|f| f.default.as_ref()) {
            Some(DefaultValue::String(s)) => s,
            _ => "",
        }
    }

    /// Declared bool default, false when the field has none
    pub fn bool_default(&self, name: &str) -> bool {
        matches!(
            self.get(name).and_then(|f| f.default.as_ref()),
            Some(DefaultValue::Bool(true))
        )
    }

    /// Resolve an optional string field to its value or declared default
    pub fn resolve<'a>(&self, name: &str, value: Option<&'a str>) -> &'a str {
        value.unwrap_or_else(|| self.string_default(name))
    }

    /// Return the value of a required field, failing if it is empty
    pub fn require<'a>(&self, name: &str, value: &'a str) -> Result<&'a str> {
        if value.trim().is_empty() {
            return Err(Error::missing(name));
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn common() -> Vec<FieldSpec> {
        vec![
            FieldSpec::required("key", "Item key"),
            FieldSpec::required("name", "Item name"),
        ]
    }

    fn schema() -> ResourceSchema {
        ResourceSchema::new("thing")
            .merge(&common())
            .field(FieldSpec::string_default("timeout", "3s", "Request timeout"))
            .field(FieldSpec::bool_default("verify", false, "Verify peer"))
    }

    #[test]
    fn test_merge_preserves_order() {
        let names: Vec<_> = schema().fields.iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["key", "name", "timeout", "verify"]);
    }

    #[test]
    fn test_merge_replaces_duplicates() {
        let schema = schema().field(FieldSpec::string_default("name", "x", "Override"));
        assert_eq!(schema.fields.len(), 4);
        assert!(!schema.get("name").unwrap().required);
    }

    #[test]
    fn test_defaults() {
        let schema = schema();
        assert_eq!(schema.string_default("timeout"), "3s");
        assert_eq!(schema.string_default("key"), "");
        assert!(!schema.bool_default("verify"));
        assert_eq!(schema.resolve("timeout", None), "3s");
        assert_eq!(schema.resolve("timeout", Some("10s")), "10s");
    }

    #[test]
    fn test_require() {
        let schema = schema();
        assert_eq!(schema.require("key", "web.test").unwrap(), "web.test");
        let err = schema.require("key", "  ").unwrap_err();
        assert!(matches!(err, Error::MissingRequiredField { field } if field == "key"));
    }

    #[test]
    fn test_required_fields() {
        let required: Vec<_> = schema().required_fields().map(|f| f.name).collect();
        assert_eq!(required, vec!["key", "name"]);
    }

    #[test]
    fn test_serialize_descriptor() {
        let json = serde_json::to_value(schema()).unwrap();
        assert_eq!(json["resource_type"], "thing");
        assert_eq!(json["fields"][2]["default"], "3s");
        assert_eq!(json["fields"][3]["kind"], "bool");
        assert!(json["fields"][0].get("default").is_none());
    }
}
