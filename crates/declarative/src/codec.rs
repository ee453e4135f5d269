//! Field codec primitives
//!
//! A [`ResourceCodec`] is a pure function pair mapping a typed configuration
//! record to the remote API entity and back. The helpers in this module cover
//! the translations most remote APIs need: symbolic enum names to wire codes
//! ([`EnumTable`]) and booleans to single-character string flags.

use crate::error::{Error, Result};
use crate::schema::ResourceSchema;
use std::collections::HashMap;

/// Wire value for `true`
pub const FLAG_TRUE: &str = "1";
/// Wire value for `false`
pub const FLAG_FALSE: &str = "0";

/// Encode a bool as a "0"/"1" string flag
pub fn encode_flag(value: bool) -> String {
    let flag = if value { FLAG_TRUE } else { FLAG_FALSE };
    flag.to_string()
}

/// Decode a string flag; only "1" is true
pub fn decode_flag(value: &str) -> bool {
    value == FLAG_TRUE
}

/// Immutable bidirectional map between symbolic names and wire codes.
///
/// Tables are meant to be built once (in a `LazyLock`) and shared read-only.
#[derive(Debug, Clone)]
pub struct EnumTable {
    name: &'static str,
    entries: Vec<(&'static str, &'static str)>,
    by_symbol: HashMap<&'static str, &'static str>,
    by_code: HashMap<&'static str, &'static str>,
}

impl EnumTable {
    /// Build a table from `(symbol, code)` pairs.
    ///
    /// # Panics
    ///
    /// Panics if a symbol or a code appears twice, since the table would no
    /// longer be invertible.
    pub fn new(name: &'static str, entries: &[(&'static str, &'static str)]) -> Self {
        let mut by_symbol = HashMap::with_capacity(entries.len());
        let mut by_code = HashMap::with_capacity(entries.len());
        for &(symbol, code) in entries {
            assert!(
                by_symbol.insert(symbol, code).is_none(),
                "duplicate symbol {symbol:?} in {name} table"
            );
            assert!(
                by_code.insert(code, symbol).is_none(),
                "duplicate code {code:?} in {name} table"
            );
        }
        Self {
            name,
            entries: entries.to_vec(),
            by_symbol,
            by_code,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Symbolic names in declaration order
    pub fn symbols(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(s, _)| *s).collect()
    }

    /// Translate a symbolic name to its wire code
    pub fn to_code(&self, symbol: &str) -> Result<&'static str> {
        self.by_symbol
            .get(symbol)
            .copied()
            .ok_or_else(|| Error::unknown_enum(self.name, symbol))
    }

    /// Translate a wire code back to its symbolic name
    pub fn to_symbol(&self, code: &str) -> Result<&'static str> {
        self.by_code
            .get(code)
            .copied()
            .ok_or_else(|| Error::unknown_enum(self.name, code))
    }
}

/// Bidirectional mapping between a configuration record and a remote entity.
///
/// Implementations must be pure: no I/O, no hidden state. For every valid
/// record `c`, `decode(&encode(&c)?)` must equal `materialize(&c)`.
pub trait ResourceCodec: Send + Sync {
    /// Typed, user-facing configuration record
    type Config: Clone + PartialEq + std::fmt::Debug + serde::Serialize + Send + Sync;
    /// Remote API representation
    type Entity: Clone + std::fmt::Debug + Send + Sync;

    /// Descriptor for the resource kind
    fn schema(&self) -> &ResourceSchema;

    /// Resource type name used in messages and addresses
    fn resource_type(&self) -> &'static str {
        self.schema().resource_type
    }

    /// Encode configuration into an entity without a remote identifier
    fn encode(&self, config: &Self::Config) -> Result<Self::Entity>;

    /// Decode an entity into canonical configuration
    fn decode(&self, entity: &Self::Entity) -> Result<Self::Config>;

    /// Fill every unset optional field with its declared default
    fn materialize(&self, config: &Self::Config) -> Self::Config;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colors() -> EnumTable {
        EnumTable::new("color", &[("red", "0"), ("green", "1"), ("blue", "2")])
    }

    #[test]
    fn test_flags() {
        assert_eq!(encode_flag(true), "1");
        assert_eq!(encode_flag(false), "0");
        assert!(decode_flag("1"));
        assert!(!decode_flag("0"));
        assert!(!decode_flag(""));
        assert!(!decode_flag("true"));
    }

    #[test]
    fn test_flag_round_trip() {
        for b in [true, false] {
            assert_eq!(decode_flag(&encode_flag(b)), b);
        }
    }

    #[test]
    fn test_enum_table_lookup() {
        let table = colors();
        assert_eq!(table.to_code("green").unwrap(), "1");
        assert_eq!(table.to_symbol("2").unwrap(), "blue");
        assert_eq!(table.symbols(), vec!["red", "green", "blue"]);
    }

    #[test]
    fn test_enum_table_unknown() {
        let table = colors();
        let err = table.to_code("purple").unwrap_err();
        assert!(
            matches!(err, Error::UnknownEnumValue { table: "color", ref value } if value == "purple")
        );
        assert!(table.to_symbol("9").is_err());
        // Symbols are not accepted as codes and vice versa
        assert!(table.to_symbol("red").is_err());
        assert!(table.to_code("0").is_err());
    }

    #[test]
    #[should_panic(expected = "duplicate code")]
    fn test_enum_table_rejects_duplicate_codes() {
        EnumTable::new("broken", &[("a", "0"), ("b", "0")]);
    }
}
