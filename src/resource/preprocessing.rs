//! Preprocessing pipeline translation
//!
//! Steps are written with symbolic names in configuration and travel as
//! numeric codes on the wire. Order is significant: the server applies the
//! steps one after another, so both directions keep the list order intact.

use declarative::{EnumTable, Result};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use zabbix::Preprocessor;

/// Step type names and their wire codes
pub static STEP_TYPES: LazyLock<EnumTable> = LazyLock::new(|| {
    EnumTable::new(
        "preprocessing type",
        &[
            ("multiplier", "1"),
            ("rtrim", "2"),
            ("ltrim", "3"),
            ("trim", "4"),
            ("regex", "5"),
            ("bool_to_decimal", "6"),
            ("octal_to_decimal", "7"),
            ("hex_to_decimal", "8"),
            ("simple_change", "9"),
            ("change_per_second", "10"),
            ("xml_xpath", "11"),
            ("jsonpath", "12"),
            ("in_range", "13"),
            ("matches_regex", "14"),
            ("not_matches_regex", "15"),
            ("check_json_error", "16"),
            ("check_xml_error", "17"),
            ("check_regex_error", "18"),
            ("discard_unchanged", "19"),
            ("discard_unchanged_heartbeat", "20"),
            ("javascript", "21"),
            ("prometheus_pattern", "22"),
            ("prometheus_to_json", "23"),
            ("csv_to_json", "24"),
            ("str_replace", "25"),
            ("check_not_supported", "26"),
            ("xml_to_json", "27"),
            ("snmp_walk_value", "28"),
            ("snmp_walk_to_json", "29"),
            ("snmp_get_value", "30"),
        ],
    )
});

/// What the server does when a step fails
pub static ERROR_HANDLERS: LazyLock<EnumTable> = LazyLock::new(|| {
    EnumTable::new(
        "preprocessing error handler",
        &[
            ("default", "0"),
            ("discard", "1"),
            ("custom_value", "2"),
            ("custom_error", "3"),
        ],
    )
});

pub const DEFAULT_ERROR_HANDLER: &str = "default";

/// One configured preprocessing step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreprocessingStep {
    #[serde(rename = "type")]
    pub step_type: String,
    /// Step parameters; multiple parameters are newline-separated
    pub params: String,
    /// Empty means `default`
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error_handler: String,
    pub error_handler_params: String,
}

impl PreprocessingStep {
    pub fn new(step_type: impl Into<String>, params: impl Into<String>) -> Self {
        Self {
            step_type: step_type.into(),
            params: params.into(),
            ..Default::default()
        }
    }

    pub fn on_error(mut self, handler: impl Into<String>, params: impl Into<String>) -> Self {
        self.error_handler = handler.into();
        self.error_handler_params = params.into();
        self
    }

    fn error_handler_or_default(&self) -> &str {
        if self.error_handler.is_empty() {
            DEFAULT_ERROR_HANDLER
        } else {
            &self.error_handler
        }
    }
}

/// Encode configured steps in order
pub fn to_remote(steps: &[PreprocessingStep]) -> Result<Vec<Preprocessor>> {
    steps
        .iter()
        .map(|step| {
            Ok(Preprocessor {
                step_type: STEP_TYPES.to_code(&step.step_type)?.to_string(),
                params: step.params.clone(),
                error_handler: ERROR_HANDLERS
                    .to_code(step.error_handler_or_default())?
                    .to_string(),
                error_handler_params: step.error_handler_params.clone(),
            })
        })
        .collect()
}

/// Decode server steps in order; an unknown code fails the whole pipeline
pub fn from_remote(steps: &[Preprocessor]) -> Result<Vec<PreprocessingStep>> {
    steps
        .iter()
        .map(|step| {
            let error_handler = if step.error_handler.is_empty() {
                DEFAULT_ERROR_HANDLER
            } else {
                ERROR_HANDLERS.to_symbol(&step.error_handler)?
            };
            Ok(PreprocessingStep {
                step_type: STEP_TYPES.to_symbol(&step.step_type)?.to_string(),
                params: step.params.clone(),
                error_handler: error_handler.to_string(),
                error_handler_params: step.error_handler_params.clone(),
            })
        })
        .collect()
}

/// Spell out the default error handler on every step
pub fn materialize(steps: &[PreprocessingStep]) -> Vec<PreprocessingStep> {
    steps
        .iter()
        .map(|step| PreprocessingStep {
            error_handler: step.error_handler_or_default().to_string(),
            ..step.clone()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::Error;

    fn mixed_pipeline() -> Vec<PreprocessingStep> {
        vec![
            PreprocessingStep::new("jsonpath", "$.data.value"),
            PreprocessingStep::new("multiplier", "0.001").on_error("custom_value", "0"),
            PreprocessingStep::new("regex", "^(\\d+)\n\\1"),
            PreprocessingStep::new("discard_unchanged_heartbeat", "1h")
                .on_error("discard", ""),
            PreprocessingStep::new("trim", " "),
        ]
    }

    #[test]
    fn test_empty_pipeline() {
        assert!(to_remote(&[]).unwrap().is_empty());
        assert!(from_remote(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_single_step() {
        let steps = vec![PreprocessingStep::new("jsonpath", "$.status")];
        let remote = to_remote(&steps).unwrap();
        assert_eq!(
            remote,
            vec![Preprocessor {
                step_type: "12".into(),
                params: "$.status".into(),
                error_handler: "0".into(),
                error_handler_params: String::new(),
            }]
        );
        assert_eq!(from_remote(&remote).unwrap(), materialize(&steps));
    }

    #[test]
    fn test_mixed_pipeline_preserves_order_and_params() {
        let steps = mixed_pipeline();
        let remote = to_remote(&steps).unwrap();
        let codes: Vec<&str> = remote.iter().map(|p| p.step_type.as_str()).collect();
        assert_eq!(codes, ["12", "1", "5", "20", "4"]);
        assert_eq!(remote[1].error_handler, "2");
        assert_eq!(remote[1].error_handler_params, "0");
        assert_eq!(remote[2].params, "^(\\d+)\n\\1");

        let back = from_remote(&remote).unwrap();
        assert_eq!(back, materialize(&steps));
        assert_eq!(back[3].error_handler, "discard");
    }

    #[test]
    fn test_unknown_step_type_on_encode() {
        let err = to_remote(&[PreprocessingStep::new("jq", ".")]).unwrap_err();
        assert!(matches!(err, Error::UnknownEnumValue { ref value, .. } if value == "jq"));
    }

    #[test]
    fn test_unknown_code_on_decode_is_not_skipped() {
        let remote = vec![
            Preprocessor {
                step_type: "12".into(),
                ..Default::default()
            },
            Preprocessor {
                step_type: "99".into(),
                ..Default::default()
            },
        ];
        let err = from_remote(&remote).unwrap_err();
        assert!(matches!(err, Error::UnknownEnumValue { ref value, .. } if value == "99"));
    }

    #[test]
    fn test_unknown_error_handler() {
        let step = PreprocessingStep::new("trim", " ").on_error("ignore", "");
        assert!(to_remote(&[step]).is_err());

        let remote = Preprocessor {
            step_type: "4".into(),
            error_handler: "7".into(),
            ..Default::default()
        };
        assert!(from_remote(&[remote]).is_err());
    }

    #[test]
    fn test_newer_step_types_decode() {
        let remote = vec![
            Preprocessor {
                step_type: "27".into(),
                error_handler: "0".into(),
                ..Default::default()
            },
            Preprocessor {
                step_type: "29".into(),
                params: "1.3.6.1.2.1.2.2.1.2".into(),
                error_handler: "0".into(),
                ..Default::default()
            },
        ];
        let steps = from_remote(&remote).unwrap();
        assert_eq!(steps[0].step_type, "xml_to_json");
        assert_eq!(steps[1].step_type, "snmp_walk_to_json");
        assert_eq!(to_remote(&steps).unwrap(), remote);
    }

    #[test]
    fn test_tables_cover_every_code() {
        assert_eq!(STEP_TYPES.symbols().len(), 30);
        assert_eq!(STEP_TYPES.to_symbol("26").unwrap(), "check_not_supported");
        assert_eq!(STEP_TYPES.to_symbol("30").unwrap(), "snmp_get_value");
        assert!(STEP_TYPES.to_symbol("31").is_err());
        assert_eq!(ERROR_HANDLERS.symbols(), ["default", "discard", "custom_value", "custom_error"]);
    }

    #[test]
    fn test_parse_from_toml() {
        let steps: Vec<PreprocessingStep> = toml::from_str::<toml::Table>(
            r#"
            [[step]]
            type = "jsonpath"
            params = "$.status"

            [[step]]
            type = "multiplier"
            params = "8"
            error_handler = "custom_error"
            error_handler_params = "bad value"
            "#,
        )
        .unwrap()["step"]
            .clone()
            .try_into()
            .unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].error_handler, "");
        assert_eq!(steps[1].error_handler, "custom_error");
    }
}
