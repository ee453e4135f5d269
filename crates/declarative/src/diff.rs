//! Field-level diff between server-confirmed and desired configuration

use serde::Serialize;
use serde_json::Value;

/// One field whose value differs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldChange {
    pub field: String,
    /// Current value (`None` when unset or the object does not exist)
    pub from: Option<String>,
    /// Desired value (`None` when unset or the object will be removed)
    pub to: Option<String>,
}

impl FieldChange {
    pub fn is_addition(&self) -> bool {
        self.from.is_none() && self.to.is_some()
    }

    pub fn is_removal(&self) -> bool {
        self.from.is_some() && self.to.is_none()
    }
}

/// Compare two records field by field.
///
/// Records are compared through their serialized form, so nested lists
/// (e.g. preprocessing steps) compare as a whole, order included.
/// Passing `None` for one side yields every field of the other side.
pub fn diff_fields<T: Serialize>(current: Option<&T>, desired: Option<&T>) -> Vec<FieldChange> {
    let current = current.map(to_fields).unwrap_or_default();
    let desired = desired.map(to_fields).unwrap_or_default();

    let mut names: Vec<&String> = desired.iter().map(|(k, _)| k).collect();
    for (name, _) in &current {
        if !names.contains(&name) {
            names.push(name);
        }
    }

    names
        .into_iter()
        .filter_map(|name| {
            let from = lookup(&current, name);
            let to = lookup(&desired, name);
            (from != to).then(|| FieldChange {
                field: name.clone(),
                from,
                to,
            })
        })
        .collect()
}

fn to_fields<T: Serialize>(record: &T) -> Vec<(String, Value)> {
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => map.into_iter().collect(),
        Ok(other) => vec![(String::new(), other)],
        Err(e) => {
            log::warn!("Could not serialize record for diff: {e}");
            Vec::new()
        }
    }
}

fn lookup(fields: &[(String, Value)], name: &str) -> Option<String> {
    fields
        .iter()
        .find(|(k, _)| k == name)
        .and_then(|(_, v)| render(v))
}

/// Render a value for display; empty strings and empty lists count as unset
fn render(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) if items.is_empty() => None,
        Value::Bool(_) | Value::Number(_) => Some(value.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Rec {
        url: String,
        timeout: Option<String>,
        verify: bool,
        steps: Vec<String>,
    }

    fn rec() -> Rec {
        Rec {
            url: "http://a".into(),
            timeout: Some("3s".into()),
            verify: false,
            steps: vec!["trim".into()],
        }
    }

    #[test]
    fn test_identical_records_have_no_diff() {
        assert!(diff_fields(Some(&rec()), Some(&rec())).is_empty());
    }

    #[test]
    fn test_changed_fields_in_declaration_order() {
        let mut desired = rec();
        desired.verify = true;
        desired.url = "http://b".into();

        let changes = diff_fields(Some(&rec()), Some(&desired));
        let fields: Vec<_> = changes.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, vec!["url", "verify"]);
        assert_eq!(changes[1].from.as_deref(), Some("false"));
        assert_eq!(changes[1].to.as_deref(), Some("true"));
    }

    #[test]
    fn test_list_order_matters() {
        let mut current = rec();
        current.steps = vec!["a".into(), "b".into()];
        let mut desired = rec();
        desired.steps = vec!["b".into(), "a".into()];

        let changes = diff_fields(Some(&current), Some(&desired));
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "steps");
    }

    #[test]
    fn test_unset_equals_empty() {
        let mut current = rec();
        current.steps = vec![];
        current.timeout = None;
        let mut desired = rec();
        desired.steps = vec![];
        desired.timeout = Some(String::new());

        assert!(diff_fields(Some(&current), Some(&desired)).is_empty());
    }

    #[test]
    fn test_creation_lists_all_set_fields() {
        let changes = diff_fields(None, Some(&rec()));
        assert!(changes.iter().all(FieldChange::is_addition));
        // verify=false still renders, so it is listed
        assert_eq!(changes.len(), 4);
    }

    #[test]
    fn test_removal() {
        let changes = diff_fields(Some(&rec()), None);
        assert!(changes.iter().all(FieldChange::is_removal));
    }
}
