//! Execution planner - compares desired configuration with the remote side

use crate::client::{RemoteApi, RemoteEntity};
use crate::codec::ResourceCodec;
use crate::diff::{FieldChange, diff_fields};
use crate::error::{Error, Result};
use crate::reconciler::Reconciler;
use crate::types::ReadOutcome;
use serde::Serialize;
use std::collections::BTreeMap;

/// What must happen to one addressed resource
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action<C> {
    /// Not tracked yet
    Create { config: C },
    /// Tracked, but deleted out-of-band; create it again
    Recreate { stale_id: String, config: C },
    /// Exists and differs from the desired configuration
    Update { id: String, current: C, config: C },
    /// Tracked but no longer configured
    Delete { id: String },
    /// Tracked, no longer configured, and already gone remotely
    Forget { id: String },
    /// Exists and matches
    NoChange { id: String, current: C },
}

impl<C> Action<C> {
    pub fn is_change(&self) -> bool {
        !matches!(self, Self::NoChange { .. })
    }

    /// Whether applying the action talks to the remote API
    pub fn needs_remote_call(&self) -> bool {
        !matches!(self, Self::NoChange { .. } | Self::Forget { .. })
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Create { .. } => "+",
            Self::Recreate { .. } => "+/-",
            Self::Update { .. } => "~",
            Self::Delete { .. } | Self::Forget { .. } => "-",
            Self::NoChange { .. } => "=",
        }
    }
}

/// A planned action plus the field changes it implies
#[derive(Debug, Clone, Serialize)]
pub struct PlannedChange<C> {
    pub address: String,
    pub resource_type: &'static str,
    pub action: Action<C>,
    pub changes: Vec<FieldChange>,
}

/// Ordered set of planned changes, sorted by address
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionPlan<C> {
    pub changes: Vec<PlannedChange<C>>,
}

/// Counts of each kind of change in a plan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanSummary {
    pub additions: usize,
    pub modifications: usize,
    pub removals: usize,
    pub unchanged: usize,
}

impl PlanSummary {
    pub fn total(&self) -> usize {
        self.additions + self.modifications + self.removals
    }

    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}

impl<C> ExecutionPlan<C> {
    pub fn new() -> Self {
        Self {
            changes: Vec::new(),
        }
    }

    /// Keep only changes matching a target like `type` or `type.name`
    pub fn filter_by_target(self, target: Option<&str>) -> Self {
        match target {
            None => self,
            Some(t) => {
                let (resource_type, name) = parse_target(t);
                Self {
                    changes: self
                        .changes
                        .into_iter()
                        .filter(|c| matches_filter(c, resource_type.as_deref(), name.as_deref()))
                        .collect(),
                }
            }
        }
    }

    pub fn summary(&self) -> PlanSummary {
        let mut summary = PlanSummary::default();
        for change in &self.changes {
            match change.action {
                Action::Create { .. } | Action::Recreate { .. } => summary.additions += 1,
                Action::Update { .. } => summary.modifications += 1,
                Action::Delete { .. } | Action::Forget { .. } => summary.removals += 1,
                Action::NoChange { .. } => summary.unchanged += 1,
            }
        }
        summary
    }

    /// Changes that will do something
    pub fn pending(&self) -> impl Iterator<Item = &PlannedChange<C>> {
        self.changes.iter().filter(|c| c.action.is_change())
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

impl<C> Default for ExecutionPlan<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a plan from the desired configuration and the tracked identifiers.
///
/// `desired` maps address to configuration; `tracked` maps address to the
/// remote identifier recorded after the last successful write. Every
/// tracked object is re-read, so the plan reflects the server, not the
/// local record. Desired configurations are encoded up front so codec
/// errors surface here rather than halfway through an apply; every invalid
/// address is reported, not just the first.
pub fn build_plan<Co, A>(
    reconciler: &Reconciler<'_, Co, A>,
    desired: &BTreeMap<String, Co::Config>,
    tracked: &BTreeMap<String, String>,
) -> Result<ExecutionPlan<Co::Config>>
where
    Co: ResourceCodec,
    Co::Entity: RemoteEntity,
    A: RemoteApi<Entity = Co::Entity>,
{
    let codec = reconciler.codec();
    let resource_type = codec.resource_type();
    let mut plan = ExecutionPlan::new();

    let invalid: Vec<(String, Error)> = desired
        .iter()
        .filter_map(|(address, config)| codec.encode(config).err().map(|e| (address.clone(), e)))
        .collect();
    if !invalid.is_empty() {
        return Err(Error::InvalidResources { errors: invalid });
    }

    for (address, config) in desired {
        let config = codec.materialize(config);

        let action = match tracked.get(address) {
            None => Action::Create { config },
            Some(id) => match reconciler.refresh(id)? {
                ReadOutcome::Gone => Action::Recreate {
                    stale_id: id.clone(),
                    config,
                },
                ReadOutcome::Present(current) if current == config => Action::NoChange {
                    id: id.clone(),
                    current,
                },
                ReadOutcome::Present(current) => Action::Update {
                    id: id.clone(),
                    current,
                    config,
                },
            },
        };
        let changes = match &action {
            Action::Create { config } | Action::Recreate { config, .. } => {
                diff_fields(None, Some(config))
            }
            Action::Update {
                current, config, ..
            } => diff_fields(Some(current), Some(config)),
            _ => Vec::new(),
        };
        plan.changes.push(PlannedChange {
            address: address.clone(),
            resource_type,
            action,
            changes,
        });
    }

    for (address, id) in tracked {
        if desired.contains_key(address) {
            continue;
        }
        let (action, changes) = match reconciler.refresh(id)? {
            ReadOutcome::Gone => (Action::Forget { id: id.clone() }, Vec::new()),
            ReadOutcome::Present(current) => (
                Action::Delete { id: id.clone() },
                diff_fields(Some(&current), None),
            ),
        };
        plan.changes.push(PlannedChange {
            address: address.clone(),
            resource_type,
            action,
            changes,
        });
    }

    plan.changes.sort_by(|a, b| a.address.cmp(&b.address));
    log::debug!(
        "Planned {} {resource_type} resources ({} pending)",
        plan.changes.len(),
        plan.pending().count()
    );
    Ok(plan)
}

/// Parse a target string like "type.name" into (type, name)
fn parse_target(target: &str) -> (Option<String>, Option<String>) {
    let parts: Vec<&str> = target.split('.').collect();
    match parts.len() {
        1 => (Some(parts[0].to_string()), None),
        2 => (Some(parts[0].to_string()), Some(parts[1].to_string())),
        _ => (None, Some(target.to_string())),
    }
}

/// Check if a planned change matches the filter criteria
fn matches_filter<C>(
    change: &PlannedChange<C>,
    resource_type: Option<&str>,
    name: Option<&str>,
) -> bool {
    let (change_type, change_name) = change
        .address
        .split_once('.')
        .unwrap_or((change.resource_type, change.address.as_str()));

    if let Some(rt) = resource_type
        && change_type != rt
    {
        return false;
    }

    if let Some(n) = name
        && change_name != n
    {
        return false;
    }

    true
}
