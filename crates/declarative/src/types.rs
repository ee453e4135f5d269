//! Core types for declarative resource management

use serde::{Deserialize, Serialize};

/// Lifecycle state of one managed object.
///
/// `Unmanaged` until the first successful create; `Managed` carries the
/// remote identifier and the last server-confirmed configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceState<C> {
    /// No remote object is tracked
    Unmanaged,
    /// Remote object exists with this identifier and synced configuration
    Managed { id: String, config: C },
}

impl<C> ResourceState<C> {
    pub fn managed(id: impl Into<String>, config: C) -> Self {
        Self::Managed {
            id: id.into(),
            config,
        }
    }

    /// Remote identifier, if managed
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Managed { id, .. } => Some(id),
            Self::Unmanaged => None,
        }
    }

    /// Last synced configuration, if managed
    pub fn config(&self) -> Option<&C> {
        match self {
            Self::Managed { config, .. } => Some(config),
            Self::Unmanaged => None,
        }
    }
}

/// Result of a drift-detection read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome<C> {
    /// The object exists; this is its canonical configuration
    Present(C),
    /// The object was deleted out-of-band
    Gone,
}

/// Result of applying a single change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyResult {
    /// No changes needed
    NoChange,
    /// Resource was created
    Created,
    /// Resource was modified
    Modified,
    /// Resource was removed
    Removed,
    /// Apply failed
    Failed { error: String },
    /// Apply was skipped
    Skipped { reason: String },
}

impl ApplyResult {
    /// Check if the result represents success (no failure)
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    /// Check if the result represents a change
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Created | Self::Modified | Self::Removed)
    }
}

/// Summary of execution results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteSummary {
    pub created: usize,
    pub modified: usize,
    pub removed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub no_change: usize,
}

impl ExecuteSummary {
    /// Check if execution was fully successful (no failures)
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Total number of resources processed
    pub fn total(&self) -> usize {
        self.created + self.modified + self.removed + self.skipped + self.failed + self.no_change
    }

    /// Add a result to the summary
    pub fn add_result(&mut self, result: &ApplyResult) {
        match result {
            ApplyResult::NoChange => self.no_change += 1,
            ApplyResult::Created => self.created += 1,
            ApplyResult::Modified => self.modified += 1,
            ApplyResult::Removed => self.removed += 1,
            ApplyResult::Failed { .. } => self.failed += 1,
            ApplyResult::Skipped { .. } => self.skipped += 1,
        }
    }
}

/// Options for execution
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Don't make changes, just show what would happen
    pub dry_run: bool,
    /// Number of parallel jobs; changes touch distinct remote objects
    pub jobs: usize,
    /// Verbose output
    pub verbose: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            jobs: 4,
            verbose: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_state_accessors() {
        let state: ResourceState<u32> = ResourceState::Unmanaged;
        assert_eq!(state.id(), None);

        let state = ResourceState::managed("17", 5u32);
        assert_eq!(state.id(), Some("17"));
        assert_eq!(state.config(), Some(&5));
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = ExecuteSummary::default();
        for result in [
            ApplyResult::Created,
            ApplyResult::Modified,
            ApplyResult::NoChange,
            ApplyResult::Failed {
                error: "x".into(),
            },
        ] {
            summary.add_result(&result);
        }
        assert_eq!(summary.total(), 4);
        assert_eq!(summary.created + summary.modified, 2);
        assert!(!summary.is_success());
    }

    #[test]
    fn test_apply_result_predicates() {
        assert!(ApplyResult::Created.is_change());
        assert!(!ApplyResult::NoChange.is_change());
        assert!(ApplyResult::Skipped { reason: "dry".into() }.is_success());
        assert!(!ApplyResult::Failed { error: "x".into() }.is_success());
    }
}
