//! Callback traits for execution
//!
//! These traits allow the declarative crate to be used without
//! depending on specific UI implementations for progress and prompts.

use crate::types::ApplyResult;

/// Progress callback for execution operations
///
/// Implement this trait to receive progress updates during execution.
pub trait ProgressCallback: Send {
    /// Called when starting to apply a batch of changes
    fn on_batch_start(&mut self, count: usize);

    /// Called when starting to apply a single change
    fn on_resource_start(&mut self, address: &str, description: &str);

    /// Called when a change completes
    fn on_resource_complete(&mut self, address: &str, result: &ApplyResult);

    /// Called when a batch completes
    fn on_batch_complete(&mut self);
}

/// Confirmation callback for user interaction
pub trait ConfirmCallback: Send {
    /// Ask the user to confirm an action; `false` declines
    fn confirm(&mut self, prompt: &str) -> bool;
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_batch_start(&mut self, _count: usize) {}
    fn on_resource_start(&mut self, _address: &str, _description: &str) {}
    fn on_resource_complete(&mut self, _address: &str, _result: &ApplyResult) {}
    fn on_batch_complete(&mut self) {}
}

/// Auto-confirm callback (always returns true)
pub struct AutoConfirm;

impl ConfirmCallback for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> bool {
        true
    }
}

/// Auto-decline callback (always returns false)
pub struct AutoDecline;

impl ConfirmCallback for AutoDecline {
    fn confirm(&mut self, _prompt: &str) -> bool {
        false
    }
}
