use crate::model::{ActionMode, ActionResult};

/// Trait for reporting reconciliation progress.
///
/// The CLI implements it with indicatif spinners and bars; tests use
/// `SilentReporter`. All methods have default no-op implementations.
pub trait ProgressReporter {
    fn on_instance_start(&self, _name: &str) {}
    fn on_fetch_start(&self, _what: &str) {}
    fn on_fetch_complete(&self, _what: &str, _count: usize) {}
    fn on_decisions_ready(&self, _count: usize) {}
    fn on_action_start(&self, _total_files: usize, _mode: ActionMode) {}
    fn on_action_progress(&self, _result: &ActionResult) {}
    fn on_action_complete(&self) {}
    fn on_instance_complete(&self, _name: &str) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
