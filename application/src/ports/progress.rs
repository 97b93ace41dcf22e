//! Progress notification port
//!
//! Defines the interface for reporting progress during a batch run.

use casegen_domain::BatchResult;

/// Callback for progress updates during a batch
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (console, progress bars, etc.)
pub trait ProgressNotifier: Send + Sync {
    /// Called once, before any task is dispatched
    fn on_batch_start(&self, total_tasks: usize);

    /// Called when a task finishes, in completion order
    fn on_task_complete(&self, index: usize, requirement_id: &str, success: bool);

    /// Called after the results are assembled
    fn on_batch_complete(&self, _result: &BatchResult) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ProgressNotifier for NoProgress {
    fn on_batch_start(&self, _total_tasks: usize) {}
    fn on_task_complete(&self, _index: usize, _requirement_id: &str, _success: bool) {}
}
