use crate::error::StampError;
use crate::state::ProcessingState;

pub trait ProgressObserver {
    /// A batch of `total` accepted files is about to be processed.
    fn on_batch_start(&mut self, total: usize) {
        let _ = total;
    }

    /// Processing of `name` begins; `remaining` files are still queued after it.
    fn on_file_start(&mut self, name: &str, remaining: usize) {
        let _ = (name, remaining);
    }

    /// The progress value changed. `state` is the full snapshot after the change.
    fn on_progress(&mut self, state: &ProcessingState) {
        let _ = state;
    }

    /// An artifact named `artifact_name` was delivered for `name`.
    fn on_file_complete(&mut self, name: &str, artifact_name: &str) {
        let _ = (name, artifact_name);
    }

    /// User-facing alert for one failing (or rejected) file.
    fn on_alert(&mut self, error: &StampError) {
        let _ = error;
    }

    /// Processing state went back to idle.
    fn on_reset(&mut self) {}
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {}

/// Records every event; handy for hosts that render after the fact.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub progress: Vec<u8>,
    pub alerts: Vec<String>,
    pub started: Vec<(String, usize)>,
    pub completed: Vec<String>,
    pub resets: usize,
}

impl ProgressObserver for RecordingObserver {
    fn on_file_start(&mut self, name: &str, remaining: usize) {
        self.started.push((name.to_string(), remaining));
    }

    fn on_progress(&mut self, state: &ProcessingState) {
        self.progress.push(state.progress());
    }

    fn on_file_complete(&mut self, _name: &str, artifact_name: &str) {
        self.completed.push(artifact_name.to_string());
    }

    fn on_alert(&mut self, error: &StampError) {
        self.alerts.push(error.to_string());
    }

    fn on_reset(&mut self) {
        self.resets += 1;
    }
}
