use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};

/// Session-scoped UI state, owned by the batch stamper.
///
/// Only the transition methods below mutate it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessingState {
    is_dragging: bool,
    progress: u8,
    is_processing: bool,
    current_file_name: String,
    remaining_queue: VecDeque<String>,
}

impl ProcessingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.is_dragging
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn is_processing(&self) -> bool {
        self.is_processing
    }

    pub fn current_file_name(&self) -> &str {
        &self.current_file_name
    }

    /// Names still waiting behind the current file, in processing order.
    pub fn remaining_queue(&self) -> impl Iterator<Item = &str> {
        self.remaining_queue.iter().map(String::as_str)
    }

    pub fn remaining(&self) -> usize {
        self.remaining_queue.len()
    }

    pub fn set_dragging(&mut self, dragging: bool) {
        self.is_dragging = dragging;
    }

    pub fn start_batch<I>(&mut self, names: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.is_processing = true;
        self.progress = 0;
        self.current_file_name.clear();
        self.remaining_queue = names.into_iter().collect();
    }

    /// Move the next queued name to `current_file_name` and zero the progress.
    pub fn begin_file(&mut self) -> Option<&str> {
        let next = self.remaining_queue.pop_front()?;
        self.current_file_name = next;
        self.progress = 0;
        Some(&self.current_file_name)
    }

    /// Raise progress to `value` (capped at 100). Lower values are ignored so
    /// progress never goes backwards within a file. Returns the new value.
    pub fn advance_progress(&mut self, value: u8) -> u8 {
        self.progress = self.progress.max(value.min(100));
        self.progress
    }

    pub fn complete_file(&mut self) {
        self.advance_progress(100);
    }

    /// Drop the current file's progress after a failure; the batch goes on.
    pub fn abandon_file(&mut self) {
        self.progress = 0;
        self.current_file_name.clear();
    }

    pub fn reset_state(&mut self) {
        self.progress = 0;
        self.is_processing = false;
        self.current_file_name.clear();
        self.remaining_queue.clear();
    }
}

/// Holds the state for the duration of a run and resets it when dropped,
/// whatever path (including unwinding) leaves the run.
pub struct ProcessingGuard<'a> {
    state: &'a mut ProcessingState,
}

impl<'a> ProcessingGuard<'a> {
    pub fn new(state: &'a mut ProcessingState) -> Self {
        Self { state }
    }
}

impl Deref for ProcessingGuard<'_> {
    type Target = ProcessingState;

    fn deref(&self) -> &ProcessingState {
        self.state
    }
}

impl DerefMut for ProcessingGuard<'_> {
    fn deref_mut(&mut self) -> &mut ProcessingState {
        self.state
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        if self.state.is_processing() || self.state.progress() != 0 {
            self.state.reset_state();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle() {
        let s = ProcessingState::new();
        assert!(!s.is_processing());
        assert!(!s.is_dragging());
        assert_eq!(s.progress(), 0);
        assert_eq!(s.remaining(), 0);
    }

    #[test]
    fn progress_never_goes_backwards_and_caps_at_100() {
        let mut s = ProcessingState::new();
        s.start_batch(["a.pdf".to_string()]);
        s.begin_file();
        assert_eq!(s.advance_progress(50), 50);
        assert_eq!(s.advance_progress(20), 50);
        assert_eq!(s.advance_progress(250), 100);
    }

    #[test]
    fn begin_file_walks_the_queue_and_zeroes_progress() {
        let mut s = ProcessingState::new();
        s.start_batch(["a.pdf".to_string(), "b.pdf".to_string()]);
        assert_eq!(s.begin_file(), Some("a.pdf"));
        assert_eq!(s.remaining_queue().collect::<Vec<_>>(), vec!["b.pdf"]);
        s.complete_file();
        assert_eq!(s.progress(), 100);
        assert_eq!(s.begin_file(), Some("b.pdf"));
        assert_eq!(s.progress(), 0);
        assert_eq!(s.remaining(), 0);
        assert_eq!(s.begin_file(), None);
    }

    #[test]
    fn guard_resets_on_drop() {
        let mut s = ProcessingState::new();
        {
            let mut g = ProcessingGuard::new(&mut s);
            g.start_batch(["a.pdf".to_string()]);
            g.begin_file();
            g.advance_progress(90);
        }
        assert!(!s.is_processing());
        assert_eq!(s.progress(), 0);
        assert_eq!(s.current_file_name(), "");
    }

    #[test]
    fn guard_resets_when_unwinding() {
        let mut s = ProcessingState::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut g = ProcessingGuard::new(&mut s);
            g.start_batch(["a.pdf".to_string()]);
            g.advance_progress(20);
            panic!("decoder blew up");
        }));
        assert!(result.is_err());
        assert!(!s.is_processing());
        assert_eq!(s.progress(), 0);
    }
}
