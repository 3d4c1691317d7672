// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The cooperative cancellation/progress contract (§5): the remux orchestrator polls
//! `is_cancelled()` between tool invocations and reports coarse progress through the same
//! handle, so a caller's UI can repaint without the core needing to know anything about it.

/// Implemented by a caller that wants to observe or cancel a long-running remux/merge run.
pub trait ProgressHandler {
    /// Called once with the total number of steps the run expects to perform.
    fn init(&self, total_steps: usize);

    /// Called after each step completes.
    fn inc(&self, step_label: &str);

    /// Called once the run has finished (successfully or not).
    fn finish(&self);

    /// Polled between tool invocations; returning `true` aborts the run with `ErrorKind::Cancelled`.
    fn is_cancelled(&self) -> bool;
}

/// A `ProgressHandler` that never cancels and does nothing with progress updates, for callers
/// that don't need one.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgressHandler;

impl ProgressHandler for NullProgressHandler {
    fn init(&self, _total_steps: usize) {}
    fn inc(&self, _step_label: &str) {}
    fn finish(&self) {}
    fn is_cancelled(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_handler_never_cancels() {
        let handler = NullProgressHandler;
        handler.init(3);
        handler.inc("step one");
        handler.finish();
        assert!(!handler.is_cancelled());
    }
}
