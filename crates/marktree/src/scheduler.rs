//! Per-instance rebuild scheduling.

use marktree_core::clock::DeferredTrigger;
use marktree_core::clock::FrameClock;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    /// A structure write is waiting for the next frame.
    Pending,
    Rebuilding,
}

/// Coalesces structure writes into at most one rebuild per frame.
///
/// ```text
/// Idle --request--> Pending --take_frame--> Rebuilding --finish--> Idle
///                      ^                        |
///                      +-------finish-----------+  (re-armed during the rebuild)
/// ```
#[derive(Debug)]
pub struct RebuildScheduler {
    state: SchedulerState,
    trigger: DeferredTrigger,
    rebuilds: u64,
}

impl RebuildScheduler {
    pub fn new(clock: Box<dyn FrameClock>) -> Self {
        Self {
            state: SchedulerState::Idle,
            trigger: DeferredTrigger::new(clock),
            rebuilds: 0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        self.trigger.is_armed()
    }

    /// Marks a rebuild as pending. Returns `true` if this call requested a frame.
    pub fn request(&mut self) -> bool {
        if self.state == SchedulerState::Idle {
            self.state = SchedulerState::Pending;
        }
        self.trigger.arm()
    }

    /// Host tick. Returns `true` if a rebuild should run now.
    pub fn take_frame(&mut self) -> bool {
        if !self.trigger.fire() {
            return false;
        }
        self.state = SchedulerState::Rebuilding;
        true
    }

    /// Starts an inline rebuild, withdrawing any outstanding frame request.
    pub fn begin_forced(&mut self) {
        self.trigger.cancel();
        self.state = SchedulerState::Rebuilding;
    }

    /// Ends a rebuild started by [`Self::take_frame`] or [`Self::begin_forced`].
    pub fn finish(&mut self) {
        self.rebuilds += 1;
        self.abort();
    }

    /// Leaves the rebuilding state without counting a rebuild.
    pub fn abort(&mut self) {
        self.state = if self.trigger.is_armed() {
            SchedulerState::Pending
        } else {
            SchedulerState::Idle
        };
    }

    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }
}
