//! Frame-tick scheduling.
//!
//! Components never own an event loop. When they need work done "next frame" they ask the host's
//! [`FrameClock`] for a tick, and the host calls back into the component (for example
//! `on_frame()`) when that tick arrives.
//!
//! [`DeferredTrigger`] is the single-shot, coalescing wrapper components keep around a clock:
//! arming while armed is a no-op, and firing clears the armed state before the caller runs its
//! deferred work, so work requested during that run is captured by a fresh arm.

use std::cell::Cell;
use std::rc::Rc;

pub trait FrameClock {
    /// Requests one tick on the next frame.
    fn schedule_next_frame(&mut self);

    /// Withdraws a previously requested tick. Hosts that cannot withdraw may ignore this; the
    /// component treats an unexpected tick as a no-op.
    fn cancel_next_frame(&mut self);
}

/// A clock for hosts that poll: it records whether a tick is outstanding and lets the host drain
/// it with [`ManualClock::take_frame`].
///
/// Clones share state, so the host keeps one handle and gives the other to the component.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    inner: Rc<ManualClockState>,
}

#[derive(Debug, Default)]
struct ManualClockState {
    scheduled: Cell<bool>,
    requests: Cell<usize>,
    cancels: Cell<usize>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_scheduled(&self) -> bool {
        self.inner.scheduled.get()
    }

    /// Consumes the outstanding tick. Returns `true` if one was scheduled.
    pub fn take_frame(&self) -> bool {
        self.inner.scheduled.replace(false)
    }

    /// Number of `schedule_next_frame` calls seen so far.
    pub fn requests(&self) -> usize {
        self.inner.requests.get()
    }

    pub fn cancels(&self) -> usize {
        self.inner.cancels.get()
    }
}

impl FrameClock for ManualClock {
    fn schedule_next_frame(&mut self) {
        self.inner.scheduled.set(true);
        self.inner.requests.set(self.inner.requests.get() + 1);
    }

    fn cancel_next_frame(&mut self) {
        self.inner.scheduled.set(false);
        self.inner.cancels.set(self.inner.cancels.get() + 1);
    }
}

/// Single-shot coalescing trigger over a [`FrameClock`].
pub struct DeferredTrigger {
    clock: Box<dyn FrameClock>,
    armed: bool,
}

impl std::fmt::Debug for DeferredTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredTrigger")
            .field("armed", &self.armed)
            .finish_non_exhaustive()
    }
}

impl DeferredTrigger {
    pub fn new(clock: Box<dyn FrameClock>) -> Self {
        Self {
            clock,
            armed: false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Arms the trigger. Returns `false` (and does not touch the clock) if already armed.
    pub fn arm(&mut self) -> bool {
        if self.armed {
            return false;
        }
        self.armed = true;
        self.clock.schedule_next_frame();
        true
    }

    /// Disarms the trigger and withdraws the clock request.
    pub fn cancel(&mut self) -> bool {
        if !self.armed {
            return false;
        }
        self.armed = false;
        self.clock.cancel_next_frame();
        true
    }

    /// Called from the host tick. Returns `true` if the trigger was armed; the armed state is
    /// already cleared when this returns.
    pub fn fire(&mut self) -> bool {
        std::mem::replace(&mut self.armed, false)
    }
}
