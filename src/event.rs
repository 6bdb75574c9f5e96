//! One-shot broadcast events with auto-reset-on-drain waiters.
//!
//! Grounded on the teacher's `scheduler::io_wait::{WaitQueue,
//! wake_io_waiters}` wake-all-waiters-on-a-channel pattern, adapted from a
//! `Vec`-backed queue to fixed-capacity `Cell<WaiterSlot>` slots so that
//! waiter linkage needs no heap allocation and no raw intrusive pointers —
//! the `core::cell::Cell`-based interior mutability the crate docs'
//! "Intrusive lists" design note sanctions.

use core::cell::Cell;

use crate::awaitable::Awaitable;
use crate::error::SchedError;
use crate::scheduler::{SchedulerProtocol, TaskCx};
use crate::task::TaskId;

/// Maximum number of waiters that may be linked into one [`Event`] at once.
pub const MAX_WAITERS: usize = 8;

#[derive(Clone, Copy, PartialEq, Eq)]
enum WaiterSlot {
    Free,
    Idle,
    Parked(TaskId),
}

/// A one-shot broadcast signal. Waiters attach via
/// [`Event::create_waiter`]/[`Event::wait`]; [`Event::activate`] wakes all
/// waiters currently linked, in insertion order, and the event auto-resets
/// to inactive once the last waiter unlinks (see the crate docs' "Event
/// auto-reset" design note).
pub struct Event {
    active: Cell<bool>,
    waiters: [Cell<WaiterSlot>; MAX_WAITERS],
}

impl Default for Event {
    fn default() -> Self {
        Self::new()
    }
}

impl Event {
    /// Construct an inactive event with no linked waiters.
    pub fn new() -> Self {
        Self {
            active: Cell::new(false),
            waiters: core::array::from_fn(|_| Cell::new(WaiterSlot::Free)),
        }
    }

    /// True if the event is currently active.
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    fn linked_count(&self) -> usize {
        self.waiters
            .iter()
            .filter(|w| !matches!(w.get(), WaiterSlot::Free))
            .count()
    }

    /// Activate the event, waking every currently linked waiter's parked
    /// task (if any). Returns `false`, doing nothing, if the event is
    /// already active or has no linked waiters.
    pub fn activate(&self, sched: &mut dyn SchedulerProtocol) -> bool {
        if self.active.get() {
            return false;
        }
        if self.linked_count() == 0 {
            return false;
        }
        for w in &self.waiters {
            if let WaiterSlot::Parked(tid) = w.get() {
                sched.schedule_if_suspended(tid);
                w.set(WaiterSlot::Idle);
            }
        }
        self.active.set(true);
        true
    }

    /// Construct a waiter linked into this event. If `auto_activate` is
    /// true, the event is marked active immediately, bypassing the normal
    /// wake path — valid only because the sole caller of this flag
    /// ([`crate::timer::TimerService::sleep_until`] on an already-due
    /// deadline) always does so on a freshly constructed event with no
    /// other waiters yet linked; see `DESIGN.md`.
    ///
    /// Fails with [`SchedError::CapacityExceeded`] when all [`MAX_WAITERS`]
    /// slots are already linked; this is a normal, spec-valid condition
    /// (e.g. more than `MAX_WAITERS` tasks awaiting the same event), so it
    /// is reported by value rather than by panicking, matching every other
    /// capacity-exceeded path in this crate.
    pub fn create_waiter(&self, auto_activate: bool) -> Result<EventWaiter<'_>, SchedError> {
        let idx = self
            .waiters
            .iter()
            .position(|w| matches!(w.get(), WaiterSlot::Free))
            .ok_or(SchedError::CapacityExceeded)?;
        self.waiters[idx].set(WaiterSlot::Idle);
        if auto_activate {
            self.active.set(true);
        }
        Ok(EventWaiter { event: self, idx })
    }

    /// The default waiter entry point (the `co_await` equivalent): awaits
    /// this event without auto-activation.
    pub fn wait(&self) -> Result<EventWaiter<'_>, SchedError> {
        self.create_waiter(false)
    }
}

/// An awaitable bound at construction to one [`Event`]. Unlinks itself from
/// the event on drop; if it was the last linked waiter, the event resets
/// to inactive.
pub struct EventWaiter<'a> {
    event: &'a Event,
    idx: usize,
}

impl EventWaiter<'_> {
    fn slot(&self) -> WaiterSlot {
        self.event.waiters[self.idx].get()
    }
}

impl Awaitable for EventWaiter<'_> {
    type Output = ();

    fn ready(&self) -> bool {
        self.event.is_active()
    }

    fn suspend(&mut self, cx: &mut TaskCx<'_>) -> bool {
        self.event.waiters[self.idx].set(WaiterSlot::Parked(cx.task_id()));
        cx.suspend_if_active()
    }

    fn resume(&mut self) {
        if matches!(self.slot(), WaiterSlot::Parked(_)) {
            self.event.waiters[self.idx].set(WaiterSlot::Idle);
        }
    }
}

impl Drop for EventWaiter<'_> {
    fn drop(&mut self) {
        self.event.waiters[self.idx].set(WaiterSlot::Free);
        if self.event.linked_count() == 0 {
            self.event.active.set(false);
        }
    }
}
