//! Core task vocabulary: identity, lifecycle state, priority, and the
//! `Suspendable` trait shared by task bodies and nested frames.

use core::fmt;

use crate::scheduler::TaskCx;

/// Opaque, stable identity of a task for the duration of its life.
///
/// Ids are assigned by the scheduler on [`crate::scheduler::Scheduler::spawn`]
/// and are never reused while the task they name is still registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub(crate) u32);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// A task's position in its lifecycle.
///
/// `created externally -> Suspended (on registration) -> Scheduled (via
/// schedule_all_suspended or an implicit wake) -> Active (on step) ->
/// (Suspended | Scheduled | Done | Zombie) -> destroyed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Registered but not yet made eligible to run.
    Inactive,
    /// Eligible to run, not yet in the ready queue.
    Suspended,
    /// In the ready queue, waiting for its turn.
    Scheduled,
    /// Currently being resumed. At most one task holds this state.
    Active,
    /// The task's top-level body reported completion.
    Done,
    /// A malformed awaitable failed to transition the task out of `Active`
    /// on return; the task is kept for observation but never resumed again.
    Zombie,
}

/// Reserved scheduling priority tag. The minimum viable scheduler does not
/// use this for ordering (see the task data model in the crate docs); it is
/// stored per task for forward compatibility with priority-aware policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Low,
    Mid,
    High,
    Isr,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Mid
    }
}

/// The result of resuming a [`Suspendable`] for one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    /// Not finished; the caller should suspend and wait to be resumed again.
    Pending,
    /// Finished. For a task body, this completes the task; for a nested
    /// frame, this pops the frame and resumes its caller.
    Ready,
}

/// A resumable computation: a task body or a nested frame.
///
/// Implementations are hand-written, program-counter-driven state machines
/// rather than compiler-generated `async` state machines, so that the
/// scheduler can observe and drive them one step at a time without hiding
/// suspension points from the outside (see the crate docs' design notes on
/// coroutines vs. state machines).
pub trait Suspendable {
    /// Advance the computation by one step, suspending at the first await
    /// point it has not already passed.
    fn poll(&mut self, cx: &mut TaskCx<'_>) -> Poll;
}
