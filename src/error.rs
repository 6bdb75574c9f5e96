//! Error taxonomy for the scheduler core.
//!
//! Failures are reported by value, never by panic or exception: callers are
//! expected to treat a `false`/`Err` return as a well-defined no-op rather
//! than an exceptional condition. See the crate-level docs for the full
//! mapping of failure kinds to signals.

use core::fmt;

/// A failure reported by a scheduler, event, or timer operation.
///
/// Structural violations (a task resumed but never left `Active`) are not
/// represented here: the scheduler records those directly as
/// [`crate::task::TaskState::Zombie`] rather than returning an error, since
/// it is the scheduler itself, not the caller, that detects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedError {
    /// A bounded table (task table, ready queue, waiter slots, timer slots)
    /// has no free capacity for the requested operation.
    CapacityExceeded,
    /// The operation's state precondition was not satisfied (e.g.
    /// `schedule_if_active` on a task that is not `Active`). No state was
    /// changed.
    InvalidTransition,
    /// The operation requires a currently-resuming task, but none is in
    /// scope (e.g. called from outside any task's `poll`).
    NoCurrentTask,
}

impl fmt::Display for SchedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            SchedError::CapacityExceeded => "capacity exceeded",
            SchedError::InvalidTransition => "invalid state transition",
            SchedError::NoCurrentTask => "no current task",
        };
        write!(f, "{msg}")
    }
}
