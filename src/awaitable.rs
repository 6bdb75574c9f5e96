//! The `ready`/`suspend`/`resume` triad shared by every built-in suspension
//! point ([`crate::yield_now::Yield`], [`crate::event::EventWaiter`],
//! [`crate::timer::Timer`], [`crate::any_of::AnyOf`]).
//!
//! This is a direct, hand-rolled translation of the C++20 coroutine
//! `await_ready` / `await_suspend` / `await_resume` protocol this
//! specification was distilled from: Rust's native `async`/`Future` is not
//! used here because its compiler-generated suspension points are not
//! externally observable, and this crate needs exactly that observability
//! (see the crate docs' design notes).

use crate::scheduler::TaskCx;

/// A single suspension point a [`crate::task::Suspendable`] body can await.
pub trait Awaitable {
    /// The value produced once this awaitable completes.
    type Output;

    /// True if this awaitable would complete immediately if driven now.
    /// Must not mutate observable state.
    fn ready(&self) -> bool;

    /// Park the current task pending this awaitable's completion. Returns
    /// true if the task was actually suspended by this call.
    fn suspend(&mut self, cx: &mut TaskCx<'_>) -> bool;

    /// Produce the result of a completed await. Only meaningful after
    /// [`Awaitable::ready`] reports true.
    fn resume(&mut self) -> Self::Output;
}

/// Drive one step of awaiting `a` from within a hand-written
/// [`crate::task::Suspendable::poll`] state machine.
///
/// If `a` is ready, returns its output immediately (the caller should
/// advance its program counter and keep running). Otherwise suspends the
/// current task through `a` and returns `None` (the caller should return
/// [`crate::task::Poll::Pending`] without advancing).
pub fn drive<A: Awaitable>(a: &mut A, cx: &mut TaskCx<'_>) -> Option<A::Output> {
    if a.ready() {
        Some(a.resume())
    } else {
        a.suspend(cx);
        None
    }
}
