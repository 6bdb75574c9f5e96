//! Cooperative reschedule of the current task.
//!
//! Grounded directly on `examples/original_source/corocore/scheduler.h`'s
//! `yield_awaitable`: never ready, on suspend reschedules the current task
//! (keeping it in the Scheduled pool rather than parking it), and a no-op
//! resume.

use crate::awaitable::Awaitable;
use crate::scheduler::TaskCx;

/// Awaiting this value cooperatively reschedules the current task at the
/// tail of the ready queue without leaving the Scheduled pool.
pub struct Yield {
    _private: (),
}

impl Yield {
    fn new() -> Self {
        Self { _private: () }
    }
}

/// Construct a [`Yield`] awaitable. Idiomatic entry point mirroring
/// `yield_now()`/`co_yield`-style helpers; see the crate docs' public
/// surface.
pub fn yield_now() -> Yield {
    Yield::new()
}

impl Awaitable for Yield {
    type Output = ();

    fn ready(&self) -> bool {
        false
    }

    fn suspend(&mut self, cx: &mut TaskCx<'_>) -> bool {
        cx.schedule_if_active()
    }

    fn resume(&mut self) {}
}
