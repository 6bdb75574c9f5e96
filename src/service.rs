//! The `Service` capability: anything embedded in an outer driver loop that
//! can be stepped once per tick.
//!
//! The spec names this as a bare `step() -> bool`; this crate generalizes
//! it in two ways, both driven by [`crate::timer::TimerService`]:
//!
//! - An explicit context parameter, since a service that needs scheduler
//!   access cannot hold a persistent `&mut` reference to the scheduler
//!   without making it impossible to also call `scheduler.step()` directly
//!   from the same loop.
//! - A `&self` receiver rather than `&mut self`: services whose state is
//!   built from `Cell`s (the same intrusive-list idiom used by
//!   [`crate::event::Event`]) can be stepped while other code still holds
//!   shared borrows into them — exactly the situation a task that has
//!   parked itself on a timer creates. See `DESIGN.md`.

/// A participant in the outer loop that can be driven one tick at a time.
pub trait Service {
    /// Context threaded in on each `step`, e.g. `&mut dyn
    /// SchedulerProtocol` for [`crate::timer::TimerService`].
    type Context: ?Sized;

    /// Perform at most one unit of work. Returns `true` if work was done
    /// this tick.
    fn step(&self, cx: &mut Self::Context) -> bool;
}
