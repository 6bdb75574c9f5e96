//! A cooperative, single-threaded task scheduler core.
//!
//! Tasks are explicit finite-state machines ([`Suspendable`]) rather than
//! `async fn`s: the scheduler needs to inspect a task's nested-call depth
//! from outside (see `SPEC_FULL.md` scenario 5), and the compiler-generated
//! state machine behind `async`/`.await` exposes no such thing. Suspension
//! points within a task body are [`Awaitable`]s — [`yield_now::Yield`],
//! [`event::EventWaiter`], [`timer::Timer`], [`any_of::AnyOf`] — modeled
//! directly on the `await_ready`/`await_suspend`/`await_resume` triad of
//! the C++ coroutine machinery this crate's design is grounded on.
//!
//! Grounded on the teacher's crate layout (`kernel/src/scheduler/mod.rs`
//! re-exporting `scheduler`, `thread`, `io_wait`, `traits`), carried over
//! module-for-module as `scheduler`, `task`, `event`/`timer`, and
//! `scheduler::SchedulerProtocol` respectively.
#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod any_of;
pub mod awaitable;
pub mod clock;
pub mod error;
pub mod event;
pub mod frame;
pub mod scheduler;
pub mod service;
pub mod task;
pub mod timer;
pub mod yield_now;

pub use any_of::AnyOf;
pub use awaitable::{drive, Awaitable};
pub use clock::Clock;
pub use error::SchedError;
pub use event::{Event, EventWaiter};
pub use scheduler::{Scheduler, SchedulerProtocol, TaskCx};
pub use service::Service;
pub use task::{Poll, Priority, Suspendable, TaskId, TaskState};
pub use timer::{Timer, TimerService};
pub use yield_now::{yield_now, Yield};

#[cfg(test)]
mod integration_tests {
    use crate::clock::MockClock;
    use crate::task::{Poll, Suspendable, TaskState};
    use crate::timer::TimerService;
    use crate::{Scheduler, TaskCx};
    use alloc::boxed::Box;
    use alloc::vec::Vec;

    /// Yields `n` times, recording, on each resume, the order in which it
    /// was woken relative to its siblings.
    struct RoundRobin {
        remaining: u32,
        awaiting: bool,
        log: alloc::rc::Rc<core::cell::RefCell<Vec<(usize, u32)>>>,
        who: usize,
    }

    impl Suspendable for RoundRobin {
        fn poll(&mut self, cx: &mut TaskCx<'_>) -> Poll {
            loop {
                if self.awaiting {
                    self.awaiting = false;
                    self.log.borrow_mut().push((self.who, self.remaining));
                    continue;
                }
                if self.remaining == 0 {
                    return Poll::Ready;
                }
                self.remaining -= 1;
                let mut y = crate::yield_now::yield_now();
                crate::Awaitable::suspend(&mut y, cx);
                self.awaiting = true;
                return Poll::Pending;
            }
        }
    }

    #[test]
    fn three_tasks_interleave_in_round_robin_order() {
        let log = alloc::rc::Rc::new(core::cell::RefCell::new(Vec::new()));
        let mut s: Scheduler<4> = Scheduler::new();
        let ids: Vec<_> = (0..3)
            .map(|who| {
                s.spawn(Box::new(RoundRobin {
                    remaining: 5,
                    awaiting: false,
                    log: log.clone(),
                    who,
                }))
                .unwrap()
            })
            .collect();
        s.run();
        for &id in &ids {
            assert_eq!(s.state(id), Some(TaskState::Done));
        }

        // Each round, every task is woken exactly once, interleaved:
        // (0,_) (1,_) (2,_) (0,_) (1,_) (2,_) ...
        let recorded = log.borrow();
        assert_eq!(recorded.len(), 15);
        for round in 0..5 {
            for who in 0..3 {
                assert_eq!(recorded[round * 3 + who].0, who);
            }
        }
    }

    /// `T` calls `F` calls `G`; each frame yields once, then completes on
    /// its next resume. Every poll of a frame records its own nesting
    /// depth, so each frame contributes two samples at the same depth: one
    /// when it yields, one when it resumes and returns — `G` is nested two
    /// calls deep (depth 2), `F` one call deep (depth 1), `T`'s own body at
    /// depth 0.
    struct G {
        depths: alloc::rc::Rc<core::cell::RefCell<Vec<usize>>>,
        awaiting: bool,
    }

    impl Suspendable for G {
        fn poll(&mut self, cx: &mut TaskCx<'_>) -> Poll {
            if self.awaiting {
                self.awaiting = false;
                self.depths.borrow_mut().push(cx.depth());
                return Poll::Ready;
            }
            self.depths.borrow_mut().push(cx.depth());
            let mut y = crate::yield_now::yield_now();
            crate::Awaitable::suspend(&mut y, cx);
            self.awaiting = true;
            Poll::Pending
        }
    }

    struct F {
        depths: alloc::rc::Rc<core::cell::RefCell<Vec<usize>>>,
        state: u8,
    }

    impl Suspendable for F {
        fn poll(&mut self, cx: &mut TaskCx<'_>) -> Poll {
            match self.state {
                0 => {
                    self.state = 1;
                    cx.call(Box::new(G {
                        depths: self.depths.clone(),
                        awaiting: false,
                    }))
                    .unwrap();
                    Poll::Pending
                }
                1 => {
                    self.state = 2;
                    self.depths.borrow_mut().push(cx.depth());
                    let mut y = crate::yield_now::yield_now();
                    crate::Awaitable::suspend(&mut y, cx);
                    Poll::Pending
                }
                _ => {
                    self.depths.borrow_mut().push(cx.depth());
                    Poll::Ready
                }
            }
        }
    }

    struct T {
        depths: alloc::rc::Rc<core::cell::RefCell<Vec<usize>>>,
        state: u8,
    }

    impl Suspendable for T {
        fn poll(&mut self, cx: &mut TaskCx<'_>) -> Poll {
            match self.state {
                0 => {
                    self.state = 1;
                    cx.call(Box::new(F {
                        depths: self.depths.clone(),
                        state: 0,
                    }))
                    .unwrap();
                    Poll::Pending
                }
                1 => {
                    self.state = 2;
                    self.depths.borrow_mut().push(cx.depth());
                    let mut y = crate::yield_now::yield_now();
                    crate::Awaitable::suspend(&mut y, cx);
                    Poll::Pending
                }
                _ => {
                    self.depths.borrow_mut().push(cx.depth());
                    Poll::Ready
                }
            }
        }
    }

    #[test]
    fn nested_calls_report_depth_at_each_poll() {
        let depths = alloc::rc::Rc::new(core::cell::RefCell::new(Vec::new()));
        let mut s: Scheduler<4> = Scheduler::new();
        let id = s
            .spawn(Box::new(T {
                depths: depths.clone(),
                state: 0,
            }))
            .unwrap();
        s.run();
        assert_eq!(s.state(id), Some(TaskState::Done));
        assert_eq!(&*depths.borrow(), &[2, 2, 1, 1, 0, 0]);
    }

    #[test]
    fn timer_and_event_coexist_on_one_scheduler() {
        let clock = MockClock::new(0);
        let timers: TimerService<MockClock, 2> = TimerService::new(clock);
        let event = crate::event::Event::new();

        struct Waits<'a> {
            event: &'a crate::event::Event,
            waiter: Option<crate::event::EventWaiter<'a>>,
        }
        impl Suspendable for Waits<'_> {
            fn poll(&mut self, cx: &mut TaskCx<'_>) -> Poll {
                let mut w = self
                    .waiter
                    .take()
                    .unwrap_or_else(|| self.event.wait().expect("event waiter capacity"));
                match crate::awaitable::drive(&mut w, cx) {
                    Some(()) => Poll::Ready,
                    None => {
                        self.waiter = Some(w);
                        Poll::Pending
                    }
                }
            }
        }

        let mut s: Scheduler<4> = Scheduler::new();
        let id = s
            .spawn(Box::new(Waits {
                event: &event,
                waiter: None,
            }))
            .unwrap();
        s.schedule_all_suspended();
        s.step();
        assert_eq!(s.state(id), Some(TaskState::Suspended));
        assert_eq!(timers.pending_count(), 0);

        assert!(event.activate(&mut s));
        s.step();
        assert_eq!(s.state(id), Some(TaskState::Done));
    }
}
