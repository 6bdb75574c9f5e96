//! The scheduler: owns task lifecycles and state, maintains the ready
//! queue, and drives execution one task at a time.
//!
//! Grounded on the teacher's `scheduler::scheduler::Scheduler` (the
//! `Vec<Thread>` + `VecDeque<ThreadId>` ready-queue mechanism) and
//! `scheduler::mod`'s `static SCHEDULER: Mutex<Option<Scheduler>>` singleton
//! plumbing, with the mechanism/policy split mirrored from
//! `scheduler::traits::{Scheduler, KernelSchedCtx}`: awaitables only ever
//! see `&mut dyn SchedulerProtocol`, never the concrete, capacity-generic
//! `Scheduler<N>`.

use alloc::boxed::Box;

use crate::error::SchedError;
use crate::frame::CallStack;
use crate::task::{Poll, Priority, Suspendable, TaskId, TaskState};

/// The internal protocol awaitables use to move a task between states.
///
/// Kept separate from [`Scheduler<N>`] so that [`crate::yield_now::Yield`],
/// [`crate::event::EventWaiter`], [`crate::timer::Timer`], and
/// [`crate::any_of::AnyOf`] never need to be generic over the task table's
/// capacity `N`.
pub trait SchedulerProtocol {
    /// If `task` is `Active`, transition it to `Scheduled` and append it to
    /// the ready queue; otherwise a no-op returning `false`.
    fn schedule_if_active(&mut self, task: TaskId) -> bool;
    /// Symmetric to [`SchedulerProtocol::schedule_if_active`] for the
    /// `Suspended -> Scheduled` transition.
    fn schedule_if_suspended(&mut self, task: TaskId) -> bool;
    /// If `task` is `Active`, transition it to `Suspended`; otherwise a
    /// no-op returning `false`.
    fn suspend_if_active(&mut self, task: TaskId) -> bool;
}

/// The suspension context passed to every [`Suspendable::poll`] call.
///
/// Carries the identity of the task currently being resumed, its call
/// stack (so a frame can push a nested call), its own nesting depth, and
/// scheduler access for awaitables to use via [`SchedulerProtocol`].
pub struct TaskCx<'a> {
    task_id: TaskId,
    depth: usize,
    callstack: &'a mut CallStack,
    sched: &'a mut dyn SchedulerProtocol,
}

impl<'a> TaskCx<'a> {
    /// The id of the task currently being resumed.
    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Current nesting depth: the level of the frame currently being
    /// polled, counting the task body itself as depth 0 and each nested
    /// call one level deeper than its caller (a frame calling `cx.call`
    /// from depth 0 pushes a frame that is itself polled at depth 1, and so
    /// on). This is the frame's own level, not the count of frames below
    /// it, so it stays constant across that frame's suspend and its later
    /// resume.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Push a nested frame onto the current task's call stack. The frame
    /// begins running within the same scheduler step, per the "transfers
    /// control to its own entry point" semantics of a nested-frame call.
    pub fn call(&mut self, frame: Box<dyn Suspendable>) -> Result<(), SchedError> {
        self.callstack
            .push(frame)
            .map_err(|_| SchedError::CapacityExceeded)
    }

    pub(crate) fn schedule_if_active(&mut self) -> bool {
        self.sched.schedule_if_active(self.task_id)
    }

    pub(crate) fn schedule_if_suspended(&mut self) -> bool {
        self.sched.schedule_if_suspended(self.task_id)
    }

    pub(crate) fn suspend_if_active(&mut self) -> bool {
        self.sched.suspend_if_active(self.task_id)
    }
}

#[derive(Clone, Copy)]
struct SlotMeta {
    id: TaskId,
    occupied: bool,
    state: TaskState,
    #[allow(dead_code)]
    priority: Priority,
}

struct BodyCell {
    body: Box<dyn Suspendable>,
    callstack: CallStack,
}

impl BodyCell {
    /// Resume this task's body (and any nested frames on its call stack)
    /// until it either completes or hits a suspension point that does not
    /// grow the call stack.
    ///
    /// A nested frame "transfers control to its own entry point" when
    /// pushed, so after any poll that grows the call stack the loop keeps
    /// going and polls the new top immediately, within the same step.
    /// After any poll that completes (`Poll::Ready`), the loop also keeps
    /// going, to resume whatever is now on top. The loop only returns
    /// `Poll::Pending` out of this step once a poll leaves the stack depth
    /// unchanged and itself reports `Pending`.
    fn resume(&mut self, task_id: TaskId, sched: &mut dyn SchedulerProtocol) -> Poll {
        loop {
            if let Some(mut top) = self.callstack.pop() {
                let pos = self.callstack.len();
                // `top` was just popped off, so the frames left below it
                // (`pos` of them) plus `top` itself give its own nesting
                // level; the task body is implicitly level 0, so the first
                // nested call sits at level 1, per `TaskCx::depth`'s contract.
                let mut cx = TaskCx {
                    task_id,
                    depth: pos + 1,
                    callstack: &mut self.callstack,
                    sched: &mut *sched,
                };
                match top.poll(&mut cx) {
                    Poll::Ready => continue,
                    Poll::Pending => {
                        let grew = self.callstack.len() > pos;
                        if grew {
                            // A child frame was pushed during this poll; put
                            // the parent back *below* it, preserving LIFO
                            // order, since the child must run (and complete)
                            // before the parent is resumed again.
                            let _ = self.callstack.insert(pos, top);
                            continue;
                        }
                        let _ = self.callstack.push(top);
                        return Poll::Pending;
                    }
                }
            } else {
                let mut cx = TaskCx {
                    task_id,
                    depth: 0,
                    callstack: &mut self.callstack,
                    sched: &mut *sched,
                };
                match self.body.poll(&mut cx) {
                    Poll::Ready => return Poll::Ready,
                    Poll::Pending => {
                        if self.callstack.is_empty() {
                            return Poll::Pending;
                        }
                        continue;
                    }
                }
            }
        }
    }
}

/// The cooperative, single-threaded task scheduler. `N` is the configured
/// `max_task_count`: the capacity of both the task table and the ready
/// queue.
pub struct Scheduler<const N: usize> {
    slots: heapless::Vec<SlotMeta, N>,
    bodies: heapless::Vec<Option<BodyCell>, N>,
    ready: heapless::Deque<TaskId, N>,
    next_id: u32,
}

impl<const N: usize> Default for Scheduler<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Scheduler<N> {
    /// Construct an empty scheduler with no registered tasks.
    pub fn new() -> Self {
        let mut slots = heapless::Vec::new();
        let mut bodies = heapless::Vec::new();
        for _ in 0..N {
            let _ = slots.push(SlotMeta {
                id: TaskId(0),
                occupied: false,
                state: TaskState::Inactive,
                priority: Priority::default(),
            });
            let _ = bodies.push(None);
        }
        Self {
            slots,
            bodies,
            ready: heapless::Deque::new(),
            next_id: 1,
        }
    }

    fn slot_index(&self, id: TaskId) -> Option<usize> {
        self.slots.iter().position(|s| s.occupied && s.id == id)
    }

    /// Register a new task body with the scheduler. The task is
    /// immediately transitioned to `Suspended`; it becomes eligible to run
    /// only after [`Scheduler::schedule_all_suspended`] (or an implicit
    /// wake from an awaitable it is not yet waiting on, which cannot
    /// happen before its first resume).
    ///
    /// Fails with [`SchedError::CapacityExceeded`] when the task table is
    /// full; no [`TaskId`] is allocated in that case; see `DESIGN.md` for
    /// why this differs from the spec's "Zombie-observable" framing.
    pub fn spawn(&mut self, body: Box<dyn Suspendable>) -> Result<TaskId, SchedError> {
        let idx = self
            .slots
            .iter()
            .position(|s| !s.occupied)
            .ok_or(SchedError::CapacityExceeded)?;
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.slots[idx] = SlotMeta {
            id,
            occupied: true,
            state: TaskState::Suspended,
            priority: Priority::default(),
        };
        self.bodies[idx] = Some(BodyCell {
            body,
            callstack: heapless::Vec::new(),
        });
        log::debug!("{id} spawned");
        Ok(id)
    }

    /// Remove a task from the scheduler, dropping its body and any pending
    /// nested frames. Also removes it from the ready queue if present.
    /// Returns `false` if `id` is not currently registered.
    pub fn unregister_task(&mut self, id: TaskId) -> bool {
        let Some(idx) = self.slot_index(id) else {
            return false;
        };
        self.slots[idx].occupied = false;
        self.bodies[idx] = None;

        let mut kept = heapless::Deque::new();
        while let Some(t) = self.ready.pop_front() {
            if t != id {
                let _ = kept.push_back(t);
            }
        }
        self.ready = kept;
        log::debug!("{id} unregistered");
        true
    }

    /// Transition every `Suspended` task to `Scheduled` and append it to
    /// the ready queue. Idempotent: tasks already `Scheduled` (or in any
    /// other state) are untouched, so calling this twice in a row has the
    /// same effect as calling it once.
    pub fn schedule_all_suspended(&mut self) {
        for idx in 0..self.slots.len() {
            if self.slots[idx].occupied && self.slots[idx].state == TaskState::Suspended {
                let id = self.slots[idx].id;
                if self.ready.push_back(id).is_ok() {
                    self.slots[idx].state = TaskState::Scheduled;
                } else {
                    log::warn!("ready queue full; {id} stays Suspended");
                }
            }
        }
    }

    /// Pop the head of the ready queue and resume it for one step. Returns
    /// `false` (doing nothing) if the ready queue is empty.
    pub fn step(&mut self) -> bool {
        let Some(task_id) = self.ready.pop_front() else {
            return false;
        };
        let Some(idx) = self.slot_index(task_id) else {
            log::warn!("{task_id} popped from ready but no longer registered");
            return true;
        };
        self.slots[idx].state = TaskState::Active;

        let Some(mut entry) = self.bodies[idx].take() else {
            log::error!("{task_id} scheduled with no body");
            return true;
        };
        let result = entry.resume(task_id, self);

        match result {
            Poll::Ready => {
                self.slots[idx].state = TaskState::Done;
                log::debug!("{task_id} done");
            }
            Poll::Pending => {
                if self.slots[idx].state == TaskState::Active {
                    log::warn!("{task_id} left Active after resume; marking Zombie");
                    self.slots[idx].state = TaskState::Zombie;
                }
            }
        }
        self.bodies[idx] = Some(entry);
        true
    }

    /// Schedule every suspended task, then step until the ready queue is
    /// drained. For a self-contained program this is the closed-system
    /// instantiation of "loop step() forever"; a long-running embedded
    /// consumer should instead call `schedule_all_suspended`/`step`/other
    /// services' `step` directly from its own forever loop.
    pub fn run(&mut self) {
        self.schedule_all_suspended();
        while self.step() {}
    }

    /// The lifecycle state of `id`, or `None` if it is not registered.
    pub fn state(&self, id: TaskId) -> Option<TaskState> {
        self.slot_index(id).map(|idx| self.slots[idx].state)
    }

    /// Number of currently registered tasks.
    pub fn task_count(&self) -> usize {
        self.slots.iter().filter(|s| s.occupied).count()
    }

    /// Number of tasks currently in the ready queue.
    pub fn ready_len(&self) -> usize {
        self.ready.len()
    }
}

impl<const N: usize> SchedulerProtocol for Scheduler<N> {
    fn schedule_if_active(&mut self, task: TaskId) -> bool {
        let Some(idx) = self.slot_index(task) else {
            return false;
        };
        if self.slots[idx].state != TaskState::Active {
            return false;
        }
        if self.ready.push_back(task).is_err() {
            return false;
        }
        self.slots[idx].state = TaskState::Scheduled;
        true
    }

    fn schedule_if_suspended(&mut self, task: TaskId) -> bool {
        let Some(idx) = self.slot_index(task) else {
            return false;
        };
        if self.slots[idx].state != TaskState::Suspended {
            return false;
        }
        if self.ready.push_back(task).is_err() {
            return false;
        }
        self.slots[idx].state = TaskState::Scheduled;
        true
    }

    fn suspend_if_active(&mut self, task: TaskId) -> bool {
        let Some(idx) = self.slot_index(task) else {
            return false;
        };
        if self.slots[idx].state != TaskState::Active {
            return false;
        }
        self.slots[idx].state = TaskState::Suspended;
        true
    }
}

/// Optional process-wide singleton convenience layer, mirroring the
/// teacher's `static SCHEDULER: Mutex<Option<Scheduler>>` plus
/// `with_scheduler`/`with_scheduler_mut` accessors in `scheduler::mod`.
///
/// The crate's primary, test-friendly surface is an owned `Scheduler<N>`
/// threaded explicitly; this module exists for embedders who want ambient,
/// process-wide access instead (see `DESIGN.md`'s Open Question notes on
/// why tests do not use this).
pub mod global {
    use super::Scheduler;
    use spin::Mutex;

    /// Default task table / ready queue capacity for the global scheduler,
    /// mirroring the teacher's fixed `MAX_THREADS: usize = 64`.
    pub const DEFAULT_CAPACITY: usize = 64;

    static SCHEDULER: Mutex<Option<Scheduler<DEFAULT_CAPACITY>>> = Mutex::new(None);

    /// Initialize the global scheduler. Must be called before any task is
    /// constructed against it (see the crate docs' singleton design note).
    pub fn init() {
        *SCHEDULER.lock() = Some(Scheduler::new());
        log::info!("global scheduler initialized");
    }

    /// Run `f` with shared access to the global scheduler, if initialized.
    pub fn with_scheduler<R>(f: impl FnOnce(&Scheduler<DEFAULT_CAPACITY>) -> R) -> Option<R> {
        SCHEDULER.lock().as_ref().map(f)
    }

    /// Run `f` with exclusive access to the global scheduler, if
    /// initialized.
    pub fn with_scheduler_mut<R>(
        f: impl FnOnce(&mut Scheduler<DEFAULT_CAPACITY>) -> R,
    ) -> Option<R> {
        SCHEDULER.lock().as_mut().map(f)
    }
}
