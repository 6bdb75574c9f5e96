//! The bounded LIFO call stack of nested suspendable frames.
//!
//! A nested frame pushes itself onto its owning task's call stack when
//! first awaited, and is popped when it returns; while non-empty, resuming
//! the task means resuming the frame at the top. There is no teacher
//! precedent for this concept (the teacher has no nested-call notion); it
//! follows the spec's own "arena + index if pinning is impractical"
//! guidance, realized here as a plain bounded `Vec` of boxed frames
//! manipulated by pop/insert/push rather than raw pointers — see
//! `Scheduler`'s resume loop for why plain push/pop is not enough on its
//! own once a frame itself pushes a child mid-poll.

use alloc::boxed::Box;

use crate::task::Suspendable;

/// Maximum nesting depth of suspendable calls within a single task.
pub const MAX_CALL_DEPTH: usize = 8;

pub(crate) type CallStack = heapless::Vec<Box<dyn Suspendable>, MAX_CALL_DEPTH>;
