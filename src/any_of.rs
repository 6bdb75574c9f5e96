//! Wait for the first of several homogeneous awaitables to complete.
//!
//! The original's `any_of` is a C++ variadic-template combinator over
//! heterogeneous awaitable types, implemented with the tuple machinery in
//! `examples/original_source/corocore/include/corocore/direct_tuple.h`.
//! Rust has no such variadic generics without macro-generated impls for
//! every arity, so this crate narrows the combinator to a fixed-size,
//! *homogeneous* array of `Output = ()` awaitables (`Yield`/`EventWaiter`/
//! `Timer` all qualify) — see the crate docs' "AnyOf" design note.

use crate::awaitable::Awaitable;
use crate::scheduler::TaskCx;

/// Waits for the first of `K` children to become ready, resolving to the
/// winning child's index.
pub struct AnyOf<'a, const K: usize> {
    children: [&'a mut dyn Awaitable<Output = ()>; K],
}

impl<'a, const K: usize> AnyOf<'a, K> {
    /// Construct a combinator racing the given children.
    pub fn new(children: [&'a mut dyn Awaitable<Output = ()>; K]) -> Self {
        Self { children }
    }
}

impl<const K: usize> Awaitable for AnyOf<'_, K> {
    type Output = usize;

    fn ready(&self) -> bool {
        self.children.iter().any(|c| c.ready())
    }

    fn suspend(&mut self, cx: &mut TaskCx<'_>) -> bool {
        let mut scheduled = false;
        for child in &mut self.children {
            if child.suspend(cx) {
                scheduled = true;
            }
        }
        scheduled
    }

    fn resume(&mut self) -> usize {
        let winner = self
            .children
            .iter()
            .position(|c| c.ready())
            .expect("AnyOf::resume called while no child is ready");
        for child in &mut self.children {
            child.resume();
        }
        winner
    }
}
