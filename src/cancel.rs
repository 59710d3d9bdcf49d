//! Cooperative cancellation (spec.md §5, §9 design note).
//!
//! A small, polymorphic "is-cancelled?" predicate threaded through operations that
//! can be long-running (filter decoding, page-tree walks, bulk load). Replaces any
//! host-specific async cancellation mechanism, since this crate defines no async
//! surface of its own.

use std::sync::atomic::{AtomicBool, Ordering};

/// Polled at coarse checkpoints: next object, next filter stage, next page-tree hop.
pub trait Cancel {
    fn is_cancelled(&self) -> bool;
}

/// Zero-cost `Cancel` that never cancels; the default for every public entry point
/// that does not take a cancellation token explicitly.
#[derive(Debug, Clone, Copy, Default)]
pub struct Never;

impl Cancel for Never {
    #[inline]
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// An `AtomicBool`-backed flag a caller can flip from another thread to abort a
/// long-running operation.
#[derive(Debug, Default)]
pub struct Flag(AtomicBool);

impl Flag {
    pub fn new() -> Flag {
        Flag(AtomicBool::new(false))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }
}

impl Cancel for Flag {
    fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl<T: Cancel + ?Sized> Cancel for &T {
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}
