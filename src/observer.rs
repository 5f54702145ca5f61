//! Gate for table-change observation.
//!
//! Structural work (drop commits, reorder passes) mutates the very table the
//! observer watches. Holding a [`PauseGuard`] suppresses observer-driven
//! refreshes until the guard is dropped, so the pipeline never re-enters
//! itself through its own side effects.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts active pauses; observation is live when none are held.
#[derive(Debug, Default)]
pub struct ObserverGate {
    pauses: AtomicUsize,
}

impl ObserverGate {
    /// Creates an open gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether table changes should currently be acted on.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.pauses.load(Ordering::SeqCst) == 0
    }

    /// Suspends observation until the returned guard is dropped.
    #[must_use = "observation resumes as soon as the guard is dropped"]
    pub fn pause(&self) -> PauseGuard<'_> {
        self.pauses.fetch_add(1, Ordering::SeqCst);
        PauseGuard { gate: self }
    }
}

/// Resumes observation on drop.
#[derive(Debug)]
pub struct PauseGuard<'a> {
    gate: &'a ObserverGate,
}

impl Drop for PauseGuard<'_> {
    fn drop(&mut self) {
        self.gate.pauses.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_pauses_resume_after_last_guard() {
        let gate = ObserverGate::new();
        assert!(gate.is_active());
        let outer = gate.pause();
        {
            let _inner = gate.pause();
            assert!(!gate.is_active());
        }
        assert!(!gate.is_active());
        drop(outer);
        assert!(gate.is_active());
    }
}
