use std::sync::atomic::{AtomicBool, Ordering};

/// Process-wide "scan in progress" flag with acquire-or-skip semantics
#[derive(Debug, Default)]
pub struct ProcessingGuard {
    busy: AtomicBool,
}

/// Held for the duration of one scan; releases the guard when dropped
#[derive(Debug)]
pub struct ProcessingPermit<'a> {
    guard: &'a ProcessingGuard,
}

impl ProcessingGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `None` when another scan holds the guard
    pub fn try_acquire(&self) -> Option<ProcessingPermit<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ProcessingPermit { guard: self })
    }

    pub fn is_held(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for ProcessingPermit<'_> {
    fn drop(&mut self) {
        self.guard.busy.store(false, Ordering::Release);
    }
}
