use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared flag telling the host that an active session owns double-tap.
///
/// The host keeps one handle and asks [`GestureClaim::is_claimed`] before
/// running its own double-tap action; the drawing session holds a clone
/// and claims it for its lifetime.
#[derive(Debug, Clone, Default)]
pub struct GestureClaim(Arc<AtomicBool>);

impl GestureClaim {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_claimed(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
