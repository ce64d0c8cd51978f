//! Cooperative stop flag shared between the crawl loop and signal handlers

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable handle to a stop flag
///
/// The crawl loop checks the flag before taking each work item; a fetch or
/// store call already in progress runs to completion.
#[derive(Debug, Clone, Default)]
pub struct StopController {
    stopped: Arc<AtomicBool>,
}

impl StopController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the crawl loop to stop
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }

    /// Check if a stop has been requested
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }
}
