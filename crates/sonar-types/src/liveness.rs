use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag recording whether the SUT can still respond in the current query.
///
/// Cloning yields another handle to the same flag. The mapper and the process
/// layers mark it dead; the liveness wrapper revives it at the start of each query.
#[derive(Debug, Clone)]
pub struct LivenessTracker {
    alive: Arc<AtomicBool>,
}

impl LivenessTracker {
    pub fn new() -> Self {
        Self {
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    pub fn mark_dead(&self) {
        if self.alive.swap(false, Ordering::SeqCst) {
            tracing::debug!("SUT liveness lost");
        }
    }

    pub fn revive(&self) {
        self.alive.store(true, Ordering::SeqCst);
    }
}

impl Default for LivenessTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let tracker = LivenessTracker::new();
        let other = tracker.clone();
        assert!(other.is_alive());

        tracker.mark_dead();
        assert!(!other.is_alive());

        other.revive();
        assert!(tracker.is_alive());
    }
}
