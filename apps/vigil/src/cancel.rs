use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative run cancellation, set from a signal handler.
///
/// Clones share state.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Cancel, returning whether cancellation had already been requested.
    pub fn request_cancel(&self) -> bool {
        self.cancelled.swap(true, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let token = CancellationToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());
        token.cancel();
        assert!(other.is_cancelled());
    }

    #[test]
    fn test_request_cancel_reports_repeat() {
        let token = CancellationToken::new();
        assert!(!token.request_cancel());
        assert!(token.is_cancelled());
        assert!(token.clone().request_cancel());
    }
}
