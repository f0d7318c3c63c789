//! Cooperative cancellation for in-flight parses.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared cancellation signal.
///
/// Cloning hands out another handle to the same flag; the parse pipeline
/// checks it between page recognitions and after field extraction.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a fresh, unset token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_starts_unset() {
        assert!(!CancelToken::new().is_cancelled());
    }

    #[test]
    fn test_clones_share_state() {
        let token = CancelToken::new();
        let other = token.clone();
        token.cancel();
        assert!(other.is_cancelled());
    }
}
