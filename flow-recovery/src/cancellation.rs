//! Cancellation token for cooperative cancellation.
//!
//! The retry backoff wait is the one deliberately long suspension in this
//! engine; a shared token lets the caller abort in-flight waits (e.g. on
//! user cancellation or shutdown) instead of letting them sleep out.

use parking_lot::RwLock;
use tokio::sync::watch;

/// A token for cooperative cancellation.
///
/// Cancellation is idempotent - only the first cancellation reason is kept.
/// Unlike a plain flag, the token can be awaited, so a backoff sleep can
/// race against it with `tokio::select!`.
#[derive(Debug)]
pub struct CancellationToken {
    tx: watch::Sender<bool>,
    reason: RwLock<Option<String>>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            tx,
            reason: RwLock::new(None),
        }
    }
}

impl CancellationToken {
    /// Creates a new token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation with a reason.
    ///
    /// Idempotent - only the first reason is kept. Pending `cancelled()`
    /// waits resolve immediately.
    pub fn cancel(&self, reason: impl Into<String>) {
        {
            let mut guard = self.reason.write();
            if guard.is_none() {
                *guard = Some(reason.into());
            }
        }
        let _ = self.tx.send(true);
    }

    /// Returns whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Returns the cancellation reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        self.reason.read().clone()
    }

    /// Resolves once cancellation has been requested.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        if *rx.borrow() {
            return;
        }
        while rx.changed().await.is_ok() {
            if *rx.borrow() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_default_not_cancelled() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        assert!(token.reason().is_none());
    }

    #[test]
    fn test_cancel_keeps_first_reason() {
        let token = CancellationToken::new();
        token.cancel("user requested");
        token.cancel("shutdown");

        assert!(token.is_cancelled());
        assert_eq!(token.reason(), Some("user requested".to_string()));
    }

    #[tokio::test]
    async fn test_cancelled_resolves_immediately_when_already_cancelled() {
        let token = CancellationToken::new();
        token.cancel("done");
        token.cancelled().await;
    }

    #[tokio::test]
    async fn test_cancelled_wakes_pending_waiter() {
        let token = Arc::new(CancellationToken::new());
        let waiter = {
            let token = Arc::clone(&token);
            tokio::spawn(async move {
                token.cancelled().await;
            })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel("now");

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
