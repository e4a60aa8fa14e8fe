//! Event sink trait and implementations.

use async_trait::async_trait;
use tracing::{debug, info, Level};

use super::RecoveryEvent;

/// Trait for sinks that receive recovery lifecycle events.
///
/// The orchestrator publishes every state change through its sink; clients
/// use it for realtime status pushes, metrics, or test assertions.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emits an event asynchronously.
    async fn emit(&self, event: &RecoveryEvent);

    /// Emits an event without blocking.
    ///
    /// Must never panic; errors are logged and suppressed.
    fn try_emit(&self, event: &RecoveryEvent);
}

/// A no-op sink that discards all events.
///
/// Used as the default when no sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event: &RecoveryEvent) {
        // Intentionally empty - discards all events
    }

    fn try_emit(&self, _event: &RecoveryEvent) {
        // Intentionally empty - discards all events
    }
}

/// A sink that logs events through the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Creates a logging sink at the specified level.
    #[must_use]
    pub const fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub const fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    /// Creates an info-level logging sink.
    #[must_use]
    pub const fn info() -> Self {
        Self::new(Level::INFO)
    }

    fn log_event(&self, event: &RecoveryEvent) {
        if self.level == Level::DEBUG {
            debug!(
                event = event.name(),
                execution_id = %event.execution_id(),
                payload = ?event,
                "Event: {}", event.name()
            );
        } else {
            info!(
                event = event.name(),
                execution_id = %event.execution_id(),
                payload = ?event,
                "Event: {}", event.name()
            );
        }
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, event: &RecoveryEvent) {
        self.log_event(event);
    }

    fn try_emit(&self, event: &RecoveryEvent) {
        self.log_event(event);
    }
}

/// A collecting sink for testing.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: parking_lot::RwLock<Vec<RecoveryEvent>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<RecoveryEvent> {
        self.events.read().clone()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Clears all collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    /// Returns the collected event names in order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.events.read().iter().map(RecoveryEvent::name).collect()
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, event: &RecoveryEvent) {
        self.events.write().push(event.clone());
    }

    fn try_emit(&self, event: &RecoveryEvent) {
        self.events.write().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cleanup_event() -> RecoveryEvent {
        RecoveryEvent::RecoveryDataCleanup {
            execution_id: "e1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_noop_sink() {
        let sink = NoOpEventSink;
        sink.emit(&cleanup_event()).await;
        sink.try_emit(&cleanup_event());
        // Should not panic
    }

    #[tokio::test]
    async fn test_logging_sink() {
        let sink = LoggingEventSink::default();
        sink.emit(&cleanup_event()).await;
        sink.try_emit(&cleanup_event());
        // Should not panic
    }

    #[tokio::test]
    async fn test_collecting_sink() {
        let sink = CollectingEventSink::new();
        assert!(sink.is_empty());

        sink.emit(&cleanup_event()).await;
        sink.try_emit(&RecoveryEvent::RecoveryError {
            execution_id: "e1".to_string(),
            message: "boom".to_string(),
        });

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.names(), ["recovery_data_cleanup", "recovery_error"]);

        sink.clear();
        assert!(sink.is_empty());
    }
}
