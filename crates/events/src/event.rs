use chrono::{DateTime, Utc};

/// A notification about something that already happened.
///
/// Events are immutable facts. Consumers (toasts, logs, audit sinks) must not
/// rely on receiving every event exactly once.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name (e.g. "geo.level.fetch_failed").
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type.
    fn version(&self) -> u32;

    /// Wall-clock time the event was raised.
    fn occurred_at(&self) -> DateTime<Utc>;
}
