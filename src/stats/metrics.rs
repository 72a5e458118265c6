//! Statistics for registered applications

use std::time::Duration;

use crate::registry::Envelope;

/// Point-in-time statistics of one application
///
/// Produced by the application's dispatcher, so the snapshot reflects every
/// command enqueued before the stats request.
#[derive(Debug, Clone, Default)]
pub struct ApplicationStats {
    /// Number of attached subscribers
    pub subscriber_count: usize,
    /// `event` envelopes dispatched
    pub events_published: u64,
    /// Envelopes of any other kind dispatched
    pub actions_published: u64,
    /// Envelopes skipped by lagging subscribers
    pub envelopes_dropped: u64,
    /// Current replay cache
    pub last_event: Option<Envelope>,
    /// Envelopes queued but not yet read by the slowest subscriber
    ///
    /// Reaches `queue_capacity` when a subscriber has stopped reading, even
    /// if that subscriber never reports its lag.
    pub max_backlog: usize,
    /// Per-subscriber queue bound
    pub queue_capacity: usize,
    /// Time since the application was registered
    pub uptime: Duration,
}

impl ApplicationStats {
    /// Total envelopes dispatched
    pub fn envelopes_published(&self) -> u64 {
        self.events_published + self.actions_published
    }

    /// Whether a late joiner would receive a replay
    pub fn has_replay(&self) -> bool {
        self.last_event.is_some()
    }

    /// Whether the slowest subscriber's queue is full
    pub fn is_stalled(&self) -> bool {
        self.queue_capacity > 0 && self.max_backlog >= self.queue_capacity
    }
}
