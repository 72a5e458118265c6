//! Registry configuration

use std::str::FromStr;

/// What happens to a subscriber that falls too far behind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Skip the oldest queued envelopes and keep streaming
    #[default]
    DropOldest,
    /// End the subscriber's stream
    Disconnect,
}

impl OverflowPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverflowPolicy::DropOldest => "drop-oldest",
            OverflowPolicy::Disconnect => "disconnect",
        }
    }
}

impl FromStr for OverflowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "drop-oldest" => Ok(OverflowPolicy::DropOldest),
            "disconnect" => Ok(OverflowPolicy::Disconnect),
            other => Err(format!(
                "Invalid overflow policy: '{}'. Expected 'drop-oldest' or 'disconnect'",
                other
            )),
        }
    }
}

impl std::fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Largest accepted per-subscriber queue bound
pub const MAX_SUBSCRIBER_CAPACITY: usize = 1 << 16;

/// Configuration for the application registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Envelopes a subscriber may have queued before the overflow policy applies
    ///
    /// The queue is a power of two between 1 and [`MAX_SUBSCRIBER_CAPACITY`].
    /// Other values are rounded up (or clamped) when a dispatcher starts.
    pub subscriber_capacity: usize,

    /// Policy for subscribers exceeding `subscriber_capacity`
    pub overflow_policy: OverflowPolicy,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            subscriber_capacity: 64,
            overflow_policy: OverflowPolicy::DropOldest,
        }
    }
}

impl RegistryConfig {
    /// Set the per-subscriber queue bound
    ///
    /// Clamped to `1..=MAX_SUBSCRIBER_CAPACITY` and rounded up to the next
    /// power of two, so `100` queues 128 envelopes.
    pub fn subscriber_capacity(mut self, capacity: usize) -> Self {
        self.subscriber_capacity = normalize_capacity(capacity);
        self
    }

    /// Set the overflow policy
    pub fn overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow_policy = policy;
        self
    }

    /// Queue bound a dispatcher actually allocates
    pub fn queue_capacity(&self) -> usize {
        normalize_capacity(self.subscriber_capacity)
    }
}

fn normalize_capacity(capacity: usize) -> usize {
    capacity
        .clamp(1, MAX_SUBSCRIBER_CAPACITY)
        .next_power_of_two()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RegistryConfig::default();

        assert_eq!(config.subscriber_capacity, 64);
        assert_eq!(config.overflow_policy, OverflowPolicy::DropOldest);
    }

    #[test]
    fn test_builder_capacity_floor() {
        let config = RegistryConfig::default().subscriber_capacity(0);

        assert_eq!(config.subscriber_capacity, 1);
    }

    #[test]
    fn test_builder_capacity_rounds_to_power_of_two() {
        assert_eq!(
            RegistryConfig::default()
                .subscriber_capacity(100)
                .subscriber_capacity,
            128
        );
        assert_eq!(
            RegistryConfig::default().subscriber_capacity(3).subscriber_capacity,
            4
        );
    }

    #[test]
    fn test_builder_capacity_ceiling() {
        let config = RegistryConfig::default().subscriber_capacity(usize::MAX);
        assert_eq!(config.subscriber_capacity, MAX_SUBSCRIBER_CAPACITY);

        let config = RegistryConfig::default().subscriber_capacity(MAX_SUBSCRIBER_CAPACITY + 1);
        assert_eq!(config.subscriber_capacity, MAX_SUBSCRIBER_CAPACITY);
    }

    #[test]
    fn test_queue_capacity_of_unbuilt_config() {
        let config = RegistryConfig {
            subscriber_capacity: usize::MAX,
            ..Default::default()
        };
        assert_eq!(config.queue_capacity(), MAX_SUBSCRIBER_CAPACITY);

        let config = RegistryConfig {
            subscriber_capacity: 0,
            ..Default::default()
        };
        assert_eq!(config.queue_capacity(), 1);
    }

    #[test]
    fn test_builder_chaining() {
        let config = RegistryConfig::default()
            .subscriber_capacity(8)
            .overflow_policy(OverflowPolicy::Disconnect);

        assert_eq!(config.subscriber_capacity, 8);
        assert_eq!(config.overflow_policy, OverflowPolicy::Disconnect);
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!(
            "drop-oldest".parse::<OverflowPolicy>(),
            Ok(OverflowPolicy::DropOldest)
        );
        assert_eq!(
            "disconnect".parse::<OverflowPolicy>(),
            Ok(OverflowPolicy::Disconnect)
        );
        assert!("block".parse::<OverflowPolicy>().is_err());
        assert_eq!(OverflowPolicy::Disconnect.to_string(), "disconnect");
    }
}
