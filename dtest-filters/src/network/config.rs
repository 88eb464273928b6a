//! Configuration for the simulated network.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Latency settings for [`SimNetwork`](super::SimNetwork).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfiguration {
    /// Latency added to every permitted message.
    pub base_latency: Duration,

    /// Upper bound for a single filter delay. Longer delays are clamped.
    pub max_filter_delay: Duration,
}

impl Default for NetworkConfiguration {
    fn default() -> Self {
        Self {
            base_latency: Duration::ZERO,
            max_filter_delay: Duration::from_secs(60),
        }
    }
}

impl NetworkConfiguration {
    /// Create a configuration with explicit values.
    pub fn new(base_latency: Duration, max_filter_delay: Duration) -> Self {
        Self {
            base_latency,
            max_filter_delay,
        }
    }

    /// No added latency; filter delays capped at one second.
    pub fn fast_local() -> Self {
        Self {
            base_latency: Duration::ZERO,
            max_filter_delay: Duration::from_secs(1),
        }
    }

    /// Set the latency added to every permitted message.
    pub fn with_base_latency(mut self, base_latency: Duration) -> Self {
        self.base_latency = base_latency;
        self
    }

    /// Total delay for one message given the delays chosen by both filter
    /// chains.
    pub(crate) fn total_delay(&self, outbound: Duration, inbound: Duration) -> Duration {
        self.base_latency
            .saturating_add(outbound.min(self.max_filter_delay))
            .saturating_add(inbound.min(self.max_filter_delay))
    }
}
