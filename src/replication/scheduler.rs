//! Fixed-rate packet emission scheduling
//!
//! The scheduler turns irregular tick deltas into a steady packet cadence by
//! accumulating elapsed time against the emission period. On emission the
//! period is subtracted rather than the accumulator cleared, so leftover time
//! carries into the next tick and the long-run rate converges on the
//! configured frequency no matter how jittery the host tick is.

use crate::error::ConfigError;

/// Emitted when enough time has accumulated for the next packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketDue {
    /// Sequence number for the packet to build, starting at 0
    pub sequence: u32,
}

/// Accumulator-driven packet scheduler.
#[derive(Debug, Clone)]
pub struct PacketScheduler {
    enabled: bool,
    /// Emission period in seconds (1 / rate)
    period: f64,
    /// Time accumulated toward the next emission. f64 so residuals do not
    /// erode over long sessions.
    accumulated: f64,
    next_sequence: u32,
}

impl PacketScheduler {
    /// Create a scheduler emitting at `update_rate_hz`.
    ///
    /// Rejects non-positive or non-finite rates.
    pub fn new(update_rate_hz: f32, enabled: bool) -> Result<Self, ConfigError> {
        if !update_rate_hz.is_finite() || update_rate_hz <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "packets.update_rate_hz".to_string(),
                message: format!("Update rate must be positive, got {}", update_rate_hz),
            });
        }

        Ok(Self {
            enabled,
            period: 1.0 / f64::from(update_rate_hz),
            accumulated: 0.0,
            next_sequence: 0,
        })
    }

    /// Advance the scheduler by one tick of `dt` seconds.
    ///
    /// Returns at most one [`PacketDue`] per call: a delta spanning several
    /// periods emits once and keeps the surplus in the accumulator, so the
    /// following ticks emit again sooner instead of batching.
    pub fn tick(&mut self, dt: f32) -> Option<PacketDue> {
        if !self.enabled {
            return None;
        }

        self.accumulated += f64::from(dt.max(0.0));

        if self.accumulated < self.period {
            return None;
        }

        self.accumulated -= self.period;
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        Some(PacketDue { sequence })
    }

    /// Whether the scheduler emits at all
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Sequence number the next emission will carry
    pub fn next_sequence(&self) -> u32 {
        self.next_sequence
    }

    /// The emission period in seconds
    pub fn period(&self) -> f64 {
        self.period
    }
}
