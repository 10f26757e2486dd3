//! Simulated think time.
//!
//! The selection itself is fast; results are held back so a tier appears to
//! deliberate for a share of its time budget. The delay is an async sleep on
//! the Tokio timer, so waiting never ties up a worker thread.

use std::time::Duration;

use tokio::time::{sleep_until, Instant};

use crate::levels::level_catalog::EngineLevel;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThinkTimeConfig {
    /// Share of the tier's time budget spent "thinking".
    pub factor: f64,
    /// Upper bound on the simulated delay.
    pub cap: Duration,
    /// Minimum time between the request and its completion.
    pub floor: Duration,
}

impl ThinkTimeConfig {
    /// No simulated delay at all.
    pub const INSTANT: ThinkTimeConfig = ThinkTimeConfig {
        factor: 0.0,
        cap: Duration::ZERO,
        floor: Duration::ZERO,
    };
}

impl Default for ThinkTimeConfig {
    fn default() -> Self {
        Self {
            factor: 0.5,
            cap: Duration::from_millis(1500),
            floor: Duration::from_millis(150),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThinkTimeSimulator {
    config: ThinkTimeConfig,
}

impl ThinkTimeSimulator {
    pub fn new(config: ThinkTimeConfig) -> Self {
        Self { config }
    }

    /// `min(time_budget * factor, cap)`.
    pub fn delay_for(&self, level: &EngineLevel) -> Duration {
        let factor = if self.config.factor.is_finite() {
            self.config.factor.max(0.0)
        } else {
            0.0
        };
        let scaled_ms = (level.time_budget_ms as f64 * factor).round() as u64;
        Duration::from_millis(scaled_ms).min(self.config.cap)
    }

    /// How long after the request the result may be released.
    pub fn minimum_completion(&self, level: &EngineLevel) -> Duration {
        self.delay_for(level).max(self.config.floor)
    }

    /// Sleeps until `minimum_completion` has passed since `started`. Returns
    /// immediately when the selection already took longer.
    pub async fn deliberate(&self, level: &EngineLevel, started: Instant) {
        sleep_until(started + self.minimum_completion(level)).await;
    }
}

impl Default for ThinkTimeSimulator {
    fn default() -> Self {
        Self::new(ThinkTimeConfig::default())
    }
}
