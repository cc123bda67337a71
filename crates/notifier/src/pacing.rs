//! Timing policy for the dispatch loop.

use std::time::Duration;

use rand::{Rng, RngCore, SeedableRng};

use courier_common::config::DispatchConfig;

/// Fixed waits plus the jittered pause between contacts.
pub struct Pacing {
    idle: Duration,
    backoff: Duration,
    min_delay: Duration,
    max_delay: Duration,
    rng: Box<dyn RngCore + Send>,
}

impl Pacing {
    /// Build from config with an explicit random source.
    pub fn new(config: &DispatchConfig, rng: Box<dyn RngCore + Send>) -> Self {
        let min_delay = Duration::from_secs(config.min_delay_secs);
        let max_delay = Duration::from_secs(config.max_delay_secs).max(min_delay);
        Self {
            idle: Duration::from_secs(config.idle_secs),
            backoff: Duration::from_secs(config.backoff_secs),
            min_delay,
            max_delay,
            rng,
        }
    }

    /// Build from config, seeding from the OS.
    pub fn from_entropy(config: &DispatchConfig) -> Self {
        Self::new(config, Box::new(rand::rngs::StdRng::from_entropy()))
    }

    /// Wait after an empty poll.
    pub fn idle(&self) -> Duration {
        self.idle
    }

    /// Wait after a failed poll.
    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Uniformly distributed pause in `[min_delay, max_delay]`, millisecond
    /// resolution.
    pub fn next_delay(&mut self) -> Duration {
        let lo = self.min_delay.as_millis() as u64;
        let hi = self.max_delay.as_millis() as u64;
        Duration::from_millis(self.rng.gen_range(lo..=hi))
    }
}
