//! Courtesy pacing between interactive actions.
//!
//! Automated bursts of fills and clicks read as scripted traffic; every
//! interaction is therefore followed by a randomized human-scale pause.
//! This is a soft throttle, not a correctness mechanism, so tests inject
//! [`NoDelayPacer`].

use async_trait::async_trait;
use std::time::{Duration, SystemTime};

#[async_trait]
pub trait Pacer: Send + Sync {
    /// Pause for roughly `base * multiplier`, with jitter.
    async fn pause(&self, multiplier: f64);
}

/// Randomized pacer: base duration scaled by the multiplier, plus or minus
/// 30% jitter, floor-clamped at half a second.
pub struct HumanPacer {
    base: Duration,
}

impl HumanPacer {
    pub fn new(base: Duration) -> Self {
        Self { base }
    }

    fn delay_for(&self, multiplier: f64) -> Duration {
        let base = self.base.as_secs_f64() * multiplier;
        let jitter = base * 0.3;
        let delay = base + (jitter_fraction() * 2.0 - 1.0) * jitter;
        Duration::from_secs_f64(delay.max(0.5))
    }
}

#[async_trait]
impl Pacer for HumanPacer {
    async fn pause(&self, multiplier: f64) {
        tokio::time::sleep(self.delay_for(multiplier)).await;
    }
}

/// Zero-delay pacer for tests and dry runs.
pub struct NoDelayPacer;

#[async_trait]
impl Pacer for NoDelayPacer {
    async fn pause(&self, _multiplier: f64) {}
}

// Sub-second clock noise is plenty of entropy for pacing.
fn jitter_fraction() -> f64 {
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    nanos as f64 / u32::MAX as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_stay_within_jitter_band() {
        let pacer = HumanPacer::new(Duration::from_secs(2));
        for _ in 0..32 {
            let delay = pacer.delay_for(1.0).as_secs_f64();
            assert!((1.4..=2.6).contains(&delay), "delay {delay} out of band");
        }
    }

    #[test]
    fn short_delays_clamp_to_floor() {
        let pacer = HumanPacer::new(Duration::from_millis(100));
        let delay = pacer.delay_for(0.1);
        assert!(delay >= Duration::from_millis(500));
    }
}
