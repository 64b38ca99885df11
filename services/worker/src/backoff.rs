//! Exponential backoff with additive jitter, shared by the Subscriber's
//! reconnect loop and the Poster's retry loop.

use std::time::Duration;

use rand::Rng;

use crate::config::ReconnectConfig;

/// `attempt` is 0-indexed: the delay before the first retry is `base`.
pub fn delay_for(config: &ReconnectConfig, attempt: u32) -> Duration {
    let exp = config.factor.powi(attempt as i32);
    let raw_ms = (config.base.as_millis() as f64) * exp;
    let capped_ms = raw_ms.min(config.cap.as_millis() as f64);

    let jitter_span = capped_ms * config.jitter;
    let jitter = rand::thread_rng().gen_range(-jitter_span..=jitter_span);
    let jittered_ms = (capped_ms + jitter).max(0.0);

    Duration::from_millis(jittered_ms as u64)
}

/// Doubles a pause up to `cap`, used by the Poster after a `429`.
pub fn double(current: Duration, cap: Duration) -> Duration {
    (current * 2).min(cap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_grows_exponentially_and_respects_cap() {
        let config = ReconnectConfig {
            base: Duration::from_millis(500),
            factor: 2.0,
            cap: Duration::from_secs(30),
            max_attempts: 5,
            jitter: 0.0,
        };
        assert_eq!(delay_for(&config, 0), Duration::from_millis(500));
        assert_eq!(delay_for(&config, 1), Duration::from_millis(1000));
        assert_eq!(delay_for(&config, 2), Duration::from_millis(2000));
        // 500 * 2^8 = 128000ms, clamped to the 30s cap.
        assert_eq!(delay_for(&config, 8), Duration::from_secs(30));
    }

    #[test]
    fn double_respects_cap() {
        assert_eq!(
            double(Duration::from_secs(20), Duration::from_secs(30)),
            Duration::from_secs(30)
        );
        assert_eq!(
            double(Duration::from_secs(5), Duration::from_secs(30)),
            Duration::from_secs(10)
        );
    }
}
