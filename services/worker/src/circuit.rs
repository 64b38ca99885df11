//! Per-dependency circuit breaker (§4.2.4). One instance guards the stream
//! endpoint, one guards the response endpoint, one guards the host tool API.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone)]
pub struct CircuitConfig {
    pub failure_threshold: u32,
    pub window: Duration,
    pub cooldown: Duration,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            window: Duration::from_secs(30),
            cooldown: Duration::from_secs(15),
        }
    }
}

/// Tracks failures in a rolling time window and trips to `Open` once the
/// threshold is reached; a single probe in `HalfOpen` decides whether to
/// close again or extend the cooldown.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitConfig,
    state: CircuitState,
    failures: Vec<Instant>,
    opened_at: Option<Instant>,
    cooldown: Duration,
}

impl CircuitBreaker {
    pub fn new(config: CircuitConfig) -> Self {
        let cooldown = config.cooldown;
        Self {
            config,
            state: CircuitState::Closed,
            failures: Vec::new(),
            opened_at: None,
            cooldown,
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    /// Call before attempting the guarded operation. Transitions `Open` to
    /// `HalfOpen` once the cooldown has elapsed.
    pub fn allow(&mut self) -> bool {
        if self.state == CircuitState::Open {
            if let Some(opened_at) = self.opened_at {
                if opened_at.elapsed() >= self.cooldown {
                    self.state = CircuitState::HalfOpen;
                }
            }
        }
        !matches!(self.state, CircuitState::Open)
    }

    pub fn record_success(&mut self) {
        match self.state {
            CircuitState::HalfOpen => {
                self.state = CircuitState::Closed;
                self.failures.clear();
                self.opened_at = None;
                self.cooldown = self.config.cooldown;
            }
            CircuitState::Closed => {
                self.failures.clear();
            }
            CircuitState::Open => {}
        }
    }

    pub fn record_failure(&mut self) {
        let now = Instant::now();
        match self.state {
            CircuitState::HalfOpen => {
                self.trip(now, self.cooldown * 2);
            }
            CircuitState::Closed => {
                self.failures.retain(|t| now.duration_since(*t) <= self.config.window);
                self.failures.push(now);
                if self.failures.len() as u32 >= self.config.failure_threshold {
                    self.trip(now, self.config.cooldown);
                }
            }
            CircuitState::Open => {}
        }
    }

    fn trip(&mut self, at: Instant, cooldown: Duration) {
        self.state = CircuitState::Open;
        self.opened_at = Some(at);
        self.cooldown = cooldown;
        self.failures.clear();
    }
}
