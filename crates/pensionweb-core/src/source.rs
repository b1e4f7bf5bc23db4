//! Live or fallback data selection
//!
//! `FallbackPolicy` is a small circuit breaker in front of the backend:
//!
//! ```text
//! Closed --(threshold consecutive failures)--> Open
//! Open   --(cooldown elapsed)----------------> HalfOpen (one live attempt)
//! HalfOpen --success--> Closed    HalfOpen --failure--> Open
//! ```
//!
//! A pinned mode (`live` / `fallback`) bypasses the breaker entirely.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use pensionweb_config::{FallbackConfig, SourceMode};
use serde::Serialize;

use crate::error::ApiError;

/// Where a value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Live,
    Fallback,
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::Live => write!(f, "live"),
            DataSource::Fallback => write!(f, "fallback"),
        }
    }
}

/// A value tagged with its source, so pages can badge synthetic data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sourced<T> {
    pub data: T,
    pub source: DataSource,
}

impl<T> Sourced<T> {
    pub fn live(data: T) -> Self {
        Self { data, source: DataSource::Live }
    }

    pub fn fallback(data: T) -> Self {
        Self { data, source: DataSource::Fallback }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == DataSource::Fallback
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sourced<U> {
        Sourced { data: f(self.data), source: self.source }
    }
}

/// Time source for the breaker
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half-open"),
        }
    }
}

#[derive(Debug)]
struct Breaker {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    /// When the current half-open attempt was let through
    attempt_started_at: Option<Instant>,
}

/// Chooses the source for each fallback-capable fetch
#[derive(Clone)]
pub struct FallbackPolicy {
    mode: SourceMode,
    threshold: u32,
    cooldown: Duration,
    clock: Arc<dyn Clock>,
    breaker: Arc<Mutex<Breaker>>,
}

impl std::fmt::Debug for FallbackPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackPolicy")
            .field("mode", &self.mode)
            .field("threshold", &self.threshold)
            .field("cooldown", &self.cooldown)
            .field("state", &self.state())
            .finish()
    }
}

impl FallbackPolicy {
    pub fn new(config: &FallbackConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &FallbackConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            mode: config.mode,
            threshold: config.failure_threshold.max(1),
            cooldown: Duration::from_secs(config.cooldown_secs),
            clock,
            breaker: Arc::new(Mutex::new(Breaker {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                attempt_started_at: None,
            })),
        }
    }

    /// Policy that always answers `mode`
    pub fn pinned(mode: SourceMode) -> Self {
        Self::new(&FallbackConfig {
            mode,
            ..FallbackConfig::default()
        })
    }

    fn lock(&self) -> MutexGuard<'_, Breaker> {
        self.breaker.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn mode(&self) -> SourceMode {
        self.mode
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Source to use for the next fetch
    pub fn select(&self) -> DataSource {
        match self.mode {
            SourceMode::Live => return DataSource::Live,
            SourceMode::Fallback => return DataSource::Fallback,
            SourceMode::Auto => {}
        }

        let now = self.clock.now();
        let mut breaker = self.lock();
        match breaker.state {
            CircuitState::Closed => DataSource::Live,
            CircuitState::HalfOpen => {
                // An attempt that never reported back (its request was dropped) expires after the cooldown
                let expired = breaker
                    .attempt_started_at
                    .map_or(true, |at| now.saturating_duration_since(at) >= self.cooldown);
                if expired {
                    log::info!("Half-open attempt did not report back, letting another one through");
                    breaker.attempt_started_at = Some(now);
                    DataSource::Live
                } else {
                    DataSource::Fallback
                }
            }
            CircuitState::Open => {
                let elapsed = breaker
                    .opened_at
                    .map(|at| now.saturating_duration_since(at))
                    .unwrap_or_default();
                if elapsed >= self.cooldown {
                    log::info!("Backend circuit half-open, trying live backend");
                    breaker.state = CircuitState::HalfOpen;
                    breaker.attempt_started_at = Some(now);
                    DataSource::Live
                } else {
                    DataSource::Fallback
                }
            }
        }
    }

    pub fn record_success(&self) {
        if self.mode != SourceMode::Auto {
            return;
        }
        let mut breaker = self.lock();
        if breaker.state != CircuitState::Closed {
            log::info!("Backend circuit closed, live data restored");
        }
        breaker.state = CircuitState::Closed;
        breaker.consecutive_failures = 0;
        breaker.opened_at = None;
        breaker.attempt_started_at = None;
    }

    pub fn record_failure(&self) {
        if self.mode != SourceMode::Auto {
            return;
        }
        let mut breaker = self.lock();
        breaker.consecutive_failures = breaker.consecutive_failures.saturating_add(1);
        let trip = match breaker.state {
            CircuitState::HalfOpen => true,
            CircuitState::Closed => breaker.consecutive_failures >= self.threshold,
            CircuitState::Open => false,
        };
        if trip {
            log::info!(
                "Backend circuit open after {} consecutive failure(s)",
                breaker.consecutive_failures
            );
            breaker.state = CircuitState::Open;
            breaker.opened_at = Some(self.clock.now());
            breaker.attempt_started_at = None;
        }
    }

    /// Feed a live call's outcome; only unavailability counts as a failure
    pub fn record<T>(&self, result: &Result<T, ApiError>) {
        match result {
            Err(error) if error.is_unavailable() => self.record_failure(),
            _ => self.record_success(),
        }
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;

    struct ManualClock {
        start: Instant,
        offset: Mutex<Duration>,
    }

    impl ManualClock {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                start: Instant::now(),
                offset: Mutex::new(Duration::ZERO),
            })
        }

        fn advance(&self, by: Duration) {
            *self.offset.lock().unwrap() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.start + *self.offset.lock().unwrap()
        }
    }

    fn auto_policy(clock: Arc<ManualClock>) -> FallbackPolicy {
        let config = FallbackConfig {
            mode: SourceMode::Auto,
            failure_threshold: 2,
            cooldown_secs: 30,
        };
        FallbackPolicy::with_clock(&config, clock)
    }

    fn network_error() -> ApiError {
        ApiError::Network {
            url: "http://localhost:8080/api/dashboard/stats".to_string(),
            message: "connection refused".to_string(),
        }
    }

    #[test]
    fn test_pinned_modes_ignore_failures() {
        let live = FallbackPolicy::pinned(SourceMode::Live);
        for _ in 0..10 {
            live.record_failure();
        }
        assert_eq!(live.select(), DataSource::Live);

        let fallback = FallbackPolicy::pinned(SourceMode::Fallback);
        fallback.record_success();
        assert_eq!(fallback.select(), DataSource::Fallback);
    }

    #[test]
    fn test_breaker_opens_at_threshold() {
        let policy = auto_policy(ManualClock::new());
        assert_eq!(policy.select(), DataSource::Live);
        policy.record_failure();
        assert_eq!(policy.state(), CircuitState::Closed);
        policy.record_failure();
        assert_eq!(policy.state(), CircuitState::Open);
        assert_eq!(policy.select(), DataSource::Fallback);
    }

    #[test]
    fn test_success_resets_failure_count() {
        let policy = auto_policy(ManualClock::new());
        policy.record_failure();
        policy.record_success();
        policy.record_failure();
        assert_eq!(policy.state(), CircuitState::Closed);
    }

    #[test]
    fn test_half_open_attempt_after_cooldown() {
        let clock = ManualClock::new();
        let policy = auto_policy(clock.clone());
        policy.record_failure();
        policy.record_failure();

        clock.advance(Duration::from_secs(29));
        assert_eq!(policy.select(), DataSource::Fallback);

        clock.advance(Duration::from_secs(1));
        assert_eq!(policy.select(), DataSource::Live);
        assert_eq!(policy.state(), CircuitState::HalfOpen);
        // only one attempt at a time
        assert_eq!(policy.select(), DataSource::Fallback);

        policy.record_failure();
        assert_eq!(policy.state(), CircuitState::Open);

        clock.advance(Duration::from_secs(30));
        assert_eq!(policy.select(), DataSource::Live);
        policy.record_success();
        assert_eq!(policy.state(), CircuitState::Closed);
        assert_eq!(policy.select(), DataSource::Live);
    }

    #[test]
    fn test_unreported_half_open_attempt_expires() {
        let clock = ManualClock::new();
        let policy = auto_policy(clock.clone());
        policy.record_failure();
        policy.record_failure();

        clock.advance(Duration::from_secs(30));
        assert_eq!(policy.select(), DataSource::Live);
        // the live attempt is dropped without recording anything
        clock.advance(Duration::from_secs(10));
        assert_eq!(policy.select(), DataSource::Fallback);
        assert_eq!(policy.state(), CircuitState::HalfOpen);

        clock.advance(Duration::from_secs(20));
        assert_eq!(policy.select(), DataSource::Live);
        assert_eq!(policy.select(), DataSource::Fallback);
        policy.record_success();
        assert_eq!(policy.state(), CircuitState::Closed);
    }

    #[test]
    fn test_not_found_does_not_trip() {
        let policy = auto_policy(ManualClock::new());
        let not_found: Result<(), ApiError> = Err(ApiError::Status {
            status: 404,
            url: "u".to_string(),
            body: String::new(),
        });
        policy.record(&not_found);
        policy.record(&not_found);
        assert_eq!(policy.state(), CircuitState::Closed);

        let down: Result<(), ApiError> = Err(network_error());
        policy.record(&down);
        policy.record(&down);
        assert_eq!(policy.state(), CircuitState::Open);
    }

    #[test]
    fn test_sourced_tags() {
        let value = Sourced::fallback(vec![1, 2]).map(|v| v.len());
        assert!(value.is_fallback());
        assert_eq!(value.data, 2);
        assert_eq!(serde_json::to_value(DataSource::Live).unwrap(), serde_json::json!("live"));
    }
}
