//! Circuit breaker guarding the CMS.
//!
//! - CLOSED: normal operation, requests flow through
//! - OPEN: upstream failing, requests are rejected immediately
//! - HALF_OPEN: recovery trial, a limited number of requests allowed

use crate::config::NetworkConfig;
use serde::Serialize;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

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
            CircuitState::Closed => write!(f, "CLOSED"),
            CircuitState::Open => write!(f, "OPEN"),
            CircuitState::HalfOpen => write!(f, "HALF_OPEN"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before opening the circuit.
    pub failure_threshold: u32,
    /// Time to wait in OPEN before trying again.
    pub recovery_timeout: Duration,
    /// Trial requests allowed while HALF_OPEN.
    pub half_open_max_calls: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: NetworkConfig::CIRCUIT_BREAKER_FAILURE_THRESHOLD,
            recovery_timeout: NetworkConfig::CIRCUIT_BREAKER_RECOVERY_TIMEOUT,
            half_open_max_calls: 1,
        }
    }
}

struct Inner {
    state: CircuitState,
    opened_at: Option<Instant>,
    /// When the current HALF_OPEN trial slots were handed out.
    trial_started: Option<Instant>,
}

/// Circuit breaker for one upstream host.
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
    failure_count: AtomicU32,
    total_failures: AtomicU64,
    total_successes: AtomicU64,
    half_open_calls: AtomicU32,
    domain: String,
}

impl CircuitBreaker {
    pub fn new(domain: impl Into<String>) -> Self {
        Self::with_config(domain, CircuitBreakerConfig::default())
    }

    pub fn with_config(domain: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                opened_at: None,
                trial_started: None,
            }),
            failure_count: AtomicU32::new(0),
            total_failures: AtomicU64::new(0),
            total_successes: AtomicU64::new(0),
            half_open_calls: AtomicU32::new(0),
            domain: domain.into(),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Current state, moving OPEN to HALF_OPEN once the recovery timeout passed.
    pub fn state(&self) -> CircuitState {
        let mut inner = self.lock();
        self.maybe_half_open(&mut inner);
        inner.state
    }

    /// Check if a request should be allowed through.
    ///
    /// HALF_OPEN trial slots whose outcome was never recorded are handed out
    /// again after another `recovery_timeout`.
    pub fn allow_request(&self) -> bool {
        let mut inner = self.lock();
        self.maybe_half_open(&mut inner);
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => false,
            CircuitState::HalfOpen => {
                let stale = inner
                    .trial_started
                    .is_some_and(|started| started.elapsed() >= self.config.recovery_timeout);
                if stale {
                    debug!("Circuit breaker for {} reissuing stale trial request", self.domain);
                    self.half_open_calls.store(0, Ordering::SeqCst);
                }

                let granted = self.half_open_calls.fetch_add(1, Ordering::SeqCst)
                    < self.config.half_open_max_calls;
                if granted && (stale || inner.trial_started.is_none()) {
                    inner.trial_started = Some(Instant::now());
                }
                granted
            }
        }
    }

    /// Record an outcome that says nothing about upstream health (e.g. a 429
    /// or an undecodable body). Frees a HALF_OPEN trial slot without closing
    /// or reopening the circuit.
    pub fn record_neutral(&self) {
        let inner = self.lock();
        if inner.state == CircuitState::HalfOpen {
            let _ = self
                .half_open_calls
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |calls| {
                    calls.checked_sub(1)
                });
        }
    }

    pub fn record_success(&self) {
        self.total_successes.fetch_add(1, Ordering::SeqCst);
        self.failure_count.store(0, Ordering::SeqCst);

        let mut inner = self.lock();
        if inner.state == CircuitState::HalfOpen {
            inner.state = CircuitState::Closed;
            inner.opened_at = None;
            inner.trial_started = None;
            info!("Circuit breaker for {} recovered to CLOSED", self.domain);
        }
    }

    pub fn record_failure(&self) {
        self.total_failures.fetch_add(1, Ordering::SeqCst);
        let failures = self.failure_count.fetch_add(1, Ordering::SeqCst) + 1;

        let mut inner = self.lock();
        let should_open = match inner.state {
            CircuitState::Closed => failures >= self.config.failure_threshold,
            CircuitState::HalfOpen => true,
            CircuitState::Open => false,
        };
        if should_open {
            inner.state = CircuitState::Open;
            inner.opened_at = Some(Instant::now());
            inner.trial_started = None;
            self.half_open_calls.store(0, Ordering::SeqCst);
            warn!(
                "Circuit breaker for {} opened after {} failures",
                self.domain, failures
            );
        }
    }

    pub fn stats(&self) -> CircuitBreakerStats {
        let state = self.state();
        let time_in_state = match state {
            CircuitState::Closed => Duration::ZERO,
            _ => self
                .lock()
                .opened_at
                .map(|t| t.elapsed())
                .unwrap_or(Duration::ZERO),
        };
        CircuitBreakerStats {
            domain: self.domain.clone(),
            state,
            failure_count: self.failure_count.load(Ordering::SeqCst),
            total_failures: self.total_failures.load(Ordering::SeqCst),
            total_successes: self.total_successes.load(Ordering::SeqCst),
            time_in_state_secs: time_in_state.as_secs(),
        }
    }

    pub fn reset(&self) {
        self.failure_count.store(0, Ordering::SeqCst);
        self.half_open_calls.store(0, Ordering::SeqCst);
        let mut inner = self.lock();
        inner.state = CircuitState::Closed;
        inner.opened_at = None;
        inner.trial_started = None;
        info!("Circuit breaker for {} reset to CLOSED", self.domain);
    }

    fn maybe_half_open(&self, inner: &mut Inner) {
        if inner.state != CircuitState::Open {
            return;
        }
        if let Some(opened) = inner.opened_at {
            if opened.elapsed() >= self.config.recovery_timeout {
                inner.state = CircuitState::HalfOpen;
                inner.trial_started = None;
                self.half_open_calls.store(0, Ordering::SeqCst);
                debug!("Circuit breaker for {} entering HALF_OPEN", self.domain);
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CircuitBreakerStats {
    pub domain: String,
    pub state: CircuitState,
    pub failure_count: u32,
    pub total_failures: u64,
    pub total_successes: u64,
    pub time_in_state_secs: u64,
}
