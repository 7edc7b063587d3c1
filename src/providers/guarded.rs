use crate::core::quote::{Quote, QuoteSource};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU8, AtomicU32, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

const CLOSED: u8 = 0;
const OPEN: u8 = 1;
const HALF_OPEN: u8 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Stops calling a failing quote source for `reset_timeout` once
/// `failure_threshold` consecutive calls have failed. The first call after
/// the timeout is let through as a trial; its outcome closes or reopens the
/// circuit.
pub struct CircuitBreaker {
    state: AtomicU8,
    failure_count: AtomicU32,
    opened_at: Mutex<Option<Instant>>,
    failure_threshold: u32,
    reset_timeout: Duration,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, reset_timeout: Duration) -> Self {
        Self {
            state: AtomicU8::new(CLOSED),
            failure_count: AtomicU32::new(0),
            opened_at: Mutex::new(None),
            failure_threshold: failure_threshold.max(1),
            reset_timeout,
        }
    }

    pub fn state(&self) -> CircuitState {
        match self.state.load(Ordering::SeqCst) {
            CLOSED => CircuitState::Closed,
            OPEN => CircuitState::Open,
            _ => CircuitState::HalfOpen,
        }
    }

    /// Whether a call may go through. Once the reset timeout has passed,
    /// exactly one caller moves the circuit to half-open and is let through;
    /// everyone else is refused until that call settles the state.
    pub fn allow_request(&self) -> bool {
        match self.state() {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => false,
            CircuitState::Open => {
                let elapsed = self
                    .opened_at
                    .lock()
                    .ok()
                    .and_then(|opened| opened.map(|at| at.elapsed()));
                match elapsed {
                    Some(elapsed) if elapsed >= self.reset_timeout => {
                        let won = self
                            .state
                            .compare_exchange(OPEN, HALF_OPEN, Ordering::SeqCst, Ordering::SeqCst)
                            .is_ok();
                        if won {
                            debug!("Circuit half-open, trying quote source again");
                        }
                        won
                    }
                    _ => false,
                }
            }
        }
    }

    pub fn record_success(&self) {
        if self.state.swap(CLOSED, Ordering::SeqCst) != CLOSED {
            debug!("Circuit closed");
        }
        self.failure_count.store(0, Ordering::SeqCst);
    }

    pub fn record_failure(&self) {
        let count = self.failure_count.fetch_add(1, Ordering::SeqCst) + 1;
        let trial_failed = self.state() == CircuitState::HalfOpen;
        if trial_failed || count >= self.failure_threshold {
            if let Ok(mut opened) = self.opened_at.lock() {
                *opened = Some(Instant::now());
            }
            if self.state.swap(OPEN, Ordering::SeqCst) != OPEN {
                warn!(failures = count, "Circuit opened for quote source");
            }
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(30))
    }
}

/// Bounds every fetch of the inner source by `timeout` and routes the
/// outcome through a [`CircuitBreaker`].
pub struct GuardedQuoteSource<T: QuoteSource> {
    inner: T,
    breaker: CircuitBreaker,
    timeout: Duration,
}

impl<T: QuoteSource> GuardedQuoteSource<T> {
    pub fn new(inner: T, breaker: CircuitBreaker, timeout: Duration) -> Self {
        Self {
            inner,
            breaker,
            timeout,
        }
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.state()
    }
}

#[async_trait]
impl<T: QuoteSource> QuoteSource for GuardedQuoteSource<T> {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote> {
        if !self.breaker.allow_request() {
            return Err(anyhow!("Quote source unavailable (circuit open) for symbol: {}", symbol));
        }

        let outcome = match tokio::time::timeout(self.timeout, self.inner.fetch_quote(symbol)).await {
            Ok(result) => result,
            Err(_) => Err(anyhow!(
                "Quote request timed out after {}ms for symbol: {}",
                self.timeout.as_millis(),
                symbol
            )),
        };

        match &outcome {
            Ok(_) => self.breaker.record_success(),
            Err(e) => {
                debug!(symbol, error = %e, "Quote fetch failed");
                self.breaker.record_failure();
            }
        }
        outcome
    }
}
