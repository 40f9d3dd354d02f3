//! Sandboxed user-defined-function host.
//!
//! Provides two named, signature-pinned callout slots consulted by the
//! projection engine at each year: `adjust_mortality` and `adjust_lapse`.
//! Each call runs under a hard wall-clock timeout; failures and timeouts
//! are isolated to the call (the projection proceeds with a multiplier of
//! 1.0) and are counted rather than propagated.

use crate::error::{LiveCalcError, LiveCalcResult};
use crate::policy::Policy;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Point-in-time projection state passed to a callout.
#[derive(Debug, Clone, Copy)]
pub struct UdfState {
    pub year: u32,
    pub lives: f64,
    pub interest_rate: f64,
}

/// A mortality-multiplier callout.
pub trait MortalityAdjustment: Send + Sync {
    fn adjust(&self, policy: &Policy, state: UdfState) -> LiveCalcResult<f64>;
}

/// A lapse-multiplier callout.
pub trait LapseAdjustment: Send + Sync {
    fn adjust(&self, policy: &Policy, state: UdfState) -> LiveCalcResult<f64>;
}

/// Aggregate metrics recorded across all calls made through a host.
#[derive(Debug, Default, Clone, Copy)]
pub struct UdfMetrics {
    pub calls: u64,
    pub failures: u64,
    pub timeouts: u64,
    pub total_time: Duration,
}

const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Hosts the optional mortality/lapse callouts for a run.
pub struct UdfHost {
    mortality: Option<Arc<dyn MortalityAdjustment>>,
    lapse: Option<Arc<dyn LapseAdjustment>>,
    timeout: Duration,
    calls: AtomicU64,
    failures: AtomicU64,
    timeouts: AtomicU64,
    total_time_nanos: AtomicU64,
}

impl UdfHost {
    pub fn new() -> Self {
        Self {
            mortality: None,
            lapse: None,
            timeout: DEFAULT_TIMEOUT,
            calls: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
            total_time_nanos: AtomicU64::new(0),
        }
    }

    pub fn with_mortality(mut self, f: Arc<dyn MortalityAdjustment>) -> Self {
        self.mortality = Some(f);
        self
    }

    pub fn with_lapse(mut self, f: Arc<dyn LapseAdjustment>) -> Self {
        self.lapse = Some(f);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.mortality.is_some() || self.lapse.is_some()
    }

    /// Returns the mortality multiplier, defaulting to 1.0 when no callout
    /// is configured or the call fails/times out.
    pub fn adjust_mortality(&self, policy: &Policy, state: UdfState) -> f64 {
        let Some(f) = self.mortality.clone() else {
            return 1.0;
        };
        let policy = policy.clone();
        self.invoke(move || f.adjust(&policy, state))
    }

    /// Returns the lapse multiplier, defaulting to 1.0 when no callout is
    /// configured or the call fails/times out.
    pub fn adjust_lapse(&self, policy: &Policy, state: UdfState) -> f64 {
        let Some(f) = self.lapse.clone() else {
            return 1.0;
        };
        let policy = policy.clone();
        self.invoke(move || f.adjust(&policy, state))
    }

    pub fn metrics(&self) -> UdfMetrics {
        UdfMetrics {
            calls: self.calls.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            total_time: Duration::from_nanos(self.total_time_nanos.load(Ordering::Relaxed)),
        }
    }

    fn invoke<F>(&self, f: F) -> f64
    where
        F: FnOnce() -> LiveCalcResult<f64> + Send + 'static,
    {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let start = Instant::now();
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let _ = tx.send(f());
        });

        let outcome = match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(_) => {
                self.timeouts.fetch_add(1, Ordering::Relaxed);
                Err(LiveCalcError::UdfTimeout(self.timeout))
            }
        };
        self.total_time_nanos
            .fetch_add(start.elapsed().as_nanos() as u64, Ordering::Relaxed);

        match outcome {
            Ok(multiplier) if multiplier >= 0.0 => multiplier,
            _ => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                1.0
            }
        }
    }
}

impl Default for UdfHost {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{Gender, ProductType, UnderwritingClass};

    fn policy() -> Policy {
        Policy::new(
            1,
            30,
            Gender::Male,
            1.0,
            1.0,
            5,
            ProductType::Term,
            UnderwritingClass::Standard,
        )
    }

    struct Doubler;
    impl MortalityAdjustment for Doubler {
        fn adjust(&self, _policy: &Policy, _state: UdfState) -> LiveCalcResult<f64> {
            Ok(2.0)
        }
    }

    struct AlwaysFails;
    impl MortalityAdjustment for AlwaysFails {
        fn adjust(&self, _policy: &Policy, _state: UdfState) -> LiveCalcResult<f64> {
            Err(LiveCalcError::UdfFailed("boom".to_string()))
        }
    }

    struct NeverReturns;
    impl MortalityAdjustment for NeverReturns {
        fn adjust(&self, _policy: &Policy, _state: UdfState) -> LiveCalcResult<f64> {
            std::thread::sleep(Duration::from_secs(60));
            Ok(1.0)
        }
    }

    fn state() -> UdfState {
        UdfState {
            year: 1,
            lives: 1.0,
            interest_rate: 0.03,
        }
    }

    #[test]
    fn unconfigured_host_defaults_to_identity() {
        let host = UdfHost::new();
        assert_eq!(host.adjust_mortality(&policy(), state()), 1.0);
    }

    #[test]
    fn configured_host_returns_callout_value() {
        let host = UdfHost::new().with_mortality(Arc::new(Doubler));
        assert_eq!(host.adjust_mortality(&policy(), state()), 2.0);
        assert_eq!(host.metrics().calls, 1);
    }

    #[test]
    fn failure_is_isolated_and_defaults_to_identity() {
        let host = UdfHost::new().with_mortality(Arc::new(AlwaysFails));
        assert_eq!(host.adjust_mortality(&policy(), state()), 1.0);
        assert_eq!(host.metrics().failures, 1);
    }

    #[test]
    fn timeout_is_isolated_and_defaults_to_identity() {
        let host = UdfHost::new()
            .with_mortality(Arc::new(NeverReturns))
            .with_timeout(Duration::from_millis(20));
        assert_eq!(host.adjust_mortality(&policy(), state()), 1.0);
        assert_eq!(host.metrics().timeouts, 1);
    }
}
