//! Engine lifecycle state machine: timeout, exponential-backoff retry, and
//! a consecutive-error threshold that disposes a misbehaving engine.

use super::buffer::Buffer;
use super::engine_trait::{Engine, ExecutionResult};
use crate::error::{LiveCalcError, LiveCalcResult};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Ready,
    Running,
    Error,
    Disposed,
}

#[derive(Debug, Clone, Copy)]
pub struct LifecycleConfig {
    pub timeout: Duration,
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub consecutive_error_threshold: u32,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            backoff_base: Duration::from_millis(100),
            consecutive_error_threshold: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EngineStats {
    pub successful_runs: u64,
    pub failed_runs: u64,
    pub timeouts: u64,
    pub total_time: Duration,
}

impl EngineStats {
    pub fn average_time(&self) -> Duration {
        let n = self.successful_runs + self.failed_runs;
        if n == 0 {
            Duration::ZERO
        } else {
            self.total_time / n as u32
        }
    }
}

/// Wraps an `Engine` with the state machine
/// `Uninitialized -> Ready -> Running -> Ready -> ... -> Disposed`,
/// with an `Error` branch.
pub struct EngineLifecycle {
    engine: Box<dyn Engine>,
    state: EngineState,
    config: LifecycleConfig,
    consecutive_errors: u32,
    stats: EngineStats,
}

impl EngineLifecycle {
    pub fn new(engine: Box<dyn Engine>, config: LifecycleConfig) -> Self {
        Self {
            engine,
            state: EngineState::Uninitialized,
            config,
            consecutive_errors: 0,
            stats: EngineStats::default(),
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn initialize(
        &mut self,
        config: &serde_json::Value,
        credentials: Option<&str>,
    ) -> LiveCalcResult<()> {
        self.engine.initialize(config, credentials)?;
        self.state = EngineState::Ready;
        Ok(())
    }

    /// Runs one chunk, retrying on failure with exponential backoff up to
    /// `max_attempts`. A single call exceeding `timeout` is recorded as a
    /// timeout (the call itself is not preempted; the substrate expects
    /// engines to poll their own deadline, per the polling-based
    /// cancellation design). After `consecutive_error_threshold`
    /// failures the engine is disposed.
    pub fn run_chunk(&mut self, input: &Buffer, output: &Buffer) -> LiveCalcResult<ExecutionResult> {
        if self.state != EngineState::Ready {
            return Err(LiveCalcError::ConfigInvalid(format!(
                "engine not ready: state is {:?}",
                self.state
            )));
        }
        if input.size_bytes() > self.engine.info().max_buffer_size {
            return Err(LiveCalcError::BufferOverflow {
                name: "input".to_string(),
                requested: input.size_bytes(),
                capacity: self.engine.info().max_buffer_size,
            });
        }
        if !input.is_aligned() || !output.is_aligned() {
            return Err(LiveCalcError::ConfigInvalid(
                "input/output buffers must be 16-byte aligned".to_string(),
            ));
        }

        self.state = EngineState::Running;

        for attempt in 0..self.config.max_attempts {
            let start = Instant::now();
            let result = self.engine.run_chunk(input, output);
            let elapsed = start.elapsed();
            self.stats.total_time += elapsed;

            match result {
                Ok(r) => {
                    self.consecutive_errors = 0;
                    self.stats.successful_runs += 1;
                    self.state = EngineState::Ready;
                    return Ok(r);
                }
                Err(err) => {
                    let timed_out = elapsed >= self.config.timeout;
                    if timed_out {
                        self.stats.timeouts += 1;
                    } else {
                        self.stats.failed_runs += 1;
                    }
                    self.consecutive_errors += 1;

                    if self.consecutive_errors >= self.config.consecutive_error_threshold {
                        let _ = self.engine.dispose();
                        self.state = EngineState::Disposed;
                        return Err(LiveCalcError::EngineFatal(format!(
                            "disposed after {} consecutive failures: {err}",
                            self.consecutive_errors
                        )));
                    }

                    if attempt + 1 < self.config.max_attempts {
                        std::thread::sleep(self.config.backoff_base * 2u32.pow(attempt));
                    } else {
                        self.state = EngineState::Error;
                        if timed_out {
                            return Err(LiveCalcError::EngineTimeout(format!("{err}")));
                        }
                        return Err(err);
                    }
                }
            }
        }

        unreachable!("loop always returns before exhausting max_attempts iterations")
    }

    /// Idempotent: disposing an already-disposed engine is a no-op.
    pub fn dispose(&mut self) -> LiveCalcResult<()> {
        if self.state == EngineState::Disposed {
            return Ok(());
        }
        self.engine.dispose()?;
        self.state = EngineState::Disposed;
        Ok(())
    }
}
