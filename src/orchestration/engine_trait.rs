//! The interface an independent compute stage exposes to the substrate.

use super::buffer::Buffer;
use crate::error::LiveCalcResult;
use std::time::Duration;

/// Static capability advertisement for an engine.
#[derive(Debug, Clone, Copy)]
pub struct EngineInfo {
    pub max_buffer_size: usize,
}

/// Outcome of one `run_chunk` call.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionResult {
    pub records_processed: usize,
    pub elapsed: Duration,
}

/// A single compute stage. Implementors are registered with the
/// substrate by a tagged type name (see `orchestration::registry`).
pub trait Engine: Send + Sync {
    fn initialize(
        &mut self,
        config: &serde_json::Value,
        credentials: Option<&str>,
    ) -> LiveCalcResult<()>;

    fn info(&self) -> EngineInfo;

    fn run_chunk(&mut self, input: &Buffer, output: &Buffer) -> LiveCalcResult<ExecutionResult>;

    fn dispose(&mut self) -> LiveCalcResult<()>;

    fn is_initialized(&self) -> bool;
}
