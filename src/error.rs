//! Unified error type for the valuation core.
//!
//! Every fallible operation in this crate returns `Result<_, LiveCalcError>`.
//! Binaries are responsible for mapping these onto process exit codes.

use thiserror::Error;

/// All failure modes surfaced by the library.
#[derive(Debug, Error)]
pub enum LiveCalcError {
    #[error("out of range: {0}")]
    OutOfRange(String),

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("truncated stream: expected {expected} bytes, got {got}")]
    TruncatedStream { expected: usize, got: usize },

    #[error("missing reference: {0}")]
    MissingReference(String),

    #[error("cycle detected in engine graph at {0}")]
    Cycle(String),

    #[error("duplicate engine type: {0}")]
    DuplicateType(String),

    #[error("config invalid: {0}")]
    ConfigInvalid(String),

    #[error("failed to resolve assumption {name}:{version}: {reason}")]
    ResolutionFailed {
        name: String,
        version: String,
        reason: ResolutionFailureKind,
    },

    #[error("malformed data: {0}")]
    DataMalformed(String),

    #[error("projection failed for policy {policy_id} under scenario {scenario_index}: {reason}")]
    ProjectionFailed {
        policy_id: u64,
        scenario_index: usize,
        reason: String,
    },

    #[error("udf call failed: {0}")]
    UdfFailed(String),

    #[error("udf call timed out after {0:?}")]
    UdfTimeout(std::time::Duration),

    #[error("engine {0} timed out")]
    EngineTimeout(String),

    #[error("engine {0} is fatally errored after repeated failures")]
    EngineFatal(String),

    #[error("buffer '{name}' would overflow capacity ({requested} > {capacity})")]
    BufferOverflow {
        name: String,
        requested: usize,
        capacity: usize,
    },

    #[error("buffer '{0}' not found")]
    BufferNotFound(String),

    #[error("duplicate buffer name: {0}")]
    DuplicateName(String),

    #[error("buffer '{name}' size mismatch: expected {expected}, got {got}")]
    SizeMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("run cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// Classification of assumption-resolution failures, per the resolver contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionFailureKind {
    NotFound,
    Unauthorized,
    Forbidden,
    NotConfigured,
    NetworkUnavailable,
    MalformedData,
}

impl std::fmt::Display for ResolutionFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResolutionFailureKind::NotFound => "not found",
            ResolutionFailureKind::Unauthorized => "unauthorized",
            ResolutionFailureKind::Forbidden => "forbidden",
            ResolutionFailureKind::NotConfigured => "not configured",
            ResolutionFailureKind::NetworkUnavailable => "network unavailable",
            ResolutionFailureKind::MalformedData => "malformed data",
        };
        f.write_str(s)
    }
}

pub type LiveCalcResult<T> = Result<T, LiveCalcError>;
