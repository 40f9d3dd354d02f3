//! Orchestration substrate: buffers, engine lifecycle, and DAG wiring for
//! independent compute stages. Explicitly instance-owned rather than a
//! process-global singleton.

pub mod buffer;
pub mod dag;
pub mod engine_trait;
pub mod lifecycle;

pub use buffer::{Buffer, BufferKind, BufferManager};
pub use dag::{expand_env_vars, DagConfig, EngineSpec, FallbackPolicy, InputRef};
pub use engine_trait::{Engine, EngineInfo, ExecutionResult};
pub use lifecycle::{EngineLifecycle, EngineState, EngineStats, LifecycleConfig};

use crate::error::{LiveCalcError, LiveCalcResult};
use std::collections::HashMap;

type EngineFactory = fn() -> Box<dyn Engine>;

/// Register-once type registry mapping an engine-type name to a
/// constructor. Owned by the caller's `Substrate` instance rather than a
/// global `static`, so two independent runs never share registrations.
#[derive(Default)]
pub struct EngineRegistry {
    factories: HashMap<String, EngineFactory>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, engine_type: &str, factory: EngineFactory) -> LiveCalcResult<()> {
        if self.factories.contains_key(engine_type) {
            return Err(LiveCalcError::DuplicateType(engine_type.to_string()));
        }
        self.factories.insert(engine_type.to_string(), factory);
        Ok(())
    }

    pub fn construct(&self, engine_type: &str) -> LiveCalcResult<Box<dyn Engine>> {
        self.factories
            .get(engine_type)
            .map(|f| f())
            .ok_or_else(|| LiveCalcError::ConfigInvalid(format!("unknown engine type: {engine_type}")))
    }

    pub fn available(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }
}

/// Composes a buffer manager, an engine registry, and a DAG execution
/// order into a single runnable substrate. Construction takes everything
/// by value/reference the caller already owns; nothing here is global.
pub struct Substrate {
    pub buffers: BufferManager,
    pub registry: EngineRegistry,
}

impl Substrate {
    pub fn new() -> Self {
        Self {
            buffers: BufferManager::new(),
            registry: EngineRegistry::new(),
        }
    }

    /// Validates `dag` and returns the execution order, instantiating an
    /// `EngineLifecycle` per engine id via the registry.
    pub fn plan(
        &self,
        dag: &DagConfig,
        lifecycle_config: LifecycleConfig,
    ) -> LiveCalcResult<Vec<(String, EngineLifecycle)>> {
        dag.validate()?;
        let order = dag.topological_order()?;
        let mut plan = Vec::with_capacity(order.len());
        for id in order {
            let spec = dag
                .engines
                .iter()
                .find(|e| e.id == id)
                .expect("topological_order only returns ids present in dag.engines");
            let engine = self.registry.construct(&spec.engine_type)?;
            plan.push((id, EngineLifecycle::new(engine, lifecycle_config)));
        }
        Ok(plan)
    }
}

/// Result of driving a DAG through `Substrate::execute`.
#[derive(Debug, Clone, Default)]
pub struct Outcome {
    /// Engine ids that completed `run_chunk` successfully, in run order.
    pub completed_engines: Vec<String>,
    /// Set when an `optional` engine failed and was skipped rather than
    /// aborting the run.
    pub partial_result: bool,
    /// Set when a required engine failed; the run stopped at that engine
    /// and nothing after it in topological order was attempted.
    pub failed_engine_id: Option<String>,
}

impl Substrate {
    /// Plans `dag`, then initializes and runs each engine's lifecycle in
    /// topological order against the shared `input`/`output` buffers.
    ///
    /// An engine whose spec sets `optional = true` and
    /// `fallback = FallbackPolicy::SkipOptional` is skipped on failure: the
    /// failure is logged and `partial_result` is set, and the run continues
    /// to the next engine. Any other failure stops the run and reports
    /// `failed_engine_id`; this is reported as a field on `Outcome`; it
    /// does not propagate as an `Err` (an `Err` here means `dag` itself
    /// was invalid, not that an engine misbehaved).
    pub fn execute(
        &self,
        dag: &DagConfig,
        lifecycle_config: LifecycleConfig,
        credentials: Option<&str>,
        input: &Buffer,
        output: &Buffer,
    ) -> LiveCalcResult<Outcome> {
        let plan = self.plan(dag, lifecycle_config)?;
        let mut outcome = Outcome::default();

        for (id, mut lifecycle) in plan {
            let spec = dag
                .engines
                .iter()
                .find(|e| e.id == id)
                .expect("plan only returns ids present in dag.engines");

            let run_result = lifecycle
                .initialize(&spec.config, credentials)
                .and_then(|_| lifecycle.run_chunk(input, output));

            match run_result {
                Ok(_) => outcome.completed_engines.push(id),
                Err(err) => {
                    if spec.optional && spec.fallback == FallbackPolicy::SkipOptional {
                        log::warn!("skipping optional engine '{id}' after failure: {err}");
                        outcome.partial_result = true;
                        continue;
                    }
                    outcome.failed_engine_id = Some(id);
                    return Ok(outcome);
                }
            }
        }

        Ok(outcome)
    }
}

impl Default for Substrate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct NoopEngine;
    impl Engine for NoopEngine {
        fn initialize(&mut self, _: &serde_json::Value, _: Option<&str>) -> LiveCalcResult<()> {
            Ok(())
        }
        fn info(&self) -> EngineInfo {
            EngineInfo {
                max_buffer_size: 1024,
            }
        }
        fn run_chunk(&mut self, _: &Buffer, _: &Buffer) -> LiveCalcResult<ExecutionResult> {
            Ok(ExecutionResult {
                records_processed: 0,
                elapsed: Duration::ZERO,
            })
        }
        fn dispose(&mut self) -> LiveCalcResult<()> {
            Ok(())
        }
        fn is_initialized(&self) -> bool {
            true
        }
    }

    fn make_noop() -> Box<dyn Engine> {
        Box::new(NoopEngine)
    }

    struct FailingEngine;
    impl Engine for FailingEngine {
        fn initialize(&mut self, _: &serde_json::Value, _: Option<&str>) -> LiveCalcResult<()> {
            Ok(())
        }
        fn info(&self) -> EngineInfo {
            EngineInfo {
                max_buffer_size: 1024,
            }
        }
        fn run_chunk(&mut self, _: &Buffer, _: &Buffer) -> LiveCalcResult<ExecutionResult> {
            Err(LiveCalcError::EngineFatal("always fails".to_string()))
        }
        fn dispose(&mut self) -> LiveCalcResult<()> {
            Ok(())
        }
        fn is_initialized(&self) -> bool {
            true
        }
    }

    fn make_failing() -> Box<dyn Engine> {
        Box::new(FailingEngine)
    }

    fn buffers() -> (std::sync::Arc<Buffer>, std::sync::Arc<Buffer>) {
        let mut mgr = BufferManager::new();
        let input = mgr.allocate(BufferKind::Input, "in", 1).unwrap();
        let output = mgr.allocate(BufferKind::Result, "out", 1).unwrap();
        (input, output)
    }

    fn one_engine_dag(id: &str, engine_type: &str, optional: bool, fallback: FallbackPolicy) -> DagConfig {
        DagConfig {
            engines: vec![EngineSpec {
                id: id.to_string(),
                engine_type: engine_type.to_string(),
                config: serde_json::json!({}),
                inputs: vec![],
                outputs: vec![],
                optional,
                fallback,
            }],
            sources: vec![],
        }
    }

    fn test_config() -> LifecycleConfig {
        LifecycleConfig {
            timeout: Duration::from_secs(5),
            max_attempts: 1,
            backoff_base: Duration::from_millis(1),
            consecutive_error_threshold: 1,
        }
    }

    #[test]
    fn execute_happy_path_reports_no_failure() {
        let mut substrate = Substrate::new();
        substrate.registry.register("noop", make_noop).unwrap();
        let dag = one_engine_dag("stage", "noop", false, FallbackPolicy::Abort);
        let (input, output) = buffers();

        let outcome = substrate
            .execute(&dag, test_config(), None, &input, &output)
            .unwrap();

        assert_eq!(outcome.completed_engines, vec!["stage".to_string()]);
        assert!(!outcome.partial_result);
        assert_eq!(outcome.failed_engine_id, None);
    }

    #[test]
    fn required_engine_failure_aborts_and_reports_failed_id() {
        let mut substrate = Substrate::new();
        substrate.registry.register("failing", make_failing).unwrap();
        let dag = one_engine_dag("stage", "failing", false, FallbackPolicy::Abort);
        let (input, output) = buffers();

        let outcome = substrate
            .execute(&dag, test_config(), None, &input, &output)
            .unwrap();

        assert_eq!(outcome.failed_engine_id, Some("stage".to_string()));
        assert!(outcome.completed_engines.is_empty());
    }

    #[test]
    fn optional_engine_failure_with_skip_optional_is_a_partial_result() {
        let mut substrate = Substrate::new();
        substrate.registry.register("failing", make_failing).unwrap();
        let dag = one_engine_dag("stage", "failing", true, FallbackPolicy::SkipOptional);
        let (input, output) = buffers();

        let outcome = substrate
            .execute(&dag, test_config(), None, &input, &output)
            .unwrap();

        assert!(outcome.partial_result);
        assert_eq!(outcome.failed_engine_id, None);
        assert!(outcome.completed_engines.is_empty());
    }

    #[test]
    fn optional_engine_failure_without_skip_optional_still_aborts() {
        let mut substrate = Substrate::new();
        substrate.registry.register("failing", make_failing).unwrap();
        let dag = one_engine_dag("stage", "failing", true, FallbackPolicy::Abort);
        let (input, output) = buffers();

        let outcome = substrate
            .execute(&dag, test_config(), None, &input, &output)
            .unwrap();

        assert_eq!(outcome.failed_engine_id, Some("stage".to_string()));
        assert!(!outcome.partial_result);
    }

    #[test]
    fn register_then_construct_round_trips() {
        let mut registry = EngineRegistry::new();
        registry.register("noop", make_noop).unwrap();
        let engine = registry.construct("noop").unwrap();
        assert!(engine.is_initialized());
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = EngineRegistry::new();
        registry.register("noop", make_noop).unwrap();
        assert!(matches!(
            registry.register("noop", make_noop),
            Err(LiveCalcError::DuplicateType(_))
        ));
    }

    #[test]
    fn unknown_type_construction_fails() {
        let registry = EngineRegistry::new();
        assert!(registry.construct("ghost").is_err());
    }
}
