//! DAG configuration and execution ordering for wiring independent
//! engine stages together.

use crate::error::{LiveCalcError, LiveCalcResult};
use std::collections::{HashMap, HashSet, VecDeque};

/// Where one engine's input comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputRef {
    /// An external data source, named in `DagConfig::sources`.
    Source(String),
    /// Another engine's named output.
    EngineOutput { engine_id: String, output_name: String },
}

impl InputRef {
    /// Parses `"source_name"` or `"engine_id.output_name"`.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once('.') {
            Some((engine_id, output_name)) => InputRef::EngineOutput {
                engine_id: engine_id.to_string(),
                output_name: output_name.to_string(),
            },
            None => InputRef::Source(raw.to_string()),
        }
    }
}

/// What the executor does when an engine fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Stop the run and report `failed_engine_id`, regardless of `optional`.
    #[default]
    Abort,
    /// If the failing engine is `optional`, skip it and mark the outcome
    /// `partial_result`; a required engine still aborts the run.
    SkipOptional,
}

#[derive(Debug, Clone)]
pub struct EngineSpec {
    pub id: String,
    pub engine_type: String,
    pub config: serde_json::Value,
    pub inputs: Vec<InputRef>,
    pub outputs: Vec<String>,
    pub optional: bool,
    pub fallback: FallbackPolicy,
}

/// A DAG of engines plus the external sources feeding it.
#[derive(Debug, Clone)]
pub struct DagConfig {
    pub engines: Vec<EngineSpec>,
    pub sources: Vec<String>,
}

impl DagConfig {
    /// Validates engine id uniqueness, non-empty types, and that every
    /// input reference resolves to a declared source or engine output.
    pub fn validate(&self) -> LiveCalcResult<()> {
        let mut seen_ids = HashSet::new();
        let mut outputs_by_engine: HashMap<&str, HashSet<&str>> = HashMap::new();

        for engine in &self.engines {
            if engine.engine_type.is_empty() {
                return Err(LiveCalcError::ConfigInvalid(format!(
                    "engine {} has an empty type",
                    engine.id
                )));
            }
            if !seen_ids.insert(engine.id.as_str()) {
                return Err(LiveCalcError::ConfigInvalid(format!(
                    "duplicate engine id: {}",
                    engine.id
                )));
            }
            outputs_by_engine.insert(
                engine.id.as_str(),
                engine.outputs.iter().map(|s| s.as_str()).collect(),
            );
        }

        let sources: HashSet<&str> = self.sources.iter().map(|s| s.as_str()).collect();

        for engine in &self.engines {
            for input in &engine.inputs {
                match input {
                    InputRef::Source(name) => {
                        if !sources.contains(name.as_str()) {
                            return Err(LiveCalcError::MissingReference(format!(
                                "engine {} references undeclared source {name}",
                                engine.id
                            )));
                        }
                    }
                    InputRef::EngineOutput {
                        engine_id,
                        output_name,
                    } => {
                        let has_output = outputs_by_engine
                            .get(engine_id.as_str())
                            .map(|outs| outs.contains(output_name.as_str()))
                            .unwrap_or(false);
                        if !has_output {
                            return Err(LiveCalcError::MissingReference(format!(
                                "engine {} references {engine_id}.{output_name}, which does not exist",
                                engine.id
                            )));
                        }
                    }
                }
            }
        }

        self.topological_order().map(|_| ())
    }

    /// Any valid topological ordering of the engine graph (Kahn's
    /// algorithm), or `Cycle` if one exists.
    pub fn topological_order(&self) -> LiveCalcResult<Vec<String>> {
        let mut in_degree: HashMap<&str, usize> =
            self.engines.iter().map(|e| (e.id.as_str(), 0)).collect();
        let mut dependents: HashMap<&str, Vec<&str>> =
            self.engines.iter().map(|e| (e.id.as_str(), Vec::new())).collect();

        for engine in &self.engines {
            for input in &engine.inputs {
                if let InputRef::EngineOutput { engine_id, .. } = input {
                    if let Some(entry) = in_degree.get_mut(engine.id.as_str()) {
                        *entry += 1;
                    }
                    dependents
                        .entry(engine_id.as_str())
                        .or_default()
                        .push(engine.id.as_str());
                }
            }
        }

        let mut queue: VecDeque<&str> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| *id)
            .collect();
        let mut order = Vec::with_capacity(self.engines.len());

        while let Some(id) = queue.pop_front() {
            order.push(id.to_string());
            if let Some(deps) = dependents.get(id) {
                for dependent in deps {
                    if let Some(entry) = in_degree.get_mut(dependent) {
                        *entry -= 1;
                        if *entry == 0 {
                            queue.push_back(dependent);
                        }
                    }
                }
            }
        }

        if order.len() != self.engines.len() {
            return Err(LiveCalcError::Cycle(
                "engine graph contains a cycle".to_string(),
            ));
        }
        Ok(order)
    }
}

/// Expands `${VAR}` and `$VAR` against the process environment; unset
/// variables expand to the empty string.
pub fn expand_env_vars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '$' && i + 1 < chars.len() {
            if chars[i + 1] == '{' {
                if let Some(end) = chars[i + 2..].iter().position(|c| *c == '}') {
                    let name: String = chars[i + 2..i + 2 + end].iter().collect();
                    out.push_str(&std::env::var(&name).unwrap_or_default());
                    i += 2 + end + 1;
                    continue;
                }
            } else if chars[i + 1].is_ascii_alphabetic() || chars[i + 1] == '_' {
                let mut end = i + 1;
                while end < chars.len() && (chars[end].is_ascii_alphanumeric() || chars[end] == '_') {
                    end += 1;
                }
                let name: String = chars[i + 1..end].iter().collect();
                out.push_str(&std::env::var(&name).unwrap_or_default());
                i = end;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(id: &str, inputs: Vec<&str>, outputs: Vec<&str>) -> EngineSpec {
        EngineSpec {
            id: id.to_string(),
            engine_type: "noop".to_string(),
            config: serde_json::json!({}),
            inputs: inputs.into_iter().map(InputRef::parse).collect(),
            outputs: outputs.into_iter().map(|s| s.to_string()).collect(),
            optional: false,
            fallback: FallbackPolicy::default(),
        }
    }

    #[test]
    fn valid_dag_has_a_topological_order() {
        let dag = DagConfig {
            engines: vec![
                spec("scenarios", vec!["policy_source"], vec!["out"]),
                spec("projection", vec!["scenarios.out"], vec!["npvs"]),
            ],
            sources: vec!["policy_source".to_string()],
        };
        assert!(dag.validate().is_ok());
        let order = dag.topological_order().unwrap();
        assert_eq!(order, vec!["scenarios".to_string(), "projection".to_string()]);
    }

    #[test]
    fn missing_reference_is_rejected() {
        let dag = DagConfig {
            engines: vec![spec("projection", vec!["nonexistent.out"], vec!["npvs"])],
            sources: vec![],
        };
        assert!(matches!(dag.validate(), Err(LiveCalcError::MissingReference(_))));
    }

    #[test]
    fn cycle_is_rejected() {
        let dag = DagConfig {
            engines: vec![
                spec("a", vec!["b.out"], vec!["out"]),
                spec("b", vec!["a.out"], vec!["out"]),
            ],
            sources: vec![],
        };
        assert!(matches!(dag.validate(), Err(LiveCalcError::Cycle(_))));
    }

    #[test]
    fn expands_braced_and_bare_env_vars() {
        std::env::set_var("LIVECALC_TEST_VAR", "hello");
        assert_eq!(expand_env_vars("${LIVECALC_TEST_VAR} world"), "hello world");
        assert_eq!(expand_env_vars("$LIVECALC_TEST_VAR!"), "hello!");
        std::env::remove_var("LIVECALC_TEST_VAR");
    }

    #[test]
    fn unset_var_expands_to_empty_string() {
        std::env::remove_var("LIVECALC_DEFINITELY_UNSET");
        assert_eq!(expand_env_vars("[${LIVECALC_DEFINITELY_UNSET}]"), "[]");
    }
}
