//! Assumption resolver contract: a uniform interface to local files or an
//! external registry, with per-concrete-version caching.

mod cache;

pub use cache::VersionCache;

use crate::error::{LiveCalcError, LiveCalcResult, ResolutionFailureKind};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Environment variable naming the external registry's base URL.
pub const ENV_REGISTRY_URL: &str = "LIVECALC_AM_URL";
/// Environment variable naming the bearer token used against the registry.
pub const ENV_REGISTRY_TOKEN: &str = "LIVECALC_AM_TOKEN";
/// Environment variable naming the on-disk cache root.
pub const ENV_CACHE_DIR: &str = "LIVECALC_AM_CACHE_DIR";

/// A resolved numeric table: ordered column names plus numeric rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

/// A version identifier for a named assumption. Concrete versions are
/// immutable and cacheable; `Latest`/`Draft` are never cached and must
/// always resolve against the authoritative source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Version {
    Concrete(String),
    Latest,
    Draft,
}

impl Version {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "latest" => Version::Latest,
            "draft" => Version::Draft,
            other => Version::Concrete(other.to_string()),
        }
    }

    pub fn is_cacheable(&self) -> bool {
        matches!(self, Version::Concrete(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Version::Concrete(v) => v,
            Version::Latest => "latest",
            Version::Draft => "draft",
        }
    }
}

/// The narrow interface the valuation core consumes assumptions through.
pub trait AssumptionResolver {
    fn resolve_table(&self, name: &str, version: &Version) -> LiveCalcResult<ResolvedTable>;

    fn resolve_scalar(
        &self,
        name: &str,
        version: &Version,
        attrs: &HashMap<String, String>,
    ) -> LiveCalcResult<f64>;

    fn list_versions(&self, name: &str) -> LiveCalcResult<Vec<String>>;
}

/// Resolves `local://<path>` references (and bare relative/absolute paths)
/// against a caller-supplied root, caching concrete versions in memory.
///
/// Never logs `LIVECALC_AM_TOKEN`; the field exists only to be forwarded
/// to a future registry transport and is redacted from `Debug`.
pub struct LocalResolver {
    root: PathBuf,
    cache: VersionCache,
    token: Option<String>,
}

impl std::fmt::Debug for LocalResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalResolver")
            .field("root", &self.root)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl LocalResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: VersionCache::new(),
            token: std::env::var(ENV_REGISTRY_TOKEN).ok(),
        }
    }

    fn resolve_path(&self, reference: &str) -> PathBuf {
        let stripped = reference.strip_prefix("local://").unwrap_or(reference);
        let candidate = Path::new(stripped);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.root.join(candidate)
        }
    }

    fn load_table(&self, name: &str, version: &Version) -> LiveCalcResult<ResolvedTable> {
        let file_name = format!("{name}.{}.csv", version.as_str());
        let path = self.resolve_path(&file_name);
        let mut reader = csv::Reader::from_path(&path).map_err(|_| {
            LiveCalcError::ResolutionFailed {
                name: name.to_string(),
                version: version.as_str().to_string(),
                reason: ResolutionFailureKind::NotFound,
            }
        })?;

        let columns: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();
        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let row: LiveCalcResult<Vec<f64>> = record
                .iter()
                .map(|field| {
                    field.parse::<f64>().map_err(|_| {
                        LiveCalcError::ResolutionFailed {
                            name: name.to_string(),
                            version: version.as_str().to_string(),
                            reason: ResolutionFailureKind::MalformedData,
                        }
                    })
                })
                .collect();
            rows.push(row?);
        }

        Ok(ResolvedTable { columns, rows })
    }
}

impl AssumptionResolver for LocalResolver {
    fn resolve_table(&self, name: &str, version: &Version) -> LiveCalcResult<ResolvedTable> {
        if !version.is_cacheable() {
            return self.load_table(name, version);
        }
        self.cache
            .get_or_build(name, version.as_str(), || self.load_table(name, version))
    }

    fn resolve_scalar(
        &self,
        name: &str,
        version: &Version,
        attrs: &HashMap<String, String>,
    ) -> LiveCalcResult<f64> {
        let table = self.resolve_table(name, version)?;
        let key_column = attrs
            .keys()
            .next()
            .ok_or_else(|| LiveCalcError::InvalidParameters("resolve_scalar requires at least one attribute key".to_string()))?;
        let key_value = &attrs[key_column];
        let col_index = table
            .columns
            .iter()
            .position(|c| c == key_column)
            .ok_or_else(|| LiveCalcError::ResolutionFailed {
                name: name.to_string(),
                version: version.as_str().to_string(),
                reason: ResolutionFailureKind::MalformedData,
            })?;
        let row = table
            .rows
            .iter()
            .find(|r| r.get(col_index).map(|v| v.to_string()) == Some(key_value.clone()))
            .ok_or_else(|| LiveCalcError::ResolutionFailed {
                name: name.to_string(),
                version: version.as_str().to_string(),
                reason: ResolutionFailureKind::NotFound,
            })?;
        row.last().copied().ok_or_else(|| LiveCalcError::DataMalformed(format!("{name} has no value column")))
    }

    fn list_versions(&self, name: &str) -> LiveCalcResult<Vec<String>> {
        let entries = std::fs::read_dir(&self.root).map_err(|_| LiveCalcError::ResolutionFailed {
            name: name.to_string(),
            version: "*".to_string(),
            reason: ResolutionFailureKind::NotFound,
        })?;

        let prefix = format!("{name}.");
        let mut versions = Vec::new();
        for entry in entries.flatten() {
            if let Some(file_name) = entry.file_name().to_str() {
                if let Some(rest) = file_name.strip_prefix(&prefix) {
                    if let Some(version) = rest.strip_suffix(".csv") {
                        versions.push(version.to_string());
                    }
                }
            }
        }
        Ok(versions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_table(dir: &Path, file: &str, contents: &str) {
        let mut f = std::fs::File::create(dir.join(file)).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn resolves_concrete_version_and_caches() {
        let dir = std::env::temp_dir().join(format!("livecalc-resolver-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        write_table(&dir, "mortality.v1.csv", "age,qx\n30,0.01\n");

        let resolver = LocalResolver::new(&dir);
        let v1 = Version::parse("v1");
        let table = resolver.resolve_table("mortality", &v1).unwrap();
        assert_eq!(table.columns, vec!["age", "qx"]);
        assert_eq!(table.rows, vec![vec![30.0, 0.01]]);

        // second call should hit the cache rather than re-reading the file
        let _ = resolver.resolve_table("mortality", &v1).unwrap();

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn latest_is_never_cached() {
        assert!(!Version::Latest.is_cacheable());
        assert!(!Version::Draft.is_cacheable());
        assert!(Version::parse("v2.1").is_cacheable());
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = std::env::temp_dir().join(format!("livecalc-resolver-missing-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let resolver = LocalResolver::new(&dir);
        let result = resolver.resolve_table("mortality", &Version::parse("v1"));
        assert!(matches!(
            result,
            Err(LiveCalcError::ResolutionFailed {
                reason: ResolutionFailureKind::NotFound,
                ..
            })
        ));
        std::fs::remove_dir_all(&dir).ok();
    }
}
