use crate::core::schema::SchemaRegistry;
use crate::CoreError;
use crate::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub mod rulemap;

/// A model document bound to a named role for one engine run.
#[derive(Debug, Clone)]
pub struct BoundDocument {
    pub role: String,
    pub path: PathBuf,
}

impl BoundDocument {
    pub fn new(role: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        BoundDocument {
            role: role.into(),
            path: path.into(),
        }
    }
}

/// Everything an engine needs to execute one compiled program: the artifact
/// plus exactly one bound input and one bound output document.
#[derive(Debug, Clone)]
pub struct EngineRun {
    pub artifact: PathBuf,
    pub input: BoundDocument,
    pub output: BoundDocument,
}

/// Trait implemented by each transformation engine backend.
///
/// Engines are black boxes to the rest of the crate: they compile a program
/// source into an on-disk artifact (a pure function of the source content)
/// and execute an artifact against bound documents, blocking until done. The
/// pipeline owns scheduling, caching, and timeouts around these calls.
pub trait Engine: Send + Sync + std::fmt::Debug {
    /// Engine name, matches the `[engine] name` config value.
    fn name(&self) -> &'static str;

    /// File extension of program sources this engine consumes.
    fn program_extension(&self) -> &'static str;

    /// File extension of compiled artifacts this engine produces.
    fn artifact_extension(&self) -> &'static str;

    /// Compile `source` into an executable artifact at `artifact`. Every
    /// schema the program references must already be registered.
    fn compile(&self, source: &Path, artifact: &Path, schemas: &SchemaRegistry) -> Result<()>;

    /// Run a compiled artifact to completion, reading the input document and
    /// writing the output document at their bound paths.
    fn execute(&self, run: &EngineRun, schemas: &SchemaRegistry) -> Result<()>;
}

/// Build the default engine registry.
pub fn default_registry() -> HashMap<String, Arc<dyn Engine>> {
    let mut m: HashMap<String, Arc<dyn Engine>> = HashMap::new();
    m.insert("rulemap".to_string(), Arc::new(rulemap::RuleMapEngine));
    m
}

/// Resolve a configured engine name against the registry.
pub fn select(name: &str) -> Result<Arc<dyn Engine>> {
    let registry = default_registry();
    registry.get(name).cloned().ok_or_else(|| {
        let mut known: Vec<_> = registry.keys().cloned().collect();
        known.sort();
        CoreError::validation(format!(
            "unknown engine '{name}' (known: {})",
            known.join(", ")
        ))
    })
}
