use crate::core::catalog::Transformation;
use crate::core::engine::{BoundDocument, Engine, EngineRun};
use crate::core::schema::{SchemaDef, SchemaRegistry};
use crate::CoreError;
use crate::Result;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempPath;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Role the single input document is bound under. One document per side is
/// bound regardless of how many schemas a transformation declares; see
/// DESIGN.md for the recorded limitation.
pub const INPUT_ROLE: &str = "IN";

/// Role the single output document is bound under.
pub const OUTPUT_ROLE: &str = "OUT";

/// Transient state assembled for exactly one run and dropped at the end of
/// the call; never shared or cached across runs.
struct ExecutionContext {
    schemas: Vec<Arc<SchemaDef>>,
    artifact: PathBuf,
    input: BoundDocument,
    output: BoundDocument,
}

/// Runs one transformation end to end: resolve schemas, obtain the compiled
/// program, bind documents, invoke the engine, collect the result.
pub struct ExecutionPipeline {
    engine: Arc<dyn Engine>,
    registry: Arc<SchemaRegistry>,
    run_timeout: Duration,
    scratch_root: Option<PathBuf>,
    /// Per-program-path guards: at most one concurrent compilation per path,
    /// later callers wait and reuse the artifact.
    compile_locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl ExecutionPipeline {
    pub fn new(
        engine: Arc<dyn Engine>,
        registry: Arc<SchemaRegistry>,
        run_timeout: Duration,
        scratch_root: Option<PathBuf>,
    ) -> Self {
        ExecutionPipeline {
            engine,
            registry,
            run_timeout,
            scratch_root,
            compile_locks: DashMap::new(),
        }
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    /// Run with the pipeline's own timeout budget.
    pub async fn run(&self, transformation: &Transformation, input: &Path) -> Result<Vec<u8>> {
        self.run_with_deadline(transformation, input, Instant::now() + self.run_timeout)
            .await
    }

    /// Run against an externally supplied deadline; the chain executor passes
    /// one deadline through every step instead of resetting it.
    pub async fn run_with_deadline(
        &self,
        transformation: &Transformation,
        input: &Path,
        deadline: Instant,
    ) -> Result<Vec<u8>> {
        let started = Instant::now();

        // Every schema the program depends on, input and output roles alike,
        // is registered before the program is compiled or loaded.
        let mut schemas = Vec::new();
        for (role, path) in transformation
            .input_schemas
            .iter()
            .chain(transformation.output_schemas.iter())
        {
            let schema = self.registry.register_path(path).map_err(|e| {
                e.annotate(format!(
                    "transformation '{}', schema role '{role}'",
                    transformation.name
                ))
            })?;
            schemas.push(schema);
        }

        let artifact = self
            .resolve_artifact(&transformation.program, deadline, started)
            .await
            .map_err(|e| e.annotate(format!("transformation '{}'", transformation.name)))?;

        let output_guard = self.create_output_slot()?;
        let context = ExecutionContext {
            schemas,
            artifact,
            input: BoundDocument::new(INPUT_ROLE, input),
            output: BoundDocument::new(OUTPUT_ROLE, output_guard.to_path_buf()),
        };
        tracing::debug!(
            transformation = %transformation.name,
            schemas = context.schemas.len(),
            artifact = %context.artifact.display(),
            "execution context ready"
        );

        let run = EngineRun {
            artifact: context.artifact.clone(),
            input: context.input.clone(),
            output: context.output.clone(),
        };
        let engine = self.engine.clone();
        let registry = self.registry.clone();
        let task = tokio::task::spawn_blocking(move || -> Result<TempPath> {
            // The guard travels with the blocking task so the temp file is
            // deleted even when the caller abandons a timed-out run.
            let guard = output_guard;
            engine.execute(&run, &registry)?;
            Ok(guard)
        });

        let guard = match tokio::time::timeout_at(deadline, task).await {
            Err(_) => {
                return Err(CoreError::timeout(
                    format!("running transformation '{}'", transformation.name),
                    deadline.saturating_duration_since(started),
                ));
            }
            Ok(Err(join_err)) => {
                return Err(CoreError::engine(format!(
                    "engine task for '{}' failed: {join_err}",
                    transformation.name
                )));
            }
            Ok(Ok(result)) => {
                result.map_err(|e| e.annotate(format!("transformation '{}'", transformation.name)))?
            }
        };

        let bytes = std::fs::read(&guard)
            .map_err(|e| CoreError::io(format!("reading output {}", guard.display()), e))?;
        drop(guard);
        drop(context);
        Ok(bytes)
    }

    /// Obtain the compiled artifact for a program, compiling at most once per
    /// path across concurrent callers. An existing artifact is reused as-is;
    /// there is no staleness check against source edits (recorded open
    /// question).
    async fn resolve_artifact(
        &self,
        program: &Path,
        deadline: Instant,
        started: Instant,
    ) -> Result<PathBuf> {
        let artifact = program.with_extension(self.engine.artifact_extension());
        let lock = self
            .compile_locks
            .entry(program.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();
        let _guard = lock.lock().await;

        if artifact.exists() {
            return Ok(artifact);
        }

        let engine = self.engine.clone();
        let registry = self.registry.clone();
        let source = program.to_path_buf();
        let dest = artifact.clone();
        let task = tokio::task::spawn_blocking(move || engine.compile(&source, &dest, &registry));
        match tokio::time::timeout_at(deadline, task).await {
            Err(_) => Err(CoreError::timeout(
                format!("compiling {}", program.display()),
                deadline.saturating_duration_since(started),
            )),
            Ok(Err(join_err)) => Err(CoreError::engine(format!(
                "compile task for {} failed: {join_err}",
                program.display()
            ))),
            Ok(Ok(result)) => {
                result?;
                Ok(artifact)
            }
        }
    }

    /// Allocate a collision-free temporary output slot whose deletion is tied
    /// to the returned guard.
    fn create_output_slot(&self) -> Result<TempPath> {
        let prefix = format!("morpho-{}-", uuid::Uuid::new_v4());
        let mut builder = tempfile::Builder::new();
        let builder = builder.prefix(&prefix).suffix(".mdl");
        let file = match &self.scratch_root {
            Some(root) => {
                std::fs::create_dir_all(root)
                    .map_err(|e| CoreError::io(format!("creating {}", root.display()), e))?;
                builder.tempfile_in(root)
            }
            None => builder.tempfile(),
        }
        .map_err(|e| CoreError::io("allocating temporary output document", e))?;
        Ok(file.into_temp_path())
    }
}
