use crate::core::catalog::{Transformation, TransformationCatalog};
use crate::core::pipeline::ExecutionPipeline;
use crate::CoreError;
use crate::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Sequences pipeline runs so each step's output document feeds the next
/// step's input, through one scoped temporary directory.
pub struct ChainExecutor {
    catalog: Arc<TransformationCatalog>,
    pipeline: Arc<ExecutionPipeline>,
    chain_timeout: Duration,
    scratch_root: Option<PathBuf>,
}

impl ChainExecutor {
    pub fn new(
        catalog: Arc<TransformationCatalog>,
        pipeline: Arc<ExecutionPipeline>,
        chain_timeout: Duration,
        scratch_root: Option<PathBuf>,
    ) -> Self {
        ChainExecutor {
            catalog,
            pipeline,
            chain_timeout,
            scratch_root,
        }
    }

    /// Run the named transformations in order against `input`. Every name is
    /// resolved before any engine work happens, and one deadline spans all
    /// steps. The working directory and every intermediate file in it are
    /// removed on every exit path.
    pub async fn run_chain(&self, names: &[String], input: &Path) -> Result<Vec<u8>> {
        if names.is_empty() {
            return Err(CoreError::validation(
                "a chain must contain at least one transformation",
            ));
        }

        let steps = self.resolve_all(names).await?;
        let workdir = self.create_workdir()?;
        let deadline = Instant::now() + self.chain_timeout;

        let mut current = input.to_path_buf();
        let mut last_output = Vec::new();
        for (index, step) in steps.iter().enumerate() {
            tracing::debug!(step = index, transformation = %step.name, "chain step starting");
            let bytes = self
                .pipeline
                .run_with_deadline(step, &current, deadline)
                .await
                .map_err(|e| e.annotate(format!("chain step {index} ('{}')", step.name)))?;

            if index + 1 == steps.len() {
                last_output = bytes;
            } else {
                let next = workdir
                    .path()
                    .join(format!("step-{index}-{}.mdl", uuid::Uuid::new_v4()));
                std::fs::write(&next, &bytes).map_err(|e| {
                    CoreError::io(format!("writing intermediate {}", next.display()), e)
                })?;
                current = next;
            }
        }
        // workdir guard removes the directory and its contents here.
        Ok(last_output)
    }

    /// Fail fast: a chain with any unresolvable name does no engine work.
    async fn resolve_all(&self, names: &[String]) -> Result<Vec<Arc<Transformation>>> {
        let mut steps = Vec::with_capacity(names.len());
        let mut missing = Vec::new();
        for name in names {
            match self.catalog.get_by_name(name).await {
                Ok(step) => steps.push(step),
                Err(_) => missing.push(name.as_str()),
            }
        }
        if !missing.is_empty() {
            return Err(CoreError::not_found(format!(
                "chain references unknown transformation(s): {}",
                missing.join(", ")
            )));
        }
        Ok(steps)
    }

    fn create_workdir(&self) -> Result<tempfile::TempDir> {
        let mut builder = tempfile::Builder::new();
        let builder = builder.prefix("morpho-chain-");
        let workdir = match &self.scratch_root {
            Some(root) => {
                std::fs::create_dir_all(root)
                    .map_err(|e| CoreError::io(format!("creating {}", root.display()), e))?;
                builder.tempdir_in(root)
            }
            None => builder.tempdir(),
        }
        .map_err(|e| CoreError::io("allocating chain working directory", e))?;
        Ok(workdir)
    }
}
