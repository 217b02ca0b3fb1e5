use crate::core::catalog::{NewTransformation, SearchMatch, Transformation, TransformationCatalog};
use crate::core::chain::ChainExecutor;
use crate::core::config::MorphoConfig;
use crate::core::engine;
use crate::core::pipeline::ExecutionPipeline;
use crate::core::schema::SchemaRegistry;
use crate::Result;
use std::path::Path;
use std::sync::Arc;

/// Facade wiring the catalog, schema registry, engine, pipeline, and chain
/// executor together; one instance serves concurrent callers.
pub struct MorphoService {
    catalog: Arc<TransformationCatalog>,
    pipeline: Arc<ExecutionPipeline>,
    chains: ChainExecutor,
}

impl MorphoService {
    pub fn open(config: &MorphoConfig) -> Result<Self> {
        let engine = engine::select(&config.engine.name)?;
        let catalog = Arc::new(TransformationCatalog::open(
            &config.storage,
            engine.program_extension(),
        )?);
        let registry = Arc::new(SchemaRegistry::new());
        let pipeline = Arc::new(ExecutionPipeline::new(
            engine,
            registry,
            config.run_timeout(),
            config.storage.scratch_root.clone(),
        ));
        let chains = ChainExecutor::new(
            catalog.clone(),
            pipeline.clone(),
            config.chain_timeout(),
            config.storage.scratch_root.clone(),
        );
        Ok(MorphoService {
            catalog,
            pipeline,
            chains,
        })
    }

    pub fn catalog(&self) -> &Arc<TransformationCatalog> {
        &self.catalog
    }

    pub fn pipeline(&self) -> &Arc<ExecutionPipeline> {
        &self.pipeline
    }

    pub async fn list(&self) -> Vec<Arc<Transformation>> {
        self.catalog.list().await
    }

    /// Lookup by id or (case-insensitive) name.
    pub async fn get(&self, selector: &str) -> Result<Arc<Transformation>> {
        self.catalog.resolve(selector).await
    }

    pub async fn add(&self, request: NewTransformation) -> Result<Arc<Transformation>> {
        self.catalog.add(request).await
    }

    pub async fn delete(&self, selector: &str) -> Result<()> {
        self.catalog.delete(selector).await
    }

    /// Apply one transformation to the document at `input`, returning the
    /// serialized output document.
    pub async fn apply(&self, selector: &str, input: &Path) -> Result<Vec<u8>> {
        let transformation = self.catalog.resolve(selector).await?;
        self.pipeline.run(&transformation, input).await
    }

    /// Apply an ordered chain of transformations by name.
    pub async fn apply_chain(&self, names: &[String], input: &Path) -> Result<Vec<u8>> {
        self.chains.run_chain(names, input).await
    }

    pub async fn search(&self, query: &str) -> Result<Vec<SearchMatch>> {
        self.catalog.search(query).await
    }
}
