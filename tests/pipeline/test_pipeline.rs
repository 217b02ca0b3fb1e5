#[path = "../common/mod.rs"]
mod common;

use morpho::core::engine::{Engine, EngineRun};
use morpho::core::pipeline::ExecutionPipeline;
use morpho::core::schema::{Document, SchemaRegistry};
use morpho::core::service::MorphoService;
use morpho::ErrorKind;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

#[tokio::test]
async fn class_to_relational_produces_one_table_with_two_columns() {
    let tmp = tempdir().unwrap();
    let service = common::service_with_fixtures(tmp.path());
    let input = common::write_person_document(tmp.path());

    let bytes = service.apply("Class2Relational", &input).await.unwrap();
    let doc = Document::from_slice(&bytes).unwrap();
    assert_eq!(doc.schema, "Relational");
    assert_eq!(doc.roots.len(), 1);
    let table = &doc.roots[0];
    assert_eq!(table.kind, "Table");
    assert_eq!(table.fields.get("name").map(String::as_str), Some("Person"));
    let columns = table.children.get("columns").unwrap();
    assert_eq!(columns.len(), 2);
    assert_eq!(columns[0].fields.get("name").map(String::as_str), Some("name"));
    assert_eq!(columns[1].fields.get("name").map(String::as_str), Some("age"));
}

#[tokio::test]
async fn missing_schema_file_is_an_io_error() {
    let tmp = tempdir().unwrap();
    let config = common::config_for(tmp.path());
    let bundle = common::install_class2relational(&config.storage.builtin_root);
    let service = MorphoService::open(&config).unwrap();
    let input = common::write_person_document(tmp.path());

    fs::remove_file(bundle.join("Class.mms")).unwrap();
    let err = service.apply("Class2Relational", &input).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(err.to_string().contains("Class2Relational"));
}

#[tokio::test]
async fn malformed_program_is_an_engine_error() {
    let tmp = tempdir().unwrap();
    let config = common::config_for(tmp.path());
    let bundle = common::install_class2relational(&config.storage.builtin_root);
    let service = MorphoService::open(&config).unwrap();
    let input = common::write_person_document(tmp.path());

    fs::write(bundle.join("Class2Relational.tfm"), b"not a program").unwrap();
    let err = service.apply("Class2Relational", &input).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Engine);
}

#[tokio::test]
async fn missing_input_document_is_an_io_error() {
    let tmp = tempdir().unwrap();
    let service = common::service_with_fixtures(tmp.path());
    let err = service
        .apply("Class2Relational", &tmp.path().join("absent.mdl"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[tokio::test]
async fn unknown_selector_is_not_found() {
    let tmp = tempdir().unwrap();
    let service = common::service_with_fixtures(tmp.path());
    let input = common::write_person_document(tmp.path());
    let err = service.apply("Nope", &input).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

/// Engine wrapper counting compile invocations, for observing the
/// single-flight discipline from outside.
#[derive(Debug)]
struct CountingEngine {
    inner: morpho::core::engine::rulemap::RuleMapEngine,
    compiles: AtomicUsize,
}

impl CountingEngine {
    fn new() -> Self {
        CountingEngine {
            inner: morpho::core::engine::rulemap::RuleMapEngine,
            compiles: AtomicUsize::new(0),
        }
    }
}

impl Engine for CountingEngine {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn program_extension(&self) -> &'static str {
        self.inner.program_extension()
    }

    fn artifact_extension(&self) -> &'static str {
        self.inner.artifact_extension()
    }

    fn compile(&self, source: &Path, artifact: &Path, schemas: &SchemaRegistry) -> morpho::Result<()> {
        self.compiles.fetch_add(1, Ordering::SeqCst);
        // Widen the race window: concurrent callers must still compile once.
        std::thread::sleep(Duration::from_millis(25));
        self.inner.compile(source, artifact, schemas)
    }

    fn execute(&self, run: &EngineRun, schemas: &SchemaRegistry) -> morpho::Result<()> {
        self.inner.execute(run, schemas)
    }
}

#[tokio::test]
async fn concurrent_first_runs_compile_the_program_once() {
    let tmp = tempdir().unwrap();
    let config = common::config_for(tmp.path());
    common::install_class2relational(&config.storage.builtin_root);
    let service = MorphoService::open(&config).unwrap();
    let entry = service.get("Class2Relational").await.unwrap();
    let input = common::write_person_document(tmp.path());

    let engine = Arc::new(CountingEngine::new());
    let pipeline = Arc::new(ExecutionPipeline::new(
        engine.clone(),
        Arc::new(SchemaRegistry::new()),
        Duration::from_secs(30),
        config.storage.scratch_root.clone(),
    ));

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..8 {
        let pipeline = pipeline.clone();
        let entry = entry.clone();
        let input = input.clone();
        tasks.spawn(async move { pipeline.run(&entry, &input).await });
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
    }

    assert_eq!(engine.compiles.load(Ordering::SeqCst), 1);
    assert!(entry.program.with_extension("tfc").is_file());
}

#[tokio::test]
async fn existing_artifact_is_reused_without_recompiling() {
    let tmp = tempdir().unwrap();
    let config = common::config_for(tmp.path());
    common::install_class2relational(&config.storage.builtin_root);
    let service = MorphoService::open(&config).unwrap();
    let entry = service.get("Class2Relational").await.unwrap();
    let input = common::write_person_document(tmp.path());
    service.apply("Class2Relational", &input).await.unwrap();

    // A fresh pipeline instance sees the artifact on disk and skips compile.
    let engine = Arc::new(CountingEngine::new());
    let pipeline = ExecutionPipeline::new(
        engine.clone(),
        Arc::new(SchemaRegistry::new()),
        Duration::from_secs(30),
        config.storage.scratch_root.clone(),
    );
    pipeline.run(&entry, &input).await.unwrap();
    assert_eq!(engine.compiles.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn expired_deadline_surfaces_as_timeout() {
    let tmp = tempdir().unwrap();
    let service = common::service_with_fixtures(tmp.path());
    let entry = service.get("Class2Relational").await.unwrap();
    let input = common::write_person_document(tmp.path());

    let err = service
        .pipeline()
        .run_with_deadline(&entry, &input, tokio::time::Instant::now())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
}

#[tokio::test]
async fn temporary_output_is_removed_on_success_and_failure() {
    let tmp = tempdir().unwrap();
    let service = common::service_with_fixtures(tmp.path());
    let input = common::write_person_document(tmp.path());

    service.apply("Class2Relational", &input).await.unwrap();
    assert!(common::scratch_entries(tmp.path()).is_empty());

    // A document whose root kind has no rule makes the engine fail after the
    // output slot exists.
    let odd = tmp.path().join("odd.mdl");
    fs::write(&odd, r#"{"schema": "Class", "roots": [{"kind": "Enum"}]}"#).unwrap();
    let err = service.apply("Class2Relational", &odd).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Engine);
    assert!(common::scratch_entries(tmp.path()).is_empty());
}
