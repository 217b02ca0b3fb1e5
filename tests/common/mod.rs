#![allow(dead_code)]

use morpho::core::config::MorphoConfig;
use morpho::core::service::MorphoService;
use std::fs;
use std::path::{Path, PathBuf};

pub const CLASS_SCHEMA: &str = r#"{
    "id": "Class",
    "kinds": [
        {"name": "Class", "fields": ["name"], "children": {"attributes": "Attribute"}},
        {"name": "Attribute", "fields": ["name", "type"]}
    ]
}"#;

pub const RELATIONAL_SCHEMA: &str = r#"{
    "id": "Relational",
    "kinds": [
        {"name": "Table", "fields": ["name"], "children": {"columns": "Column"}},
        {"name": "Column", "fields": ["name", "type"]}
    ]
}"#;

pub const CLASS2RELATIONAL_PROGRAM: &str = r#"{
    "name": "Class2Relational",
    "source": "Class",
    "target": "Relational",
    "rules": [
        {"match": "Class", "produce": "Table",
         "fields": {"name": "name"}, "children": {"columns": "attributes"}},
        {"match": "Attribute", "produce": "Column",
         "fields": {"name": "name", "type": "type"}}
    ]
}"#;

pub const RELATIONAL_COPY_PROGRAM: &str = r#"{
    "name": "Relational2Relational",
    "source": "Relational",
    "target": "Relational",
    "rules": [
        {"match": "Table", "produce": "Table",
         "fields": {"name": "name"}, "children": {"columns": "columns"}},
        {"match": "Column", "produce": "Column",
         "fields": {"name": "name", "type": "type"}}
    ]
}"#;

pub const PERSON_DOCUMENT: &str = r#"{
    "schema": "Class",
    "roots": [{
        "kind": "Class",
        "fields": {"name": "Person"},
        "children": {"attributes": [
            {"kind": "Attribute", "fields": {"name": "name", "type": "String"}},
            {"kind": "Attribute", "fields": {"name": "age", "type": "Integer"}}
        ]}
    }]
}"#;

/// Materialize a Class2Relational bundle (program, schemas, manifest,
/// description) under `root` and return the bundle directory.
pub fn install_class2relational(root: &Path) -> PathBuf {
    let dir = root.join("Class2Relational");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("Class2Relational.tfm"), CLASS2RELATIONAL_PROGRAM).unwrap();
    fs::write(dir.join("Class.mms"), CLASS_SCHEMA).unwrap();
    fs::write(dir.join("Relational.mms"), RELATIONAL_SCHEMA).unwrap();
    fs::write(dir.join("description.txt"), "Maps classes to relational tables\n").unwrap();
    fs::write(
        dir.join("manifest.toml"),
        r#"
[[input]]
role = "Class"
schema = "Class.mms"

[[output]]
role = "Relational"
schema = "Relational.mms"
"#,
    )
    .unwrap();
    dir
}

/// Materialize a Relational -> Relational copy bundle, role inference left to
/// the `Source2Target` name heuristic (no manifest).
pub fn install_relational_copy(root: &Path) -> PathBuf {
    let dir = root.join("Relational2Relational");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("Relational2Relational.tfm"), RELATIONAL_COPY_PROGRAM).unwrap();
    fs::write(dir.join("Relational.mms"), RELATIONAL_SCHEMA).unwrap();
    dir
}

pub fn write_person_document(dir: &Path) -> PathBuf {
    let path = dir.join("person.mdl");
    fs::write(&path, PERSON_DOCUMENT).unwrap();
    path
}

/// Config rooted inside `tmp`: builtin/, user/, scratch/ for observable temp
/// file lifetimes.
pub fn config_for(tmp: &Path) -> MorphoConfig {
    let mut config = MorphoConfig::default();
    config.storage.builtin_root = tmp.join("builtin");
    config.storage.user_root = tmp.join("user");
    config.storage.scratch_root = Some(tmp.join("scratch"));
    config
}

/// Service over a builtin root holding the Class2Relational fixture.
pub fn service_with_fixtures(tmp: &Path) -> MorphoService {
    let config = config_for(tmp);
    install_class2relational(&config.storage.builtin_root);
    MorphoService::open(&config).unwrap()
}

/// Files currently present under the scratch root, recursively.
pub fn scratch_entries(tmp: &Path) -> Vec<PathBuf> {
    let scratch = tmp.join("scratch");
    if !scratch.exists() {
        return Vec::new();
    }
    walk(&scratch)
}

fn walk(dir: &Path) -> Vec<PathBuf> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).unwrap().flatten() {
        let path = entry.path();
        if path.is_dir() {
            entries.extend(walk(&path));
        }
        entries.push(path);
    }
    entries
}
