use crate::utils::files::{file_stem, read_optional_text};
use crate::CoreError;
use crate::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Per-transformation manifest declaring role-tagged schema entries. This is
/// the primary source of role bindings; the `Source2Target` name split below
/// is a lossy fallback for directories that predate manifests.
pub const MANIFEST_FILE: &str = "manifest.toml";

/// Optional free-text description file inside a transformation directory.
pub const DESCRIPTION_FILE: &str = "description.txt";

/// File extension of schema description files.
pub const SCHEMA_EXTENSION: &str = "mms";

/// Which configured storage root an entry was discovered in. Deletion removes
/// the backing directory under exactly this root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootKind {
    Builtin,
    User,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub input: Vec<ManifestSchema>,
    #[serde(default)]
    pub output: Vec<ManifestSchema>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestSchema {
    /// Role name the schema is bound under.
    pub role: String,
    /// Schema file name relative to the transformation directory.
    pub schema: String,
}

impl Manifest {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| CoreError::io(format!("reading manifest {}", path.display()), e))?;
        toml::from_str(&raw)
            .map_err(|e| CoreError::validation(format!("parsing {}: {e}", path.display())))
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let raw = toml::to_string_pretty(self)
            .map_err(|e| CoreError::validation(format!("encoding manifest: {e}")))?;
        std::fs::write(path, raw)
            .map_err(|e| CoreError::io(format!("writing manifest {}", path.display()), e))
    }
}

/// One transformation directory as found on disk, before the catalog assigns
/// an id.
#[derive(Debug, Clone)]
pub struct DiscoveredTransformation {
    pub name: String,
    pub dir: PathBuf,
    pub program: PathBuf,
    pub inputs: IndexMap<String, PathBuf>,
    pub outputs: IndexMap<String, PathBuf>,
    pub description: Option<String>,
}

/// Scan one storage root for transformation directories, lexicographic order.
/// A missing root is an empty scan, not an error.
pub fn scan_root(root: &Path, program_ext: &str) -> Result<Vec<DiscoveredTransformation>> {
    if !root.exists() {
        tracing::debug!(root = %root.display(), "storage root absent, skipping scan");
        return Ok(Vec::new());
    }
    let entries = std::fs::read_dir(root)
        .map_err(|e| CoreError::io(format!("scanning root {}", root.display()), e))?;
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();

    let mut found = Vec::new();
    for dir in dirs {
        match scan_dir(&dir, program_ext)? {
            Some(discovered) => found.push(discovered),
            None => {
                tracing::warn!(dir = %dir.display(), "skipping directory without a usable bundle");
            }
        }
    }
    Ok(found)
}

/// Inspect a single transformation directory. Returns `None` when the
/// directory cannot yield a usable entry (no program file, undecidable
/// roles); hard I/O failures still propagate.
pub fn scan_dir(dir: &Path, program_ext: &str) -> Result<Option<DiscoveredTransformation>> {
    let Some(name) = dir.file_name().and_then(|n| n.to_str()).map(String::from) else {
        return Ok(None);
    };

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| CoreError::io(format!("reading {}", dir.display()), e))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    let programs: Vec<&PathBuf> = files
        .iter()
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some(program_ext))
        .collect();
    let program = match programs.as_slice() {
        [] => return Ok(None),
        [single] => (*single).clone(),
        [first, ..] => {
            tracing::warn!(
                dir = %dir.display(),
                count = programs.len(),
                "multiple program files, using the lexicographically first"
            );
            (*first).clone()
        }
    };

    let manifest_path = dir.join(MANIFEST_FILE);
    let (inputs, outputs, manifest_description) = if manifest_path.exists() {
        match Manifest::from_file(&manifest_path) {
            Ok(manifest) => (
                role_map(dir, &manifest.input),
                role_map(dir, &manifest.output),
                manifest.description,
            ),
            Err(err) => {
                tracing::warn!(dir = %dir.display(), error = %err, "unreadable manifest");
                return Ok(None);
            }
        }
    } else {
        let Some((inputs, outputs)) = infer_roles_from_name(&name, &files) else {
            return Ok(None);
        };
        (inputs, outputs, None)
    };

    if inputs.is_empty() || outputs.is_empty() {
        return Ok(None);
    }

    let description = manifest_description.or_else(|| read_optional_text(&dir.join(DESCRIPTION_FILE)));

    Ok(Some(DiscoveredTransformation {
        name,
        dir: dir.to_path_buf(),
        program,
        inputs,
        outputs,
        description,
    }))
}

fn role_map(dir: &Path, entries: &[ManifestSchema]) -> IndexMap<String, PathBuf> {
    entries
        .iter()
        .map(|e| (e.role.clone(), dir.join(&e.schema)))
        .collect()
}

/// Lossy fallback: split a `Source2Target` directory name and bind schema
/// files whose names start with either half, case-insensitively. Ambiguous or
/// unsplittable names yield nothing and the directory is skipped.
pub fn infer_roles_from_name(
    name: &str,
    files: &[PathBuf],
) -> Option<(IndexMap<String, PathBuf>, IndexMap<String, PathBuf>)> {
    let (source, target) = split_pair_name(name)?;
    let inputs = schemas_with_prefix(files, source);
    let outputs = schemas_with_prefix(files, target);
    if inputs.is_empty() || outputs.is_empty() {
        return None;
    }
    Some((inputs, outputs))
}

fn split_pair_name(name: &str) -> Option<(&str, &str)> {
    let parts: Vec<&str> = name.split('2').collect();
    match parts.as_slice() {
        [source, target] if !source.is_empty() && !target.is_empty() => Some((source, target)),
        _ => None,
    }
}

fn schemas_with_prefix(files: &[PathBuf], prefix: &str) -> IndexMap<String, PathBuf> {
    let prefix = prefix.to_lowercase();
    files
        .iter()
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some(SCHEMA_EXTENSION))
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.to_lowercase().starts_with(&prefix))
                .unwrap_or(false)
        })
        .filter_map(|p| file_stem(p).map(|stem| (stem, p.clone())))
        .collect()
}
