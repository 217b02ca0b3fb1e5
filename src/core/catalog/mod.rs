use crate::core::config::StorageConfig;
use crate::utils::files::copy_into;
use crate::CoreError;
use crate::Result;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

pub mod layout;

pub use layout::{DiscoveredTransformation, Manifest, ManifestSchema, RootKind};

/// One catalog entry. Ids are process-stable, assigned monotonically at load
/// or add time, and never reused after deletion.
#[derive(Debug, Clone, Serialize)]
pub struct Transformation {
    pub id: u64,
    pub name: String,
    pub program: PathBuf,
    pub input_schemas: IndexMap<String, PathBuf>,
    pub output_schemas: IndexMap<String, PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub dir: PathBuf,
    pub root: RootKind,
}

/// Request payload for [`TransformationCatalog::add`].
#[derive(Debug, Clone)]
pub struct NewTransformation {
    pub name: String,
    pub program: PathBuf,
    pub inputs: Vec<PathBuf>,
    pub outputs: Vec<PathBuf>,
    pub description: Option<String>,
}

/// A program-content search hit.
#[derive(Debug, Clone, Serialize)]
pub struct SearchMatch {
    pub name: String,
    pub program: PathBuf,
    pub context: String,
}

#[derive(Default)]
struct Index {
    by_id: BTreeMap<u64, Arc<Transformation>>,
    /// Lowercased name -> id; names are case-insensitively unique.
    by_name: HashMap<String, u64>,
}

impl Index {
    fn insert(&mut self, entry: Arc<Transformation>) {
        self.by_name.insert(entry.name.to_lowercase(), entry.id);
        self.by_id.insert(entry.id, entry);
    }

    fn remove(&mut self, id: u64) -> Option<Arc<Transformation>> {
        let entry = self.by_id.remove(&id)?;
        self.by_name.remove(&entry.name.to_lowercase());
        Some(entry)
    }
}

/// In-memory index over the storage roots. `add`/`delete` take the write
/// lock, lookups a read lock, so readers never observe a half-applied
/// mutation.
pub struct TransformationCatalog {
    user_root: PathBuf,
    program_ext: String,
    next_id: AtomicU64,
    index: RwLock<Index>,
}

impl TransformationCatalog {
    /// Scan the configured roots (builtin before user, directories in
    /// lexicographic order) and build the index. Ids are assigned from a
    /// single counter across all roots.
    pub fn open(storage: &StorageConfig, program_ext: &str) -> Result<Self> {
        let roots = [
            (&storage.builtin_root, RootKind::Builtin),
            (&storage.user_root, RootKind::User),
        ];
        let mut index = Index::default();
        let mut next_id: u64 = 1;
        for (root, kind) in roots {
            for discovered in layout::scan_root(root, program_ext)? {
                let key = discovered.name.to_lowercase();
                if index.by_name.contains_key(&key) {
                    tracing::warn!(
                        name = %discovered.name,
                        dir = %discovered.dir.display(),
                        "duplicate transformation name, keeping the first"
                    );
                    continue;
                }
                let id = next_id;
                next_id += 1;
                index.insert(Arc::new(Transformation {
                    id,
                    name: discovered.name,
                    program: discovered.program,
                    input_schemas: discovered.inputs,
                    output_schemas: discovered.outputs,
                    description: discovered.description,
                    dir: discovered.dir,
                    root: kind,
                }));
            }
        }
        tracing::info!(count = index.by_id.len(), "transformation catalog loaded");
        Ok(TransformationCatalog {
            user_root: storage.user_root.clone(),
            program_ext: program_ext.to_string(),
            next_id: AtomicU64::new(next_id),
            index: RwLock::new(index),
        })
    }

    /// All entries in id order; stable for the life of the process.
    pub async fn list(&self) -> Vec<Arc<Transformation>> {
        self.index.read().await.by_id.values().cloned().collect()
    }

    pub async fn get_by_id(&self, id: u64) -> Result<Arc<Transformation>> {
        self.index
            .read()
            .await
            .by_id
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::not_found(format!("transformation id {id}")))
    }

    /// Case-insensitive name lookup.
    pub async fn get_by_name(&self, name: &str) -> Result<Arc<Transformation>> {
        let index = self.index.read().await;
        index
            .by_name
            .get(&name.to_lowercase())
            .and_then(|id| index.by_id.get(id))
            .cloned()
            .ok_or_else(|| CoreError::not_found(format!("transformation '{name}'")))
    }

    /// Resolve an id-or-name selector, the way the service boundary addresses
    /// entries.
    pub async fn resolve(&self, selector: &str) -> Result<Arc<Transformation>> {
        if let Ok(id) = selector.parse::<u64>() {
            return self.get_by_id(id).await;
        }
        self.get_by_name(selector).await
    }

    /// Validate, materialize the artifact bundle under the user root, and
    /// index the new entry. Validation happens before any filesystem
    /// mutation; a rejected request leaves disk and index untouched.
    pub async fn add(&self, request: NewTransformation) -> Result<Arc<Transformation>> {
        validate_request(&request)?;

        let mut index = self.index.write().await;
        if index.by_name.contains_key(&request.name.to_lowercase()) {
            return Err(CoreError::conflict(format!(
                "transformation '{}' already exists",
                request.name
            )));
        }
        let dir = self.user_root.join(&request.name);
        if dir.exists() {
            return Err(CoreError::conflict(format!(
                "directory for '{}' already exists under the user root",
                request.name
            )));
        }

        let entry = match self.materialize(&request, &dir) {
            Ok(entry) => entry,
            Err(err) => {
                // A half-copied bundle must not survive a failed add.
                if dir.exists() {
                    if let Err(cleanup) = std::fs::remove_dir_all(&dir) {
                        tracing::warn!(
                            dir = %dir.display(),
                            error = %cleanup,
                            "failed to remove partial bundle"
                        );
                    }
                }
                return Err(err);
            }
        };

        let entry = Arc::new(entry);
        index.insert(entry.clone());
        tracing::info!(id = entry.id, name = %entry.name, "transformation added");
        Ok(entry)
    }

    fn materialize(&self, request: &NewTransformation, dir: &Path) -> Result<Transformation> {
        std::fs::create_dir_all(dir)
            .map_err(|e| CoreError::io(format!("creating {}", dir.display()), e))?;

        let program_ext = request
            .program
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or(&self.program_ext)
            .to_string();
        let program = copy_into(
            &request.program,
            dir,
            &format!("{}.{}", request.name, program_ext),
        )?;

        let inputs = self.copy_schemas(&request.inputs, dir)?;
        let outputs = self.copy_schemas(&request.outputs, dir)?;

        if let Some(description) = &request.description {
            let path = dir.join(layout::DESCRIPTION_FILE);
            std::fs::write(&path, description)
                .map_err(|e| CoreError::io(format!("writing {}", path.display()), e))?;
        }

        let manifest = Manifest {
            description: request.description.clone(),
            input: manifest_entries(&inputs),
            output: manifest_entries(&outputs),
        };
        manifest.write_to(&dir.join(layout::MANIFEST_FILE))?;

        Ok(Transformation {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            name: request.name.clone(),
            program,
            input_schemas: inputs,
            output_schemas: outputs,
            description: request.description.clone(),
            dir: dir.to_path_buf(),
            root: RootKind::User,
        })
    }

    fn copy_schemas(&self, sources: &[PathBuf], dir: &Path) -> Result<IndexMap<String, PathBuf>> {
        let mut roles = IndexMap::new();
        for source in sources {
            let file_name = source
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| {
                    CoreError::validation(format!("schema path {} has no file name", source.display()))
                })?;
            let dest = copy_into(source, dir, file_name)?;
            let role = crate::utils::files::file_stem(&dest)
                .unwrap_or_else(|| file_name.to_string());
            roles.insert(role, dest);
        }
        Ok(roles)
    }

    /// Remove the entry addressed by id or name, deleting its backing
    /// directory under the root it was discovered in.
    pub async fn delete(&self, selector: &str) -> Result<()> {
        let mut index = self.index.write().await;
        let id = if let Ok(id) = selector.parse::<u64>() {
            id
        } else {
            *index
                .by_name
                .get(&selector.to_lowercase())
                .ok_or_else(|| CoreError::not_found(format!("transformation '{selector}'")))?
        };
        let entry = index
            .remove(id)
            .ok_or_else(|| CoreError::not_found(format!("transformation id {id}")))?;
        std::fs::remove_dir_all(&entry.dir)
            .map_err(|e| CoreError::io(format!("removing {}", entry.dir.display()), e))?;
        tracing::info!(id = entry.id, name = %entry.name, "transformation deleted");
        Ok(())
    }

    /// Scan program sources for a case-insensitive substring, returning the
    /// first matching line per entry as context.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchMatch>> {
        let entries = self.list().await;
        let needle = query.to_lowercase();
        let mut matches = Vec::new();
        for entry in entries {
            let source = match std::fs::read_to_string(&entry.program) {
                Ok(source) => source,
                Err(err) => {
                    tracing::warn!(
                        program = %entry.program.display(),
                        error = %err,
                        "unreadable program skipped during search"
                    );
                    continue;
                }
            };
            if let Some(line) = source
                .lines()
                .find(|line| line.to_lowercase().contains(&needle))
            {
                matches.push(SearchMatch {
                    name: entry.name.clone(),
                    program: entry.program.clone(),
                    context: line.trim().to_string(),
                });
            }
        }
        Ok(matches)
    }
}

fn validate_request(request: &NewTransformation) -> Result<()> {
    if request.name.trim().is_empty() {
        return Err(CoreError::validation("transformation name must not be empty"));
    }
    if request.name.contains('/') || request.name.contains('\\') {
        return Err(CoreError::validation(
            "transformation name must not contain path separators",
        ));
    }
    if request.program.as_os_str().is_empty() {
        return Err(CoreError::validation("program path must not be empty"));
    }
    if request.inputs.is_empty() {
        return Err(CoreError::validation("at least one input schema is required"));
    }
    if request.outputs.is_empty() {
        return Err(CoreError::validation("at least one output schema is required"));
    }
    for path in std::iter::once(&request.program)
        .chain(request.inputs.iter())
        .chain(request.outputs.iter())
    {
        if !path.is_file() {
            return Err(CoreError::validation(format!(
                "referenced file does not exist: {}",
                path.display()
            )));
        }
    }
    Ok(())
}

fn manifest_entries(roles: &IndexMap<String, PathBuf>) -> Vec<ManifestSchema> {
    roles
        .iter()
        .filter_map(|(role, path)| {
            path.file_name().and_then(|n| n.to_str()).map(|schema| ManifestSchema {
                role: role.clone(),
                schema: schema.to_string(),
            })
        })
        .collect()
}
