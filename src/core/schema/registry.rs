use crate::core::schema::SchemaDef;
use crate::Result;
use dashmap::DashMap;
use std::path::Path;
use std::sync::Arc;

/// Shared namespace of registered schema descriptions, keyed by the schema's
/// declared id. One registry instance is owned by the service and handed to
/// every pipeline run; nothing here is process-global.
///
/// Registration is idempotent: the first registration of an id wins and later
/// ones return the existing handle. The map serializes writers per key, so
/// concurrent registrations of distinct ids proceed in parallel.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    entries: DashMap<String, Arc<SchemaDef>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        SchemaRegistry {
            entries: DashMap::new(),
        }
    }

    /// Parse the schema file and register it under its declared id.
    pub fn register_path(&self, path: &Path) -> Result<Arc<SchemaDef>> {
        let def = SchemaDef::from_file(path)?;
        let id = def.id.clone();
        let entry = self
            .entries
            .entry(id)
            .or_insert_with(|| Arc::new(def))
            .value()
            .clone();
        tracing::debug!(schema = %entry.id, path = %path.display(), "schema registered");
        Ok(entry)
    }

    pub fn get(&self, id: &str) -> Option<Arc<SchemaDef>> {
        self.entries.get(id).map(|e| e.value().clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
