use crate::core::error::CoreError;
use crate::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Schema description: the shape of documents a transformation reads or
/// writes. The `id` is the stable identifier schemas are registered under;
/// file names carry no meaning beyond the storage layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchemaDef {
    pub id: String,
    pub kinds: Vec<KindDef>,
}

/// One element kind a schema declares, with its scalar fields and the child
/// slots it may contain (slot name -> child kind name).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KindDef {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub children: IndexMap<String, String>,
}

impl SchemaDef {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read(path)
            .map_err(|e| CoreError::io(format!("reading schema {}", path.display()), e))?;
        let def: SchemaDef = serde_json::from_slice(&raw).map_err(|e| {
            CoreError::validation(format!("malformed schema {}: {e}", path.display()))
        })?;
        if def.id.trim().is_empty() {
            return Err(CoreError::validation(format!(
                "schema {} declares an empty id",
                path.display()
            )));
        }
        Ok(def)
    }

    pub fn kind(&self, name: &str) -> Option<&KindDef> {
        self.kinds.iter().find(|k| k.name == name)
    }
}

/// Model document: a schema-tagged tree of elements, serialized as JSON with
/// stable field order so identical inputs always produce identical bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    pub schema: String,
    #[serde(default)]
    pub roots: Vec<Element>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Element {
    pub kind: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub fields: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub children: IndexMap<String, Vec<Element>>,
}

impl Document {
    pub fn from_slice(raw: &[u8]) -> Result<Self> {
        serde_json::from_slice(raw)
            .map_err(|e| CoreError::engine(format!("malformed model document: {e}")))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read(path)
            .map_err(|e| CoreError::io(format!("reading document {}", path.display()), e))?;
        Self::from_slice(&raw)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| CoreError::engine(format!("serializing model document: {e}")))
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)
            .map_err(|e| CoreError::io(format!("writing document {}", path.display()), e))
    }
}
