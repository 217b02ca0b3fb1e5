pub mod model;
pub mod registry;

pub use model::{Document, Element, KindDef, SchemaDef};
pub use registry::SchemaRegistry;
