use crate::core::engine::{Engine, EngineRun};
use crate::core::schema::{Document, Element, SchemaDef, SchemaRegistry};
use crate::CoreError;
use crate::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Rule-map transformation program as written by authors: a source schema, a
/// target schema, and one production rule per source element kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramSource {
    pub name: String,
    pub source: String,
    pub target: String,
    pub rules: Vec<RuleDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDef {
    /// Source element kind this rule fires on.
    #[serde(rename = "match")]
    pub matches: String,
    /// Target element kind the rule produces.
    pub produce: String,
    /// Target field -> source field.
    #[serde(default)]
    pub fields: IndexMap<String, String>,
    /// Target child slot -> source child slot; child elements are transformed
    /// by the rule matching their own kind.
    #[serde(default)]
    pub children: IndexMap<String, String>,
}

/// Compiled form of a rule-map program: rules indexed by source kind, plus a
/// digest of the source bytes it was compiled from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompiledProgram {
    pub name: String,
    pub source: String,
    pub target: String,
    pub digest: String,
    pub rules: IndexMap<String, CompiledRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompiledRule {
    pub produce: String,
    pub fields: IndexMap<String, String>,
    pub children: IndexMap<String, String>,
}

/// Built-in engine executing rule-map programs.
#[derive(Debug)]
pub struct RuleMapEngine;

impl Engine for RuleMapEngine {
    fn name(&self) -> &'static str {
        "rulemap"
    }

    fn program_extension(&self) -> &'static str {
        "tfm"
    }

    fn artifact_extension(&self) -> &'static str {
        "tfc"
    }

    fn compile(&self, source: &Path, artifact: &Path, schemas: &SchemaRegistry) -> Result<()> {
        let raw = std::fs::read(source)
            .map_err(|e| CoreError::io(format!("reading program {}", source.display()), e))?;
        let program: ProgramSource = serde_json::from_slice(&raw).map_err(|e| {
            CoreError::engine(format!("compiling {}: {e}", source.display()))
        })?;

        let source_schema = resolve_schema(schemas, &program.source, source)?;
        let target_schema = resolve_schema(schemas, &program.target, source)?;

        let mut rules = IndexMap::new();
        for rule in &program.rules {
            if source_schema.kind(&rule.matches).is_none() {
                return Err(CoreError::engine(format!(
                    "compiling {}: rule matches unknown kind '{}' in schema '{}'",
                    source.display(),
                    rule.matches,
                    source_schema.id
                )));
            }
            if target_schema.kind(&rule.produce).is_none() {
                return Err(CoreError::engine(format!(
                    "compiling {}: rule produces unknown kind '{}' in schema '{}'",
                    source.display(),
                    rule.produce,
                    target_schema.id
                )));
            }
            if rules
                .insert(
                    rule.matches.clone(),
                    CompiledRule {
                        produce: rule.produce.clone(),
                        fields: rule.fields.clone(),
                        children: rule.children.clone(),
                    },
                )
                .is_some()
            {
                return Err(CoreError::engine(format!(
                    "compiling {}: duplicate rule for kind '{}'",
                    source.display(),
                    rule.matches
                )));
            }
        }

        let compiled = CompiledProgram {
            name: program.name,
            source: program.source,
            target: program.target,
            digest: hex::encode(Sha256::digest(&raw)),
            rules,
        };
        let bytes = serde_json::to_vec_pretty(&compiled)
            .map_err(|e| CoreError::engine(format!("encoding artifact: {e}")))?;
        std::fs::write(artifact, bytes)
            .map_err(|e| CoreError::io(format!("writing artifact {}", artifact.display()), e))?;
        tracing::debug!(
            program = %source.display(),
            artifact = %artifact.display(),
            "program compiled"
        );
        Ok(())
    }

    fn execute(&self, run: &EngineRun, schemas: &SchemaRegistry) -> Result<()> {
        let raw = std::fs::read(&run.artifact).map_err(|e| {
            CoreError::io(format!("reading artifact {}", run.artifact.display()), e)
        })?;
        let program: CompiledProgram = serde_json::from_slice(&raw).map_err(|e| {
            CoreError::engine(format!("corrupt artifact {}: {e}", run.artifact.display()))
        })?;

        // The schemas were registered before the artifact was loaded; a miss
        // here means the pipeline contract was broken.
        resolve_schema(schemas, &program.source, &run.artifact)?;
        resolve_schema(schemas, &program.target, &run.artifact)?;

        let input = Document::from_file(&run.input.path)?;
        if input.schema != program.source {
            return Err(CoreError::engine(format!(
                "input document for role '{}' conforms to '{}', program '{}' reads '{}'",
                run.input.role, input.schema, program.name, program.source
            )));
        }

        let mut roots = Vec::with_capacity(input.roots.len());
        for element in &input.roots {
            roots.push(apply_rules(&program, element)?);
        }
        let output = Document {
            schema: program.target.clone(),
            roots,
        };
        output.write_to(&run.output.path)?;
        tracing::debug!(
            program = %program.name,
            output = %run.output.path.display(),
            "transformation executed"
        );
        Ok(())
    }
}

fn resolve_schema(
    schemas: &SchemaRegistry,
    id: &str,
    referenced_by: &Path,
) -> Result<std::sync::Arc<SchemaDef>> {
    schemas.get(id).ok_or_else(|| {
        CoreError::engine(format!(
            "schema '{id}' referenced by {} is not registered",
            referenced_by.display()
        ))
    })
}

fn apply_rules(program: &CompiledProgram, element: &Element) -> Result<Element> {
    let rule = program.rules.get(&element.kind).ok_or_else(|| {
        CoreError::engine(format!(
            "program '{}' has no rule for kind '{}'",
            program.name, element.kind
        ))
    })?;

    let mut fields = IndexMap::new();
    for (target_field, source_field) in &rule.fields {
        if let Some(value) = element.fields.get(source_field) {
            fields.insert(target_field.clone(), value.clone());
        }
    }

    let mut children = IndexMap::new();
    for (target_slot, source_slot) in &rule.children {
        let Some(source_children) = element.children.get(source_slot) else {
            continue;
        };
        let mut produced = Vec::with_capacity(source_children.len());
        for child in source_children {
            produced.push(apply_rules(program, child)?);
        }
        children.insert(target_slot.clone(), produced);
    }

    Ok(Element {
        kind: rule.produce.clone(),
        fields,
        children,
    })
}
