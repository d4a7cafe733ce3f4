//! Schema files
//!
//! Schemas can be declared in TOML instead of code:
//!
//! ```toml
//! [[schema]]
//! name = "Database"
//!
//! [[schema.option]]
//! name = "host"
//! type = "string"
//! default = "localhost"
//!
//! [[schema]]
//! name = "Service"
//! label = "api"
//!
//! [[schema.option]]
//! name = "database"
//! type = "nested"
//! schema = "Database"
//! ```
//!
//! Entries may reference schemas declared later in the file.

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::layers::toml_to_json;
use crate::option::OptionDef;
use crate::schema::Schema;
use crate::value::Value;

/// Schema file format version this build understands
pub const SCHEMA_VERSION: u32 = 1;

/// A parsed schema file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaFile {
    /// Schema version for forward compatibility
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    #[serde(default, rename = "schema")]
    pub schemas: Vec<SchemaEntry>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// One `[[schema]]` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaEntry {
    pub name: String,

    /// Container identifier override
    pub label: Option<String>,

    /// Name of the parent schema
    pub extends: Option<String>,

    #[serde(default, rename = "option")]
    pub options: Vec<OptionEntry>,
}

/// Option kinds available in schema files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    #[default]
    Any,
    String,
    Integer,
    Float,
    Boolean,
    List,
    Datetime,
    Nested,
}

/// One `[[schema.option]]` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionEntry {
    pub name: String,

    #[serde(default, rename = "type")]
    pub kind: OptionType,

    pub default: Option<toml::Value>,

    pub choices: Option<Vec<toml::Value>>,

    pub min: Option<toml::Value>,

    pub max: Option<toml::Value>,

    /// Regular expression the whole string must match
    pub pattern: Option<String>,

    #[serde(default)]
    pub none_to_default: bool,

    /// Schema of a nested option
    pub schema: Option<String>,
}

/// Errors that can occur when loading a schema file
#[derive(Debug, thiserror::Error)]
pub enum SchemaFileError {
    #[error("Failed to read schema file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Unsupported schema_version {0} (expected {})", SCHEMA_VERSION)]
    UnsupportedVersion(u32),

    #[error("Duplicate schema name: '{0}'")]
    DuplicateName(String),

    #[error("Schema '{schema}': unknown schema '{reference}'")]
    UnknownSchema { schema: String, reference: String },

    #[error("Schema '{0}' is part of a reference cycle")]
    Cycle(String),

    #[error("Schema '{schema}', option '{option}': {reason}")]
    InvalidOption {
        schema: String,
        option: String,
        reason: String,
    },
}

/// Schemas built from a file, by name
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: IndexMap<String, Arc<Schema>>,
}

impl SchemaRegistry {
    pub fn get(&self, name: &str) -> Option<&Arc<Schema>> {
        self.schemas.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Schema>> {
        self.schemas.values()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

fn convert(value: &toml::Value) -> Value {
    Value::from_json(toml_to_json(value.clone()))
}

impl SchemaFile {
    /// Load and build a schema file
    pub fn load(path: &Path) -> Result<SchemaRegistry, SchemaFileError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)?.build()
    }

    /// Parse a schema file from a TOML string
    pub fn parse(content: &str) -> Result<Self, SchemaFileError> {
        Ok(toml::from_str(content)?)
    }

    /// Build every schema, resolving parents and nested schemas by name
    pub fn build(&self) -> Result<SchemaRegistry, SchemaFileError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(SchemaFileError::UnsupportedVersion(self.schema_version));
        }

        let mut entries: IndexMap<&str, &SchemaEntry> = IndexMap::new();
        for entry in &self.schemas {
            if entries.insert(entry.name.as_str(), entry).is_some() {
                return Err(SchemaFileError::DuplicateName(entry.name.clone()));
            }
        }

        let mut registry = SchemaRegistry::default();
        let mut resolving = Vec::new();
        for entry in &self.schemas {
            resolve(&entry.name, &entries, &mut registry, &mut resolving)?;
        }

        tracing::debug!(schemas = registry.len(), "Loaded schema file");
        Ok(registry)
    }
}

fn resolve(
    name: &str,
    entries: &IndexMap<&str, &SchemaEntry>,
    registry: &mut SchemaRegistry,
    resolving: &mut Vec<String>,
) -> Result<Arc<Schema>, SchemaFileError> {
    if let Some(schema) = registry.get(name) {
        return Ok(Arc::clone(schema));
    }
    if resolving.iter().any(|n| n == name) {
        return Err(SchemaFileError::Cycle(name.to_string()));
    }
    let entry = entries.get(name).ok_or_else(|| SchemaFileError::UnknownSchema {
        schema: resolving.last().cloned().unwrap_or_default(),
        reference: name.to_string(),
    })?;

    resolving.push(name.to_string());

    let mut builder = Schema::builder(entry.name.as_str());
    if let Some(label) = &entry.label {
        builder = builder.label(label.as_str());
    }
    if let Some(parent) = &entry.extends {
        let parent = resolve(parent, entries, registry, resolving)?;
        builder = builder.extends(&parent);
    }
    for option in &entry.options {
        builder = builder.option(build_option(entry, option, entries, registry, resolving)?);
    }

    resolving.pop();

    let schema = builder.build();
    registry
        .schemas
        .insert(entry.name.clone(), Arc::clone(&schema));
    Ok(schema)
}

fn build_option(
    entry: &SchemaEntry,
    option: &OptionEntry,
    entries: &IndexMap<&str, &SchemaEntry>,
    registry: &mut SchemaRegistry,
    resolving: &mut Vec<String>,
) -> Result<OptionDef, SchemaFileError> {
    let invalid = |reason: String| SchemaFileError::InvalidOption {
        schema: entry.name.clone(),
        option: option.name.clone(),
        reason,
    };

    let name = option.name.as_str();
    let default = option.default.as_ref().map(convert).unwrap_or_default();

    let mut def = match option.kind {
        OptionType::Any => OptionDef::new(name, default),
        OptionType::String => OptionDef::string(name, default),
        OptionType::Integer => OptionDef::integer(name, default),
        OptionType::Float => OptionDef::float(name, default),
        OptionType::Boolean => OptionDef::boolean(name, default),
        OptionType::List => OptionDef::list(name, default),
        OptionType::Datetime => OptionDef::iso8601(name, default),
        OptionType::Nested => {
            if option.default.is_some() {
                return Err(invalid(
                    "nested options take their defaults from the nested schema".to_string(),
                ));
            }
            let reference = option
                .schema
                .as_deref()
                .ok_or_else(|| invalid("nested options need a `schema`".to_string()))?;
            let nested = resolve(reference, entries, registry, resolving)?;
            OptionDef::nested(name, &nested)
        }
    };

    if let Some(choices) = &option.choices {
        def = def.choices(choices.iter().map(convert));
    }
    if let Some(min) = &option.min {
        def = def.min_value(convert(min));
    }
    if let Some(max) = &option.max {
        def = def.max_value(convert(max));
    }
    if let Some(pattern) = &option.pattern {
        def = def.pattern(pattern).map_err(|e| invalid(e.to_string()))?;
    }

    Ok(def.none_to_default(option.none_to_default))
}
