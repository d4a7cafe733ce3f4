//! Layered configuration with provenance
//!
//! A [`LayeredConfig`] is a container built from schema defaults, any number
//! of TOML or JSON files, and command-line overrides, merged in that order.
//! It records where every layer came from.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};

use super::merge::merge_layers;
use crate::container::OptionContainer;
use crate::error::InvalidOption;
use crate::schema::Schema;
use crate::value::Value;

/// Origin of a configuration layer
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LayerOrigin {
    Defaults,
    File,
    Override,
}

/// A contributing layer with provenance
#[derive(Debug, Clone, Serialize)]
pub struct LayerSource {
    pub origin: LayerOrigin,

    /// File path (None for defaults/overrides)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes (None for defaults/overrides)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Container built from merged layers
#[derive(Debug, Clone, Serialize)]
pub struct LayeredConfig {
    /// Schema the layers were validated against
    pub schema: String,

    /// When this config was computed
    pub created_at: DateTime<Utc>,

    /// Contributing sources in precedence order
    pub sources: Vec<LayerSource>,

    /// The validated container
    pub config: OptionContainer,
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid override `{0}`: expected key.path=value")]
    InvalidOverride(String),

    #[error("Configuration must be a table at the top level")]
    NotATable,

    #[error("Validation error: {0}")]
    ValidationError(#[from] InvalidOption),
}

/// File formats understood by [`LayeredConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Toml,
    Json,
}

impl Format {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Toml,
        }
    }
}

impl LayeredConfig {
    /// Build a container from config files and an override layer.
    ///
    /// Files are applied in the order given; the override layer wins over
    /// all of them. Options no layer mentions keep their schema default.
    pub fn build(
        schema: &Arc<Schema>,
        files: &[PathBuf],
        overrides: Option<JsonValue>,
    ) -> Result<Self, ConfigError> {
        let mut layers = Vec::new();
        let mut sources = vec![LayerSource {
            origin: LayerOrigin::Defaults,
            path: None,
            digest: None,
        }];

        for path in files {
            let (value, digest) = Self::load_file(path)?;
            tracing::debug!(path = %path.display(), digest = %digest, "Loaded config layer");
            layers.push(value);
            sources.push(LayerSource {
                origin: LayerOrigin::File,
                path: Some(path.to_string_lossy().to_string()),
                digest: Some(digest),
            });
        }

        if let Some(overrides) = overrides {
            layers.push(overrides);
            sources.push(LayerSource {
                origin: LayerOrigin::Override,
                path: None,
                digest: None,
            });
        }

        let merged = match Value::from_json(merge_layers(layers)) {
            Value::Map(map) => map,
            _ => return Err(ConfigError::NotATable),
        };
        let config = schema.instantiate(merged)?;

        Ok(Self {
            schema: schema.name().to_string(),
            created_at: Utc::now(),
            sources,
            config,
        })
    }

    /// Load and parse a config file, returning the value and digest
    fn load_file(path: &Path) -> Result<(JsonValue, String), ConfigError> {
        let bytes = fs::read(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hex::encode(hasher.finalize());

        let contents = String::from_utf8(bytes)
            .map_err(|e| ConfigError::ParseError(format!("{}: invalid UTF-8: {}", path.display(), e)))?;

        let value: JsonValue = match Format::of(path) {
            Format::Json => serde_json::from_str(&contents).map_err(|e| {
                ConfigError::ParseError(format!("{}: JSON parse error: {}", path.display(), e))
            })?,
            Format::Toml => {
                let table: toml::Value = toml::from_str(&contents).map_err(|e| {
                    ConfigError::ParseError(format!("{}: TOML parse error: {}", path.display(), e))
                })?;
                toml_to_json(table)
            }
        };

        Ok((value, digest))
    }

    /// Serialize with provenance
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Convert TOML Value to JSON Value.
///
/// TOML datetimes become strings; datetime options parse them back.
pub fn toml_to_json(toml: toml::Value) -> JsonValue {
    match toml {
        toml::Value::String(s) => JsonValue::String(s),
        toml::Value::Integer(i) => JsonValue::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        toml::Value::Boolean(b) => JsonValue::Bool(b),
        toml::Value::Datetime(dt) => JsonValue::String(dt.to_string()),
        toml::Value::Array(arr) => JsonValue::Array(arr.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => JsonValue::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}
