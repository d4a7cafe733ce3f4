//! Configuration loading
//!
//! Builds containers from layered sources:
//! 1. Schema defaults
//! 2. Config files (TOML or JSON), in the order given
//! 3. Overrides (`key.path=value`)
//!
//! Schemas themselves can be declared in TOML schema files.

mod layers;
mod merge;
mod schema_file;

pub use layers::{toml_to_json, ConfigError, LayerOrigin, LayerSource, LayeredConfig};
pub use merge::{deep_merge, merge_layers, parse_override};
pub use schema_file::{
    OptionEntry, OptionType, SchemaEntry, SchemaFile, SchemaFileError, SchemaRegistry,
    SCHEMA_VERSION,
};
