//! Typed, validated option containers
//!
//! A [`Schema`] declares named options with defaults, cleaners and
//! validators. An [`OptionContainer`] is an instance of a schema holding one
//! value per option. Schemas extend a parent schema, and options can hold
//! nested containers that are updated through key paths on the root.
//!
//! ```
//! use tg_option_container::{OptionContainer, OptionDef, Schema, Value};
//!
//! let schema = Schema::builder("Client")
//!     .option(OptionDef::integer("timeout", 30))
//!     .option(OptionDef::integer("retries", 3).min_value(0))
//!     .build();
//!
//! let mut client = OptionContainer::new(&schema).unwrap();
//! client.set("retries", 5).unwrap();
//! assert_eq!(client["retries"], Value::from(5));
//! assert!(client.set("retries", -1).is_err());
//! ```

pub mod cleaners;
pub mod config;
pub mod container;
pub mod error;
pub mod option;
pub mod schema;
pub mod validators;
pub mod value;

pub use cleaners::{clean_datetime, clean_option_container, Cleaner};
pub use container::{KeyPath, OptionContainer};
pub use error::{Error, InvalidOption};
pub use option::OptionDef;
pub use schema::{Schema, SchemaBuilder};
pub use validators::{
    ChoicesValidator, MaxValueValidator, MinValueValidator, PatternValidator, TypeValidator,
    Validator,
};
pub use value::{Value, ValueKind};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
