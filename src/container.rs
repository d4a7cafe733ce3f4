//! Option containers
//!
//! An [`OptionContainer`] holds one value per option of its schema. Values
//! start at their defaults and change through [`OptionContainer::set`] and
//! [`OptionContainer::update`], which clean and validate before storing.
//! Containers stored inside other containers are read-only on their own;
//! they are modified through a key path on the root container.

use std::fmt;
use std::ops::Index;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;

use crate::error::{Error, InvalidOption, NOT_NESTED};
use crate::option::OptionDef;
use crate::schema::Schema;
use crate::value::Value;

static NULL: Value = Value::Null;

/// Path of keys into nested containers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPath(Vec<String>);

impl KeyPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Split `dad.child.host` into segments
    pub fn dotted(path: &str) -> Self {
        Self::new(path.split('.'))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl From<&str> for KeyPath {
    fn from(key: &str) -> Self {
        Self(vec![key.to_string()])
    }
}

impl From<String> for KeyPath {
    fn from(key: String) -> Self {
        Self(vec![key])
    }
}

impl From<&String> for KeyPath {
    fn from(key: &String) -> Self {
        Self(vec![key.clone()])
    }
}

impl From<Vec<String>> for KeyPath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl From<&[&str]> for KeyPath {
    fn from(segments: &[&str]) -> Self {
        Self::new(segments.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for KeyPath {
    fn from(segments: [&str; N]) -> Self {
        Self::new(segments)
    }
}

/// An instance of a [`Schema`]
#[derive(Debug, Clone)]
pub struct OptionContainer {
    schema: Arc<Schema>,
    values: IndexMap<String, Value>,
    nested: bool,
}

/// Mark containers stored as option values.
fn into_stored(value: Value) -> Value {
    match value {
        Value::Container(mut container) => {
            container.nested = true;
            Value::Container(container)
        }
        other => other,
    }
}

impl OptionContainer {
    /// Container of `schema` with every option at its default
    pub fn new(schema: &Arc<Schema>) -> Result<Self, InvalidOption> {
        schema.instantiate(std::iter::empty::<(String, Value)>())
    }

    pub(crate) fn from_validated(schema: Arc<Schema>, values: IndexMap<String, Value>) -> Self {
        let values = values
            .into_iter()
            .map(|(k, v)| (k, into_stored(v)))
            .collect();
        Self {
            schema,
            values,
            nested: false,
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn identifier(&self) -> &str {
        self.schema.identifier()
    }

    pub fn definitions(&self) -> &IndexMap<String, Arc<OptionDef>> {
        self.schema.defs()
    }

    pub fn typedef(&self) -> String {
        self.schema.typedef()
    }

    /// Whether this container is stored inside another one
    pub fn is_nested(&self) -> bool {
        self.nested
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Result<&Value, Error> {
        self.values
            .get(key)
            .ok_or_else(|| Error::KeyNotFound(key.to_string()))
    }

    /// Stored value, or `default` when the key is not defined
    pub fn get_or<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.values.get(key).unwrap_or(default)
    }

    /// Follow a key path through nested containers
    pub fn get_path(&self, path: impl Into<KeyPath>) -> Result<&Value, Error> {
        let path = path.into();
        let (last, parents) = path
            .segments()
            .split_last()
            .ok_or_else(|| Error::KeyNotFound(String::new()))?;

        let mut container = self;
        for key in parents {
            container = container
                .get(key)?
                .as_container()
                .ok_or_else(|| Error::KeyNotFound(path.to_string()))?;
        }
        container.get(last)
    }

    pub fn values(&self) -> &IndexMap<String, Value> {
        &self.values
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.values.iter()
    }

    /// Clean, validate and store a value at a key or key path.
    ///
    /// Fails with [`Error::NestedSet`] on containers nested in another; set
    /// through the root container's key path instead.
    pub fn set(&mut self, path: impl Into<KeyPath>, value: impl Into<Value>) -> Result<(), Error> {
        if self.nested {
            return Err(Error::NestedSet);
        }

        let path = path.into();
        tracing::debug!(container = %self.identifier(), path = %path, "Setting option");
        self.set_path(path.segments(), value.into())?;
        Ok(())
    }

    fn set_path(&mut self, path: &[String], value: Value) -> Result<(), InvalidOption> {
        let Some((key, rest)) = path.split_first() else {
            return Err(self.schema.invalid_key(""));
        };
        let def = self
            .schema
            .get_def(key)
            .cloned()
            .ok_or_else(|| self.schema.invalid_key(key))?;

        if rest.is_empty() {
            let cleaned = def.validate(Some(value))?;
            self.values.insert(key.clone(), into_stored(cleaned));
            return Ok(());
        }

        // any stored container, typed nested option or not
        if let Some(Value::Container(child)) = self.values.get_mut(key) {
            return child.set_path(rest, value).map_err(|e| e.prefixed(key));
        }
        Err(InvalidOption::new(NOT_NESTED)
            .with_param("key", key.as_str())
            .with_param("identifier", self.identifier()))
    }

    /// Set several options at once.
    ///
    /// Either every entry is stored or, on the first invalid entry, none is.
    pub fn update<I, K, V>(&mut self, entries: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        if self.nested {
            return Err(Error::NestedSet);
        }

        let mut staged = self.values.clone();
        for (key, value) in entries {
            let key = key.into();
            let def = self
                .schema
                .get_def(&key)
                .ok_or_else(|| self.schema.invalid_key(&key))?;
            let cleaned = def.validate(Some(value.into()))?;
            staged.insert(key, into_stored(cleaned));
        }

        tracing::debug!(container = %self.identifier(), "Updated options");
        self.values = staged;
        Ok(())
    }

    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write!(f, "<{}", self.schema.name())?;
        if let Some(label) = self.schema.label() {
            write!(f, " {}", label)?;
        }
        write!(f, ">:")?;

        let indent = "\t".repeat(depth + 1);
        for (key, value) in &self.values {
            write!(f, "\n{}{}: ", indent, key)?;
            match value {
                Value::Container(child) => child.write_indented(f, depth + 1)?,
                other => write!(f, "{}", other)?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for OptionContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

/// Same schema instance and equal values; nesting is not compared.
impl PartialEq for OptionContainer {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.schema, &other.schema) && self.values == other.values
    }
}

/// Missing keys yield `Value::Null`.
impl Index<&str> for OptionContainer {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        self.values.get(key).unwrap_or(&NULL)
    }
}

impl Serialize for OptionContainer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (key, value) in &self.values {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'a> IntoIterator for &'a OptionContainer {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
