//! Container schemas
//!
//! A [`Schema`] is the type of an option container: a name, an optional
//! label, and an ordered set of option definitions. Schemas extend at most one
//! parent. The effective definitions start from the parent's in order; an own
//! option replaces the parent's definition of the same name in place and new
//! names are appended.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::container::OptionContainer;
use crate::error::{InvalidOption, INVALID_KEY};
use crate::option::OptionDef;
use crate::value::Value;

/// The type of an option container
#[derive(Debug)]
pub struct Schema {
    name: String,
    label: Option<String>,
    parent: Option<Arc<Schema>>,
    props: Vec<Arc<OptionDef>>,
    defs: IndexMap<String, Arc<OptionDef>>,
}

/// Builder for [`Schema`]
#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    label: Option<String>,
    parent: Option<Arc<Schema>>,
    props: Vec<OptionDef>,
}

impl SchemaBuilder {
    /// Label used as the container identifier instead of the schema name
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn extends(mut self, parent: &Arc<Schema>) -> Self {
        self.parent = Some(Arc::clone(parent));
        self
    }

    pub fn option(mut self, option: OptionDef) -> Self {
        self.props.push(option);
        self
    }

    pub fn options(mut self, options: impl IntoIterator<Item = OptionDef>) -> Self {
        self.props.extend(options);
        self
    }

    pub fn build(self) -> Arc<Schema> {
        let props: Vec<Arc<OptionDef>> = self.props.into_iter().map(Arc::new).collect();

        let mut defs = self
            .parent
            .as_ref()
            .map(|parent| parent.defs.clone())
            .unwrap_or_default();
        for prop in &props {
            // insert keeps the position of an existing key
            defs.insert(prop.name().to_string(), Arc::clone(prop));
        }

        let label = self
            .label
            .or_else(|| self.parent.as_ref().and_then(|p| p.label.clone()));

        tracing::debug!(schema = %self.name, options = defs.len(), "Built schema");

        Arc::new(Schema {
            name: self.name,
            label,
            parent: self.parent,
            props,
            defs,
        })
    }
}

impl Schema {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            label: None,
            parent: None,
            props: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Own or inherited label
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Label if set, otherwise the schema name
    pub fn identifier(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    pub fn parent(&self) -> Option<&Arc<Schema>> {
        self.parent.as_ref()
    }

    /// Options declared by this schema itself
    pub fn props(&self) -> &[Arc<OptionDef>] {
        &self.props
    }

    /// Effective options, including inherited ones
    pub fn defs(&self) -> &IndexMap<String, Arc<OptionDef>> {
        &self.defs
    }

    pub fn get_def(&self, key: &str) -> Option<&Arc<OptionDef>> {
        self.defs.get(key)
    }

    /// Whether this schema is `other` or extends it, directly or not
    pub fn is_subclass_of(&self, other: &Schema) -> bool {
        let mut current = Some(self);
        while let Some(schema) = current {
            if std::ptr::eq(schema, other) {
                return true;
            }
            current = schema.parent.as_deref();
        }
        false
    }

    /// Type description: the schema name followed by one line per option
    pub fn typedef(&self) -> String {
        let mut out = self.name.clone();
        for def in self.defs.values() {
            out.push_str("\n\t");
            out.push_str(&def.to_string());
        }
        out
    }

    pub(crate) fn invalid_key(&self, key: &str) -> InvalidOption {
        InvalidOption::new(INVALID_KEY)
            .with_param("key", key)
            .with_param("identifier", self.identifier())
    }

    /// Create a container from the given values.
    ///
    /// Every definition is validated, with its supplied value or as missing.
    /// Keys the schema does not define are rejected.
    pub fn instantiate<I, K, V>(self: &Arc<Self>, values: I) -> Result<OptionContainer, InvalidOption>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut supplied: IndexMap<String, Value> = values
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        if let Some(unknown) = supplied.keys().find(|k| !self.defs.contains_key(*k)) {
            return Err(self.invalid_key(unknown));
        }

        let mut validated = IndexMap::with_capacity(self.defs.len());
        for (name, def) in &self.defs {
            let value = def.validate(supplied.shift_remove(name))?;
            validated.insert(name.clone(), value);
        }

        tracing::debug!(schema = %self.name, "Instantiated container");
        Ok(OptionContainer::from_validated(Arc::clone(self), validated))
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.typedef())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Arc<Schema> {
        Schema::builder("A")
            .option(OptionDef::string("host", Value::Null))
            .option(OptionDef::string("user", Value::Null))
            .option(OptionDef::string("password", Value::Null))
            .build()
    }

    #[test]
    fn test_defs_follow_props() {
        let a = credentials();
        let names: Vec<&str> = a.defs().keys().map(String::as_str).collect();
        assert_eq!(names, ["host", "user", "password"]);
        for (def, prop) in a.defs().values().zip(a.props()) {
            assert!(Arc::ptr_eq(def, prop));
        }
    }

    #[test]
    fn test_override_keeps_position() {
        let a = credentials();
        let b = Schema::builder("B")
            .extends(&a)
            .option(OptionDef::string("user", "yolger"))
            .build();
        let c = Schema::builder("C")
            .extends(&b)
            .option(OptionDef::string("password", "pass"))
            .option(OptionDef::integer("port", 8080))
            .build();

        assert!(b.props().len() == 1);
        assert!(Arc::ptr_eq(&b.defs()["host"], &a.props()[0]));
        assert!(Arc::ptr_eq(&b.defs()["user"], &b.props()[0]));
        assert!(Arc::ptr_eq(&b.defs()["password"], &a.props()[2]));

        let names: Vec<&str> = c.defs().keys().map(String::as_str).collect();
        assert_eq!(names, ["host", "user", "password", "port"]);
        assert!(Arc::ptr_eq(&c.defs()["user"], &b.props()[0]));
        assert!(Arc::ptr_eq(&c.defs()["password"], &c.props()[0]));
        assert!(Arc::ptr_eq(&c.defs()["port"], &c.props()[1]));

        // parents are unaffected
        assert_eq!(a.defs()["user"].default_value(), &Value::Null);
    }

    #[test]
    fn test_identifier_and_label_inheritance() {
        let a = Schema::builder("A").build();
        let b = Schema::builder("B").label("luke").build();
        let c = Schema::builder("C").extends(&b).build();

        assert_eq!(a.identifier(), "A");
        assert_eq!(b.identifier(), "luke");
        assert_eq!(c.identifier(), "luke");
        assert_eq!(c.name(), "C");
    }

    #[test]
    fn test_subclass() {
        let a = credentials();
        let b = Schema::builder("B").extends(&a).build();
        let other = credentials();

        assert!(b.is_subclass_of(&a));
        assert!(a.is_subclass_of(&a));
        assert!(!a.is_subclass_of(&b));
        assert!(!b.is_subclass_of(&other));
    }

    #[test]
    fn test_typedef() {
        let a = Schema::builder("A")
            .option(OptionDef::string("host", Value::Null))
            .build();
        let b = Schema::builder("B").extends(&a).label("xyz").build();

        assert_eq!(a.to_string(), format!("A\n\t{}", a.props()[0]));
        assert_eq!(b.typedef(), format!("B\n\t{}", a.props()[0]));
        assert_eq!(a.typedef(), "A\n\thost: string = null");
    }

    #[test]
    fn test_instantiate_rejects_unknown_keys() {
        let err = credentials().instantiate([("nanny", 1)]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid key nanny for A");
    }
}
