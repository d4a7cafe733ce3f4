//! Error types
//!
//! [`InvalidOption`] carries a message template plus named format parameters
//! so callers can inspect what failed (`expected_type`, `min_value`, ...)
//! without parsing the rendered message. Parameters may be added after the
//! error is created, which is how option keys and nested key paths are
//! attached as the error travels up through containers.

use std::fmt;

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

pub(crate) const INVALID_KEY: &str = "Invalid key {key} for {identifier}";
pub(crate) const NOT_NESTED: &str = "Key {key} for {identifier} is not a nested container";
pub(crate) const NESTED: &str = "{key}:{inner}";
pub(crate) const NOT_SUBCLASS: &str =
    "Provided OptionContainer instance {value} is not a subclass {container_cls}";
pub(crate) const NESTED_SET: &str = "Calling set on nested option containers is not allowed, \
     please use set method of root container";

/// A placeholder in the template had no matching parameter
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing format parameter `{0}`")]
pub struct MissingParam(pub String);

/// An option key or value was rejected
#[derive(Debug, Clone, PartialEq)]
pub struct InvalidOption {
    template: String,
    params: IndexMap<String, JsonValue>,
}

impl InvalidOption {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            params: IndexMap::new(),
        }
    }

    /// Builder form of [`InvalidOption::add_param`]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.add_param(name, value);
        self
    }

    pub fn add_param(&mut self, name: impl Into<String>, value: impl Into<JsonValue>) {
        self.params.insert(name.into(), value.into());
    }

    pub fn add_params<I, K, V>(&mut self, params: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<JsonValue>,
    {
        for (name, value) in params {
            self.add_param(name, value);
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn format_params(&self) -> &IndexMap<String, JsonValue> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&JsonValue> {
        self.params.get(name)
    }

    /// The option key (or `a:b` key path) this error was raised for
    pub fn key(&self) -> Option<&str> {
        self.param("key").and_then(JsonValue::as_str)
    }

    /// The rendered inner message of a nested error
    pub fn inner(&self) -> Option<&str> {
        self.param("inner").and_then(JsonValue::as_str)
    }

    /// Whether this error wraps an error raised inside a nested container
    pub fn is_nested(&self) -> bool {
        self.template == NESTED
    }

    /// Wrap an error raised inside a nested container.
    ///
    /// The owning option (or container) adds the `key` parameter afterwards.
    pub fn nested(inner: &InvalidOption) -> Self {
        Self::new(NESTED).with_param("inner", inner.to_string())
    }

    /// Prefix the key path of this error with `key`.
    ///
    /// Nested errors extend their existing path (`child` becomes
    /// `dad:child`); plain errors get wrapped.
    pub(crate) fn prefixed(self, key: &str) -> Self {
        if self.is_nested() {
            if let Some(inner_key) = self.key() {
                let path = format!("{}:{}", key, inner_key);
                return self.with_param("key", path);
            }
        }
        Self::nested(&self).with_param("key", key)
    }

    /// Substitute `{name}` placeholders with parameter values.
    ///
    /// Without parameters the template is returned untouched. `{{` and `}}`
    /// render as literal braces.
    pub fn render(&self) -> Result<String, MissingParam> {
        if self.params.is_empty() {
            return Ok(self.template.clone());
        }

        let mut out = String::with_capacity(self.template.len());
        let mut chars = self.template.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    out.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    out.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    for n in chars.by_ref() {
                        if n == '}' {
                            break;
                        }
                        name.push(n);
                    }
                    let value = self
                        .params
                        .get(&name)
                        .ok_or_else(|| MissingParam(name.clone()))?;
                    out.push_str(&render_param(value));
                }
                other => out.push(other),
            }
        }
        Ok(out)
    }
}

/// Strings render bare, sequences as tuples with quoted strings.
pub(crate) fn render_param(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Array(items) => {
            let rendered: Vec<String> = items
                .iter()
                .map(|item| match item {
                    JsonValue::String(s) => format!("'{}'", s),
                    other => render_param(other),
                })
                .collect();
            format!("({})", rendered.join(", "))
        }
        other => other.to_string(),
    }
}

impl fmt::Display for InvalidOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.render() {
            Ok(message) => write!(f, "{}", message),
            Err(_) => write!(f, "{}", self.template),
        }
    }
}

impl std::error::Error for InvalidOption {}

/// Container operation errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    InvalidOption(#[from] InvalidOption),

    #[error("Key {0} not found")]
    KeyNotFound(String),

    #[error("{}", NESTED_SET)]
    NestedSet,
}

impl Error {
    /// The underlying [`InvalidOption`], if this is one
    pub fn as_invalid_option(&self) -> Option<&InvalidOption> {
        match self {
            Error::InvalidOption(e) => Some(e),
            _ => None,
        }
    }
}
