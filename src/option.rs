//! Option definitions
//!
//! An [`OptionDef`] names one option of a schema, its default, and the
//! cleaners and validators a value goes through before it is stored.

use std::fmt;
use std::sync::Arc;

use crate::cleaners::{clean_option_container, Cleaner, DateTimeCleaner, FloatCleaner};
use crate::error::InvalidOption;
use crate::schema::Schema;
use crate::validators::{
    ChoicesValidator, MaxValueValidator, MinValueValidator, PatternValidator, TypeValidator,
    Validator,
};
use crate::value::{Value, ValueKind};

/// Hint appended to datetime type errors
pub const ISO_8601_HINT: &str = "Please use ISO_8601.";

/// Definition of a single named option
#[derive(Debug, Clone)]
pub struct OptionDef {
    name: String,
    default: Value,
    type_label: String,
    cleaners: Vec<Arc<dyn Cleaner>>,
    /// Runs after user cleaners (datetime parsing, nested containers)
    builtin_cleaner: Option<Arc<dyn Cleaner>>,
    validators: Vec<Arc<dyn Validator>>,
    none_to_default: bool,
    nested: Option<Arc<Schema>>,
}

impl OptionDef {
    /// Untyped option; any value kind is accepted
    pub fn new(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            default: default.into(),
            type_label: "any".to_string(),
            cleaners: Vec::new(),
            builtin_cleaner: None,
            validators: Vec::new(),
            none_to_default: false,
            nested: None,
        }
    }

    fn typed(name: impl Into<String>, default: impl Into<Value>, kind: ValueKind) -> Self {
        let mut option = Self::new(name, default).validator(TypeValidator::new(kind));
        option.type_label = kind.as_str().to_string();
        option
    }

    pub fn string(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self::typed(name, default, ValueKind::String)
    }

    pub fn integer(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self::typed(name, default, ValueKind::Integer)
    }

    /// Float option; integers are accepted and widened
    pub fn float(name: impl Into<String>, default: impl Into<Value>) -> Self {
        let mut option = Self::typed(name, default, ValueKind::Float);
        option.builtin_cleaner = Some(Arc::new(FloatCleaner));
        option
    }

    pub fn boolean(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self::typed(name, default, ValueKind::Bool)
    }

    pub fn list(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self::typed(name, default, ValueKind::List)
    }

    /// Datetime option; ISO 8601 strings are parsed after any user cleaners
    pub fn iso8601(name: impl Into<String>, default: impl Into<Value>) -> Self {
        let mut option = Self::new(name, default).validator(
            TypeValidator::new(ValueKind::DateTime).with_append(ISO_8601_HINT),
        );
        option.type_label = ValueKind::DateTime.as_str().to_string();
        option.builtin_cleaner = Some(Arc::new(DateTimeCleaner));
        option
    }

    /// Option holding a container of `schema`; defaults to one with all defaults
    pub fn nested(name: impl Into<String>, schema: &Arc<Schema>) -> Self {
        let mut option =
            Self::new(name, Value::Null).validator(TypeValidator::new(ValueKind::Container));
        option.type_label = schema.name().to_string();
        option.builtin_cleaner = Some(Arc::new(clean_option_container(schema)));
        option.nested = Some(Arc::clone(schema));
        option
    }

    pub fn cleaner(mut self, cleaner: impl Cleaner + 'static) -> Self {
        self.cleaners.push(Arc::new(cleaner));
        self
    }

    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    pub fn choices<I, V>(self, choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.validator(ChoicesValidator::new(choices))
    }

    pub fn expected_type(self, kind: ValueKind) -> Self {
        self.validator(TypeValidator::new(kind))
    }

    pub fn min_value(self, min_value: impl Into<Value>) -> Self {
        self.validator(MinValueValidator::new(min_value))
    }

    pub fn max_value(self, max_value: impl Into<Value>) -> Self {
        self.validator(MaxValueValidator::new(max_value))
    }

    pub fn pattern(self, pattern: &str) -> Result<Self, regex_lite::Error> {
        Ok(self.validator(PatternValidator::new(pattern)?))
    }

    /// Treat an explicit null like a missing value
    pub fn none_to_default(mut self, enabled: bool) -> Self {
        self.none_to_default = enabled;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }

    pub fn type_label(&self) -> &str {
        &self.type_label
    }

    /// Cleaners in execution order
    pub fn cleaners(&self) -> Vec<Arc<dyn Cleaner>> {
        self.cleaners
            .iter()
            .chain(self.builtin_cleaner.iter())
            .cloned()
            .collect()
    }

    pub fn validators(&self) -> &[Arc<dyn Validator>] {
        &self.validators
    }

    pub fn is_none_to_default(&self) -> bool {
        self.none_to_default
    }

    /// Schema of the nested container, for nested options
    pub fn nested_schema(&self) -> Option<&Arc<Schema>> {
        self.nested.as_ref()
    }

    /// Clean and validate a value for this option.
    ///
    /// `None` stands for "not provided" and resolves to the default, as does
    /// an explicit null when `none_to_default` is set. Validators are skipped
    /// for null values. Errors carry this option's name as `key` unless a
    /// key is already present.
    pub fn validate(&self, value: Option<Value>) -> Result<Value, InvalidOption> {
        let mut value = match value {
            None => self.default.clone(),
            Some(Value::Null) if self.none_to_default => self.default.clone(),
            Some(v) => v,
        };

        for cleaner in self.cleaners.iter().chain(self.builtin_cleaner.iter()) {
            value = cleaner.clean(value).map_err(|e| self.keyed(e))?;
        }

        if !value.is_null() {
            for validator in &self.validators {
                validator.validate(&value).map_err(|e| self.keyed(e))?;
            }
        }

        Ok(value)
    }

    fn keyed(&self, mut e: InvalidOption) -> InvalidOption {
        if e.param("key").is_none() {
            e.add_param("key", self.name.as_str());
        }
        e
    }
}

impl fmt::Display for OptionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.type_label)?;
        if self.nested.is_none() {
            write!(f, " = {}", self.default)?;
        }
        Ok(())
    }
}
