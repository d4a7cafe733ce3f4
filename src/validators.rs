//! Option validators
//!
//! Validators run after cleaning and reject a value by returning an
//! [`InvalidOption`] whose parameters describe the failure. Messages mention
//! `{key}`; the option running the validator fills it in.

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::error::{render_param, InvalidOption};
use crate::value::{Value, ValueKind};

const TYPE_MISMATCH: &str = "{prepend}Expected type {expected_type} for option `{key}`, \
     provided type is {value_type}.{append}";
const BELOW_MIN: &str = "Value {value} for option `{key}` is smaller than {min_value}";
const ABOVE_MAX: &str = "Value {value} for option `{key}` is larger than {max_value}";
const NOT_COMPARABLE: &str = "Value {value} for option `{key}` cannot be compared with {bound}";
const NOT_A_CHOICE: &str = "Value {value} for option `{key}` is not one of {choices}";
const NO_MATCH: &str = "Value {value} for option `{key}` does not match pattern {pattern}";
const REJECTED: &str = "Invalid value {value} for option `{key}`";

/// A check applied to a cleaned, non-null option value
pub trait Validator: fmt::Display + fmt::Debug + Send + Sync {
    fn validate(&self, value: &Value) -> Result<(), InvalidOption>;

    fn as_any(&self) -> &dyn Any;
}

impl dyn Validator {
    /// Downcast to a concrete validator type
    pub fn downcast_ref<T: Validator + 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn is<T: Validator + 'static>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

fn tuple(values: &[Value]) -> String {
    render_param(&JsonValue::Array(values.iter().map(Value::to_json).collect()))
}

/// Value must be one of the expected kinds
#[derive(Debug, Clone)]
pub struct TypeValidator {
    expected: Vec<ValueKind>,
    prepend: String,
    append: String,
}

impl TypeValidator {
    pub fn new(kind: ValueKind) -> Self {
        Self::any_of([kind])
    }

    pub fn any_of(kinds: impl IntoIterator<Item = ValueKind>) -> Self {
        Self {
            expected: kinds.into_iter().collect(),
            prepend: String::new(),
            append: String::new(),
        }
    }

    /// Text placed before the message
    pub fn with_prepend(mut self, prepend: impl Into<String>) -> Self {
        self.prepend = prepend.into();
        self
    }

    /// Text placed after the message, typically a hint
    pub fn with_append(mut self, append: impl Into<String>) -> Self {
        self.append = append.into();
        self
    }

    pub fn expected_type(&self) -> &[ValueKind] {
        &self.expected
    }

    pub fn prepend(&self) -> &str {
        &self.prepend
    }

    pub fn append(&self) -> &str {
        &self.append
    }

    fn expected_param(&self) -> JsonValue {
        match self.expected.as_slice() {
            [single] => JsonValue::from(single.as_str()),
            many => JsonValue::Array(many.iter().map(|k| JsonValue::from(k.as_str())).collect()),
        }
    }
}

impl Validator for TypeValidator {
    fn validate(&self, value: &Value) -> Result<(), InvalidOption> {
        if self.expected.contains(&value.kind()) {
            return Ok(());
        }

        let prepend = if self.prepend.is_empty() {
            String::new()
        } else {
            format!("{} ", self.prepend)
        };
        let append = if self.append.is_empty() {
            String::new()
        } else {
            format!(" {}", self.append)
        };

        Err(InvalidOption::new(TYPE_MISMATCH)
            .with_param("value_type", value.kind().as_str())
            .with_param("expected_type", self.expected_param())
            .with_param("prepend", prepend)
            .with_param("append", append))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Display for TypeValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<TypeValidator expected_type={}", render_param(&self.expected_param()))?;
        if !self.prepend.is_empty() {
            write!(f, " prepend={}", self.prepend)?;
        }
        if !self.append.is_empty() {
            write!(f, " append={}", self.append)?;
        }
        write!(f, ">")
    }
}

fn check_bound(
    value: &Value,
    bound: &Value,
    rejected: Ordering,
    template: &str,
    param: &str,
) -> Result<(), InvalidOption> {
    match value.compare(bound) {
        Some(ordering) if ordering == rejected => Err(InvalidOption::new(template)
            .with_param("value", value.to_json())
            .with_param(param, bound.to_json())),
        Some(_) => Ok(()),
        None => Err(InvalidOption::new(NOT_COMPARABLE)
            .with_param("value", value.to_json())
            .with_param("bound", bound.to_json())
            .with_param(param, bound.to_json())),
    }
}

/// Value must be greater than or equal to `min_value`
#[derive(Debug, Clone)]
pub struct MinValueValidator {
    min_value: Value,
}

impl MinValueValidator {
    pub fn new(min_value: impl Into<Value>) -> Self {
        Self {
            min_value: min_value.into(),
        }
    }

    pub fn min_value(&self) -> &Value {
        &self.min_value
    }
}

impl Validator for MinValueValidator {
    fn validate(&self, value: &Value) -> Result<(), InvalidOption> {
        check_bound(value, &self.min_value, Ordering::Less, BELOW_MIN, "min_value")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Display for MinValueValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<MinValueValidator min_value={}>", self.min_value)
    }
}

/// Value must be less than or equal to `max_value`
#[derive(Debug, Clone)]
pub struct MaxValueValidator {
    max_value: Value,
}

impl MaxValueValidator {
    pub fn new(max_value: impl Into<Value>) -> Self {
        Self {
            max_value: max_value.into(),
        }
    }

    pub fn max_value(&self) -> &Value {
        &self.max_value
    }
}

impl Validator for MaxValueValidator {
    fn validate(&self, value: &Value) -> Result<(), InvalidOption> {
        check_bound(value, &self.max_value, Ordering::Greater, ABOVE_MAX, "max_value")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Display for MaxValueValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<MaxValueValidator max_value={}>", self.max_value)
    }
}

/// Value must equal one of the choices; integers and floats compare by value
#[derive(Debug, Clone)]
pub struct ChoicesValidator {
    choices: Vec<Value>,
}

impl ChoicesValidator {
    pub fn new<I, V>(choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            choices: choices.into_iter().map(Into::into).collect(),
        }
    }

    pub fn choices(&self) -> &[Value] {
        &self.choices
    }
}

impl Validator for ChoicesValidator {
    fn validate(&self, value: &Value) -> Result<(), InvalidOption> {
        let matches = |choice: &Value| match value.compare(choice) {
            Some(ordering) => ordering == Ordering::Equal,
            None => choice == value,
        };
        if self.choices.iter().any(matches) {
            return Ok(());
        }
        Err(InvalidOption::new(NOT_A_CHOICE)
            .with_param("value", value.to_json())
            .with_param(
                "choices",
                JsonValue::Array(self.choices.iter().map(Value::to_json).collect()),
            ))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Display for ChoicesValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<ChoicesValidator choices={}>", tuple(&self.choices))
    }
}

/// String value must match a regular expression in full
#[derive(Debug, Clone)]
pub struct PatternValidator {
    pattern: String,
    regex: regex_lite::Regex,
}

impl PatternValidator {
    pub fn new(pattern: &str) -> Result<Self, regex_lite::Error> {
        let regex = regex_lite::Regex::new(&format!("^(?:{})$", pattern))?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl Validator for PatternValidator {
    fn validate(&self, value: &Value) -> Result<(), InvalidOption> {
        match value.as_str() {
            Some(s) if self.regex.is_match(s) => Ok(()),
            _ => Err(InvalidOption::new(NO_MATCH)
                .with_param("value", value.to_json())
                .with_param("pattern", self.pattern.as_str())),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Display for PatternValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<PatternValidator pattern={}>", self.pattern)
    }
}

type Predicate = dyn Fn(&Value) -> bool + Send + Sync;

/// Closure validator; `false` rejects the value
#[derive(Clone)]
pub struct FnValidator {
    label: String,
    predicate: Arc<Predicate>,
}

impl FnValidator {
    pub fn new<F>(label: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            predicate: Arc::new(predicate),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Validator for FnValidator {
    fn validate(&self, value: &Value) -> Result<(), InvalidOption> {
        if (self.predicate)(value) {
            Ok(())
        } else {
            Err(InvalidOption::new(REJECTED)
                .with_param("value", value.to_json())
                .with_param("validator", self.label.as_str()))
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for FnValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnValidator").field("label", &self.label).finish()
    }
}

impl fmt::Display for FnValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<FnValidator {}>", self.label)
    }
}
