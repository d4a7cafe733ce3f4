//! Option cleaners
//!
//! Cleaners transform a raw value before validation: parsing datetimes,
//! building nested containers from maps, widening integers. A cleaner that
//! cannot make sense of its input passes it through unchanged and leaves the
//! rejection to the type validator.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDateTime};

use crate::container::OptionContainer;
use crate::error::{InvalidOption, NOT_SUBCLASS};
use crate::schema::Schema;
use crate::value::Value;

/// A transformation applied to an option value before validation
pub trait Cleaner: fmt::Debug + Send + Sync {
    fn clean(&self, value: Value) -> Result<Value, InvalidOption>;

    fn as_any(&self) -> &dyn Any;
}

impl dyn Cleaner {
    /// Downcast to a concrete cleaner type
    pub fn downcast_ref<T: Cleaner + 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn is<T: Cleaner + 'static>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

/// Parse ISO 8601 strings into timezone-aware datetimes.
///
/// Accepts `T` or a space between date and time, offsets as `Z`, `+HH:MM`
/// or `+HHMM` with optional whitespace before them, and fractional seconds.
/// Strings without an offset are taken as UTC. Null and datetimes pass
/// through, as does anything unparsable.
pub fn clean_datetime(value: Value) -> Value {
    match value {
        Value::String(s) => match parse_datetime(&s) {
            Some(dt) => Value::DateTime(dt),
            None => Value::String(s),
        },
        other => other,
    }
}

fn parse_datetime(raw: &str) -> Option<DateTime<FixedOffset>> {
    let mut s = raw.trim().to_string();
    if s.len() > 10 && s.is_char_boundary(10) && s.is_char_boundary(11) && &s[10..11] == " " {
        s.replace_range(10..11, "T");
    }

    let (body, offset) = split_offset(&s)?;
    let body = body.trim_end();
    match offset {
        Some(offset) => DateTime::parse_from_rfc3339(&format!("{}{}", body, offset)).ok(),
        None => NaiveDateTime::parse_from_str(body, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc().fixed_offset()),
    }
}

/// Split off a trailing UTC offset, normalized to `+HH:MM`.
///
/// Returns `None` when an offset is present but malformed.
fn split_offset(s: &str) -> Option<(&str, Option<String>)> {
    if let Some(body) = s.strip_suffix('Z').or_else(|| s.strip_suffix('z')) {
        return Some((body, Some("+00:00".to_string())));
    }

    // Date part contains '-', so only look past it.
    let Some(time) = s.get(11..) else {
        return Some((s, None));
    };
    let Some(pos) = time.rfind(|c: char| c == '+' || c == '-') else {
        return Some((s, None));
    };
    let pos = pos + 11;

    let offset = s[pos..].trim();
    let (sign, digits) = offset.split_at(1);
    let digits = digits.replace(':', "");
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let normalized = match digits.len() {
        2 => format!("{}{}:00", sign, digits),
        4 => format!("{}{}:{}", sign, &digits[..2], &digits[2..]),
        _ => return None,
    };
    Some((&s[..pos], Some(normalized)))
}

/// [`clean_datetime`] as a [`Cleaner`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeCleaner;

impl Cleaner for DateTimeCleaner {
    fn clean(&self, value: Value) -> Result<Value, InvalidOption> {
        Ok(clean_datetime(value))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Widen integers to floats
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatCleaner;

impl Cleaner for FloatCleaner {
    fn clean(&self, value: Value) -> Result<Value, InvalidOption> {
        Ok(match value {
            Value::Integer(i) => Value::Float(i as f64),
            other => other,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Build or check a nested container of a given schema
#[derive(Debug, Clone)]
pub struct ContainerCleaner {
    schema: Arc<Schema>,
}

/// Cleaner producing containers of `schema`.
///
/// Null yields a container with all defaults, a map yields a container built
/// from its entries, and a container is accepted when its schema is `schema`
/// or extends it. Failures are wrapped as `{key}:{inner}`; the owning option
/// supplies the key.
pub fn clean_option_container(schema: &Arc<Schema>) -> ContainerCleaner {
    ContainerCleaner {
        schema: Arc::clone(schema),
    }
}

impl ContainerCleaner {
    pub fn container_cls(&self) -> &Arc<Schema> {
        &self.schema
    }
}

impl Cleaner for ContainerCleaner {
    fn clean(&self, value: Value) -> Result<Value, InvalidOption> {
        match value {
            Value::Null => OptionContainer::new(&self.schema)
                .map(Value::from)
                .map_err(|e| InvalidOption::nested(&e)),
            Value::Map(map) => self
                .schema
                .instantiate(map)
                .map(Value::from)
                .map_err(|e| InvalidOption::nested(&e)),
            Value::Container(container) => {
                if container.schema().is_subclass_of(&self.schema) {
                    Ok(Value::Container(container))
                } else {
                    let e = InvalidOption::new(NOT_SUBCLASS)
                        .with_param("value", container.to_string())
                        .with_param("container_cls", self.schema.name());
                    Err(InvalidOption::nested(&e))
                }
            }
            other => Ok(other),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

type CleanFn = dyn Fn(Value) -> Value + Send + Sync;

/// Closure cleaner
#[derive(Clone)]
pub struct FnCleaner {
    label: String,
    f: Arc<CleanFn>,
}

impl FnCleaner {
    pub fn new<F>(label: impl Into<String>, f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            f: Arc::new(f),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Cleaner for FnCleaner {
    fn clean(&self, value: Value) -> Result<Value, InvalidOption> {
        Ok((self.f)(value))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for FnCleaner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCleaner").field("label", &self.label).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn parsed(s: &str) -> DateTime<FixedOffset> {
        match clean_datetime(Value::from(s)) {
            Value::DateTime(dt) => dt,
            other => panic!("{:?} did not parse: {:?}", s, other),
        }
    }

    #[test]
    fn test_clean_datetime_utc_forms() {
        let expected = Utc.with_ymd_and_hms(2016, 5, 9, 16, 0, 0).unwrap();

        for input in [
            "2016-05-09 16:00:00 +00:00",
            "2016-05-09 16:00:00+00:00",
            "2016-05-09T16:00:00+00:00",
            "2016-05-09T16:00:00 +00:00",
            "2016-05-09T16:00:00 +0000",
            "2016-05-09T16:00:00 Z",
            "2016-05-09T16:00:00Z",
        ] {
            assert_eq!(parsed(input), expected, "{}", input);
        }
    }

    #[test]
    fn test_clean_datetime_with_offset() {
        let tallinn = FixedOffset::east_opt(3 * 3600).unwrap();
        let expected = tallinn.with_ymd_and_hms(2016, 5, 9, 16, 0, 0).unwrap();

        for input in [
            "2016-05-09 16:00:00 +03:00",
            "2016-05-09 16:00:00+03:00",
            "2016-05-09T16:00:00+03:00",
            "2016-05-09T16:00:00 +03:00",
        ] {
            let dt = parsed(input);
            assert_eq!(dt, expected, "{}", input);
            assert_eq!(dt.offset(), &tallinn);
        }
    }

    #[test]
    fn test_clean_datetime_negative_offset_and_fraction() {
        let dt = parsed("2016-05-09T16:00:00.250-05:00");
        assert_eq!(dt.offset().local_minus_utc(), -5 * 3600);
        assert_eq!(dt.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_clean_datetime_naive_is_utc() {
        let dt = parsed("2016-05-09 16:00:00");
        assert_eq!(dt, Utc.with_ymd_and_hms(2016, 5, 9, 16, 0, 0).unwrap());
    }

    #[test]
    fn test_clean_datetime_passthrough() {
        assert_eq!(clean_datetime(Value::Null), Value::Null);
        assert_eq!(clean_datetime(Value::from("not a date")), Value::from("not a date"));
        assert_eq!(clean_datetime(Value::from(5)), Value::from(5));

        let dt = parsed("2016-05-09T16:00:00Z");
        assert_eq!(clean_datetime(Value::from(dt)), Value::from(dt));
    }

    #[test]
    fn test_float_cleaner() {
        assert_eq!(FloatCleaner.clean(Value::from(2)).unwrap(), Value::from(2.0));
        assert_eq!(FloatCleaner.clean(Value::from("x")).unwrap(), Value::from("x"));
    }
}
