//! # Type Casting — Built-in Casters
//!
//! A [`Caster`] coerces a raw JSON value into the canonical representation
//! of one semantic type. Attribute writes run every value through the
//! attribute's caster exactly once; the stored value is always the output.
//!
//! ## Invariants
//!
//! - Every caster maps `null` to `null`.
//! - Every caster is idempotent on its own output: `cast(cast(v)) == cast(v)`.
//!   Copy-with-overlay relies on this to reproduce an equal record.
//! - Failures are reported as [`CastError`] and never swallowed.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use uuid::Uuid;

use crate::error::{CastError, TypeLookupError};

/// Coerces raw values into one semantic type.
pub trait Caster: Send + Sync + fmt::Debug {
    /// The registered name of the type this caster produces.
    fn type_name(&self) -> &str;

    /// Cast a raw value into the type's canonical representation.
    fn cast(&self, value: Value) -> Result<Value, CastError>;
}

/// Options forwarded from an attribute declaration to the type lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CastOptions(BTreeMap<String, Value>);

impl CastOptions {
    /// An empty option set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an option, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Whether no options were given.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate option keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Read an option as a non-negative integer.
    pub fn get_u32(&self, type_name: &str, key: &str) -> Result<Option<u32>, TypeLookupError> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| TypeLookupError::InvalidOption {
                    type_name: type_name.to_string(),
                    option: key.to_string(),
                    reason: format!("expected a non-negative integer, got {value}"),
                }),
        }
    }

    /// Reject any option not listed in `allowed`.
    pub fn ensure_only(&self, type_name: &str, allowed: &[&str]) -> Result<(), TypeLookupError> {
        match self.keys().find(|key| !allowed.contains(key)) {
            Some(key) => Err(TypeLookupError::InvalidOption {
                type_name: type_name.to_string(),
                option: key.to_string(),
                reason: "option not supported".to_string(),
            }),
            None => Ok(()),
        }
    }
}

// ─── Strings ─────────────────────────────────────────────────────────

/// `string`: scalars are stringified; containers are rejected.
#[derive(Debug, Clone, Default)]
pub struct StringCaster {
    /// Maximum length in characters, if any.
    pub limit: Option<usize>,
}

impl Caster for StringCaster {
    fn type_name(&self) -> &str {
        "string"
    }

    fn cast(&self, value: Value) -> Result<Value, CastError> {
        let s = match value {
            Value::Null => return Ok(Value::Null),
            Value::String(s) => s,
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            other @ (Value::Array(_) | Value::Object(_)) => {
                return Err(CastError::incompatible(
                    "string",
                    &other,
                    "containers cannot be stringified",
                ))
            }
        };
        if let Some(limit) = self.limit {
            if s.chars().count() > limit {
                return Err(CastError::out_of_range("string", &Value::String(s)));
            }
        }
        Ok(Value::String(s))
    }
}

// ─── Numbers ─────────────────────────────────────────────────────────

/// Lower and upper bounds (exclusive upper) of `i64` as `f64`.
const I64_MIN_F: f64 = -9_223_372_036_854_775_808.0;
const I64_MAX_F: f64 = 9_223_372_036_854_775_808.0;

/// `integer`: 64-bit signed. Floats truncate toward zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerCaster;

impl IntegerCaster {
    fn from_float(f: f64, original: &Value) -> Result<Value, CastError> {
        if !f.is_finite() {
            return Err(CastError::incompatible("integer", original, "not a finite number"));
        }
        let t = f.trunc();
        if !(I64_MIN_F..I64_MAX_F).contains(&t) {
            return Err(CastError::out_of_range("integer", original));
        }
        Ok(Value::from(t as i64))
    }
}

impl Caster for IntegerCaster {
    fn type_name(&self) -> &str {
        "integer"
    }

    fn cast(&self, value: Value) -> Result<Value, CastError> {
        match &value {
            Value::Null => Ok(Value::Null),
            Value::Bool(b) => Ok(Value::from(i64::from(*b))),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::from(i))
                } else if n.is_u64() {
                    Err(CastError::out_of_range("integer", &value))
                } else {
                    let f = n.as_f64().unwrap_or(f64::NAN);
                    Self::from_float(f, &value)
                }
            }
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Ok(Value::Null);
                }
                if let Ok(i) = trimmed.parse::<i64>() {
                    return Ok(Value::from(i));
                }
                match trimmed.parse::<f64>() {
                    Ok(f) => Self::from_float(f, &value),
                    Err(_) => Err(CastError::incompatible("integer", &value, "not a number")),
                }
            }
            Value::Array(_) | Value::Object(_) => Err(CastError::incompatible(
                "integer",
                &value,
                "containers are not numbers",
            )),
        }
    }
}

/// `float`: 64-bit IEEE, optionally rounded to `precision` decimal places.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatCaster {
    /// Decimal places to keep, if any.
    pub precision: Option<u32>,
}

impl FloatCaster {
    fn finish(&self, f: f64, original: &Value) -> Result<Value, CastError> {
        let rounded = match self.precision {
            Some(p) => {
                let scale = 10f64.powi(p as i32);
                (f * scale).round() / scale
            }
            None => f,
        };
        Number::from_f64(rounded)
            .map(Value::Number)
            .ok_or_else(|| CastError::incompatible("float", original, "not a finite number"))
    }
}

impl Caster for FloatCaster {
    fn type_name(&self) -> &str {
        "float"
    }

    fn cast(&self, value: Value) -> Result<Value, CastError> {
        match &value {
            Value::Null => Ok(Value::Null),
            Value::Bool(b) => self.finish(if *b { 1.0 } else { 0.0 }, &value),
            Value::Number(n) => match n.as_f64() {
                Some(f) => self.finish(f, &value),
                None => Err(CastError::out_of_range("float", &value)),
            },
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Ok(Value::Null);
                }
                match trimmed.parse::<f64>() {
                    Ok(f) => self.finish(f, &value),
                    Err(_) => Err(CastError::incompatible("float", &value, "not a number")),
                }
            }
            Value::Array(_) | Value::Object(_) => Err(CastError::incompatible(
                "float",
                &value,
                "containers are not numbers",
            )),
        }
    }
}

// ─── Booleans ────────────────────────────────────────────────────────

/// Strings (compared case-insensitively) that cast to `false`.
const FALSE_STRINGS: &[&str] = &["0", "f", "false", "off", "n", "no"];

/// `boolean`: blank is null, a fixed set of spellings is false, anything
/// else is true.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanCaster;

impl Caster for BooleanCaster {
    fn type_name(&self) -> &str {
        "boolean"
    }

    fn cast(&self, value: Value) -> Result<Value, CastError> {
        let b = match &value {
            Value::Null => return Ok(Value::Null),
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Ok(Value::Null);
                }
                let lowered = trimmed.to_ascii_lowercase();
                !FALSE_STRINGS.contains(&lowered.as_str())
            }
            Value::Array(_) | Value::Object(_) => true,
        };
        Ok(Value::Bool(b))
    }
}

// ─── Temporal ────────────────────────────────────────────────────────

/// `date`: calendar date rendered as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateCaster;

impl Caster for DateCaster {
    fn type_name(&self) -> &str {
        "date"
    }

    fn cast(&self, value: Value) -> Result<Value, CastError> {
        let trimmed = match &value {
            Value::Null => return Ok(Value::Null),
            Value::String(s) => s.trim(),
            _ => return Err(CastError::incompatible("date", &value, "expected a date string")),
        };
        if trimmed.is_empty() {
            return Ok(Value::Null);
        }
        let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(trimmed).ok().map(|dt| dt.date_naive()))
            .ok_or_else(|| CastError::incompatible("date", &value, "expected YYYY-MM-DD"))?;
        Ok(Value::String(date.format("%Y-%m-%d").to_string()))
    }
}

/// `datetime`: instant normalized to UTC RFC 3339 with a `Z` suffix.
///
/// Sub-second digits beyond `precision` are truncated. Naive inputs are
/// taken as UTC; integers are Unix epoch seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeCaster {
    /// Fractional-second digits to keep (0..=9).
    pub precision: u32,
}

impl DateTimeCaster {
    fn parse(s: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            .map(|naive| naive.and_utc())
    }

    fn render(&self, dt: DateTime<Utc>) -> Value {
        let factor = 10u32.pow(9 - self.precision.min(9));
        let nanos = dt.nanosecond() % 1_000_000_000 / factor * factor;
        let truncated = dt.with_nanosecond(nanos).unwrap_or(dt);
        let format = match self.precision {
            0 => SecondsFormat::Secs,
            1..=3 => SecondsFormat::Millis,
            4..=6 => SecondsFormat::Micros,
            _ => SecondsFormat::Nanos,
        };
        Value::String(truncated.to_rfc3339_opts(format, true))
    }
}

impl Caster for DateTimeCaster {
    fn type_name(&self) -> &str {
        "datetime"
    }

    fn cast(&self, value: Value) -> Result<Value, CastError> {
        let parsed = match &value {
            Value::Null => return Ok(Value::Null),
            Value::String(s) if s.trim().is_empty() => return Ok(Value::Null),
            Value::String(s) => Self::parse(s.trim()),
            Value::Number(n) => n.as_i64().and_then(|secs| DateTime::from_timestamp(secs, 0)),
            _ => None,
        };
        parsed
            .map(|dt| self.render(dt))
            .ok_or_else(|| {
                CastError::incompatible("datetime", &value, "expected an RFC 3339 instant")
            })
    }
}

// ─── Identifiers and pass-through ───────────────────────────────────

/// `uuid`: hyphenated lowercase.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidCaster;

impl Caster for UuidCaster {
    fn type_name(&self) -> &str {
        "uuid"
    }

    fn cast(&self, value: Value) -> Result<Value, CastError> {
        match &value {
            Value::Null => Ok(Value::Null),
            Value::String(s) if s.trim().is_empty() => Ok(Value::Null),
            Value::String(s) => Uuid::parse_str(s.trim())
                .map(|id| Value::String(id.hyphenated().to_string()))
                .map_err(|e| CastError::incompatible("uuid", &value, e.to_string())),
            _ => Err(CastError::incompatible("uuid", &value, "expected a UUID string")),
        }
    }
}

/// `value`: stores input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueCaster;

impl Caster for ValueCaster {
    fn type_name(&self) -> &str {
        "value"
    }

    fn cast(&self, value: Value) -> Result<Value, CastError> {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_stringifies_scalars() {
        let c = StringCaster::default();
        assert_eq!(c.cast(json!(123)).unwrap(), json!("123"));
        assert_eq!(c.cast(json!(true)).unwrap(), json!("true"));
        assert_eq!(c.cast(Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn test_string_rejects_containers_and_long_values() {
        assert!(StringCaster::default().cast(json!([1])).is_err());
        let limited = StringCaster { limit: Some(3) };
        assert!(limited.cast(json!("abc")).is_ok());
        assert!(matches!(
            limited.cast(json!("abcd")),
            Err(CastError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_integer_coerces_strings() {
        let c = IntegerCaster;
        assert_eq!(c.cast(json!("123")).unwrap(), json!(123));
        assert_eq!(c.cast(json!(" 42 ")).unwrap(), json!(42));
        assert_eq!(c.cast(json!("12.9")).unwrap(), json!(12));
        assert_eq!(c.cast(json!("")).unwrap(), Value::Null);
        assert_eq!(c.cast(json!(true)).unwrap(), json!(1));
    }

    #[test]
    fn test_integer_rejects_garbage() {
        let err = IntegerCaster.cast(json!("12abc")).unwrap_err();
        assert!(matches!(err, CastError::Incompatible { .. }));
        assert!(IntegerCaster.cast(json!({"a": 1})).is_err());
        assert!(matches!(
            IntegerCaster.cast(json!(u64::MAX)),
            Err(CastError::OutOfRange { .. })
        ));
        assert!(matches!(
            IntegerCaster.cast(json!(1e300)),
            Err(CastError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_float_precision_rounds() {
        let c = FloatCaster { precision: Some(2) };
        assert_eq!(c.cast(json!("3.14159")).unwrap(), json!(3.14));
        assert_eq!(FloatCaster::default().cast(json!(2)).unwrap(), json!(2.0));
        assert!(FloatCaster::default().cast(json!("inf")).is_err());
    }

    #[test]
    fn test_boolean_spellings() {
        let c = BooleanCaster;
        for falsy in ["0", "f", "FALSE", "off", "No"] {
            assert_eq!(c.cast(json!(falsy)).unwrap(), json!(false), "{falsy}");
        }
        assert_eq!(c.cast(json!("yes")).unwrap(), json!(true));
        assert_eq!(c.cast(json!(0)).unwrap(), json!(false));
        assert_eq!(c.cast(json!(" ")).unwrap(), Value::Null);
    }

    #[test]
    fn test_date_normalizes() {
        assert_eq!(DateCaster.cast(json!("2024-02-29")).unwrap(), json!("2024-02-29"));
        assert_eq!(
            DateCaster.cast(json!("2024-02-29T23:00:00Z")).unwrap(),
            json!("2024-02-29")
        );
        assert!(DateCaster.cast(json!("2023-02-29")).is_err());
        assert!(DateCaster.cast(json!(20240229)).is_err());
    }

    #[test]
    fn test_datetime_normalizes_to_utc_seconds() {
        let c = DateTimeCaster::default();
        assert_eq!(
            c.cast(json!("2024-01-15T12:30:45.987+02:00")).unwrap(),
            json!("2024-01-15T10:30:45Z")
        );
        assert_eq!(
            c.cast(json!("2024-01-15 10:30:45")).unwrap(),
            json!("2024-01-15T10:30:45Z")
        );
        assert_eq!(c.cast(json!(0)).unwrap(), json!("1970-01-01T00:00:00Z"));
    }

    #[test]
    fn test_datetime_precision_keeps_fraction() {
        let c = DateTimeCaster { precision: 3 };
        assert_eq!(
            c.cast(json!("2024-01-15T10:30:45.123456Z")).unwrap(),
            json!("2024-01-15T10:30:45.123Z")
        );
    }

    #[test]
    fn test_uuid_normalizes_case() {
        let out = UuidCaster
            .cast(json!("67E55044-10B1-426F-9247-BB680E5FE0C8"))
            .unwrap();
        assert_eq!(out, json!("67e55044-10b1-426f-9247-bb680e5fe0c8"));
        assert!(UuidCaster.cast(json!("not-a-uuid")).is_err());
    }

    #[test]
    fn test_value_passes_through() {
        let v = json!({"nested": [1, 2]});
        assert_eq!(ValueCaster.cast(v.clone()).unwrap(), v);
    }

    #[test]
    fn test_options_reject_unknown_keys() {
        let opts = CastOptions::new().with("scale", 2);
        let err = opts.ensure_only("float", &["precision"]).unwrap_err();
        assert!(matches!(err, TypeLookupError::InvalidOption { .. }));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn casters() -> Vec<Box<dyn Caster>> {
        vec![
            Box::new(StringCaster::default()),
            Box::new(IntegerCaster),
            Box::new(FloatCaster { precision: Some(3) }),
            Box::new(BooleanCaster),
            Box::new(DateTimeCaster { precision: 6 }),
            Box::new(ValueCaster),
        ]
    }

    fn scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i32>().prop_map(|n| json_i(n.into())),
            (-1.0e6f64..1.0e6).prop_map(|f| serde_json::json!(f)),
            "[0-9]{1,6}".prop_map(Value::String),
            "[a-z ]{0,8}".prop_map(Value::String),
            Just(Value::String("2024-03-01T08:09:10.123456789+05:30".into())),
        ]
    }

    fn json_i(n: i64) -> Value {
        Value::from(n)
    }

    proptest! {
        /// Casting an already-cast value yields the same value.
        #[test]
        fn cast_is_idempotent(value in scalar()) {
            for caster in casters() {
                if let Ok(once) = caster.cast(value.clone()) {
                    let twice = caster.cast(once.clone());
                    prop_assert_eq!(
                        twice.as_ref().ok(),
                        Some(&once),
                        "caster {}",
                        caster.type_name()
                    );
                }
            }
        }

        /// Null always casts to null.
        #[test]
        fn null_is_preserved(_seed in any::<u8>()) {
            for caster in casters() {
                prop_assert_eq!(caster.cast(Value::Null).ok(), Some(Value::Null));
            }
        }
    }
}
