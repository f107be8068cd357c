//! # Error Types — Casting and Type Lookup
//!
//! Errors raised by the type-cast layer. Casting failures surface to the
//! caller unchanged: downstream crates carry `CastError` through
//! `#[error(transparent)]` variants rather than re-wrapping it.

use thiserror::Error;

/// A raw value could not be coerced into a semantic type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CastError {
    /// The value's shape cannot represent the target type.
    #[error("cannot cast {value} to {type_name}: {reason}")]
    Incompatible {
        /// Name of the target type (e.g., `"integer"`).
        type_name: String,
        /// Rendering of the offending value.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// The value parsed but falls outside the type's representable range.
    #[error("value {value} is out of range for {type_name}")]
    OutOfRange {
        /// Name of the target type.
        type_name: String,
        /// Rendering of the offending value.
        value: String,
    },
}

impl CastError {
    /// Build an `Incompatible` error for `value`.
    pub fn incompatible(
        type_name: &str,
        value: &serde_json::Value,
        reason: impl Into<String>,
    ) -> Self {
        Self::Incompatible {
            type_name: type_name.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Build an `OutOfRange` error for `value`.
    pub fn out_of_range(type_name: &str, value: &serde_json::Value) -> Self {
        Self::OutOfRange {
            type_name: type_name.to_string(),
            value: value.to_string(),
        }
    }
}

/// A type name or its options could not be resolved to a caster.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeLookupError {
    /// No caster is registered under this name.
    #[error("unknown attribute type: {0}")]
    UnknownType(String),

    /// An option forwarded to the lookup is not accepted by the type.
    #[error("invalid option '{option}' for type {type_name}: {reason}")]
    InvalidOption {
        /// The type being looked up.
        type_name: String,
        /// The rejected option key.
        option: String,
        /// Why the option was rejected.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cast_error_display_includes_type_and_value() {
        let err = CastError::incompatible("integer", &json!("abc"), "not a number");
        let msg = err.to_string();
        assert!(msg.contains("integer"));
        assert!(msg.contains("\"abc\""));
        assert!(msg.contains("not a number"));
    }

    #[test]
    fn test_lookup_error_display() {
        let err = TypeLookupError::UnknownType("money".into());
        assert_eq!(err.to_string(), "unknown attribute type: money");
    }
}
