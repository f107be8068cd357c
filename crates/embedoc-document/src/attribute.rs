//! # Attribute Descriptors
//!
//! An attribute descriptor is the immutable triple `(name, caster, default)`
//! registered on a document class. Classes copy their parent's descriptors
//! when they are created; nothing is shared by reference between classes.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use embedoc_core::Caster;

use crate::document::Document;
use crate::error::DocumentError;

/// A default computed from the document it is read on.
pub type ComputedDefault = Arc<dyn Fn(&Document) -> Result<Value, DocumentError> + Send + Sync>;

/// How an attribute's value is produced when nothing is stored for it.
#[derive(Clone, Default)]
pub enum AttributeDefault {
    /// No default; reads return `null`.
    #[default]
    None,
    /// A literal value.
    Value(Value),
    /// A zero-argument computation evaluated against the document.
    ///
    /// Not guarded against recursion: a computation that reads its own
    /// attribute overflows the stack.
    Computed(ComputedDefault),
    /// The value of another attribute or named method on the same document.
    Delegate(String),
}

impl AttributeDefault {
    /// A literal default.
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    /// A default computed from the document.
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&Document) -> Result<Value, DocumentError> + Send + Sync + 'static,
    {
        Self::Computed(Arc::new(f))
    }

    /// A default delegated to another attribute or method by name.
    pub fn delegate(target: impl Into<String>) -> Self {
        Self::Delegate(target.into())
    }
}

impl From<Value> for AttributeDefault {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl fmt::Debug for AttributeDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
            Self::Delegate(target) => f.debug_tuple("Delegate").field(target).finish(),
        }
    }
}

/// Immutable description of one attribute.
#[derive(Clone)]
pub struct AttributeDescriptor {
    name: String,
    caster: Arc<dyn Caster>,
    default: AttributeDefault,
}

impl AttributeDescriptor {
    /// Describe attribute `name` cast by `caster` with `default`.
    pub fn new(
        name: impl Into<String>,
        caster: Arc<dyn Caster>,
        default: AttributeDefault,
    ) -> Self {
        Self {
            name: name.into(),
            caster,
            default,
        }
    }

    /// The attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The registered name of the attribute's type.
    pub fn type_name(&self) -> &str {
        self.caster.type_name()
    }

    /// The attribute's caster.
    pub fn caster(&self) -> &Arc<dyn Caster> {
        &self.caster
    }

    /// The default policy.
    pub fn default(&self) -> &AttributeDefault {
        &self.default
    }

    /// Cast `value` through the attribute's type.
    pub fn cast(&self, value: Value) -> Result<Value, DocumentError> {
        Ok(self.caster.cast(value)?)
    }
}

impl fmt::Debug for AttributeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeDescriptor")
            .field("name", &self.name)
            .field("type", &self.type_name())
            .field("default", &self.default)
            .finish()
    }
}
