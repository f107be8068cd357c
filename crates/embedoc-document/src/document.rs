//! # Document Records
//!
//! A [`Document`] holds already-cast attribute values for one
//! [`DocumentClass`] in a raw key-to-value map.
//!
//! ## Two entry points
//!
//! - [`Document::new`] trusts its input: values are stored as given, without
//!   casting. It is the path used when materializing documents from a host's
//!   raw field, where values were cast when they were written.
//! - [`Document::build`], [`Document::write_attribute`] and
//!   [`Document::set_attributes`] cast every value through the attribute's
//!   type before storing it.
//!
//! Keeping the two apart avoids double-casting trusted data and avoids
//! storing uncast input from assignment.
//!
//! ## Readonly
//!
//! A readonly document rejects writes with [`DocumentError::Readonly`]. The
//! check runs after the attribute lookup and before casting. Once readonly,
//! a document never changes and may be shared freely.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::Value;

use embedoc_core::{kind_name, Errors, RawAttributes};

use crate::attribute::AttributeDefault;
use crate::class::DocumentClass;
use crate::error::DocumentError;

/// An instance of a document class.
#[derive(Debug, Clone)]
pub struct Document {
    class: Arc<DocumentClass>,
    attributes: RawAttributes,
    readonly: bool,
}

impl Document {
    /// Build a document from a raw map, storing values as given.
    ///
    /// # Errors
    ///
    /// `UnknownAttribute` if a key is not registered on `class`.
    pub fn new(
        class: Arc<DocumentClass>,
        attributes: RawAttributes,
    ) -> Result<Self, DocumentError> {
        if let Some(unknown) = attributes.keys().find(|key| !class.has_attribute(key)) {
            return Err(DocumentError::UnknownAttribute {
                class: class.name().to_string(),
                attribute: unknown.clone(),
            });
        }
        Ok(Self {
            class,
            attributes,
            readonly: false,
        })
    }

    /// Build a document from untrusted input, casting every value.
    ///
    /// Equivalent to an empty [`Document::new`] followed by
    /// [`set_attributes`](Self::set_attributes).
    pub fn build(class: Arc<DocumentClass>, input: RawAttributes) -> Result<Self, DocumentError> {
        let mut doc = Self::new(class, RawAttributes::new())?;
        doc.set_attributes(input)?;
        Ok(doc)
    }

    /// Build a document from a raw JSON value, which must be an object.
    pub fn from_value(class: Arc<DocumentClass>, value: Value) -> Result<Self, DocumentError> {
        match value {
            Value::Object(map) => Self::new(class, map),
            other => Err(DocumentError::NotAnObject {
                class: class.name().to_string(),
                kind: kind_name(&other).to_string(),
            }),
        }
    }

    /// The document's class.
    pub fn class(&self) -> &Arc<DocumentClass> {
        &self.class
    }

    /// The document's class name.
    pub fn class_name(&self) -> &str {
        self.class.name()
    }

    /// The backing map: stored values only, defaults not applied.
    pub fn stored_attributes(&self) -> &RawAttributes {
        &self.attributes
    }

    // ─── Reads ───────────────────────────────────────────────────────

    /// Read `name`: the stored value, or the attribute's default.
    ///
    /// Computed and delegated defaults are cast through `name`'s type, so a
    /// default reads back exactly as it would after being written.
    ///
    /// # Errors
    ///
    /// `UnknownAttribute` if `name` is not registered. Derived defaults may
    /// also fail with `UnknownMethod`, `DefaultCycle` or a `CastError`.
    pub fn read_attribute(&self, name: &str) -> Result<Value, DocumentError> {
        let requested = self.class.require_attribute(name)?;
        if let Some(value) = self.attributes.get(name) {
            return Ok(value.clone());
        }
        let derived = match requested.default() {
            AttributeDefault::None => return Ok(Value::Null),
            // Cast at declaration.
            AttributeDefault::Value(value) => return Ok(value.clone()),
            AttributeDefault::Computed(compute) => compute(self)?,
            AttributeDefault::Delegate(target) => self.follow_delegate(name, target)?,
        };
        requested.cast(derived)
    }

    /// Walk a delegated default chain starting at `target`.
    fn follow_delegate(&self, name: &str, target: &str) -> Result<Value, DocumentError> {
        let mut visited = BTreeSet::from([name.to_string()]);
        let mut target = target.to_string();
        loop {
            if visited.contains(&target) {
                return Err(DocumentError::DefaultCycle {
                    class: self.class_name().to_string(),
                    attribute: name.to_string(),
                });
            }
            let Some(descriptor) = self.class.attribute_descriptor(&target) else {
                return self.call(&target);
            };
            if let Some(value) = self.attributes.get(&target) {
                return Ok(value.clone());
            }
            visited.insert(target);
            match descriptor.default() {
                AttributeDefault::None => return Ok(Value::Null),
                AttributeDefault::Value(value) => return Ok(value.clone()),
                AttributeDefault::Computed(compute) => return compute(self),
                AttributeDefault::Delegate(next) => target = next.clone(),
            }
        }
    }

    /// Read `name` and deserialize it into `T`.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, DocumentError> {
        let value = self.read_attribute(name)?;
        serde_json::from_value(value).map_err(|e| DocumentError::Deserialize {
            class: self.class_name().to_string(),
            reason: format!("attribute '{name}': {e}"),
        })
    }

    /// Invoke the class method `method` on this document.
    pub fn call(&self, method: &str) -> Result<Value, DocumentError> {
        let f = self
            .class
            .method(method)
            .ok_or_else(|| DocumentError::UnknownMethod {
                class: self.class_name().to_string(),
                method: method.to_string(),
            })?;
        f(self)
    }

    /// Snapshot of every registered attribute with defaults applied.
    pub fn attributes(&self) -> Result<RawAttributes, DocumentError> {
        let mut snapshot = RawAttributes::new();
        for name in self.class.attribute_names() {
            let value = self.read_attribute(&name)?;
            snapshot.insert(name, value);
        }
        Ok(snapshot)
    }

    /// Deserialize the attribute snapshot into a typed struct.
    pub fn to_typed<T: DeserializeOwned>(&self) -> Result<T, DocumentError> {
        serde_json::from_value(Value::Object(self.attributes()?)).map_err(|e| {
            DocumentError::Deserialize {
                class: self.class_name().to_string(),
                reason: e.to_string(),
            }
        })
    }

    // ─── Writes ──────────────────────────────────────────────────────

    /// Cast `value` through the attribute's type and store it.
    ///
    /// # Errors
    ///
    /// `UnknownAttribute`, then `Readonly`, then the caster's `CastError`.
    pub fn write_attribute(
        &mut self,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<(), DocumentError> {
        let descriptor = self.class.require_attribute(name)?;
        if self.readonly {
            return Err(DocumentError::Readonly {
                class: self.class_name().to_string(),
                attribute: name.to_string(),
            });
        }
        let cast = descriptor.cast(value.into())?;
        self.attributes.insert(name.to_string(), cast);
        Ok(())
    }

    /// Serialize `value` to JSON and write it through the attribute's type.
    pub fn set<T: Serialize>(&mut self, name: &str, value: &T) -> Result<(), DocumentError> {
        let raw = serde_json::to_value(value).map_err(|e| DocumentError::Deserialize {
            class: self.class_name().to_string(),
            reason: format!("attribute '{name}': {e}"),
        })?;
        self.write_attribute(name, raw)
    }

    /// Write each pair through [`write_attribute`](Self::write_attribute).
    ///
    /// Attributes not mentioned are untouched. Not atomic: on the first
    /// failure the remaining pairs are skipped, but pairs already written
    /// (in map key order) keep their new values.
    pub fn set_attributes(&mut self, attributes: RawAttributes) -> Result<(), DocumentError> {
        for (name, value) in attributes {
            self.write_attribute(&name, value)?;
        }
        Ok(())
    }

    // ─── Copies and freezing ─────────────────────────────────────────

    /// A writable copy of this document.
    pub fn dup(&self) -> Document {
        Document {
            class: Arc::clone(&self.class),
            attributes: self.attributes.clone(),
            readonly: false,
        }
    }

    /// A writable copy with `overlay` written on top.
    pub fn dup_with(&self, overlay: RawAttributes) -> Result<Document, DocumentError> {
        let mut copy = self.dup();
        copy.set_attributes(overlay)?;
        Ok(copy)
    }

    /// Whether writes are rejected.
    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    /// Reject all further writes.
    pub fn make_readonly(&mut self) {
        self.readonly = true;
    }

    /// Consume and return the document in readonly mode.
    pub fn into_readonly(mut self) -> Self {
        self.make_readonly();
        self
    }

    // ─── Validation ──────────────────────────────────────────────────

    /// Run the class's validation rules. The document is not modified.
    pub fn validate(&self) -> Result<Errors, DocumentError> {
        self.class.validations().run(self)
    }

    /// Whether the document passes its class's validation rules.
    pub fn is_valid(&self) -> Result<bool, DocumentError> {
        self.validate().map(|errors| errors.is_empty())
    }
}

/// Equal when the classes are the same class and the attribute snapshots
/// match. Snapshots that fail to resolve compare unequal.
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        if !Arc::ptr_eq(&self.class, &other.class) {
            return false;
        }
        match (self.attributes(), other.attributes()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let snapshot = self.attributes().map_err(serde::ser::Error::custom)?;
        snapshot.serialize(serializer)
    }
}
