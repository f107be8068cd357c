//! # Embedding Targets
//!
//! An embedding names its document class either directly or by name. Named
//! targets are resolved through a [`ClassRegistry`] on every read and write,
//! so the class may be registered after the declaration.
//!
//! This module also holds the conversions shared by single and collection
//! embeddings: assigned values into raw maps, and raw maps into readonly
//! documents.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use embedoc_core::{kind_name, RawAttributes};
use embedoc_document::{ClassRegistry, Document, DocumentClass};

use crate::error::EmbedError;

/// The document class of an embedding.
#[derive(Clone)]
pub enum DocumentRef {
    /// A class held directly.
    Class(Arc<DocumentClass>),
    /// A class looked up by name when the embedding is used.
    Named {
        /// Registered class name.
        name: String,
        /// Registry the name is resolved in.
        registry: Arc<ClassRegistry>,
    },
}

impl DocumentRef {
    /// A late-bound reference to `name` in `registry`.
    pub fn named(name: impl Into<String>, registry: &Arc<ClassRegistry>) -> Self {
        Self::Named {
            name: name.into(),
            registry: Arc::clone(registry),
        }
    }

    /// The referenced class name, without resolving it.
    pub fn name(&self) -> &str {
        match self {
            Self::Class(class) => class.name(),
            Self::Named { name, .. } => name,
        }
    }

    /// Resolve to a class.
    ///
    /// # Errors
    ///
    /// `UnknownDocumentClass` if the name is not registered, or names a
    /// class outside the registry's base class.
    pub fn resolve(&self) -> Result<Arc<DocumentClass>, EmbedError> {
        match self {
            Self::Class(class) => Ok(Arc::clone(class)),
            Self::Named { name, registry } => Ok(registry.resolve(name)?),
        }
    }
}

impl From<Arc<DocumentClass>> for DocumentRef {
    fn from(class: Arc<DocumentClass>) -> Self {
        Self::Class(class)
    }
}

impl fmt::Debug for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class(class) => f.debug_tuple("Class").field(&class.name()).finish(),
            Self::Named { name, .. } => f.debug_tuple("Named").field(name).finish(),
        }
    }
}

/// A value assigned through an embedding writer.
#[derive(Debug, Clone, Default)]
pub enum EmbedValue {
    /// Clears the embedding.
    #[default]
    Absent,
    /// A document; its attribute snapshot is stored.
    Document(Document),
    /// A raw map; each value is cast through the class's attribute types.
    Raw(RawAttributes),
}

impl From<Document> for EmbedValue {
    fn from(doc: Document) -> Self {
        Self::Document(doc)
    }
}

impl From<RawAttributes> for EmbedValue {
    fn from(map: RawAttributes) -> Self {
        Self::Raw(map)
    }
}

impl<T: Into<EmbedValue>> From<Option<T>> for EmbedValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Into::into)
    }
}

/// Turn an assigned value into the raw map to store, or `None` for absent.
pub(crate) fn extract(
    class: &Arc<DocumentClass>,
    value: EmbedValue,
) -> Result<Option<RawAttributes>, EmbedError> {
    match value {
        EmbedValue::Absent => Ok(None),
        EmbedValue::Document(doc) => {
            if !doc.class().descends_from(class) {
                return Err(EmbedError::ClassMismatch {
                    expected: class.name().to_string(),
                    actual: doc.class_name().to_string(),
                });
            }
            // Subclass-only attributes are dropped from the stored map.
            let mut snapshot = doc.attributes()?;
            snapshot.retain(|name, _| class.has_attribute(name));
            Ok(Some(snapshot))
        }
        EmbedValue::Raw(map) => {
            let doc = Document::build(Arc::clone(class), map)?;
            Ok(Some(doc.stored_attributes().clone()))
        }
    }
}

/// A readonly document over a copy of `map`.
pub(crate) fn materialize(
    class: &Arc<DocumentClass>,
    map: RawAttributes,
) -> Result<Document, EmbedError> {
    Ok(Document::new(Arc::clone(class), map)?.into_readonly())
}

/// Borrow a raw element as a map, or report its shape.
pub(crate) fn expect_object<'a>(
    field: &str,
    value: &'a Value,
) -> Result<&'a RawAttributes, EmbedError> {
    value.as_object().ok_or_else(|| EmbedError::MalformedRawField {
        field: field.to_string(),
        expected: "an object",
        actual: kind_name(value),
    })
}
