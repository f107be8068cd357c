//! # Error Types — Documents and Class Resolution
//!
//! Structural errors only. They indicate misconfiguration (an attribute
//! that was never declared, a class name nobody registered) and surface to
//! the caller immediately. Data problems are reported as validation
//! entries, never through these types.

use thiserror::Error;

use embedoc_core::{CastError, TypeLookupError};

/// Errors raised by document classes and document records.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    /// The attribute is not registered on the document's class.
    #[error("unknown attribute '{attribute}' for {class}")]
    UnknownAttribute {
        /// Document class name.
        class: String,
        /// The attribute that was read or written.
        attribute: String,
    },

    /// A write was attempted on a readonly document.
    #[error("cannot write '{attribute}': {class} document is readonly")]
    Readonly {
        /// Document class name.
        class: String,
        /// The attribute that was written.
        attribute: String,
    },

    /// Delegated defaults refer back to themselves.
    #[error("default for '{attribute}' on {class} delegates in a cycle")]
    DefaultCycle {
        /// Document class name.
        class: String,
        /// The attribute whose default could not be resolved.
        attribute: String,
    },

    /// A delegated default or call names neither an attribute nor a method.
    #[error("unknown method '{method}' for {class}")]
    UnknownMethod {
        /// Document class name.
        class: String,
        /// The missing method name.
        method: String,
    },

    /// A document was built from a raw value that is not a map.
    #[error("{class} documents are built from objects, got {kind}")]
    NotAnObject {
        /// Document class name.
        class: String,
        /// JSON kind of the rejected value.
        kind: String,
    },

    /// A typed read could not convert the stored value.
    #[error("cannot read {class} as the requested type: {reason}")]
    Deserialize {
        /// Document class name.
        class: String,
        /// Conversion failure.
        reason: String,
    },

    /// Casting failed; the caster's error is passed through as-is.
    #[error(transparent)]
    Cast(#[from] CastError),

    /// An attribute declaration named an unknown type or bad options.
    #[error(transparent)]
    TypeLookup(#[from] TypeLookupError),
}

/// Errors raised while registering or resolving document classes by name.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    /// No class is registered under this name.
    #[error("unknown document class: {0}")]
    UnknownDocumentClass(String),

    /// The named class does not derive from the registry's base class.
    #[error("unknown document class: {name} does not derive from {base}")]
    NotADocumentClass {
        /// The resolved class name.
        name: String,
        /// The required base class name.
        base: String,
    },

    /// A class descriptor could not be parsed.
    #[error("invalid class descriptor: {reason}")]
    Descriptor {
        /// Parse failure.
        reason: String,
    },

    /// Defining a class from a descriptor failed.
    #[error(transparent)]
    Document(#[from] DocumentError),
}

impl RegistryError {
    /// Whether this error reports an unresolvable document class.
    pub fn is_unknown_class(&self) -> bool {
        matches!(
            self,
            Self::UnknownDocumentClass(_) | Self::NotADocumentClass { .. }
        )
    }
}
