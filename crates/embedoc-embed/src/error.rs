//! # Error Types — Embedding
//!
//! Raised by embedding readers, writers and installed rules. Failures of
//! the embedded documents' own validation never appear here; they are
//! entries in the host's [`Errors`](embedoc_core::Errors).

use thiserror::Error;

use embedoc_document::{DocumentError, RegistryError};

/// Errors raised by embedding declarations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmbedError {
    /// The declared document class could not be resolved, or does not
    /// derive from the registry's base class.
    #[error(transparent)]
    UnknownDocumentClass(#[from] RegistryError),

    /// A writer was handed a document of an unrelated class.
    #[error("expected a {expected} document, got {actual}")]
    ClassMismatch {
        /// The declared document class.
        expected: String,
        /// The class of the document that was assigned.
        actual: String,
    },

    /// The host exposes the raw field neither as a structured attribute
    /// nor through an accessor pair.
    #[error("{host} has no raw field '{field}'")]
    MissingRawField {
        /// Host type name.
        host: String,
        /// Raw field name.
        field: String,
    },

    /// The raw field holds a value of the wrong shape.
    #[error("raw field '{field}' must hold {expected}, got {actual}")]
    MalformedRawField {
        /// Raw field name.
        field: String,
        /// The expected shape.
        expected: &'static str,
        /// JSON kind of the stored value.
        actual: &'static str,
    },

    /// Building or reading a document failed.
    #[error(transparent)]
    Document(#[from] DocumentError),
}
