//! # embedoc-document — Document Classes and Records
//!
//! A document is a small typed record stored as a raw map. This crate
//! provides:
//!
//! - [`DocumentClass`]: the per-type attribute registry. Each attribute has
//!   a name, a caster resolved from [`embedoc_core::TypeRegistry`], and a
//!   default (literal, computed, or delegated to another attribute or
//!   method). Subtypes start from a deep copy of their parent's registry.
//! - [`Document`]: an instance holding cast values, with a readonly mode,
//!   duplication, equality by class and attribute snapshot, and
//!   class-level validation rules.
//! - [`ClassRegistry`]: name-based class resolution, optionally restricted
//!   to descendants of a base class, and YAML class descriptors.
//!
//! ## Example
//!
//! ```
//! use embedoc_document::{AttributeDefault, Document, DocumentClass};
//! use embedoc_core::{CastOptions, RawAttributes};
//! use serde_json::json;
//!
//! let address = DocumentClass::new("Address");
//! address
//!     .attribute("street", "string")?
//!     .attribute_with("zip", "integer", AttributeDefault::value(0), &CastOptions::new())?;
//!
//! let mut doc = Document::new(address, RawAttributes::new())?;
//! doc.write_attribute("zip", "1012")?;
//! assert_eq!(doc.read_attribute("zip")?, json!(1012));
//! assert_eq!(doc.read_attribute("street")?, json!(null));
//! # Ok::<(), embedoc_document::DocumentError>(())
//! ```

pub mod attribute;
pub mod class;
pub mod descriptor;
pub mod document;
pub mod error;
pub mod registry;

pub use attribute::{AttributeDefault, AttributeDescriptor, ComputedDefault};
pub use class::{DocumentClass, DocumentValidations, Method};
pub use descriptor::{AttributeDecl, ClassDescriptor, RuleDecl};
pub use document::Document;
pub use error::{DocumentError, RegistryError};
pub use registry::ClassRegistry;
