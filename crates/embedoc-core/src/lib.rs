//! # embedoc-core — Foundational Types for Embedded Documents
//!
//! Leaf crate of the workspace. It defines the three collaborators the
//! document and embedding layers consume:
//!
//! 1. **Raw values.** Embedded data lives in a host field as untyped JSON
//!    (`serde_json::Value`); a document is backed by a [`RawAttributes`] map.
//!
//! 2. **Type casting.** [`TypeRegistry`] resolves a type name plus options to
//!    a [`Caster`]. Built-in types: `string`, `integer`, `float`, `boolean`,
//!    `date`, `datetime`, `uuid`, `value`. New types plug in at runtime.
//!
//! 3. **Validation errors.** [`Errors`] is the appendable, path-keyed error
//!    collection; [`Validations`] is the ordered rule list a type carries.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `embedoc-*` crates.
//! - No `unsafe` code.
//! - No `.unwrap()` outside tests.

pub mod cast;
pub mod error;
pub mod registry;
pub mod validation;
pub mod value;

pub use cast::{
    BooleanCaster, CastOptions, Caster, DateCaster, DateTimeCaster, FloatCaster, IntegerCaster,
    StringCaster, UuidCaster, ValueCaster,
};
pub use error::{CastError, TypeLookupError};
pub use registry::{CasterFactory, TypeRegistry, BUILTIN_TYPES};
pub use validation::{
    Errors, Rule, ValidationError, Validations, MESSAGE_BLANK, MESSAGE_INCLUSION,
    MESSAGE_REQUIRED, MESSAGE_TOO_LONG, MESSAGE_TOO_SHORT,
};
pub use value::{as_attributes, is_blank, kind_name, RawAttributes};
