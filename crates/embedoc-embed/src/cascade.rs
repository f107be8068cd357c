//! # Validation Cascade
//!
//! Republishes an embedded document's own validation failures on the host
//! under path-qualified keys:
//!
//! | embedding   | child failure      | host key               |
//! |-------------|--------------------|------------------------|
//! | single      | `street: blank`    | `address.street`       |
//! | collection  | element 1 `street` | `addresses[1].street`  |
//!
//! Messages are copied unchanged. Absent documents contribute nothing.
//! Children are only read, never modified.

use embedoc_core::Errors;
use embedoc_document::{Document, DocumentError};

/// Host key for `attribute` of a single embedding `name`.
pub fn one_key(name: &str, attribute: &str) -> String {
    format!("{name}.{attribute}")
}

/// Host key for `attribute` of element `index` of collection `name`.
pub fn many_key(name: &str, index: usize, attribute: &str) -> String {
    format!("{name}[{index}].{attribute}")
}

/// Cascade a single embedded document's failures into `errors`.
pub fn cascade_one(
    name: &str,
    document: Option<&Document>,
    errors: &mut Errors,
) -> Result<(), DocumentError> {
    let Some(document) = document else {
        return Ok(());
    };
    for failure in &document.validate()? {
        errors.add(one_key(name, &failure.attribute), failure.message.as_str());
    }
    Ok(())
}

/// Cascade each invalid element's failures into `errors`.
pub fn cascade_many(
    name: &str,
    documents: Option<&[Document]>,
    errors: &mut Errors,
) -> Result<(), DocumentError> {
    let Some(documents) = documents else {
        return Ok(());
    };
    for (index, document) in documents.iter().enumerate() {
        for failure in &document.validate()? {
            errors.add(
                many_key(name, index, &failure.attribute),
                failure.message.as_str(),
            );
        }
    }
    Ok(())
}
