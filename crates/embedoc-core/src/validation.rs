//! # Validation — Path-Keyed Error Collection and Rule Lists
//!
//! Validation failures are data, not exceptions. A run over a target
//! produces an [`Errors`] value: an ordered, appendable list of
//! `(key, message)` entries where the key is an attribute name or a
//! path such as `address.street` or `addresses[1].street`.
//!
//! [`Validations`] is the ordered rule list a type carries. Rules append to
//! the collection and may fail with a structural error `E` (unknown class,
//! unknown attribute) which aborts the run; data problems never do.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Message recorded when a required value is missing.
pub const MESSAGE_REQUIRED: &str = "required";
/// Message recorded when an attribute is blank.
pub const MESSAGE_BLANK: &str = "blank";
/// Message recorded when a value is not in its allowed set.
pub const MESSAGE_INCLUSION: &str = "inclusion";
/// Message recorded when a value is shorter than allowed.
pub const MESSAGE_TOO_SHORT: &str = "too_short";
/// Message recorded when a value is longer than allowed.
pub const MESSAGE_TOO_LONG: &str = "too_long";

/// One validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidationError {
    /// Attribute name or path the failure is reported under.
    pub attribute: String,
    /// Message key describing the failure (e.g., `"blank"`).
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.attribute, self.message)
    }
}

/// Ordered collection of validation failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Errors {
    entries: Vec<ValidationError>,
}

impl Errors {
    /// An empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a failure under `attribute`.
    pub fn add(&mut self, attribute: impl Into<String>, message: impl Into<String>) {
        self.entries.push(ValidationError {
            attribute: attribute.into(),
            message: message.into(),
        });
    }

    /// Whether the collection holds no failures.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of failures.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate failures in the order they were added.
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.entries.iter()
    }

    /// Messages recorded under exactly `attribute`.
    pub fn on(&self, attribute: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.attribute == attribute)
            .map(|e| e.message.as_str())
            .collect()
    }

    /// Whether any failure is recorded under exactly `attribute`.
    pub fn contains_key(&self, attribute: &str) -> bool {
        self.entries.iter().any(|e| e.attribute == attribute)
    }

    /// Distinct keys in first-seen order.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !keys.contains(&entry.attribute.as_str()) {
                keys.push(&entry.attribute);
            }
        }
        keys
    }

    /// Consume the collection into its entries.
    pub fn into_inner(self) -> Vec<ValidationError> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a Errors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl Extend<ValidationError> for Errors {
    fn extend<I: IntoIterator<Item = ValidationError>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

impl fmt::Display for Errors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

// ─── Rule lists ──────────────────────────────────────────────────────

/// A validation rule over `T` that may abort with a structural error `E`.
pub type Rule<T, E> = Arc<dyn Fn(&T, &mut Errors) -> Result<(), E> + Send + Sync>;

struct LabeledRule<T: ?Sized, E> {
    label: String,
    rule: Rule<T, E>,
}

impl<T: ?Sized, E> Clone for LabeledRule<T, E> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            rule: Arc::clone(&self.rule),
        }
    }
}

/// Ordered validation rules for one type.
///
/// Rules run in registration order. Cloning shares the rule closures, so
/// a subtype can start from a copy of its parent's list and grow it
/// independently.
pub struct Validations<T: ?Sized, E> {
    rules: Vec<LabeledRule<T, E>>,
}

impl<T: ?Sized, E> Default for Validations<T, E> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<T: ?Sized, E> Clone for Validations<T, E> {
    fn clone(&self) -> Self {
        Self {
            rules: self.rules.clone(),
        }
    }
}

impl<T: ?Sized, E> fmt::Debug for Validations<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validations")
            .field("rules", &self.labels())
            .finish()
    }
}

impl<T: ?Sized, E> Validations<T, E> {
    /// An empty rule list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule. `label` identifies it in debug output.
    pub fn add<F>(&mut self, label: impl Into<String>, rule: F)
    where
        F: Fn(&T, &mut Errors) -> Result<(), E> + Send + Sync + 'static,
    {
        self.rules.push(LabeledRule {
            label: label.into(),
            rule: Arc::new(rule),
        });
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no rules are registered.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rule labels in registration order.
    pub fn labels(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.label.as_str()).collect()
    }

    /// Run every rule against `target` and collect the failures.
    ///
    /// # Errors
    ///
    /// The first structural error raised by a rule; rules after it do not run.
    pub fn run(&self, target: &T) -> Result<Errors, E> {
        let mut errors = Errors::new();
        for labeled in &self.rules {
            (labeled.rule)(target, &mut errors)?;
        }
        Ok(errors)
    }

    /// Whether `target` passes every rule.
    pub fn is_valid(&self, target: &T) -> Result<bool, E> {
        self.run(target).map(|errors| errors.is_empty())
    }
}
