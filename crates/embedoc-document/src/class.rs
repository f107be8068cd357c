//! # Document Classes — Attribute Registry
//!
//! A [`DocumentClass`] is a document type: a name, an optional parent, and
//! a mutable definition holding the attribute descriptors, named methods
//! and validation rules. Classes are shared as `Arc<DocumentClass>` and may
//! keep growing after creation (declaring an attribute twice replaces the
//! first declaration).
//!
//! ## Inheritance
//!
//! [`DocumentClass::inherit`] deep-copies the parent's definition at the
//! moment the subtype is created. From then on the two definitions are
//! independent: attributes added to either never appear on the other.
//!
//! ## Locking
//!
//! The definition sits behind a `parking_lot::RwLock`. Every accessor
//! clones what it needs and releases the lock before running user code
//! (computed defaults, methods, validation rules), so those closures may
//! freely read the class again.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use embedoc_core::{
    is_blank, CastOptions, Errors, TypeRegistry, Validations, MESSAGE_BLANK, MESSAGE_INCLUSION,
    MESSAGE_TOO_LONG, MESSAGE_TOO_SHORT,
};

use crate::attribute::{AttributeDefault, AttributeDescriptor};
use crate::document::Document;
use crate::error::DocumentError;

/// A named computation over a document.
pub type Method = Arc<dyn Fn(&Document) -> Result<Value, DocumentError> + Send + Sync>;

/// Validation rules carried by a document class.
pub type DocumentValidations = Validations<Document, DocumentError>;

/// Where a class resolves attribute type names.
#[derive(Clone)]
enum TypeSource {
    Global,
    Custom(Arc<TypeRegistry>),
}

impl TypeSource {
    fn registry(&self) -> &TypeRegistry {
        match self {
            Self::Global => TypeRegistry::global(),
            Self::Custom(registry) => registry,
        }
    }
}

#[derive(Clone, Default)]
struct Definition {
    attributes: BTreeMap<String, Arc<AttributeDescriptor>>,
    methods: BTreeMap<String, Method>,
    validations: DocumentValidations,
}

impl Definition {
    /// Copy with fresh descriptor allocations so no descriptor is shared.
    fn deep_copy(&self) -> Self {
        Self {
            attributes: self
                .attributes
                .iter()
                .map(|(name, descriptor)| {
                    (name.clone(), Arc::new(AttributeDescriptor::clone(descriptor)))
                })
                .collect(),
            methods: self.methods.clone(),
            validations: self.validations.clone(),
        }
    }
}

/// A document type.
pub struct DocumentClass {
    name: String,
    parent: Option<Arc<DocumentClass>>,
    types: TypeSource,
    definition: RwLock<Definition>,
}

impl fmt::Debug for DocumentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentClass")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name()))
            .field("attributes", &self.attribute_names())
            .finish()
    }
}

impl DocumentClass {
    /// A root class resolving types through [`TypeRegistry::global`].
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            parent: None,
            types: TypeSource::Global,
            definition: RwLock::new(Definition::default()),
        })
    }

    /// A root class resolving types through `types`.
    pub fn with_types(name: impl Into<String>, types: Arc<TypeRegistry>) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            parent: None,
            types: TypeSource::Custom(types),
            definition: RwLock::new(Definition::default()),
        })
    }

    /// A subtype of `parent` starting from a deep copy of its definition.
    pub fn inherit(name: impl Into<String>, parent: &Arc<DocumentClass>) -> Arc<Self> {
        let definition = parent.definition.read().deep_copy();
        Arc::new(Self {
            name: name.into(),
            parent: Some(Arc::clone(parent)),
            types: parent.types.clone(),
            definition: RwLock::new(definition),
        })
    }

    /// The class name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The direct parent, if any.
    pub fn parent(&self) -> Option<&Arc<DocumentClass>> {
        self.parent.as_ref()
    }

    /// Whether this class is `ancestor` or one of its subtypes.
    pub fn descends_from(&self, ancestor: &DocumentClass) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if std::ptr::eq(class, ancestor) {
                return true;
            }
            current = class.parent.as_deref();
        }
        false
    }

    // ─── Attributes ──────────────────────────────────────────────────

    /// Declare `name` of type `type_name` with no default.
    ///
    /// Returns `self` so declarations chain with `?`.
    pub fn attribute(&self, name: &str, type_name: &str) -> Result<&Self, DocumentError> {
        self.attribute_with(name, type_name, AttributeDefault::None, &CastOptions::new())
    }

    /// Declare `name` of type `type_name` with a default and type options.
    ///
    /// The type is resolved immediately; `options` are forwarded to the
    /// lookup. A literal default is cast through the type here, so an
    /// uncastable literal fails with `CastError` at declaration.
    /// Redeclaring an attribute replaces the previous descriptor.
    pub fn attribute_with(
        &self,
        name: &str,
        type_name: &str,
        default: AttributeDefault,
        options: &CastOptions,
    ) -> Result<&Self, DocumentError> {
        let caster = self.types.registry().lookup(type_name, options)?;
        let default = match default {
            AttributeDefault::Value(value) => AttributeDefault::Value(caster.cast(value)?),
            other => other,
        };
        let descriptor = Arc::new(AttributeDescriptor::new(name, caster, default));
        let replaced = self
            .definition
            .write()
            .attributes
            .insert(name.to_string(), descriptor)
            .is_some();
        if replaced {
            tracing::debug!(class = %self.name, attribute = name, "attribute redeclared");
        }
        Ok(self)
    }

    /// Snapshot of every descriptor, inherited ones included.
    pub fn attributes(&self) -> BTreeMap<String, Arc<AttributeDescriptor>> {
        self.definition.read().attributes.clone()
    }

    /// Attribute names in sorted order.
    pub fn attribute_names(&self) -> Vec<String> {
        self.definition.read().attributes.keys().cloned().collect()
    }

    /// The descriptor registered under `name`.
    pub fn attribute_descriptor(&self, name: &str) -> Option<Arc<AttributeDescriptor>> {
        self.definition.read().attributes.get(name).cloned()
    }

    /// Whether `name` is a registered attribute.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.definition.read().attributes.contains_key(name)
    }

    /// The descriptor for `name`, or `UnknownAttribute`.
    pub(crate) fn require_attribute(
        &self,
        name: &str,
    ) -> Result<Arc<AttributeDescriptor>, DocumentError> {
        self.attribute_descriptor(name)
            .ok_or_else(|| DocumentError::UnknownAttribute {
                class: self.name.clone(),
                attribute: name.to_string(),
            })
    }

    // ─── Methods ─────────────────────────────────────────────────────

    /// Define a named method, usable as a delegated default target.
    ///
    /// As with computed defaults, a method that reads an attribute
    /// delegating back to itself recurses without bound.
    pub fn define_method<F>(&self, name: &str, method: F) -> &Self
    where
        F: Fn(&Document) -> Result<Value, DocumentError> + Send + Sync + 'static,
    {
        self.definition
            .write()
            .methods
            .insert(name.to_string(), Arc::new(method));
        self
    }

    /// The method registered under `name`.
    pub fn method(&self, name: &str) -> Option<Method> {
        self.definition.read().methods.get(name).cloned()
    }

    // ─── Validations ─────────────────────────────────────────────────

    /// Add a custom validation rule.
    pub fn validate_with<F>(&self, label: &str, rule: F) -> &Self
    where
        F: Fn(&Document, &mut Errors) -> Result<(), DocumentError> + Send + Sync + 'static,
    {
        self.definition.write().validations.add(label, rule);
        self
    }

    /// Require `attribute` to be non-blank. Reports `blank`.
    pub fn validates_presence_of(&self, attribute: &str) -> &Self {
        let attr = attribute.to_string();
        self.validate_with(&format!("presence:{attribute}"), move |doc, errors| {
            if is_blank(&doc.read_attribute(&attr)?) {
                errors.add(attr.as_str(), MESSAGE_BLANK);
            }
            Ok(())
        })
    }

    /// Bound the length of a string or array attribute. `null` is skipped.
    pub fn validates_length_of(
        &self,
        attribute: &str,
        min: Option<usize>,
        max: Option<usize>,
    ) -> &Self {
        let attr = attribute.to_string();
        self.validate_with(&format!("length:{attribute}"), move |doc, errors| {
            let len = match doc.read_attribute(&attr)? {
                Value::String(s) => s.chars().count(),
                Value::Array(items) => items.len(),
                _ => return Ok(()),
            };
            if min.is_some_and(|min| len < min) {
                errors.add(attr.as_str(), MESSAGE_TOO_SHORT);
            }
            if max.is_some_and(|max| len > max) {
                errors.add(attr.as_str(), MESSAGE_TOO_LONG);
            }
            Ok(())
        })
    }

    /// Require `attribute` to equal one of `allowed`.
    pub fn validates_inclusion_of(&self, attribute: &str, allowed: Vec<Value>) -> &Self {
        let attr = attribute.to_string();
        self.validate_with(&format!("inclusion:{attribute}"), move |doc, errors| {
            let value = doc.read_attribute(&attr)?;
            if !allowed.contains(&value) {
                errors.add(attr.as_str(), MESSAGE_INCLUSION);
            }
            Ok(())
        })
    }

    /// Snapshot of the class's validation rules.
    pub fn validations(&self) -> DocumentValidations {
        self.definition.read().validations.clone()
    }
}
