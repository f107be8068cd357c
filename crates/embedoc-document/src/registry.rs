//! # Class Registry — Name-Based Resolution
//!
//! Embedding declarations may name their document class instead of holding
//! it, so a class can be referenced before it is defined. A
//! [`ClassRegistry`] maps names to classes and resolves them on demand.
//!
//! A registry created with [`ClassRegistry::with_base`] only hands out
//! classes that descend from the base; anything else resolves to
//! [`RegistryError::NotADocumentClass`].

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::class::DocumentClass;
use crate::descriptor::ClassDescriptor;
use crate::error::RegistryError;

/// Name-keyed document classes.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: RwLock<HashMap<String, Arc<DocumentClass>>>,
    base: Option<Arc<DocumentClass>>,
}

impl ClassRegistry {
    /// An empty registry accepting any class.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry whose classes must descend from `base`.
    ///
    /// The base itself is registered under its own name.
    pub fn with_base(base: Arc<DocumentClass>) -> Self {
        let registry = Self {
            classes: RwLock::new(HashMap::new()),
            base: Some(Arc::clone(&base)),
        };
        registry.register(base);
        registry
    }

    /// The required base class, if any.
    pub fn base(&self) -> Option<&Arc<DocumentClass>> {
        self.base.as_ref()
    }

    /// Register `class` under its name. A later registration replaces an
    /// earlier one with the same name.
    pub fn register(&self, class: Arc<DocumentClass>) {
        let name = class.name().to_string();
        if self.classes.write().insert(name.clone(), class).is_some() {
            tracing::warn!(class = %name, "document class redefined");
        }
    }

    /// The class registered under `name`, unchecked.
    pub fn get(&self, name: &str) -> Option<Arc<DocumentClass>> {
        self.classes.read().get(name).cloned()
    }

    /// Registered class names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.classes.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Resolve `name` to a class descending from the base, if one is set.
    pub fn resolve(&self, name: &str) -> Result<Arc<DocumentClass>, RegistryError> {
        let class = self
            .get(name)
            .ok_or_else(|| RegistryError::UnknownDocumentClass(name.to_string()))?;
        if let Some(base) = &self.base {
            if !class.descends_from(base) {
                return Err(RegistryError::NotADocumentClass {
                    name: name.to_string(),
                    base: base.name().to_string(),
                });
            }
        }
        tracing::debug!(class = %name, "resolved document class");
        Ok(class)
    }

    /// Build and register a class from `descriptor`.
    ///
    /// `extends` must name a registered class. Without it the class
    /// inherits from the base, or is a root class when there is none.
    pub fn define(
        &self,
        descriptor: &ClassDescriptor,
    ) -> Result<Arc<DocumentClass>, RegistryError> {
        let class = match (&descriptor.extends, &self.base) {
            (Some(parent), _) => DocumentClass::inherit(&descriptor.name, &self.resolve(parent)?),
            (None, Some(base)) => DocumentClass::inherit(&descriptor.name, base),
            (None, None) => DocumentClass::new(&descriptor.name),
        };
        descriptor.apply_to(&class)?;
        self.register(Arc::clone(&class));
        Ok(class)
    }

    /// Define every class in a YAML sequence of descriptors, in order.
    pub fn load_yaml(&self, yaml: &str) -> Result<Vec<Arc<DocumentClass>>, RegistryError> {
        ClassDescriptor::list_from_yaml(yaml)?
            .iter()
            .map(|descriptor| self.define(descriptor))
            .collect()
    }
}
