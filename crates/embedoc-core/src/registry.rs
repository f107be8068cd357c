//! # Type Registry — Pluggable Type Lookup
//!
//! Maps a type name plus declaration options to a [`Caster`]. Attribute
//! declarations resolve their type here once, at definition time; the
//! resulting caster is stored on the attribute descriptor.
//!
//! The registry ships with the built-in types and accepts new ones at any
//! time through [`TypeRegistry::register`]. A process-wide instance is
//! available from [`TypeRegistry::global`].

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::cast::{
    BooleanCaster, CastOptions, Caster, DateCaster, DateTimeCaster, FloatCaster, IntegerCaster,
    StringCaster, UuidCaster, ValueCaster,
};
use crate::error::TypeLookupError;

/// Builds a caster from declaration options.
pub type CasterFactory =
    Arc<dyn Fn(&CastOptions) -> Result<Arc<dyn Caster>, TypeLookupError> + Send + Sync>;

/// Names of the types every registry starts with.
pub const BUILTIN_TYPES: &[&str] = &[
    "string", "integer", "float", "boolean", "date", "datetime", "uuid", "value",
];

static GLOBAL: OnceLock<TypeRegistry> = OnceLock::new();

/// Name-keyed caster factories.
pub struct TypeRegistry {
    factories: RwLock<HashMap<String, CasterFactory>>,
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<String> = self.factories.read().keys().cloned().collect();
        names.sort();
        f.debug_struct("TypeRegistry").field("types", &names).finish()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl TypeRegistry {
    /// A registry with no types at all.
    pub fn empty() -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
        }
    }

    /// A registry holding the built-in types.
    pub fn with_builtins() -> Self {
        let registry = Self::empty();
        registry.register("string", |opts| {
            opts.ensure_only("string", &["limit"])?;
            let limit = opts.get_u32("string", "limit")?.map(|n| n as usize);
            Ok(Arc::new(StringCaster { limit }) as Arc<dyn Caster>)
        });
        registry.register("integer", |opts| {
            opts.ensure_only("integer", &[])?;
            Ok(Arc::new(IntegerCaster) as Arc<dyn Caster>)
        });
        registry.register("float", |opts| {
            opts.ensure_only("float", &["precision"])?;
            let precision = opts.get_u32("float", "precision")?;
            Ok(Arc::new(FloatCaster { precision }) as Arc<dyn Caster>)
        });
        registry.register("boolean", |opts| {
            opts.ensure_only("boolean", &[])?;
            Ok(Arc::new(BooleanCaster) as Arc<dyn Caster>)
        });
        registry.register("date", |opts| {
            opts.ensure_only("date", &[])?;
            Ok(Arc::new(DateCaster) as Arc<dyn Caster>)
        });
        registry.register("datetime", |opts| {
            opts.ensure_only("datetime", &["precision"])?;
            let precision = opts.get_u32("datetime", "precision")?.unwrap_or(0);
            if precision > 9 {
                return Err(TypeLookupError::InvalidOption {
                    type_name: "datetime".into(),
                    option: "precision".into(),
                    reason: format!("must be between 0 and 9, got {precision}"),
                });
            }
            Ok(Arc::new(DateTimeCaster { precision }) as Arc<dyn Caster>)
        });
        registry.register("uuid", |opts| {
            opts.ensure_only("uuid", &[])?;
            Ok(Arc::new(UuidCaster) as Arc<dyn Caster>)
        });
        registry.register("value", |opts| {
            opts.ensure_only("value", &[])?;
            Ok(Arc::new(ValueCaster) as Arc<dyn Caster>)
        });
        registry
    }

    /// The process-wide registry, created with the built-in types.
    pub fn global() -> &'static TypeRegistry {
        GLOBAL.get_or_init(TypeRegistry::with_builtins)
    }

    /// Register (or replace) the factory for `name`.
    pub fn register<F>(&self, name: impl Into<String>, factory: F)
    where
        F: Fn(&CastOptions) -> Result<Arc<dyn Caster>, TypeLookupError> + Send + Sync + 'static,
    {
        let name = name.into();
        let previous = self.factories.write().insert(name.clone(), Arc::new(factory));
        if previous.is_some() {
            tracing::debug!(type_name = %name, "replaced caster factory");
        }
    }

    /// Whether a type is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.read().contains_key(name)
    }

    /// Resolve `name` with `options` into a caster.
    ///
    /// # Errors
    ///
    /// `UnknownType` if nothing is registered under `name`; whatever the
    /// factory reports for unacceptable options.
    pub fn lookup(
        &self,
        name: &str,
        options: &CastOptions,
    ) -> Result<Arc<dyn Caster>, TypeLookupError> {
        // Clone the factory out so a factory may itself consult the registry.
        let factory = self
            .factories
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| TypeLookupError::UnknownType(name.to_string()))?;
        factory(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CastError;
    use serde_json::{json, Value};

    #[test]
    fn test_builtins_are_registered() {
        let registry = TypeRegistry::with_builtins();
        for name in BUILTIN_TYPES {
            assert!(registry.contains(name), "missing {name}");
            let caster = registry.lookup(name, &CastOptions::new()).unwrap();
            assert_eq!(caster.type_name(), *name);
        }
    }

    #[test]
    fn test_unknown_type_fails() {
        let err = TypeRegistry::with_builtins()
            .lookup("money", &CastOptions::new())
            .unwrap_err();
        assert_eq!(err, TypeLookupError::UnknownType("money".into()));
    }

    #[test]
    fn test_options_are_forwarded() {
        let registry = TypeRegistry::with_builtins();
        let caster = registry
            .lookup("float", &CastOptions::new().with("precision", 1))
            .unwrap();
        assert_eq!(caster.cast(json!(1.26)).unwrap(), json!(1.3));
    }

    #[test]
    fn test_bad_options_rejected() {
        let registry = TypeRegistry::with_builtins();
        assert!(registry
            .lookup("integer", &CastOptions::new().with("limit", 4))
            .is_err());
        assert!(registry
            .lookup("datetime", &CastOptions::new().with("precision", 12))
            .is_err());
        assert!(registry
            .lookup("string", &CastOptions::new().with("limit", "long"))
            .is_err());
    }

    #[derive(Debug)]
    struct Upcase;

    impl Caster for Upcase {
        fn type_name(&self) -> &str {
            "upcase"
        }

        fn cast(&self, value: Value) -> Result<Value, CastError> {
            match value {
                Value::String(s) => Ok(Value::String(s.to_uppercase())),
                Value::Null => Ok(Value::Null),
                other => Err(CastError::incompatible("upcase", &other, "expected a string")),
            }
        }
    }

    #[test]
    fn test_custom_types_can_be_plugged_in() {
        let registry = TypeRegistry::with_builtins();
        registry.register("upcase", |_| Ok(Arc::new(Upcase) as Arc<dyn Caster>));
        let caster = registry.lookup("upcase", &CastOptions::new()).unwrap();
        assert_eq!(caster.cast(json!("main st")).unwrap(), json!("MAIN ST"));
    }
}
