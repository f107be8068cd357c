//! # Class Descriptors
//!
//! Declarative form of a document class, loadable from YAML:
//!
//! ```yaml
//! - name: Address
//!   attributes:
//!     - { name: street }
//!     - { name: zip, type: integer, default: 0 }
//!   validates:
//!     - presence: street
//! - name: HomeAddress
//!   extends: Address
//!   attributes:
//!     - { name: door_code, type: string, options: { limit: 8 } }
//! ```
//!
//! Descriptors are data only. [`ClassRegistry::define`](crate::ClassRegistry::define)
//! turns one into a live [`DocumentClass`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use embedoc_core::CastOptions;

use crate::attribute::AttributeDefault;
use crate::class::DocumentClass;
use crate::error::{DocumentError, RegistryError};

fn default_type() -> String {
    "string".to_string()
}

/// One document class in declarative form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassDescriptor {
    /// Class name.
    pub name: String,
    /// Name of an already registered parent class.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    /// Attribute declarations, applied in order.
    #[serde(default)]
    pub attributes: Vec<AttributeDecl>,
    /// Validation rules, applied in order. Each is a single-key map.
    #[serde(default, with = "serde_yaml::with::singleton_map_recursive")]
    pub validates: Vec<RuleDecl>,
}

/// One attribute declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeDecl {
    /// Attribute name.
    pub name: String,
    /// Registered type name; `string` when omitted.
    #[serde(rename = "type", default = "default_type")]
    pub type_name: String,
    /// Literal default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Attribute or method the default is delegated to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_from: Option<String>,
    /// Options forwarded to the type lookup.
    #[serde(default, skip_serializing_if = "CastOptions::is_empty")]
    pub options: CastOptions,
}

impl AttributeDecl {
    fn default_policy(&self) -> Result<AttributeDefault, RegistryError> {
        match (&self.default, &self.default_from) {
            (Some(_), Some(_)) => Err(RegistryError::Descriptor {
                reason: format!(
                    "attribute '{}' declares both default and default_from",
                    self.name
                ),
            }),
            (Some(value), None) => Ok(AttributeDefault::Value(value.clone())),
            (None, Some(target)) => Ok(AttributeDefault::Delegate(target.clone())),
            (None, None) => Ok(AttributeDefault::None),
        }
    }
}

/// A declarative validation rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleDecl {
    /// The attribute must not be blank.
    Presence(String),
    /// String or array length bounds.
    Length {
        attribute: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<usize>,
    },
    /// The attribute must equal one of the listed values.
    Inclusion {
        attribute: String,
        #[serde(rename = "in")]
        allowed: Vec<Value>,
    },
}

impl ClassDescriptor {
    /// Parse a single descriptor from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, RegistryError> {
        serde_yaml::from_str(yaml).map_err(|e| RegistryError::Descriptor {
            reason: format!("failed to parse class YAML: {e}"),
        })
    }

    /// Parse a sequence of descriptors from YAML.
    pub fn list_from_yaml(yaml: &str) -> Result<Vec<Self>, RegistryError> {
        serde_yaml::from_str(yaml).map_err(|e| RegistryError::Descriptor {
            reason: format!("failed to parse class YAML: {e}"),
        })
    }

    /// Apply attributes and rules to `class`.
    pub(crate) fn apply_to(&self, class: &Arc<DocumentClass>) -> Result<(), RegistryError> {
        for decl in &self.attributes {
            let default = decl.default_policy()?;
            class
                .attribute_with(&decl.name, &decl.type_name, default, &decl.options)
                .map_err(DocumentError::from)?;
        }
        for rule in &self.validates {
            let attribute = match rule {
                RuleDecl::Presence(attribute)
                | RuleDecl::Length { attribute, .. }
                | RuleDecl::Inclusion { attribute, .. } => attribute,
            };
            if !class.has_attribute(attribute) {
                return Err(DocumentError::UnknownAttribute {
                    class: class.name().to_string(),
                    attribute: attribute.clone(),
                }
                .into());
            }
            match rule {
                RuleDecl::Presence(attribute) => {
                    class.validates_presence_of(attribute);
                }
                RuleDecl::Length { attribute, min, max } => {
                    class.validates_length_of(attribute, *min, *max);
                }
                RuleDecl::Inclusion { attribute, allowed } => {
                    class.validates_inclusion_of(attribute, allowed.clone());
                }
            }
        }
        Ok(())
    }
}
