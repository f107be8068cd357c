//! # Collection Embedding
//!
//! [`EmbedMany`] binds a host's raw field holding a sequence of maps to an
//! ordered sequence of readonly documents. Element `i` of the cached
//! sequence is always built from raw element `i`; nothing is reordered or
//! deduplicated.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use embedoc_core::{kind_name, Validations, MESSAGE_REQUIRED};
use embedoc_document::{Document, DocumentClass};

use crate::cascade::cascade_many;
use crate::error::EmbedError;
use crate::host::{HostRecord, RawFieldBridge};
use crate::one::{Condition, MemoAccessor};
use crate::options::EmbedOptions;
use crate::target::{expect_object, extract, materialize, DocumentRef, EmbedValue};

/// Cache contents of a collection embedding: `None` is the absent marker.
pub type ManyCache = Option<Arc<Vec<Document>>>;

/// A document-collection embedding declared on host type `H`.
pub struct EmbedMany<H> {
    name: String,
    target: DocumentRef,
    options: EmbedOptions,
    bridge: RawFieldBridge<H>,
    memo: MemoAccessor<H, ManyCache>,
    condition: Option<Condition<H>>,
}

impl<H> Clone for EmbedMany<H> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            target: self.target.clone(),
            options: self.options,
            bridge: self.bridge.clone(),
            memo: self.memo,
            condition: self.condition.clone(),
        }
    }
}

impl<H> fmt::Debug for EmbedMany<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbedMany")
            .field("name", &self.name)
            .field("target", &self.target)
            .field("options", &self.options)
            .field("bridge", &self.bridge)
            .finish()
    }
}

impl<H: HostRecord> EmbedMany<H> {
    /// Declare collection embedding `name` of `target`, cached in the slot
    /// `memo` returns. The raw field shares the embedding's name.
    pub fn new(
        name: &str,
        target: impl Into<DocumentRef>,
        memo: MemoAccessor<H, ManyCache>,
    ) -> Self {
        Self {
            name: name.to_string(),
            target: target.into(),
            options: EmbedOptions::default(),
            bridge: RawFieldBridge::new(name),
            memo,
            condition: None,
        }
    }

    /// Replace the declaration options.
    pub fn options(mut self, options: EmbedOptions) -> Self {
        self.options = options;
        self
    }

    /// Reach the raw field through a plain accessor pair.
    pub fn with_accessors<R, W>(mut self, reader: R, writer: W) -> Self
    where
        R: Fn(&H) -> Value + Send + Sync + 'static,
        W: Fn(&mut H, Value) + Send + Sync + 'static,
    {
        self.bridge = self.bridge.with_accessors(reader, writer);
        self
    }

    /// Only cascade validation when `condition` holds for the host.
    pub fn validate_if<F>(mut self, condition: F) -> Self
    where
        F: Fn(&H) -> bool + Send + Sync + 'static,
    {
        self.condition = Some(Arc::new(condition));
        self
    }

    /// The embedding name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The document class reference.
    pub fn target(&self) -> &DocumentRef {
        &self.target
    }

    /// The declaration options.
    pub fn declared_options(&self) -> EmbedOptions {
        self.options
    }

    /// Read the embedded documents, materializing them on first use.
    ///
    /// The class is resolved on every call, cached or not, so a named class
    /// that stops resolving is reported even after a successful read.
    pub fn read(&self, host: &H) -> Result<ManyCache, EmbedError> {
        let class = self.target.resolve()?;
        let slot = (self.memo)(host);
        if let Some(cached) = slot.get() {
            tracing::trace!(embedding = %self.name, "memo hit");
            return Ok(cached);
        }
        slot.get_or_try_init(|| self.load(host, &class))
    }

    fn load(&self, host: &H, class: &Arc<DocumentClass>) -> Result<ManyCache, EmbedError> {
        let items = match self.bridge.read(host)? {
            Value::Null => {
                tracing::debug!(embedding = %self.name, "raw field absent");
                return Ok(None);
            }
            Value::Array(items) => items,
            other => {
                return Err(EmbedError::MalformedRawField {
                    field: self.name.clone(),
                    expected: "an array of objects",
                    actual: kind_name(&other),
                })
            }
        };
        let docs = items
            .iter()
            .map(|item| materialize(class, expect_object(&self.name, item)?.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(
            embedding = %self.name,
            class = %class.name(),
            count = docs.len(),
            "materialized embedded documents"
        );
        Ok(Some(Arc::new(docs)))
    }

    /// Assign the collection and return the freshly cached value.
    ///
    /// Each element is a document or a raw map, as for a single embedding.
    /// An absent element is rejected. On error neither the raw field nor
    /// the cache changes.
    pub fn write<I, V>(&self, host: &mut H, values: Option<I>) -> Result<ManyCache, EmbedError>
    where
        I: IntoIterator<Item = V>,
        V: Into<EmbedValue>,
    {
        let class = self.target.resolve()?;
        let Some(values) = values else {
            self.bridge.write(host, Value::Null)?;
            (self.memo)(host).replace(None);
            tracing::debug!(embedding = %self.name, present = false, "embedded documents replaced");
            return Ok(None);
        };

        let mut maps = Vec::new();
        for value in values {
            let map = extract(&class, value.into())?.ok_or_else(|| EmbedError::MalformedRawField {
                field: self.name.clone(),
                expected: "an object",
                actual: "null",
            })?;
            maps.push(map);
        }
        let docs = maps
            .iter()
            .map(|map| materialize(&class, map.clone()))
            .collect::<Result<Vec<_>, _>>()?;

        self.bridge
            .write(host, Value::Array(maps.into_iter().map(Value::Object).collect()))?;
        let docs = Some(Arc::new(docs));
        (self.memo)(host).replace(docs.clone());
        tracing::debug!(embedding = %self.name, present = true, "embedded documents replaced");
        Ok(docs)
    }

    /// Clear the collection.
    pub fn clear(&self, host: &mut H) -> Result<(), EmbedError> {
        self.write(host, None::<Vec<EmbedValue>>).map(|_| ())
    }

    /// Register this embedding's presence and cascade rules on the host.
    ///
    /// An absent or empty collection fails the presence rule.
    pub fn install(&self, validations: &mut Validations<H, EmbedError>)
    where
        H: 'static,
    {
        if !self.options.optional {
            let embed = self.clone();
            validations.add(format!("presence:{}", self.name), move |host, errors| {
                if embed.read(host)?.map_or(true, |docs| docs.is_empty()) {
                    errors.add(embed.name.as_str(), MESSAGE_REQUIRED);
                }
                Ok(())
            });
        }
        if self.options.validate {
            let embed = self.clone();
            validations.add(format!("cascade:{}", self.name), move |host, errors| {
                if embed.condition.as_ref().is_some_and(|holds| !holds(host)) {
                    return Ok(());
                }
                let docs = embed.read(host)?;
                cascade_many(&embed.name, docs.as_deref().map(Vec::as_slice), errors)?;
                Ok(())
            });
        }
    }
}
