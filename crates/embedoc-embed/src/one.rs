//! # Single Embedding
//!
//! [`EmbedOne`] binds a host's raw field holding one map to a readonly
//! [`Document`].
//!
//! ## Reader
//!
//! Every read resolves the class. On first read the raw field is then read
//! through the bridge, and a readonly document is built over a copy of the
//! map (or the absent marker is recorded when the field is null). Later
//! reads return the cached `Arc` until the writer runs.
//!
//! ## Writer
//!
//! The writer accepts a document (its attribute snapshot is stored) or a
//! raw map (cast through the class's attribute types), writes the map
//! through the bridge, and caches a fresh readonly document built from it.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use embedoc_core::{Validations, MESSAGE_REQUIRED};
use embedoc_document::{Document, DocumentClass};

use crate::cascade::cascade_one;
use crate::error::EmbedError;
use crate::host::{HostRecord, RawFieldBridge};
use crate::memo::MemoSlot;
use crate::options::EmbedOptions;
use crate::target::{expect_object, extract, materialize, DocumentRef, EmbedValue};

/// Cache contents of a single embedding: `None` is the absent marker.
pub type OneCache = Option<Arc<Document>>;

/// Locates an embedding's memo slot on a host.
pub type MemoAccessor<H, T> = fn(&H) -> &MemoSlot<T>;

/// Host predicate gating a cascade.
pub type Condition<H> = Arc<dyn Fn(&H) -> bool + Send + Sync>;

/// A single-document embedding declared on host type `H`.
pub struct EmbedOne<H> {
    name: String,
    target: DocumentRef,
    options: EmbedOptions,
    bridge: RawFieldBridge<H>,
    memo: MemoAccessor<H, OneCache>,
    condition: Option<Condition<H>>,
}

impl<H> Clone for EmbedOne<H> {
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

impl<H> fmt::Debug for EmbedOne<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbedOne")
            .field("name", &self.name)
            .field("target", &self.target)
            .field("options", &self.options)
            .field("bridge", &self.bridge)
            .finish()
    }
}

impl<H: HostRecord> EmbedOne<H> {
    /// Declare embedding `name` of `target`, cached in the slot `memo`
    /// returns. The raw field shares the embedding's name.
    pub fn new(
        name: &str,
        target: impl Into<DocumentRef>,
        memo: MemoAccessor<H, OneCache>,
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

    /// Reach the raw field through a plain accessor pair when the host has
    /// no structured attribute of that name.
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

    /// Read the embedded document, materializing it on first use.
    ///
    /// The class is resolved on every call, cached or not, so a named class
    /// that stops resolving is reported even after a successful read.
    pub fn read(&self, host: &H) -> Result<OneCache, EmbedError> {
        let class = self.target.resolve()?;
        let slot = (self.memo)(host);
        if let Some(cached) = slot.get() {
            tracing::trace!(embedding = %self.name, "memo hit");
            return Ok(cached);
        }
        slot.get_or_try_init(|| self.load(host, &class))
    }

    fn load(&self, host: &H, class: &Arc<DocumentClass>) -> Result<OneCache, EmbedError> {
        let raw = self.bridge.read(host)?;
        if raw.is_null() {
            tracing::debug!(embedding = %self.name, "raw field absent");
            return Ok(None);
        }
        let map = expect_object(&self.name, &raw)?.clone();
        let doc = materialize(class, map)?;
        tracing::debug!(
            embedding = %self.name,
            class = %class.name(),
            "materialized embedded document"
        );
        Ok(Some(Arc::new(doc)))
    }

    /// Assign the embedded document and return the freshly cached value.
    ///
    /// # Errors
    ///
    /// Class resolution, `ClassMismatch` for a document of an unrelated
    /// class, casting failures, and bridge failures. The raw field and the
    /// cache are left untouched on error.
    pub fn write(
        &self,
        host: &mut H,
        value: impl Into<EmbedValue>,
    ) -> Result<OneCache, EmbedError> {
        let class = self.target.resolve()?;
        let map = extract(&class, value.into())?;
        let doc = map
            .clone()
            .map(|map| materialize(&class, map))
            .transpose()?
            .map(Arc::new);
        self.bridge
            .write(host, map.map_or(Value::Null, Value::Object))?;
        (self.memo)(host).replace(doc.clone());
        tracing::debug!(
            embedding = %self.name,
            present = doc.is_some(),
            "embedded document replaced"
        );
        Ok(doc)
    }

    /// Register this embedding's presence and cascade rules on the host.
    ///
    /// The presence rule is added when the embedding is not optional; the
    /// cascade rule when validation is enabled. Rules run in the order they
    /// are installed.
    pub fn install(&self, validations: &mut Validations<H, EmbedError>)
    where
        H: 'static,
    {
        if !self.options.optional {
            let embed = self.clone();
            validations.add(format!("presence:{}", self.name), move |host, errors| {
                if embed.read(host)?.is_none() {
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
                let doc = embed.read(host)?;
                cascade_one(&embed.name, doc.as_deref(), errors)?;
                Ok(())
            });
        }
    }
}
