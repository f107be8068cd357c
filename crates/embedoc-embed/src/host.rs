//! # Host Records and the Raw-Field Bridge
//!
//! A host owns the raw field an embedding reads and writes. Two ways of
//! reaching that field are supported, probed in this order:
//!
//! 1. **Structured attributes.** A host implementing
//!    [`HostRecord::has_attribute`] for the field name is read and written
//!    through [`HostRecord::read_attribute`] / [`HostRecord::write_attribute`].
//! 2. **Accessor pair.** Otherwise the embedding uses the plain reader and
//!    writer given at declaration time.
//!
//! When neither is available the embedding fails with
//! [`EmbedError::MissingRawField`]. `Value::Null` is the absent raw value.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::EmbedError;

/// A record that stores embedded data in raw fields.
///
/// All methods have defaults, so a host using only accessor pairs can
/// implement the trait with an empty body.
pub trait HostRecord {
    /// Name used in error messages.
    fn record_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Whether `name` is a structured attribute of this record.
    fn has_attribute(&self, _name: &str) -> bool {
        false
    }

    /// The raw value of structured attribute `name`.
    fn read_attribute(&self, _name: &str) -> Value {
        Value::Null
    }

    /// Store the raw value of structured attribute `name`.
    fn write_attribute(&mut self, _name: &str, _value: Value) {}
}

/// Plain raw-field reader.
pub type RawReader<H> = Arc<dyn Fn(&H) -> Value + Send + Sync>;

/// Plain raw-field writer.
pub type RawWriter<H> = Arc<dyn Fn(&mut H, Value) + Send + Sync>;

/// Reaches one raw field on a host.
pub struct RawFieldBridge<H> {
    field: String,
    accessors: Option<(RawReader<H>, RawWriter<H>)>,
}

impl<H> Clone for RawFieldBridge<H> {
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
            accessors: self.accessors.clone(),
        }
    }
}

impl<H> fmt::Debug for RawFieldBridge<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawFieldBridge")
            .field("field", &self.field)
            .field("accessors", &self.accessors.is_some())
            .finish()
    }
}

impl<H: HostRecord> RawFieldBridge<H> {
    /// A bridge using structured attributes only.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            accessors: None,
        }
    }

    /// Fall back to `reader` / `writer` when the host has no structured
    /// attribute for the field.
    pub fn with_accessors<R, W>(mut self, reader: R, writer: W) -> Self
    where
        R: Fn(&H) -> Value + Send + Sync + 'static,
        W: Fn(&mut H, Value) + Send + Sync + 'static,
    {
        self.accessors = Some((Arc::new(reader), Arc::new(writer)));
        self
    }

    /// The raw field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Read the raw field.
    pub fn read(&self, host: &H) -> Result<Value, EmbedError> {
        if host.has_attribute(&self.field) {
            return Ok(host.read_attribute(&self.field));
        }
        match &self.accessors {
            Some((reader, _)) => Ok(reader(host)),
            None => Err(self.missing(host)),
        }
    }

    /// Write the raw field.
    pub fn write(&self, host: &mut H, value: Value) -> Result<(), EmbedError> {
        if host.has_attribute(&self.field) {
            host.write_attribute(&self.field, value);
            return Ok(());
        }
        match &self.accessors {
            Some((_, writer)) => {
                writer(host, value);
                Ok(())
            }
            None => Err(self.missing(host)),
        }
    }

    fn missing(&self, host: &H) -> EmbedError {
        EmbedError::MissingRawField {
            host: host.record_name().to_string(),
            field: self.field.clone(),
        }
    }
}
