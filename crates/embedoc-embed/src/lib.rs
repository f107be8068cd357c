//! # embedoc-embed — Embedded Documents on Host Records
//!
//! Binds a host record's raw field to typed, readonly documents:
//!
//! - [`EmbedOne`]: a raw map backs one [`Document`](embedoc_document::Document).
//! - [`EmbedMany`]: a raw array of maps backs an ordered sequence of them.
//!
//! The raw field is the source of truth. Documents are derived views,
//! materialized on first read and cached in a per-host [`MemoSlot`] until
//! the embedding's writer replaces them.
//!
//! Installed on a host's [`Validations`](embedoc_core::Validations), an
//! embedding adds a presence rule (`required`) when it is not optional and
//! a cascade rule that republishes the documents' own failures under
//! `name.attribute` or `name[i].attribute`.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use embedoc_core::Validations;
//! use embedoc_document::DocumentClass;
//! use embedoc_embed::{EmbedOne, HostRecord, MemoSlot, OneCache};
//! use serde_json::{json, Value};
//!
//! #[derive(Default)]
//! struct Customer {
//!     address: Value,
//!     address_memo: MemoSlot<OneCache>,
//! }
//!
//! impl HostRecord for Customer {}
//!
//! fn address_memo(customer: &Customer) -> &MemoSlot<OneCache> {
//!     &customer.address_memo
//! }
//!
//! let address = DocumentClass::new("Address");
//! address.attribute("street", "string")?.attribute("zip", "integer")?;
//! address.validates_presence_of("street");
//!
//! let embed = EmbedOne::new("address", address, address_memo)
//!     .with_accessors(|c| c.address.clone(), |c, v| c.address = v);
//! let mut validations = Validations::new();
//! embed.install(&mut validations);
//!
//! let mut customer = Customer::default();
//! embed.write(&mut customer, json!({"zip": "123"}).as_object().cloned())?;
//! let doc = embed.read(&customer)?.expect("assigned above");
//! assert_eq!(doc.read_attribute("zip")?, json!(123));
//!
//! let errors = validations.run(&customer)?;
//! assert_eq!(errors.on("address.street"), vec!["blank"]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cascade;
pub mod error;
pub mod host;
pub mod many;
pub mod memo;
pub mod one;
pub mod options;
pub mod target;

pub use cascade::{cascade_many, cascade_one, many_key, one_key};
pub use error::EmbedError;
pub use host::{HostRecord, RawFieldBridge, RawReader, RawWriter};
pub use many::{EmbedMany, ManyCache};
pub use memo::MemoSlot;
pub use one::{Condition, EmbedOne, MemoAccessor, OneCache};
pub use options::EmbedOptions;
pub use target::{DocumentRef, EmbedValue};
