//! Integration test: embeddings on a host record end to end.
//!
//! The `Customer` host keeps its raw fields in a column map exposed as
//! structured attributes, the way a persisted record would, and declares
//! one single embedding (`address`) and one collection (`addresses`).

use std::sync::{Arc, OnceLock};

use embedoc_core::{CastOptions, Errors, RawAttributes, Validations};
use embedoc_document::{AttributeDefault, ClassRegistry, Document, DocumentClass};
use embedoc_embed::{
    DocumentRef, EmbedError, EmbedMany, EmbedOne, EmbedOptions, EmbedValue, HostRecord, ManyCache,
    MemoSlot, OneCache,
};
use proptest::prelude::*;
use serde_json::{json, Value};

// -----------------------------------------------------------------------
// Fixtures
// -----------------------------------------------------------------------

#[derive(Default, Clone)]
struct Customer {
    columns: RawAttributes,
    address_memo: MemoSlot<OneCache>,
    addresses_memo: MemoSlot<ManyCache>,
}

impl HostRecord for Customer {
    fn record_name(&self) -> &str {
        "Customer"
    }

    fn has_attribute(&self, name: &str) -> bool {
        matches!(name, "address" | "addresses")
    }

    fn read_attribute(&self, name: &str) -> Value {
        self.columns.get(name).cloned().unwrap_or(Value::Null)
    }

    fn write_attribute(&mut self, name: &str, value: Value) {
        self.columns.insert(name.to_string(), value);
    }
}

fn address_memo(customer: &Customer) -> &MemoSlot<OneCache> {
    &customer.address_memo
}

fn addresses_memo(customer: &Customer) -> &MemoSlot<ManyCache> {
    &customer.addresses_memo
}

fn address_class() -> &'static Arc<DocumentClass> {
    static CLASS: OnceLock<Arc<DocumentClass>> = OnceLock::new();
    CLASS.get_or_init(|| {
        let class = DocumentClass::new("Address");
        class
            .attribute("street", "string")
            .and_then(|c| {
                c.attribute_with("zip", "integer", AttributeDefault::value(0), &CastOptions::new())
            })
            .expect("address attributes");
        class.validates_presence_of("street");
        class
    })
}

/// Log materialization events with `RUST_LOG=embedoc_embed=debug`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn raw(value: Value) -> RawAttributes {
    value.as_object().cloned().unwrap()
}

fn address(options: EmbedOptions) -> EmbedOne<Customer> {
    EmbedOne::new("address", Arc::clone(address_class()), address_memo).options(options)
}

fn addresses(options: EmbedOptions) -> EmbedMany<Customer> {
    EmbedMany::new("addresses", Arc::clone(address_class()), addresses_memo).options(options)
}

fn run(embed: &EmbedOne<Customer>, customer: &Customer) -> Errors {
    let mut validations = Validations::new();
    embed.install(&mut validations);
    validations.run(customer).unwrap()
}

// -----------------------------------------------------------------------
// Single embedding
// -----------------------------------------------------------------------

#[test]
fn test_assign_map_then_read_cached_readonly_document() {
    init_tracing();
    let embed = address(EmbedOptions::default());
    let mut customer = Customer::default();
    embed
        .write(&mut customer, raw(json!({"street": "Main St", "zip": "123"})))
        .unwrap();

    let doc = embed.read(&customer).unwrap().unwrap();
    assert!(doc.is_readonly());
    assert_eq!(doc.get::<i64>("zip").unwrap(), 123);
    assert_eq!(customer.columns["address"], json!({"street": "Main St", "zip": 123}));

    let again = embed.read(&customer).unwrap().unwrap();
    assert!(Arc::ptr_eq(&doc, &again));

    embed
        .write(&mut customer, raw(json!({"street": "Elm"})))
        .unwrap();
    let replaced = embed.read(&customer).unwrap().unwrap();
    assert!(!Arc::ptr_eq(&doc, &replaced));
    assert_eq!(replaced.get::<String>("street").unwrap(), "Elm");
}

#[test]
fn test_assign_document_stores_snapshot() {
    let embed = address(EmbedOptions::default());
    let mut customer = Customer::default();
    let doc =
        Document::build(Arc::clone(address_class()), raw(json!({"street": "Main St"}))).unwrap();
    let cached = embed.write(&mut customer, doc.clone()).unwrap().unwrap();

    assert_eq!(customer.columns["address"], json!({"street": "Main St", "zip": 0}));
    assert_eq!(*cached, doc);
    assert!(!doc.is_readonly());
}

#[test]
fn test_cached_document_rejects_writes() {
    let embed = address(EmbedOptions::default());
    let mut customer = Customer::default();
    embed.write(&mut customer, raw(json!({"street": "A"}))).unwrap();
    let doc = embed.read(&customer).unwrap().unwrap();

    let mut copy = Document::clone(&doc);
    assert!(copy.write_attribute("street", "B").is_err());
    let mut editable = doc.dup();
    editable.write_attribute("street", "B").unwrap();
    embed.write(&mut customer, editable).unwrap();
    assert_eq!(customer.columns["address"]["street"], json!("B"));
}

#[test]
fn test_absent_optional_address_is_valid() {
    let embed = address(EmbedOptions::default());
    let mut customer = Customer::default();
    embed.write(&mut customer, EmbedValue::Absent).unwrap();
    assert!(embed.read(&customer).unwrap().is_none());
    assert_eq!(customer.columns["address"], Value::Null);
    assert!(run(&embed, &customer).is_empty());
}

#[test]
fn test_absent_required_address_is_reported() {
    let embed = address(EmbedOptions::default().required());
    let customer = Customer::default();
    let errors = run(&embed, &customer);
    assert_eq!(errors.on("address"), vec!["required"]);
    assert_eq!(errors.len(), 1);
}

#[test]
fn test_invalid_address_cascades_to_host() {
    let embed = address(EmbedOptions::default());
    let mut customer = Customer::default();
    embed.write(&mut customer, raw(json!({"street": null}))).unwrap();

    let errors = run(&embed, &customer);
    assert_eq!(errors.on("address.street"), vec!["blank"]);

    let quiet = address(EmbedOptions::default().without_validation());
    assert!(run(&quiet, &customer).is_empty());
}

#[test]
fn test_conditional_cascade() {
    let embed = address(EmbedOptions::default())
        .validate_if(|customer: &Customer| customer.columns.get("active") == Some(&json!(true)));
    let mut customer = Customer::default();
    embed.write(&mut customer, raw(json!({"street": ""}))).unwrap();
    assert!(run(&embed, &customer).is_empty());

    customer.columns.insert("active".into(), json!(true));
    assert_eq!(run(&embed, &customer).keys(), vec!["address.street"]);
}

#[test]
fn test_cascade_does_not_touch_the_document() {
    let embed = address(EmbedOptions::default());
    let mut customer = Customer::default();
    embed.write(&mut customer, raw(json!({"street": null}))).unwrap();
    let before = embed.read(&customer).unwrap().unwrap();
    run(&embed, &customer);
    let after = embed.read(&customer).unwrap().unwrap();
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(customer.columns["address"], json!({"street": null}));
}

#[test]
fn test_cloned_host_gets_a_fresh_cache() {
    let embed = address(EmbedOptions::default());
    let mut customer = Customer::default();
    embed.write(&mut customer, raw(json!({"street": "A"}))).unwrap();
    let original = embed.read(&customer).unwrap().unwrap();

    let twin = customer.clone();
    let copy = embed.read(&twin).unwrap().unwrap();
    assert!(!Arc::ptr_eq(&original, &copy));
    assert_eq!(*original, *copy);
}

// -----------------------------------------------------------------------
// Class resolution
// -----------------------------------------------------------------------

#[test]
fn test_forward_reference_resolves_at_first_use() {
    init_tracing();
    let base = DocumentClass::new("ApplicationDocument");
    let registry = Arc::new(ClassRegistry::with_base(Arc::clone(&base)));
    let embed = EmbedOne::new("address", DocumentRef::named("Address", &registry), address_memo);

    let mut customer = Customer::default();
    let err = embed.write(&mut customer, raw(json!({"street": "A"}))).unwrap_err();
    assert!(matches!(err, EmbedError::UnknownDocumentClass(_)));
    assert!(!customer.columns.contains_key("address"));

    let class = DocumentClass::inherit("Address", &base);
    class.attribute("street", "string").unwrap();
    registry.register(class);
    embed.write(&mut customer, raw(json!({"street": "A"}))).unwrap();
    assert_eq!(
        embed.read(&customer).unwrap().unwrap().class_name(),
        "Address"
    );
}

#[test]
fn test_class_outside_base_is_unknown() {
    let registry = Arc::new(ClassRegistry::with_base(DocumentClass::new("ApplicationDocument")));
    registry.register(DocumentClass::new("Address"));
    let embed = EmbedOne::new("address", DocumentRef::named("Address", &registry), address_memo);
    let customer = Customer {
        columns: raw(json!({"address": {}})),
        ..Customer::default()
    };
    assert!(matches!(
        embed.read(&customer),
        Err(EmbedError::UnknownDocumentClass(_))
    ));
}

#[test]
fn test_cached_read_still_resolves_class() {
    let base = DocumentClass::new("ApplicationDocument");
    let registry = Arc::new(ClassRegistry::with_base(Arc::clone(&base)));
    let class = DocumentClass::inherit("Address", &base);
    class.attribute("street", "string").unwrap();
    registry.register(class);
    let embed = EmbedOne::new("address", DocumentRef::named("Address", &registry), address_memo);

    let mut customer = Customer::default();
    embed.write(&mut customer, raw(json!({"street": "A"}))).unwrap();
    assert!(embed.read(&customer).unwrap().is_some());

    registry.register(DocumentClass::new("Address"));
    assert!(matches!(
        embed.read(&customer),
        Err(EmbedError::UnknownDocumentClass(_))
    ));
}

#[test]
fn test_subclass_document_is_stored_as_declared_class() {
    let embed = address(EmbedOptions::default());
    let home = DocumentClass::inherit("HomeAddress", address_class());
    home.attribute("door_code", "string").unwrap();
    let doc =
        Document::build(home, raw(json!({"street": "Main St", "door_code": "1234"}))).unwrap();

    let mut customer = Customer::default();
    let stored = embed.write(&mut customer, doc).unwrap().unwrap();
    assert_eq!(customer.columns["address"], json!({"street": "Main St", "zip": 0}));
    assert!(Arc::ptr_eq(stored.class(), address_class()));
    assert_eq!(stored.get::<String>("street").unwrap(), "Main St");
}

#[test]
fn test_document_of_other_class_is_rejected() {
    let embed = address(EmbedOptions::default());
    let mut customer = Customer::default();
    let invoice = DocumentClass::new("Invoice");
    let doc = Document::new(invoice, RawAttributes::new()).unwrap();
    assert!(matches!(
        embed.write(&mut customer, doc),
        Err(EmbedError::ClassMismatch { .. })
    ));
}

// -----------------------------------------------------------------------
// Raw-field bridge
// -----------------------------------------------------------------------

#[derive(Default)]
struct Legacy {
    payload: Value,
    memo: MemoSlot<OneCache>,
}

impl HostRecord for Legacy {}

fn legacy_memo(legacy: &Legacy) -> &MemoSlot<OneCache> {
    &legacy.memo
}

#[test]
fn test_accessor_pair_fallback() {
    let embed = EmbedOne::new("address", Arc::clone(address_class()), legacy_memo)
        .with_accessors(|l| l.payload.clone(), |l, v| l.payload = v);
    let mut legacy = Legacy::default();
    embed.write(&mut legacy, raw(json!({"street": "A"}))).unwrap();
    assert_eq!(legacy.payload, json!({"street": "A"}));

    let bare = EmbedOne::new("address", Arc::clone(address_class()), legacy_memo);
    let err = bare.read(&Legacy::default()).unwrap_err();
    assert!(matches!(err, EmbedError::MissingRawField { ref field, .. } if field == "address"));
}

// -----------------------------------------------------------------------
// Collection embedding
// -----------------------------------------------------------------------

#[test]
fn test_collection_cascade_reports_invalid_elements_only() {
    let embed = addresses(EmbedOptions::default());
    let mut customer = Customer::default();
    embed
        .write(
            &mut customer,
            Some(vec![raw(json!({"street": "A"})), raw(json!({"street": null}))]),
        )
        .unwrap();

    let mut validations = Validations::new();
    embed.install(&mut validations);
    let errors = validations.run(&customer).unwrap();
    assert_eq!(errors.on("addresses[1].street"), vec!["blank"]);
    assert!(!errors.contains_key("addresses[0].street"));
    assert_eq!(errors.len(), 1);
}

#[test]
fn test_host_rules_run_in_declaration_order() {
    let mut validations: Validations<Customer, EmbedError> = Validations::new();
    validations.add("name", |customer, errors| {
        if !customer.columns.contains_key("name") {
            errors.add("name", "blank");
        }
        Ok(())
    });
    address(EmbedOptions::default().required()).install(&mut validations);
    addresses(EmbedOptions::default()).install(&mut validations);

    let mut customer = Customer::default();
    addresses(EmbedOptions::default())
        .write(&mut customer, Some(vec![raw(json!({"street": " "}))]))
        .unwrap();

    let errors = validations.run(&customer).unwrap();
    assert_eq!(
        errors.to_string(),
        "name: blank; address: required; addresses[0].street: blank"
    );
}

fn streets() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec("[a-z]{1,8}", 0..8)
}

proptest! {
    #[test]
    fn prop_collection_order_follows_raw_order(streets in streets(), seed in any::<u64>()) {
        let embed = addresses(EmbedOptions::default());
        let to_raw = |streets: &[String]| -> Value {
            Value::Array(streets.iter().map(|s| json!({"street": s})).collect())
        };

        let customer = Customer {
            columns: raw(json!({"addresses": to_raw(&streets)})),
            ..Customer::default()
        };
        let docs = embed.read(&customer).unwrap().unwrap();
        let read: Vec<String> = docs.iter().map(|d| d.get("street").unwrap()).collect();
        prop_assert_eq!(&read, &streets);

        let mut reordered = streets.clone();
        if !reordered.is_empty() {
            let len = reordered.len();
            reordered.rotate_left((seed as usize) % len);
        }
        let shuffled = Customer {
            columns: raw(json!({"addresses": to_raw(&reordered)})),
            ..Customer::default()
        };
        let docs = embed.read(&shuffled).unwrap().unwrap();
        let read: Vec<String> = docs.iter().map(|d| d.get("street").unwrap()).collect();
        prop_assert_eq!(read, reordered);
    }
}
