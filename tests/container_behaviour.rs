//! Option container behaviour
//!
//! Defaults, get/set/update semantics, schema inheritance and rendering.

use std::sync::Arc;

use serde_json::json;
use tg_option_container::{Error, OptionContainer, OptionDef, Schema, Value};

fn host_schema(default: impl Into<Value>) -> Arc<Schema> {
    Schema::builder("A")
        .option(OptionDef::string("host", default))
        .build()
}

// =============================================================================
// Lookup and defaults
// =============================================================================

#[test]
fn test_timeout_retries_example() {
    let schema = Schema::builder("Client")
        .option(OptionDef::integer("timeout", 30))
        .option(OptionDef::integer("retries", 3))
        .build();

    let mut client = schema.instantiate([("timeout", 30)]).unwrap();
    assert_eq!(client.get("timeout").unwrap(), &Value::from(30));
    assert_eq!(client.get_or("retries", &Value::from(3)), &Value::from(3));

    client.set("retries", 5).unwrap();
    assert_eq!(client.get("retries").unwrap(), &Value::from(5));
}

#[test]
fn test_absent_key_uses_supplied_default() {
    let container = OptionContainer::new(&host_schema("some.where")).unwrap();
    let default = Value::from(3);

    assert_eq!(container.get_or("retries", &default), &default);
    assert!(!container.has("retries"));
    assert!(matches!(container.get("retries"), Err(Error::KeyNotFound(ref k)) if k == "retries"));
}

#[test]
fn test_set_then_get_for_each_kind() {
    let schema = Schema::builder("Everything")
        .option(OptionDef::new("any", Value::Null))
        .option(OptionDef::string("s", ""))
        .option(OptionDef::integer("i", 0))
        .option(OptionDef::float("f", 0.0))
        .option(OptionDef::boolean("b", false))
        .option(OptionDef::list("l", Vec::<Value>::new()))
        .build();
    let mut container = OptionContainer::new(&schema).unwrap();

    let cases = [
        ("any", Value::from(json!({"nested": [1, 2]}))),
        ("s", Value::from("text")),
        ("i", Value::from(-7)),
        ("f", Value::from(2.5)),
        ("b", Value::from(true)),
        ("l", Value::from(vec!["a", "b"])),
    ];
    for (key, value) in cases {
        container.set(key, value.clone()).unwrap();
        assert_eq!(container.get(key).unwrap(), &value, "{}", key);
    }
}

// =============================================================================
// Generic get/set behaviour
// =============================================================================

#[test]
fn test_generic_works() {
    let schema = host_schema("some.where");
    let first = OptionContainer::new(&schema).unwrap();
    let mut second = schema.instantiate([("host", "other.place")]).unwrap();

    assert_eq!(first["host"], Value::from("some.where"));
    assert_eq!(second.get("host").unwrap(), &Value::from("other.place"));

    second.set("host", "last.place").unwrap();
    assert_eq!(second["host"], Value::from("last.place"));

    let err = second.set("nanny", 12345).unwrap_err();
    assert_eq!(err.to_string(), "Invalid key nanny for A");

    let err = second.set("host", 12345).unwrap_err();
    let invalid = err.as_invalid_option().unwrap();
    assert_eq!(
        invalid.to_string(),
        "Expected type string for option `host`, provided type is integer."
    );
    assert_eq!(invalid.param("value_type"), Some(&json!("integer")));
    assert_eq!(invalid.param("expected_type"), Some(&json!("string")));
    assert_eq!(invalid.param("prepend"), Some(&json!("")));
    assert_eq!(invalid.param("append"), Some(&json!("")));
    assert_eq!(invalid.key(), Some("host"));
    assert_eq!(invalid.format_params().len(), 5);

    // failed set leaves the value alone
    assert_eq!(second["host"], Value::from("last.place"));
}

#[test]
fn test_construction_rejects_unknown_and_invalid() {
    let schema = host_schema(Value::Null);
    assert!(schema.instantiate([("nanny", "x")]).is_err());

    let err = schema.instantiate([("host", 1)]).unwrap_err();
    assert_eq!(err.key(), Some("host"));
}

#[test]
fn test_update_merges_and_is_idempotent() {
    let schema = Schema::builder("Client")
        .option(OptionDef::integer("timeout", 30))
        .option(OptionDef::iso8601("since", "2016-05-09T16:00:00Z"))
        .build();
    let mut client = OptionContainer::new(&schema).unwrap();

    client.update([("timeout", Value::from(45))]).unwrap();
    assert_eq!(client["timeout"], Value::from(45));

    let snapshot = client.clone();
    let current = client.values().clone();
    client.update(current).unwrap();
    assert_eq!(client, snapshot);
}

#[test]
fn test_datetime_option_parses_strings() {
    let schema = Schema::builder("Event")
        .option(OptionDef::iso8601("at", Value::Null))
        .build();
    let mut event = OptionContainer::new(&schema).unwrap();
    assert!(event["at"].is_null());

    event.set("at", "2016-05-09 16:00:00 +03:00").unwrap();
    let at = event["at"].as_datetime().unwrap();
    assert_eq!(at.to_rfc3339(), "2016-05-09T16:00:00+03:00");

    let err = event.set("at", "tomorrow").unwrap_err();
    assert!(err.to_string().ends_with("Please use ISO_8601."));
}

#[test]
fn test_float_option_with_integer_choices() {
    let schema = Schema::builder("Mix")
        .option(OptionDef::float("ratio", 1).choices([1, 2]))
        .build();
    let mut mix = OptionContainer::new(&schema).unwrap();
    assert_eq!(mix["ratio"], Value::from(1.0));

    mix.set("ratio", 2).unwrap();
    assert_eq!(mix["ratio"], Value::from(2.0));

    let err = mix.set("ratio", 2.5).unwrap_err();
    assert_eq!(err.to_string(), "Value 2.5 for option `ratio` is not one of (1, 2)");
    assert_eq!(mix["ratio"], Value::from(2.0));
}

#[test]
fn test_none_to_default_through_container() {
    let schema = Schema::builder("A")
        .option(OptionDef::string("host", "some.where").none_to_default(true))
        .build();
    let mut container = schema.instantiate([("host", Value::Null)]).unwrap();
    assert_eq!(container["host"], Value::from("some.where"));

    container.set("host", "x").unwrap();
    container.set("host", Value::Null).unwrap();
    assert_eq!(container["host"], Value::from("some.where"));
}

// =============================================================================
// Inheritance
// =============================================================================

#[test]
fn test_inherited_definitions() {
    let a = Schema::builder("A")
        .option(OptionDef::string("host", Value::Null))
        .option(OptionDef::string("user", Value::Null))
        .option(OptionDef::string("password", Value::Null))
        .build();
    let b = Schema::builder("B")
        .extends(&a)
        .option(OptionDef::string("user", "yolger"))
        .build();
    let c = Schema::builder("C")
        .extends(&b)
        .option(OptionDef::string("password", "pass"))
        .option(OptionDef::integer("port", 8080))
        .build();

    let a_inst = a
        .instantiate([("host", "some.where"), ("user", "john"), ("password", "pass")])
        .unwrap();
    for (def, prop) in a_inst.definitions().values().zip(a.props()) {
        assert!(Arc::ptr_eq(def, prop));
    }

    let b_inst = b
        .instantiate([("host", "other.place"), ("password", "pass")])
        .unwrap();
    assert!(Arc::ptr_eq(&b_inst.definitions()["user"], &b.props()[0]));
    assert_eq!(b_inst["user"], Value::from("yolger"));

    let c_inst = c.instantiate([("host", "other.place")]).unwrap();
    let keys: Vec<&str> = c_inst.definitions().keys().map(String::as_str).collect();
    assert_eq!(keys, ["host", "user", "password", "port"]);
    assert_eq!(c_inst.get("password").unwrap(), &Value::from("pass"));
    assert_eq!(c_inst["port"], Value::from(8080));
    assert_eq!(c_inst["user"], Value::from("yolger"));
}

// =============================================================================
// Rendering and identity
// =============================================================================

#[test]
fn test_to_str() {
    let a = host_schema(Value::Null);
    let b = Schema::builder("B").extends(&a).label("xyz").build();

    assert_eq!(a.to_string(), format!("A\n\t{}", a.props()[0]));
    let a_inst = a.instantiate([("host", "hello")]).unwrap();
    assert_eq!(a_inst.to_string(), "<A>:\n\thost: hello");
    assert_eq!(a.to_string(), a_inst.typedef());

    assert_eq!(b.to_string(), format!("B\n\t{}", a.props()[0]));
    let b_inst = b.instantiate([("host", "hello")]).unwrap();
    assert_eq!(b_inst.to_string(), "<B xyz>:\n\thost: hello");
}

#[test]
fn test_identifier_is_set() {
    let a = Schema::builder("A").build();
    let b = Schema::builder("B").label("luke").build();

    assert_eq!(OptionContainer::new(&a).unwrap().identifier(), "A");
    assert_eq!(OptionContainer::new(&b).unwrap().identifier(), "luke");
}

#[test]
fn test_serializes_in_definition_order() {
    let schema = Schema::builder("Client")
        .option(OptionDef::string("b", "1"))
        .option(OptionDef::string("a", "2"))
        .build();
    let container = OptionContainer::new(&schema).unwrap();
    assert_eq!(serde_json::to_string(&container).unwrap(), r#"{"b":"1","a":"2"}"#);
}
