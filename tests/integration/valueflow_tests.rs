//! Value-flow store integration tests.
//!
//! The documented merge scenarios plus query gating through settings.

use ccflow::{Settings, TokenStream, Value, ValueKind};

#[test]
fn test_known_value_replaces_inconclusive_twin() {
    let mut stream = TokenStream::from_words("x");
    let x = stream.front().unwrap();
    assert!(stream.add_value(x, Value::new(5).with_kind(ValueKind::Inconclusive)));
    // Adding the Known twin replaces the entry and reports a mutation.
    assert!(stream.add_value(x, Value::new(5).with_kind(ValueKind::Known)));
    let values = stream.values(x);
    assert_eq!(values.len(), 1);
    assert_eq!(values[0].intvalue, 5);
    assert!(values[0].is_known());
}

#[test]
fn test_duplicate_value_is_rejected() {
    let mut stream = TokenStream::from_words("x");
    let x = stream.front().unwrap();
    let value = Value::new(5);
    assert!(stream.add_value(x, value.clone()));
    assert!(!stream.add_value(x, value));
    assert_eq!(stream.values(x).len(), 1);
}

#[test]
fn test_value_list_capped_at_ten() {
    let mut stream = TokenStream::from_words("x");
    let x = stream.front().unwrap();
    for i in 0..10 {
        assert!(stream.add_value(x, Value::new(i)));
    }
    assert!(!stream.add_value(x, Value::new(999)));
    assert_eq!(stream.values(x).len(), 10);
}

#[test]
fn test_known_int_purges_other_ints() {
    let mut stream = TokenStream::from_words("x");
    let x = stream.front().unwrap();
    stream.add_value(x, Value::new(1));
    stream.add_value(x, Value::new(2));
    stream.add_value(x, Value::new(3));
    stream.add_value(x, Value::new(42).with_kind(ValueKind::Known));
    let values = stream.values(x);
    assert_eq!(values.len(), 1);
    assert_eq!(values[0].intvalue, 42);
}

#[test]
fn test_query_gating_through_settings() {
    let mut stream = TokenStream::from_words("if x");
    let v: Vec<_> = stream.token_ids().collect();
    stream.add_value(v[1], Value::with_condition(v[0], 3));

    // Conditional values need warnings enabled.
    let quiet = Settings::new();
    assert!(stream.get_value_le(v[1], 5, Some(&quiet)).is_none());

    let mut warn = Settings::new();
    warn.add_enabled("warning").unwrap();
    assert_eq!(
        stream.get_value_le(v[1], 5, Some(&warn)).unwrap().intvalue,
        3
    );

    // Without a settings capability nothing is filtered.
    assert!(stream.get_value_le(v[1], 5, None).is_some());
}

#[test]
fn test_valueflow_xml_dump_shape() {
    let mut stream = TokenStream::from_words("x");
    let x = stream.front().unwrap();
    stream.add_value(x, Value::new(3).with_kind(ValueKind::Known));
    stream.add_value(x, Value::new(7));
    let xml = stream.print_value_flow(true);
    assert!(xml.starts_with("  <valueflow>\n"));
    // Known int was front-inserted.
    let known_pos = xml.find("intvalue=\"3\" known=\"true\"").unwrap();
    let possible_pos = xml.find("intvalue=\"7\" possible=\"true\"").unwrap();
    assert!(known_pos < possible_pos);
    assert!(xml.ends_with("  </valueflow>\n"));
}
