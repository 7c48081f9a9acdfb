// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(clippy::unwrap_used, clippy::float_cmp)]

use crate::errors::AttributeError;
use crate::types::CelType;
use crate::value::{StructValue, Unknown, Value};

use std::collections::BTreeMap;

use anyhow::Result;

#[test]
fn json_round_trip() -> Result<()> {
    let v = Value::from_json_str(r#"{"a": {"b": [10, 20, 30.5, "x", null, true]}}"#)?;
    let list = v.as_map()?[&Value::from("a")].as_map()?[&Value::from("b")].clone();
    let list = list.as_list()?;
    assert_eq!(list[0], Value::Int(10));
    assert_eq!(list[2], Value::Double(30.5));
    assert_eq!(list[4], Value::Null);

    let text = v.to_json_str()?;
    assert_eq!(Value::from_json_str(&text)?, v);
    Ok(())
}

#[test]
fn json_integers_prefer_int() -> Result<()> {
    let v = Value::from_json_str("[1, 9223372036854775807, 18446744073709551615]")?;
    let list = v.as_list()?;
    assert_eq!(list[0], Value::Int(1));
    assert_eq!(list[1], Value::Int(i64::MAX));
    assert_eq!(list[2], Value::Uint(u64::MAX));
    Ok(())
}

#[test]
fn equal_across_kinds_is_false_not_error() {
    assert_eq!(Value::from(1i64).equal(&Value::from("1")), Value::Bool(false));
    assert_eq!(Value::Null.equal(&Value::Bool(false)), Value::Bool(false));
    assert_eq!(
        Value::new_list().equal(&Value::new_map()),
        Value::Bool(false)
    );
}

#[test]
fn equal_coerces_int_and_uint() {
    assert_eq!(Value::Int(4).equal(&Value::Uint(4)), Value::Bool(true));
    assert_eq!(Value::Uint(4).equal(&Value::Int(5)), Value::Bool(false));
    assert_eq!(Value::Int(-1).equal(&Value::Uint(u64::MAX)), Value::Bool(false));
}

#[test]
fn equal_propagates_error_and_unknown() {
    let err = Value::error(AttributeError::Message("boom".to_string()));
    assert_eq!(Value::from(1i64).equal(&err), err);
    assert_eq!(err.equal(&Value::from(1i64)), err);

    let unk = Value::unknown(7);
    assert_eq!(unk.equal(&Value::from(1i64)), unk);
    // Two unknowns merge their trails.
    let merged = Value::unknown(7).equal(&Value::unknown(3));
    match merged {
        Value::Unknown(u) => assert_eq!(u.ids(), &[3, 7]),
        other => panic!("expected unknown, got {other}"),
    }
}

#[test]
fn equal_of_two_absent_optionals_is_true() {
    assert_eq!(
        Value::optional_none().equal(&Value::optional_none()),
        Value::Bool(true)
    );
    assert_eq!(
        Value::optional_of(Value::from(1i64)).equal(&Value::optional_none()),
        Value::Bool(false)
    );
    assert_eq!(
        Value::optional_of(Value::from(1i64)).equal(&Value::optional_of(Value::from(1i64))),
        Value::Bool(true)
    );
}

#[test]
fn optionals_never_nest() {
    let inner = Value::optional_of(Value::from("x"));
    let outer = Value::optional_of(inner.clone());
    assert_eq!(outer, inner);
}

#[test]
fn nan_is_a_usable_map_key() -> Result<()> {
    // IEEE equality says NaN != NaN; the map key order is total.
    let mut map = BTreeMap::new();
    map.insert(Value::Double(f64::NAN), Value::from("n"));
    let map = Value::from(map);
    assert_eq!(
        map.as_map()?.get(&Value::Double(f64::NAN)),
        Some(&Value::from("n"))
    );
    assert_eq!(
        Value::Double(f64::NAN).equal(&Value::Double(f64::NAN)),
        Value::Bool(false)
    );
    Ok(())
}

#[test]
fn type_of_and_type_conversion() {
    assert_eq!(Value::from(1i64).type_of(), CelType::Int);
    assert_eq!(
        Value::from(1i64).convert_to_type(&CelType::Type),
        Value::Type(CelType::Int)
    );
    assert_eq!(
        Value::from("42").convert_to_type(&CelType::Int),
        Value::Int(42)
    );
    assert_eq!(
        Value::Uint(7).convert_to_type(&CelType::Double),
        Value::Double(7.0)
    );
    assert_eq!(
        Value::from("abc").convert_to_type(&CelType::String),
        Value::from("abc")
    );
}

#[test]
fn failed_conversion_is_an_error_value() {
    let out = Value::Int(-1).convert_to_type(&CelType::Uint);
    assert!(out.is_error());
    assert_eq!(
        out,
        Value::error(AttributeError::Message(
            "type conversion error from 'int' to 'uint'".to_string()
        ))
    );

    // Errors pass through conversion unchanged.
    let err = Value::error(AttributeError::Message("boom".to_string()));
    assert_eq!(err.convert_to_type(&CelType::String), err);
}

#[test]
fn struct_fields() {
    let s = StructValue::new("acme.Msg")
        .with_field("name", Value::from("x"))
        .with_field("count", Value::Int(3));
    assert!(s.has_field("name"));
    assert!(!s.has_field("missing"));
    assert_eq!(s.field("count"), Some(&Value::Int(3)));
    assert_eq!(
        Value::from(s).type_of(),
        CelType::Struct("acme.Msg".into())
    );
}

#[test]
fn unknown_merge_sorts_and_dedups() {
    let a = Unknown::new(5).merge(&Unknown::new(2));
    let b = a.merge(&Unknown::new(5));
    assert_eq!(b.ids(), &[2, 5]);
}

#[test]
fn display_renders_sentinels() -> Result<()> {
    let err = Value::error(AttributeError::NoSuchKey("k".to_string()));
    assert_eq!(err.to_string(), r#""<error: no such key: k>""#);
    assert_eq!(Value::optional_none().to_string(), r#""<none>""#);
    assert_eq!(
        Value::optional_of(Value::from(1i64)).to_string(),
        "1"
    );
    Ok(())
}

#[test]
fn into_bindings_requires_string_keys() -> Result<()> {
    let ok = Value::from_json_str(r#"{"x": 1}"#)?.into_bindings()?;
    assert_eq!(ok[&"x".to_string()], Value::Int(1));

    let mut map = BTreeMap::new();
    map.insert(Value::Int(1), Value::Null);
    assert!(Value::from(map).into_bindings().is_err());
    assert!(Value::from(1i64).into_bindings().is_err());
    Ok(())
}
