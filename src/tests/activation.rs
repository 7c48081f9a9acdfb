// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::activation::{
    Activation, EmptyActivation, HierarchicalActivation, MapActivation,
};
use crate::value::Value;

use std::rc::Rc;

use anyhow::Result;

#[test]
fn empty_activation_never_resolves() {
    assert_eq!(EmptyActivation.resolve_name("anything"), None);
    assert!(EmptyActivation.parent().is_none());
}

#[test]
fn map_activation_binds_values() {
    let vars = MapActivation::new()
        .bind("a", 1i64)
        .bind("b.c", "nested name, flat binding");
    assert_eq!(vars.resolve_name("a"), Some(Value::Int(1)));
    // Qualified names are plain binding keys, not paths.
    assert!(vars.resolve_name("b").is_none());
    assert!(vars.resolve_name("b.c").is_some());
}

#[test]
fn map_activation_from_json() -> Result<()> {
    let vars = MapActivation::from_json_str(r#"{"a": {"b": [2, 42]}, "acme.a.b": 1}"#)?;
    assert_eq!(vars.resolve_name("acme.a.b"), Some(Value::Int(1)));
    assert!(vars.resolve_name("a").is_some());
    assert!(vars.resolve_name("missing").is_none());

    assert!(MapActivation::from_json_str("[1, 2]").is_err());
    Ok(())
}

#[test]
fn hierarchical_child_shadows_parent() {
    let parent = Rc::new(MapActivation::new().bind("a", 1i64).bind("p", true));
    let child = Rc::new(MapActivation::new().bind("a", 2i64));
    let vars = HierarchicalActivation::new(parent, child);

    assert_eq!(vars.resolve_name("a"), Some(Value::Int(2)));
    assert_eq!(vars.resolve_name("p"), Some(Value::Bool(true)));
    assert!(vars.resolve_name("q").is_none());
    assert!(vars.parent().is_some());
}
