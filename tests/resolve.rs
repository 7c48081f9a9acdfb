// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use cel_attrs::{
    Activation, AttributeError, AttributeFactory, ConstValue, Container, EmptyActivation,
    HierarchicalActivation, MapActivation, TypeRegistry, Value,
};

use std::rc::Rc;

use anyhow::Result;

fn factory(namespace: &str) -> AttributeFactory {
    AttributeFactory::new(
        Rc::new(Container::new(namespace)),
        Rc::new(TypeRegistry::new()),
    )
}

#[test]
fn resolve_a_plan_against_many_activations() -> Result<()> {
    let f = factory("");

    // request.user.roles[0], planned once.
    let mut attr = f.absolute_attribute(1, "request");
    attr.add_qualifier(f.new_qualifier(None, 2, Value::from("user"), false)?);
    attr.add_qualifier(f.new_qualifier(None, 3, Value::from("roles"), false)?);
    attr.add_qualifier(f.new_qualifier(None, 4, Value::from(0i64), false)?);

    let admin = MapActivation::from_json_str(
        r#"{"request": {"user": {"roles": ["admin", "reader"]}}}"#,
    )?;
    assert_eq!(attr.resolve(&admin), Value::from("admin"));

    let anonymous = MapActivation::from_json_str(r#"{"request": {"user": {}}}"#)?;
    assert_eq!(
        attr.resolve(&anonymous),
        Value::error(AttributeError::NoSuchKey("roles".to_string()))
    );

    assert_eq!(
        attr.resolve(&EmptyActivation),
        Value::error(AttributeError::NoSuchAttribute("request".to_string()))
    );
    Ok(())
}

#[test]
fn optional_selection_reports_absence_not_errors() -> Result<()> {
    let f = factory("");

    // request.?header.value
    let mut attr = f.absolute_attribute(1, "request");
    attr.add_qualifier(f.new_qualifier(None, 2, Value::from("header"), true)?);
    attr.add_qualifier(f.new_qualifier(None, 3, Value::from("value"), false)?);

    let with_header =
        MapActivation::from_json_str(r#"{"request": {"header": {"value": "x"}}}"#)?;
    assert_eq!(
        attr.resolve(&with_header),
        Value::optional_of(Value::from("x"))
    );

    let without = MapActivation::from_json_str(r#"{"request": {}}"#)?;
    assert_eq!(attr.resolve(&without), Value::optional_none());
    Ok(())
}

#[test]
fn namespaced_names_resolve_through_the_container() -> Result<()> {
    let f = factory("acme.ns");
    let vars = MapActivation::from_json_str(
        r#"{"a": {"b": [2, 42]}, "acme.a.b": 1, "acme.ns.a.b": "found"}"#,
    )?;

    let mut attr = f.maybe_attribute(1, "a");
    attr.add_qualifier(f.new_qualifier(None, 2, Value::from("b"), false)?);
    assert_eq!(attr.resolve(&vars), Value::from("found"));
    Ok(())
}

#[test]
fn shared_plans_resolve_against_layered_scopes() -> Result<()> {
    let f = factory("");
    let mut attr = f.absolute_attribute(1, "x");
    attr.add_qualifier(f.new_qualifier(None, 2, Value::from("v"), false)?);

    let base: Rc<dyn Activation> = Rc::new(MapActivation::from_json_str(
        r#"{"x": {"v": "base"}, "y": 1}"#,
    )?);
    let overlay: Rc<dyn Activation> =
        Rc::new(MapActivation::from_json_str(r#"{"x": {"v": "overlay"}}"#)?);
    let scoped = HierarchicalActivation::new(base.clone(), overlay);

    assert_eq!(attr.resolve(&scoped), Value::from("overlay"));
    assert_eq!(attr.resolve(base.as_ref()), Value::from("base"));
    Ok(())
}

#[test]
fn computed_bases_and_computed_keys() -> Result<()> {
    let f = factory("");
    let literal = Value::from_json_str(r#"{"scores": [10, 20, 30]}"#)?;
    let vars = MapActivation::new().bind("pick", Value::from(2i64));

    let mut attr = f.relative_attribute(1, Rc::new(ConstValue::new(1, literal)));
    attr.add_qualifier(f.new_qualifier(None, 2, Value::from("scores"), false)?);
    attr.add_qualifier(f.attribute_qualifier(3, f.absolute_attribute(3, "pick"), false));

    assert_eq!(attr.resolve(&vars), Value::from(30i64));
    Ok(())
}

#[test]
fn conditional_branches_stay_in_sync() -> Result<()> {
    let f = factory("");
    let vars = MapActivation::from_json_str(r#"{"a": {"k": "from a"}, "b": {"k": "from b"}}"#)?;

    let mut attr = f.conditional_attribute(
        1,
        Rc::new(ConstValue::new(0, Value::Bool(false))),
        f.absolute_attribute(2, "a"),
        f.absolute_attribute(3, "b"),
    );
    attr.add_qualifier(f.new_qualifier(None, 4, Value::from("k"), false)?);

    assert_eq!(attr.resolve(&vars), Value::from("from b"));
    Ok(())
}
