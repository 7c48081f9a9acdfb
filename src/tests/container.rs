// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::container::Container;

use anyhow::Result;

fn names(c: &Container, name: &str) -> Vec<String> {
    c.resolve_candidate_names(name)
}

#[test]
fn empty_container_yields_the_bare_name() {
    let c = Container::default();
    assert_eq!(names(&c, "a.b"), vec!["a.b"]);
}

#[test]
fn candidates_are_most_specific_first() {
    let c = Container::new("a.b.c.M.N");
    assert_eq!(
        names(&c, "R.s"),
        vec![
            "a.b.c.M.N.R.s",
            "a.b.c.M.R.s",
            "a.b.c.R.s",
            "a.b.R.s",
            "a.R.s",
            "R.s",
        ]
    );
}

#[test]
fn leading_dot_is_absolute() {
    let c = Container::new("a.b.c");
    assert_eq!(names(&c, ".R.s"), vec!["R.s"]);
}

#[test]
fn extend_carries_aliases() -> Result<()> {
    let mut c = Container::new("a.b");
    c.add_alias("my.alias.R", "R")?;
    let c2 = c.extend("a.b.c");
    assert_eq!(names(&c2, "R"), vec!["my.alias.R"]);
    assert_eq!(c2.name(), "a.b.c");
    Ok(())
}

#[test]
fn alias_expands_only_the_first_component() -> Result<()> {
    let mut c = Container::default();
    c.add_alias("my.alias.R", "R")?;
    assert_eq!(names(&c, "R.S.T"), vec!["my.alias.R.S.T"]);
    Ok(())
}

#[test]
fn alias_beats_container_search() -> Result<()> {
    let mut c = Container::new("a.b");
    c.add_alias("my.alias.R", "R")?;
    assert_eq!(names(&c, "R"), vec!["my.alias.R"]);
    // An aliased leading-dot name still expands through the alias table.
    assert_eq!(names(&c, ".R"), vec!["my.alias.R"]);
    Ok(())
}

#[test]
fn abbrevs_take_the_last_element() -> Result<()> {
    let mut c = Container::default();
    c.add_abbrevs(["my.long.package.Msg"])?;
    assert_eq!(names(&c, "Msg"), vec!["my.long.package.Msg"]);
    assert_eq!(names(&c, "Msg.field"), vec!["my.long.package.Msg.field"]);
    Ok(())
}

#[test]
fn invalid_abbreviations_are_rejected() {
    let mut c = Container::default();
    assert!(c.add_abbrevs(["lone"]).is_err());
    assert!(c.add_abbrevs([".leading.Dot"]).is_err());
    assert!(c.add_abbrevs(["trailing.dot."]).is_err());
    assert!(c.add_abbrevs(["has space.Msg"]).is_err());
}

#[test]
fn colliding_aliases_are_rejected() -> Result<()> {
    let mut c = Container::new("some.ns");
    c.add_alias("x.y.R", "R")?;
    assert!(c.add_alias("other.R", "R").is_err());
    // An alias may not shadow the container itself.
    assert!(c.add_alias("x.y.some", "some").is_err());
    // Qualified or empty aliases are invalid.
    assert!(c.add_alias("x.y.R", "a.b").is_err());
    assert!(c.add_alias("x.y.R", "").is_err());
    assert!(c.add_alias(".x.y.R", "S").is_err());
    Ok(())
}
