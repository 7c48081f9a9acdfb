// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Namespace containers and candidate name expansion.

use std::collections::BTreeMap;

use anyhow::{bail, Result};

/// Holds an optional qualified container name and a set of aliases.
///
/// A container behaves more or less like a C++ namespace: an unqualified
/// identifier within container `a.b.c` may refer to `a.b.c.x`, `a.b.x`,
/// `a.x` or the global `x`, searched in that order.
#[derive(Debug, Clone, Default)]
pub struct Container {
    name: String,
    aliases: BTreeMap<String, String>,
}

impl Container {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// New container with a different name, carrying over the alias set.
    pub fn extend(&self, name: impl Into<String>) -> Container {
        Container {
            name: name.into(),
            aliases: self.aliases.clone(),
        }
    }

    /// Candidate names for a namespaced identifier, most specific first,
    /// terminating with the unqualified global name.
    ///
    /// Names with a leading dot are absolute and cannot be shadowed.
    /// Aliases take precedence over containerized names.
    pub fn resolve_candidate_names(&self, name: &str) -> Vec<String> {
        if let Some(qualified) = name.strip_prefix('.') {
            if let Some(alias) = self.find_alias(qualified) {
                return vec![alias];
            }
            return vec![qualified.to_string()];
        }
        if let Some(alias) = self.find_alias(name) {
            return vec![alias];
        }
        if self.name.is_empty() {
            return vec![name.to_string()];
        }
        let mut next = self.name.as_str();
        let mut candidates = vec![format!("{next}.{name}")];
        while let Some(i) = next.rfind('.') {
            next = &next[..i];
            candidates.push(format!("{next}.{name}"));
        }
        candidates.push(name.to_string());
        candidates
    }

    /// Alias expansion for a (possibly qualified) name. Only the first
    /// component of a qualified name participates:
    ///
    ///   alias: R -> my.alias.R, name: R.S.T, output: my.alias.R.S.T
    fn find_alias(&self, name: &str) -> Option<String> {
        let (simple, qualifier) = match name.find('.') {
            Some(dot) => (&name[..dot], &name[dot..]),
            None => (name, ""),
        };
        self.aliases.get(simple).map(|a| format!("{a}{qualifier}"))
    }

    /// Configures simple names as abbreviations for fully-qualified names;
    /// the last element of each qualified name becomes the abbreviation.
    /// Unlike container searches, an expanded abbreviation does not
    /// participate in namespace resolution.
    pub fn add_abbrevs<'a>(&mut self, qualified_names: impl IntoIterator<Item = &'a str>) -> Result<()> {
        for qualified_name in qualified_names {
            let qn = qualified_name.trim();
            if !qn.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.') {
                bail!("invalid qualified name: {qn}, wanted name of the form 'qualified.name'");
            }
            match qn.rfind('.') {
                Some(ind) if ind > 0 && ind < qn.len() - 1 => {
                    let alias = qn[ind + 1..].to_string();
                    self.alias_as("abbreviation", qn, &alias)?;
                }
                _ => bail!("invalid qualified name: {qn}, wanted name of the form 'qualified.name'"),
            }
        }
        Ok(())
    }

    /// Associates a fully-qualified name with a user-defined alias. The
    /// same validation rules as abbreviations apply.
    pub fn add_alias(&mut self, qualified_name: &str, alias: &str) -> Result<()> {
        self.alias_as("alias", qualified_name, alias)
    }

    fn alias_as(&mut self, kind: &str, qualified_name: &str, alias: &str) -> Result<()> {
        if alias.is_empty() || alias.contains('.') {
            bail!("{kind} must be non-empty and simple (not qualified): {kind}={alias}");
        }
        if qualified_name.starts_with('.') {
            bail!("qualified name must not begin with a leading '.': {qualified_name}");
        }
        match qualified_name.rfind('.') {
            Some(ind) if ind > 0 && ind < qualified_name.len() - 1 => {}
            _ => bail!("qualified name must be of the form 'qualified.name': {qualified_name}"),
        }
        if let Some(existing) = self.find_alias(alias) {
            bail!("{kind} collides with existing reference: name={qualified_name}, {kind}={alias}, existing={existing}");
        }
        if self.name == alias || self.name.starts_with(&format!("{alias}.")) {
            bail!("{kind} collides with container name: name={qualified_name}, {kind}={alias}, container={}", self.name);
        }
        self.aliases.insert(alias.to_string(), qualified_name.to_string());
        Ok(())
    }
}
