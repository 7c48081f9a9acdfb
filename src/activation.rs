// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Variable binding environments queried during attribute resolution.

use crate::value::Value;

use std::collections::BTreeMap;
use std::rc::Rc;

use anyhow::Result;

/// Read-only variable lookup. An activation is the primary mechanism by
/// which a caller supplies input into an evaluation; resolution never
/// writes to it.
pub trait Activation {
    /// Returns the value bound to a qualified name, or `None` if the name
    /// is not bound.
    fn resolve_name(&self, name: &str) -> Option<Value>;

    /// Parent activation searched when a name is not bound here, if any.
    fn parent(&self) -> Option<&dyn Activation> {
        None
    }
}

/// A variable-free activation; every lookup misses.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyActivation;

impl Activation for EmptyActivation {
    fn resolve_name(&self, _name: &str) -> Option<Value> {
        None
    }
}

/// Activation backed by a map of named values.
#[derive(Debug, Clone, Default)]
pub struct MapActivation {
    bindings: BTreeMap<String, Value>,
}

impl MapActivation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style binding.
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.bindings.insert(name.into(), value.into());
        self
    }

    /// Builds an activation from a JSON object; each top-level member
    /// becomes a binding.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let bindings = Value::from_json_str(json)?.into_bindings()?;
        Ok(Self { bindings })
    }
}

impl From<BTreeMap<String, Value>> for MapActivation {
    fn from(bindings: BTreeMap<String, Value>) -> Self {
        Self { bindings }
    }
}

impl Activation for MapActivation {
    fn resolve_name(&self, name: &str) -> Option<Value> {
        self.bindings.get(name).cloned()
    }
}

/// A parent/child activation pair; the child shadows the parent.
pub struct HierarchicalActivation {
    parent: Rc<dyn Activation>,
    child: Rc<dyn Activation>,
}

impl HierarchicalActivation {
    pub fn new(parent: Rc<dyn Activation>, child: Rc<dyn Activation>) -> Self {
        Self { parent, child }
    }
}

impl Activation for HierarchicalActivation {
    fn resolve_name(&self, name: &str) -> Option<Value> {
        self.child
            .resolve_name(name)
            .or_else(|| self.parent.resolve_name(name))
    }

    fn parent(&self) -> Option<&dyn Activation> {
        Some(self.parent.as_ref())
    }
}
