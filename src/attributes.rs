// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Attribute resolution and qualification.
//!
//! An attribute is a compiled, resolvable reference to a value: a variable,
//! a sub-expression, a lazily chosen branch, or a namespace-ambiguous name,
//! qualified by an ordered chain of field/key/index selectors. Attribute
//! trees are built once at plan time by [`AttributeFactory`] and resolved
//! any number of times against independent activations; resolution is a
//! pure function of (attribute, activation) and never mutates either.

use crate::activation::Activation;
use crate::container::Container;
use crate::errors::AttributeError;
use crate::eval::Evaluable;
use crate::types::{CelType, FieldType, TypeRegistry};
use crate::value::{Unknown, Value};

use core::fmt;
use std::collections::BTreeMap;
use std::rc::Rc;

use anyhow::{bail, Result};

/// Key applied by a constant qualifier. Only the proto-supported map key
/// types are valid qualifier keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualifierKey {
    String(Rc<str>),
    Int(i64),
    Uint(u64),
    Bool(bool),
}

impl QualifierKey {
    fn to_value(&self) -> Value {
        match self {
            QualifierKey::String(s) => Value::String(s.clone()),
            QualifierKey::Int(i) => Value::Int(*i),
            QualifierKey::Uint(u) => Value::Uint(*u),
            QualifierKey::Bool(b) => Value::Bool(*b),
        }
    }

    /// List index view of the key, when it is an integer.
    fn index(&self) -> Option<i64> {
        match self {
            QualifierKey::Int(i) => Some(*i),
            QualifierKey::Uint(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    fn type_of(&self) -> CelType {
        match self {
            QualifierKey::String(_) => CelType::String,
            QualifierKey::Int(_) => CelType::Int,
            QualifierKey::Uint(_) => CelType::Uint,
            QualifierKey::Bool(_) => CelType::Bool,
        }
    }
}

impl fmt::Display for QualifierKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualifierKey::String(s) => write!(f, "{s}"),
            QualifierKey::Int(i) => write!(f, "{i}"),
            QualifierKey::Uint(u) => write!(f, "{u}"),
            QualifierKey::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Constant key selector: a field name, map key or list index known at
/// plan time.
#[derive(Debug, Clone)]
pub struct ConstQualifier {
    id: i64,
    key: QualifierKey,
    optional: bool,
}

/// Statically-typed struct field access. When the checker knows the target
/// field, lookup goes straight to the field and a declared-but-unset field
/// reads as its zero value instead of erroring.
#[derive(Debug, Clone)]
pub struct FieldQualifier {
    id: i64,
    name: Rc<str>,
    field_type: FieldType,
    optional: bool,
}

impl FieldQualifier {
    fn get_from(&self, obj: &Value) -> Value {
        match obj {
            Value::Struct(s) => match s.field(&self.name) {
                Some(v) => v.clone(),
                None => self.field_type.zero_value(),
            },
            // Dynamic data may still flow through a statically planned path.
            Value::Map(m) => match map_find(m, &QualifierKey::String(self.name.clone())) {
                Some(v) => v,
                None => Value::error(AttributeError::NoSuchKey(self.name.to_string())),
            },
            _ => Value::error(AttributeError::UnsupportedQualifierBase),
        }
    }

    fn is_set(&self, obj: &Value) -> bool {
        match obj {
            Value::Struct(s) => s.has_field(&self.name),
            Value::Map(m) => m.contains_key(&Value::String(self.name.clone())),
            _ => false,
        }
    }
}

/// Runtime-computed key: the wrapped attribute is resolved against the
/// activation at qualification time and its value applied as a constant
/// key, e.g. the `[b]` in `<map>.a[-1][b]`.
#[derive(Clone)]
pub struct AttrQualifier {
    id: i64,
    attr: Attribute,
    optional: bool,
}

impl AttrQualifier {
    /// Resolves the wrapped attribute to a qualifier key. The `Err` arm
    /// carries the terminal value (error or unknown) to hand back.
    fn key_from(&self, vars: &dyn Activation) -> Result<QualifierKey, Value> {
        let mut key = self.attr.resolve(vars);
        if let Value::Optional(opt) = &key {
            key = match opt.as_ref() {
                Some(v) => v.clone(),
                None => {
                    return Err(Value::error(AttributeError::Message(
                        "optional.none() dereference".to_string(),
                    )))
                }
            };
        }
        if key.is_error() || key.is_unknown() {
            return Err(key);
        }
        match const_key(&key) {
            Some(k) => Ok(k),
            None => Err(Value::error(AttributeError::InvalidQualifier(format!(
                "key type '{}'",
                key.type_of()
            )))),
        }
    }
}

/// Always yields its preconfigured unknown, consistent with unknown
/// handling elsewhere: the trail survives any qualification.
#[derive(Debug, Clone)]
pub struct UnknownQualifier {
    id: i64,
    value: Rc<Unknown>,
}

/// A single selector applied to a base value during attribute resolution.
///
/// Qualifiers are created once by the factory, attached to exactly one
/// attribute, and never mutated.
#[derive(Clone)]
pub enum Qualifier {
    Const(ConstQualifier),
    Field(FieldQualifier),
    Attribute(Box<AttrQualifier>),
    Unknown(UnknownQualifier),
}

impl Qualifier {
    pub fn id(&self) -> i64 {
        match self {
            Qualifier::Const(q) => q.id,
            Qualifier::Field(q) => q.id,
            Qualifier::Attribute(q) => q.id,
            Qualifier::Unknown(q) => q.id,
        }
    }

    /// An optional qualifier resolves via presence testing rather than
    /// direct qualification, and switches the rest of its chain into
    /// optional mode.
    pub fn is_optional(&self) -> bool {
        match self {
            Qualifier::Const(q) => q.optional,
            Qualifier::Field(q) => q.optional,
            Qualifier::Attribute(q) => q.optional,
            Qualifier::Unknown(_) => false,
        }
    }

    /// Constant string view of the qualifier, used by maybe-attributes to
    /// extend candidate variable names.
    fn as_field_name(&self) -> Option<&str> {
        match self {
            Qualifier::Const(q) => match &q.key {
                QualifierKey::String(s) => Some(s),
                _ => None,
            },
            Qualifier::Field(q) => Some(&q.name),
            _ => None,
        }
    }

    /// Applies the qualifier; a failed lookup is an error value.
    pub fn qualify(&self, vars: &dyn Activation, obj: &Value) -> Value {
        if obj.is_error() || obj.is_unknown() {
            return obj.clone();
        }
        if let Value::Optional(opt) = obj {
            return match opt.as_ref() {
                None => obj.clone(),
                Some(inner) => {
                    let out = self.qualify(vars, inner);
                    if out.is_error() || out.is_unknown() {
                        out
                    } else {
                        Value::optional_of(out)
                    }
                }
            };
        }
        match self {
            Qualifier::Const(q) => resolve_lookup(qualify_value(&q.key, obj, false)),
            Qualifier::Field(q) => q.get_from(obj),
            Qualifier::Attribute(q) => match q.key_from(vars) {
                Ok(key) => resolve_lookup(qualify_value(&key, obj, false)),
                Err(terminal) => terminal,
            },
            Qualifier::Unknown(q) => Value::Unknown(q.value.clone()),
        }
    }

    /// Applies the qualifier, reporting absence instead of erroring:
    /// `None` means the selected entry is not present. Errors and unknowns
    /// still travel as values.
    pub fn qualify_if_present(&self, vars: &dyn Activation, obj: &Value) -> Option<Value> {
        if obj.is_error() || obj.is_unknown() {
            return Some(obj.clone());
        }
        if let Value::Optional(opt) = obj {
            return match opt.as_ref() {
                None => None,
                Some(inner) => self.qualify_if_present(vars, inner),
            };
        }
        match self {
            Qualifier::Const(q) => presence(qualify_value(&q.key, obj, true)),
            Qualifier::Field(q) => {
                if q.is_set(obj) {
                    Some(q.get_from(obj))
                } else {
                    None
                }
            }
            Qualifier::Attribute(q) => match q.key_from(vars) {
                Ok(key) => presence(qualify_value(&key, obj, true)),
                Err(terminal) => Some(terminal),
            },
            Qualifier::Unknown(q) => Some(Value::Unknown(q.value.clone())),
        }
    }
}

fn resolve_lookup(res: Result<Option<Value>, AttributeError>) -> Value {
    match res {
        Ok(Some(v)) => v,
        Ok(None) => Value::optional_none(),
        Err(e) => Value::error(e),
    }
}

fn presence(res: Result<Option<Value>, AttributeError>) -> Option<Value> {
    match res {
        Ok(Some(v)) => Some(v),
        Ok(None) => None,
        Err(e) => Some(Value::error(e)),
    }
}

fn const_key(v: &Value) -> Option<QualifierKey> {
    match v {
        Value::String(s) => Some(QualifierKey::String(s.clone())),
        Value::Int(i) => Some(QualifierKey::Int(*i)),
        Value::Uint(u) => Some(QualifierKey::Uint(*u)),
        Value::Bool(b) => Some(QualifierKey::Bool(*b)),
        _ => None,
    }
}

/// Map lookup with numeric key coercion: int and uint keys are numerically
/// equal for lookup purposes.
fn map_find(map: &BTreeMap<Value, Value>, key: &QualifierKey) -> Option<Value> {
    if let Some(v) = map.get(&key.to_value()) {
        return Some(v.clone());
    }
    match key {
        QualifierKey::Int(i) => match u64::try_from(*i) {
            Ok(u) => map.get(&Value::Uint(u)).cloned(),
            Err(_) => None,
        },
        QualifierKey::Uint(u) => match i64::try_from(*u) {
            Ok(i) => map.get(&Value::Int(i)).cloned(),
            Err(_) => None,
        },
        _ => None,
    }
}

/// Single key application against a base value. With `presence_test` set,
/// lookup misses report absence (`Ok(None)`) instead of erroring; per the
/// original semantics a presence test on an unqualifiable base is also
/// treated as absent.
fn qualify_value(
    key: &QualifierKey,
    obj: &Value,
    presence_test: bool,
) -> Result<Option<Value>, AttributeError> {
    match obj {
        Value::Map(map) => match map_find(map, key) {
            Some(v) => Ok(Some(v)),
            None if presence_test => Ok(None),
            None => Err(AttributeError::NoSuchKey(key.to_string())),
        },
        Value::List(list) => {
            let Some(idx) = key.index() else {
                return Err(AttributeError::NoSuchOverload(format!(
                    "list index with {}",
                    key.type_of()
                )));
            };
            if idx >= 0 && (idx as usize) < list.len() {
                Ok(Some(list[idx as usize].clone()))
            } else if presence_test {
                Ok(None)
            } else {
                Err(AttributeError::IndexOutOfBounds(idx))
            }
        }
        Value::Struct(s) => match key {
            QualifierKey::String(name) => match s.field(name) {
                Some(v) => Ok(Some(v.clone())),
                None if presence_test => Ok(None),
                None => Err(AttributeError::NoSuchKey(name.to_string())),
            },
            _ if presence_test => Ok(None),
            _ => Err(AttributeError::NoSuchKey(key.to_string())),
        },
        _ if presence_test => Ok(None),
        _ => Err(AttributeError::UnsupportedQualifierBase),
    }
}

/// Folds a qualifier chain over a base value.
///
/// Optional mode is threaded through the fold as an explicit accumulator:
/// it begins when the base is optional or any qualifier in the chain is
/// optional, switches every later step to presence testing, and wraps the
/// final result in an optional. Errors and unknowns are terminal; absent
/// optionals short-circuit the rest of the chain.
fn apply_qualifiers(vars: &dyn Activation, obj: &Value, qualifiers: &[Qualifier]) -> Value {
    let (mut obj, mut opt_mode) = match obj {
        Value::Optional(opt) => match opt.as_ref() {
            None => return obj.clone(),
            Some(inner) => (inner.clone(), true),
        },
        v => (v.clone(), false),
    };

    for qual in qualifiers {
        if obj.is_error() || obj.is_unknown() {
            return obj;
        }
        if opt_mode || qual.is_optional() {
            let Some(out) = qual.qualify_if_present(vars, &obj) else {
                return Value::optional_none();
            };
            if out.is_error() || out.is_unknown() {
                return out;
            }
            opt_mode = true;
            // Collapse any optional stored in the data itself.
            obj = match out {
                Value::Optional(opt) => match opt.as_ref() {
                    None => return Value::optional_none(),
                    Some(inner) => inner.clone(),
                },
                other => other,
            };
        } else {
            let out = qual.qualify(vars, &obj);
            if out.is_error() || out.is_unknown() {
                return out;
            }
            obj = match out {
                Value::Optional(opt) => match opt.as_ref() {
                    None => return Value::optional_none(),
                    Some(inner) => {
                        opt_mode = true;
                        inner.clone()
                    }
                },
                other => other,
            };
        }
    }

    if opt_mode {
        Value::optional_of(obj)
    } else {
        obj
    }
}

/// A variable within a namespace: the ordered namespace-qualified names the
/// variable could have, plus trailing qualifiers. Checked expressions carry
/// a single name; parse-only expressions may carry several in namespace
/// resolution order.
#[derive(Clone)]
pub struct AbsoluteAttribute {
    id: i64,
    names: Vec<Rc<str>>,
    qualifiers: Vec<Qualifier>,
    registry: Rc<TypeRegistry>,
}

impl AbsoluteAttribute {
    pub fn id(&self) -> i64 {
        match self.qualifiers.last() {
            Some(q) => q.id(),
            None => self.id,
        }
    }

    /// Possible namespaced variable names, most specific first.
    pub fn candidate_variable_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|n| n.as_ref())
    }

    pub fn qualifiers(&self) -> &[Qualifier] {
        &self.qualifiers
    }

    pub fn add_qualifier(&mut self, qualifier: Qualifier) -> &mut Self {
        self.qualifiers.push(qualifier);
        self
    }

    /// Resolves the first candidate name bound in the activation and folds
    /// the qualifier chain over it. A name which is not a variable may
    /// still resolve as a type identifier when nothing is selected on it.
    pub fn resolve(&self, vars: &dyn Activation) -> Value {
        for name in &self.names {
            if let Some(obj) = vars.resolve_name(name) {
                // A variable bound to an error propagates unchanged.
                if obj.is_error() {
                    return obj;
                }
                return apply_qualifiers(vars, &obj, &self.qualifiers);
            }
            if self.qualifiers.is_empty() {
                if let Some(typ) = self.registry.find_ident(name) {
                    return typ;
                }
            }
        }
        Value::error(AttributeError::NoSuchAttribute(self.joined_names()))
    }

    fn joined_names(&self) -> String {
        self.names
            .iter()
            .map(|n| n.as_ref())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A qualification of a dynamic computation rather than a static variable
/// reference, e.g. selections on a map literal or a function result.
#[derive(Clone)]
pub struct RelativeAttribute {
    id: i64,
    operand: Rc<dyn Evaluable>,
    qualifiers: Vec<Qualifier>,
}

impl RelativeAttribute {
    pub fn id(&self) -> i64 {
        match self.qualifiers.last() {
            Some(q) => q.id(),
            None => self.id,
        }
    }

    pub fn add_qualifier(&mut self, qualifier: Qualifier) -> &mut Self {
        self.qualifiers.push(qualifier);
        self
    }

    pub fn resolve(&self, vars: &dyn Activation) -> Value {
        let obj = self.operand.eval(vars);
        if obj.is_error() || obj.is_unknown() {
            return obj;
        }
        apply_qualifiers(vars, &obj, &self.qualifiers)
    }
}

/// Two attribute branches; which one resolves depends on the boolean
/// evaluation of the condition.
#[derive(Clone)]
pub struct ConditionalAttribute {
    id: i64,
    condition: Rc<dyn Evaluable>,
    truthy: Box<Attribute>,
    falsy: Box<Attribute>,
}

impl ConditionalAttribute {
    pub fn id(&self) -> i64 {
        // A field access after the conditional gives both branches the
        // same trailing id.
        if self.truthy.id() == self.falsy.id() {
            return self.truthy.id();
        }
        self.id
    }

    /// Appends the qualifier to both branches, so whichever branch is
    /// selected at evaluation time carries the same trailing selectors.
    pub fn add_qualifier(&mut self, qualifier: Qualifier) -> &mut Self {
        self.truthy.add_qualifier(qualifier.clone());
        self.falsy.add_qualifier(qualifier);
        self
    }

    pub fn resolve(&self, vars: &dyn Activation) -> Value {
        let cond = self.condition.eval(vars);
        match cond {
            Value::Bool(true) => self.truthy.resolve(vars),
            Value::Bool(false) => self.falsy.resolve(vars),
            Value::Error(_) | Value::Unknown(_) => cond,
            other => Value::error(AttributeError::NoSuchOverload(
                other.type_of().to_string(),
            )),
        }
    }
}

/// Either a namespaced variable name or a field selection on a shorter
/// one; only expressions which have not been type-checked produce these.
#[derive(Clone)]
pub struct MaybeAttribute {
    id: i64,
    candidates: Vec<AbsoluteAttribute>,
    registry: Rc<TypeRegistry>,
}

impl MaybeAttribute {
    pub fn id(&self) -> i64 {
        self.candidates[0].id()
    }

    pub fn candidates(&self) -> &[AbsoluteAttribute] {
        &self.candidates
    }

    /// Adds the qualifier to every candidate. A constant string qualifier
    /// on a candidate with no qualifiers yet could equally be part of a
    /// longer variable name, so the dot-augmented names are prepended as a
    /// new candidate and searched first:
    ///
    ///   maybe(`a`) in namespace `ns`   -- candidates `ns.a`, `a`
    ///   add_qualifier(`b`)             -- candidates `ns.a.b`, `a.b`,
    ///                                     then `ns.a`/`a` qualified by `b`
    pub fn add_qualifier(&mut self, qualifier: Qualifier) -> &mut Self {
        let mut augmented: Vec<Rc<str>> = Vec::new();
        if let Some(field) = qualifier.as_field_name() {
            for attr in &self.candidates {
                if attr.qualifiers.is_empty() {
                    augmented.extend(
                        attr.names.iter().map(|name| Rc::from(format!("{name}.{field}"))),
                    );
                }
            }
        }
        for attr in &mut self.candidates {
            attr.add_qualifier(qualifier.clone());
        }
        // The most specific variable reference is searched first.
        if !augmented.is_empty() {
            self.candidates.insert(
                0,
                AbsoluteAttribute {
                    id: self.id,
                    names: augmented,
                    qualifiers: Vec::new(),
                    registry: self.registry.clone(),
                },
            );
        }
        self
    }

    /// Follows variable resolution rules to determine whether the
    /// attribute is a variable or a field selection: the first candidate
    /// whose base variable is bound wins outright. Missing-variable errors
    /// are deferred until every candidate has been tried; any other error
    /// returns immediately.
    pub fn resolve(&self, vars: &dyn Activation) -> Value {
        let mut missing: Option<Value> = None;
        for attr in &self.candidates {
            let obj = attr.resolve(vars);
            if let Value::Error(err) = &obj {
                if matches!(err.as_ref(), AttributeError::NoSuchAttribute(_)) {
                    if missing.is_none() {
                        missing = Some(obj);
                    }
                    continue;
                }
            }
            return obj;
        }
        missing.unwrap_or_else(|| {
            Value::error(AttributeError::NoSuchAttribute(
                self.candidates[0].joined_names(),
            ))
        })
    }
}

/// A compiled, resolvable reference to a value, rooted at a variable,
/// sub-expression, branch choice, or namespace-ambiguous name.
#[derive(Clone)]
pub enum Attribute {
    Absolute(AbsoluteAttribute),
    Relative(RelativeAttribute),
    Conditional(ConditionalAttribute),
    Maybe(MaybeAttribute),
}

impl Attribute {
    pub fn id(&self) -> i64 {
        match self {
            Attribute::Absolute(a) => a.id(),
            Attribute::Relative(a) => a.id(),
            Attribute::Conditional(a) => a.id(),
            Attribute::Maybe(a) => a.id(),
        }
    }

    /// Appends a selector; conditional attributes fan out to both branches
    /// and maybe attributes to every candidate.
    pub fn add_qualifier(&mut self, qualifier: Qualifier) -> &mut Self {
        match self {
            Attribute::Absolute(a) => {
                a.add_qualifier(qualifier);
            }
            Attribute::Relative(a) => {
                a.add_qualifier(qualifier);
            }
            Attribute::Conditional(a) => {
                a.add_qualifier(qualifier);
            }
            Attribute::Maybe(a) => {
                a.add_qualifier(qualifier);
            }
        }
        self
    }

    /// Resolves the attribute against an activation. Unresolvable
    /// variables, lookup misses and unqualifiable bases come back as error
    /// values; optional-chain misses come back as the absent optional.
    pub fn resolve(&self, vars: &dyn Activation) -> Value {
        match self {
            Attribute::Absolute(a) => a.resolve(vars),
            Attribute::Relative(a) => a.resolve(vars),
            Attribute::Conditional(a) => a.resolve(vars),
            Attribute::Maybe(a) => a.resolve(vars),
        }
    }
}

impl From<AbsoluteAttribute> for Attribute {
    fn from(a: AbsoluteAttribute) -> Self {
        Attribute::Absolute(a)
    }
}

impl From<RelativeAttribute> for Attribute {
    fn from(a: RelativeAttribute) -> Self {
        Attribute::Relative(a)
    }
}

impl From<ConditionalAttribute> for Attribute {
    fn from(a: ConditionalAttribute) -> Self {
        Attribute::Conditional(a)
    }
}

impl From<MaybeAttribute> for Attribute {
    fn from(a: MaybeAttribute) -> Self {
        Attribute::Maybe(a)
    }
}

/// Sole constructor for attributes and qualifiers. Holds the namespace
/// container used for maybe-attribute candidate expansion and the type
/// registry used for statically-typed field qualifiers; construction never
/// touches an activation.
#[derive(Clone)]
pub struct AttributeFactory {
    container: Rc<Container>,
    registry: Rc<TypeRegistry>,
}

impl AttributeFactory {
    pub fn new(container: Rc<Container>, registry: Rc<TypeRegistry>) -> Self {
        Self {
            container,
            registry,
        }
    }

    fn namespaced(&self, id: i64, names: Vec<Rc<str>>) -> AbsoluteAttribute {
        AbsoluteAttribute {
            id,
            names,
            qualifiers: Vec::new(),
            registry: self.registry.clone(),
        }
    }

    /// An attribute referring to a top-level variable name.
    pub fn absolute_attribute(&self, id: i64, name: impl Into<Rc<str>>) -> Attribute {
        Attribute::Absolute(self.namespaced(id, vec![name.into()]))
    }

    /// An attribute whose value is a qualification of a dynamic
    /// computation rather than a static variable reference.
    pub fn relative_attribute(&self, id: i64, operand: Rc<dyn Evaluable>) -> Attribute {
        Attribute::Relative(RelativeAttribute {
            id,
            operand,
            qualifiers: Vec::new(),
        })
    }

    /// An attribute with two branches, selected by the boolean evaluation
    /// of the condition.
    pub fn conditional_attribute(
        &self,
        id: i64,
        condition: Rc<dyn Evaluable>,
        truthy: Attribute,
        falsy: Attribute,
    ) -> Attribute {
        Attribute::Conditional(ConditionalAttribute {
            id,
            condition,
            truthy: Box::new(truthy),
            falsy: Box::new(falsy),
        })
    }

    /// An attribute referring to either a namespaced variable name or a
    /// field selection; the candidate names are expanded through the
    /// container, most specific first.
    pub fn maybe_attribute(&self, id: i64, name: &str) -> Attribute {
        let names = self
            .container
            .resolve_candidate_names(name)
            .into_iter()
            .map(Rc::from)
            .collect();
        Attribute::Maybe(MaybeAttribute {
            id,
            candidates: vec![self.namespaced(id, names)],
            registry: self.registry.clone(),
        })
    }

    /// A qualifier over the given key. When the qualified object type is a
    /// registered struct and the key names one of its fields, the
    /// qualifier carries the declared field type for direct access.
    /// Invalid key types and unknown struct types or fields are errors,
    /// never panics.
    pub fn new_qualifier(
        &self,
        obj_type: Option<&CelType>,
        id: i64,
        key: Value,
        optional: bool,
    ) -> Result<Qualifier> {
        if let (Some(CelType::Struct(type_name)), Value::String(field)) = (obj_type, &key) {
            let field_type = self.registry.find_struct_field_type(type_name, field)?;
            return Ok(Qualifier::Field(FieldQualifier {
                id,
                name: field.clone(),
                field_type,
                optional,
            }));
        }
        match key {
            Value::String(s) => Ok(Qualifier::Const(ConstQualifier {
                id,
                key: QualifierKey::String(s),
                optional,
            })),
            Value::Int(i) => Ok(Qualifier::Const(ConstQualifier {
                id,
                key: QualifierKey::Int(i),
                optional,
            })),
            Value::Uint(u) => Ok(Qualifier::Const(ConstQualifier {
                id,
                key: QualifierKey::Uint(u),
                optional,
            })),
            Value::Bool(b) => Ok(Qualifier::Const(ConstQualifier {
                id,
                key: QualifierKey::Bool(b),
                optional,
            })),
            Value::Unknown(u) => Ok(Qualifier::Unknown(UnknownQualifier { id, value: u })),
            other => bail!("invalid qualifier key type: {}", other.type_of()),
        }
    }

    /// A qualifier whose key is computed at evaluation time by resolving
    /// another attribute, e.g. the `[b]` in `a[-1][b]`.
    pub fn attribute_qualifier(&self, id: i64, attr: Attribute, optional: bool) -> Qualifier {
        Qualifier::Attribute(Box::new(AttrQualifier { id, attr, optional }))
    }
}

// Path-string rendering: string keys select fields, other keys index, and
// optional steps carry a leading '?'.
impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Qualifier::Const(q) => {
                let opt = if q.optional { "?" } else { "" };
                match &q.key {
                    QualifierKey::String(s) => write!(f, ".{opt}{s}"),
                    key => write!(f, "[{opt}{key}]"),
                }
            }
            Qualifier::Field(q) => {
                let opt = if q.optional { "?" } else { "" };
                write!(f, ".{opt}{}", q.name)
            }
            Qualifier::Attribute(q) => {
                let opt = if q.optional { "?" } else { "" };
                write!(f, "[{opt}{}]", q.attr)
            }
            Qualifier::Unknown(q) => write!(f, "[<unknown: {:?}>]", q.value.ids()),
        }
    }
}

impl fmt::Display for AbsoluteAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.names[0])?;
        for q in &self.qualifiers {
            write!(f, "{q}")?;
        }
        Ok(())
    }
}

impl fmt::Display for RelativeAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(#{})", self.id)?;
        for q in &self.qualifiers {
            write!(f, "{q}")?;
        }
        Ok(())
    }
}

impl fmt::Display for ConditionalAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(?{}:{})", self.truthy, self.falsy)
    }
}

impl fmt::Display for MaybeAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.candidates[0])
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Absolute(a) => a.fmt(f),
            Attribute::Relative(a) => a.fmt(f),
            Attribute::Conditional(a) => a.fmt(f),
            Attribute::Maybe(a) => a.fmt(f),
        }
    }
}
