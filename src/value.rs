// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::errors::AttributeError;
use crate::types::CelType;

use core::fmt;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::rc::Rc;

use anyhow::{anyhow, bail, Result};
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

// We cannot use serde_json::Value because CEL distinguishes int, uint and
// double, map keys can be non-string values, and evaluation outcomes
// (error, unknown, absent-optional) are first-class values.
// BTree keeps maps ordered and cheap to compare.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Double(f64),
    String(Rc<str>),
    Bytes(Rc<Vec<u8>>),
    List(Rc<Vec<Value>>),
    Map(Rc<BTreeMap<Value, Value>>),

    /// A named, field-addressable record backed by a registered type.
    Struct(Rc<StructValue>),

    /// A runtime type value, e.g. the result of resolving the ident `int`.
    Type(CelType),

    // Non-value outcomes. Both are terminal for qualification: once
    // produced, no further qualifier applies and the value flows unchanged.
    Error(Rc<AttributeError>),
    Unknown(Rc<Unknown>),

    /// Zero or one inner value; never nested.
    Optional(Rc<Option<Value>>),
}

/// A struct/message value: a type name plus set fields. Fields declared in
/// the schema but absent here are "unset" and read as their zero value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct StructValue {
    type_name: Rc<str>,
    fields: BTreeMap<Rc<str>, Value>,
}

impl StructValue {
    pub fn new(type_name: impl Into<Rc<str>>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<Rc<str>>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn fields(&self) -> &BTreeMap<Rc<str>, Value> {
        &self.fields
    }
}

/// Placeholder recording which expression ids were not known at evaluation
/// time, used for partial/symbolic evaluation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Unknown {
    ids: Vec<i64>,
}

impl Unknown {
    pub fn new(id: i64) -> Self {
        Self { ids: vec![id] }
    }

    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    /// Union of the attribute trails of two unknowns.
    pub fn merge(&self, other: &Unknown) -> Unknown {
        let mut ids = self.ids.clone();
        ids.extend_from_slice(&other.ids);
        ids.sort_unstable();
        ids.dedup();
        Unknown { ids }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::Error;
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Uint(u) => serializer.serialize_u64(*u),
            Value::Double(d) => serializer.serialize_f64(*d),
            Value::String(s) => serializer.serialize_str(s.as_ref()),
            Value::Bytes(b) => serializer.serialize_bytes(b),
            Value::List(a) => a.serialize(serializer),
            Value::Map(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (k, v) in fields.iter() {
                    match k {
                        Value::String(_) => map.serialize_entry(k, v)?,
                        _ => {
                            let key_str = serde_json::to_string(k).map_err(Error::custom)?;
                            map.serialize_entry(&key_str, v)?
                        }
                    }
                }
                map.end()
            }
            Value::Struct(s) => {
                let mut map = serializer.serialize_map(Some(s.fields().len()))?;
                for (k, v) in s.fields().iter() {
                    map.serialize_entry(k.as_ref(), v)?;
                }
                map.end()
            }
            Value::Type(t) => serializer.serialize_str(t.name()),

            // Non-data variants display as sentinel strings.
            Value::Error(e) => serializer.serialize_str(&format!("<error: {e}>")),
            Value::Unknown(u) => serializer.serialize_str(&format!("<unknown: {:?}>", u.ids())),
            Value::Optional(o) => match o.as_ref() {
                Some(v) => v.serialize(serializer),
                None => serializer.serialize_str("<none>"),
            },
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a value")
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::Null)
    }

    fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::Int(v))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        // JSON integers land on int when they fit, uint beyond that.
        match i64::try_from(v) {
            Ok(i) => Ok(Value::Int(i)),
            Err(_) => Ok(Value::Uint(v)),
        }
    }

    fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::Double(v))
    }

    fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::String(s.to_string().into()))
    }

    fn visit_string<E>(self, s: String) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::String(s.into()))
    }

    fn visit_seq<V>(self, mut visitor: V) -> Result<Self::Value, V::Error>
    where
        V: SeqAccess<'de>,
    {
        let mut arr: Vec<Value> = vec![];
        while let Some(v) = visitor.next_element()? {
            arr.push(v);
        }
        Ok(Value::from(arr))
    }

    fn visit_map<V>(self, mut visitor: V) -> Result<Self::Value, V::Error>
    where
        V: MapAccess<'de>,
    {
        let mut map = BTreeMap::new();
        while let Some((key, value)) = visitor.next_entry()? {
            map.insert(key, value);
        }
        Ok(Value::from(map))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ValueVisitor)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(s) => write!(f, "{s}"),
            Err(_e) => Err(std::fmt::Error),
        }
    }
}

impl Value {
    pub fn new_map() -> Value {
        Value::from(BTreeMap::new())
    }

    pub fn new_list() -> Value {
        Value::from(Vec::<Value>::new())
    }

    /// The empty optional. Absence is a valid, continuable outcome of
    /// optional qualification, not an error.
    pub fn optional_none() -> Value {
        Value::Optional(Rc::new(None))
    }

    /// Wraps a value in an optional; an already-optional value is returned
    /// as is so optionals never nest.
    pub fn optional_of(value: Value) -> Value {
        match value {
            v @ Value::Optional(_) => v,
            v => Value::Optional(Rc::new(Some(v))),
        }
    }

    pub fn error(err: AttributeError) -> Value {
        Value::Error(Rc::new(err))
    }

    pub fn unknown(id: i64) -> Value {
        Value::Unknown(Rc::new(Unknown::new(id)))
    }

    pub fn from_json_str(json: &str) -> Result<Value> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_str(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Uint(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(Rc::new(b))
    }
}

impl From<Vec<Value>> for Value {
    fn from(a: Vec<Value>) -> Self {
        Value::List(Rc::new(a))
    }
}

impl From<BTreeMap<Value, Value>> for Value {
    fn from(m: BTreeMap<Value, Value>) -> Self {
        Value::Map(Rc::new(m))
    }
}

impl From<StructValue> for Value {
    fn from(s: StructValue) -> Self {
        Value::Struct(Rc::new(s))
    }
}

impl From<AttributeError> for Value {
    fn from(e: AttributeError) -> Self {
        Value::error(e)
    }
}

impl From<Unknown> for Value {
    fn from(u: Unknown) -> Self {
        Value::Unknown(Rc::new(u))
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown(_))
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, Value::Optional(_))
    }

    pub fn is_optional_none(&self) -> bool {
        matches!(self, Value::Optional(o) if o.is_none())
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            _ => Err(anyhow!("not a bool")),
        }
    }

    pub fn as_int(&self) -> Result<i64> {
        match self {
            Value::Int(i) => Ok(*i),
            _ => Err(anyhow!("not an int")),
        }
    }

    pub fn as_uint(&self) -> Result<u64> {
        match self {
            Value::Uint(u) => Ok(*u),
            _ => Err(anyhow!("not a uint")),
        }
    }

    pub fn as_double(&self) -> Result<f64> {
        match self {
            Value::Double(d) => Ok(*d),
            _ => Err(anyhow!("not a double")),
        }
    }

    pub fn as_string(&self) -> Result<&Rc<str>> {
        match self {
            Value::String(s) => Ok(s),
            _ => Err(anyhow!("not a string")),
        }
    }

    pub fn as_bytes(&self) -> Result<&Vec<u8>> {
        match self {
            Value::Bytes(b) => Ok(b),
            _ => Err(anyhow!("not bytes")),
        }
    }

    pub fn as_list(&self) -> Result<&Vec<Value>> {
        match self {
            Value::List(a) => Ok(a),
            _ => Err(anyhow!("not a list")),
        }
    }

    pub fn as_list_mut(&mut self) -> Result<&mut Vec<Value>> {
        match self {
            Value::List(a) => Ok(Rc::make_mut(a)),
            _ => Err(anyhow!("not a list")),
        }
    }

    pub fn as_map(&self) -> Result<&BTreeMap<Value, Value>> {
        match self {
            Value::Map(m) => Ok(m),
            _ => Err(anyhow!("not a map")),
        }
    }

    pub fn as_map_mut(&mut self) -> Result<&mut BTreeMap<Value, Value>> {
        match self {
            Value::Map(m) => Ok(Rc::make_mut(m)),
            _ => Err(anyhow!("not a map")),
        }
    }

    pub fn as_struct(&self) -> Result<&StructValue> {
        match self {
            Value::Struct(s) => Ok(s),
            _ => Err(anyhow!("not a struct")),
        }
    }
}

impl Value {
    pub fn type_of(&self) -> CelType {
        match self {
            Value::Null => CelType::Null,
            Value::Bool(_) => CelType::Bool,
            Value::Int(_) => CelType::Int,
            Value::Uint(_) => CelType::Uint,
            Value::Double(_) => CelType::Double,
            Value::String(_) => CelType::String,
            Value::Bytes(_) => CelType::Bytes,
            Value::List(_) => CelType::List,
            Value::Map(_) => CelType::Map,
            Value::Struct(s) => CelType::Struct(s.type_name.clone()),
            Value::Type(_) => CelType::Type,
            Value::Error(_) => CelType::Error,
            Value::Unknown(_) => CelType::Unknown,
            Value::Optional(_) => CelType::Optional,
        }
    }

    /// Structural equality as a value-level operation. Mismatched variants
    /// compare unequal rather than erroring; errors and unknowns propagate
    /// through the comparison unchanged.
    pub fn equal(&self, other: &Value) -> Value {
        match (self, other) {
            (Value::Error(_), _) => self.clone(),
            (_, Value::Error(_)) => other.clone(),
            (Value::Unknown(a), Value::Unknown(b)) => Value::from(a.merge(b)),
            (Value::Unknown(_), _) => self.clone(),
            (_, Value::Unknown(_)) => other.clone(),

            // Signed/unsigned integers are numerically comparable.
            (Value::Int(a), Value::Uint(b)) => {
                Value::Bool(u64::try_from(*a).map(|a| a == *b).unwrap_or(false))
            }
            (Value::Uint(a), Value::Int(b)) => {
                Value::Bool(i64::try_from(*a).map(|a| a == *b).unwrap_or(false))
            }

            // IEEE equality, not the total order used for map keys.
            (Value::Double(a), Value::Double(b)) => Value::Bool(a == b),

            (Value::Optional(a), Value::Optional(b)) => match (a.as_ref(), b.as_ref()) {
                (None, None) => Value::Bool(true),
                (Some(x), Some(y)) => x.equal(y),
                _ => Value::Bool(false),
            },

            (a, b) if core::mem::discriminant(a) == core::mem::discriminant(b) => {
                Value::Bool(a == b)
            }
            _ => Value::Bool(false),
        }
    }

    /// Type conversion as a value-level operation; failures are error
    /// values, never panics.
    pub fn convert_to_type(&self, ty: &CelType) -> Value {
        if self.is_error() || self.is_unknown() {
            return self.clone();
        }
        if &self.type_of() == ty {
            return self.clone();
        }
        if ty == &CelType::Type {
            return Value::Type(self.type_of());
        }
        match (self, ty) {
            (Value::Int(i), CelType::Uint) => match u64::try_from(*i) {
                Ok(u) => Value::Uint(u),
                Err(_) => conversion_error(&self.type_of(), ty),
            },
            (Value::Int(i), CelType::Double) => Value::Double(*i as f64),
            (Value::Uint(u), CelType::Int) => match i64::try_from(*u) {
                Ok(i) => Value::Int(i),
                Err(_) => conversion_error(&self.type_of(), ty),
            },
            (Value::Uint(u), CelType::Double) => Value::Double(*u as f64),
            (Value::Double(d), CelType::Int) => {
                if d.is_finite() && *d >= i64::MIN as f64 && *d <= i64::MAX as f64 {
                    Value::Int(*d as i64)
                } else {
                    conversion_error(&self.type_of(), ty)
                }
            }
            (Value::Double(d), CelType::Uint) => {
                if d.is_finite() && *d >= 0.0 && *d <= u64::MAX as f64 {
                    Value::Uint(*d as u64)
                } else {
                    conversion_error(&self.type_of(), ty)
                }
            }
            (Value::String(s), CelType::Int) => match s.parse::<i64>() {
                Ok(i) => Value::Int(i),
                Err(_) => conversion_error(&self.type_of(), ty),
            },
            (Value::String(s), CelType::Uint) => match s.parse::<u64>() {
                Ok(u) => Value::Uint(u),
                Err(_) => conversion_error(&self.type_of(), ty),
            },
            (Value::String(s), CelType::Double) => match s.parse::<f64>() {
                Ok(d) => Value::Double(d),
                Err(_) => conversion_error(&self.type_of(), ty),
            },
            (Value::String(s), CelType::Bytes) => Value::from(s.as_bytes().to_vec()),
            (Value::Bytes(b), CelType::String) => match core::str::from_utf8(b) {
                Ok(s) => Value::from(s),
                Err(_) => conversion_error(&self.type_of(), ty),
            },
            (Value::Bool(b), CelType::String) => Value::from(b.to_string()),
            (Value::Int(i), CelType::String) => Value::from(i.to_string()),
            (Value::Uint(u), CelType::String) => Value::from(u.to_string()),
            (Value::Double(d), CelType::String) => Value::from(d.to_string()),
            _ => conversion_error(&self.type_of(), ty),
        }
    }
}

fn conversion_error(from: &CelType, to: &CelType) -> Value {
    Value::error(AttributeError::Message(format!(
        "type conversion error from '{from}' to '{to}'"
    )))
}

fn variant_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Int(_) => 2,
        Value::Uint(_) => 3,
        Value::Double(_) => 4,
        Value::String(_) => 5,
        Value::Bytes(_) => 6,
        Value::List(_) => 7,
        Value::Map(_) => 8,
        Value::Struct(_) => 9,
        Value::Type(_) => 10,
        Value::Error(_) => 11,
        Value::Unknown(_) => 12,
        Value::Optional(_) => 13,
    }
}

// A total order (doubles via total_cmp) so values can key a BTreeMap. The
// value-level `equal` operation above is the CEL-visible comparison.
impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Uint(a), Value::Uint(b)) => a.cmp(b),
            (Value::Double(a), Value::Double(b)) => a.total_cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Bytes(a), Value::Bytes(b)) => a.cmp(b),
            (Value::List(a), Value::List(b)) => a.cmp(b),
            (Value::Map(a), Value::Map(b)) => a.cmp(b),
            (Value::Struct(a), Value::Struct(b)) => a.cmp(b),
            (Value::Type(a), Value::Type(b)) => a.cmp(b),
            (Value::Error(a), Value::Error(b)) => a.cmp(b),
            (Value::Unknown(a), Value::Unknown(b)) => a.cmp(b),
            (Value::Optional(a), Value::Optional(b)) => a.cmp(b),
            _ => variant_rank(self).cmp(&variant_rank(other)),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Value {
    /// Converts a JSON-shaped value into bindings for map construction,
    /// failing when the top level is not an object with string keys.
    pub fn into_bindings(self) -> Result<BTreeMap<String, Value>> {
        let m = match self {
            Value::Map(m) => m,
            other => bail!("expected a map of bindings, got {}", other.type_of()),
        };
        let mut bindings = BTreeMap::new();
        for (k, v) in m.iter() {
            match k {
                Value::String(name) => {
                    bindings.insert(name.to_string(), v.clone());
                }
                _ => bail!("binding names must be strings, got {}", k.type_of()),
            }
        }
        Ok(bindings)
    }
}
