// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Runtime type reflection and the struct type registry.

use crate::errors::AttributeError;
use crate::value::{StructValue, Value};

use core::fmt;
use std::collections::BTreeMap;
use std::rc::Rc;

use anyhow::{bail, Result};

/// Runtime type of a CEL value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum CelType {
    Null,
    Bool,
    Int,
    Uint,
    Double,
    String,
    Bytes,
    List,
    Map,
    /// A registered message type, addressed by its fully qualified name.
    Struct(Rc<str>),
    Type,
    Error,
    Unknown,
    Optional,
}

impl CelType {
    pub fn name(&self) -> &str {
        match self {
            CelType::Null => "null_type",
            CelType::Bool => "bool",
            CelType::Int => "int",
            CelType::Uint => "uint",
            CelType::Double => "double",
            CelType::String => "string",
            CelType::Bytes => "bytes",
            CelType::List => "list",
            CelType::Map => "map",
            CelType::Struct(name) => name,
            CelType::Type => "type",
            CelType::Error => "error",
            CelType::Unknown => "unknown",
            CelType::Optional => "optional_type",
        }
    }
}

impl fmt::Display for CelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declared type of a single struct field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldType {
    ty: CelType,
}

impl FieldType {
    pub fn new(ty: CelType) -> Self {
        Self { ty }
    }

    pub fn ty(&self) -> &CelType {
        &self.ty
    }

    /// Value of a field which is declared in the schema but unset on a
    /// struct value. Proto semantics: absence of a scalar field is its
    /// zero value, not an error.
    pub fn zero_value(&self) -> Value {
        match &self.ty {
            CelType::Bool => Value::Bool(false),
            CelType::Int => Value::Int(0),
            CelType::Uint => Value::Uint(0),
            CelType::Double => Value::Double(0.0),
            CelType::String => Value::String("".into()),
            CelType::Bytes => Value::Bytes(Rc::new(Vec::new())),
            CelType::List => Value::new_list(),
            CelType::Map => Value::new_map(),
            CelType::Struct(name) => Value::from(StructValue::new(name.clone())),
            _ => Value::Null,
        }
    }
}

/// Schema for a registered struct/message type: a named set of typed,
/// field-addressable members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructType {
    name: Rc<str>,
    fields: BTreeMap<Rc<str>, FieldType>,
}

impl StructType {
    pub fn new(name: impl Into<Rc<str>>) -> Self {
        Self {
            name: name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field declaration.
    pub fn with_field(mut self, name: impl Into<Rc<str>>, ty: CelType) -> Self {
        self.fields.insert(name.into(), FieldType::new(ty));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(&self, name: &str) -> Option<&FieldType> {
        self.fields.get(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_ref())
    }
}

/// Registry of struct schemas and resolvable type identifiers.
///
/// The attribute factory consults the registry when planning statically
/// typed field qualifiers, and absolute attributes fall back to it so that
/// bare type names (`int`, `string`, a registered message name) resolve to
/// type values when no variable shadows them.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    structs: BTreeMap<Rc<str>, Rc<StructType>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_struct(&mut self, st: StructType) -> Result<()> {
        if st.name().is_empty() {
            bail!("struct registration failed: empty type name");
        }
        if self.structs.contains_key(st.name()) {
            bail!("struct registration failed: '{}' is already registered", st.name());
        }
        self.structs.insert(st.name.clone(), Rc::new(st));
        Ok(())
    }

    pub fn find_struct(&self, name: &str) -> Option<Rc<StructType>> {
        self.structs.get(name).cloned()
    }

    /// Field metadata for a registered struct type. Errors when the type is
    /// not registered or has no such field; the factory reports these
    /// rather than panicking.
    pub fn find_struct_field_type(&self, type_name: &str, field: &str) -> Result<FieldType> {
        let Some(st) = self.structs.get(type_name) else {
            bail!(AttributeError::UnknownType(type_name.to_string()));
        };
        match st.field(field) {
            Some(ft) => Ok(ft.clone()),
            None => bail!("no such field: '{field}' on type '{type_name}'"),
        }
    }

    /// Resolves an identifier which is not a variable to a type value, if
    /// it names a built-in type or a registered struct.
    pub fn find_ident(&self, name: &str) -> Option<Value> {
        let ty = match name {
            "null_type" => CelType::Null,
            "bool" => CelType::Bool,
            "int" => CelType::Int,
            "uint" => CelType::Uint,
            "double" => CelType::Double,
            "string" => CelType::String,
            "bytes" => CelType::Bytes,
            "list" => CelType::List,
            "map" => CelType::Map,
            "type" => CelType::Type,
            "optional_type" => CelType::Optional,
            _ => {
                let st = self.structs.get(name)?;
                CelType::Struct(st.name.clone())
            }
        };
        Some(Value::Type(ty))
    }
}
