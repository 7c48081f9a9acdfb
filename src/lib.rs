// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

// Use README.md as crate documentation.
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

mod activation;
mod attributes;
mod container;
mod errors;
mod eval;
mod types;
mod value;

pub use activation::{Activation, EmptyActivation, HierarchicalActivation, MapActivation};
pub use attributes::{
    AbsoluteAttribute, Attribute, AttributeFactory, AttrQualifier, ConditionalAttribute,
    ConstQualifier, FieldQualifier, MaybeAttribute, Qualifier, QualifierKey, RelativeAttribute,
    UnknownQualifier,
};
pub use container::Container;
pub use errors::AttributeError;
pub use eval::{ConstValue, Evaluable};
pub use types::{CelType, FieldType, StructType, TypeRegistry};
pub use value::{StructValue, Unknown, Value};

#[cfg(test)]
mod tests;
