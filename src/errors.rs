// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use thiserror::Error;

/// Evaluation-time failures produced during attribute resolution.
///
/// These travel inside [`Value::Error`](crate::Value) rather than as `Err`:
/// an error is a terminal value for the qualification pipeline and flows
/// unchanged to the caller. Construction-time failures (e.g. an invalid
/// qualifier key handed to the factory) surface as `anyhow::Error` instead.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Error)]
pub enum AttributeError {
    /// No candidate variable name could be resolved in the Activation.
    #[error("no such attribute(s): {0}")]
    NoSuchAttribute(String),
    /// Map or struct lookup miss on a non-optional qualifier.
    #[error("no such key: {0}")]
    NoSuchKey(String),
    /// List lookup miss on a non-optional qualifier.
    #[error("index out of bounds: {0}")]
    IndexOutOfBounds(i64),
    /// A struct or Any payload whose declared type is not registered.
    #[error("unknown type: '{0}'")]
    UnknownType(String),
    /// An operation was applied to a value kind it does not support.
    #[error("no such overload: {0}")]
    NoSuchOverload(String),
    /// The qualifier base value cannot be qualified at all.
    #[error("unsupported qualifier base type")]
    UnsupportedQualifierBase,
    /// A runtime-computed qualifier key was not a valid key type.
    #[error("invalid qualifier: {0}")]
    InvalidQualifier(String),
    /// An upstream computation failed; propagated unchanged, never wrapped.
    #[error("{0}")]
    Message(String),
}
