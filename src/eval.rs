// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::activation::Activation;
use crate::value::Value;

/// Evaluation capability supplied by the interpreter for relative-attribute
/// operands and conditional-attribute conditions. The attribute engine only
/// consumes this boundary; it never plans sub-expressions itself.
pub trait Evaluable {
    /// ID of the expression node this evaluation represents.
    fn id(&self) -> i64;

    /// Evaluates against the activation. Failures are returned as error
    /// values, never as host errors.
    fn eval(&self, vars: &dyn Activation) -> Value;
}

/// A constant-valued operand produced at plan time.
#[derive(Debug, Clone)]
pub struct ConstValue {
    id: i64,
    value: Value,
}

impl ConstValue {
    pub fn new(id: i64, value: Value) -> Self {
        Self { id, value }
    }
}

impl Evaluable for ConstValue {
    fn id(&self) -> i64 {
        self.id
    }

    fn eval(&self, _vars: &dyn Activation) -> Value {
        self.value.clone()
    }
}
