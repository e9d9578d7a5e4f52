//! Conversion implementations for Value.
//!
//! Contains From/TryFrom implementations between `Value` and Rust primitives,
//! arrays and records.

use std::convert::TryFrom;

use super::{Iterable, Value};
use crate::structs::array_value::ArrayValue;
use crate::structs::record::StructValue;
use crate::{ArrayError, Scalar};

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                #[inline]
                fn from(v: $t) -> Self {
                    Value::Int(v as i64)
                }
            }
        )*
    };
}

impl_from_int!(i32, u32, i64);

impl From<bool> for Value {
    #[inline]
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    #[inline]
    fn from(v: f32) -> Self {
        Value::Float(v as f64)
    }
}

impl From<f64> for Value {
    #[inline]
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl From<ArrayValue> for Value {
    #[inline]
    fn from(v: ArrayValue) -> Self {
        Value::Array(v)
    }
}

impl From<StructValue> for Value {
    #[inline]
    fn from(v: StructValue) -> Self {
        Value::Struct(v)
    }
}

impl From<Iterable> for Value {
    #[inline]
    fn from(v: Iterable) -> Self {
        Value::Iterable(v)
    }
}

impl TryFrom<Scalar> for Value {
    type Error = ArrayError;

    fn try_from(s: Scalar) -> Result<Self, Self::Error> {
        s.to_value()
    }
}

impl TryFrom<Value> for ArrayValue {
    type Error = ArrayError;

    fn try_from(v: Value) -> Result<Self, Self::Error> {
        match v {
            Value::Array(a) => Ok(a),
            other => Err(ArrayError::type_error(format!(
                "expected an array, got '{}'.",
                other.type_name()
            ))),
        }
    }
}

impl TryFrom<&Value> for i64 {
    type Error = ArrayError;

    fn try_from(v: &Value) -> Result<Self, Self::Error> {
        match v {
            Value::Int(i) => Ok(*i),
            Value::Bool(b) => Ok(*b as i64),
            other => Err(ArrayError::Conversion {
                value: other.describe(),
                target: "int",
            }),
        }
    }
}

impl TryFrom<&Value> for f64 {
    type Error = ArrayError;

    fn try_from(v: &Value) -> Result<Self, Self::Error> {
        match v {
            Value::Float(x) => Ok(*x),
            Value::Int(i) => Ok(*i as f64),
            Value::Bool(b) => Ok(*b as u8 as f64),
            other => Err(ArrayError::Conversion {
                value: other.describe(),
                target: "float",
            }),
        }
    }
}

impl TryFrom<&Value> for bool {
    type Error = ArrayError;

    fn try_from(v: &Value) -> Result<Self, Self::Error> {
        match v {
            Value::Bool(b) => Ok(*b),
            other => Err(ArrayError::Conversion {
                value: other.describe(),
                target: "bool",
            }),
        }
    }
}
