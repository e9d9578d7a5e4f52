//! # DType Module
//!
//! Target types accepted by the structured generators (`full`, `zeros`, `arange`, ..),
//! and the shape argument that goes with them.

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use crate::structs::record::StructType;
use crate::{ArrayError, ArrayResult, Scalar, TypeRef, Value, VarType};

/// Anything a generator can produce.
///
/// `Bool`, `Int` and `Float` are the untyped host scalars of [`Value`].
#[derive(Clone)]
pub enum DType {
    Bool,
    Int,
    Float,
    Array(TypeRef),
    Struct(Arc<StructType>),
}

impl DType {
    pub fn name(&self) -> String {
        match self {
            DType::Bool => "bool".into(),
            DType::Int => "int".into(),
            DType::Float => "float".into(),
            DType::Array(t) => t.name.clone(),
            DType::Struct(s) => s.name.clone(),
        }
    }

    /// Converts `value` to a host scalar of this dtype (`bool(v)`, `int(v)`, `float(v)`),
    /// or produces zero when no value is given.
    pub(crate) fn host_scalar(&self, value: Option<&Value>) -> ArrayResult<Value> {
        let vt = match self {
            DType::Bool => VarType::Bool,
            DType::Int => VarType::Int64,
            DType::Float => VarType::Float64,
            other => {
                return Err(ArrayError::type_error(format!(
                    "'{}' is not a host scalar type.",
                    other.name()
                )));
            }
        };
        let Some(value) = value else {
            return Scalar::zero(vt).to_value();
        };
        let scalar = match value {
            Value::Bool(b) => Scalar::Bool(*b),
            Value::Int(i) => Scalar::Int64(*i),
            Value::Float(x) => Scalar::Float64(*x),
            other => {
                return Err(ArrayError::Conversion {
                    value: other.describe(),
                    target: vt.name(),
                });
            }
        };
        scalar.cast(vt).to_value()
    }
}

impl PartialEq for DType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DType::Bool, DType::Bool) | (DType::Int, DType::Int) | (DType::Float, DType::Float) => true,
            (DType::Array(a), DType::Array(b)) => Arc::ptr_eq(a, b),
            (DType::Struct(a), DType::Struct(b)) => a == b,
            _ => false,
        }
    }
}

impl Debug for DType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "DType({})", self.name())
    }
}

impl From<TypeRef> for DType {
    fn from(t: TypeRef) -> Self {
        DType::Array(t)
    }
}

impl From<&TypeRef> for DType {
    fn from(t: &TypeRef) -> Self {
        DType::Array(t.clone())
    }
}

impl From<Arc<StructType>> for DType {
    fn from(s: Arc<StructType>) -> Self {
        DType::Struct(s)
    }
}

/// Requested output shape: either a full per-axis shape, or a single size from
/// which the shape is inferred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeSpec {
    Size(usize),
    Shape(Vec<usize>),
}

impl From<usize> for ShapeSpec {
    fn from(n: usize) -> Self {
        ShapeSpec::Size(n)
    }
}

impl From<Vec<usize>> for ShapeSpec {
    fn from(v: Vec<usize>) -> Self {
        ShapeSpec::Shape(v)
    }
}

impl From<&[usize]> for ShapeSpec {
    fn from(v: &[usize]) -> Self {
        ShapeSpec::Shape(v.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for ShapeSpec {
    fn from(v: [usize; N]) -> Self {
        ShapeSpec::Shape(v.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_scalar_conversion() {
        assert_eq!(DType::Bool.host_scalar(Some(&Value::Int(3))).unwrap(), Value::Bool(true));
        assert_eq!(DType::Int.host_scalar(Some(&Value::Float(2.7))).unwrap(), Value::Int(2));
        assert_eq!(DType::Float.host_scalar(None).unwrap(), Value::Float(0.0));
        assert!(DType::Int.host_scalar(Some(&Value::None)).is_err());
    }
}
