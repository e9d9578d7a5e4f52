//! # **Composite Module** - *Nested Arrays*
//!
//! Fixed-size vectors, complex numbers, quaternions, matrices and dynamic arrays of
//! arrays all store their outer-axis entries as a list of [`Value`]s. Entries are
//! kept in the declared element type: plain host scalars for host scalar arrays,
//! arrays of the value type otherwise.

use std::sync::Arc;

use crate::kernels::construct::construct;
use crate::structs::array_value::Payload;
use crate::structs::descriptor::ElementType;
use crate::structs::meta::Extent;
use crate::traits::array_ops::{ArrayOps, Capabilities, check_index};
use crate::{ArrayError, ArrayResult, ArrayValue, Scalar, TypeRef, Value, VarType};

/// Capability table shared by every composite type.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticArrayOps;

/// Zero entry of `ty`'s element type.
pub(crate) fn element_zero(ty: &TypeRef) -> ArrayResult<Value> {
    match &ty.value {
        ElementType::Scalar(vt) => Scalar::zero(*vt).to_value(),
        ElementType::Array(t) => Ok(Value::Array(t.zero()?)),
    }
}

/// Converts `value` to `ty`'s element type, importing it when needed.
pub(crate) fn element_from(ty: &TypeRef, value: &Value) -> ArrayResult<Value> {
    match &ty.value {
        ElementType::Scalar(vt) => Scalar::from_value(value, *vt)?.to_value(),
        ElementType::Array(t) => match value {
            Value::Array(a) if Arc::ptr_eq(&a.ty, t) => Ok(value.clone()),
            other => Ok(Value::Array(construct(t, std::slice::from_ref(other), &[])?)),
        },
    }
}

/// C-style conversion of a host scalar entry.
fn cast_scalar(value: &Value, vt: VarType) -> ArrayResult<Value> {
    let scalar = match value {
        Value::Bool(b) => Scalar::Bool(*b),
        Value::Int(i) => Scalar::Int64(*i),
        Value::Float(x) => Scalar::Float64(*x),
        other => return Scalar::from_value(other, vt)?.to_value(),
    };
    scalar.cast(vt).to_value()
}

fn entries(array: &ArrayValue) -> ArrayResult<&Vec<Value>> {
    match &array.payload {
        Payload::Composite(items) => Ok(items),
        _ => Err(ArrayError::type_error(format!(
            "{}: payload is not a composite.",
            array.ty.name
        ))),
    }
}

impl ArrayOps for StaticArrayOps {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            init: true,
            cast: true,
            ..Capabilities::default()
        }
    }

    fn zero(&self, ty: &TypeRef) -> ArrayResult<ArrayValue> {
        let n = ty.meta.outer().fixed().unwrap_or(0);
        let items = (0..n)
            .map(|_| element_zero(ty))
            .collect::<ArrayResult<Vec<_>>>()?;
        Ok(ArrayValue::new(ty, Payload::Composite(items)))
    }

    fn init(&self, ty: &TypeRef, n: usize) -> ArrayResult<ArrayValue> {
        if let Extent::Fixed(k) = ty.meta.outer() {
            if k != n {
                return Err(ArrayError::SizeMismatch { expected: k, found: n });
            }
        }
        let items = (0..n)
            .map(|_| element_zero(ty))
            .collect::<ArrayResult<Vec<_>>>()?;
        Ok(ArrayValue::new(ty, Payload::Composite(items)))
    }

    fn cast(&self, ty: &TypeRef, src: &ArrayValue) -> ArrayResult<ArrayValue> {
        let items = entries(src)?
            .iter()
            .map(|item| match &ty.value {
                ElementType::Scalar(vt) => cast_scalar(item, *vt),
                ElementType::Array(_) => element_from(ty, item),
            })
            .collect::<ArrayResult<Vec<_>>>()?;
        Ok(ArrayValue::new(ty, Payload::Composite(items)))
    }

    fn len(&self, array: &ArrayValue) -> ArrayResult<usize> {
        Ok(entries(array)?.len())
    }

    fn get(&self, array: &ArrayValue, i: usize) -> ArrayResult<Value> {
        let items = entries(array)?;
        check_index(i, items.len())?;
        Ok(items[i].clone())
    }

    fn set(&self, array: &mut ArrayValue, i: usize, value: &Value) -> ArrayResult<()> {
        let entry = element_from(&array.ty, value)?;
        match &mut array.payload {
            Payload::Composite(items) => {
                check_index(i, items.len())?;
                items[i] = entry;
                Ok(())
            }
            _ => Err(ArrayError::type_error(format!(
                "{}: payload is not a composite.",
                array.ty.name
            ))),
        }
    }
}
