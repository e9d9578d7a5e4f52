//! # **ArrayValue Module** - *Instances of Registered Types*
//!
//! An `ArrayValue` pairs a [`TypeRef`] with one of four payload layouts. All
//! element access goes through the type's [`crate::traits::array_ops::ArrayOps`]
//! table, so the payload layout is an implementation detail of the ops that own it.

use std::fmt::{Debug, Formatter};

use crate::structs::trace_handle::TraceHandle;
use crate::{ArrayError, ArrayResult, HostData, TypeRef, Value};

/// Storage of an array value.
#[derive(Clone)]
pub enum Payload {
    /// Backend variable of a JIT leaf. Null when empty.
    Jit(TraceHandle),
    /// Host buffer of a host leaf.
    Host(HostData),
    /// Entries of a nested, complex, quaternion or matrix array.
    Composite(Vec<Value>),
    /// Row-major entries of a tensor in a flat 1-D storage array.
    Tensor {
        shape: Vec<usize>,
        storage: Box<ArrayValue>,
    },
}

/// Instance of a registered array type.
#[derive(Clone)]
pub struct ArrayValue {
    pub(crate) ty: TypeRef,
    pub(crate) payload: Payload,
}

impl ArrayValue {
    #[inline]
    pub(crate) fn new(ty: &TypeRef, payload: Payload) -> Self {
        ArrayValue {
            ty: ty.clone(),
            payload,
        }
    }

    #[inline]
    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    #[inline]
    pub fn type_name(&self) -> &str {
        &self.ty.name
    }

    #[inline]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// True when both values are of the same registered type.
    #[inline]
    pub fn same_type(&self, other: &ArrayValue) -> bool {
        std::sync::Arc::ptr_eq(&self.ty, &other.ty)
    }

    /// Length of the outer axis.
    pub fn len(&self) -> ArrayResult<usize> {
        self.ty.ops.len(self)
    }

    pub fn is_empty(&self) -> ArrayResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Entry `i` of the outer axis.
    pub fn get(&self, i: usize) -> ArrayResult<Value> {
        self.ty
            .ops
            .get(self, i)
            .map_err(|e| ArrayError::ItemRetrieval(Box::new(e)))
    }

    /// Overwrites entry `i` of the outer axis, converting `value` to the element type.
    pub fn set(&mut self, i: usize, value: &Value) -> ArrayResult<()> {
        let ty = self.ty.clone();
        ty.ops
            .set(self, i, value)
            .map_err(|e| ArrayError::ItemAssignment(Box::new(e)))
    }

    /// Contiguous host copy, if the type exposes one.
    pub fn data(&self) -> ArrayResult<Option<HostData>> {
        self.ty.ops.data(self)
    }

    /// Trace handle of a JIT leaf.
    pub fn index(&self) -> Option<&TraceHandle> {
        self.ty.ops.index(self)
    }

    /// Shape of a tensor value.
    pub fn tensor_shape(&self) -> Option<&[usize]> {
        match &self.payload {
            Payload::Tensor { shape, .. } => Some(shape.as_slice()),
            _ => None,
        }
    }

    /// Flat storage array of a tensor value.
    pub fn tensor_storage(&self) -> Option<&ArrayValue> {
        match &self.payload {
            Payload::Tensor { storage, .. } => Some(storage.as_ref()),
            _ => None,
        }
    }

    /// Converts the value into nested host lists of scalars.
    pub fn to_host(&self) -> ArrayResult<Value> {
        match &self.payload {
            Payload::Jit(_) | Payload::Host(_) => {
                let data = self.data()?.ok_or_else(|| {
                    ArrayError::type_error(format!("{}: no host data access.", self.ty.name))
                })?;
                Ok(Value::List(
                    data.to_scalars()
                        .into_iter()
                        .map(|s| s.to_value())
                        .collect::<ArrayResult<_>>()?,
                ))
            }
            Payload::Composite(items) => Ok(Value::List(
                items.iter().map(Value::to_host).collect::<ArrayResult<_>>()?,
            )),
            Payload::Tensor { shape, storage } => {
                let Value::List(flat) = storage.to_host()? else {
                    return Err(ArrayError::type_error("tensor storage is not one-dimensional."));
                };
                Ok(unflatten(&flat, shape))
            }
        }
    }
}

/// Regroups row-major `flat` entries into nested lists of the given shape.
fn unflatten(flat: &[Value], shape: &[usize]) -> Value {
    match shape {
        [] => flat.first().cloned().unwrap_or_default(),
        [_] => Value::List(flat.to_vec()),
        [n, rest @ ..] => {
            let stride: usize = rest.iter().product();
            Value::List(
                (0..*n)
                    .map(|i| {
                        let lo = (i * stride).min(flat.len());
                        let hi = ((i + 1) * stride).min(flat.len());
                        unflatten(&flat[lo..hi], rest)
                    })
                    .collect(),
            )
        }
    }
}

impl Debug for ArrayValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.ty.name)?;
        match &self.payload {
            Payload::Jit(h) => write!(f, "({h:?})"),
            Payload::Host(d) => write!(f, "({d:?})"),
            Payload::Composite(items) => f.debug_list().entries(items.iter()).finish(),
            Payload::Tensor { shape, storage } => write!(f, "{shape:?}({storage:?})"),
        }
    }
}
