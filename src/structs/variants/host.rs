//! # **Host Leaf Module** - *1-D Arrays in Host Memory*
//!
//! Host leaves keep their lanes in a [`HostData`] buffer and never reach a trace.
//! They are the usual source of bulk imports into JIT leaves.

use crate::structs::array_value::Payload;
use crate::traits::array_ops::{ArrayOps, Capabilities, check_index};
use crate::{ArrayError, ArrayResult, ArrayValue, HostData, Scalar, TypeRef, Value, VarType};

/// Capability table of a host leaf of `var_type`.
#[derive(Debug, Clone, Copy)]
pub struct HostArrayOps {
    var_type: VarType,
}

impl HostArrayOps {
    pub fn new(var_type: VarType) -> Self {
        HostArrayOps { var_type }
    }

    fn buffer<'a>(&self, array: &'a ArrayValue) -> ArrayResult<&'a HostData> {
        match &array.payload {
            Payload::Host(d) => Ok(d),
            _ => Err(ArrayError::type_error(format!(
                "{}: payload is not a host buffer.",
                array.ty.name
            ))),
        }
    }
}

impl ArrayOps for HostArrayOps {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            init: true,
            init_const: true,
            init_data: true,
            init_counter: self.var_type.is_arithmetic(),
            cast: true,
            data: true,
        }
    }

    fn zero(&self, ty: &TypeRef) -> ArrayResult<ArrayValue> {
        Ok(ArrayValue::new(
            ty,
            Payload::Host(HostData::with_capacity(self.var_type, 0)),
        ))
    }

    fn init(&self, ty: &TypeRef, n: usize) -> ArrayResult<ArrayValue> {
        Ok(ArrayValue::new(
            ty,
            Payload::Host(HostData::literal(Scalar::zero(self.var_type), n)),
        ))
    }

    fn init_const(&self, ty: &TypeRef, n: usize, value: &Value) -> ArrayResult<ArrayValue> {
        let scalar = Scalar::from_value(value, self.var_type)?;
        Ok(ArrayValue::new(ty, Payload::Host(HostData::literal(scalar, n))))
    }

    fn init_data(&self, ty: &TypeRef, data: &HostData) -> ArrayResult<ArrayValue> {
        Ok(ArrayValue::new(ty, Payload::Host(data.cast(self.var_type))))
    }

    fn init_counter(&self, ty: &TypeRef, n: usize) -> ArrayResult<ArrayValue> {
        let n = u32::try_from(n).map_err(|_| {
            ArrayError::value_error(format!("{}: counter of {n} lanes is too large.", ty.name))
        })?;
        Ok(ArrayValue::new(
            ty,
            Payload::Host(HostData::counter(n).cast(self.var_type)),
        ))
    }

    fn cast(&self, ty: &TypeRef, src: &ArrayValue) -> ArrayResult<ArrayValue> {
        let data = self.buffer(src)?;
        Ok(ArrayValue::new(ty, Payload::Host(data.cast(self.var_type))))
    }

    fn len(&self, array: &ArrayValue) -> ArrayResult<usize> {
        Ok(self.buffer(array)?.len())
    }

    fn get(&self, array: &ArrayValue, i: usize) -> ArrayResult<Value> {
        let data = self.buffer(array)?;
        check_index(i, data.len())?;
        data.get(i)
            .ok_or(ArrayError::IndexOutOfBounds {
                index: i as i64,
                size: data.len(),
            })?
            .to_value()
    }

    fn set(&self, array: &mut ArrayValue, i: usize, value: &Value) -> ArrayResult<()> {
        let scalar = Scalar::from_value(value, self.var_type)?;
        match &mut array.payload {
            Payload::Host(d) => d.set(i, scalar),
            _ => Err(ArrayError::type_error(format!(
                "{}: payload is not a host buffer.",
                array.ty.name
            ))),
        }
    }

    fn data(&self, array: &ArrayValue) -> ArrayResult<Option<HostData>> {
        Ok(Some(self.buffer(array)?.clone()))
    }
}
