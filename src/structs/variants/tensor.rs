//! # **Tensor Module** - *N-D Arrays over Flat Storage*
//!
//! A tensor keeps its entries row-major in a 1-D storage array of its value type,
//! plus an explicit shape. Indexing the outer axis yields a tensor of rank one
//! less, or a lane of the storage when the tensor is 1-D.

use crate::structs::array_value::Payload;
use crate::traits::array_ops::{ArrayOps, Capabilities, check_index, unsupported};
use crate::{ArrayError, ArrayResult, ArrayValue, HostData, TypeRef, Value};

/// Capability table of tensor types.
#[derive(Debug, Clone, Copy, Default)]
pub struct TensorOps;

pub(crate) fn storage_type(ty: &TypeRef) -> ArrayResult<&TypeRef> {
    ty.value_type()
        .ok_or_else(|| ArrayError::type_error(format!("{}: tensor without storage type.", ty.name)))
}

pub(crate) fn tensor(ty: &TypeRef, shape: Vec<usize>, storage: ArrayValue) -> ArrayValue {
    ArrayValue::new(
        ty,
        Payload::Tensor {
            shape,
            storage: Box::new(storage),
        },
    )
}

fn parts(array: &ArrayValue) -> ArrayResult<(&[usize], &ArrayValue)> {
    match &array.payload {
        Payload::Tensor { shape, storage } => Ok((shape.as_slice(), storage.as_ref())),
        _ => Err(ArrayError::type_error(format!(
            "{}: payload is not a tensor.",
            array.ty.name
        ))),
    }
}

impl ArrayOps for TensorOps {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            init_data: true,
            data: true,
            ..Capabilities::default()
        }
    }

    fn zero(&self, ty: &TypeRef) -> ArrayResult<ArrayValue> {
        Ok(tensor(ty, vec![0], storage_type(ty)?.zero()?))
    }

    fn init_data(&self, ty: &TypeRef, data: &HostData) -> ArrayResult<ArrayValue> {
        Ok(tensor(ty, vec![data.len()], storage_type(ty)?.init_data(data)?))
    }

    fn len(&self, array: &ArrayValue) -> ArrayResult<usize> {
        let (shape, _) = parts(array)?;
        Ok(shape.first().copied().unwrap_or(0))
    }

    fn get(&self, array: &ArrayValue, i: usize) -> ArrayResult<Value> {
        let (shape, storage) = parts(array)?;
        check_index(i, shape.first().copied().unwrap_or(0))?;
        if shape.len() == 1 {
            return storage.get(i);
        }
        let stride: usize = shape[1..].iter().product();
        let data = storage
            .data()?
            .ok_or_else(|| unsupported(&storage.ty, "data"))?;
        let lanes: Vec<usize> = (i * stride..(i + 1) * stride).collect();
        let slice = storage.ty.init_data(&data.gather(&lanes)?)?;
        Ok(Value::Array(tensor(&array.ty, shape[1..].to_vec(), slice)))
    }

    fn set(&self, array: &mut ArrayValue, i: usize, value: &Value) -> ArrayResult<()> {
        match &mut array.payload {
            Payload::Tensor { shape, storage } if shape.len() == 1 => storage.set(i, value),
            _ => Err(unsupported(&array.ty, "set")),
        }
    }

    fn data(&self, array: &ArrayValue) -> ArrayResult<Option<HostData>> {
        let (_, storage) = parts(array)?;
        storage.data()
    }
}
