//! # **Tensor Kernel** - *Tensor Construction*
//!
//! Builds tensors from nested host sequences, from flat arrays with an explicit
//! shape, or by copying another tensor of the same type.

use std::sync::Arc;

use log::trace;

use crate::kernels::construct::construct;
use crate::structs::variants::tensor::{storage_type, tensor};
use crate::{ArrayError, ArrayResult, ArrayValue, TypeRef, Value};

/// Constructs a tensor of `ty`.
///
/// - no array: empty tensor of shape `[0]`
/// - a tensor of the same type: copy
/// - an array without a shape: the shape is read off a nested rectangular list, and
///   the entries are imported row-major into the storage array
/// - an array with a shape: the array is imported as flat storage and must hold
///   exactly `shape.iter().product()` entries
pub fn construct_tensor(
    ty: &TypeRef,
    array: Option<&Value>,
    shape: Option<&[usize]>,
) -> ArrayResult<ArrayValue> {
    construct_tensor_inner(ty, array, shape).map_err(|e| e.in_constructor(&ty.name))
}

fn construct_tensor_inner(
    ty: &TypeRef,
    array: Option<&Value>,
    shape: Option<&[usize]>,
) -> ArrayResult<ArrayValue> {
    if !ty.is_tensor() {
        return Err(ArrayError::type_error(format!("'{}' is not a tensor type.", ty.name)));
    }
    let storage_ty = storage_type(ty)?;

    let Some(array) = array else {
        if shape.is_some() {
            return Err(ArrayError::type_error("Input array must be specified."));
        }
        return ty.zero();
    };

    if let (Value::Array(src), None) = (array, shape) {
        if Arc::ptr_eq(&src.ty, ty) {
            return Ok(src.clone());
        }
    }

    match shape {
        None => {
            let (shape, flat) = ravel(array)?;
            trace!("{}: raveled input of shape {:?}", ty.name, shape);
            let storage = construct(storage_ty, &[Value::List(flat)], &[])?;
            Ok(tensor(ty, shape, storage))
        }
        Some(shape) => {
            let source = match array {
                Value::Array(src) if src.ty.is_tensor() => src
                    .tensor_storage()
                    .map(|s| Value::Array(s.clone()))
                    .unwrap_or_default(),
                other => other.clone(),
            };
            let storage = construct(storage_ty, &[source], &[])?;
            let expected: usize = shape.iter().product();
            let got = storage.len()?;
            if got != expected {
                return Err(ArrayError::value_error(format!(
                    "Input array has the wrong number of entries (got {got}, expected {expected})."
                )));
            }
            Ok(tensor(ty, shape.to_vec(), storage))
        }
    }
}

/// Shape and row-major entries of a nested rectangular value.
fn ravel(value: &Value) -> ArrayResult<(Vec<usize>, Vec<Value>)> {
    let host = match value {
        Value::Array(a) if a.ty.is_tensor() => {
            let shape = a.tensor_shape().map(<[usize]>::to_vec).unwrap_or_default();
            let Value::List(flat) = a
                .tensor_storage()
                .map(ArrayValue::to_host)
                .transpose()?
                .unwrap_or(Value::List(Vec::new()))
            else {
                return Err(ArrayError::type_error("tensor storage is not one-dimensional."));
            };
            return Ok((shape, flat));
        }
        other => other.to_host()?,
    };

    let mut shape = Vec::new();
    let mut level = &host;
    while let Value::List(items) = level {
        shape.push(items.len());
        match items.first() {
            Some(first) => level = first,
            None => break,
        }
    }
    if shape.is_empty() {
        return Err(ArrayError::type_error(format!(
            "cannot infer a tensor shape from '{}'.",
            value.type_name()
        )));
    }

    let mut flat = Vec::with_capacity(shape.iter().product());
    flatten_into(&host, &shape, &mut flat)?;
    Ok((shape, flat))
}

fn flatten_into(value: &Value, shape: &[usize], out: &mut Vec<Value>) -> ArrayResult<()> {
    match (value, shape) {
        (Value::List(items), [n, rest @ ..]) if items.len() == *n => {
            items.iter().try_for_each(|v| flatten_into(v, rest, out))
        }
        (v, []) if !matches!(v, Value::List(_)) => {
            out.push(v.clone());
            Ok(())
        }
        _ => Err(ArrayError::value_error(
            "Input is ragged: every nested sequence must have the same length.",
        )),
    }
}
