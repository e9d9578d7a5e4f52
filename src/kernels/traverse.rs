//! # **Traverse Kernel** - *Flattening Values to Trace Handles*
//!
//! `collect` walks a value depth first and appends every trace handle it holds to an
//! [`IndexVector`]; `update` walks a value of the same structure in the same order
//! and swaps in the handles of another vector. Together they are how structured
//! arguments and results cross the call boundary as flat handle lists.
//!
//! Visiting order: list entries and record fields in order, composite entries by
//! outer index, the storage of a tensor. Host scalars, host buffers and iterables
//! carry no handles and are kept as they are.

use crate::structs::array_value::Payload;
use crate::structs::trace_handle::IndexVector;
use crate::{ArrayError, ArrayResult, ArrayValue, Value};

/// Appends a new reference to every trace handle in `value`.
pub fn collect(value: &Value, out: &mut IndexVector) {
    match value {
        Value::Array(a) => collect_array(a, out),
        Value::List(items) => items.iter().for_each(|v| collect(v, out)),
        Value::Struct(s) => s.fields().iter().for_each(|v| collect(v, out)),
        Value::None | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Iterable(_) => {}
    }
}

fn collect_array(array: &ArrayValue, out: &mut IndexVector) {
    match &array.payload {
        Payload::Jit(h) => out.push(h.clone()),
        Payload::Host(_) => {}
        Payload::Composite(items) => items.iter().for_each(|v| collect(v, out)),
        Payload::Tensor { storage, .. } => collect_array(storage, out),
    }
}

/// Rebuilds `template` with its trace handles replaced, in visiting order, by those of `handles`.
///
/// Every handle must be used exactly once.
pub fn update(template: &Value, handles: &IndexVector) -> ArrayResult<Value> {
    let mut cursor = 0;
    let out = update_value(template, handles, &mut cursor)?;
    if cursor != handles.len() {
        return Err(ArrayError::value_error(format!(
            "update(): {} trace handles left over after rebuilding the value.",
            handles.len() - cursor
        )));
    }
    Ok(out)
}

fn update_value(template: &Value, handles: &IndexVector, cursor: &mut usize) -> ArrayResult<Value> {
    match template {
        Value::Array(a) => update_array(a, handles, cursor).map(Value::Array),
        Value::List(items) => Ok(Value::List(
            items
                .iter()
                .map(|v| update_value(v, handles, cursor))
                .collect::<ArrayResult<_>>()?,
        )),
        Value::Struct(s) => Ok(Value::Struct(
            s.map_fields(|v| update_value(v, handles, cursor))?,
        )),
        other => Ok(other.clone()),
    }
}

fn update_array(
    template: &ArrayValue,
    handles: &IndexVector,
    cursor: &mut usize,
) -> ArrayResult<ArrayValue> {
    let payload = match &template.payload {
        Payload::Jit(_) => {
            let handle = handles.get(*cursor).ok_or_else(|| {
                ArrayError::value_error(format!(
                    "update(): ran out of trace handles at position {}.",
                    *cursor
                ))
            })?;
            *cursor += 1;
            Payload::Jit(handle.clone())
        }
        Payload::Host(d) => Payload::Host(d.clone()),
        Payload::Composite(items) => Payload::Composite(
            items
                .iter()
                .map(|v| update_value(v, handles, cursor))
                .collect::<ArrayResult<_>>()?,
        ),
        Payload::Tensor { shape, storage } => Payload::Tensor {
            shape: shape.clone(),
            storage: Box::new(update_array(storage, handles, cursor)?),
        },
    };
    Ok(ArrayValue::new(&template.ty, payload))
}

/// Checks that two group results have the same structure, so that one template can
/// rebuild the merged output.
pub fn check_compatibility(prev: &Value, next: &Value) -> ArrayResult<()> {
    let mismatch = |what: &str| {
        Err(ArrayError::Incompatible(format!(
            "{what} ('{}' vs '{}').",
            prev.type_name(),
            next.type_name()
        )))
    };
    match (prev, next) {
        (Value::None, Value::None) | (Value::Iterable(_), Value::Iterable(_)) => Ok(()),
        (Value::Bool(_), Value::Bool(_))
        | (Value::Int(_), Value::Int(_))
        | (Value::Float(_), Value::Float(_)) => {
            if prev == next {
                Ok(())
            } else {
                mismatch("host scalars differ")
            }
        }
        (Value::List(a), Value::List(b)) => {
            if a.len() != b.len() {
                return mismatch("list sizes differ");
            }
            a.iter().zip(b).try_for_each(|(x, y)| check_compatibility(x, y))
        }
        (Value::Struct(a), Value::Struct(b)) => {
            if a.ty() != b.ty() {
                return mismatch("record types differ");
            }
            a.fields()
                .iter()
                .zip(b.fields())
                .try_for_each(|(x, y)| check_compatibility(x, y))
        }
        (Value::Array(a), Value::Array(b)) => {
            if !a.same_type(b) {
                return mismatch("array types differ");
            }
            match (&a.payload, &b.payload) {
                (Payload::Jit(_), Payload::Jit(_)) => Ok(()),
                (Payload::Host(x), Payload::Host(y)) => {
                    if x == y {
                        Ok(())
                    } else {
                        mismatch("host arrays differ")
                    }
                }
                (Payload::Composite(x), Payload::Composite(y)) => {
                    if x.len() != y.len() {
                        return mismatch("array sizes differ");
                    }
                    x.iter().zip(y).try_for_each(|(p, q)| check_compatibility(p, q))
                }
                (Payload::Tensor { shape: s, .. }, Payload::Tensor { shape: t, .. }) => {
                    if s.len() != t.len() {
                        return mismatch("tensor ranks differ");
                    }
                    Ok(())
                }
                _ => mismatch("array layouts differ"),
            }
        }
        _ => mismatch("result types differ"),
    }
}
