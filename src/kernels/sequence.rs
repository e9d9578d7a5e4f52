// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under MIT License.

//! # **Sequence Import Kernel**
//!
//! Imports lists, iterables and other arrays element by element into a target
//! type. 1-D targets with bulk import convert every element into a 64-byte
//! aligned staging buffer and import it with a single backend call; all other
//! targets are initialised and then assigned entry by entry.

use log::warn;
use vec64::Vec64;

#[cfg(feature = "parallel_proc")]
use rayon::prelude::*;

use crate::structs::array_value::Payload;
use crate::structs::meta::Extent;
use crate::traits::type_unions::Element;
use crate::{ArrayError, ArrayResult, ArrayValue, HostData, Scalar, TypeRef, Value, with_var_type};

/// Minimum list length for which the staging conversion runs on the rayon pool.
#[cfg(feature = "parallel_proc")]
pub const PARALLEL_STAGING_THRESHOLD: usize = 1 << 16;

/// Random-access view over anything that can be imported as a sequence.
#[derive(Debug, Clone, Copy)]
pub enum SequenceView<'a> {
    List(&'a [Value]),
    Array(&'a ArrayValue),
}

impl SequenceView<'_> {
    pub fn len(&self) -> ArrayResult<usize> {
        match self {
            SequenceView::List(items) => Ok(items.len()),
            SequenceView::Array(a) => a.len(),
        }
    }

    pub fn is_empty(&self) -> ArrayResult<bool> {
        Ok(self.len()? == 0)
    }

    pub fn item(&self, i: usize) -> ArrayResult<Value> {
        match self {
            SequenceView::List(items) => items.get(i).cloned().ok_or(ArrayError::IndexOutOfBounds {
                index: i as i64,
                size: items.len(),
            }),
            SequenceView::Array(a) => a.get(i),
        }
    }

    /// True when reading an item costs a round trip to the backend.
    fn is_backend_resident(&self) -> bool {
        matches!(self, SequenceView::Array(a) if matches!(a.payload, Payload::Jit(_)))
    }
}

/// Imports `value` into `ty` if it is a sequence.
///
/// Returns `Ok(None)` for values that are not sequences (scalars, records,
/// `None`), so the caller can fall back to broadcasting.
pub fn import_sequence(ty: &TypeRef, value: &Value) -> ArrayResult<Option<ArrayValue>> {
    match value {
        Value::List(items) => import_view(ty, SequenceView::List(items)).map(Some),
        Value::Iterable(it) => {
            let items = it
                .materialize()
                .map_err(|e| ArrayError::Materialize(Box::new(e)))?;
            import_view(ty, SequenceView::List(&items)).map(Some)
        }
        Value::Array(a) => import_view(ty, SequenceView::Array(a)).map(Some),
        _ => Ok(None),
    }
}

/// Imports a sequence of known length into `ty`.
pub fn import_view(ty: &TypeRef, view: SequenceView<'_>) -> ArrayResult<ArrayValue> {
    let size = view
        .len()
        .map_err(|e| ArrayError::UnknownLength(Box::new(e)))?;

    if let Extent::Fixed(k) = ty.meta.outer() {
        if k != size {
            return Err(ArrayError::SizeMismatch {
                expected: k,
                found: size,
            });
        }
    }

    let caps = ty.capabilities();
    if size == 1 && caps.init_const {
        return ty.init_const(1, &view.item(0)?);
    }

    if ty.meta.ndim() == 1 && caps.init_data {
        let staged = stage(ty, &view, size)?;
        return ty.init_data(&staged);
    }

    if view.is_backend_resident() {
        warn!(
            "{}: importing {} entries one at a time from a traced array",
            ty.name, size
        );
    }
    let mut out = match ty.meta.outer() {
        Extent::Dynamic => ty.init(size)?,
        Extent::Fixed(_) => ty.zero()?,
    };
    for i in 0..size {
        out.set(i, &view.item(i)?)?;
    }
    Ok(out)
}

/// Converts every element of `view` into the native element type of `ty`.
fn stage(ty: &TypeRef, view: &SequenceView<'_>, size: usize) -> ArrayResult<HostData> {
    let vt = ty.meta.var_type;

    #[cfg(feature = "parallel_proc")]
    if let SequenceView::List(items) = view {
        if size >= PARALLEL_STAGING_THRESHOLD {
            return with_var_type!(vt, T => {
                let converted: Vec<T> = items
                    .par_iter()
                    .map(|v| Scalar::from_value(v, vt).map(T::from_scalar))
                    .collect::<ArrayResult<_>>()
                    .map_err(|_| ArrayError::InvalidSequence)?;
                Ok(T::wrap(Vec64::from(converted)))
            });
        }
    }

    with_var_type!(vt, T => {
        let mut buf = Vec64::<T>::with_capacity(size);
        for i in 0..size {
            let scalar = view
                .item(i)
                .and_then(|v| Scalar::from_value(&v, vt))
                .map_err(|_| ArrayError::InvalidSequence)?;
            buf.push(T::from_scalar(scalar));
        }
        Ok(T::wrap(buf))
    })
}
