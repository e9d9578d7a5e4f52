// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under MIT License.

//! # **Arithmetic Kernel** - *Fused Multiply-Add over Leaves*
//!
//! The generators and the call index shift only need `a * b + c` on 1-D leaves.
//! JIT leaves forward to the backend, host leaves run lane by lane over their buffers.
//! Operands of a single lane broadcast.

use std::sync::Arc;

use crate::structs::array_value::Payload;
use crate::structs::trace_handle::TraceHandle;
use crate::{ArrayError, ArrayResult, ArrayValue, HostData};

/// Returns `a * b + c`, typed like `a`.
pub fn fma(a: &ArrayValue, b: &ArrayValue, c: &ArrayValue) -> ArrayResult<ArrayValue> {
    if !a.same_type(b) || !a.same_type(c) {
        return Err(ArrayError::type_error(format!(
            "fma(): operands must be of the same type (got '{}', '{}', '{}').",
            a.type_name(),
            b.type_name(),
            c.type_name()
        )));
    }
    let ty = a.ty();
    match (&a.payload, &b.payload, &c.payload) {
        (Payload::Jit(x), Payload::Jit(y), Payload::Jit(z)) => {
            if x.is_null() || y.is_null() || z.is_null() {
                return ty.zero();
            }
            let index = ty.backend.fma(x.index(), y.index(), z.index())?;
            Ok(ArrayValue::new(
                ty,
                Payload::Jit(TraceHandle::steal(&ty.backend, index)),
            ))
        }
        (Payload::Host(x), Payload::Host(y), Payload::Host(z)) => {
            if x.is_empty() || y.is_empty() || z.is_empty() {
                return ty.zero();
            }
            Ok(ArrayValue::new(ty, Payload::Host(HostData::fma(x, y, z)?)))
        }
        _ => Err(ArrayError::type_error(format!(
            "fma(): unsupported operand type '{}'.",
            ty.name
        ))),
    }
}

/// True when both values hold the very same backend variable.
pub fn shares_variable(a: &ArrayValue, b: &ArrayValue) -> bool {
    match (a.index(), b.index()) {
        (Some(x), Some(y)) => {
            !x.is_null()
                && x.index() == y.index()
                && matches!((x.backend(), y.backend()), (Some(p), Some(q)) if Arc::ptr_eq(p, q))
        }
        _ => false,
    }
}
