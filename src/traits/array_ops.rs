//! # **ArrayOps Trait Module** - *Per-Type Capability Table*
//!
//! Each registered array type carries one `ArrayOps` object that implements the
//! operations the type supports. The construction dispatcher consults
//! [`ArrayOps::capabilities`] to pick a path, then calls through the table.
//!
//! Unsupported operations keep the default implementations, which return a type
//! error naming the type and the operation.

use crate::structs::trace_handle::TraceHandle;
use crate::{ArrayError, ArrayResult, ArrayValue, HostData, TypeRef, Value};

/// Which optional operations a type supports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Sized, zero-filled initialisation of a dynamic outer axis.
    pub init: bool,
    /// Broadcast of one scalar to `n` lanes.
    pub init_const: bool,
    /// Bulk import from a contiguous host buffer.
    pub init_data: bool,
    /// `[0, 1, .., n - 1]`.
    pub init_counter: bool,
    pub cast: bool,
    /// Bulk export to a contiguous host buffer.
    pub data: bool,
}

/// Capability table of one array type. `ty` is always the type the table belongs to.
pub trait ArrayOps: Send + Sync {
    fn capabilities(&self) -> Capabilities;

    /// Zero value: zero scalars, recursively zero composites, empty dynamic arrays.
    fn zero(&self, ty: &TypeRef) -> ArrayResult<ArrayValue>;

    fn init(&self, ty: &TypeRef, n: usize) -> ArrayResult<ArrayValue> {
        let _ = n;
        Err(unsupported(ty, "init"))
    }

    fn init_const(&self, ty: &TypeRef, n: usize, value: &Value) -> ArrayResult<ArrayValue> {
        let _ = (n, value);
        Err(unsupported(ty, "init_const"))
    }

    fn init_data(&self, ty: &TypeRef, data: &HostData) -> ArrayResult<ArrayValue> {
        let _ = data;
        Err(unsupported(ty, "init_data"))
    }

    fn init_counter(&self, ty: &TypeRef, n: usize) -> ArrayResult<ArrayValue> {
        let _ = n;
        Err(unsupported(ty, "init_counter"))
    }

    /// Converts `src`, whose meta differs from `ty`'s only in element kind.
    fn cast(&self, ty: &TypeRef, src: &ArrayValue) -> ArrayResult<ArrayValue> {
        let _ = src;
        Err(unsupported(ty, "cast"))
    }

    fn len(&self, array: &ArrayValue) -> ArrayResult<usize>;

    fn get(&self, array: &ArrayValue, i: usize) -> ArrayResult<Value>;

    fn set(&self, array: &mut ArrayValue, i: usize, value: &Value) -> ArrayResult<()>;

    /// Contiguous host copy of the array, if the type exposes one.
    fn data(&self, array: &ArrayValue) -> ArrayResult<Option<HostData>> {
        let _ = array;
        Ok(None)
    }

    /// Trace handle of a JIT leaf.
    fn index<'a>(&self, array: &'a ArrayValue) -> Option<&'a TraceHandle> {
        let _ = array;
        None
    }
}

pub(crate) fn unsupported(ty: &TypeRef, op: &str) -> ArrayError {
    ArrayError::type_error(format!("{}: unsupported operation '{op}'.", ty.name))
}

/// Bounds check shared by the `get`/`set` implementations.
pub(crate) fn check_index(i: usize, size: usize) -> ArrayResult<()> {
    if i < size {
        Ok(())
    } else {
        Err(ArrayError::IndexOutOfBounds {
            index: i as i64,
            size,
        })
    }
}
