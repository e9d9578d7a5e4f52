//! # **TraceHandle Module** - *Reference-Counted Backend Variables*
//!
//! A `TraceHandle` owns exactly one backend reference to a variable. Cloning takes
//! another reference and dropping releases it, so a variable stays alive exactly as
//! long as some value holds a handle to it.
//!
//! `IndexVector` is the flattened list of handles produced by traversing a value,
//! and the unit in which arguments and results cross the call boundary.

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use crate::traits::backend::Backend;
use crate::VarIndex;

/// Owned reference to a backend variable. Index 0 is the null handle.
pub struct TraceHandle {
    index: VarIndex,
    backend: Option<Arc<dyn Backend>>,
}

impl TraceHandle {
    /// The null handle. Holds nothing and releases nothing.
    #[inline]
    pub const fn null() -> Self {
        TraceHandle {
            index: 0,
            backend: None,
        }
    }

    /// Takes ownership of a reference the caller already holds.
    #[inline]
    pub fn steal(backend: &Arc<dyn Backend>, index: VarIndex) -> Self {
        if index == 0 {
            return TraceHandle::null();
        }
        TraceHandle {
            index,
            backend: Some(backend.clone()),
        }
    }

    /// Takes a new reference to a variable owned elsewhere.
    #[inline]
    pub fn borrow(backend: &Arc<dyn Backend>, index: VarIndex) -> Self {
        if index != 0 {
            backend.inc_ref(index);
        }
        TraceHandle::steal(backend, index)
    }

    #[inline]
    pub fn index(&self) -> VarIndex {
        self.index
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.index == 0
    }

    #[inline]
    pub fn backend(&self) -> Option<&Arc<dyn Backend>> {
        self.backend.as_ref()
    }

    /// Releases ownership of the reference without decrementing it.
    #[inline]
    pub fn into_raw(mut self) -> VarIndex {
        self.backend = None;
        std::mem::take(&mut self.index)
    }
}

impl Clone for TraceHandle {
    fn clone(&self) -> Self {
        match &self.backend {
            Some(b) => TraceHandle::borrow(b, self.index),
            None => TraceHandle::null(),
        }
    }
}

impl Drop for TraceHandle {
    fn drop(&mut self) {
        if let Some(b) = self.backend.take() {
            if self.index != 0 {
                b.dec_ref(self.index);
            }
        }
    }
}

impl Debug for TraceHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "r{}", self.index)
    }
}

impl Default for TraceHandle {
    fn default() -> Self {
        TraceHandle::null()
    }
}

/// Ordered handles, one reference each. Released on drop.
#[derive(Debug, Clone, Default)]
pub struct IndexVector(pub(crate) Vec<TraceHandle>);

impl IndexVector {
    pub fn new() -> Self {
        IndexVector(Vec::new())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn push(&mut self, handle: TraceHandle) {
        self.0.push(handle)
    }

    #[inline]
    pub fn get(&self, i: usize) -> Option<&TraceHandle> {
        self.0.get(i)
    }

    /// Raw indices, without touching reference counts.
    pub fn indices(&self) -> Vec<VarIndex> {
        self.0.iter().map(TraceHandle::index).collect()
    }

    /// Takes a new reference to each of `indices`.
    pub fn borrow_raw(backend: &Arc<dyn Backend>, indices: &[VarIndex]) -> Self {
        IndexVector(indices.iter().map(|&i| TraceHandle::borrow(backend, i)).collect())
    }

    /// Takes ownership of references already held for `indices`.
    pub fn steal_raw(backend: &Arc<dyn Backend>, indices: &[VarIndex]) -> Self {
        IndexVector(indices.iter().map(|&i| TraceHandle::steal(backend, i)).collect())
    }

    /// Releases ownership of every reference to the caller.
    pub fn into_raw(self) -> Vec<VarIndex> {
        self.0.into_iter().map(TraceHandle::into_raw).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EagerBackend, Scalar};

    #[test]
    fn test_clone_and_drop_balance() {
        let eager = Arc::new(EagerBackend::new());
        let backend: Arc<dyn Backend> = eager.clone();
        let i = backend.literal(Scalar::Int32(3), 4).unwrap();

        let h = TraceHandle::steal(&backend, i);
        let c = h.clone();
        assert_eq!(eager.ref_count(i), 2);
        drop(h);
        assert_eq!(eager.ref_count(i), 1);
        drop(c);
        assert_eq!(eager.live_variables(), 0);

        assert!(TraceHandle::steal(&backend, 0).is_null());
    }

    #[test]
    fn test_index_vector_raw_round_trip() {
        let eager = Arc::new(EagerBackend::new());
        let backend: Arc<dyn Backend> = eager.clone();
        let a = backend.literal(Scalar::Bool(true), 1).unwrap();
        let b = backend.literal(Scalar::Float32(1.0), 2).unwrap();

        let owned = IndexVector::steal_raw(&backend, &[a, 0, b]);
        let borrowed = IndexVector::borrow_raw(&backend, &owned.indices());
        assert_eq!(borrowed.len(), 3);
        assert_eq!(eager.ref_count(a), 2);

        let raw = borrowed.into_raw();
        assert_eq!(eager.ref_count(b), 2);
        drop(owned);
        drop(IndexVector::steal_raw(&backend, &raw));
        assert_eq!(eager.live_variables(), 0);
    }
}
