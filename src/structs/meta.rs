//! # **Meta Module** - *Structural Description of an Array Type*
//!
//! `ArrayMeta` is the part of a type descriptor that the construction dispatcher
//! compares when deciding between copy, cast and host import: backend, element
//! kind, per-axis extents and structural flags.

use std::fmt::{Display, Formatter};

use crate::enums::var_type::{JitBackend, VarType};

/// Size of one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extent {
    Fixed(usize),
    Dynamic,
}

impl Extent {
    #[inline]
    pub fn is_dynamic(self) -> bool {
        matches!(self, Extent::Dynamic)
    }

    /// The fixed size, or `None` for a dynamic axis.
    #[inline]
    pub fn fixed(self) -> Option<usize> {
        match self {
            Extent::Fixed(n) => Some(n),
            Extent::Dynamic => None,
        }
    }

    /// True when a concrete axis length `n` fits this extent.
    #[inline]
    pub fn admits(self, n: usize) -> bool {
        match self {
            Extent::Fixed(k) => k == n,
            Extent::Dynamic => true,
        }
    }
}

impl Display for Extent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Extent::Fixed(n) => write!(f, "{n}"),
            Extent::Dynamic => f.write_str("*"),
        }
    }
}

/// Structural flags of an array type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ArrayFlags {
    pub is_complex: bool,
    pub is_quaternion: bool,
    pub is_matrix: bool,
    pub is_tensor: bool,
    /// Lanes hold ids of registered instances rather than numbers.
    pub is_class: bool,
}

/// # ArrayMeta
///
/// Backend, element kind, shape and flags of an array type.
///
/// ## Invariants
/// - `ndim() == shape.len()`.
/// - Two descriptors with equal metas are interchangeable for casting and import.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrayMeta {
    pub backend: JitBackend,
    pub var_type: VarType,
    pub shape: Vec<Extent>,
    pub flags: ArrayFlags,
}

impl ArrayMeta {
    /// 1-D dynamic array of `var_type`, the shape of every leaf type.
    pub fn leaf(backend: JitBackend, var_type: VarType) -> Self {
        ArrayMeta {
            backend,
            var_type,
            shape: vec![Extent::Dynamic],
            flags: ArrayFlags::default(),
        }
    }

    /// Prepends an outer axis of extent `outer` to `inner`'s shape.
    pub fn nested(outer: Extent, inner: &ArrayMeta) -> Self {
        let mut shape = Vec::with_capacity(inner.shape.len() + 1);
        shape.push(outer);
        shape.extend_from_slice(&inner.shape);
        ArrayMeta {
            backend: inner.backend,
            var_type: inner.var_type,
            shape,
            flags: ArrayFlags::default(),
        }
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Outermost extent. Every registered type has at least one axis.
    #[inline]
    pub fn outer(&self) -> Extent {
        self.shape.first().copied().unwrap_or(Extent::Dynamic)
    }

    /// True for 1-D arrays whose single axis is dynamic.
    #[inline]
    pub fn is_dynamic_1d(&self) -> bool {
        self.shape.len() == 1 && self.shape[0].is_dynamic()
    }

    pub fn with_type(&self, var_type: VarType) -> Self {
        ArrayMeta {
            var_type,
            ..self.clone()
        }
    }

    pub fn with_backend(&self, backend: JitBackend) -> Self {
        ArrayMeta {
            backend,
            ..self.clone()
        }
    }

    pub fn with_flags(mut self, flags: ArrayFlags) -> Self {
        self.flags = flags;
        self
    }
}

impl Display for ArrayMeta {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}<{}>[", self.backend, self.var_type)?;
        for (i, e) in self.shape.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{e}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_shape() {
        let float = ArrayMeta::leaf(JitBackend::Llvm, VarType::Float32);
        let arr3 = ArrayMeta::nested(Extent::Fixed(3), &float);
        assert_eq!(arr3.ndim(), 2);
        assert_eq!(arr3.outer(), Extent::Fixed(3));
        assert!(!arr3.is_dynamic_1d());
        assert!(float.is_dynamic_1d());
        assert_eq!(arr3.to_string(), "llvm<float32>[3, *]");
    }

    #[test]
    fn test_meta_comparisons() {
        let float = ArrayMeta::leaf(JitBackend::Llvm, VarType::Float32);
        let int = ArrayMeta::leaf(JitBackend::Llvm, VarType::Int32);
        let host = ArrayMeta::leaf(JitBackend::Host, VarType::Float32);
        assert_eq!(int.with_type(VarType::Float32), float);
        assert_eq!(float.with_backend(JitBackend::Host), host);
        assert!(Extent::Dynamic.admits(7));
        assert!(!Extent::Fixed(3).admits(2));
    }
}
