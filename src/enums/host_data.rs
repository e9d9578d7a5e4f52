//! # **HostData Module** - *Typed Host Buffers*
//!
//! `HostData` unifies the 64-byte aligned host buffers of every element kind into
//! one enum, so that bulk import/export, lane gathering and the reference backend
//! can share a single signature.
//!
//! ## Features
//! - direct variant access via [`crate::with_host_data!`]
//! - C-style casts between all element kinds
//! - gather/scatter over lane lists, used when a call is split into groups
//! - preserves SIMD-aligned `Vec64` buffers across all variants

use std::fmt::{Debug, Formatter};

use vec64::Vec64;

use crate::traits::type_unions::Element;
use crate::{ArrayError, ArrayResult, Scalar, VarType, map_host_data, with_host_data, with_var_type};

/// # HostData
///
/// Contiguous host buffer of a single element kind.
///
/// ## Purpose
/// - Staging buffer for bulk import into a backend variable.
/// - Storage of host-resident leaf arrays.
/// - Storage of each variable inside the eager reference backend.
#[derive(Clone, PartialEq)]
pub enum HostData {
    Bool(Vec64<bool>),
    Int32(Vec64<i32>),
    UInt32(Vec64<u32>),
    Int64(Vec64<i64>),
    UInt64(Vec64<u64>),
    Float32(Vec64<f32>),
    Float64(Vec64<f64>),
}

impl HostData {
    #[inline]
    pub fn var_type(&self) -> VarType {
        match self {
            HostData::Bool(_) => VarType::Bool,
            HostData::Int32(_) => VarType::Int32,
            HostData::UInt32(_) => VarType::UInt32,
            HostData::Int64(_) => VarType::Int64,
            HostData::UInt64(_) => VarType::UInt64,
            HostData::Float32(_) => VarType::Float32,
            HostData::Float64(_) => VarType::Float64,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        with_host_data!(self, v => v.len())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Empty buffer of kind `vt` with room for `n` elements.
    pub fn with_capacity(vt: VarType, n: usize) -> Self {
        with_var_type!(vt, T => T::wrap(Vec64::<T>::with_capacity(n)))
    }

    /// Wraps a typed buffer.
    #[inline]
    pub fn from_vec<T: Element>(data: Vec64<T>) -> Self {
        T::wrap(data)
    }

    /// Typed view of the buffer, `None` when `T` is not the stored kind.
    #[inline]
    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        T::slice(self)
    }

    /// Appends `value`, casting it to the buffer's kind.
    pub fn push(&mut self, value: Scalar) {
        with_host_data!(self, v => v.push(Element::from_scalar(value)))
    }

    #[inline]
    pub fn get(&self, i: usize) -> Option<Scalar> {
        with_host_data!(self, v => v.get(i).map(|x| x.to_scalar()))
    }

    /// Overwrites lane `i`, casting `value` to the buffer's kind.
    pub fn set(&mut self, i: usize, value: Scalar) -> ArrayResult<()> {
        let size = self.len();
        with_host_data!(self, v => match v.get_mut(i) {
            Some(slot) => {
                *slot = Element::from_scalar(value);
                Ok(())
            }
            None => Err(ArrayError::IndexOutOfBounds { index: i as i64, size }),
        })
    }

    /// `n` copies of `value`, stored as `value`'s own kind.
    pub fn literal(value: Scalar, n: usize) -> Self {
        let mut out = HostData::with_capacity(value.var_type(), n);
        for _ in 0..n {
            out.push(value);
        }
        out
    }

    /// `[0, 1, .., n - 1]` as `UInt32`.
    pub fn counter(n: u32) -> Self {
        let mut v = Vec64::<u32>::with_capacity(n as usize);
        for i in 0..n {
            v.push(i);
        }
        HostData::UInt32(v)
    }

    /// Element-wise C-style conversion to `vt`.
    pub fn cast(&self, vt: VarType) -> HostData {
        if self.var_type() == vt {
            return self.clone();
        }
        let mut out = HostData::with_capacity(vt, self.len());
        with_host_data!(self, v => {
            for x in v.iter() {
                out.push(x.to_scalar());
            }
        });
        out
    }

    /// Collects the given lanes into a new buffer of the same kind.
    pub fn gather(&self, lanes: &[usize]) -> ArrayResult<HostData> {
        let size = self.len();
        if let Some(&bad) = lanes.iter().find(|&&l| l >= size) {
            return Err(ArrayError::IndexOutOfBounds { index: bad as i64, size });
        }
        Ok(map_host_data!(self, v => {
            let mut out = Vec64::with_capacity(lanes.len());
            for &l in lanes {
                out.push(v[l]);
            }
            out
        }))
    }

    /// Writes `src` into the given lanes. A single-element `src` is broadcast to every lane.
    pub fn scatter(&mut self, lanes: &[usize], src: &HostData) -> ArrayResult<()> {
        if src.len() != 1 && src.len() != lanes.len() {
            return Err(ArrayError::SizeMismatch {
                expected: lanes.len(),
                found: src.len(),
            });
        }
        let src = src.cast(self.var_type());
        for (k, &lane) in lanes.iter().enumerate() {
            let value = src.get(if src.len() == 1 { 0 } else { k });
            if let Some(value) = value {
                self.set(lane, value)?;
            }
        }
        Ok(())
    }

    /// `a * b + c` lane by lane. Operands of length 1 broadcast against the others.
    pub fn fma(a: &HostData, b: &HostData, c: &HostData) -> ArrayResult<HostData> {
        let vt = a.var_type();
        if b.var_type() != vt || c.var_type() != vt {
            return Err(ArrayError::type_error(format!(
                "fma(): operand kinds differ ({}, {}, {}).",
                vt,
                b.var_type(),
                c.var_type()
            )));
        }
        if !vt.is_arithmetic() {
            return Err(ArrayError::type_error(format!(
                "fma(): unsupported element kind '{vt}'."
            )));
        }
        let n = a.len().max(b.len()).max(c.len());
        for x in [a, b, c] {
            if x.len() != 1 && x.len() != n {
                return Err(ArrayError::SizeMismatch { expected: n, found: x.len() });
            }
        }
        let lane = |x: &HostData, i: usize| x.get(if x.len() == 1 { 0 } else { i });
        with_var_type!(vt, T => {
            let mut out = Vec64::<T>::with_capacity(n);
            for i in 0..n {
                let (Some(x), Some(y), Some(z)) = (lane(a, i), lane(b, i), lane(c, i)) else {
                    return Err(ArrayError::IndexOutOfBounds { index: i as i64, size: n });
                };
                let r = T::fma(T::from_scalar(x), T::from_scalar(y), T::from_scalar(z))
                    .ok_or_else(|| ArrayError::type_error("fma(): unsupported element kind."))?;
                out.push(r);
            }
            Ok(T::wrap(out))
        })
    }

    /// All lanes as scalars.
    pub fn to_scalars(&self) -> Vec<Scalar> {
        with_host_data!(self, v => v.iter().map(|x| x.to_scalar()).collect())
    }
}

impl Debug for HostData {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "HostData<{}>", self.var_type())?;
        with_host_data!(self, v => f.debug_list().entries(v.iter()).finish())
    }
}
