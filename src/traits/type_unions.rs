use std::fmt::Debug;

use num_traits::{Float as NumFloat, PrimInt, ToPrimitive, WrappingAdd, WrappingMul};
use vec64::Vec64;

use crate::{HostData, Scalar, VarType};

/// Trait for types valid as float elements.
///
/// Extends and constrains the *num-traits* `Float` implementation to fit the crate's type universe.
pub trait Float: NumFloat + Copy + Default + ToPrimitive + PartialEq + 'static {}
impl Float for f32 {}
impl Float for f64 {}

/// Trait for types valid as integer elements.
pub trait Integer: PrimInt + WrappingAdd + WrappingMul + Default + Debug + ToPrimitive + 'static {}
impl Integer for i32 {}
impl Integer for u32 {}
impl Integer for i64 {}
impl Integer for u64 {}

/// Native element of a [`HostData`] buffer.
///
/// Ties each Rust primitive to its [`VarType`], its [`Scalar`] variant and its
/// `HostData` variant, so typed kernels can be written once and dispatched with
/// [`crate::with_host_data!`] / [`crate::with_var_type!`].
pub trait Element: Copy + Default + PartialEq + Debug + Send + Sync + 'static {
    const VAR_TYPE: VarType;

    /// Converts with C-style `as` semantics from any scalar kind.
    fn from_scalar(s: Scalar) -> Self;

    fn to_scalar(self) -> Scalar;

    /// `a * b + c`; `None` for non-arithmetic kinds.
    fn fma(a: Self, b: Self, c: Self) -> Option<Self>;

    fn wrap(data: Vec64<Self>) -> HostData;

    fn slice(data: &HostData) -> Option<&[Self]>;
}

macro_rules! impl_element_numeric {
    ($t:ty, $variant:ident, $fma:expr) => {
        impl Element for $t {
            const VAR_TYPE: VarType = VarType::$variant;

            #[inline]
            fn from_scalar(s: Scalar) -> Self {
                match s {
                    Scalar::Bool(v) => v as u8 as $t,
                    Scalar::Int32(v) => v as $t,
                    Scalar::UInt32(v) => v as $t,
                    Scalar::Int64(v) => v as $t,
                    Scalar::UInt64(v) => v as $t,
                    Scalar::Float32(v) => v as $t,
                    Scalar::Float64(v) => v as $t,
                }
            }

            #[inline]
            fn to_scalar(self) -> Scalar {
                Scalar::$variant(self)
            }

            #[inline]
            fn fma(a: Self, b: Self, c: Self) -> Option<Self> {
                let f: fn($t, $t, $t) -> $t = $fma;
                Some(f(a, b, c))
            }

            #[inline]
            fn wrap(data: Vec64<Self>) -> HostData {
                HostData::$variant(data)
            }

            #[inline]
            fn slice(data: &HostData) -> Option<&[Self]> {
                match data {
                    HostData::$variant(v) => Some(&v[..]),
                    _ => None,
                }
            }
        }
    };
}

fn int_fma<T: Integer>(a: T, b: T, c: T) -> T {
    a.wrapping_mul(&b).wrapping_add(&c)
}

fn float_fma<T: Float>(a: T, b: T, c: T) -> T {
    a.mul_add(b, c)
}

impl_element_numeric!(i32, Int32, int_fma::<i32>);
impl_element_numeric!(u32, UInt32, int_fma::<u32>);
impl_element_numeric!(i64, Int64, int_fma::<i64>);
impl_element_numeric!(u64, UInt64, int_fma::<u64>);
impl_element_numeric!(f32, Float32, float_fma::<f32>);
impl_element_numeric!(f64, Float64, float_fma::<f64>);

impl Element for bool {
    const VAR_TYPE: VarType = VarType::Bool;

    #[inline]
    fn from_scalar(s: Scalar) -> Self {
        match s {
            Scalar::Bool(v) => v,
            Scalar::Int32(v) => v != 0,
            Scalar::UInt32(v) => v != 0,
            Scalar::Int64(v) => v != 0,
            Scalar::UInt64(v) => v != 0,
            Scalar::Float32(v) => v != 0.0,
            Scalar::Float64(v) => v != 0.0,
        }
    }

    #[inline]
    fn to_scalar(self) -> Scalar {
        Scalar::Bool(self)
    }

    #[inline]
    fn fma(_: Self, _: Self, _: Self) -> Option<Self> {
        None
    }

    #[inline]
    fn wrap(data: Vec64<Self>) -> HostData {
        HostData::Bool(data)
    }

    #[inline]
    fn slice(data: &HostData) -> Option<&[Self]> {
        match data {
            HostData::Bool(v) => Some(&v[..]),
            _ => None,
        }
    }
}
