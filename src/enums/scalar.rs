//! # Scalar Module - *Single Value Container*
//!
//! Contains the `Scalar` type, the backend-native representation of one lane.
//!
//! ## Purpose
//! - Carries a single value in exactly the element kind of its array.
//! - Bridges loosely typed host values ([`Value`]) and typed backend storage:
//!   [`Scalar::from_value`] applies the import rules, [`Scalar::cast`] applies
//!   C-style conversion between element kinds.

use num_traits::NumCast;

use crate::traits::type_unions::Element;
use crate::{ArrayError, ArrayResult, Value, VarType, with_var_type};

/// # Scalar
///
/// One lane of an array, tagged with its element kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
}

impl Scalar {
    #[inline]
    pub fn var_type(&self) -> VarType {
        match self {
            Scalar::Bool(_) => VarType::Bool,
            Scalar::Int32(_) => VarType::Int32,
            Scalar::UInt32(_) => VarType::UInt32,
            Scalar::Int64(_) => VarType::Int64,
            Scalar::UInt64(_) => VarType::UInt64,
            Scalar::Float32(_) => VarType::Float32,
            Scalar::Float64(_) => VarType::Float64,
        }
    }

    /// Additive identity of `vt`.
    #[inline]
    pub fn zero(vt: VarType) -> Self {
        Scalar::Int64(0).cast(vt)
    }

    /// Multiplicative identity of `vt`.
    #[inline]
    pub fn one(vt: VarType) -> Self {
        Scalar::Int64(1).cast(vt)
    }

    /// Converts to `vt` with C-style `as` semantics (truncation, wrapping, `!= 0` for bools).
    #[inline]
    pub fn cast(self, vt: VarType) -> Scalar {
        with_var_type!(vt, T => T::from_scalar(self).to_scalar())
    }

    /// Imports a host value as element kind `vt`.
    ///
    /// ### Rules
    /// - booleans convert to every kind (`0`/`1` for numbers)
    /// - integers convert to integer kinds when in range, and to float kinds
    /// - floats only convert to float kinds
    /// - integers never convert to booleans, and nothing else converts at all
    pub fn from_value(value: &Value, vt: VarType) -> ArrayResult<Scalar> {
        let fail = || ArrayError::Conversion {
            value: value.describe(),
            target: vt.name(),
        };
        match value {
            Value::Bool(b) => Ok(Scalar::Bool(*b).cast(vt)),
            Value::Int(i) => {
                let i = *i;
                match vt {
                    VarType::Bool => Err(fail()),
                    VarType::Int32 => NumCast::from(i).map(Scalar::Int32).ok_or_else(fail),
                    VarType::UInt32 => NumCast::from(i).map(Scalar::UInt32).ok_or_else(fail),
                    VarType::Int64 => Ok(Scalar::Int64(i)),
                    VarType::UInt64 => NumCast::from(i).map(Scalar::UInt64).ok_or_else(fail),
                    VarType::Float32 | VarType::Float64 => Ok(Scalar::Int64(i).cast(vt)),
                }
            }
            Value::Float(x) if vt.is_float() => Ok(Scalar::Float64(*x).cast(vt)),
            _ => Err(fail()),
        }
    }

    /// Exports to a host value. `UInt64` lanes above `i64::MAX` cannot be represented.
    pub fn to_value(self) -> ArrayResult<Value> {
        Ok(match self {
            Scalar::Bool(v) => Value::Bool(v),
            Scalar::Int32(v) => Value::Int(v as i64),
            Scalar::UInt32(v) => Value::Int(v as i64),
            Scalar::Int64(v) => Value::Int(v),
            Scalar::UInt64(v) => Value::Int(i64::try_from(v).map_err(|_| ArrayError::Conversion {
                value: v.to_string(),
                target: "int64",
            })?),
            Scalar::Float32(v) => Value::Float(v as f64),
            Scalar::Float64(v) => Value::Float(v),
        })
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        !bool::from_scalar(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identities() {
        for vt in VarType::ALL {
            assert_eq!(Scalar::zero(vt).var_type(), vt);
            assert!(Scalar::zero(vt).is_zero());
            assert!(!Scalar::one(vt).is_zero());
        }
        assert_eq!(Scalar::one(VarType::Float32), Scalar::Float32(1.0));
        assert_eq!(Scalar::zero(VarType::Bool), Scalar::Bool(false));
    }

    #[test]
    fn test_from_value_rules() {
        assert_eq!(
            Scalar::from_value(&Value::Int(3), VarType::Float32).unwrap(),
            Scalar::Float32(3.0)
        );
        assert_eq!(
            Scalar::from_value(&Value::Bool(true), VarType::Int32).unwrap(),
            Scalar::Int32(1)
        );
        assert!(Scalar::from_value(&Value::Int(-1), VarType::UInt32).is_err());
        assert!(Scalar::from_value(&Value::Int(1 << 40), VarType::Int32).is_err());
        assert!(Scalar::from_value(&Value::Float(1.5), VarType::Int64).is_err());
        assert!(Scalar::from_value(&Value::Int(1), VarType::Bool).is_err());
        assert!(Scalar::from_value(&Value::None, VarType::Float64).is_err());
    }

    #[test]
    fn test_to_value_round_trip() {
        assert_eq!(Scalar::UInt32(7).to_value().unwrap(), Value::Int(7));
        assert_eq!(Scalar::Float32(0.5).to_value().unwrap(), Value::Float(0.5));
        assert!(Scalar::UInt64(u64::MAX).to_value().is_err());
    }
}
