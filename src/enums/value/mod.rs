//! # **Value Module** - *Host-Side Value Universe*
//!
//! Contains the `Value` enum, the loosely typed container that every entry point
//! accepts and returns.
//!
//! ## Description
//! - Encapsulates host scalars, host lists, lazily evaluated iterables, arrays of
//!   any registered type, and user-defined records.
//! - Constructors, generators and the call aggregator all take `Value` inputs, so one
//!   signature covers "a number", "a nested list", "another array" and "a record".
//!
//! ## Supports:
//! - recursive containers (lists, records of arrays, arrays of arrays)
//! - `From`/`TryFrom` conversions for safe extraction
//! - equality comparison by content, with arrays compared through [`Value::to_host`]

mod conversions;
mod impls;

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use crate::structs::array_value::ArrayValue;
use crate::structs::record::StructValue;
use crate::{ArrayError, ArrayResult};

/// Producer of a fresh forward-only iterator over values.
type IterFn = dyn Fn() -> Box<dyn Iterator<Item = ArrayResult<Value>> + Send> + Send + Sync;

/// # Value
///
/// Unified value enum representing anything that can be passed to, or returned
/// from, a constructor or a dispatched callable.
///
/// ## Details
/// - `Bool`, `Int` and `Float` are untyped host scalars. They acquire an element
///   kind only when imported into an array.
/// - `List` has random access and a known length; `Iterable` only supports forward
///   iteration and is materialised into a list on first use.
/// - `Array` holds any registered array type, including traced ones. Cloning it
///   shares, rather than copies, the traced variables.
/// - `None` is the "no value" marker, also returned when a call has no active lanes.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    List(Vec<Value>),
    Iterable(Iterable),
    Array(ArrayValue),
    Struct(StructValue),
}

impl Value {
    /// Name of the value's type, as used in error messages.
    pub fn type_name(&self) -> String {
        match self {
            Value::None => "NoneType".into(),
            Value::Bool(_) => "bool".into(),
            Value::Int(_) => "int".into(),
            Value::Float(_) => "float".into(),
            Value::List(_) => "list".into(),
            Value::Iterable(_) => "iterable".into(),
            Value::Array(a) => a.type_name().to_string(),
            Value::Struct(s) => s.ty().name.clone(),
        }
    }

    /// Short rendering of the value for error messages.
    pub fn describe(&self) -> String {
        match self {
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(x) => x.to_string(),
            other => format!("an instance of '{}'", other.type_name()),
        }
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// True for `Bool`, `Int` and `Float`.
    #[inline]
    pub fn is_scalar(&self) -> bool {
        matches!(self, Value::Bool(_) | Value::Int(_) | Value::Float(_))
    }

    #[inline]
    pub fn as_array(&self) -> Option<&ArrayValue> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Returns the inner `ArrayValue`, or a type error naming the actual type.
    pub fn try_array(&self) -> ArrayResult<&ArrayValue> {
        self.as_array().ok_or_else(|| {
            ArrayError::type_error(format!("expected an array, got '{}'.", self.type_name()))
        })
    }

    /// Converts the value into nested host lists of scalars.
    ///
    /// Traced arrays are evaluated, iterables are drained, records convert field by field.
    pub fn to_host(&self) -> ArrayResult<Value> {
        match self {
            Value::List(items) => Ok(Value::List(
                items.iter().map(Value::to_host).collect::<ArrayResult<_>>()?,
            )),
            Value::Iterable(it) => Ok(Value::List(
                it.materialize()?
                    .iter()
                    .map(Value::to_host)
                    .collect::<ArrayResult<_>>()?,
            )),
            Value::Array(a) => a.to_host(),
            Value::Struct(s) => Ok(Value::Struct(s.map_fields(Value::to_host)?)),
            scalar => Ok(scalar.clone()),
        }
    }
}

/// # Iterable
///
/// A forward-only sequence without a known length, e.g. a generator.
///
/// Wraps a factory rather than an iterator so that the value stays `Clone`
/// and can be consumed more than once.
#[derive(Clone)]
pub struct Iterable(Arc<IterFn>);

impl Iterable {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Box<dyn Iterator<Item = ArrayResult<Value>> + Send> + Send + Sync + 'static,
    {
        Iterable(Arc::new(factory))
    }

    /// Iterable that yields clones of `values`.
    pub fn from_values(values: Vec<Value>) -> Self {
        Iterable::new(move || Box::new(values.clone().into_iter().map(Ok)))
    }

    /// Drains a fresh iterator into a list. The first failing item fails the whole drain.
    pub fn materialize(&self) -> ArrayResult<Vec<Value>> {
        (self.0)().collect()
    }
}

impl Debug for Iterable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Iterable(..)")
    }
}
