// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under MIT License.

//! # **Generators Kernel** - *full, zeros, ones, empty, arange, linspace*
//!
//! Structured generators produce values of any [`DType`]: host scalars, arrays of a
//! registered type (recursively, axis by axis), tensors, and records.
//!
//! ## Shapes
//! `full` takes one size per axis of the target type. `full_n` takes a single size
//! and infers the rest: fixed axes keep their extent, the last dynamic axis takes the
//! size and any other dynamic axis becomes 1.

use crate::enums::dtype::{DType, ShapeSpec};
use crate::kernels::arithmetic;
use crate::kernels::construct::construct;
use crate::structs::descriptor::ElementType;
use crate::structs::meta::Extent;
use crate::structs::record::StructValue;
use crate::{ArrayError, ArrayResult, ArrayValue, Scalar, TypeRef, Value, VarType};

const INCOMPATIBLE_SHAPE: &str = "The provided 'shape' and 'dtype' parameters are incompatible.";

/// Value of `dtype` with every entry set to `value`, or default initialised when `value` is `None`.
pub fn full(dtype: &DType, value: Option<&Value>, shape: &[usize]) -> ArrayResult<Value> {
    match dtype {
        DType::Bool | DType::Int | DType::Float => dtype.host_scalar(value),
        DType::Array(ty) => full_array(ty, value, shape).map(Value::Array),
        DType::Struct(st) => {
            let fields = st
                .fields
                .iter()
                .map(|(_, field)| match shape {
                    [n] => full_n(field, value, *n),
                    _ => full(field, value, shape),
                })
                .collect::<ArrayResult<Vec<_>>>()?;
            Ok(Value::Struct(StructValue::new(st.clone(), fields)?))
        }
    }
}

/// Like [`full`], with the shape inferred from a single `size`.
pub fn full_n(dtype: &DType, value: Option<&Value>, size: usize) -> ArrayResult<Value> {
    match dtype {
        DType::Array(ty) => {
            let shape = infer_shape(ty, size);
            full_array(ty, value, &shape).map(Value::Array)
        }
        other => full(other, value, &[size]),
    }
}

/// All zeros. `shape` is either a size or a full shape.
pub fn zeros(dtype: &DType, shape: impl Into<ShapeSpec>) -> ArrayResult<Value> {
    generate(dtype, Some(&Value::Int(0)), shape.into())
}

/// All ones.
pub fn ones(dtype: &DType, shape: impl Into<ShapeSpec>) -> ArrayResult<Value> {
    generate(dtype, Some(&Value::Int(1)), shape.into())
}

/// Allocated but unassigned. The reference backends zero fill.
pub fn empty(dtype: &DType, shape: impl Into<ShapeSpec>) -> ArrayResult<Value> {
    generate(dtype, None, shape.into())
}

fn generate(dtype: &DType, value: Option<&Value>, shape: ShapeSpec) -> ArrayResult<Value> {
    match shape {
        ShapeSpec::Size(n) => full_n(dtype, value, n),
        ShapeSpec::Shape(s) => full(dtype, value, &s),
    }
}

fn infer_shape(ty: &TypeRef, size: usize) -> Vec<usize> {
    let last = ty.meta.shape.len().saturating_sub(1);
    ty.meta
        .shape
        .iter()
        .enumerate()
        .map(|(i, e)| match e {
            Extent::Fixed(n) => *n,
            Extent::Dynamic if i == last => size,
            Extent::Dynamic => 1,
        })
        .collect()
}

/// Dtype used to generate the entries of `ty`'s outer axis.
fn element_dtype(ty: &TypeRef) -> DType {
    match &ty.value {
        ElementType::Array(t) => DType::Array(t.clone()),
        ElementType::Scalar(VarType::Bool) => DType::Bool,
        ElementType::Scalar(vt) if vt.is_float() => DType::Float,
        ElementType::Scalar(_) => DType::Int,
    }
}

/// C-style conversion of a host scalar to the leaf kind `vt`. Other values pass through.
fn leaf_value(value: &Value, vt: VarType) -> ArrayResult<Value> {
    let scalar = match value {
        Value::Bool(b) => Scalar::Bool(*b),
        Value::Int(i) => Scalar::Int64(*i),
        Value::Float(x) => Scalar::Float64(*x),
        other => return Ok(other.clone()),
    };
    scalar.cast(vt).to_value()
}

fn full_array(ty: &TypeRef, value: Option<&Value>, shape: &[usize]) -> ArrayResult<ArrayValue> {
    #[cfg(feature = "tensor")]
    if ty.is_tensor() {
        use crate::structs::variants::tensor::{storage_type, tensor};
        let storage = storage_type(ty)?;
        let flat = full_array(storage, value, &[shape.iter().product()])?;
        return Ok(tensor(ty, shape.to_vec(), flat));
    }

    let compatible = shape.len() == ty.meta.ndim()
        && ty.meta.shape.iter().zip(shape).all(|(e, &n)| e.admits(n));
    if !compatible {
        return Err(ArrayError::value_error(INCOMPATIBLE_SHAPE));
    }

    let caps = ty.capabilities();
    if let (true, Some(v)) = (caps.init_const, value) {
        return ty.init_const(shape[0], &leaf_value(v, ty.meta.var_type)?);
    }

    let mut out = match ty.meta.outer() {
        Extent::Dynamic => ty.init(shape[0])?,
        Extent::Fixed(_) => ty.zero()?,
    };
    if value.is_none() && ty.meta.ndim() == 1 {
        return Ok(out);
    }

    let elem = element_dtype(ty);
    let inner = &shape[1..];
    if value.is_some() {
        let entry = full(&elem, value, inner)?;
        for i in 0..shape[0] {
            out.set(i, &entry)?;
        }
    } else {
        for i in 0..shape[0] {
            out.set(i, &full(&elem, None, inner)?)?;
        }
    }
    Ok(out)
}

fn check_counter_target(ty: &TypeRef, require_float: bool) -> ArrayResult<TypeRef> {
    if !ty.meta.is_dynamic_1d() || ty.is_tensor() {
        return Err(ArrayError::type_error(
            "unsupported dtype -- must be a dynamically sized 1D array.",
        ));
    }
    let vt = ty.meta.var_type;
    if ty.meta.flags.is_class || !vt.is_arithmetic() {
        return Err(ArrayError::type_error(
            "unsupported dtype -- must be an arithmetic type.",
        ));
    }
    if require_float && !vt.is_float() {
        return Err(ArrayError::type_error(
            "unsupported dtype -- must be a floating point type.",
        ));
    }
    let counter = ty.counter_type()?;
    if !counter.capabilities().init_counter {
        return Err(ArrayError::type_error(format!(
            "'{}' cannot create counters.",
            counter.name
        )));
    }
    Ok(counter)
}

/// Evenly spaced values `start, start + step, ..` below `stop` (above it for a negative step).
pub fn arange(ty: &TypeRef, start: i64, stop: i64, step: i64) -> ArrayResult<ArrayValue> {
    arange_inner(ty, start, stop, step).map_err(|e| e.in_operation("arange"))
}

fn arange_inner(ty: &TypeRef, start: i64, stop: i64, step: i64) -> ArrayResult<ArrayValue> {
    let counter_ty = check_counter_target(ty, false)?;
    if step == 0 {
        return Err(ArrayError::value_error("step cannot be zero."));
    }
    let (start_w, stop_w, step_w) = (start as i128, stop as i128, step as i128);
    let size = (stop_w - start_w + step_w - step_w.signum()) / step_w;
    if size == 0 {
        return ty.zero();
    }
    if size < 0 {
        return Err(ArrayError::value_error("size cannot be negative."));
    }
    let size = u32::try_from(size)
        .map_err(|_| ArrayError::value_error(format!("size {size} is too large.")))?;

    let counter = counter_ty.init_counter(size as usize)?;
    let index = construct(ty, &[Value::Array(counter)], &[])?;
    if start == 0 && step == 1 {
        return Ok(index);
    }
    let step = construct(ty, &[Value::Int(step)], &[])?;
    let start = construct(ty, &[Value::Int(start)], &[])?;
    arithmetic::fma(&index, &step, &start)
}

/// `num` evenly spaced values from `start` to `stop`, including `stop` when `endpoint` is set.
pub fn linspace(
    ty: &TypeRef,
    start: f64,
    stop: f64,
    num: usize,
    endpoint: bool,
) -> ArrayResult<ArrayValue> {
    linspace_inner(ty, start, stop, num, endpoint).map_err(|e| e.in_operation("linspace"))
}

fn linspace_inner(
    ty: &TypeRef,
    start: f64,
    stop: f64,
    num: usize,
    endpoint: bool,
) -> ArrayResult<ArrayValue> {
    let counter_ty = check_counter_target(ty, true)?;
    if num == 0 {
        return ty.zero();
    }
    let divisor = num - usize::from(endpoint);
    // a single point with the endpoint included sits at `start`
    let step = if divisor == 0 {
        0.0
    } else {
        (stop - start) / divisor as f64
    };

    let counter = counter_ty.init_counter(num)?;
    let index = construct(ty, &[Value::Array(counter)], &[])?;
    let step = construct(ty, &[Value::Float(step)], &[])?;
    let start = construct(ty, &[Value::Float(start)], &[])?;
    arithmetic::fma(&index, &step, &start)
}
