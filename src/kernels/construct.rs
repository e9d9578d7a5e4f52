// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under MIT License.

//! # **Construction Kernel** - *`<Type>(args..)` Resolution*
//!
//! Resolves a target type and constructor arguments to one of: zero
//! initialisation, copy, cast, bulk host import, sequence import, or scalar
//! broadcast. Every failure is reported as an error of the target type's
//! constructor, e.g. `Array3f.__init__(): Input has the wrong size (..)`.

use std::sync::Arc;

use log::trace;

use crate::enums::var_type::JitBackend;
use crate::kernels::sequence::import_sequence;
use crate::structs::descriptor::ElementType;
use crate::structs::meta::Extent;
use crate::{ArrayError, ArrayResult, ArrayValue, Scalar, TypeRef, Value, VarType};

/// Note appended to broadcast failures when sequence import was refused.
const REFUSED_NOTE: &str = " Refused to perform an inefficient element-by-element copy.";

/// Constructs a value of `ty` from positional `args`.
///
/// ### Resolution
/// - no arguments: zero value
/// - several arguments: imported as a sequence, e.g. `Array3f(1, 2, 3)`
/// - one argument of the same type: copy, sharing traced variables
/// - one argument of another array type: cast, then host import, then sequence
///   import, then broadcast, whichever applies first
/// - any other single argument: sequence import, then broadcast
///
/// Keyword arguments are rejected.
pub fn construct(
    ty: &TypeRef,
    args: &[Value],
    kwargs: &[(String, Value)],
) -> ArrayResult<ArrayValue> {
    construct_inner(ty, args, kwargs).map_err(|e| e.in_constructor(&ty.name))
}

fn construct_inner(
    ty: &TypeRef,
    args: &[Value],
    kwargs: &[(String, Value)],
) -> ArrayResult<ArrayValue> {
    if !kwargs.is_empty() {
        return Err(ArrayError::KeywordArguments);
    }

    #[cfg(feature = "tensor")]
    if ty.is_tensor() {
        return match args {
            [] => crate::kernels::tensor::construct_tensor(ty, None, None),
            [array] => crate::kernels::tensor::construct_tensor(ty, Some(array), None),
            _ => Err(ArrayError::ArgumentList),
        };
    }

    match args {
        [] => {
            trace!("{}: zero initialisation", ty.name);
            ty.zero()
        }
        [arg] => construct_single(ty, arg),
        many => {
            trace!("{}: import of {} arguments", ty.name, many.len());
            import_sequence(ty, &Value::List(many.to_vec()))?.ok_or(ArrayError::ArgumentList)
        }
    }
}

fn construct_single(ty: &TypeRef, arg: &Value) -> ArrayResult<ArrayValue> {
    let mut try_sequence = true;

    if let Value::Array(src) = arg {
        if Arc::ptr_eq(&src.ty, ty) {
            trace!("{}: copy", ty.name);
            return Ok(src.clone());
        }
        let caps = ty.capabilities();

        if caps.cast && src.ty.meta.with_type(ty.meta.var_type) == ty.meta {
            trace!("{}: cast from {}", ty.name, src.ty.name);
            return ty.cast(src);
        }

        if caps.init_data
            && src.ty.capabilities().data
            && ty.meta.with_backend(JitBackend::Host) == src.ty.meta
        {
            if let Some(data) = src.data()? {
                trace!("{}: host import from {}", ty.name, src.ty.name);
                return ty.init_data(&data);
            }
        }

        if ty.meta.is_dynamic_1d() && src.ty.meta.is_dynamic_1d() {
            try_sequence = false;
        } else if ty.value_chain_contains(&src.ty) {
            try_sequence = false;
        }
    }

    if try_sequence {
        if let Some(out) = import_sequence(ty, arg)? {
            return Ok(out);
        }
    }

    broadcast(ty, arg, try_sequence)
}

/// Component type filled by a broadcast. For matrices this is the row's component.
fn component(ty: &TypeRef) -> &ElementType {
    match (ty.meta.flags.is_matrix, ty.value_type()) {
        (true, Some(row)) => &row.value,
        _ => &ty.value,
    }
}

/// Builds one entry of `component` from `arg`.
fn component_element(component: &ElementType, arg: &Value) -> ArrayResult<Value> {
    match component {
        ElementType::Array(t) => match arg {
            Value::Array(a) if Arc::ptr_eq(&a.ty, t) => Ok(arg.clone()),
            other => Ok(Value::Array(construct(t, std::slice::from_ref(other), &[])?)),
        },
        ElementType::Scalar(vt) => host_scalar(arg, *vt),
    }
}

/// `bool(x)` / `int(x)` / `float(x)` style conversion of a host scalar.
fn host_scalar(arg: &Value, vt: VarType) -> ArrayResult<Value> {
    let scalar = match arg {
        Value::Bool(b) => Scalar::Bool(*b),
        Value::Int(i) => Scalar::Int64(*i),
        Value::Float(x) => Scalar::Float64(*x),
        other => {
            return Err(ArrayError::Conversion {
                value: other.describe(),
                target: vt.name(),
            });
        }
    };
    scalar.cast(vt).to_value()
}

fn broadcast(ty: &TypeRef, arg: &Value, try_sequence: bool) -> ArrayResult<ArrayValue> {
    let extent = ty.meta.outer();
    if extent == Extent::Fixed(0) {
        return Err(ArrayError::SizeMismatch {
            expected: 0,
            found: 1,
        });
    }

    let element = component_element(component(ty), arg).map_err(|e| ArrayError::BroadcastFailed {
        from: arg.type_name(),
        note: if try_sequence { "" } else { REFUSED_NOTE },
        source: Box::new(e),
    })?;
    trace!("{}: broadcast from {}", ty.name, arg.type_name());

    let (mut out, size) = match extent {
        Extent::Dynamic => {
            if ty.capabilities().init_const {
                return ty.init_const(1, &element);
            }
            (ty.init(1)?, 1)
        }
        Extent::Fixed(n) => (ty.zero()?, n),
    };

    let flags = ty.meta.flags;
    let zero = || component_element(component(ty), &Value::Int(0));
    if flags.is_complex {
        out.set(0, &element)?;
        out.set(1, &zero()?)?;
    } else if flags.is_quaternion {
        let zero = zero()?;
        for i in 0..3 {
            out.set(i, &zero)?;
        }
        out.set(3, &element)?;
    } else if let (true, Some(row_ty)) = (flags.is_matrix, ty.value_type()) {
        let zero = zero()?;
        for i in 0..size {
            let mut row = row_ty.zero()?;
            for j in 0..row.len()? {
                row.set(j, if i == j { &element } else { &zero })?;
            }
            out.set(i, &Value::Array(row))?;
        }
    } else {
        for i in 0..size {
            out.set(i, &element)?;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EagerBackend, TypeRegistry};

    fn registry() -> Arc<TypeRegistry> {
        TypeRegistry::standard(Arc::new(EagerBackend::new())).unwrap()
    }

    fn build(reg: &TypeRegistry, name: &str, args: Vec<Value>) -> ArrayResult<ArrayValue> {
        construct(&reg.get(name).unwrap(), &args, &[])
    }

    fn floats(v: &[f64]) -> Value {
        Value::List(v.iter().map(|&x| Value::Float(x)).collect())
    }

    #[test]
    fn test_zero_initialisation() {
        let reg = registry();
        let z = build(&reg, "Array3f", vec![]).unwrap();
        assert_eq!(
            z.to_host().unwrap(),
            Value::List(vec![floats(&[]), floats(&[]), floats(&[])])
        );
        let f = build(&reg, "Float", vec![]).unwrap();
        assert_eq!(f.len().unwrap(), 0);
    }

    #[test]
    fn test_keyword_arguments_rejected() {
        let reg = registry();
        let float = reg.get("Float").unwrap();
        let err = construct(&float, &[], &[("x".into(), Value::Int(1))]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Float.__init__(): Constructor does not take keyword arguments."
        );
    }

    #[test]
    fn test_copy_shares_variable() {
        let reg = registry();
        let a = build(&reg, "Float", vec![Value::from(vec![1.0, 2.0])]).unwrap();
        let b = build(&reg, "Float", vec![Value::Array(a.clone())]).unwrap();
        assert_eq!(a.index().unwrap().index(), b.index().unwrap().index());
    }

    #[test]
    fn test_cast_and_host_import() {
        let reg = registry();
        let ints = build(&reg, "Int", vec![Value::from(vec![1, -2, 3])]).unwrap();
        let f = build(&reg, "Float", vec![Value::Array(ints)]).unwrap();
        assert_eq!(f.to_host().unwrap(), floats(&[1.0, -2.0, 3.0]));

        let host = build(&reg, "HostFloat", vec![Value::from(vec![0.5, 1.5])]).unwrap();
        let f = build(&reg, "Float", vec![Value::Array(host)]).unwrap();
        assert!(f.index().is_some());
        assert_eq!(f.to_host().unwrap(), floats(&[0.5, 1.5]));
    }

    #[test]
    fn test_refused_elementwise_copy() {
        let reg = registry();
        let host = build(&reg, "HostInt", vec![Value::from(vec![1, 2])]).unwrap();
        let err = build(&reg, "Float", vec![Value::Array(host)]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Float.__init__(): Broadcast from type 'HostInt' failed. Refused to perform an inefficient element-by-element copy."
        );
    }

    #[test]
    fn test_broadcast_fill_rules() {
        let reg = registry();
        let v = build(&reg, "Array3f", vec![Value::Float(2.0)]).unwrap();
        assert_eq!(
            v.to_host().unwrap(),
            Value::List(vec![floats(&[2.0]), floats(&[2.0]), floats(&[2.0])])
        );

        let c = build(&reg, "Complex2f", vec![Value::Int(3)]).unwrap();
        assert_eq!(c.to_host().unwrap(), Value::List(vec![floats(&[3.0]), floats(&[0.0])]));

        let q = build(&reg, "Quaternion4f", vec![Value::Int(1)]).unwrap();
        assert_eq!(
            q.to_host().unwrap(),
            Value::List(vec![floats(&[0.0]), floats(&[0.0]), floats(&[0.0]), floats(&[1.0])])
        );

        let m = build(&reg, "Matrix2f", vec![Value::Float(5.0)]).unwrap();
        assert_eq!(
            m.to_host().unwrap(),
            Value::List(vec![
                Value::List(vec![floats(&[5.0]), floats(&[0.0])]),
                Value::List(vec![floats(&[0.0]), floats(&[5.0])]),
            ])
        );
    }

    #[test]
    fn test_size_mismatch_names_type() {
        let reg = registry();
        let err = build(&reg, "Array3f", vec![Value::from(vec![1.0, 2.0])]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Array3f.__init__(): Input has the wrong size (expected 3 elements, got 2)."
        );
        assert!(matches!(err.root(), ArrayError::SizeMismatch { expected: 3, found: 2 }));
    }

    #[test]
    fn test_argument_list_import() {
        let reg = registry();
        let v = build(&reg, "ScalarArray3f", vec![Value::Int(1), Value::Int(2), Value::Int(3)]).unwrap();
        assert_eq!(v.to_host().unwrap(), floats(&[1.0, 2.0, 3.0]));
    }
}
