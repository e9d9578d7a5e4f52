//! Integration tests for `switch` and `dispatch`, including release of the captured call state

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracearray::{
    ArrayError, ArrayResult, Backend, CallArgs, DispatchFn, EagerBackend, InstanceRef, MASK_KEY,
    SwitchFn, TypeRef, TypeRegistry, Value, construct, dispatch, fma, switch,
};

fn floats(v: &[f64]) -> Value {
    Value::List(v.iter().map(|&x| Value::Float(x)).collect())
}

/// Callable computing `x * factor + offset`, counting its invocations.
fn affine(ty: &TypeRef, factor: f64, offset: f64, calls: &Arc<AtomicUsize>) -> SwitchFn {
    let ty = ty.clone();
    let calls = calls.clone();
    Box::new(move |args: &CallArgs| -> ArrayResult<Value> {
        calls.fetch_add(1, Ordering::SeqCst);
        let x = args.args[0].try_array()?;
        let a = construct(&ty, &[Value::Float(factor)], &[])?;
        let b = construct(&ty, &[Value::Float(offset)], &[])?;
        Ok(Value::Array(fma(x, &a, &b)?))
    })
}

/// Counts how often it is dropped.
struct DropToken(Arc<AtomicUsize>);

impl Drop for DropToken {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

fn with_token(token: DropToken, mut f: SwitchFn) -> SwitchFn {
    Box::new(move |args: &CallArgs| -> ArrayResult<Value> {
        let _held = &token;
        f(args)
    })
}

#[test]
fn test_scalar_switch() {
    let reg = TypeRegistry::standard(Arc::new(EagerBackend::new())).unwrap();
    let float = reg.get("Float").unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let x = construct(&float, &[floats(&[1.0, 2.0])], &[]).unwrap();

    let table = vec![affine(&float, 3.0, 0.0, &calls), affine(&float, 0.0, 7.0, &calls)];
    let r = switch(&Value::Int(0), table, CallArgs::new(vec![Value::Array(x.clone())])).unwrap();
    assert_eq!(r.to_host().unwrap(), floats(&[3.0, 6.0]));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // A false scalar mask skips the call entirely
    let table = vec![affine(&float, 3.0, 0.0, &calls)];
    let args = CallArgs::new(vec![Value::Array(x)]).with_kwarg(MASK_KEY, Value::Bool(false));
    assert!(switch(&Value::Int(0), table, args).unwrap().is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_all_masked_vector_switch() {
    let backend = Arc::new(EagerBackend::new());
    let reg = TypeRegistry::standard(backend.clone()).unwrap();
    let float = reg.get("Float").unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    {
        let x = construct(&float, &[floats(&[1.0, 2.0, 3.0])], &[]).unwrap();
        let index = construct(&reg.get("UInt").unwrap(), &[Value::from(vec![0, 1, 1])], &[]).unwrap();
        let mask = construct(&reg.get("Bool").unwrap(), &[Value::from(vec![false, false, false])], &[])
            .unwrap();

        let table = vec![affine(&float, 1.0, 1.0, &calls), affine(&float, 2.0, 0.0, &calls)];
        let args = CallArgs::new(vec![Value::Array(x), Value::Array(mask)]);
        let r = switch(&Value::Array(index), table, args).unwrap();
        assert!(r.is_none());
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(backend.live_variables(), 0);
}

#[test]
fn test_partial_mask_zeroes_inactive_lanes() {
    let reg = TypeRegistry::standard(Arc::new(EagerBackend::new())).unwrap();
    let float = reg.get("Float").unwrap();
    let calls = Arc::new(AtomicUsize::new(0));

    let x = construct(&float, &[floats(&[1.0, 2.0, 3.0, 4.0])], &[]).unwrap();
    let index = construct(&reg.get("UInt").unwrap(), &[Value::from(vec![1, 1, 0, 0])], &[]).unwrap();
    let mask = construct(&reg.get("Bool").unwrap(), &[Value::from(vec![true, false, true, true])], &[])
        .unwrap();

    let table = vec![affine(&float, 1.0, 100.0, &calls), affine(&float, -1.0, 0.0, &calls)];
    let args = CallArgs::new(vec![Value::Array(x)]).with_kwarg(MASK_KEY, Value::Array(mask));
    let r = switch(&Value::Array(index), table, args).unwrap();
    assert_eq!(r.to_host().unwrap(), floats(&[-1.0, 0.0, 103.0, 104.0]));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_switch_index_out_of_range() {
    let reg = TypeRegistry::standard(Arc::new(EagerBackend::new())).unwrap();
    let float = reg.get("Float").unwrap();
    let calls = Arc::new(AtomicUsize::new(0));

    let x = construct(&float, &[floats(&[1.0, 2.0])], &[]).unwrap();
    let index = construct(&reg.get("UInt").unwrap(), &[Value::from(vec![0, 3])], &[]).unwrap();
    let table = vec![affine(&float, 1.0, 0.0, &calls)];
    let err = switch(&Value::Array(index), table, CallArgs::new(vec![Value::Array(x)])).unwrap_err();
    assert_eq!(
        err.to_string(),
        "switch(): index 3 is out of range (there are 1 callables)."
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_single_index_broadcasts_over_wider_arguments() {
    let backend = Arc::new(EagerBackend::new());
    let reg = TypeRegistry::standard(backend.clone()).unwrap();
    let float = reg.get("Float").unwrap();
    let uint = reg.get("UInt").unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    {
        let x = construct(&float, &[floats(&[1.0, 2.0, 3.0])], &[]).unwrap();
        let index = construct(&uint, &[Value::from(vec![1])], &[]).unwrap();
        let table = vec![affine(&float, 5.0, 0.0, &calls), affine(&float, 1.0, 0.0, &calls)];
        let r = switch(&Value::Array(index), table, CallArgs::new(vec![Value::Array(x)])).unwrap();
        assert_eq!(r.to_host().unwrap(), floats(&[1.0, 2.0, 3.0]));

        // Sizes other than 1 must agree with the widest operand
        let x = construct(&float, &[floats(&[1.0, 2.0, 3.0])], &[]).unwrap();
        let index = construct(&uint, &[Value::from(vec![0, 1])], &[]).unwrap();
        let table = vec![affine(&float, 1.0, 0.0, &calls), affine(&float, 1.0, 0.0, &calls)];
        let err = switch(&Value::Array(index), table, CallArgs::new(vec![Value::Array(x)])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "switch(): operand of size 2 does not match the call width 3."
        );
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(backend.live_variables(), 0);
}

#[test]
fn test_vector_mask_requires_vector_index() {
    let reg = TypeRegistry::standard(Arc::new(EagerBackend::new())).unwrap();
    let float = reg.get("Float").unwrap();
    let calls = Arc::new(AtomicUsize::new(0));

    let x = construct(&float, &[floats(&[1.0, 2.0])], &[]).unwrap();
    let mask = construct(&reg.get("Bool").unwrap(), &[Value::from(vec![true, false])], &[]).unwrap();
    let args = CallArgs::new(vec![Value::Array(x)]).with_kwarg(MASK_KEY, Value::Array(mask));
    let err = switch(&Value::Int(0), vec![affine(&float, 1.0, 0.0, &calls)], args).unwrap_err();
    assert_eq!(
        err.to_string(),
        "switch(): the provided 'mask' argument must be scalar if 'index' is scalar"
    );
    assert!(matches!(err.root(), ArrayError::Type(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

struct Shape {
    scale: f64,
}

#[test]
fn test_dispatch_once_per_instance() {
    let backend = Arc::new(EagerBackend::new());
    let reg = TypeRegistry::standard(backend.clone()).unwrap();
    let float = reg.get("Float").unwrap();
    let shape_ptr = reg.register_instance_array("ShapePtr", "Shape").unwrap();

    let small = backend.register_instance("Shape", Arc::new(Shape { scale: 2.0 }));
    let large = backend.register_instance("Shape", Arc::new(Shape { scale: 10.0 }));
    assert_eq!((small, large), (1, 2));

    let calls = Arc::new(AtomicUsize::new(0));
    {
        let ids = Value::from(vec![small, large, 0, small]);
        let instances = construct(&shape_ptr, &[ids], &[]).unwrap();
        let x = construct(&float, &[floats(&[1.0, 2.0, 3.0, 4.0])], &[]).unwrap();

        let ty = float.clone();
        let counter = calls.clone();
        let method: DispatchFn = Box::new(
            move |instance: &InstanceRef, args: &CallArgs| -> ArrayResult<Value> {
                counter.fetch_add(1, Ordering::SeqCst);
                let shape = (**instance)
                    .downcast_ref::<Shape>()
                    .ok_or_else(|| ArrayError::type_error("not a Shape"))?;
                let x = args.args[0].try_array()?;
                let s = construct(&ty, &[Value::Float(shape.scale)], &[])?;
                let zero = construct(&ty, &[Value::Float(0.0)], &[])?;
                Ok(Value::Array(fma(x, &s, &zero)?))
            },
        );

        let r = dispatch(&instances, method, CallArgs::new(vec![Value::Array(x)])).unwrap();
        // Lane 2 holds no instance and reads zero
        assert_eq!(r.to_host().unwrap(), floats(&[2.0, 20.0, 0.0, 8.0]));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(backend.live_variables(), 0);
}

#[test]
fn test_call_state_released_once() {
    let backend = Arc::new(EagerBackend::new());
    let reg = TypeRegistry::standard(backend.clone()).unwrap();
    let float = reg.get("Float").unwrap();
    let uint = reg.get("UInt").unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let drops = Arc::new(AtomicUsize::new(0));

    let table = || {
        vec![
            with_token(DropToken(drops.clone()), affine(&float, 2.0, 0.0, &calls)),
            with_token(DropToken(drops.clone()), affine(&float, 1.0, 1.0, &calls)),
        ]
    };

    // Completed call: the state is gone by the time `switch` returns
    {
        let x = construct(&float, &[floats(&[1.0, 2.0])], &[]).unwrap();
        let index = construct(&uint, &[Value::from(vec![0, 1])], &[]).unwrap();
        let r = switch(&Value::Array(index), table(), CallArgs::new(vec![Value::Array(x)])).unwrap();
        assert_eq!(r.to_host().unwrap(), floats(&[2.0, 3.0]));
    }
    assert_eq!(drops.load(Ordering::SeqCst), 2);
    assert_eq!(backend.live_variables(), 0);

    // Deferred call: the backend keeps the state until it finalises the call
    backend.set_symbolic(true);
    {
        let x = construct(&float, &[floats(&[1.0, 2.0])], &[]).unwrap();
        let index = construct(&uint, &[Value::from(vec![1, 1])], &[]).unwrap();
        let r = switch(&Value::Array(index), table(), CallArgs::new(vec![Value::Array(x)])).unwrap();
        assert_eq!(r.to_host().unwrap(), floats(&[2.0, 3.0]));
    }
    assert_eq!(drops.load(Ordering::SeqCst), 2);
    assert_eq!(backend.pending_calls(), 1);

    assert_eq!(backend.finalize_calls(), 1);
    assert_eq!(drops.load(Ordering::SeqCst), 4);
    assert_eq!(backend.pending_calls(), 0);
    assert_eq!(backend.finalize_calls(), 0);
    assert_eq!(backend.live_variables(), 0);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}
