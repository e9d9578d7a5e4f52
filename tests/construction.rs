//! Integration tests for array construction through the public entry points

use std::sync::Arc;

use tracearray::{
    ArrayError, EagerBackend, Iterable, TypeRegistry, Value, construct, shares_variable,
};

fn registry() -> Arc<TypeRegistry> {
    TypeRegistry::standard(Arc::new(EagerBackend::new())).unwrap()
}

fn floats(v: &[f64]) -> Value {
    Value::List(v.iter().map(|&x| Value::Float(x)).collect())
}

#[test]
fn test_host_sequence_round_trip() {
    let reg = registry();
    let float = reg.get("Float").unwrap();

    let src = floats(&[0.5, -1.0, 8.25]);
    let a = construct(&float, &[src.clone()], &[]).unwrap();
    assert_eq!(a.len().unwrap(), 3);
    assert_eq!(a.to_host().unwrap(), src);

    // Copying an array of the same type shares the traced variable
    let copy = construct(&float, &[Value::Array(a.clone())], &[]).unwrap();
    assert!(shares_variable(&a, &copy));

    let ints = construct(&reg.get("Int").unwrap(), &[Value::from(vec![4, 5, 6])], &[]).unwrap();
    assert_eq!(ints.to_host().unwrap(), Value::from(vec![4, 5, 6]));
}

#[test]
fn test_empty_dynamic_construction() {
    let reg = registry();

    // An empty list gives an empty array of a dynamically sized type
    let f = construct(&reg.get("Float").unwrap(), &[Value::List(Vec::new())], &[]).unwrap();
    assert_eq!(f.len().unwrap(), 0);

    let xf = construct(&reg.get("ArrayXf").unwrap(), &[Value::List(Vec::new())], &[]).unwrap();
    assert_eq!(xf.len().unwrap(), 0);
}

#[test]
fn test_fixed_size_mismatch() {
    let reg = registry();
    let a3 = reg.get("Array3f").unwrap();

    let err = construct(&a3, &[floats(&[1.0, 2.0, 3.0, 4.0])], &[]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Array3f.__init__(): Input has the wrong size (expected 3 elements, got 4)."
    );
    assert!(matches!(err.root(), ArrayError::SizeMismatch { expected: 3, found: 4 }));
}

#[test]
fn test_iterable_import() {
    let reg = registry();
    let float = reg.get("Float").unwrap();

    let it = Iterable::from_values(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    let a = construct(&float, &[Value::Iterable(it)], &[]).unwrap();
    assert_eq!(a.to_host().unwrap(), floats(&[1.0, 2.0, 3.0]));
}

#[test]
fn test_failing_iterable_reports_materialisation() {
    let reg = registry();
    let float = reg.get("Float").unwrap();

    let it = Iterable::new(|| {
        Box::new(
            vec![Ok(Value::Int(1)), Err(ArrayError::value_error("generator exhausted"))]
                .into_iter(),
        )
    });
    let err = construct(&float, &[Value::Iterable(it)], &[]).unwrap_err();
    assert!(matches!(err.root(), ArrayError::Materialize(_)));
}

#[test]
fn test_nested_components() {
    let reg = registry();
    let a3 = reg.get("Array3f").unwrap();

    // Per-component sequences become the lanes of each component
    let v = construct(
        &a3,
        &[Value::List(vec![floats(&[1.0, 2.0]), floats(&[3.0, 4.0]), floats(&[5.0, 6.0])])],
        &[],
    )
    .unwrap();
    assert_eq!(v.get(2).unwrap().to_host().unwrap(), floats(&[5.0, 6.0]));

    // Several positional arguments are imported as one sequence
    let v = construct(&a3, &[Value::Int(1), Value::Int(2), Value::Int(3)], &[]).unwrap();
    assert_eq!(
        v.to_host().unwrap(),
        Value::List(vec![floats(&[1.0]), floats(&[2.0]), floats(&[3.0])])
    );
}

#[test]
fn test_values_are_released() {
    let backend = Arc::new(EagerBackend::new());
    let reg = TypeRegistry::standard(backend.clone()).unwrap();
    {
        let a3 = reg.get("Array3f").unwrap();
        let v = construct(&a3, &[Value::Float(2.0)], &[]).unwrap();
        let copy = construct(&a3, &[Value::Array(v.clone())], &[]).unwrap();
        assert_eq!(copy.to_host().unwrap(), v.to_host().unwrap());
        assert!(backend.live_variables() > 0);
    }
    assert_eq!(backend.live_variables(), 0);
}
