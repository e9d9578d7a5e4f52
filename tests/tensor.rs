//! Integration tests for tensor construction

#![cfg(feature = "tensor")]

use std::sync::Arc;

use tracearray::{EagerBackend, TypeRegistry, Value, construct, construct_tensor};

#[test]
fn test_tensor_from_nested_lists() {
    let reg = TypeRegistry::standard(Arc::new(EagerBackend::new())).unwrap();
    let ty = reg.get("TensorXf").unwrap();

    let nested = Value::from(vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]);
    let t = construct(&ty, &[nested.clone()], &[]).unwrap();
    assert_eq!(t.tensor_shape(), Some(&[3, 2][..]));
    assert_eq!(t.to_host().unwrap(), nested);
    assert_eq!(t.tensor_storage().unwrap().len().unwrap(), 6);
}

#[test]
fn test_tensor_reshape_from_flat_storage() {
    let reg = TypeRegistry::standard(Arc::new(EagerBackend::new())).unwrap();
    let ty = reg.get("TensorXf").unwrap();
    let float = reg.get("Float").unwrap();

    let flat = construct(&float, &[Value::from(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])], &[]).unwrap();
    let t = construct_tensor(&ty, Some(&Value::Array(flat)), Some(&[2, 3][..])).unwrap();
    assert_eq!(
        t.to_host().unwrap(),
        Value::from(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]])
    );

    // An existing tensor can be reshaped through its storage
    let r = construct_tensor(&ty, Some(&Value::Array(t)), Some(&[3, 2][..])).unwrap();
    assert_eq!(r.tensor_shape(), Some(&[3, 2][..]));

    let err = construct(&ty, &[Value::Int(1), Value::Int(2)], &[]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "TensorXf.__init__(): Could not initialize array from argument list."
    );
}
