//! Integration tests for the structured generators

use std::sync::Arc;

use tracearray::{
    DType, EagerBackend, TypeRegistry, Value, arange, full, linspace, ones, zeros,
};

fn registry() -> Arc<TypeRegistry> {
    TypeRegistry::standard(Arc::new(EagerBackend::new())).unwrap()
}

fn floats(v: &[f64]) -> Value {
    Value::List(v.iter().map(|&x| Value::Float(x)).collect())
}

#[test]
fn test_zeros_and_ones_match_full() {
    let reg = registry();
    let float = DType::from(reg.get("Float").unwrap());

    let z = zeros(&float, 3).unwrap();
    let o = ones(&float, 3).unwrap();
    assert_eq!(z.to_host().unwrap(), floats(&[0.0, 0.0, 0.0]));
    assert_eq!(o.to_host().unwrap(), floats(&[1.0, 1.0, 1.0]));

    // zeros/ones are full with 0 and 1
    assert_eq!(z, full(&float, Some(&Value::Int(0)), &[3]).unwrap());
    assert_eq!(o, full(&float, Some(&Value::Int(1)), &[3]).unwrap());
}

#[test]
fn test_zeros_and_ones_every_leaf_kind() {
    let reg = registry();
    for name in ["Bool", "Int", "UInt", "Int64", "UInt64", "Float", "Float64"] {
        for prefix in ["", "Host"] {
            let name = format!("{prefix}{name}");
            let dtype = DType::from(reg.get(&name).unwrap());
            let (zero, one) = match name.trim_start_matches("Host") {
                "Bool" => (Value::from(vec![false, false]), Value::from(vec![true, true])),
                "Float" | "Float64" => (Value::from(vec![0.0, 0.0]), Value::from(vec![1.0, 1.0])),
                _ => (Value::from(vec![0, 0]), Value::from(vec![1, 1])),
            };
            assert_eq!(zeros(&dtype, 2).unwrap().to_host().unwrap(), zero, "zeros of {name}");
            assert_eq!(ones(&dtype, 2).unwrap().to_host().unwrap(), one, "ones of {name}");
        }
    }
}

#[test]
fn test_full_nested_shape() {
    let reg = registry();
    let a3 = DType::from(reg.get("Array3f").unwrap());

    let v = full(&a3, Some(&Value::Float(2.5)), &[3, 2]).unwrap();
    assert_eq!(
        v.to_host().unwrap(),
        Value::List(vec![floats(&[2.5, 2.5]), floats(&[2.5, 2.5]), floats(&[2.5, 2.5])])
    );
}

#[test]
fn test_arange_forward_and_negative_step() {
    let reg = registry();
    let float = reg.get("Float").unwrap();
    let int = reg.get("Int").unwrap();

    let a = arange(&float, 0, 5, 2).unwrap();
    assert_eq!(a.to_host().unwrap(), floats(&[0.0, 2.0, 4.0]));

    let a = arange(&int, 3, -3, -3).unwrap();
    assert_eq!(a.to_host().unwrap(), Value::from(vec![3, 0]));

    let err = arange(&int, 0, 1, 0).unwrap_err();
    assert_eq!(err.to_string(), "arange(): step cannot be zero.");
}

#[test]
fn test_linspace_endpoints() {
    let reg = registry();
    let float = reg.get("Float").unwrap();

    let l = linspace(&float, -1.0, 1.0, 3, true).unwrap();
    assert_eq!(l.to_host().unwrap(), floats(&[-1.0, 0.0, 1.0]));

    let l = linspace(&float, 0.0, 2.0, 4, false).unwrap();
    assert_eq!(l.to_host().unwrap(), floats(&[0.0, 0.5, 1.0, 1.5]));

    assert_eq!(linspace(&float, 0.0, 1.0, 0, true).unwrap().len().unwrap(), 0);

    let err = linspace(&reg.get("Int").unwrap(), 0.0, 1.0, 2, true).unwrap_err();
    assert_eq!(
        err.to_string(),
        "linspace(): unsupported dtype -- must be a floating point type."
    );
}
