use std::fmt::{Debug, Display, Formatter};

use super::Value;

/// Implements `PartialEq` for `Value`
///
/// Arrays compare by content: both sides are converted to host lists first, so a
/// traced `Float` equals a host `HostFloat` holding the same numbers. Arrays that
/// cannot be evaluated compare unequal.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (None, None) => true,
            (Bool(a), Bool(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (List(a), List(b)) => a == b,
            (Struct(a), Struct(b)) => a == b,
            (Array(_), _) | (_, Array(_)) | (Iterable(_), _) | (_, Iterable(_)) => {
                match (self.to_host(), other.to_host()) {
                    (Ok(a), Ok(b)) => !matches!(a, Array(_)) && a == b,
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(i) => write!(f, "Int({i})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::List(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Iterable(it) => write!(f, "{it:?}"),
            Value::Array(a) => write!(f, "{a:?}"),
            Value::Struct(s) => write!(f, "{s:?}"),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::None => f.write_str("None"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            other => match other.to_host() {
                Ok(host) if !matches!(host, Value::Array(_) | Value::Iterable(_)) => {
                    write!(f, "{host}")
                }
                _ => write!(f, "<{}>", other.type_name()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::value::Iterable;

    #[test]
    fn test_scalar_equality() {
        assert_eq!(Value::Int(3), Value::Int(3));
        assert_ne!(Value::Int(3), Value::Float(3.0));
        assert_eq!(Value::from(vec![1, 2]), Value::List(vec![Value::Int(1), Value::Int(2)]));
    }

    #[test]
    fn test_iterable_compares_by_content() {
        let it = Value::Iterable(Iterable::from_values(vec![Value::Int(1), Value::Bool(true)]));
        assert_eq!(it, Value::List(vec![Value::Int(1), Value::Bool(true)]));
        assert_eq!(it.to_string(), "[1, true]");
    }
}
