//! # **Mask Kernel** - *Call Arguments and the `active` Mask*
//!
//! Arguments of a recorded call travel as [`CallArgs`]. A call may be restricted to a
//! subset of lanes by a boolean mask, passed either as the `active` keyword or as
//! the last positional argument. [`extract_mask`] takes it out and leaves `true` in
//! its place, so the callables still see the argument they were written for.

use crate::kernels::construct::construct;
use crate::{ArrayResult, Kwargs, Value, VarType};

/// Keyword under which a call mask may be passed.
pub const MASK_KEY: &str = "active";

/// Positional and keyword arguments of a call.
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    pub args: Vec<Value>,
    pub kwargs: Kwargs,
}

impl CallArgs {
    pub fn new(args: Vec<Value>) -> Self {
        CallArgs {
            args,
            kwargs: Kwargs::new(),
        }
    }

    /// Adds a keyword argument, replacing an earlier one of the same name.
    pub fn with_kwarg(mut self, name: impl Into<String>, value: Value) -> Self {
        let name = name.into();
        self.kwargs.retain(|(k, _)| *k != name);
        self.kwargs.push((name, value));
        self
    }

    pub fn kwarg(&self, name: &str) -> Option<&Value> {
        self.kwargs.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }
}

/// True for values that can act as a call mask.
fn is_mask(value: &Value) -> bool {
    match value {
        Value::Bool(_) => true,
        Value::Array(a) => a.ty.is_jit_leaf() && a.ty.meta.var_type == VarType::Bool,
        _ => false,
    }
}

/// `true` of the same type as `mask`.
fn all_active(mask: &Value) -> ArrayResult<Value> {
    match mask {
        Value::Array(a) => Ok(Value::Array(construct(&a.ty, &[Value::Bool(true)], &[])?)),
        _ => Ok(Value::Bool(true)),
    }
}

/// Removes the call mask from `args`, if any, and returns it.
///
/// The `active` keyword takes precedence and is moved to the end of the keyword list.
/// Otherwise a trailing positional boolean (host bool or 1-D traced `Bool`) is taken.
pub fn extract_mask(args: &mut CallArgs) -> ArrayResult<Option<Value>> {
    if let Some(pos) = args.kwargs.iter().position(|(k, _)| k == MASK_KEY) {
        let (key, mask) = args.kwargs.remove(pos);
        let replacement = all_active(&mask)?;
        args.kwargs.push((key, replacement));
        return Ok(Some(mask));
    }
    match args.args.last_mut() {
        Some(last) if is_mask(last) => {
            let replacement = all_active(last)?;
            Ok(Some(std::mem::replace(last, replacement)))
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{EagerBackend, TypeRegistry};

    #[test]
    fn test_no_mask() {
        let mut args = CallArgs::new(vec![Value::Int(1), Value::Float(2.0)]);
        assert!(extract_mask(&mut args).unwrap().is_none());
        assert!(extract_mask(&mut CallArgs::default()).unwrap().is_none());
        assert_eq!(args.args.len(), 2);
    }

    #[test]
    fn test_trailing_positional_mask() {
        let reg = TypeRegistry::standard(Arc::new(EagerBackend::new())).unwrap();
        let bool_t = reg.get("Bool").unwrap();
        let mask = construct(&bool_t, &[Value::from(vec![true, false])], &[]).unwrap();
        let mut args = CallArgs::new(vec![Value::Int(1), Value::Array(mask)]);
        let taken = extract_mask(&mut args).unwrap().unwrap();
        assert_eq!(taken.to_host().unwrap(), Value::from(vec![true, false]));
        assert_eq!(args.args[1].to_host().unwrap(), Value::from(vec![true]));
        assert_eq!(args.args[1].type_name(), "Bool");

        let mut args = CallArgs::new(vec![Value::Bool(false)]);
        assert_eq!(extract_mask(&mut args).unwrap(), Some(Value::Bool(false)));
        assert_eq!(args.args, vec![Value::Bool(true)]);
    }

    #[test]
    fn test_keyword_mask_wins() {
        let mut args = CallArgs::new(vec![Value::Bool(false)])
            .with_kwarg(MASK_KEY, Value::Bool(false))
            .with_kwarg("scale", Value::Float(2.0));
        let taken = extract_mask(&mut args).unwrap();
        assert_eq!(taken, Some(Value::Bool(false)));
        assert_eq!(args.args, vec![Value::Bool(false)]);
        assert_eq!(args.kwargs.last().map(|(k, _)| k.as_str()), Some(MASK_KEY));
        assert_eq!(args.kwarg(MASK_KEY), Some(&Value::Bool(true)));
        assert_eq!(args.kwargs.len(), 2);
    }
}
