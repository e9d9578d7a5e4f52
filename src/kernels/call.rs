// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under MIT License.

//! # **Call Kernel** - *Polymorphic Calls over Traced Lanes*
//!
//! `switch` picks one of several callables per lane by a traced index, `dispatch`
//! calls a method on the instance each lane refers to. Both partition the lanes by
//! target through the backend, run every selected target exactly once on the lanes
//! that chose it, and merge the group results into one value.
//!
//! ## Lifecycle
//! Arguments are flattened to trace handles and moved, together with the callables,
//! into a [`CallState`]. The backend drives the state through
//! [`CallContinuation::invoke`] once per group. The state then either comes back with
//! [`CallOutcome::Complete`] and is dropped here, or stays with the backend
//! ([`CallOutcome::Deferred`]) until the backend finalises the call. Every group
//! invocation and the destruction of the state run under the [`HostLock`].

use std::sync::Arc;

use log::{debug, trace};

use crate::kernels::arithmetic;
use crate::kernels::construct::construct;
use crate::kernels::mask::{CallArgs, extract_mask};
use crate::kernels::traverse::{check_compatibility, collect, update};
use crate::structs::host_lock::HostLock;
use crate::structs::trace_handle::{IndexVector, TraceHandle};
use crate::traits::backend::{Backend, CallContinuation, CallOutcome, CallRequest, CallTarget};
use crate::{ArrayError, ArrayResult, ArrayValue, InstanceRef, Value, VarIndex, VarType};

/// Callable of a `switch` table.
pub type SwitchFn = Box<dyn FnMut(&CallArgs) -> ArrayResult<Value> + Send>;

/// Method invoked by `dispatch`, with the instance bound as its first argument.
pub type DispatchFn = Box<dyn FnMut(&InstanceRef, &CallArgs) -> ArrayResult<Value> + Send>;

enum Callables {
    Table(Vec<SwitchFn>),
    Method(DispatchFn),
}

/// Captured state of one recorded call.
pub struct CallState {
    backend: Arc<dyn Backend>,
    label: &'static str,
    /// `[positional.., ]` and `[keyword values..]`, as one value so one traversal covers both.
    captured: Value,
    kwarg_names: Vec<String>,
    callables: Callables,
    result: Option<Value>,
}

impl CallState {
    fn new(backend: &Arc<dyn Backend>, label: &'static str, args: CallArgs, callables: Callables) -> Self {
        let (kwarg_names, kwarg_values): (Vec<String>, Vec<Value>) = args.kwargs.into_iter().unzip();
        CallState {
            backend: backend.clone(),
            label,
            captured: Value::List(vec![Value::List(args.args), Value::List(kwarg_values)]),
            kwarg_names,
            callables,
            result: None,
        }
    }

    /// Rebuilds the call arguments around the narrowed handles of one group.
    fn arguments(&self, handles: &IndexVector) -> ArrayResult<CallArgs> {
        let Value::List(mut parts) = update(&self.captured, handles)? else {
            return Err(self.internal("captured arguments lost their structure"));
        };
        let (Some(Value::List(values)), Some(Value::List(args))) = (parts.pop(), parts.pop()) else {
            return Err(self.internal("captured arguments lost their structure"));
        };
        Ok(CallArgs {
            args,
            kwargs: self.kwarg_names.iter().cloned().zip(values).collect(),
        })
    }

    fn internal(&self, message: &str) -> ArrayError {
        ArrayError::Internal {
            op: self.label,
            message: message.to_string(),
        }
    }
}

impl CallContinuation for CallState {
    fn invoke(&mut self, target: CallTarget, args: &[VarIndex]) -> ArrayResult<Vec<VarIndex>> {
        let _guard = HostLock::acquire();
        trace!("{}: invoking group {:?} with {} handles", self.label, target, args.len());

        let handles = IndexVector::borrow_raw(&self.backend, args);
        let call_args = self.arguments(&handles)?;
        drop(handles);

        let label = self.label;
        let result = match (&mut self.callables, target) {
            (Callables::Table(table), CallTarget::Index(i)) => {
                let n = table.len();
                let f = table.get_mut(i as usize).ok_or_else(|| ArrayError::IndexOutOfBounds {
                    index: i64::from(i),
                    size: n,
                })?;
                f(&call_args)?
            }
            (Callables::Method(f), CallTarget::Instance(instance)) => f(&instance, &call_args)?,
            (_, other) => {
                return Err(ArrayError::Internal {
                    op: label,
                    message: format!("unexpected call target {other:?}"),
                });
            }
        };

        if let Some(prev) = &self.result {
            check_compatibility(prev, &result)?;
        }
        let mut outputs = IndexVector::new();
        collect(&result, &mut outputs);
        self.result = Some(result);
        Ok(outputs.into_raw())
    }

    fn result_template(&self) -> Option<Value> {
        self.result.clone()
    }

    fn take_result(&mut self) -> Option<Value> {
        self.result.take()
    }
}

impl Drop for CallState {
    fn drop(&mut self) {
        let _guard = HostLock::acquire();
        trace!("{}: releasing call state", self.label);
        self.captured = Value::None;
        self.result = None;
        self.callables = Callables::Table(Vec::new());
    }
}

/// Calls `callables[index]` per lane with `args`.
///
/// `index` is either a host `Value::Int`, in which case the callable runs directly,
/// or a traced 1-D `UInt32` array. A mask may be passed as the `active` keyword or as
/// the last positional argument; masked lanes run no callable and read zero in the
/// result. Returns `Value::None` when no lane is active.
pub fn switch(index: &Value, callables: Vec<SwitchFn>, args: CallArgs) -> ArrayResult<Value> {
    switch_inner(index, callables, args).map_err(|e| e.in_operation("switch"))
}

fn switch_inner(index: &Value, mut callables: Vec<SwitchFn>, mut args: CallArgs) -> ArrayResult<Value> {
    let mask = extract_mask(&mut args)?;

    if let Value::Int(i) = index {
        let active = match mask {
            None => true,
            Some(Value::Bool(b)) => b,
            Some(_) => {
                return Err(ArrayError::type_error(
                    "the provided 'mask' argument must be scalar if 'index' is scalar",
                ));
            }
        };
        if !active {
            return Ok(Value::None);
        }
        let n = callables.len();
        let f = usize::try_from(*i)
            .ok()
            .and_then(|i| callables.get_mut(i))
            .ok_or(ArrayError::IndexOutOfBounds { index: *i, size: n })?;
        return f(&args);
    }

    let index = match index {
        Value::Array(a) if a.ty.is_jit_leaf() && a.ty.meta.var_type == VarType::UInt32 => a,
        _ => {
            return Err(ArrayError::type_error(
                "the 'index' argument must be a Jit-compiled 1D 32-bit unsigned integer array",
            ));
        }
    };
    let Some(mask) = vector_mask(mask)? else {
        return Ok(Value::None);
    };

    let one = construct(&index.ty, &[Value::Int(1)], &[])?;
    let selector = arithmetic::fma(index, &one, &one)?;
    let n_targets = u32::try_from(callables.len())
        .map_err(|_| ArrayError::value_error("too many callables."))?;

    record(
        &index.ty.backend,
        None,
        n_targets,
        "switch()",
        &selector,
        mask.as_ref(),
        args,
        Callables::Table(callables),
    )
}

/// Calls `method` once per distinct instance referenced by the lanes of `instances`.
///
/// `instances` must be a class-valued 1-D array whose type names an instance domain.
/// Lanes holding id 0 are inactive. Masks work as in [`switch`].
pub fn dispatch(instances: &ArrayValue, method: DispatchFn, args: CallArgs) -> ArrayResult<Value> {
    dispatch_inner(instances, method, args).map_err(|e| e.in_operation("dispatch"))
}

fn dispatch_inner(instances: &ArrayValue, method: DispatchFn, mut args: CallArgs) -> ArrayResult<Value> {
    let ty = &instances.ty;
    if !ty.meta.flags.is_class || ty.meta.ndim() != 1 || !ty.meta.backend.is_jit() {
        return Err(ArrayError::type_error(
            "'instances' parameter must be an instance array.",
        ));
    }
    let Some(domain) = ty.domain.as_deref() else {
        return Err(ArrayError::type_error(format!(
            "The instance array type ('{}') lacks the 'Domain' name attribute.",
            ty.name
        )));
    };
    let mask = extract_mask(&mut args)?;
    let Some(mask) = vector_mask(mask)? else {
        return Ok(Value::None);
    };

    record(
        &ty.backend,
        Some(domain),
        0,
        "dispatch()",
        instances,
        mask.as_ref(),
        args,
        Callables::Method(method),
    )
}

/// Mask of the traced path. `Ok(None)` when every lane is masked off, `Ok(Some(None))`
/// when no mask applies.
fn vector_mask(mask: Option<Value>) -> ArrayResult<Option<Option<ArrayValue>>> {
    match mask {
        None | Some(Value::Bool(true)) => Ok(Some(None)),
        Some(Value::Bool(false)) => Ok(None),
        Some(Value::Array(m)) if m.ty.is_jit_leaf() && m.ty.meta.var_type == VarType::Bool => {
            Ok(Some(Some(m)))
        }
        Some(other) => Err(ArrayError::type_error(format!(
            "unsupported mask type '{}'.",
            other.type_name()
        ))),
    }
}

fn raw_index(array: &ArrayValue) -> VarIndex {
    array.index().map(TraceHandle::index).unwrap_or(0)
}

#[allow(clippy::too_many_arguments)]
fn record(
    backend: &Arc<dyn Backend>,
    domain: Option<&str>,
    n_targets: u32,
    label: &'static str,
    selector: &ArrayValue,
    mask: Option<&ArrayValue>,
    args: CallArgs,
    callables: Callables,
) -> ArrayResult<Value> {
    let _guard = HostLock::acquire();
    let lanes = selector.len()?;

    let state = Box::new(CallState::new(backend, label, args, callables));
    let mut handles = IndexVector::new();
    collect(&state.captured, &mut handles);
    let raw = handles.indices();

    let request = CallRequest {
        domain,
        n_targets,
        label,
        symbolic: false,
        selector: raw_index(selector),
        mask: mask.map(raw_index).unwrap_or(0),
        args: &raw,
    };
    let outcome = backend.call(request, state)?;
    debug!("{label}: recorded over {lanes} lanes and {n_targets} targets, {outcome:?}");
    drop(handles);

    match outcome {
        CallOutcome::Complete { outputs, mut state } => {
            let outputs = IndexVector::steal_raw(backend, &outputs);
            let result = match state.take_result() {
                Some(template) => update(&template, &outputs)?,
                None => Value::None,
            };
            drop(state);
            Ok(result)
        }
        CallOutcome::Deferred { outputs, template } => {
            let outputs = IndexVector::steal_raw(backend, &outputs);
            match template {
                Some(template) => update(&template, &outputs),
                None => Ok(Value::None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::mask::MASK_KEY;
    use crate::structs::descriptor::{ElementType, TypeSpec};
    use crate::structs::meta::{ArrayFlags, ArrayMeta};
    use crate::structs::variants::jit::JitArrayOps;
    use crate::{EagerBackend, JitBackend, TypeRegistry, TypeRef};

    fn scale(ty: &TypeRef, factor: f64, offset: f64) -> SwitchFn {
        let ty = ty.clone();
        Box::new(move |args: &CallArgs| -> ArrayResult<Value> {
            let x = args.args[0].try_array()?;
            let a = construct(&ty, &[Value::Float(factor)], &[])?;
            let b = construct(&ty, &[Value::Float(offset)], &[])?;
            Ok(Value::Array(arithmetic::fma(x, &a, &b)?))
        })
    }

    #[test]
    fn test_scalar_switch() {
        let reg = TypeRegistry::standard(Arc::new(EagerBackend::new())).unwrap();
        let float = reg.get("Float").unwrap();
        let x = construct(&float, &[Value::from(vec![1.0, 2.0])], &[]).unwrap();
        let table = || vec![scale(&float, 2.0, 0.0), scale(&float, 1.0, 10.0)];

        let r = switch(&Value::Int(1), table(), CallArgs::new(vec![Value::Array(x.clone())])).unwrap();
        assert_eq!(r.to_host().unwrap(), Value::from(vec![11.0, 12.0]));

        let masked = CallArgs::new(vec![Value::Array(x.clone()), Value::Bool(false)]);
        assert!(switch(&Value::Int(0), table(), masked).unwrap().is_none());

        let err = switch(&Value::Int(2), table(), CallArgs::new(vec![Value::Array(x)])).unwrap_err();
        assert!(err.to_string().starts_with("switch(): "));
    }

    #[test]
    fn test_vector_switch_merges_groups() {
        let backend = Arc::new(EagerBackend::new());
        let reg = TypeRegistry::standard(backend.clone()).unwrap();
        let float = reg.get("Float").unwrap();
        let uint = reg.get("UInt").unwrap();
        {
            let x = construct(&float, &[Value::from(vec![1.0, 2.0, 3.0, 4.0])], &[]).unwrap();
            let index = construct(&uint, &[Value::from(vec![0, 1, 0, 1])], &[]).unwrap();
            let table = vec![scale(&float, 2.0, 0.0), scale(&float, 1.0, 10.0)];
            let r = switch(&Value::Array(index), table, CallArgs::new(vec![Value::Array(x)])).unwrap();
            assert_eq!(r.to_host().unwrap(), Value::from(vec![2.0, 12.0, 6.0, 14.0]));
        }
        assert_eq!(backend.live_variables(), 0);
    }

    #[test]
    fn test_index_must_be_traced_uint() {
        let reg = TypeRegistry::standard(Arc::new(EagerBackend::new())).unwrap();
        let index = construct(&reg.get("Int").unwrap(), &[Value::Int(0)], &[]).unwrap();
        let err = switch(&Value::Array(index), Vec::new(), CallArgs::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "switch(): the 'index' argument must be a Jit-compiled 1D 32-bit unsigned integer array"
        );
    }

    #[test]
    fn test_dispatch_requires_domain_and_class() {
        let reg = TypeRegistry::standard(Arc::new(EagerBackend::new())).unwrap();
        let uint = reg.get("UInt").unwrap();
        let not_instances = construct(&uint, &[Value::Int(1)], &[]).unwrap();
        let method: DispatchFn =
            Box::new(|_: &InstanceRef, _: &CallArgs| -> ArrayResult<Value> { Ok(Value::None) });
        let err = dispatch(&not_instances, method, CallArgs::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "dispatch(): 'instances' parameter must be an instance array."
        );

        // The instances argument is checked before the mask is looked at
        let method: DispatchFn =
            Box::new(|_: &InstanceRef, _: &CallArgs| -> ArrayResult<Value> { Ok(Value::None) });
        let args = CallArgs::default().with_kwarg(MASK_KEY, Value::Int(3));
        let err = dispatch(&not_instances, method, args).unwrap_err();
        assert_eq!(
            err.to_string(),
            "dispatch(): 'instances' parameter must be an instance array."
        );

        // A class-valued type without an instance domain
        let flags = ArrayFlags {
            is_class: true,
            ..ArrayFlags::default()
        };
        let handles = reg
            .register(TypeSpec {
                name: "Handle".to_string(),
                meta: ArrayMeta::leaf(JitBackend::Llvm, VarType::UInt32).with_flags(flags),
                value: ElementType::Scalar(VarType::UInt32),
                domain: None,
                ops: Box::new(JitArrayOps::new(VarType::UInt32)),
            })
            .unwrap();
        let ids = construct(&handles, &[Value::from(vec![1, 2])], &[]).unwrap();
        let method: DispatchFn =
            Box::new(|_: &InstanceRef, _: &CallArgs| -> ArrayResult<Value> { Ok(Value::None) });
        let err = dispatch(&ids, method, CallArgs::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "dispatch(): The instance array type ('Handle') lacks the 'Domain' name attribute."
        );
        assert!(matches!(err.root(), ArrayError::Type(_)));
    }
}
