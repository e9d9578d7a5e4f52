//! # **Backend Trait Module** - *Tracing Engine Interface*
//!
//! The tracing engine that owns variables is external to this crate. `Backend`
//! names the handful of primitives the construction and call layers consume, so any
//! engine can sit underneath. [`crate::EagerBackend`] is the reference implementation.
//!
//! ## Ownership
//! Variables are reference counted by the backend. Every `VarIndex` returned from a
//! method of this trait is a *new* reference owned by the caller, who must release it
//! with [`Backend::dec_ref`], normally by wrapping it with [`crate::TraceHandle::steal`].
//! Index `0` is the null variable and is never counted.

use std::fmt::{Debug, Formatter};

use crate::enums::var_type::{JitBackend, VarType};
use crate::{ArrayResult, HostData, InstanceRef, Scalar, Value, VarIndex};

/// Interface to a tracing engine.
pub trait Backend: Send + Sync {
    /// Which engine this is.
    fn kind(&self) -> JitBackend;

    fn inc_ref(&self, index: VarIndex);

    fn dec_ref(&self, index: VarIndex);

    fn var_type(&self, index: VarIndex) -> ArrayResult<VarType>;

    fn var_len(&self, index: VarIndex) -> ArrayResult<usize>;

    /// Variable of `n` lanes all equal to `value`.
    fn literal(&self, value: Scalar, n: usize) -> ArrayResult<VarIndex>;

    /// `UInt32` variable `[0, 1, .., n - 1]`.
    fn counter(&self, n: usize) -> ArrayResult<VarIndex>;

    /// Bulk import of a host buffer.
    fn from_host(&self, data: &HostData) -> ArrayResult<VarIndex>;

    /// Evaluates a variable and copies it to the host.
    fn to_host(&self, index: VarIndex) -> ArrayResult<HostData>;

    fn read(&self, index: VarIndex, lane: usize) -> ArrayResult<Scalar>;

    /// Writes one lane. Returns the variable now holding the result, which may be
    /// `index` itself when it was not shared.
    fn write(&self, index: VarIndex, lane: usize, value: Scalar) -> ArrayResult<VarIndex>;

    fn cast(&self, index: VarIndex, target: VarType) -> ArrayResult<VarIndex>;

    /// `a * b + c`. Operands of a single lane broadcast.
    fn fma(&self, a: VarIndex, b: VarIndex, c: VarIndex) -> ArrayResult<VarIndex>;

    /// Adds an instance to `domain` and returns its id. Ids start at 1; 0 means "no instance".
    fn register_instance(&self, domain: &str, instance: InstanceRef) -> u32;

    fn lookup_instance(&self, domain: &str, id: u32) -> Option<InstanceRef>;

    /// Records a polymorphic call.
    ///
    /// The backend partitions the lanes of `request.selector` by target and calls
    /// `state.invoke` once per selected target with the arguments restricted to that
    /// group. It then either finishes the call and returns the state
    /// ([`CallOutcome::Complete`]), or keeps the state until the call is finalised
    /// later ([`CallOutcome::Deferred`]).
    fn call(
        &self,
        request: CallRequest<'_>,
        state: Box<dyn CallContinuation>,
    ) -> ArrayResult<CallOutcome>;
}

/// Parameters of one recorded call.
#[derive(Debug, Clone)]
pub struct CallRequest<'a> {
    /// Instance domain for `dispatch`, `None` for `switch`.
    pub domain: Option<&'a str>,
    /// Number of callables for `switch`, 0 for `dispatch`.
    pub n_targets: u32,
    pub label: &'static str,
    pub symbolic: bool,
    /// `UInt32` variable of per-lane target ids. Id 0 marks an inactive lane.
    pub selector: VarIndex,
    /// `Bool` variable, or 0 when all lanes are active.
    pub mask: VarIndex,
    /// Flattened argument handles, borrowed for the duration of the call.
    pub args: &'a [VarIndex],
}

/// What a group invocation is dispatched to.
#[derive(Clone)]
pub enum CallTarget {
    /// 0-based position in the callable table.
    Index(u32),
    Instance(InstanceRef),
}

impl Debug for CallTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CallTarget::Index(i) => write!(f, "Index({i})"),
            CallTarget::Instance(_) => f.write_str("Instance(..)"),
        }
    }
}

/// Captured state of a recorded call, driven by the backend.
///
/// Single owner at all times. Dropping it releases every captured argument, the
/// callables and the last group result.
pub trait CallContinuation: Send {
    /// Runs one group. `args` are borrowed handles in collection order; the returned
    /// handles are new references owned by the backend.
    fn invoke(&mut self, target: CallTarget, args: &[VarIndex]) -> ArrayResult<Vec<VarIndex>>;

    /// Structure of the value produced by the groups so far, used to rebuild the result.
    fn result_template(&self) -> Option<Value>;

    fn take_result(&mut self) -> Option<Value>;
}

/// How a recorded call ended.
pub enum CallOutcome {
    /// The call finished; the caller owns `outputs` and destroys `state`.
    Complete {
        outputs: Vec<VarIndex>,
        state: Box<dyn CallContinuation>,
    },
    /// The backend keeps the state until it finalises the call.
    Deferred {
        outputs: Vec<VarIndex>,
        template: Option<Value>,
    },
}

impl Debug for CallOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CallOutcome::Complete { outputs, .. } => write!(f, "Complete({outputs:?})"),
            CallOutcome::Deferred { outputs, .. } => write!(f, "Deferred({outputs:?})"),
        }
    }
}
