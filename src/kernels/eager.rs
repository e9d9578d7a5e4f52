//! # **Eager Backend** - *Host-Resident Reference Backend*
//!
//! `EagerBackend` implements [`Backend`] by evaluating every primitive immediately on
//! host buffers. It keeps the same reference counting discipline a tracing engine
//! would, so leaks and double releases show up in [`EagerBackend::live_variables`].
//!
//! ## Calls
//! `call` runs over the widest of the selector, mask and arguments, broadcasting
//! operands of size 1. It partitions lanes by selector id in ascending id order, gathers every
//! per-lane argument down to the lanes of each group, invokes the continuation once
//! per group without holding any internal lock, and scatters the group outputs into
//! zero-filled result buffers. In symbolic mode the continuation is retained and the
//! call is reported as deferred until [`EagerBackend::finalize_calls`].

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, trace};

use crate::enums::var_type::JitBackend;
use crate::traits::backend::{Backend, CallContinuation, CallOutcome, CallRequest, CallTarget};
use crate::{ArrayError, ArrayResult, HostData, InstanceRef, Scalar, VarIndex, VarType};

struct Variable {
    data: HostData,
    refs: usize,
}

#[derive(Default)]
struct VarStore {
    vars: HashMap<VarIndex, Variable>,
    next: VarIndex,
}

/// Host-resident [`Backend`] that evaluates eagerly.
pub struct EagerBackend {
    kind: JitBackend,
    store: Mutex<VarStore>,
    instances: Mutex<HashMap<String, Vec<InstanceRef>>>,
    symbolic: AtomicBool,
    pending: Mutex<Vec<Box<dyn CallContinuation>>>,
}

/// Releases a list of owned indices on drop.
struct VarGuard<'a> {
    backend: &'a EagerBackend,
    indices: Vec<VarIndex>,
}

impl Drop for VarGuard<'_> {
    fn drop(&mut self) {
        for &i in &self.indices {
            self.backend.dec_ref(i);
        }
    }
}

fn unknown(index: VarIndex) -> ArrayError {
    ArrayError::backend(format!("unknown variable r{index}."))
}

fn lookup(store: &VarStore, index: VarIndex) -> ArrayResult<&HostData> {
    store.vars.get(&index).map(|v| &v.data).ok_or_else(|| unknown(index))
}

impl EagerBackend {
    /// Backend reporting itself as [`JitBackend::Llvm`].
    pub fn new() -> Self {
        Self::with_kind(JitBackend::Llvm)
    }

    pub fn with_kind(kind: JitBackend) -> Self {
        EagerBackend {
            kind,
            store: Mutex::new(VarStore::default()),
            instances: Mutex::new(HashMap::new()),
            symbolic: AtomicBool::new(false),
            pending: Mutex::new(Vec::new()),
        }
    }

    fn store(&self) -> MutexGuard<'_, VarStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert(&self, data: HostData) -> VarIndex {
        let mut store = self.store();
        store.next += 1;
        let index = store.next;
        store.vars.insert(index, Variable { data, refs: 1 });
        index
    }

    fn with_var<R>(&self, index: VarIndex, f: impl FnOnce(&HostData) -> R) -> ArrayResult<R> {
        let store = self.store();
        lookup(&store, index).map(f)
    }

    /// Number of variables currently alive.
    pub fn live_variables(&self) -> usize {
        self.store().vars.len()
    }

    /// Reference count of `index`, 0 when it does not exist.
    pub fn ref_count(&self, index: VarIndex) -> usize {
        self.store().vars.get(&index).map_or(0, |v| v.refs)
    }

    /// When set, recorded calls are deferred until [`EagerBackend::finalize_calls`].
    pub fn set_symbolic(&self, symbolic: bool) {
        self.symbolic.store(symbolic, Ordering::SeqCst);
    }

    pub fn is_symbolic(&self) -> bool {
        self.symbolic.load(Ordering::SeqCst)
    }

    /// Number of deferred calls still holding their state.
    pub fn pending_calls(&self) -> usize {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Releases the state of every deferred call. Returns how many were released.
    pub fn finalize_calls(&self) -> usize {
        let drained: Vec<_> = std::mem::take(
            &mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner),
        );
        let n = drained.len();
        debug!("finalizing {n} deferred calls");
        drop(drained);
        n
    }

    /// Restricts every argument to `lanes`. Single-lane and null arguments pass through.
    fn narrow(&self, args: &[VarIndex], lanes: &[usize]) -> ArrayResult<Vec<VarIndex>> {
        let mut out = VarGuard {
            backend: self,
            indices: Vec::with_capacity(args.len()),
        };
        for &arg in args {
            if arg == 0 {
                out.indices.push(0);
                continue;
            }
            if self.var_len(arg)? == 1 {
                self.inc_ref(arg);
                out.indices.push(arg);
            } else {
                let data = self.with_var(arg, |d| d.gather(lanes))??;
                out.indices.push(self.insert(data));
            }
        }
        Ok(std::mem::take(&mut out.indices))
    }

    fn resolve(&self, request: &CallRequest<'_>, id: u32) -> ArrayResult<CallTarget> {
        match request.domain {
            Some(domain) => self
                .lookup_instance(domain, id)
                .map(CallTarget::Instance)
                .ok_or_else(|| {
                    ArrayError::backend(format!("no instance {id} in domain '{domain}'."))
                }),
            None => Ok(CallTarget::Index(id - 1)),
        }
    }

    /// Lanes per selector id, skipping id 0 and masked lanes.
    ///
    /// The call width is the largest of the selector, mask and argument sizes. Operands
    /// of size 1 broadcast across it, any other size must match it.
    fn partition(&self, request: &CallRequest<'_>) -> ArrayResult<(usize, BTreeMap<u32, Vec<usize>>)> {
        let mut groups: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
        if request.selector == 0 {
            return Ok((0, groups));
        }
        let selector = self.to_host(request.selector)?.cast(VarType::UInt32);
        let ids = selector.as_slice::<u32>().unwrap_or(&[]);
        if ids.is_empty() {
            return Ok((0, groups));
        }

        let mask = match request.mask {
            0 => None,
            m => Some(self.to_host(m)?.cast(VarType::Bool)),
        };
        let active = mask.as_ref().and_then(|m| m.as_slice::<bool>());

        let mut sizes = vec![ids.len()];
        sizes.extend(active.map(<[bool]>::len));
        for &arg in request.args.iter().filter(|&&a| a != 0) {
            sizes.push(self.var_len(arg)?);
        }
        let width = sizes.iter().copied().max().unwrap_or(0);
        if let Some(&bad) = sizes.iter().find(|&&n| n != 1 && n != width) {
            return Err(ArrayError::value_error(format!(
                "operand of size {bad} does not match the call width {width}."
            )));
        }

        for lane in 0..width {
            let id = ids[if ids.len() == 1 { 0 } else { lane }];
            let on = active.is_none_or(|a| a[if a.len() == 1 { 0 } else { lane }]);
            if id == 0 || !on {
                continue;
            }
            if request.domain.is_none() && id > request.n_targets {
                return Err(ArrayError::value_error(format!(
                    "index {} is out of range (there are {} callables).",
                    id - 1,
                    request.n_targets
                )));
            }
            groups.entry(id).or_default().push(lane);
        }
        Ok((width, groups))
    }
}

impl Default for EagerBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for EagerBackend {
    fn kind(&self) -> JitBackend {
        self.kind
    }

    fn inc_ref(&self, index: VarIndex) {
        if let Some(v) = self.store().vars.get_mut(&index) {
            v.refs += 1;
        }
    }

    fn dec_ref(&self, index: VarIndex) {
        let mut store = self.store();
        if let Some(v) = store.vars.get_mut(&index) {
            v.refs -= 1;
            if v.refs == 0 {
                store.vars.remove(&index);
            }
        }
    }

    fn var_type(&self, index: VarIndex) -> ArrayResult<VarType> {
        self.with_var(index, HostData::var_type)
    }

    fn var_len(&self, index: VarIndex) -> ArrayResult<usize> {
        self.with_var(index, HostData::len)
    }

    fn literal(&self, value: Scalar, n: usize) -> ArrayResult<VarIndex> {
        Ok(self.insert(HostData::literal(value, n)))
    }

    fn counter(&self, n: usize) -> ArrayResult<VarIndex> {
        let n = u32::try_from(n)
            .map_err(|_| ArrayError::backend(format!("counter of {n} lanes is too large.")))?;
        Ok(self.insert(HostData::counter(n)))
    }

    fn from_host(&self, data: &HostData) -> ArrayResult<VarIndex> {
        Ok(self.insert(data.clone()))
    }

    fn to_host(&self, index: VarIndex) -> ArrayResult<HostData> {
        self.with_var(index, HostData::clone)
    }

    fn read(&self, index: VarIndex, lane: usize) -> ArrayResult<Scalar> {
        self.with_var(index, |d| {
            d.get(lane).ok_or(ArrayError::IndexOutOfBounds {
                index: lane as i64,
                size: d.len(),
            })
        })?
    }

    fn write(&self, index: VarIndex, lane: usize, value: Scalar) -> ArrayResult<VarIndex> {
        let mut store = self.store();
        let var = store.vars.get_mut(&index).ok_or_else(|| unknown(index))?;
        let value = value.cast(var.data.var_type());
        if var.refs == 1 {
            var.data.set(lane, value)?;
            var.refs += 1;
            return Ok(index);
        }
        let mut data = var.data.clone();
        data.set(lane, value)?;
        drop(store);
        trace!("write to shared r{index}: copied");
        Ok(self.insert(data))
    }

    fn cast(&self, index: VarIndex, target: VarType) -> ArrayResult<VarIndex> {
        let data = self.with_var(index, |d| d.cast(target))?;
        Ok(self.insert(data))
    }

    fn fma(&self, a: VarIndex, b: VarIndex, c: VarIndex) -> ArrayResult<VarIndex> {
        let data = {
            let store = self.store();
            HostData::fma(lookup(&store, a)?, lookup(&store, b)?, lookup(&store, c)?)?
        };
        Ok(self.insert(data))
    }

    fn register_instance(&self, domain: &str, instance: InstanceRef) -> u32 {
        let mut instances = self.instances.lock().unwrap_or_else(PoisonError::into_inner);
        let list = instances.entry(domain.to_string()).or_default();
        list.push(instance);
        list.len() as u32
    }

    fn lookup_instance(&self, domain: &str, id: u32) -> Option<InstanceRef> {
        let instances = self.instances.lock().unwrap_or_else(PoisonError::into_inner);
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        instances.get(domain)?.get(index).cloned()
    }

    fn call(
        &self,
        request: CallRequest<'_>,
        mut state: Box<dyn CallContinuation>,
    ) -> ArrayResult<CallOutcome> {
        let (width, groups) = self.partition(&request)?;
        trace!("{}: {} lanes in {} groups", request.label, width, groups.len());

        let mut merged: Vec<Option<HostData>> = Vec::new();
        for (position, (&id, lanes)) in groups.iter().enumerate() {
            let target = self.resolve(&request, id)?;
            let narrowed = VarGuard {
                backend: self,
                indices: self.narrow(request.args, lanes)?,
            };
            let results = VarGuard {
                backend: self,
                indices: state.invoke(target, &narrowed.indices)?,
            };
            drop(narrowed);

            if position == 0 {
                merged = vec![None; results.indices.len()];
            } else if merged.len() != results.indices.len() {
                return Err(ArrayError::Incompatible(format!(
                    "groups produced {} and {} outputs.",
                    merged.len(),
                    results.indices.len()
                )));
            }
            for (slot, &index) in merged.iter_mut().zip(&results.indices) {
                if index == 0 {
                    continue;
                }
                let src = self.to_host(index)?;
                let buf = slot.get_or_insert_with(|| {
                    HostData::literal(Scalar::zero(src.var_type()), width)
                });
                buf.scatter(lanes, &src)?;
            }
        }

        let outputs = merged
            .into_iter()
            .map(|slot| slot.map_or(0, |data| self.insert(data)))
            .collect();

        if self.is_symbolic() {
            let template = state.result_template();
            self.pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(state);
            return Ok(CallOutcome::Deferred { outputs, template });
        }
        Ok(CallOutcome::Complete { outputs, state })
    }
}
