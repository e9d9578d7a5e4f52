//! # **JIT Leaf Module** - *1-D Arrays Backed by Traced Variables*
//!
//! The payload of a JIT leaf is a single [`TraceHandle`]. Every operation is
//! forwarded to the backend, and every index the backend hands back is wrapped
//! immediately so it is released on all paths.

use crate::structs::array_value::Payload;
use crate::structs::trace_handle::TraceHandle;
use crate::traits::array_ops::{ArrayOps, Capabilities, check_index};
use crate::{ArrayError, ArrayResult, ArrayValue, HostData, Scalar, TypeRef, Value, VarIndex, VarType};

/// Capability table of a JIT leaf holding `storage` lanes.
#[derive(Debug, Clone, Copy)]
pub struct JitArrayOps {
    storage: VarType,
}

impl JitArrayOps {
    pub fn new(storage: VarType) -> Self {
        JitArrayOps { storage }
    }

    fn wrap(ty: &TypeRef, index: VarIndex) -> ArrayValue {
        ArrayValue::new(ty, Payload::Jit(TraceHandle::steal(&ty.backend, index)))
    }

    fn handle<'a>(&self, array: &'a ArrayValue) -> ArrayResult<&'a TraceHandle> {
        match &array.payload {
            Payload::Jit(h) => Ok(h),
            _ => Err(ArrayError::type_error(format!(
                "{}: payload is not a traced variable.",
                array.ty.name
            ))),
        }
    }
}

impl ArrayOps for JitArrayOps {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            init: true,
            init_const: true,
            init_data: true,
            init_counter: self.storage.is_arithmetic(),
            cast: true,
            data: true,
        }
    }

    fn zero(&self, ty: &TypeRef) -> ArrayResult<ArrayValue> {
        Ok(ArrayValue::new(ty, Payload::Jit(TraceHandle::null())))
    }

    fn init(&self, ty: &TypeRef, n: usize) -> ArrayResult<ArrayValue> {
        if n == 0 {
            return self.zero(ty);
        }
        let index = ty.backend.literal(Scalar::zero(self.storage), n)?;
        Ok(Self::wrap(ty, index))
    }

    fn init_const(&self, ty: &TypeRef, n: usize, value: &Value) -> ArrayResult<ArrayValue> {
        let scalar = Scalar::from_value(value, self.storage)?;
        if n == 0 {
            return self.zero(ty);
        }
        let index = ty.backend.literal(scalar, n)?;
        Ok(Self::wrap(ty, index))
    }

    fn init_data(&self, ty: &TypeRef, data: &HostData) -> ArrayResult<ArrayValue> {
        if data.is_empty() {
            return self.zero(ty);
        }
        let index = ty.backend.from_host(&data.cast(self.storage))?;
        Ok(Self::wrap(ty, index))
    }

    fn init_counter(&self, ty: &TypeRef, n: usize) -> ArrayResult<ArrayValue> {
        if n == 0 {
            return self.zero(ty);
        }
        let counter = TraceHandle::steal(&ty.backend, ty.backend.counter(n)?);
        if self.storage == VarType::UInt32 {
            return Ok(ArrayValue::new(ty, Payload::Jit(counter)));
        }
        let index = ty.backend.cast(counter.index(), self.storage)?;
        Ok(Self::wrap(ty, index))
    }

    fn cast(&self, ty: &TypeRef, src: &ArrayValue) -> ArrayResult<ArrayValue> {
        let h = self.handle(src)?;
        if h.is_null() {
            return self.zero(ty);
        }
        let index = ty.backend.cast(h.index(), self.storage)?;
        Ok(Self::wrap(ty, index))
    }

    fn len(&self, array: &ArrayValue) -> ArrayResult<usize> {
        let h = self.handle(array)?;
        if h.is_null() {
            return Ok(0);
        }
        array.ty.backend.var_len(h.index())
    }

    fn get(&self, array: &ArrayValue, i: usize) -> ArrayResult<Value> {
        check_index(i, self.len(array)?)?;
        let h = self.handle(array)?;
        array.ty.backend.read(h.index(), i)?.to_value()
    }

    fn set(&self, array: &mut ArrayValue, i: usize, value: &Value) -> ArrayResult<()> {
        check_index(i, self.len(array)?)?;
        let scalar = match value {
            Value::Array(a) if a.ty.is_jit_leaf() && a.len()? == 1 => {
                a.get(0).and_then(|v| Scalar::from_value(&v, self.storage))?
            }
            other => Scalar::from_value(other, self.storage)?,
        };
        let index = self.handle(array)?.index();
        let written = array.ty.backend.write(index, i, scalar)?;
        let handle = TraceHandle::steal(&array.ty.backend, written);
        // the old handle drops here, after the new reference is held
        array.payload = Payload::Jit(handle);
        Ok(())
    }

    fn data(&self, array: &ArrayValue) -> ArrayResult<Option<HostData>> {
        let h = self.handle(array)?;
        if h.is_null() {
            return Ok(Some(HostData::with_capacity(self.storage, 0)));
        }
        array.ty.backend.to_host(h.index()).map(Some)
    }

    fn index<'a>(&self, array: &'a ArrayValue) -> Option<&'a TraceHandle> {
        self.handle(array).ok()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{EagerBackend, TypeRegistry, construct};

    use super::*;

    #[test]
    fn test_null_payload_is_empty() {
        let reg = TypeRegistry::standard(Arc::new(EagerBackend::new())).unwrap();
        let int = reg.get("Int").unwrap();
        let z = int.zero().unwrap();
        assert!(z.index().unwrap().is_null());
        assert_eq!(z.len().unwrap(), 0);
        assert_eq!(z.to_host().unwrap(), Value::List(Vec::new()));
        assert!(z.get(0).is_err());
    }

    #[test]
    fn test_set_keeps_other_copies_intact() {
        let backend = Arc::new(EagerBackend::new());
        let reg = TypeRegistry::standard(backend.clone()).unwrap();
        let int = reg.get("Int").unwrap();
        {
            let a = construct(&int, &[Value::from(vec![1, 2, 3])], &[]).unwrap();
            let mut b = a.clone();
            b.set(1, &Value::Int(9)).unwrap();
            assert_eq!(a.to_host().unwrap(), Value::from(vec![1, 2, 3]));
            assert_eq!(b.to_host().unwrap(), Value::from(vec![1, 9, 3]));
        }
        assert_eq!(backend.live_variables(), 0);
    }

    #[test]
    fn test_counter_in_float_storage() {
        let reg = TypeRegistry::standard(Arc::new(EagerBackend::new())).unwrap();
        let float = reg.get("Float").unwrap();
        let c = float.init_counter(3).unwrap();
        assert_eq!(c.to_host().unwrap(), Value::from(vec![0.0, 1.0, 2.0]));
        assert!(!reg.get("Bool").unwrap().capabilities().init_counter);
    }
}
