//! # **Descriptor Module** - *Registered Array Types*
//!
//! A `TypeDescriptor` is the runtime identity of an array type: its name, its
//! [`ArrayMeta`], the type of its elements, and the [`ArrayOps`] table that
//! implements it. Descriptors are immutable once registered and are shared as
//! [`TypeRef`] by every value of the type.

use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Weak};

use crate::enums::var_type::{JitBackend, VarType};
use crate::structs::meta::ArrayMeta;
use crate::structs::registry::TypeRegistry;
use crate::traits::array_ops::{ArrayOps, Capabilities};
use crate::traits::backend::Backend;
use crate::{ArrayError, ArrayResult, ArrayValue, HostData, TypeRef, Value};

/// Type of the entries obtained by indexing an array's outer axis.
#[derive(Clone)]
pub enum ElementType {
    /// Host scalars of the given kind, e.g. the lanes of `Float` or of `ScalarArray3f`.
    Scalar(VarType),
    /// Nested arrays, e.g. the `Float` rows of `Array3f`.
    Array(TypeRef),
}

impl Debug for ElementType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ElementType::Scalar(vt) => write!(f, "Scalar({vt})"),
            ElementType::Array(t) => write!(f, "Array({})", t.name),
        }
    }
}

/// Everything needed to register a type.
pub struct TypeSpec {
    pub name: String,
    pub meta: ArrayMeta,
    pub value: ElementType,
    /// Instance domain of class-valued arrays.
    pub domain: Option<String>,
    pub ops: Box<dyn ArrayOps>,
}

/// # TypeDescriptor
///
/// Registered array type.
///
/// ## Invariants
/// - `meta.ndim() == meta.shape.len() >= 1`.
/// - For `ElementType::Array(t)`, `t.meta.shape == meta.shape[1..]`.
pub struct TypeDescriptor {
    pub name: String,
    pub meta: ArrayMeta,
    pub value: ElementType,
    pub domain: Option<String>,
    pub(crate) ops: Box<dyn ArrayOps>,
    pub(crate) backend: Arc<dyn Backend>,
    pub(crate) registry: Weak<TypeRegistry>,
}

impl TypeDescriptor {
    #[inline]
    pub fn capabilities(&self) -> Capabilities {
        self.ops.capabilities()
    }

    #[inline]
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// True for 1-D types whose lanes are backend variables.
    #[inline]
    pub fn is_jit_leaf(&self) -> bool {
        self.meta.backend.is_jit() && self.meta.ndim() == 1 && !self.meta.flags.is_tensor
    }

    #[inline]
    pub fn is_tensor(&self) -> bool {
        self.meta.flags.is_tensor
    }

    /// Element array type, `None` when the elements are host scalars.
    #[inline]
    pub fn value_type(&self) -> Option<&TypeRef> {
        match &self.value {
            ElementType::Array(t) => Some(t),
            ElementType::Scalar(_) => None,
        }
    }

    /// True when `other` is this type's element type, or its element type's, and so on.
    pub fn value_chain_contains(&self, other: &TypeDescriptor) -> bool {
        let mut cur = self.value_type();
        while let Some(t) = cur {
            if std::ptr::eq(Arc::as_ptr(t), other) {
                return true;
            }
            cur = t.value_type();
        }
        false
    }

    /// Type of the same family with `UInt32` elements, used for counters.
    pub fn counter_type(&self) -> ArrayResult<TypeRef> {
        let registry = self
            .registry
            .upgrade()
            .ok_or_else(|| ArrayError::backend("type registry has been dropped."))?;
        registry
            .lookup(&self.meta.with_type(VarType::UInt32))
            .ok_or_else(|| {
                ArrayError::type_error(format!("{}: no matching UInt32 counter type.", self.name))
            })
    }

    /// Type of the same family with a different element kind.
    pub fn with_var_type(&self, vt: VarType) -> Option<TypeRef> {
        self.registry.upgrade()?.lookup(&self.meta.with_type(vt))
    }

    /// Host-backend counterpart of this type, if registered.
    pub fn host_type(&self) -> Option<TypeRef> {
        self.registry
            .upgrade()?
            .lookup(&self.meta.with_backend(JitBackend::Host))
    }

    pub fn zero(self: &Arc<Self>) -> ArrayResult<ArrayValue> {
        self.ops.zero(self)
    }

    pub fn init(self: &Arc<Self>, n: usize) -> ArrayResult<ArrayValue> {
        self.ops.init(self, n)
    }

    pub fn init_const(self: &Arc<Self>, n: usize, value: &Value) -> ArrayResult<ArrayValue> {
        self.ops.init_const(self, n, value)
    }

    pub fn init_data(self: &Arc<Self>, data: &HostData) -> ArrayResult<ArrayValue> {
        self.ops.init_data(self, data)
    }

    pub fn init_counter(self: &Arc<Self>, n: usize) -> ArrayResult<ArrayValue> {
        self.ops.init_counter(self, n)
    }

    pub fn cast(self: &Arc<Self>, src: &ArrayValue) -> ArrayResult<ArrayValue> {
        self.ops.cast(self, src)
    }
}

impl Debug for TypeDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("meta", &self.meta)
            .field("value", &self.value)
            .field("domain", &self.domain)
            .field("capabilities", &self.capabilities())
            .finish()
    }
}
