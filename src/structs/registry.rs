//! # **Registry Module** - *Type Lookup per Backend*
//!
//! `TypeRegistry` owns every [`TypeDescriptor`] of one backend and resolves types by
//! name and by [`ArrayMeta`]. Meta lookup is what lets generic code move between
//! members of a family, e.g. from `Float` to its `UInt` counter type.

use std::sync::{Arc, PoisonError, RwLock};

use log::debug;

use crate::enums::var_type::{JitBackend, VarType};
use crate::structs::descriptor::{ElementType, TypeDescriptor, TypeSpec};
use crate::structs::meta::{ArrayFlags, ArrayMeta, Extent};
use crate::structs::variants::composite::StaticArrayOps;
use crate::structs::variants::host::HostArrayOps;
use crate::structs::variants::jit::JitArrayOps;
#[cfg(feature = "tensor")]
use crate::structs::variants::tensor::TensorOps;
use crate::traits::backend::Backend;
use crate::{ArrayError, ArrayResult, TypeRef};

/// Names of the standard leaf types, in [`VarType::ALL`] order.
const LEAF_NAMES: [&str; 7] = ["Bool", "Int", "UInt", "Int64", "UInt64", "Float", "Float64"];

/// # TypeRegistry
///
/// Registered types of one backend.
///
/// ## Usage
/// ```ignore
/// let backend: Arc<dyn Backend> = Arc::new(EagerBackend::new());
/// let registry = TypeRegistry::standard(backend)?;
/// let float = registry.get("Float").unwrap();
/// ```
pub struct TypeRegistry {
    backend: Arc<dyn Backend>,
    types: RwLock<Vec<TypeRef>>,
}

impl TypeRegistry {
    /// Empty registry.
    pub fn new(backend: Arc<dyn Backend>) -> Arc<Self> {
        Arc::new(TypeRegistry {
            backend,
            types: RwLock::new(Vec::new()),
        })
    }

    #[inline]
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Adds a type. Names are unique within a registry.
    pub fn register(self: &Arc<Self>, spec: TypeSpec) -> ArrayResult<TypeRef> {
        if spec.meta.ndim() == 0 {
            return Err(ArrayError::value_error(format!(
                "{}: array types need at least one axis.",
                spec.name
            )));
        }
        let mut types = self.types.write().unwrap_or_else(PoisonError::into_inner);
        if types.iter().any(|t| t.name == spec.name) {
            return Err(ArrayError::value_error(format!(
                "type '{}' is already registered.",
                spec.name
            )));
        }
        let ty = Arc::new(TypeDescriptor {
            name: spec.name,
            meta: spec.meta,
            value: spec.value,
            domain: spec.domain,
            ops: spec.ops,
            backend: self.backend.clone(),
            registry: Arc::downgrade(self),
        });
        debug!("registered type {} as {}", ty.name, ty.meta);
        types.push(ty.clone());
        Ok(ty)
    }

    pub fn get(&self, name: &str) -> Option<TypeRef> {
        let types = self.types.read().unwrap_or_else(PoisonError::into_inner);
        types.iter().find(|t| t.name == name).cloned()
    }

    /// First registered type with exactly this meta.
    pub fn lookup(&self, meta: &ArrayMeta) -> Option<TypeRef> {
        let types = self.types.read().unwrap_or_else(PoisonError::into_inner);
        types.iter().find(|t| &t.meta == meta).cloned()
    }

    pub fn types(&self) -> Vec<TypeRef> {
        self.types.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Registers a 1-D dynamic leaf of `vt` on the registry's backend, or on the host.
    pub fn register_leaf(
        self: &Arc<Self>,
        name: &str,
        vt: VarType,
        on_host: bool,
    ) -> ArrayResult<TypeRef> {
        let backend = if on_host { JitBackend::Host } else { self.backend.kind() };
        let ops: Box<dyn crate::traits::array_ops::ArrayOps> = if on_host {
            Box::new(HostArrayOps::new(vt))
        } else {
            Box::new(JitArrayOps::new(vt))
        };
        self.register(TypeSpec {
            name: name.to_string(),
            meta: ArrayMeta::leaf(backend, vt),
            value: ElementType::Scalar(vt),
            domain: None,
            ops,
        })
    }

    /// Registers a composite with outer axis `outer` over `value`.
    pub fn register_nested(
        self: &Arc<Self>,
        name: &str,
        outer: Extent,
        value: &TypeRef,
        flags: ArrayFlags,
    ) -> ArrayResult<TypeRef> {
        self.register(TypeSpec {
            name: name.to_string(),
            meta: ArrayMeta::nested(outer, &value.meta).with_flags(flags),
            value: ElementType::Array(value.clone()),
            domain: None,
            ops: Box::new(StaticArrayOps),
        })
    }

    /// Registers a fixed-size host array of plain scalars, e.g. `ScalarArray3f`.
    pub fn register_scalar_array(
        self: &Arc<Self>,
        name: &str,
        vt: VarType,
        n: usize,
    ) -> ArrayResult<TypeRef> {
        self.register(TypeSpec {
            name: name.to_string(),
            meta: ArrayMeta {
                backend: JitBackend::Host,
                var_type: vt,
                shape: vec![Extent::Fixed(n)],
                flags: ArrayFlags::default(),
            },
            value: ElementType::Scalar(vt),
            domain: None,
            ops: Box::new(StaticArrayOps),
        })
    }

    /// Registers a class-valued array whose lanes are instance ids of `domain`.
    pub fn register_instance_array(
        self: &Arc<Self>,
        name: &str,
        domain: &str,
    ) -> ArrayResult<TypeRef> {
        let flags = ArrayFlags {
            is_class: true,
            ..ArrayFlags::default()
        };
        self.register(TypeSpec {
            name: name.to_string(),
            meta: ArrayMeta::leaf(self.backend.kind(), VarType::UInt32).with_flags(flags),
            value: ElementType::Scalar(VarType::UInt32),
            domain: Some(domain.to_string()),
            ops: Box::new(JitArrayOps::new(VarType::UInt32)),
        })
    }

    /// Registers a tensor type storing its entries in a flat `storage` array.
    #[cfg(feature = "tensor")]
    pub fn register_tensor(self: &Arc<Self>, name: &str, storage: &TypeRef) -> ArrayResult<TypeRef> {
        let flags = ArrayFlags {
            is_tensor: true,
            ..ArrayFlags::default()
        };
        self.register(TypeSpec {
            name: name.to_string(),
            meta: storage.meta.clone().with_flags(flags),
            value: ElementType::Array(storage.clone()),
            domain: None,
            ops: Box::new(TensorOps),
        })
    }

    /// Registry holding the standard type family of `backend`.
    ///
    /// - JIT leaves `Bool`, `Int`, `UInt`, `Int64`, `UInt64`, `Float`, `Float64`
    /// - host leaves `HostBool` .. `HostFloat64`
    /// - `Array2f`, `Array3f`, `Array4f`, `Array3i`, `Array3u`, `Array3b`
    /// - host scalar arrays `ScalarArray3f`, `ScalarArray3i`
    /// - `Complex2f`, `Quaternion4f`, `Matrix2f`, `Matrix3f`, `Matrix4f`
    /// - `ArrayXf` (dynamic outer axis over `Float`)
    /// - `TensorXf` with the `tensor` feature
    pub fn standard(backend: Arc<dyn Backend>) -> ArrayResult<Arc<Self>> {
        let reg = TypeRegistry::new(backend);
        let mut jit = Vec::with_capacity(LEAF_NAMES.len());
        for (vt, name) in VarType::ALL.into_iter().zip(LEAF_NAMES) {
            jit.push(reg.register_leaf(name, vt, false)?);
            reg.register_leaf(&format!("Host{name}"), vt, true)?;
        }
        let [bool_t, int_t, uint_t, _, _, float_t, _] = &jit[..] else {
            return Err(ArrayError::value_error("standard leaf registration is incomplete."));
        };

        let plain = ArrayFlags::default();
        let mut rows = Vec::with_capacity(3);
        for n in 2..=4 {
            rows.push(reg.register_nested(&format!("Array{n}f"), Extent::Fixed(n), float_t, plain)?);
        }
        reg.register_nested("Array3i", Extent::Fixed(3), int_t, plain)?;
        reg.register_nested("Array3u", Extent::Fixed(3), uint_t, plain)?;
        reg.register_nested("Array3b", Extent::Fixed(3), bool_t, plain)?;
        reg.register_scalar_array("ScalarArray3f", VarType::Float32, 3)?;
        reg.register_scalar_array("ScalarArray3i", VarType::Int32, 3)?;

        let complex = ArrayFlags {
            is_complex: true,
            ..plain
        };
        reg.register_nested("Complex2f", Extent::Fixed(2), float_t, complex)?;
        let quaternion = ArrayFlags {
            is_quaternion: true,
            ..plain
        };
        reg.register_nested("Quaternion4f", Extent::Fixed(4), float_t, quaternion)?;
        let matrix = ArrayFlags {
            is_matrix: true,
            ..plain
        };
        for (row, n) in rows.iter().zip(2..=4) {
            reg.register_nested(&format!("Matrix{n}f"), Extent::Fixed(n), row, matrix)?;
        }
        reg.register_nested("ArrayXf", Extent::Dynamic, float_t, plain)?;

        #[cfg(feature = "tensor")]
        reg.register_tensor("TensorXf", float_t)?;

        Ok(reg)
    }
}
