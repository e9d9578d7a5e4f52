//! Copyright © 2025 Peter Garfield Bower. All rights reserved.
//!
//! # **tracearray** - *Construction and Per-Lane Dispatch for Traced Arrays*
//!
//! Front end of an array runtime whose values are handles into an external
//! tracing engine rather than concrete numbers.
//!
//! ## Overview
//! - **Types**: every array type is a registered [`TypeDescriptor`] with a shape,
//!   an element kind, structural flags and an [`traits::array_ops::ArrayOps`]
//!   capability table. [`TypeRegistry::standard`] registers the usual family:
//!   `Float`, `Array3f`, `Matrix4f`, `ArrayXf`, `TensorXf`, ...
//! - **Construction**: [`construct`] turns scalars, nested lists, iterables and other
//!   arrays into a value of the requested type by copy, cast, bulk import, sequence
//!   import or broadcast.
//! - **Generators**: [`full`], [`zeros`], [`ones`], [`empty`], [`arange`], [`linspace`].
//! - **Calls**: [`switch`] and [`dispatch`] run callables once per distinct lane
//!   target and merge the results, with [`extract_mask`] handling the `active` mask.
//! - **Backend**: the tracing engine sits behind [`traits::backend::Backend`];
//!   [`EagerBackend`] is a host-resident reference implementation.
//!
//! ## Features
//! - `tensor` *(default)*: tensor types and [`construct_tensor`].
//! - `parallel_proc`: converts long host sequences into staging buffers on the rayon pool.

pub mod enums {
    pub mod dtype;
    pub mod error;
    pub mod host_data;
    pub mod scalar;
    pub mod value;
    pub mod var_type;
}

pub mod structs {
    pub mod variants {
        pub mod composite;
        pub mod host;
        pub mod jit;
        #[cfg(feature = "tensor")]
        pub mod tensor;
    }
    pub mod array_value;
    pub mod descriptor;
    pub mod host_lock;
    pub mod meta;
    pub mod record;
    pub mod registry;
    pub mod trace_handle;
}

pub mod kernels {
    pub mod arithmetic;
    pub mod call;
    pub mod construct;
    pub mod eager;
    pub mod generators;
    pub mod mask;
    pub mod sequence;
    #[cfg(feature = "tensor")]
    pub mod tensor;
    pub mod traverse;
}

pub mod traits {
    pub mod array_ops;
    pub mod backend;
    pub mod type_unions;
}

pub mod aliases;
pub mod macros;

pub use aliases::{ArrayResult, InstanceRef, Kwargs, TypeRef, VarIndex};

pub use enums::dtype::{DType, ShapeSpec};
pub use enums::error::ArrayError;
pub use enums::host_data::HostData;
pub use enums::scalar::Scalar;
pub use enums::value::{Iterable, Value};
pub use enums::var_type::{JitBackend, VarType};

pub use structs::array_value::ArrayValue;
pub use structs::descriptor::{ElementType, TypeDescriptor, TypeSpec};
pub use structs::meta::{ArrayFlags, ArrayMeta, Extent};
pub use structs::record::{StructType, StructValue};
pub use structs::registry::TypeRegistry;
pub use structs::trace_handle::{IndexVector, TraceHandle};

pub use kernels::arithmetic::{fma, shares_variable};
pub use kernels::call::{DispatchFn, SwitchFn, dispatch, switch};
pub use kernels::construct::construct;
pub use kernels::eager::EagerBackend;
pub use kernels::generators::{arange, empty, full, full_n, linspace, ones, zeros};
pub use kernels::mask::{CallArgs, MASK_KEY, extract_mask};
#[cfg(feature = "tensor")]
pub use kernels::tensor::construct_tensor;

pub use traits::array_ops::{ArrayOps, Capabilities};
pub use traits::backend::{Backend, CallContinuation, CallOutcome, CallRequest, CallTarget};
pub use traits::type_unions::{Element, Float, Integer};

pub use vec64::Vec64;
