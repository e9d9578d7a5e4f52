//! # Aliases Module
//!
//! Short names for the handful of composite types that appear in most signatures
//! across the crate.

use std::any::Any;
use std::sync::Arc;

use crate::enums::error::ArrayError;
use crate::structs::descriptor::TypeDescriptor;
use crate::Value;

/// Shared, registered array type.
///
/// Descriptors are immutable once registered and are always passed around
/// by reference count, never copied.
pub type TypeRef = Arc<TypeDescriptor>;

/// Raw variable index inside a backend's trace graph. `0` is the null variable.
pub type VarIndex = u64;

/// Result alias used by every fallible operation in the crate.
pub type ArrayResult<T> = Result<T, ArrayError>;

/// Ordered keyword arguments, as captured for a call.
pub type Kwargs = Vec<(String, Value)>;

/// Native object bound as `self` when `dispatch` invokes a callable for
/// one instance group.
pub type InstanceRef = Arc<dyn Any + Send + Sync>;
