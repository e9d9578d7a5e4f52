//! # VarType Module
//!
//! Element kinds understood by the backends, plus the backend identifier itself.

use std::fmt::{Display, Formatter};

/// Scalar element kind of a traced or host-resident array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarType {
    Bool,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
}

impl VarType {
    /// Every supported element kind, in declaration order.
    pub const ALL: [VarType; 7] = [
        VarType::Bool,
        VarType::Int32,
        VarType::UInt32,
        VarType::Int64,
        VarType::UInt64,
        VarType::Float32,
        VarType::Float64,
    ];

    /// Size of one element in bytes.
    #[inline]
    pub const fn size(self) -> usize {
        match self {
            VarType::Bool => 1,
            VarType::Int32 | VarType::UInt32 | VarType::Float32 => 4,
            VarType::Int64 | VarType::UInt64 | VarType::Float64 => 8,
        }
    }

    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, VarType::Float32 | VarType::Float64)
    }

    #[inline]
    pub const fn is_integral(self) -> bool {
        matches!(
            self,
            VarType::Int32 | VarType::UInt32 | VarType::Int64 | VarType::UInt64
        )
    }

    #[inline]
    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            VarType::Int32 | VarType::Int64 | VarType::Float32 | VarType::Float64
        )
    }

    /// True for kinds that support `fma` and counters, i.e. everything but booleans.
    #[inline]
    pub const fn is_arithmetic(self) -> bool {
        !matches!(self, VarType::Bool)
    }

    pub const fn name(self) -> &'static str {
        match self {
            VarType::Bool => "bool",
            VarType::Int32 => "int32",
            VarType::UInt32 => "uint32",
            VarType::Int64 => "int64",
            VarType::UInt64 => "uint64",
            VarType::Float32 => "float32",
            VarType::Float64 => "float64",
        }
    }
}

impl Display for VarType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Execution target of an array type.
///
/// `Host` marks arrays whose storage lives in ordinary host memory and that
/// never reach a trace graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JitBackend {
    Host,
    Llvm,
    Cuda,
}

impl JitBackend {
    #[inline]
    pub const fn is_jit(self) -> bool {
        !matches!(self, JitBackend::Host)
    }

    pub const fn name(self) -> &'static str {
        match self {
            JitBackend::Host => "host",
            JitBackend::Llvm => "llvm",
            JitBackend::Cuda => "cuda",
        }
    }
}

impl Display for JitBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
