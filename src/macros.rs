//! # Macros Module
//!
//! Variant dispatch helpers for [`crate::HostData`] and [`crate::VarType`], so each
//! typed kernel is written once against [`crate::traits::type_unions::Element`].

/// Evaluates `$body` with `$v` bound to the typed buffer of whichever
/// `HostData` variant `$data` holds.
#[macro_export]
macro_rules! with_host_data {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            $crate::HostData::Bool($v) => $body,
            $crate::HostData::Int32($v) => $body,
            $crate::HostData::UInt32($v) => $body,
            $crate::HostData::Int64($v) => $body,
            $crate::HostData::UInt64($v) => $body,
            $crate::HostData::Float32($v) => $body,
            $crate::HostData::Float64($v) => $body,
        }
    };
}

/// Like [`with_host_data!`], but rewraps the produced `Vec64` into the
/// same variant it came from.
#[macro_export]
macro_rules! map_host_data {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            $crate::HostData::Bool($v) => $crate::HostData::Bool($body),
            $crate::HostData::Int32($v) => $crate::HostData::Int32($body),
            $crate::HostData::UInt32($v) => $crate::HostData::UInt32($body),
            $crate::HostData::Int64($v) => $crate::HostData::Int64($body),
            $crate::HostData::UInt64($v) => $crate::HostData::UInt64($body),
            $crate::HostData::Float32($v) => $crate::HostData::Float32($body),
            $crate::HostData::Float64($v) => $crate::HostData::Float64($body),
        }
    };
}

/// Evaluates `$body` with the type alias `$t` bound to the native Rust type
/// of the runtime `VarType` `$vt`.
#[macro_export]
macro_rules! with_var_type {
    ($vt:expr, $t:ident => $body:expr) => {
        match $vt {
            $crate::VarType::Bool => {
                type $t = bool;
                $body
            }
            $crate::VarType::Int32 => {
                type $t = i32;
                $body
            }
            $crate::VarType::UInt32 => {
                type $t = u32;
                $body
            }
            $crate::VarType::Int64 => {
                type $t = i64;
                $body
            }
            $crate::VarType::UInt64 => {
                type $t = u64;
                $body
            }
            $crate::VarType::Float32 => {
                type $t = f32;
                $body
            }
            $crate::VarType::Float64 => {
                type $t = f64;
                $body
            }
        }
    };
}
