//! # **Record Module** - *User-Defined Structures*
//!
//! Records are named groups of fields that the generators fill field by field and
//! that the call aggregator traverses when collecting trace handles. Field order
//! is the declaration order and fixes the traversal order.

use std::sync::Arc;

use crate::enums::dtype::DType;
use crate::{ArrayError, ArrayResult, Value};

/// Declared layout of a record type.
#[derive(Debug, Clone, PartialEq)]
pub struct StructType {
    pub name: String,
    pub fields: Vec<(String, DType)>,
}

impl StructType {
    pub fn new(name: impl Into<String>, fields: Vec<(String, DType)>) -> Arc<Self> {
        Arc::new(StructType {
            name: name.into(),
            fields,
        })
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|(n, _)| n == name)
    }
}

/// An instance of a [`StructType`], one value per declared field.
#[derive(Debug, Clone, PartialEq)]
pub struct StructValue {
    ty: Arc<StructType>,
    fields: Vec<Value>,
}

impl StructValue {
    pub fn new(ty: Arc<StructType>, fields: Vec<Value>) -> ArrayResult<Self> {
        if fields.len() != ty.fields.len() {
            return Err(ArrayError::value_error(format!(
                "{}: expected {} fields, got {}.",
                ty.name,
                ty.fields.len(),
                fields.len()
            )));
        }
        Ok(StructValue { ty, fields })
    }

    #[inline]
    pub fn ty(&self) -> &Arc<StructType> {
        &self.ty
    }

    #[inline]
    pub fn fields(&self) -> &[Value] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.ty.field_index(name).map(|i| &self.fields[i])
    }

    /// New record of the same type with every field passed through `f`.
    pub fn map_fields<F>(&self, f: F) -> ArrayResult<StructValue>
    where
        F: FnMut(&Value) -> ArrayResult<Value>,
    {
        Ok(StructValue {
            ty: self.ty.clone(),
            fields: self.fields.iter().map(f).collect::<ArrayResult<_>>()?,
        })
    }
}
