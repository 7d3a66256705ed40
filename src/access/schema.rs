//! Tuple descriptors and the fixed-width record codec.
//!
//! A record is the concatenation of its fields, each written at the offset given by
//! the sum of the widths of the fields before it. There is no record header.

use crate::access::tuple::Tuple;
use crate::access::value::FieldType;
use crate::storage::error::{StorageError, StorageResult};
use std::collections::HashSet;

/// Ordered list of (type, unique name) pairs describing a record layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TupleDesc {
    types: Vec<FieldType>,
    names: Vec<String>,
}

impl TupleDesc {
    pub fn new(types: Vec<FieldType>, names: Vec<String>) -> StorageResult<Self> {
        if types.len() != names.len() {
            return Err(StorageError::InvalidSchema(format!(
                "{} types but {} names",
                types.len(),
                names.len()
            )));
        }

        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(StorageError::InvalidSchema(format!(
                    "duplicate field name '{}'",
                    name
                )));
            }
        }

        Ok(Self { types, names })
    }

    /// Build from `(type, name)` pairs.
    pub fn from_fields<S: Into<String>>(
        fields: impl IntoIterator<Item = (FieldType, S)>,
    ) -> StorageResult<Self> {
        let (types, names) = fields
            .into_iter()
            .map(|(ty, name)| (ty, name.into()))
            .unzip();
        Self::new(types, names)
    }

    /// Parse a `name:type,name:type` list, e.g. `id:int,name:char`.
    pub fn parse(text: &str) -> StorageResult<Self> {
        let mut fields = Vec::new();
        for part in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, ty) = part.split_once(':').ok_or_else(|| {
                StorageError::InvalidSchema(format!("expected name:type, got '{}'", part))
            })?;
            fields.push((FieldType::parse(ty.trim())?, name.trim().to_string()));
        }
        Self::from_fields(fields)
    }

    /// Concatenate two descriptors. Fails if they share a field name.
    pub fn merge(a: &TupleDesc, b: &TupleDesc) -> StorageResult<TupleDesc> {
        let types = a.types.iter().chain(&b.types).copied().collect();
        let names = a.names.iter().chain(&b.names).cloned().collect();
        TupleDesc::new(types, names)
    }

    /// Byte length of one encoded record.
    pub fn length(&self) -> usize {
        self.types.iter().map(|ty| ty.width()).sum()
    }

    /// Number of fields.
    pub fn size(&self) -> usize {
        self.types.len()
    }

    pub fn offset_of(&self, index: usize) -> StorageResult<usize> {
        if index >= self.size() {
            return Err(StorageError::FieldIndexOutOfRange {
                index,
                size: self.size(),
            });
        }
        Ok(self.types[..index].iter().map(|ty| ty.width()).sum())
    }

    pub fn index_of(&self, name: &str) -> StorageResult<usize> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| StorageError::FieldNotFound(name.to_string()))
    }

    pub fn types(&self) -> &[FieldType] {
        &self.types
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Same arity and a type-for-type match in order.
    pub fn compatible(&self, tuple: &Tuple) -> bool {
        tuple.size() == self.size()
            && self
                .types
                .iter()
                .zip(tuple.fields())
                .all(|(ty, field)| field.field_type() == *ty)
    }

    /// Encode `tuple` into the front of `buf`. Nothing is written on failure.
    pub fn serialize(&self, buf: &mut [u8], tuple: &Tuple) -> StorageResult<()> {
        if !self.compatible(tuple) {
            return Err(StorageError::SchemaMismatch);
        }
        self.check_len(buf.len())?;

        let mut offset = 0;
        for field in tuple.fields() {
            let width = field.field_type().width();
            field.encode(&mut buf[offset..offset + width]);
            offset += width;
        }
        Ok(())
    }

    /// Decode one record from the front of `buf`.
    pub fn deserialize(&self, buf: &[u8]) -> StorageResult<Tuple> {
        self.check_len(buf.len())?;

        let mut offset = 0;
        let mut fields = Vec::with_capacity(self.size());
        for ty in &self.types {
            fields.push(ty.decode(&buf[offset..offset + ty.width()]));
            offset += ty.width();
        }
        Ok(Tuple::new(fields))
    }

    fn check_len(&self, available: usize) -> StorageResult<()> {
        let required = self.length();
        if available < required {
            return Err(StorageError::BufferTooSmall {
                required,
                available,
            });
        }
        Ok(())
    }
}
