//! Per-document metadata storage.
//!
//! Two files hold the metadata of an index:
//!
//! - `metadata.db`: a header describing the schema (a packed count of
//!   user-supplied fields followed by one `(name, type byte)` header per
//!   field) and then one packed record per document in schema order.
//! - `metadata.index`: a fixed-width vector mapping each `doc_id` to the
//!   byte offset of its record in `metadata.db`.
//!
//! Every schema starts with two reserved fields, `length` and
//! `unique-terms`, both unsigned; user fields follow. The schema is
//! identical for every document.
//!
//! Reads go through a memory map. [`MetadataFile::get`] returns a proxy
//! that decodes fields on demand by replaying the schema from the record's
//! start offset; callers that read several fields of one document should
//! hold on to the decoded values.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use memmap2::Mmap;

use crate::error::{Error, Result};
use crate::ids::DocId;
use crate::io::disk_vector::{DiskVector, write_disk_vector};
use crate::io::packed;

use super::index_files::IndexFile;

/// Reserved leading field holding the document length in tokens.
pub const FIELD_LENGTH: &str = "length";

/// Reserved leading field holding the document's distinct term count.
pub const FIELD_UNIQUE_TERMS: &str = "unique-terms";

/// The type tag of a metadata field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FieldType {
    SignedInt = 0,
    UnsignedInt = 1,
    Double = 2,
    Str = 3,
}

impl FieldType {
    fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(FieldType::SignedInt),
            1 => Ok(FieldType::UnsignedInt),
            2 => Ok(FieldType::Double),
            3 => Ok(FieldType::Str),
            other => Err(Error::Corrupt(format!(
                "unknown metadata field type byte {other}"
            ))),
        }
    }
}

/// One decoded metadata value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    I64(i64),
    U64(u64),
    F64(f64),
    Str(String),
}

impl FieldValue {
    /// The type tag matching this value.
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::I64(_) => FieldType::SignedInt,
            FieldValue::U64(_) => FieldType::UnsignedInt,
            FieldValue::F64(_) => FieldType::Double,
            FieldValue::Str(_) => FieldType::Str,
        }
    }

    /// The contained unsigned value, if this is a `U64`.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            FieldValue::U64(v) => Some(*v),
            _ => None,
        }
    }

    /// The contained signed value, if this is an `I64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// The contained double, if this is an `F64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::F64(v) => Some(*v),
            _ => None,
        }
    }

    /// The contained string, if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(v) => Some(v),
            _ => None,
        }
    }

    fn write_packed<W: Write + ?Sized>(&self, out: &mut W) -> Result<u64> {
        match self {
            FieldValue::I64(v) => packed::write(out, v),
            FieldValue::U64(v) => packed::write(out, v),
            FieldValue::F64(v) => packed::write(out, v),
            FieldValue::Str(v) => packed::write(out, v),
        }
    }
}

/// A named, typed schema entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: String,
    pub field_type: FieldType,
}

impl FieldInfo {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// The ordered field list of a metadata file, reserved fields included.
pub type Schema = Vec<FieldInfo>;

/// The reserved leading fields every schema carries.
fn reserved_fields() -> [FieldInfo; 2] {
    [
        FieldInfo::new(FIELD_LENGTH, FieldType::UnsignedInt),
        FieldInfo::new(FIELD_UNIQUE_TERMS, FieldType::UnsignedInt),
    ]
}

/// Writes `metadata.db` and `metadata.index` during index construction.
///
/// Records must be appended in `doc_id` order.
pub struct MetadataWriter {
    out: BufWriter<File>,
    user_schema: Schema,
    offsets: Vec<u64>,
    position: u64,
}

impl MetadataWriter {
    /// Creates the metadata database in `index_dir` and writes its schema
    /// header. `user_schema` lists the user fields only; the reserved
    /// fields are added automatically.
    pub fn create(index_dir: &Path, user_schema: Schema) -> Result<Self> {
        let file = File::create(IndexFile::MetadataDb.path_in(index_dir))?;
        let mut out = BufWriter::new(file);

        let mut position = packed::write(&mut out, &(user_schema.len() as u64))?;
        for field in reserved_fields().iter().chain(user_schema.iter()) {
            position += packed::write(&mut out, &field.name)?;
            position += packed::write(&mut out, &(field.field_type as u8))?;
        }

        Ok(Self {
            out,
            user_schema,
            offsets: Vec::new(),
            position,
        })
    }

    /// Appends the record for the next document.
    ///
    /// # Errors
    ///
    /// [`Error::Corrupt`] if `user_values` does not match the schema in
    /// arity or field type.
    pub fn write_record(
        &mut self,
        doc_length: u64,
        unique_terms: u64,
        user_values: &[FieldValue],
    ) -> Result<()> {
        if user_values.len() != self.user_schema.len() {
            return Err(Error::Corrupt(format!(
                "document has {} metadata fields, schema expects {}",
                user_values.len(),
                self.user_schema.len()
            )));
        }
        for (value, field) in user_values.iter().zip(&self.user_schema) {
            if value.field_type() != field.field_type {
                return Err(Error::Corrupt(format!(
                    "metadata field \"{}\" has mismatched type",
                    field.name
                )));
            }
        }

        self.offsets.push(self.position);
        self.position += packed::write(&mut self.out, &doc_length)?;
        self.position += packed::write(&mut self.out, &unique_terms)?;
        for value in user_values {
            self.position += value.write_packed(&mut self.out)?;
        }
        Ok(())
    }

    /// Flushes the database and writes the offset vector.
    pub fn finish(mut self, index_dir: &Path) -> Result<()> {
        self.out.flush()?;
        write_disk_vector(&IndexFile::MetadataIndex.path_in(index_dir), &self.offsets)
    }
}

/// The opened metadata store of an index.
pub struct MetadataFile {
    schema: Schema,
    index: DiskVector<u64>,
    db: Option<Mmap>,
}

impl MetadataFile {
    /// Opens the metadata files in `index_dir` and reads the schema header.
    pub fn open(index_dir: &Path) -> Result<Self> {
        let index = DiskVector::<u64>::open(&IndexFile::MetadataIndex.path_in(index_dir))?;

        let file = File::open(IndexFile::MetadataDb.path_in(index_dir))?;
        let db = if file.metadata()?.len() == 0 {
            None
        } else {
            Some(unsafe { Mmap::map(&file)? })
        };

        let schema = match &db {
            Some(map) => {
                let mut cursor: &[u8] = map;
                let user_fields: u64 = packed::read(&mut cursor)?;

                let mut schema = Schema::with_capacity(user_fields as usize + 2);
                for _ in 0..user_fields + 2 {
                    let name: String = packed::read(&mut cursor)?;
                    let type_byte: u8 = packed::read(&mut cursor)?;
                    schema.push(FieldInfo::new(name, FieldType::from_byte(type_byte)?));
                }

                if schema[0].name != FIELD_LENGTH || schema[1].name != FIELD_UNIQUE_TERMS {
                    return Err(Error::Corrupt(
                        "metadata schema is missing its reserved leading fields".to_string(),
                    ));
                }
                schema
            }
            None => reserved_fields().to_vec(),
        };

        Ok(Self { schema, index, db })
    }

    /// The number of documents with metadata records.
    pub fn size(&self) -> u64 {
        self.index.len() as u64
    }

    /// The full schema, reserved fields first.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the lazy metadata proxy for `doc`.
    ///
    /// # Errors
    ///
    /// [`Error::Corrupt`] if the document id or its stored offset is out of
    /// range.
    pub fn get(&self, doc: DocId) -> Result<Metadata<'_>> {
        let offset = self
            .index
            .get(doc.get() as usize)
            .ok_or_else(|| Error::Corrupt(format!("doc id {doc} out of metadata range")))?;

        let db = self
            .db
            .as_ref()
            .ok_or_else(|| Error::Corrupt("metadata database is empty".to_string()))?;

        if offset as usize >= db.len() {
            return Err(Error::Corrupt(format!(
                "metadata offset {offset} for doc {doc} is outside the database"
            )));
        }

        Ok(Metadata {
            schema: &self.schema,
            bytes: &db[offset as usize..],
        })
    }
}

/// Lazy, schema-replaying view of one document's metadata record.
///
/// Every call re-decodes the record from its start offset up to the
/// requested field.
pub struct Metadata<'file> {
    schema: &'file Schema,
    bytes: &'file [u8],
}

impl Metadata<'_> {
    /// Decodes the field named `name`, or `None` if the schema has no such
    /// field.
    pub fn get(&self, name: &str) -> Result<Option<FieldValue>> {
        let mut cursor = self.bytes;
        for field in self.schema {
            let value = match field.field_type {
                FieldType::SignedInt => FieldValue::I64(packed::read(&mut cursor)?),
                FieldType::UnsignedInt => FieldValue::U64(packed::read(&mut cursor)?),
                FieldType::Double => FieldValue::F64(packed::read(&mut cursor)?),
                FieldType::Str => FieldValue::Str(packed::read(&mut cursor)?),
            };
            if field.name == name {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    /// The document length in tokens (reserved field).
    pub fn length(&self) -> Result<u64> {
        let mut cursor = self.bytes;
        packed::read(&mut cursor)
    }

    /// The document's distinct term count (reserved field).
    pub fn unique_terms(&self) -> Result<u64> {
        let mut cursor = self.bytes;
        let _length: u64 = packed::read(&mut cursor)?;
        packed::read(&mut cursor)
    }
}
