use crate::access::error::{CodecError, SchemaError};
use crate::access::schema::Schema;
use crate::access::value::Field;
use crate::storage::page::PageId;
use std::cmp::Ordering;
use std::fmt;
use std::io::{Read, Write};
use std::sync::Arc;

/// Location of a tuple: the page holding it and its slot on that page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot: u16,
}

impl RecordId {
    pub fn new(page_id: PageId, slot: u16) -> Self {
        Self { page_id, slot }
    }
}

impl PartialOrd for RecordId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RecordId {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.page_id.cmp(&other.page_id) {
            Ordering::Equal => self.slot.cmp(&other.slot),
            other => other,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, slot {}", self.page_id, self.slot)
    }
}

/// A record conforming to a schema.
///
/// Fields start unset and are filled by position. Equality compares the
/// schema and the field values, not the record id.
#[derive(Debug, Clone)]
pub struct Tuple {
    schema: Arc<Schema>,
    fields: Vec<Option<Field>>,
    record_id: Option<RecordId>,
}

impl Tuple {
    /// Create a tuple with every field unset.
    pub fn new(schema: Arc<Schema>) -> Self {
        let fields = vec![None; schema.num_fields()];
        Self {
            schema,
            fields,
            record_id: None,
        }
    }

    /// Create a tuple with all fields set, type-checking each one.
    pub fn from_fields(schema: Arc<Schema>, fields: Vec<Field>) -> Result<Self, SchemaError> {
        if fields.len() != schema.num_fields() {
            return Err(SchemaError::FieldCountMismatch {
                expected: schema.num_fields(),
                actual: fields.len(),
            });
        }
        let mut tuple = Self::new(schema);
        for (i, field) in fields.into_iter().enumerate() {
            tuple.set_field(i, field)?;
        }
        Ok(tuple)
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn field(&self, index: usize) -> Result<Option<&Field>, SchemaError> {
        self.schema.field_type(index)?;
        Ok(self.fields[index].as_ref())
    }

    pub fn set_field(&mut self, index: usize, field: Field) -> Result<(), SchemaError> {
        let expected = self.schema.field_type(index)?;
        if field.field_type() != expected {
            return Err(SchemaError::TypeMismatch {
                index,
                expected,
                actual: field.field_type(),
            });
        }
        self.fields[index] = Some(field);
        Ok(())
    }

    pub fn fields(&self) -> impl Iterator<Item = Option<&Field>> + '_ {
        self.fields.iter().map(Option::as_ref)
    }

    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    pub fn set_record_id(&mut self, record_id: Option<RecordId>) {
        self.record_id = record_id;
    }

    /// Encode all fields in schema order. Every field must be set.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), CodecError> {
        for (index, field) in self.fields.iter().enumerate() {
            field
                .as_ref()
                .ok_or(CodecError::UnsetField { index })?
                .write_to(writer)?;
        }
        Ok(())
    }

    /// Decode a tuple of `schema` from `reader`. The record id is left unset.
    pub fn read_from<R: Read>(schema: Arc<Schema>, reader: &mut R) -> Result<Self, CodecError> {
        let fields = schema
            .field_types()
            .map(|t| t.read_field(reader).map(Some))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            schema,
            fields,
            record_id: None,
        })
    }
}

impl PartialEq for Tuple {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema && self.fields == other.fields
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, "\t")?;
            }
            match field {
                Some(field) => write!(f, "{}", field)?,
                None => write!(f, "null")?,
            }
        }
        Ok(())
    }
}
