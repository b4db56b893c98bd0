//! Table schemas: the ordered, typed and named fields shared by every tuple of
//! a table.

use crate::access::error::SchemaError;
use crate::access::value::FieldType;
use std::fmt;

/// Name given to fields created without one.
pub const UNNAMED_FIELD: &str = "unnamed";

/// One field of a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    pub field_type: FieldType,
    pub name: String,
}

/// Describes the layout of a tuple. Immutable once built.
///
/// Two schemas compare equal when their field types match position for
/// position; field names are not compared.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<SchemaField>,
}

impl Schema {
    /// Build a schema from field types and optional names.
    ///
    /// Names that are missing, either because `names` is `None`, shorter than
    /// `types`, or holds a `None` entry, become [`UNNAMED_FIELD`].
    pub fn new(
        types: Vec<FieldType>,
        names: Option<Vec<Option<String>>>,
    ) -> Result<Self, SchemaError> {
        if types.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut names = names.unwrap_or_default().into_iter();
        let fields = types
            .into_iter()
            .map(|field_type| SchemaField {
                field_type,
                name: names
                    .next()
                    .flatten()
                    .unwrap_or_else(|| UNNAMED_FIELD.to_string()),
            })
            .collect();

        Ok(Self { fields })
    }

    /// Build a schema whose fields are all unnamed.
    pub fn unnamed(types: Vec<FieldType>) -> Result<Self, SchemaError> {
        Self::new(types, None)
    }

    /// Build a schema from `(type, name)` pairs.
    pub fn with_names(fields: &[(FieldType, &str)]) -> Result<Self, SchemaError> {
        Self::new(
            fields.iter().map(|(t, _)| *t).collect(),
            Some(fields.iter().map(|(_, n)| Some(n.to_string())).collect()),
        )
    }

    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    pub fn field_type(&self, index: usize) -> Result<FieldType, SchemaError> {
        self.field(index).map(|f| f.field_type)
    }

    pub fn field_name(&self, index: usize) -> Result<&str, SchemaError> {
        self.field(index).map(|f| f.name.as_str())
    }

    /// Index of the first field called `name`.
    pub fn index_of_field(&self, name: &str) -> Result<usize, SchemaError> {
        self.fields
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| SchemaError::FieldNotFound(name.to_string()))
    }

    /// Size in bytes of a tuple with this schema.
    pub fn byte_size(&self) -> usize {
        self.fields.iter().map(|f| f.field_type.byte_len()).sum()
    }

    /// Concatenate two schemas, `left`'s fields first.
    pub fn merge(left: &Schema, right: &Schema) -> Schema {
        let fields = left
            .fields
            .iter()
            .chain(right.fields.iter())
            .cloned()
            .collect();
        Schema { fields }
    }

    /// Fields in declaration order. Each call starts a fresh iterator.
    pub fn fields(&self) -> std::slice::Iter<'_, SchemaField> {
        self.fields.iter()
    }

    pub fn field_types(&self) -> impl Iterator<Item = FieldType> + '_ {
        self.fields.iter().map(|f| f.field_type)
    }

    fn field(&self, index: usize) -> Result<&SchemaField, SchemaError> {
        self.fields
            .get(index)
            .ok_or(SchemaError::FieldIndexOutOfRange {
                index,
                num_fields: self.fields.len(),
            })
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len()
            && self.field_types().zip(other.field_types()).all(|(a, b)| a == b)
    }
}

impl Eq for Schema {}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}({})", field.field_type, field.name)?;
        }
        Ok(())
    }
}
