//! Error types for schemas, tuple encoding and file iteration.

use crate::access::value::FieldType;
use crate::storage::error::StorageError;
use thiserror::Error;

/// Errors raised by schema and tuple field access.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("A schema must contain at least one field")]
    Empty,

    #[error("Field index {index} out of range (num fields: {num_fields})")]
    FieldIndexOutOfRange { index: usize, num_fields: usize },

    #[error("No field named '{0}'")]
    FieldNotFound(String),

    #[error("Field {index} expects {expected} but got {actual}")]
    TypeMismatch {
        index: usize,
        expected: FieldType,
        actual: FieldType,
    },

    #[error("Expected {expected} fields but got {actual}")]
    FieldCountMismatch { expected: usize, actual: usize },
}

/// Errors raised while converting fields and tuples to and from bytes.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("String length {len} exceeds the maximum of {max} bytes")]
    StringTooLong { len: usize, max: usize },

    #[error("Invalid UTF-8 in string field: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("Cannot parse '{text}' as {field_type}")]
    Parse { field_type: FieldType, text: String },

    #[error("Unknown field type: {0}")]
    UnknownType(String),

    #[error("Field {index} has not been set")]
    UnsetField { index: usize },

    #[error("Page has room for {capacity} slots but {requested} were given")]
    TooManySlots { requested: usize, capacity: usize },

    #[error("Tuple schema ({actual}) does not match page schema ({expected})")]
    SchemaMismatch { expected: String, actual: String },
}

/// Errors raised by file iterators.
///
/// `NoSuchElement` covers both normal exhaustion and calls on an iterator that
/// is not open; every other failure is a propagated storage error.
#[derive(Error, Debug)]
pub enum IterationError {
    #[error("No more tuples")]
    NoSuchElement,

    #[error(transparent)]
    Storage(#[from] StorageError),
}
