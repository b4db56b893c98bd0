//! Table registry mapping table ids to their heap files.
//!
//! The catalog is an ordinary value: callers build one and pass it (usually
//! behind an `Arc`) to whatever needs to resolve tables, such as the buffer
//! pool.

use crate::access::heap::HeapFile;
use crate::access::schema::Schema;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(pub u32);

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Unknown table id: {0}")]
    UnknownTable(TableId),

    #[error("Unknown table name: {0}")]
    UnknownTableName(String),
}

struct TableEntry {
    name: String,
    file: Arc<HeapFile>,
}

#[derive(Default)]
pub struct Catalog {
    tables: RwLock<HashMap<TableId, TableEntry>>,
    names: RwLock<HashMap<String, TableId>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `file` under `name`.
    ///
    /// A table already registered with the same id or name is replaced.
    pub fn add_table(&self, file: Arc<HeapFile>, name: &str) -> TableId {
        let table_id = file.id();
        let mut tables = self.tables.write();
        let mut names = self.names.write();

        if let Some(old) = tables.remove(&table_id) {
            names.remove(&old.name);
        }
        if let Some(old_id) = names.remove(name) {
            tables.remove(&old_id);
        }

        log::debug!("Registered table '{}' as {}", name, table_id);
        tables.insert(
            table_id,
            TableEntry {
                name: name.to_string(),
                file,
            },
        );
        names.insert(name.to_string(), table_id);
        table_id
    }

    pub fn file(&self, table_id: TableId) -> Result<Arc<HeapFile>, CatalogError> {
        self.tables
            .read()
            .get(&table_id)
            .map(|entry| entry.file.clone())
            .ok_or(CatalogError::UnknownTable(table_id))
    }

    pub fn schema(&self, table_id: TableId) -> Result<Arc<Schema>, CatalogError> {
        Ok(self.file(table_id)?.schema().clone())
    }

    pub fn table_id(&self, name: &str) -> Result<TableId, CatalogError> {
        self.names
            .read()
            .get(name)
            .copied()
            .ok_or_else(|| CatalogError::UnknownTableName(name.to_string()))
    }

    pub fn table_name(&self, table_id: TableId) -> Result<String, CatalogError> {
        self.tables
            .read()
            .get(&table_id)
            .map(|entry| entry.name.clone())
            .ok_or(CatalogError::UnknownTable(table_id))
    }

    /// Ids of all registered tables, in ascending order.
    pub fn table_ids(&self) -> Vec<TableId> {
        let mut ids: Vec<TableId> = self.tables.read().keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.tables.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.read().is_empty()
    }
}
