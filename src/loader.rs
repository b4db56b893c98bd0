//! Bulk construction of heap files.
//!
//! Heap files are read-only once written; this module is the only writer.

use crate::access::error::{CodecError, SchemaError};
use crate::access::schema::Schema;
use crate::access::tuple::Tuple;
use crate::access::value::Field;
use crate::config::{ConfigError, StorageConfig};
use crate::storage::disk::PageManager;
use crate::storage::error::StorageError;
use crate::storage::page::HeapPage;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Encoding error: {0}")]
    Codec(#[from] CodecError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Tuples of {tuple_size} bytes do not fit in a {page_size} byte page")]
    TupleTooLarge { tuple_size: usize, page_size: usize },
}

/// Totals reported after a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub tuples: usize,
    pub pages: u32,
}

/// Writes pages of a single heap file in order.
///
/// Tuples passed to [`append_tuple`](Self::append_tuple) are buffered until a
/// page is full; [`finish`](Self::finish) writes the final partial page and
/// syncs the file. Dropping the encoder without finishing may lose the
/// buffered tuples.
pub struct HeapFileEncoder {
    path: PathBuf,
    disk: PageManager,
    schema: Arc<Schema>,
    slots_per_page: usize,
    pending: Vec<Option<Tuple>>,
    pages_written: u32,
}

impl HeapFileEncoder {
    /// Create `path`, truncating any existing file.
    pub fn create(
        path: impl AsRef<Path>,
        schema: Arc<Schema>,
        config: &StorageConfig,
    ) -> Result<Self, LoadError> {
        config.validate()?;

        let tuple_size = schema.byte_size();
        let slots_per_page = HeapPage::slots_per_page(config.page_size, tuple_size);
        if slots_per_page == 0 {
            return Err(LoadError::TupleTooLarge {
                tuple_size,
                page_size: config.page_size,
            });
        }

        let path = path.as_ref().to_path_buf();
        let disk = PageManager::create(&path, config.page_size)?;
        log::debug!(
            "Writing {} with {} slots per page ({})",
            path.display(),
            slots_per_page,
            schema
        );

        Ok(Self {
            path,
            disk,
            schema,
            slots_per_page,
            pending: Vec::with_capacity(slots_per_page),
            pages_written: 0,
        })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn slots_per_page(&self) -> usize {
        self.slots_per_page
    }

    /// Pages written so far, not counting buffered tuples.
    pub fn pages_written(&self) -> u32 {
        self.pages_written
    }

    /// Append one page whose slot `i` is used iff `slots[i]` is `Some`.
    /// Buffered tuples are flushed to their own page first.
    /// Returns the page number written.
    pub fn write_page(&mut self, slots: &[Option<Tuple>]) -> Result<u32, LoadError> {
        self.flush_pending()?;
        self.write_image(slots)
    }

    /// Buffer one tuple into the next free slot, writing the page once full.
    pub fn append_tuple(&mut self, tuple: Tuple) -> Result<(), LoadError> {
        if tuple.schema().as_ref() != self.schema.as_ref() {
            return Err(CodecError::SchemaMismatch {
                expected: self.schema.to_string(),
                actual: tuple.schema().to_string(),
            }
            .into());
        }

        self.pending.push(Some(tuple));
        if self.pending.len() == self.slots_per_page {
            self.flush_pending()?;
        }
        Ok(())
    }

    /// Pack tuples densely, filling each page before starting the next.
    pub fn append_tuples<I>(&mut self, tuples: I) -> Result<usize, LoadError>
    where
        I: IntoIterator<Item = Tuple>,
    {
        let mut count = 0;
        for tuple in tuples {
            self.append_tuple(tuple)?;
            count += 1;
        }
        Ok(count)
    }

    /// Write any buffered tuples, sync, and return the total page count.
    pub fn finish(mut self) -> Result<u32, LoadError> {
        self.flush_pending()?;
        self.disk.sync()?;

        log::info!(
            "Wrote {} pages to {}",
            self.pages_written,
            self.path.display()
        );
        Ok(self.pages_written)
    }

    fn flush_pending(&mut self) -> Result<(), LoadError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let slots = std::mem::take(&mut self.pending);
        self.write_image(&slots)?;
        self.pending = slots;
        self.pending.clear();
        Ok(())
    }

    fn write_image(&mut self, slots: &[Option<Tuple>]) -> Result<u32, LoadError> {
        let data = HeapPage::encode(self.disk.page_size(), &self.schema, slots)?;
        let page_no = self.pages_written;
        self.disk.write_page(page_no, &data)?;
        self.pages_written += 1;

        log::debug!(
            "Wrote page {} of {} ({} used slots)",
            page_no,
            self.path.display(),
            slots.iter().filter(|s| s.is_some()).count()
        );
        Ok(page_no)
    }
}

/// Convert comma-separated text into a heap file at `path`.
///
/// Each non-blank line holds one tuple with one value per schema field.
/// Values are trimmed before parsing.
pub fn convert_text<R: BufRead>(
    reader: R,
    path: impl AsRef<Path>,
    schema: Arc<Schema>,
    config: &StorageConfig,
) -> Result<LoadSummary, LoadError> {
    let mut encoder = HeapFileEncoder::create(path, schema.clone(), config)?;
    let mut tuples = 0;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let fields = parse_line(&schema, &line).map_err(|message| LoadError::Parse {
            line: index + 1,
            message,
        })?;
        encoder.append_tuple(Tuple::from_fields(schema.clone(), fields)?)?;
        tuples += 1;
    }

    let pages = encoder.finish()?;
    Ok(LoadSummary { tuples, pages })
}

fn parse_line(schema: &Schema, line: &str) -> Result<Vec<Field>, String> {
    let values: Vec<&str> = line.split(',').collect();
    if values.len() != schema.num_fields() {
        return Err(format!(
            "expected {} fields but found {}",
            schema.num_fields(),
            values.len()
        ));
    }

    values
        .iter()
        .zip(schema.field_types())
        .map(|(text, field_type)| field_type.parse_field(text).map_err(|e| e.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::heap::HeapFile;
    use crate::access::value::FieldType;
    use crate::storage::page::PageId;
    use anyhow::Result;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn int_schema() -> Arc<Schema> {
        Arc::new(Schema::unnamed(vec![FieldType::Int]).expect("valid schema"))
    }

    fn int_tuple(schema: &Arc<Schema>, v: i32) -> Tuple {
        Tuple::from_fields(schema.clone(), vec![Field::Int(v)]).expect("valid tuple")
    }

    fn used_per_page(file: &HeapFile) -> Result<Vec<usize>> {
        let mut counts = Vec::new();
        for page_no in 0..file.num_pages()? {
            let page = file.read_page(PageId::new(file.id(), page_no))?;
            counts.push(page.num_used_slots());
        }
        Ok(counts)
    }

    #[test]
    fn test_append_tuples_packs_densely() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("dense.dat");
        // 15 four-byte slots per 64-byte page
        let config = StorageConfig::default().with_page_size(64);
        let schema = int_schema();

        let mut encoder = HeapFileEncoder::create(&path, schema.clone(), &config)?;
        assert_eq!(encoder.slots_per_page(), 15);
        let count = encoder.append_tuples((0..40).map(|v| int_tuple(&schema, v)))?;
        assert_eq!(count, 40);
        assert_eq!(encoder.pages_written(), 2);
        assert_eq!(encoder.finish()?, 3);

        let file = HeapFile::open(&path, schema, &config)?;
        assert_eq!(used_per_page(&file)?, vec![15, 15, 10]);

        let last = file.read_page(PageId::new(file.id(), 2))?;
        let values: Vec<_> = last.iter().map(|t| t.field(0).ok().flatten().cloned()).collect();
        assert_eq!(values.first(), Some(&Some(Field::Int(30))));
        assert_eq!(values.last(), Some(&Some(Field::Int(39))));
        Ok(())
    }

    #[test]
    fn test_write_page_flushes_pending_first() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("mixed.dat");
        let config = StorageConfig::default().with_page_size(64);
        let schema = int_schema();

        let mut encoder = HeapFileEncoder::create(&path, schema.clone(), &config)?;
        encoder.append_tuple(int_tuple(&schema, 1))?;
        let page_no = encoder.write_page(&[None, None, Some(int_tuple(&schema, 2))])?;
        assert_eq!(page_no, 1);
        assert_eq!(encoder.write_page(&[])?, 2);
        assert_eq!(encoder.finish()?, 3);

        let file = HeapFile::open(&path, schema, &config)?;
        assert_eq!(used_per_page(&file)?, vec![1, 1, 0]);
        let page = file.read_page(PageId::new(file.id(), 1))?;
        assert!(page.is_slot_used(2));
        assert!(!page.is_slot_used(0));
        Ok(())
    }

    #[test]
    fn test_finish_without_tuples_leaves_empty_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("empty.dat");
        let encoder = HeapFileEncoder::create(&path, int_schema(), &StorageConfig::default())?;
        assert_eq!(encoder.finish()?, 0);
        assert_eq!(std::fs::metadata(&path)?.len(), 0);
        Ok(())
    }

    #[test]
    fn test_rejects_foreign_schema() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("t.dat");
        let mut encoder = HeapFileEncoder::create(&path, int_schema(), &StorageConfig::default())?;

        let other = Arc::new(Schema::unnamed(vec![FieldType::String])?);
        let tuple = Tuple::from_fields(other, vec![Field::String("x".to_string())])?;
        assert!(matches!(
            encoder.append_tuple(tuple.clone()),
            Err(LoadError::Codec(CodecError::SchemaMismatch { .. }))
        ));
        assert!(matches!(
            encoder.write_page(&[Some(tuple)]),
            Err(LoadError::Codec(CodecError::SchemaMismatch { .. }))
        ));
        Ok(())
    }

    #[test]
    fn test_too_many_slots() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("t.dat");
        let config = StorageConfig::default().with_page_size(64);
        let mut encoder = HeapFileEncoder::create(&path, int_schema(), &config)?;

        let slots = vec![None; 16];
        assert!(matches!(
            encoder.write_page(&slots),
            Err(LoadError::Codec(CodecError::TooManySlots {
                requested: 16,
                capacity: 15
            }))
        ));
        Ok(())
    }

    #[test]
    fn test_tuple_too_large() -> Result<()> {
        let dir = tempdir()?;
        let schema = Arc::new(Schema::unnamed(vec![FieldType::String])?);
        let config = StorageConfig::default().with_page_size(64);

        let result = HeapFileEncoder::create(dir.path().join("t.dat"), schema, &config);
        assert!(matches!(
            result,
            Err(LoadError::TupleTooLarge {
                tuple_size: 132,
                page_size: 64
            })
        ));
        Ok(())
    }

    #[test]
    fn test_convert_text() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("people.dat");
        let config = StorageConfig::default();
        let schema = Arc::new(Schema::with_names(&[
            (FieldType::Int, "id"),
            (FieldType::String, "name"),
        ])?);

        let input = "1, alice\n\n2,bob  \n   \n3 ,carol\n";
        let summary = convert_text(Cursor::new(input), &path, schema.clone(), &config)?;
        assert_eq!(summary, LoadSummary { tuples: 3, pages: 1 });

        let file = HeapFile::open(&path, schema, &config)?;
        let page = file.read_page(PageId::new(file.id(), 0))?;
        let rows: Vec<String> = page.iter().map(|t| t.to_string()).collect();
        assert_eq!(rows, vec!["1\talice", "2\tbob", "3\tcarol"]);
        Ok(())
    }

    #[test]
    fn test_convert_text_reports_line_numbers() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("bad.dat");
        let config = StorageConfig::default();
        let schema = Arc::new(Schema::unnamed(vec![FieldType::Int, FieldType::Int])?);

        let result = convert_text(Cursor::new("1,2\n\n3,x\n"), &path, schema.clone(), &config);
        assert!(matches!(result, Err(LoadError::Parse { line: 3, .. })));

        let result = convert_text(Cursor::new("1,2,3\n"), &path, schema, &config);
        match result {
            Err(LoadError::Parse { line, message }) => {
                assert_eq!(line, 1);
                assert!(message.contains("expected 2 fields"));
            }
            other => panic!("unexpected result: {:?}", other.map(|s| s.tuples)),
        }
        Ok(())
    }
}
