use anyhow::Result;
use heapdb::access::{DbFileIterator, Field, FieldType, HeapFile, IterationError, Schema, Tuple};
use heapdb::catalog::Catalog;
use heapdb::config::StorageConfig;
use heapdb::loader::{convert_text, HeapFileEncoder};
use heapdb::storage::{BufferPoolManager, StorageError};
use heapdb::transaction::TransactionManager;
use std::io::Cursor;
use std::sync::Arc;
use std::thread;
use tempfile::tempdir;

struct Database {
    catalog: Arc<Catalog>,
    transactions: Arc<TransactionManager>,
    pool: Arc<BufferPoolManager>,
}

fn database(config: &StorageConfig) -> Result<Database> {
    let catalog = Arc::new(Catalog::new());
    let transactions = Arc::new(TransactionManager::new());
    let pool = Arc::new(BufferPoolManager::new(
        catalog.clone(),
        transactions.clone(),
        config,
    )?);
    Ok(Database {
        catalog,
        transactions,
        pool,
    })
}

fn ids(schema: &Arc<Schema>, range: std::ops::Range<i32>) -> Vec<Tuple> {
    range
        .map(|v| Tuple::from_fields(schema.clone(), vec![Field::Int(v)]).expect("valid tuple"))
        .collect()
}

fn int_values(tuples: &[Tuple]) -> Vec<i32> {
    tuples
        .iter()
        .map(|t| match t.field(0) {
            Ok(Some(Field::Int(v))) => *v,
            other => panic!("unexpected field: {:?}", other),
        })
        .collect()
}

#[test]
fn test_load_and_scan_many_pages() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("numbers.dat");
    let config = StorageConfig::default()
        .with_page_size(256)
        .with_buffer_pool_frames(3);
    let schema = Arc::new(Schema::with_names(&[(FieldType::Int, "n")])?);

    let mut encoder = HeapFileEncoder::create(&path, schema.clone(), &config)?;
    encoder.append_tuples(ids(&schema, 0..1000))?;
    let pages = encoder.finish()?;
    assert!(pages > 3);

    let db = database(&config)?;
    let file = Arc::new(HeapFile::open(&path, schema, &config)?);
    db.catalog.add_table(file.clone(), "numbers");

    let tid = db.transactions.begin();
    let mut iter = file.iterator(tid, db.pool.clone());
    iter.open()?;
    let tuples = iter.tuples().collect::<Result<Vec<_>, _>>()?;
    assert_eq!(int_values(&tuples), (0..1000).collect::<Vec<_>>());
    assert!(db.pool.resident_pages() <= 3);

    // A second pass after rewind sees the same tuples in the same order
    iter.rewind()?;
    let again = iter.tuples().collect::<Result<Vec<_>, _>>()?;
    assert_eq!(again, tuples);
    let record_ids: Vec<_> = tuples.iter().map(|t| t.record_id()).collect();
    let record_ids_again: Vec<_> = again.iter().map(|t| t.record_id()).collect();
    assert_eq!(record_ids, record_ids_again);

    iter.close();
    db.transactions.commit(tid)?;
    Ok(())
}

#[test]
fn test_convert_and_scan_strings() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("people.dat");
    let config = StorageConfig::default();
    let schema = Arc::new(Schema::with_names(&[
        (FieldType::Int, "id"),
        (FieldType::String, "name"),
    ])?);

    let long_name = "x".repeat(300);
    let input = format!("1,ada\n2,{}\n3,  grace hopper \n", long_name);
    convert_text(Cursor::new(input), &path, schema.clone(), &config)?;

    let db = database(&config)?;
    let file = Arc::new(HeapFile::open(&path, schema, &config)?);
    db.catalog.add_table(file.clone(), "people");

    let tid = db.transactions.begin();
    let mut iter = file.iterator(tid, db.pool.clone());
    iter.open()?;
    let rows = iter
        .tuples()
        .map(|t| t.map(|t| t.to_string()))
        .collect::<Result<Vec<_>, _>>()?;

    // Strings longer than the fixed width are truncated on write
    let truncated = "x".repeat(128);
    assert_eq!(
        rows,
        vec![
            "1\tada".to_string(),
            format!("2\t{}", truncated),
            "3\tgrace hopper".to_string(),
        ]
    );
    Ok(())
}

#[test]
fn test_sparse_pages_are_skipped() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("sparse.dat");
    let config = StorageConfig::default();
    let schema = Arc::new(Schema::unnamed(vec![FieldType::Int, FieldType::Int])?);
    let tuple = |a, b| Tuple::from_fields(schema.clone(), vec![Field::Int(a), Field::Int(b)]);

    let mut encoder = HeapFileEncoder::create(&path, schema.clone(), &config)?;
    encoder.write_page(&[])?;
    encoder.write_page(&[None, Some(tuple(1, 1)?), None, Some(tuple(1, 3)?)])?;
    encoder.write_page(&[])?;
    encoder.write_page(&[])?;
    encoder.write_page(&[Some(tuple(4, 0)?)])?;
    encoder.write_page(&[])?;
    encoder.finish()?;

    let db = database(&config)?;
    let file = Arc::new(HeapFile::open(&path, schema, &config)?);
    db.catalog.add_table(file.clone(), "sparse");

    let tid = db.transactions.begin();
    let mut iter = file.iterator(tid, db.pool.clone());
    iter.open()?;

    let mut seen = Vec::new();
    while iter.has_next()? {
        let t = iter.next()?;
        let rid = t.record_id().expect("scanned tuples carry a record id");
        seen.push((rid.page_id.page_no, rid.slot));
    }
    assert_eq!(seen, vec![(1, 1), (1, 3), (4, 0)]);
    assert!(matches!(iter.next(), Err(IterationError::NoSuchElement)));
    Ok(())
}

#[test]
fn test_aborted_transaction_cannot_scan() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("t.dat");
    let config = StorageConfig::default();
    let schema = Arc::new(Schema::unnamed(vec![FieldType::Int])?);

    let mut encoder = HeapFileEncoder::create(&path, schema.clone(), &config)?;
    encoder.append_tuples(ids(&schema, 0..10))?;
    encoder.finish()?;

    let db = database(&config)?;
    let file = Arc::new(HeapFile::open(&path, schema, &config)?);
    db.catalog.add_table(file.clone(), "t");

    let tid = db.transactions.begin();
    db.transactions.abort(tid)?;

    let mut iter = file.iterator(tid, db.pool.clone());
    assert!(matches!(
        iter.open(),
        Err(IterationError::Storage(StorageError::TransactionAborted(_)))
    ));
    assert!(!iter.has_next()?);
    Ok(())
}

#[test]
fn test_concurrent_scans_share_pool() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("shared.dat");
    let config = StorageConfig::default()
        .with_page_size(128)
        .with_buffer_pool_frames(4);
    let schema = Arc::new(Schema::unnamed(vec![FieldType::Int])?);

    let mut encoder = HeapFileEncoder::create(&path, schema.clone(), &config)?;
    encoder.append_tuples(ids(&schema, 0..500))?;
    encoder.finish()?;

    let db = database(&config)?;
    let file = Arc::new(HeapFile::open(&path, schema, &config)?);
    db.catalog.add_table(file.clone(), "shared");

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let file = file.clone();
            let pool = db.pool.clone();
            let tid = db.transactions.begin();
            thread::spawn(move || -> Result<i64> {
                let mut iter = file.iterator(tid, pool);
                iter.open()?;
                let mut sum = 0i64;
                for tuple in iter.tuples() {
                    if let Some(Field::Int(v)) = tuple?.field(0)? {
                        sum += *v as i64;
                    }
                }
                Ok(sum)
            })
        })
        .collect();

    for handle in handles {
        let sum = handle.join().expect("scan thread panicked")?;
        assert_eq!(sum, (0..500i64).sum::<i64>());
    }
    assert!(db.pool.resident_pages() <= 4);
    Ok(())
}
