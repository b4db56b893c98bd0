//! heapdb - build and inspect heap files from the command line

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use heapdb::access::{DbFileIterator, FieldType, HeapFile, Schema};
use heapdb::catalog::Catalog;
use heapdb::config::{StorageConfig, DEFAULT_BUFFER_POOL_FRAMES, DEFAULT_PAGE_SIZE};
use heapdb::loader::convert_text;
use heapdb::storage::page::{HeapPage, PageId};
use heapdb::storage::BufferPoolManager;
use heapdb::transaction::TransactionManager;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// heapdb - read-only heap file storage
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert comma-separated text into a heap file
    Convert {
        /// Text file with one tuple per line
        input: PathBuf,

        /// Heap file to create
        output: PathBuf,

        #[command(flatten)]
        layout: Layout,
    },

    /// Print every tuple of a heap file
    Scan {
        file: PathBuf,

        #[command(flatten)]
        layout: Layout,

        /// Buffer pool size in pages
        #[arg(short, long, default_value_t = DEFAULT_BUFFER_POOL_FRAMES)]
        frames: usize,
    },

    /// Describe the pages of a heap file
    Info {
        file: PathBuf,

        #[command(flatten)]
        layout: Layout,
    },
}

#[derive(Args, Debug)]
struct Layout {
    /// Field types in order, e.g. int,string
    #[arg(short, long, value_delimiter = ',', required = true)]
    types: Vec<FieldType>,

    /// Page size in bytes
    #[arg(short, long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,
}

impl Layout {
    fn schema(&self) -> Result<Arc<Schema>> {
        let schema = Schema::unnamed(self.types.clone()).context("Invalid field types")?;
        Ok(Arc::new(schema))
    }

    fn config(&self) -> StorageConfig {
        StorageConfig::default().with_page_size(self.page_size)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Command::Convert {
            input,
            output,
            layout,
        } => convert(&input, &output, &layout),
        Command::Scan {
            file,
            layout,
            frames,
        } => scan(&file, &layout, frames),
        Command::Info { file, layout } => info(&file, &layout),
    }
}

fn convert(input: &Path, output: &Path, layout: &Layout) -> Result<()> {
    let reader = BufReader::new(
        File::open(input).with_context(|| format!("Failed to open {}", input.display()))?,
    );
    let summary = convert_text(reader, output, layout.schema()?, &layout.config())
        .with_context(|| format!("Failed to convert {}", input.display()))?;

    println!(
        "Wrote {} tuples in {} pages to {}",
        summary.tuples,
        summary.pages,
        output.display()
    );
    Ok(())
}

fn scan(path: &Path, layout: &Layout, frames: usize) -> Result<()> {
    let config = layout.config().with_buffer_pool_frames(frames);
    let file = Arc::new(
        HeapFile::open(path, layout.schema()?, &config)
            .with_context(|| format!("Failed to open {}", path.display()))?,
    );

    let catalog = Arc::new(Catalog::new());
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.id().to_string());
    catalog.add_table(file.clone(), &name);

    let transactions = Arc::new(TransactionManager::new());
    let pool = Arc::new(BufferPoolManager::new(catalog, transactions.clone(), &config)?);
    let tid = transactions.begin();

    let mut iter = file.iterator(tid, pool);
    iter.open().context("Failed to open scan")?;

    let mut out = std::io::stdout().lock();
    let mut count = 0usize;
    for tuple in iter.tuples() {
        writeln!(out, "{}", tuple?)?;
        count += 1;
    }
    iter.close();
    transactions.commit(tid)?;

    log::info!("Scanned {} tuples from {}", count, path.display());
    Ok(())
}

fn info(path: &Path, layout: &Layout) -> Result<()> {
    let schema = layout.schema()?;
    let config = layout.config();
    let file = HeapFile::open(path, schema.clone(), &config)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let num_pages = file.num_pages()?;

    println!("file:           {}", file.path().display());
    println!("table id:       {}", file.id());
    println!("schema:         {}", schema);
    println!("page size:      {}", file.page_size());
    println!("pages:          {}", num_pages);
    println!(
        "slots per page: {}",
        HeapPage::slots_per_page(file.page_size(), schema.byte_size())
    );

    let mut total = 0;
    for page_no in 0..num_pages {
        let page = file
            .read_page(PageId::new(file.id(), page_no))
            .with_context(|| format!("Failed to read page {}", page_no))?;
        println!("  page {:>6}: {} used", page_no, page.num_used_slots());
        total += page.num_used_slots();
    }
    println!("tuples:         {}", total);
    Ok(())
}
