//! heapstore - inspect and edit a heap file from the command line

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use heapstore::access::{Field, HeapFile, Locator, Tuple, TupleDesc};
use heapstore::config::StorageConfig;
use heapstore::database::Database;
use heapstore::storage::{DEFAULT_NUM_PAGES, PAGE_SIZE};
use log::info;
use std::path::PathBuf;

/// heapstore - fixed-width heap file tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Heap file to operate on (created if missing)
    #[arg(short, long)]
    file: PathBuf,

    /// Row schema, e.g. "id:int,name:char"
    #[arg(short, long)]
    schema: String,

    /// Page size in bytes
    #[arg(long, default_value_t = PAGE_SIZE)]
    page_size: usize,

    /// Pages kept resident in the buffer pool
    #[arg(long, default_value_t = DEFAULT_NUM_PAGES)]
    pool_pages: usize,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Insert one row; values follow schema order
    Insert { values: Vec<String> },
    /// Print the row at (page, slot)
    Get { page: usize, slot: usize },
    /// Delete the row at (page, slot)
    Delete { page: usize, slot: usize },
    /// Print every row
    Scan,
    /// Print file layout and row count
    Info,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let desc = TupleDesc::parse(&args.schema).context("Invalid schema")?;
    let name = args
        .file
        .file_stem()
        .and_then(|s| s.to_str())
        .context("File path has no usable name")?
        .to_string();

    let config = StorageConfig::default()
        .with_page_size(args.page_size)
        .with_pool_pages(args.pool_pages);
    let db = Database::new(config);
    let heap = db
        .open_heap_file(&name, &args.file, desc)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;
    info!(
        "Opened '{}': {} pages, {} slots per page",
        heap.name(),
        heap.num_pages(),
        heap.capacity()
    );

    run(&heap, args.command)?;

    db.flush().context("Failed to flush")?;
    Ok(())
}

fn run(heap: &HeapFile, command: Command) -> Result<()> {
    match command {
        Command::Insert { values } => {
            let tuple = parse_row(heap.tuple_desc(), &values)?;
            let locator = heap.insert_tuple(&tuple).context("Insert failed")?;
            println!("{}", locator);
        }
        Command::Get { page, slot } => {
            let tuple = heap
                .get_tuple(Locator::new(page, slot))
                .context("Lookup failed")?;
            println!("{}", tuple);
        }
        Command::Delete { page, slot } => {
            heap.delete_tuple(Locator::new(page, slot))
                .context("Delete failed")?;
            println!("deleted {}", Locator::new(page, slot));
        }
        Command::Scan => {
            println!("{}", heap.tuple_desc().names().join(" | "));
            for item in heap.iter() {
                let (locator, tuple) = item.context("Scan failed")?;
                println!("{}  {}", locator, tuple);
            }
        }
        Command::Info => {
            let desc = heap.tuple_desc();
            let mut rows = 0;
            for item in heap.iter() {
                item.context("Scan failed")?;
                rows += 1;
            }
            println!("file:          {}", heap.name());
            println!("record length: {} bytes", desc.length());
            println!("slots/page:    {}", heap.capacity());
            println!("pages:         {}", heap.num_pages());
            println!("rows:          {}", rows);
        }
    }
    Ok(())
}

fn parse_row(desc: &TupleDesc, values: &[String]) -> Result<Tuple> {
    if values.len() != desc.size() {
        bail!(
            "Expected {} values ({}), got {}",
            desc.size(),
            desc.names().join(", "),
            values.len()
        );
    }

    let fields = desc
        .types()
        .iter()
        .zip(values)
        .map(|(ty, text)| Field::parse(*ty, text))
        .collect::<Result<Vec<_>, _>>()
        .context("Invalid value")?;
    Ok(Tuple::new(fields))
}
