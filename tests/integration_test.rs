use anyhow::Result;
use heapstore::access::{Field, FieldType, HeapFile, Locator, Tuple, TupleDesc};
use heapstore::config::StorageConfig;
use heapstore::database::Database;
use heapstore::storage::{DbFile, PageId, PageStore, StorageError};
use std::sync::Arc;
use std::thread;
use tempfile::tempdir;

// (INT, CHAR) records are 68 bytes, so a 210-byte page holds three.
const PAGE_SIZE: usize = 210;

fn people() -> TupleDesc {
    TupleDesc::from_fields([(FieldType::Int, "id"), (FieldType::Char, "name")]).unwrap()
}

fn person(id: i32, name: &str) -> Tuple {
    Tuple::new(vec![Field::Int(id), Field::Char(name.to_string())])
}

fn scan_ids(heap: &HeapFile) -> Result<Vec<i32>> {
    let mut ids = Vec::new();
    for item in heap.iter() {
        let (_, tuple) = item?;
        match tuple.get(0) {
            Some(Field::Int(id)) => ids.push(*id),
            other => anyhow::bail!("unexpected id field {:?}", other),
        }
    }
    Ok(ids)
}

#[test]
fn test_insert_delete_scan_end_to_end() -> Result<()> {
    let dir = tempdir()?;
    let db = Database::new(StorageConfig::default().with_page_size(PAGE_SIZE));
    let heap = db.create_heap_file("people", &dir.path().join("people.dat"), people())?;
    assert_eq!(heap.capacity(), 3);

    let names = ["ada", "grace", "edsger", "barbara"];
    let mut locators = Vec::new();
    for (i, name) in names.iter().enumerate() {
        locators.push(heap.insert_tuple(&person(i as i32 + 1, name))?);
    }

    assert_eq!(heap.num_pages(), 2);
    assert_eq!(
        locators,
        vec![
            Locator::new(0, 0),
            Locator::new(0, 1),
            Locator::new(0, 2),
            Locator::new(1, 0),
        ]
    );

    heap.delete_tuple(locators[1])?;
    assert_eq!(scan_ids(&heap)?, vec![1, 3, 4]);

    let tuples: Vec<Tuple> = heap
        .iter()
        .map(|item| item.map(|(_, t)| t))
        .collect::<Result<_, _>>()?;
    assert_eq!(
        tuples,
        vec![
            person(1, "ada"),
            person(3, "edsger"),
            person(4, "barbara"),
        ]
    );
    Ok(())
}

#[test]
fn test_persistence_across_databases() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("people.dat");
    let config = StorageConfig::default()
        .with_page_size(PAGE_SIZE)
        .with_pool_pages(2);

    {
        let db = Database::new(config);
        let heap = db.create_heap_file("people", &path, people())?;
        for id in 1..=7 {
            heap.insert_tuple(&person(id, &format!("p{}", id)))?;
        }
        heap.delete_tuple(Locator::new(1, 1))?;
        // Dropping the database flushes whatever is still dirty
    }

    let db = Database::new(config);
    let heap = db.open_heap_file("people", &path, people())?;
    assert_eq!(heap.num_pages(), 3);
    assert_eq!(scan_ids(&heap)?, vec![1, 2, 3, 4, 6, 7]);
    assert_eq!(heap.get_tuple(Locator::new(2, 0))?, person(7, "p7"));
    Ok(())
}

#[test]
fn test_dirty_page_written_once_on_eviction() -> Result<()> {
    let dir = tempdir()?;
    let db = Database::new(
        StorageConfig::default()
            .with_page_size(PAGE_SIZE)
            .with_pool_pages(1),
    );
    let file = Arc::new(DbFile::create("f", &dir.path().join("f.dat"), PAGE_SIZE)?);
    file.allocate_page()?;
    file.allocate_page()?;
    db.add(file.clone())?;

    let pool = db.buffer_pool();
    let mut pool = pool.lock();
    pool.get_page(&PageId::new("f", 0))?[17] = 0xab;
    pool.mark_dirty(&PageId::new("f", 0))?;
    assert!(file.writes().is_empty());

    // Loading page 1 evicts page 0
    pool.get_page(&PageId::new("f", 1))?;
    assert_eq!(file.writes(), vec![0]);
    assert!(!pool.contains(&PageId::new("f", 0)));

    let mut buf = vec![0u8; PAGE_SIZE];
    file.read_page(0, &mut buf)?;
    assert_eq!(buf[17], 0xab);

    // Reloading a clean page and evicting it again writes nothing
    pool.get_page(&PageId::new("f", 0))?;
    pool.get_page(&PageId::new("f", 1))?;
    assert_eq!(file.writes(), vec![0]);
    Ok(())
}

#[test]
fn test_lru_evicts_least_recent() -> Result<()> {
    let dir = tempdir()?;
    let db = Database::new(
        StorageConfig::default()
            .with_page_size(PAGE_SIZE)
            .with_pool_pages(3),
    );
    let file = Arc::new(DbFile::create("f", &dir.path().join("f.dat"), PAGE_SIZE)?);
    for _ in 0..4 {
        file.allocate_page()?;
    }
    db.add(file)?;

    let pool = db.buffer_pool();
    let mut pool = pool.lock();
    for page in [0, 1, 2, 0, 3] {
        pool.get_page(&PageId::new("f", page))?;
    }

    assert!(pool.contains(&PageId::new("f", 0)));
    assert!(!pool.contains(&PageId::new("f", 1)));
    assert!(pool.contains(&PageId::new("f", 2)));
    assert!(pool.contains(&PageId::new("f", 3)));
    assert_eq!(pool.len(), 3);
    Ok(())
}

#[test]
fn test_discard_semantics() -> Result<()> {
    let dir = tempdir()?;
    let db = Database::new(StorageConfig::default().with_page_size(PAGE_SIZE));
    let file = Arc::new(DbFile::create("f", &dir.path().join("f.dat"), PAGE_SIZE)?);
    file.allocate_page()?;
    file.allocate_page()?;
    db.add(file.clone())?;

    let pool = db.buffer_pool();
    let mut pool = pool.lock();

    // Discarding a dirty page drops the modification
    pool.get_page(&PageId::new("f", 0))?[0] = 1;
    pool.mark_dirty(&PageId::new("f", 0))?;
    pool.discard_page(&PageId::new("f", 0))?;
    assert!(file.writes().is_empty());

    // Flush then discard writes exactly once
    pool.get_page(&PageId::new("f", 1))?[0] = 2;
    pool.mark_dirty(&PageId::new("f", 1))?;
    pool.flush_page(&PageId::new("f", 1))?;
    pool.discard_page(&PageId::new("f", 1))?;
    pool.flush_all()?;
    assert_eq!(file.writes(), vec![1]);

    let mut buf = vec![0u8; PAGE_SIZE];
    file.read_page(0, &mut buf)?;
    assert_eq!(buf[0], 0);
    file.read_page(1, &mut buf)?;
    assert_eq!(buf[0], 2);
    Ok(())
}

#[test]
fn test_remove_file_from_database() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("people.dat");
    let db = Database::new(StorageConfig::default().with_page_size(PAGE_SIZE));
    let heap = db.create_heap_file("people", &path, people())?;
    heap.insert_tuple(&person(1, "ada"))?;

    db.remove("people")?;
    assert!(matches!(
        heap.get_tuple(Locator::new(0, 0)),
        Err(StorageError::NameNotFound(_))
    ));

    // The pending insert reached the disk before the file was unregistered
    let heap = db.open_heap_file("people", &path, people())?;
    assert_eq!(scan_ids(&heap)?, vec![1]);
    Ok(())
}

#[test]
fn test_concurrent_inserts() -> Result<()> {
    let dir = tempdir()?;
    let db = Database::new(
        StorageConfig::default()
            .with_page_size(PAGE_SIZE)
            .with_pool_pages(4),
    );
    let heap = Arc::new(db.create_heap_file("people", &dir.path().join("people.dat"), people())?);

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let heap = heap.clone();
            thread::spawn(move || -> Result<()> {
                for i in 0..25 {
                    heap.insert_tuple(&person(t * 100 + i, "worker"))?;
                }
                Ok(())
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("insert thread panicked")?;
    }

    let mut ids = scan_ids(&heap)?;
    ids.sort();
    let mut expected: Vec<i32> = (0..4).flat_map(|t| (0..25).map(move |i| t * 100 + i)).collect();
    expected.sort();
    assert_eq!(ids, expected);
    assert_eq!(heap.num_pages(), 34);
    Ok(())
}
