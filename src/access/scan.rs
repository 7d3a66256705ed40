//! Sequential scans over heap files.

use crate::access::heap::HeapFile;
use crate::access::tuple::{Locator, Tuple};
use crate::storage::error::StorageResult;

/// Forward-only iterator over every tuple of a heap file, in page then slot order.
///
/// Built on `HeapFile::begin`, `advance` and `end`; the buffer pool lock is taken per
/// step, never held between items. An error ends the scan.
pub struct HeapScan<'a> {
    file: &'a HeapFile,
    cursor: Option<Locator>,
    done: bool,
}

impl<'a> HeapScan<'a> {
    pub fn new(file: &'a HeapFile) -> Self {
        Self {
            file,
            cursor: None,
            done: false,
        }
    }

    fn try_next(&mut self) -> StorageResult<Option<(Locator, Tuple)>> {
        if self.done {
            return Ok(None);
        }

        let locator = match self.cursor {
            None => self.file.begin()?,
            Some(mut locator) => {
                self.file.advance(&mut locator)?;
                locator
            }
        };
        self.cursor = Some(locator);

        if locator == self.file.end() {
            self.done = true;
            return Ok(None);
        }
        let tuple = self.file.get_tuple(locator)?;
        Ok(Some((locator, tuple)))
    }
}

impl Iterator for HeapScan<'_> {
    type Item = StorageResult<(Locator, Tuple)>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.try_next() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => None,
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::schema::TupleDesc;
    use crate::access::value::{Field, FieldType};
    use crate::config::StorageConfig;
    use crate::database::Database;
    use crate::storage::error::StorageError;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn test_scan_yields_locators_and_tuples() -> Result<()> {
        let dir = tempdir()?;
        let db = Database::new(StorageConfig::default());
        let desc = TupleDesc::from_fields([(FieldType::Double, "x")])?;
        let heap = db.create_heap_file("points", &dir.path().join("points.dat"), desc)?;

        let mut expected = Vec::new();
        for i in 0..5 {
            let tuple = Tuple::new(vec![Field::Double(i as f64 / 2.0)]);
            expected.push((heap.insert_tuple(&tuple)?, tuple));
        }

        let scanned = heap.iter().collect::<StorageResult<Vec<_>>>()?;
        assert_eq!(scanned, expected);
        Ok(())
    }

    #[test]
    fn test_scan_is_fused() -> Result<()> {
        let dir = tempdir()?;
        let db = Database::new(StorageConfig::default());
        let desc = TupleDesc::from_fields([(FieldType::Int, "n")])?;
        let heap = db.create_heap_file("n", &dir.path().join("n.dat"), desc)?;
        heap.insert_tuple(&Tuple::new(vec![Field::Int(1)]))?;

        let mut scan = heap.iter();
        assert!(scan.next().is_some());
        assert!(scan.next().is_none());
        assert!(scan.next().is_none());
        Ok(())
    }

    #[test]
    fn test_scan_stops_after_error() -> Result<()> {
        let dir = tempdir()?;
        let db = Database::new(StorageConfig::default());
        let desc = TupleDesc::from_fields([(FieldType::Int, "n")])?;
        let heap = db.create_heap_file("n", &dir.path().join("n.dat"), desc)?;
        for n in 0..3 {
            heap.insert_tuple(&Tuple::new(vec![Field::Int(n)]))?;
        }
        db.remove("n")?;

        let mut scan = heap.iter();
        assert!(matches!(
            scan.next(),
            Some(Err(StorageError::NameNotFound(_)))
        ));
        assert!(scan.next().is_none());
        assert!(scan.next().is_none());
        Ok(())
    }
}
