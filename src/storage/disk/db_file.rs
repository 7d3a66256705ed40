use crate::storage::disk::PageStore;
use crate::storage::error::{StorageError, StorageResult};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// A page store backed by a single OS file whose size is a multiple of the page size.
///
/// Every read and write is recorded by page number, so callers can observe exactly
/// which I/O the buffer pool issued.
#[derive(Debug)]
pub struct DbFile {
    name: String,
    page_size: usize,
    inner: Mutex<DbFileInner>,
}

#[derive(Debug)]
struct DbFileInner {
    file: File,
    page_count: usize,
    reads: Vec<usize>,
    writes: Vec<usize>,
}

impl DbFile {
    /// Create `path`, truncating any existing contents.
    pub fn create(name: impl Into<String>, path: &Path, page_size: usize) -> StorageResult<Self> {
        check_page_size(page_size)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        Ok(Self::from_file(name.into(), file, page_size, 0))
    }

    /// Open `path`, creating it if missing. The page count is derived from the file size.
    pub fn open(name: impl Into<String>, path: &Path, page_size: usize) -> StorageResult<Self> {
        check_page_size(page_size)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let page_count = (file.metadata()?.len() / page_size as u64) as usize;

        Ok(Self::from_file(name.into(), file, page_size, page_count))
    }

    fn from_file(name: String, file: File, page_size: usize, page_count: usize) -> Self {
        Self {
            name,
            page_size,
            inner: Mutex::new(DbFileInner {
                file,
                page_count,
                reads: Vec::new(),
                writes: Vec::new(),
            }),
        }
    }

    /// Page numbers read so far, in order.
    pub fn reads(&self) -> Vec<usize> {
        self.inner.lock().reads.clone()
    }

    /// Page numbers written so far, in order.
    pub fn writes(&self) -> Vec<usize> {
        self.inner.lock().writes.clone()
    }

    fn check_len(&self, len: usize) -> StorageResult<()> {
        if len != self.page_size {
            return Err(StorageError::PageSizeMismatch {
                expected: self.page_size,
                actual: len,
            });
        }
        Ok(())
    }

    fn check_page(&self, page: usize, page_count: usize) -> StorageResult<()> {
        if page >= page_count {
            return Err(StorageError::PageOutOfBounds {
                file: self.name.clone(),
                page,
                page_count,
            });
        }
        Ok(())
    }

    fn offset(&self, page: usize) -> u64 {
        page as u64 * self.page_size as u64
    }
}

fn check_page_size(page_size: usize) -> StorageResult<()> {
    if page_size == 0 {
        return Err(StorageError::InvalidPageSize(page_size));
    }
    Ok(())
}

impl PageStore for DbFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    fn page_count(&self) -> usize {
        self.inner.lock().page_count
    }

    fn read_page(&self, page: usize, buf: &mut [u8]) -> StorageResult<()> {
        self.check_len(buf.len())?;
        let mut inner = self.inner.lock();
        self.check_page(page, inner.page_count)?;

        inner.reads.push(page);
        inner.file.seek(SeekFrom::Start(self.offset(page)))?;
        inner.file.read_exact(buf)?;
        Ok(())
    }

    fn write_page(&self, page: usize, data: &[u8]) -> StorageResult<()> {
        self.check_len(data.len())?;
        let mut inner = self.inner.lock();
        self.check_page(page, inner.page_count)?;

        inner.writes.push(page);
        inner.file.seek(SeekFrom::Start(self.offset(page)))?;
        inner.file.write_all(data)?;
        inner.file.sync_data()?;
        Ok(())
    }

    fn allocate_page(&self) -> StorageResult<usize> {
        let mut inner = self.inner.lock();
        let page = inner.page_count;
        inner.file.set_len(self.offset(page + 1))?;
        inner.page_count += 1;
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    const PS: usize = 256;

    #[test]
    fn test_create_and_open() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("t.dat");

        {
            let file = DbFile::create("t", &path, PS)?;
            assert_eq!(file.page_count(), 0);
            file.allocate_page()?;
            file.allocate_page()?;
        }

        let file = DbFile::open("t", &path, PS)?;
        assert_eq!(file.name(), "t");
        assert_eq!(file.page_count(), 2);
        Ok(())
    }

    #[test]
    fn test_allocate_is_zeroed() -> Result<()> {
        let dir = tempdir()?;
        let file = DbFile::create("t", &dir.path().join("t.dat"), PS)?;

        assert_eq!(file.allocate_page()?, 0);
        assert_eq!(file.allocate_page()?, 1);

        let mut buf = vec![0xFFu8; PS];
        file.read_page(1, &mut buf)?;
        assert!(buf.iter().all(|&b| b == 0));
        Ok(())
    }

    #[test]
    fn test_write_and_read_page() -> Result<()> {
        let dir = tempdir()?;
        let file = DbFile::create("t", &dir.path().join("t.dat"), PS)?;
        file.allocate_page()?;
        file.allocate_page()?;

        let mut data = vec![0u8; PS];
        data[0] = 42;
        data[PS - 1] = 24;
        file.write_page(1, &data)?;

        let mut buf = vec![0u8; PS];
        file.read_page(1, &mut buf)?;
        assert_eq!(buf, data);

        // Adjacent page untouched
        file.read_page(0, &mut buf)?;
        assert!(buf.iter().all(|&b| b == 0));

        assert_eq!(file.writes(), vec![1]);
        assert_eq!(file.reads(), vec![1, 0]);
        Ok(())
    }

    #[test]
    fn test_out_of_bounds() -> Result<()> {
        let dir = tempdir()?;
        let file = DbFile::create("t", &dir.path().join("t.dat"), PS)?;

        let mut buf = vec![0u8; PS];
        assert!(matches!(
            file.read_page(0, &mut buf),
            Err(StorageError::PageOutOfBounds { page: 0, page_count: 0, .. })
        ));
        assert!(file.write_page(3, &buf).is_err());
        assert!(file.reads().is_empty());
        Ok(())
    }

    #[test]
    fn test_invalid_buffer_size() -> Result<()> {
        let dir = tempdir()?;
        let file = DbFile::create("t", &dir.path().join("t.dat"), PS)?;
        file.allocate_page()?;

        let mut small = vec![0u8; 100];
        assert!(matches!(
            file.read_page(0, &mut small),
            Err(StorageError::PageSizeMismatch { expected: PS, actual: 100 })
        ));
        assert!(file.write_page(0, &small).is_err());
        Ok(())
    }

    #[test]
    fn test_zero_page_size() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("t.dat");
        std::fs::write(&path, [7u8; 16])?;

        assert!(matches!(
            DbFile::open("t", &path, 0),
            Err(StorageError::InvalidPageSize(0))
        ));
        assert!(matches!(
            DbFile::create("t", &path, 0),
            Err(StorageError::InvalidPageSize(0))
        ));
        // Rejected before the existing file was truncated
        assert_eq!(std::fs::metadata(&path)?.len(), 16);
        Ok(())
    }

    #[test]
    fn test_persistence() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("t.dat");

        {
            let file = DbFile::create("t", &path, PS)?;
            file.allocate_page()?;
            file.write_page(0, &vec![99u8; PS])?;
        }

        let file = DbFile::open("t", &path, PS)?;
        let mut buf = vec![0u8; PS];
        file.read_page(0, &mut buf)?;
        assert_eq!(buf[0], 99);
        Ok(())
    }
}
