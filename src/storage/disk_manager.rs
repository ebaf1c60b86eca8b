//! Disk Manager - low-level file I/O for database pages.
//!
//! The [`DiskManager`] handles all direct file operations:
//! - Reading and writing pages
//! - Managing the database file

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use log::{debug, trace};

use crate::common::config::PAGE_SIZE;
use crate::common::{PageId, Result};
use crate::storage::page::Page;

/// Manages disk I/O for a single database file.
///
/// # File Layout
/// The database is stored as a single file with pages laid out sequentially:
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │ Page 2  │  ...    │ Page N  │
/// │ (4KB)   │ (4KB)   │ (4KB)   │         │ (4KB)   │
/// └─────────┴─────────┴─────────┴─────────┴─────────┘
/// Offset:  0      4096     8192    ...    N×4096
/// ```
///
/// Page N is located at file offset `N × PAGE_SIZE`.
///
/// Page ids are allocated by the buffer pool manager, not here, so a page
/// may be read before it was ever written. Such reads yield a zeroed page:
/// the file simply hasn't grown that far yet.
///
/// # Thread Safety
/// `DiskManager` is **single-threaded**. The `BufferPoolManager` is responsible
/// for serializing access to the disk manager.
///
/// # Durability
/// All writes are followed by `fsync()` to ensure durability. This is
/// conservative; batching is a job for a smarter I/O layer.
pub struct DiskManager {
    file: File,
    /// Number of pages the file currently spans.
    page_capacity: u32,
}

impl DiskManager {
    /// Create a new database file.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)?;

        debug!("created database file {}", path.as_ref().display());

        Ok(Self {
            file,
            page_capacity: 0,
        })
    }

    /// Open an existing database file.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist or cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(&path)?;

        // Calculate page capacity from file size
        let metadata = file.metadata()?;
        let file_size = metadata.len();
        let page_capacity = file_size.div_ceil(PAGE_SIZE as u64) as u32;

        debug!(
            "opened database file {} ({} pages)",
            path.as_ref().display(),
            page_capacity
        );

        Ok(Self {
            file,
            page_capacity,
        })
    }

    /// Open an existing database file, or create if it doesn't exist.
    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    /// Read a page from disk into `page`.
    ///
    /// A page beyond the current end of the file reads as all zeroes; the
    /// buffer pool allocates ids before the first write-back, so this is a
    /// legitimate state, not an error.
    pub fn read_page(&mut self, page_id: PageId, page: &mut Page) -> Result<()> {
        let offset = (page_id.0 as u64) * (PAGE_SIZE as u64);
        let file_size = (self.page_capacity as u64) * (PAGE_SIZE as u64);

        if offset >= file_size {
            page.reset();
            return Ok(());
        }

        self.file.seek(SeekFrom::Start(offset))?;
        let avail = ((file_size - offset) as usize).min(PAGE_SIZE);
        self.file.read_exact(&mut page.as_mut_slice()[..avail])?;
        page.as_mut_slice()[avail..].fill(0);

        Ok(())
    }

    /// Write a page to disk, extending the file if necessary.
    ///
    /// # Durability
    /// This method calls `fsync()` after writing to ensure the data is
    /// persisted to disk.
    pub fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<()> {
        let offset = (page_id.0 as u64) * (PAGE_SIZE as u64);
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(page.as_slice())?;
        self.file.sync_all()?; // fsync for durability

        if page_id.0 >= self.page_capacity {
            self.page_capacity = page_id.0 + 1;
        }

        Ok(())
    }

    /// Mark a page as free at the storage layer.
    ///
    /// Page ids are never reused, so there is no free-space map to update;
    /// the region stays in the file until a compaction pass exists.
    pub fn deallocate_page(&mut self, page_id: PageId) {
        trace!("deallocate page {}", page_id);
    }

    /// Get the number of pages the file currently spans.
    #[inline]
    pub fn page_capacity(&self) -> u32 {
        self.page_capacity
    }

    /// Get the total size of the database file in bytes.
    #[inline]
    pub fn file_size(&self) -> u64 {
        (self.page_capacity as u64) * (PAGE_SIZE as u64)
    }
}
