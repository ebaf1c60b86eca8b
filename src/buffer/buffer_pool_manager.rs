//! Buffer Pool Manager - the core page caching layer.
//!
//! The [`BufferPoolManager`] provides:
//! - Page caching between disk and memory
//! - Pin-based reference counting
//! - Automatic dirty page write-back
//! - LRU-K eviction

use std::collections::HashMap;
use std::sync::atomic::Ordering;

use log::debug;
use parking_lot::Mutex;

use crate::buffer::replacer::LruKReplacer;
use crate::buffer::{BasicPageGuard, BufferPoolStats, Frame, PageReadGuard, PageWriteGuard};
use crate::common::{FrameId, PageId, Result};
use crate::recovery::LogManager;
use crate::storage::DiskManager;

/// Bookkeeping state behind the buffer pool latch.
struct PoolState {
    /// Maps page IDs to frame IDs. Membership means the page is resident.
    page_table: HashMap<PageId, FrameId>,

    /// Stack of free frame IDs (LIFO for cache locality).
    free_list: Vec<FrameId>,

    /// The next page id to hand out. Monotonic, never reused.
    next_page_id: u32,
}

/// Manages a pool of buffer frames for caching disk pages.
///
/// # Architecture
/// ```text
/// ┌─────────────────────────────────────────────────────────────┐
/// │                    BufferPoolManager                        │
/// │  ┌──────────────┐  ┌───────────────────────────────────┐   │
/// │  │ page_table   │  │        frames: Vec<Frame>         │   │
/// │  │PageId → Fid  │─▶│  [Frame0] [Frame1] [Frame2] ...   │   │
/// │  └──────────────┘  └───────────────────────────────────┘   │
/// │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐      │
/// │  │  free_list   │  │   replacer   │  │disk_manager  │      │
/// │  │ Vec<FrameId> │  │ LruKReplacer │  │   Mutex      │      │
/// │  └──────────────┘  └──────────────┘  └──────────────┘      │
/// └─────────────────────────────────────────────────────────────┘
/// ```
///
/// # Thread Safety
/// One latch (`latch`) serializes every public operation for its full
/// duration, blocking disk I/O included. The replacer and disk manager
/// have their own inner mutexes, only ever taken while the latch is held.
/// Per-frame page latches (held by guards) are independent: the pool
/// only touches a frame's data when it is unpinned or when flushing, so
/// guard holders and the pool never form a lock cycle.
///
/// # Pinning discipline
/// Every successful `new_page`/`fetch_page` must be matched by exactly
/// one `unpin_page`. Guards do this automatically on drop.
///
/// # Usage
/// ```ignore
/// let dm = DiskManager::create("test.db")?;
/// let bpm = BufferPoolManager::new(10, 2, dm);
///
/// // Allocate a new page
/// let mut guard = bpm.new_page_guarded()?.unwrap();
/// guard.page_mut().as_mut_slice()[0] = 0xAB;
/// // guard drops: page marked dirty, unpinned
/// ```
pub struct BufferPoolManager {
    /// Fixed pool of frames allocated at startup.
    frames: Vec<Frame>,

    /// Page table, free list, and page id allocator. This is the latch.
    latch: Mutex<PoolState>,

    /// Eviction policy for selecting victim frames. Strictly inner lock.
    replacer: Mutex<LruKReplacer>,

    /// Handles all disk I/O. Strictly inner lock.
    disk_manager: Mutex<DiskManager>,

    /// Opaque recovery collaborator; carried for construction parity with
    /// the rest of the system, unused by the caching logic itself.
    log_manager: Option<LogManager>,

    /// Performance statistics.
    stats: BufferPoolStats,

    /// Number of frames in the pool (immutable after construction).
    pool_size: usize,
}

impl BufferPoolManager {
    /// Create a new buffer pool manager.
    ///
    /// # Arguments
    /// * `pool_size` - Number of frames in the pool
    /// * `replacer_k` - The K of the LRU-K replacer
    /// * `disk_manager` - Handles disk I/O
    ///
    /// # Panics
    /// Panics if `pool_size` is 0 or `replacer_k` is 0.
    pub fn new(pool_size: usize, replacer_k: usize, disk_manager: DiskManager) -> Self {
        Self::build(pool_size, replacer_k, disk_manager, None)
    }

    /// Create a buffer pool manager wired to a log manager.
    pub fn with_log_manager(
        pool_size: usize,
        replacer_k: usize,
        disk_manager: DiskManager,
        log_manager: LogManager,
    ) -> Self {
        Self::build(pool_size, replacer_k, disk_manager, Some(log_manager))
    }

    fn build(
        pool_size: usize,
        replacer_k: usize,
        disk_manager: DiskManager,
        log_manager: Option<LogManager>,
    ) -> Self {
        assert!(pool_size > 0, "pool_size must be > 0");

        // Allocate all frames upfront
        let frames: Vec<Frame> = (0..pool_size).map(|_| Frame::new()).collect();

        // All frames start on the free list (LIFO order)
        let free_list: Vec<FrameId> = (0..pool_size).map(FrameId::new).collect();

        Self {
            frames,
            latch: Mutex::new(PoolState {
                page_table: HashMap::new(),
                free_list,
                next_page_id: 0,
            }),
            replacer: Mutex::new(LruKReplacer::new(pool_size, replacer_k)),
            disk_manager: Mutex::new(disk_manager),
            log_manager,
            stats: BufferPoolStats::new(),
            pool_size,
        }
    }

    // ========================================================================
    // Public API: Create and fetch pages
    // ========================================================================

    /// Allocate a new page and pin it into a frame.
    ///
    /// The page id is allocated only once a frame has been secured, so a
    /// call that returns `Ok(None)` (pool fully pinned) consumes nothing.
    /// The frame data is zeroed and the page starts with pin count 1.
    ///
    /// # Errors
    /// I/O errors from writing back an evicted dirty page.
    pub fn new_page(&self) -> Result<Option<(PageId, &Frame)>> {
        let mut state = self.latch.lock();

        let frame_id = match self.acquire_frame(&mut state)? {
            Some(fid) => fid,
            None => return Ok(None),
        };

        let page_id = PageId::new(state.next_page_id);
        state.next_page_id += 1;

        let frame = &self.frames[frame_id.0];
        frame.page_mut().reset();
        frame.set_page_id(Some(page_id));
        frame.pin();

        state.page_table.insert(page_id, frame_id);

        let mut replacer = self.replacer.lock();
        replacer.record_access(frame_id);
        replacer.set_evictable(frame_id, false);

        Ok(Some((page_id, frame)))
    }

    /// Fetch a page, loading it from disk on a miss.
    ///
    /// Returns `Ok(None)` when the page is not resident and every frame is
    /// pinned. On success the page is pinned; the caller owes one
    /// [`unpin_page`](Self::unpin_page).
    ///
    /// # Errors
    /// I/O errors from the disk read or from writing back an evicted
    /// dirty page.
    pub fn fetch_page(&self, page_id: PageId) -> Result<Option<&Frame>> {
        let mut state = self.latch.lock();

        // Fast path: the page is already resident
        if let Some(&frame_id) = state.page_table.get(&page_id) {
            let frame = &self.frames[frame_id.0];
            frame.pin();

            let mut replacer = self.replacer.lock();
            replacer.record_access(frame_id);
            replacer.set_evictable(frame_id, false);

            self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Some(frame));
        }

        self.stats.cache_misses.fetch_add(1, Ordering::Relaxed);

        let frame_id = match self.acquire_frame(&mut state)? {
            Some(fid) => fid,
            None => return Ok(None),
        };

        let frame = &self.frames[frame_id.0];
        let read_result = {
            let mut page = frame.page_mut();
            self.disk_manager.lock().read_page(page_id, &mut page)
        };
        if let Err(e) = read_result {
            // The frame is empty and untracked at this point; hand it back
            state.free_list.push(frame_id);
            return Err(e);
        }
        self.stats.pages_read.fetch_add(1, Ordering::Relaxed);

        frame.set_page_id(Some(page_id));
        frame.pin();

        state.page_table.insert(page_id, frame_id);

        let mut replacer = self.replacer.lock();
        replacer.record_access(frame_id);
        replacer.set_evictable(frame_id, false);

        Ok(Some(frame))
    }

    // ========================================================================
    // Public API: Unpin, flush, delete
    // ========================================================================

    /// Unpin a page, optionally marking it dirty.
    ///
    /// Returns `false` if the page is not resident or its pin count is
    /// already 0. The dirty flag only ever accumulates here; a clean
    /// unpin never clears a previous writer's mark.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool {
        let state = self.latch.lock();

        let frame_id = match state.page_table.get(&page_id) {
            Some(&fid) => fid,
            None => return false,
        };

        let frame = &self.frames[frame_id.0];
        if frame.pin_count() == 0 {
            return false;
        }

        if is_dirty {
            frame.mark_dirty();
        }

        if frame.unpin() == 0 {
            self.replacer.lock().set_evictable(frame_id, true);
        }

        true
    }

    /// Flush a page to disk, dirty or not, and clear its dirty flag.
    ///
    /// Returns `false` for the INVALID sentinel or a non-resident page.
    /// Unconditional by contract; [`flush_all_pages`](Self::flush_all_pages)
    /// is the one that skips clean pages.
    ///
    /// # Errors
    /// I/O errors from the disk write.
    pub fn flush_page(&self, page_id: PageId) -> Result<bool> {
        let state = self.latch.lock();

        if !page_id.is_valid() {
            return Ok(false);
        }
        let frame_id = match state.page_table.get(&page_id) {
            Some(&fid) => fid,
            None => return Ok(false),
        };

        self.flush_frame(frame_id, page_id)?;
        Ok(true)
    }

    /// Flush every dirty resident page to disk.
    ///
    /// # Errors
    /// I/O errors from disk writes.
    pub fn flush_all_pages(&self) -> Result<()> {
        let state = self.latch.lock();

        for (&page_id, &frame_id) in state.page_table.iter() {
            if self.frames[frame_id.0].is_dirty() {
                self.flush_frame(frame_id, page_id)?;
            }
        }

        Ok(())
    }

    /// Delete a page from the buffer pool and deallocate it on disk.
    ///
    /// Returns `true` if the page was not resident (nothing to do) or was
    /// successfully deleted; `false` if it is still pinned.
    ///
    /// # Errors
    /// I/O errors from writing back a dirty page.
    pub fn delete_page(&self, page_id: PageId) -> Result<bool> {
        let mut state = self.latch.lock();

        let frame_id = match state.page_table.get(&page_id) {
            Some(&fid) => fid,
            None => return Ok(true),
        };

        let frame = &self.frames[frame_id.0];
        if frame.is_pinned() {
            return Ok(false);
        }

        if frame.is_dirty() {
            self.flush_frame(frame_id, page_id)?;
        }

        state.page_table.remove(&page_id);
        frame.reset();
        self.replacer.lock().remove(frame_id);
        state.free_list.push(frame_id);

        let mut dm = self.disk_manager.lock();
        dm.deallocate_page(page_id);

        debug!("deleted page {} from frame {}", page_id, frame_id);
        Ok(true)
    }

    // ========================================================================
    // Public API: Guarded variants
    // ========================================================================

    /// Allocate a new page and return it behind a basic guard.
    pub fn new_page_guarded(&self) -> Result<Option<BasicPageGuard<'_>>> {
        let page = self.new_page()?;
        Ok(page.map(|(page_id, frame)| BasicPageGuard::new(self, frame, page_id)))
    }

    /// Fetch a page behind a basic (unlatched) guard.
    pub fn fetch_page_basic(&self, page_id: PageId) -> Result<Option<BasicPageGuard<'_>>> {
        let frame = self.fetch_page(page_id)?;
        Ok(frame.map(|frame| BasicPageGuard::new(self, frame, page_id)))
    }

    /// Fetch a page for reading (shared access).
    ///
    /// The returned guard holds the page's read latch until dropped.
    pub fn fetch_page_read(&self, page_id: PageId) -> Result<Option<PageReadGuard<'_>>> {
        let frame = self.fetch_page(page_id)?;
        Ok(frame.map(|frame| PageReadGuard::new(self, frame, page_id)))
    }

    /// Fetch a page for writing (exclusive access).
    ///
    /// The returned guard holds the page's write latch until dropped and
    /// marks the page dirty on unpin.
    pub fn fetch_page_write(&self, page_id: PageId) -> Result<Option<PageWriteGuard<'_>>> {
        let frame = self.fetch_page(page_id)?;
        Ok(frame.map(|frame| PageWriteGuard::new(self, frame, page_id)))
    }

    // ========================================================================
    // Public API: Introspection
    // ========================================================================

    /// Get buffer pool statistics.
    pub fn stats(&self) -> &BufferPoolStats {
        &self.stats
    }

    /// Get the pool size.
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Get the number of free frames.
    pub fn free_frame_count(&self) -> usize {
        self.latch.lock().free_list.len()
    }

    /// Get the number of resident pages.
    pub fn resident_page_count(&self) -> usize {
        self.latch.lock().page_table.len()
    }

    /// Get the pin count of a resident page, or `None` if not resident.
    pub fn get_pin_count(&self, page_id: PageId) -> Option<u32> {
        let state = self.latch.lock();
        state
            .page_table
            .get(&page_id)
            .map(|&fid| self.frames[fid.0].pin_count())
    }

    /// The log manager this pool was constructed with, if any.
    pub fn log_manager(&self) -> Option<&LogManager> {
        self.log_manager.as_ref()
    }

    // ========================================================================
    // Internal: Frame allocation and eviction
    // ========================================================================

    /// Secure an empty frame: free list first, then eviction.
    ///
    /// An evicted victim is written back if dirty and unlinked from the
    /// page table. The returned frame has no page id and clean state.
    fn acquire_frame(&self, state: &mut PoolState) -> Result<Option<FrameId>> {
        if let Some(frame_id) = state.free_list.pop() {
            return Ok(Some(frame_id));
        }

        let frame_id = match self.replacer.lock().evict() {
            Some(fid) => fid,
            None => return Ok(None),
        };

        let frame = &self.frames[frame_id.0];
        if let Some(old_page_id) = frame.page_id() {
            if frame.is_dirty() {
                debug!("evicting dirty page {} from frame {}", old_page_id, frame_id);
                if let Err(e) = self.flush_frame(frame_id, old_page_id) {
                    // Write-back failed: the victim page is still resident
                    // and intact, so put the frame back under the replacer
                    let mut replacer = self.replacer.lock();
                    replacer.record_access(frame_id);
                    replacer.set_evictable(frame_id, true);
                    return Err(e);
                }
            }
            state.page_table.remove(&old_page_id);
        }
        frame.set_page_id(None);
        frame.clear_dirty();
        self.stats.evictions.fetch_add(1, Ordering::Relaxed);

        Ok(Some(frame_id))
    }

    /// Write a frame's page to disk and clear its dirty flag.
    ///
    /// Takes the frame's read latch for the duration of the write, so a
    /// concurrent write-guard holder delays the flush rather than racing it.
    fn flush_frame(&self, frame_id: FrameId, page_id: PageId) -> Result<()> {
        let frame = &self.frames[frame_id.0];

        {
            let page = frame.page();
            self.disk_manager.lock().write_page(page_id, &page)?;
        }

        frame.clear_dirty();
        self.stats.pages_written.fetch_add(1, Ordering::Relaxed);

        Ok(())
    }
}
