//! RAII guards for page access.
//!
//! These guards provide safe access to pages in the buffer pool:
//! - [`BasicPageGuard`] - Holds only the pin; latches per access
//! - [`PageReadGuard`] - Shared read access (multiple allowed)
//! - [`PageWriteGuard`] - Exclusive write access (auto-marks dirty)
//!
//! All guards auto-unpin the page when dropped.

use std::ops::{Deref, DerefMut};

use parking_lot::{RwLockReadGuard, RwLockWriteGuard};

use crate::buffer::Frame;
use crate::common::PageId;
use crate::storage::page::Page;

use super::buffer_pool_manager::BufferPoolManager;

/// Unpins the page when dropped.
///
/// Declared as the *last* field of every guard: struct fields drop in
/// declaration order, so the page latch is released before the unpin
/// takes the buffer pool latch. A guard drop therefore never deadlocks
/// against a pool operation waiting on the page latch.
struct PinGuard<'a> {
    bpm: &'a BufferPoolManager,
    page_id: PageId,
    is_dirty: bool,
}

impl Drop for PinGuard<'_> {
    fn drop(&mut self) {
        self.bpm.unpin_page(self.page_id, self.is_dirty);
    }
}

/// Guard holding a pinned page without a page latch.
///
/// Access goes through [`page`](Self::page) / [`page_mut`](Self::page_mut),
/// which take the frame's latch for the duration of the borrow. Mutable
/// access marks the guard dirty; the drop propagates the accumulated flag.
///
/// # Example
/// ```ignore
/// let mut guard = bpm.fetch_page_basic(page_id)?.unwrap();
/// guard.page_mut().as_mut_slice()[0] = 0xFF;
/// // guard drops here: page unpinned with is_dirty = true
/// ```
pub struct BasicPageGuard<'a> {
    /// Frame holding this page.
    frame: &'a Frame,
    /// Unpin-on-drop; also accumulates the dirty flag.
    pin: PinGuard<'a>,
}

impl<'a> BasicPageGuard<'a> {
    /// Called by the guard-producing methods on [`BufferPoolManager`].
    pub(crate) fn new(bpm: &'a BufferPoolManager, frame: &'a Frame, page_id: PageId) -> Self {
        Self {
            frame,
            pin: PinGuard {
                bpm,
                page_id,
                is_dirty: false,
            },
        }
    }

    /// Get the page ID.
    #[inline]
    pub fn page_id(&self) -> PageId {
        self.pin.page_id
    }

    /// Read the page through the frame's read latch.
    #[inline]
    pub fn page(&self) -> RwLockReadGuard<'_, Page> {
        self.frame.page()
    }

    /// Write the page through the frame's write latch.
    ///
    /// Marks the guard dirty; the unpin on drop carries the flag.
    #[inline]
    pub fn page_mut(&mut self) -> RwLockWriteGuard<'_, Page> {
        self.pin.is_dirty = true;
        self.frame.page_mut()
    }

    /// Whether this guard will unpin with the dirty flag set.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.pin.is_dirty
    }
}

/// Guard for read-only page access.
///
/// Multiple `PageReadGuard`s can exist for the same page simultaneously.
/// Holds the frame's read latch; unpins clean when dropped.
///
/// # Example
/// ```ignore
/// let guard = bpm.fetch_page_read(page_id)?.unwrap();
/// let data = guard.as_slice();  // Deref to &Page
/// // guard drops here, latch released, page unpinned
/// ```
pub struct PageReadGuard<'a> {
    /// Page latch; must be declared before `pin` (drop order).
    lock: RwLockReadGuard<'a, Page>,
    pin: PinGuard<'a>,
}

impl<'a> PageReadGuard<'a> {
    /// Called by `BufferPoolManager::fetch_page_read()`.
    pub(crate) fn new(bpm: &'a BufferPoolManager, frame: &'a Frame, page_id: PageId) -> Self {
        Self {
            lock: frame.page(),
            pin: PinGuard {
                bpm,
                page_id,
                is_dirty: false,
            },
        }
    }

    /// Get the page ID.
    #[inline]
    pub fn page_id(&self) -> PageId {
        self.pin.page_id
    }
}

impl Deref for PageReadGuard<'_> {
    type Target = Page;

    #[inline]
    fn deref(&self) -> &Page {
        &self.lock
    }
}

/// Guard for exclusive write access to a page.
///
/// Only one `PageWriteGuard` can exist for a page at a time. Holds the
/// frame's write latch; unpins with the dirty flag set when dropped.
///
/// # Example
/// ```ignore
/// let mut guard = bpm.fetch_page_write(page_id)?.unwrap();
/// guard.as_mut_slice()[0] = 0xFF;  // DerefMut to &mut Page
/// // guard drops here, page marked dirty and unpinned
/// ```
pub struct PageWriteGuard<'a> {
    /// Page latch; must be declared before `pin` (drop order).
    lock: RwLockWriteGuard<'a, Page>,
    pin: PinGuard<'a>,
}

impl<'a> PageWriteGuard<'a> {
    /// Called by `BufferPoolManager::fetch_page_write()`.
    pub(crate) fn new(bpm: &'a BufferPoolManager, frame: &'a Frame, page_id: PageId) -> Self {
        Self {
            lock: frame.page_mut(),
            pin: PinGuard {
                bpm,
                page_id,
                is_dirty: true,
            },
        }
    }

    /// Get the page ID.
    #[inline]
    pub fn page_id(&self) -> PageId {
        self.pin.page_id
    }
}

impl Deref for PageWriteGuard<'_> {
    type Target = Page;

    #[inline]
    fn deref(&self) -> &Page {
        &self.lock
    }
}

impl DerefMut for PageWriteGuard<'_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Page {
        &mut self.lock
    }
}
