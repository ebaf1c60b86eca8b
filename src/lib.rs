//! chalkdb - the storage-engine foundation of an instructional database.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           chalkdb                               │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │        Index Layer (index/)                              │   │
//! │  │        Copy-on-write Trie (no pages needed)              │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │        Buffer Pool (buffer/)                             │   │
//! │  │   ┌─────────────────────────────────────────────────┐   │   │
//! │  │   │       Eviction Policy: LRU-K                     │   │   │
//! │  │   └─────────────────────────────────────────────────┘   │   │
//! │  │   BufferPoolManager + Frame + Guards + Statistics        │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │        Storage Layer (storage/)                          │   │
//! │  │        DiskManager + Page                                │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, FrameId, Error, config)
//! - [`buffer`] - Buffer pool management and eviction policies
//! - [`storage`] - Disk I/O and page formats
//! - [`index`] - Index structures (copy-on-write trie)
//! - [`recovery`] - Log manager handle
//!
//! # Quick Start
//! ```no_run
//! use chalkdb::buffer::BufferPoolManager;
//! use chalkdb::storage::DiskManager;
//!
//! let dm = DiskManager::create("my_database.db").unwrap();
//! let bpm = BufferPoolManager::new(16, 2, dm);
//!
//! let mut guard = bpm.new_page_guarded().unwrap().unwrap();
//! guard.page_mut().as_mut_slice()[0] = 0xAB;
//! ```

pub mod buffer;
pub mod common;
pub mod index;
pub mod recovery;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::PAGE_SIZE;
pub use common::{Error, FrameId, PageId, Result};

pub use buffer::replacer::LruKReplacer;
pub use buffer::{
    BasicPageGuard, BufferPoolManager, BufferPoolStats, Frame, PageReadGuard, PageWriteGuard,
    StatsSnapshot,
};
pub use index::Trie;
pub use recovery::LogManager;
pub use storage::page::Page;
pub use storage::DiskManager;
