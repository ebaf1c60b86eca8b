//! Eviction policy implementations (replacers).
//!
//! Currently implements:
//! - [`LruKReplacer`] - backward K-distance eviction

mod lru_k;

pub use lru_k::LruKReplacer;
