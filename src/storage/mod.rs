//! Storage layer - block codec and file I/O.
//!
//! This module handles persistent storage of the index:
//! - [`block`] - Block kinds and their fixed-size encoding
//! - [`PageStore`] - Block-addressed file I/O
//! - [`IoStats`] - Block read/write counters

pub mod block;
mod page_store;
mod stats;

pub use page_store::PageStore;
pub use stats::{IoCounters, IoStats};
