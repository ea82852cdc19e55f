//! mwaytree - a disk-backed m-way search tree over integer keys.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            mwaytree                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Index Layer (index/btree/)                  │   │
//! │  │   MWayTree: search / insert / delete / import / export   │   │
//! │  │   IntegrityChecker: read-only structural audit           │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │           Storage Layer (storage/)                       │   │
//! │  │     PageStore + Block codec (header / node / abandoned)  │   │
//! │  │     IoStats: per-operation block counters                │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                                                                 │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │           Data Store (data/)                             │   │
//! │  │     DataFile: flat CRC-checked records, logical delete   │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (NodeId, Key, Error, config)
//! - [`storage`] - Block formats and file I/O
//! - [`index`] - The m-way tree and its integrity checker
//! - [`data`] - Record store keyed like the index
//!
//! # Quick Start
//! ```no_run
//! use mwaytree::{MWayTree, TreeConfig};
//!
//! let mut tree = MWayTree::create("index.bin", TreeConfig::new(5)?)?;
//! tree.insert(42)?;
//! let hit = tree.search(42)?;
//! println!("found at {} slot {} ({})", hit.node, hit.slot, tree.io_stats());
//! tree.close()?;
//! # Ok::<(), mwaytree::Error>(())
//! ```

pub mod common;
pub mod data;
pub mod index;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::{Durability, TreeConfig, BLOCK_SIZE, MAX_ORDER, MIN_ORDER};
pub use common::{Error, Key, NodeId, Result};

pub use data::{DataFile, Record};
pub use index::{IntegrityChecker, IntegrityViolation, MWayTree, SearchResult};
pub use storage::block::{Block, Node, TreeHeader};
pub use storage::{IoCounters, IoStats, PageStore};
