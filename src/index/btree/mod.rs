//! B-tree index implementation.
//!
//! [`MWayTree`] is the handle over one index file. Its operations are split
//! across submodules:
//! - `header` - open-time validation and persistence of block 0
//! - `search` - descent from the root
//! - `insert` - leaf insertion with cascading splits
//! - `delete` - predecessor substitution with borrow/merge repair
//! - `verify` - read-only structural audit ([`IntegrityChecker`])
//! - `text` - import from and export to the line-per-node text format

mod delete;
mod header;
mod insert;
mod search;
mod text;
mod verify;

pub use search::SearchResult;
pub use verify::{IntegrityChecker, IntegrityViolation};

pub(crate) use text::parse_nodes;

use std::path::Path;

use tracing::{debug, info, warn};

use crate::common::config::{self, TreeConfig};
use crate::common::{NodeId, Result};
use crate::storage::{IoCounters, PageStore};

/// An open m-way search tree stored in a single index file.
///
/// # Lifecycle
/// ```text
/// create_empty / create_from_text ──▶ file with header (+ nodes)
///                open ──▶ header validated, root adopted
///   search / insert / delete / export_to_text ──▶ block I/O via PageStore
///               close ──▶ header persisted, file released
/// ```
///
/// Dropping a handle without calling [`close`](Self::close) still persists
/// the header; errors on that path are logged.
///
/// # I/O accounting
/// Every public operation resets the block counters at entry, so
/// [`io_stats`](Self::io_stats) reports the cost of the most recent call.
///
/// # Example
/// ```
/// use mwaytree::{MWayTree, TreeConfig};
///
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("index.bin");
///
/// let mut tree = MWayTree::create(&path, TreeConfig::new(3).unwrap()).unwrap();
/// for key in [10, 20, 30] {
///     tree.insert(key).unwrap();
/// }
/// assert!(tree.search(20).unwrap().found);
/// assert!(tree.verify());
/// tree.close().unwrap();
/// ```
pub struct MWayTree {
    store: PageStore,
    order: usize,
    root: NodeId,
    closed: bool,
}

impl MWayTree {
    /// Open an existing index file.
    ///
    /// Block 0 must either be a header built with the same order, or not a
    /// header at all (an empty or legacy file), in which case a fresh header
    /// with an empty root is written.
    ///
    /// # Errors
    /// - `Error::Io` if the file cannot be opened
    /// - `Error::ConfigMismatch` if the stored order differs; the file is
    ///   left untouched
    pub fn open<P: AsRef<Path>>(path: P, config: TreeConfig) -> Result<Self> {
        let mut store = PageStore::open(path.as_ref(), config.durability())?;
        let root = Self::validate_on_open(&mut store, config.order())?;

        info!(
            path = %path.as_ref().display(),
            order = config.order(),
            root = root.0,
            nodes = store.node_count(),
            "opened index"
        );

        Ok(Self {
            store,
            order: config.order(),
            root,
            closed: false,
        })
    }

    /// Create an empty index file and open it.
    pub fn create<P: AsRef<Path>>(path: P, config: TreeConfig) -> Result<Self> {
        Self::create_empty(path.as_ref(), config.order())?;
        Self::open(path, config)
    }

    /// Persist the header and release the file.
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.persist_header()
    }

    /// Replace the root and persist the header.
    fn set_root(&mut self, root: NodeId) -> Result<()> {
        debug!(old = self.root.0, new = root.0, "root changed");
        self.root = root;
        self.persist_header()
    }

    /// Audit the persisted file with an independent read-only handle.
    ///
    /// Returns `false` on the first violation, which is logged.
    pub fn verify(&self) -> bool {
        IntegrityChecker { order: self.order }.verify(self.store.path())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    pub fn order(&self) -> usize {
        self.order
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_null()
    }

    /// Minimum key count of a non-root node: `ceil(order/2) - 1`.
    #[inline]
    pub fn min_keys(&self) -> usize {
        config::min_keys(self.order)
    }

    /// Number of node positions in the file, abandoned ones included.
    #[inline]
    pub fn node_count(&self) -> u32 {
        self.store.node_count()
    }

    #[inline]
    pub fn file_size(&self) -> u64 {
        self.store.file_size()
    }

    #[inline]
    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Block I/O performed by the most recent operation.
    #[inline]
    pub fn io_stats(&self) -> IoCounters {
        self.store.stats()
    }
}

impl Drop for MWayTree {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.persist_header() {
            warn!(path = %self.store.path().display(), error = %e, "failed to persist header on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Error;
    use tempfile::tempdir;

    fn config(order: usize) -> TreeConfig {
        TreeConfig::new(order).unwrap()
    }

    #[test]
    fn test_create_and_reopen_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tree.bin");

        let tree = MWayTree::create(&path, config(4)).unwrap();
        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 0);
        assert_eq!(tree.min_keys(), 1);
        tree.close().unwrap();

        let tree = MWayTree::open(&path, config(4)).unwrap();
        assert_eq!(tree.order(), 4);
        assert_eq!(tree.root(), NodeId::NULL);
    }

    #[test]
    fn test_open_missing_file_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.bin");
        assert!(matches!(
            MWayTree::open(&path, config(3)),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn test_root_survives_drop_without_close() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tree.bin");

        let root = {
            let mut tree = MWayTree::create(&path, config(3)).unwrap();
            for key in 1..=10 {
                tree.insert(key).unwrap();
            }
            tree.root()
        };

        let tree = MWayTree::open(&path, config(3)).unwrap();
        assert_eq!(tree.root(), root);
        assert!(tree.verify());
    }
}
