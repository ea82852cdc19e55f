//! Header manager - validation and persistence of block 0.

use std::path::Path;

use tracing::{info, warn};

use crate::common::config::{check_order, Durability};
use crate::common::{Error, NodeId, Result};
use crate::storage::block::TreeHeader;
use crate::storage::PageStore;

use super::MWayTree;

impl MWayTree {
    /// Check block 0 against the requested order and return the stored root.
    ///
    /// A file whose block 0 is not a sentinel gets a fresh header with an
    /// empty root. Nothing is written when the orders disagree.
    pub(super) fn validate_on_open(store: &mut PageStore, order: usize) -> Result<NodeId> {
        match store.read_header()? {
            Some(header) if header.order != order => Err(Error::ConfigMismatch {
                stored: header.order,
                requested: order,
            }),
            Some(header) => Ok(header.root),
            None => {
                warn!(
                    path = %store.path().display(),
                    order,
                    "block 0 is not a header sentinel, initialising"
                );
                store.write_header(&TreeHeader::new(order, NodeId::NULL))?;
                Ok(NodeId::NULL)
            }
        }
    }

    /// Write the current order and root to block 0.
    pub(super) fn persist_header(&mut self) -> Result<()> {
        self.store
            .write_header(&TreeHeader::new(self.order, self.root))
    }

    /// Create an index file holding only a header with an empty root.
    ///
    /// An existing file at `path` is truncated.
    pub fn create_empty<P: AsRef<Path>>(path: P, order: usize) -> Result<()> {
        let order = check_order(order)?;
        let mut store = PageStore::create(path.as_ref(), Durability::Flush)?;
        store.write_header(&TreeHeader::new(order, NodeId::NULL))?;

        info!(path = %path.as_ref().display(), order, "created empty index");
        Ok(())
    }

    /// Read the header of an index file without opening a handle.
    ///
    /// # Errors
    /// Returns `Error::Corrupt` if block 0 is not a header sentinel.
    pub fn read_header<P: AsRef<Path>>(path: P) -> Result<TreeHeader> {
        let mut store = PageStore::open_read_only(path)?;
        store
            .read_header()?
            .ok_or_else(|| Error::corrupt(NodeId::HEADER.0, "missing header sentinel"))
    }
}
