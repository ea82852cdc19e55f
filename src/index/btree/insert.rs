//! Insertion engine - leaf insertion with cascading splits.

use tracing::debug;

use crate::common::{Key, NodeId, Result};
use crate::storage::block::Node;

use super::MWayTree;

impl MWayTree {
    /// Insert `key`.
    ///
    /// Keys form a set: inserting a key that is already present changes
    /// nothing and returns `Ok(false)`.
    ///
    /// The key goes into the leaf where the search stopped. A node that
    /// reaches `order` keys splits around its median (index `order / 2`):
    /// the left half is rewritten in place, the right half is appended, and
    /// the median moves up into the parent, repeating the check there. A
    /// split root is replaced by a new root holding only the median.
    pub fn insert(&mut self, key: Key) -> Result<bool> {
        self.store.reset_stats();

        if self.root.is_null() {
            let root = self.store.append_node(&Node::with_key(key))?;
            self.set_root(root)?;
            return Ok(true);
        }

        let descent = self.descend(key)?;
        if descent.result.found {
            return Ok(false);
        }

        let mut path = descent.path;
        let mut cached = descent.last;
        let mut key = key;
        let mut right = NodeId::NULL;
        let mut left = NodeId::NULL;

        while let Some(id) = path.pop() {
            let mut node = match cached.take() {
                Some(node) => node,
                None => self.store.read_node(id)?,
            };

            let (slot, _) = node.find_slot(key);
            node.insert_at(slot, key, right);

            if node.key_count() < self.order {
                self.store.write_node(&node, id)?;
                return Ok(true);
            }

            let (left_half, median, right_half) = node.split(self.order);
            self.store.write_node(&left_half, id)?;
            right = self.store.append_node(&right_half)?;
            left = id;
            key = median;

            debug!(node = id.0, sibling = right.0, median, "split node");
        }

        // The old root split: grow the tree by one level
        let root = self
            .store
            .append_node(&Node::from_parts(vec![key], vec![left, right]))?;
        debug!(root = root.0, key, "new root");
        self.set_root(root)?;
        Ok(true)
    }
}
