//! Deletion engine - predecessor substitution and underflow repair.

use tracing::debug;

use crate::common::{Error, Key, NodeId, Result};
use crate::storage::block::Node;

use super::MWayTree;

/// What a recursive removal reports to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Removal {
    Done,
    /// The node fell below its minimum; the parent must repair it.
    Underflow,
    NotFound,
}

impl MWayTree {
    /// Delete `key`, returning whether it was present.
    ///
    /// A key in an internal node is replaced by its in-order predecessor,
    /// which is then removed from the leaf it came from. Nodes left below
    /// `min_keys()` are repaired on the way back up by borrowing from a
    /// sibling or merging with one. A root left without keys is replaced by
    /// its only child (or by the empty tree).
    ///
    /// Slots emptied by merges are marked abandoned and never reused.
    pub fn delete(&mut self, key: Key) -> Result<bool> {
        self.store.reset_stats();

        if self.root.is_null() {
            return Ok(false);
        }

        // The root is exempt from the minimum; it "underflows" only when empty
        match self.remove_from(self.root, key, 1)? {
            Removal::NotFound => Ok(false),
            Removal::Done => Ok(true),
            Removal::Underflow => {
                self.contract_root()?;
                Ok(true)
            }
        }
    }

    /// Remove `key` from the subtree at `id`. `floor` is the key count
    /// below which the node reports an underflow.
    fn remove_from(&mut self, id: NodeId, key: Key, floor: usize) -> Result<Removal> {
        let mut node = self.store.read_node(id)?;
        let (i, hit) = node.find_slot(key);

        if node.is_leaf() {
            if !hit {
                return Ok(Removal::NotFound);
            }
            node.remove_at(i);
            self.store.write_node(&node, id)?;
            return Ok(Self::status(&node, floor));
        }

        let child = node.child(i);
        let removal = if hit {
            let predecessor = self.predecessor(child)?;
            node.set_key(i, predecessor);
            self.store.write_node(&node, id)?;

            match self.remove_from(child, predecessor, self.min_keys())? {
                Removal::NotFound => {
                    return Err(Error::corrupt(child.0, "predecessor missing from subtree"))
                }
                removal => removal,
            }
        } else if child.is_null() {
            Removal::NotFound
        } else {
            self.remove_from(child, key, self.min_keys())?
        };

        match removal {
            // Only a keyless root has a lone child; contraction promotes it
            Removal::Underflow if node.is_empty() => Ok(Removal::Underflow),
            Removal::Underflow => {
                self.fix_underflow(id, &mut node, i)?;
                Ok(Self::status(&node, floor))
            }
            other => Ok(other),
        }
    }

    fn status(node: &Node, floor: usize) -> Removal {
        if node.key_count() < floor {
            Removal::Underflow
        } else {
            Removal::Done
        }
    }

    /// Largest key in the subtree rooted at `id`.
    fn predecessor(&mut self, mut id: NodeId) -> Result<Key> {
        loop {
            let node = self.store.read_node(id)?;
            if node.is_leaf() {
                return node
                    .last_key()
                    .ok_or_else(|| Error::corrupt(id.0, "empty leaf below an internal node"));
            }
            id = node.last_child();
        }
    }

    /// Repair the underflowing child at `index` of `parent`.
    ///
    /// Tried in order: borrow from the left sibling, borrow from the right
    /// sibling, merge (into the left sibling if there is one, else absorb
    /// the right sibling). `parent` is updated in memory and on disk.
    fn fix_underflow(&mut self, parent_id: NodeId, parent: &mut Node, index: usize) -> Result<()> {
        let min = self.min_keys();
        let child_id = parent.child(index);
        let mut child = self.store.read_node(child_id)?;

        let mut left = None;
        if index > 0 {
            let left_id = parent.child(index - 1);
            let mut sibling = self.store.read_node(left_id)?;
            if sibling.key_count() > min {
                let (key, moved) = sibling
                    .pop_back()
                    .ok_or_else(|| Error::corrupt(left_id.0, "empty sibling"))?;
                child.push_front(parent.key(index - 1), moved);
                parent.set_key(index - 1, key);

                self.store.write_node(&sibling, left_id)?;
                self.store.write_node(&child, child_id)?;
                self.store.write_node(parent, parent_id)?;
                debug!(node = child_id.0, sibling = left_id.0, "borrowed from left sibling");
                return Ok(());
            }
            left = Some((left_id, sibling));
        }

        let mut right = None;
        if index < parent.key_count() {
            let right_id = parent.child(index + 1);
            let mut sibling = self.store.read_node(right_id)?;
            if sibling.key_count() > min {
                let (key, moved) = sibling
                    .pop_front()
                    .ok_or_else(|| Error::corrupt(right_id.0, "empty sibling"))?;
                child.push_back(parent.key(index), moved);
                parent.set_key(index, key);

                self.store.write_node(&sibling, right_id)?;
                self.store.write_node(&child, child_id)?;
                self.store.write_node(parent, parent_id)?;
                debug!(node = child_id.0, sibling = right_id.0, "borrowed from right sibling");
                return Ok(());
            }
            right = Some((right_id, sibling));
        }

        match (left, right) {
            (Some((left_id, mut sibling)), _) => {
                let (separator, _) = parent.remove_at(index - 1);
                sibling.merge(separator, child);

                self.store.write_node(&sibling, left_id)?;
                self.store.abandon(child_id)?;
                self.store.write_node(parent, parent_id)?;
                debug!(into = left_id.0, abandoned = child_id.0, "merged with left sibling");
            }
            (None, Some((right_id, sibling))) => {
                let (separator, _) = parent.remove_at(index);
                child.merge(separator, sibling);

                self.store.write_node(&child, child_id)?;
                self.store.abandon(right_id)?;
                self.store.write_node(parent, parent_id)?;
                debug!(into = child_id.0, abandoned = right_id.0, "merged with right sibling");
            }
            (None, None) => {
                return Err(Error::corrupt(parent_id.0, "underflowing child has no sibling"));
            }
        }
        Ok(())
    }

    /// Replace an empty root by its only child, or by the empty tree.
    ///
    /// Keyless nodes below the root (possible in imported files) are
    /// abandoned as well until a node with keys, or nothing, remains.
    fn contract_root(&mut self) -> Result<()> {
        let old_root = self.root;
        let mut new_root = self.store.read_node(old_root)?.child(0);
        self.store.abandon(old_root)?;

        while !new_root.is_null() {
            let node = self.store.read_node(new_root)?;
            if !node.is_empty() {
                break;
            }
            self.store.abandon(new_root)?;
            new_root = node.child(0);
        }

        debug!(old = old_root.0, new = new_root.0, "contracted root");
        self.set_root(new_root)
    }
}
