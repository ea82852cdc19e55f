//! Integrity checker - read-only structural audit of an index file.

use std::collections::VecDeque;
use std::path::Path;

use thiserror::Error;
use tracing::warn;

use crate::common::config::{check_order, min_keys};
use crate::common::{Key, NodeId, Result};
use crate::storage::block::{Block, Node};
use crate::storage::PageStore;

/// The first invariant breach found by [`IntegrityChecker::check`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityViolation {
    #[error("index file unreadable: {0}")]
    Unreadable(String),

    #[error("block 0 is not a header sentinel")]
    MissingHeader,

    #[error("header order {stored} does not match expected order {expected}")]
    OrderMismatch { stored: usize, expected: usize },

    #[error("root {root} outside [1, {total}]")]
    RootOutOfRange { root: u32, total: u32 },

    #[error("block {id} is not a readable node: {reason}")]
    BadBlock { id: u32, reason: String },

    #[error("block {id} is abandoned but still reachable")]
    AbandonedReachable { id: u32 },

    #[error("node {id} reachable more than once")]
    Revisited { id: u32 },

    #[error("node {id} holds {count} keys, more than {max}")]
    TooManyKeys { id: u32, count: usize, max: usize },

    #[error("node {id}: keys not strictly increasing at index {index}")]
    KeysNotIncreasing { id: u32, index: usize },

    #[error("node {id}: key {key} outside the interval inherited from its parent")]
    KeyOutOfRange { id: u32, key: Key },

    #[error("node {id}: child pointer {child} outside [0, {total}]")]
    ChildOutOfRange { id: u32, child: u32, total: u32 },

    #[error("node {id} holds {count} keys, fewer than the minimum {min}")]
    Underfull { id: u32, count: usize, min: usize },

    #[error("node {id} is not reachable from the root")]
    Orphan { id: u32 },
}

type Check<T> = std::result::Result<T, IntegrityViolation>;

/// A node waiting in the traversal queue with the open interval its keys
/// must fall in (`None` is unbounded).
struct Pending {
    id: NodeId,
    low: Option<Key>,
    high: Option<Key>,
    is_root: bool,
}

/// Breadth-first audit of an index file from the header's root.
///
/// Checks, stopping at the first failure:
/// - block 0 is a header built with the expected order
/// - every reachable node holds at most `order - 1` strictly increasing keys,
///   each inside the interval bracketed by its parent's keys
/// - child pointers are null or within `[1, total]`
/// - non-root leaves hold at least one key, non-root internal nodes at
///   least `ceil(order/2) - 1`
/// - every position in `[1, total]` is reachable, unless it was abandoned
///
/// The checker opens its own read-only handle and never writes.
#[derive(Debug, Clone, Copy)]
pub struct IntegrityChecker {
    pub(super) order: usize,
}

impl IntegrityChecker {
    /// Create a checker expecting trees of `order`.
    ///
    /// # Errors
    /// Returns `Error::InvalidOrder` for an unsupported order.
    pub fn new(order: usize) -> Result<Self> {
        Ok(Self {
            order: check_order(order)?,
        })
    }

    /// Audit the file at `path`, logging and collapsing the outcome to a bool.
    pub fn verify<P: AsRef<Path>>(&self, path: P) -> bool {
        match self.check(path.as_ref()) {
            Ok(()) => true,
            Err(violation) => {
                warn!(path = %path.as_ref().display(), %violation, "integrity check failed");
                false
            }
        }
    }

    /// Audit the file at `path` and return the first violation.
    pub fn check<P: AsRef<Path>>(&self, path: P) -> std::result::Result<(), IntegrityViolation> {
        let mut store = PageStore::open_read_only(path).map_err(unreadable)?;
        let header = store
            .read_header()
            .map_err(unreadable)?
            .ok_or(IntegrityViolation::MissingHeader)?;

        if header.order != self.order {
            return Err(IntegrityViolation::OrderMismatch {
                stored: header.order,
                expected: self.order,
            });
        }

        let total = store.node_count();
        let mut visited = vec![false; total as usize + 1];

        if !header.root.is_null() {
            if header.root.0 > total {
                return Err(IntegrityViolation::RootOutOfRange {
                    root: header.root.0,
                    total,
                });
            }
            self.traverse(&mut store, header.root, total, &mut visited)?;
        }

        // Everything unvisited must have been abandoned deliberately
        for pos in 1..=total {
            if visited[pos as usize] {
                continue;
            }
            match store.read_block(NodeId::new(pos)) {
                Ok(Block::Abandoned) => {}
                _ => return Err(IntegrityViolation::Orphan { id: pos }),
            }
        }

        Ok(())
    }

    fn traverse(
        &self,
        store: &mut PageStore,
        root: NodeId,
        total: u32,
        visited: &mut [bool],
    ) -> Check<()> {
        let mut queue = VecDeque::new();
        queue.push_back(Pending {
            id: root,
            low: None,
            high: None,
            is_root: true,
        });

        while let Some(pending) = queue.pop_front() {
            let id = pending.id;
            if visited[id.0 as usize] {
                return Err(IntegrityViolation::Revisited { id: id.0 });
            }
            visited[id.0 as usize] = true;

            let node = match store.read_block(id) {
                Ok(Block::Node(node)) => node,
                Ok(Block::Abandoned) => {
                    return Err(IntegrityViolation::AbandonedReachable { id: id.0 })
                }
                Ok(Block::Header(_)) => {
                    return Err(IntegrityViolation::BadBlock {
                        id: id.0,
                        reason: "header sentinel inside the tree".to_string(),
                    })
                }
                Err(e) => {
                    return Err(IntegrityViolation::BadBlock {
                        id: id.0,
                        reason: e.to_string(),
                    })
                }
            };

            self.check_node(&node, &pending, total)?;

            let count = node.key_count();
            for (i, &child) in node.children().iter().enumerate() {
                if child.is_null() {
                    continue;
                }
                queue.push_back(Pending {
                    id: child,
                    low: if i == 0 { pending.low } else { Some(node.key(i - 1)) },
                    high: if i == count { pending.high } else { Some(node.key(i)) },
                    is_root: false,
                });
            }
        }

        Ok(())
    }

    fn check_node(&self, node: &Node, pending: &Pending, total: u32) -> Check<()> {
        let id = pending.id.0;
        let count = node.key_count();

        if count > self.order - 1 {
            return Err(IntegrityViolation::TooManyKeys {
                id,
                count,
                max: self.order - 1,
            });
        }

        if let Some(index) = node.keys().windows(2).position(|w| w[0] >= w[1]) {
            return Err(IntegrityViolation::KeysNotIncreasing { id, index: index + 1 });
        }

        for &key in node.keys() {
            let above = pending.low.map_or(true, |low| key > low);
            let below = pending.high.map_or(true, |high| key < high);
            if !(above && below) {
                return Err(IntegrityViolation::KeyOutOfRange { id, key });
            }
        }

        if let Some(child) = node.children().iter().find(|c| c.0 > total) {
            return Err(IntegrityViolation::ChildOutOfRange {
                id,
                child: child.0,
                total,
            });
        }

        if !pending.is_root {
            let min = if node.is_leaf() { 1 } else { min_keys(self.order) };
            if count < min {
                return Err(IntegrityViolation::Underfull { id, count, min });
            }
        }

        Ok(())
    }
}

fn unreadable(e: crate::common::Error) -> IntegrityViolation {
    IntegrityViolation::Unreadable(e.to_string())
}
