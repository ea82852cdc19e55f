//! Search engine - descent from the root.

use crate::common::{Error, Key, NodeId, Result};
use crate::storage::block::Node;

use super::MWayTree;

/// Outcome of [`MWayTree::search`].
///
/// On a hit, `slot` is the 1-based index of the key within `node`. On a
/// miss, `node` is the last node visited and `slot` is both the child
/// pointer that would have been followed and the key index at which the key
/// belongs. An empty tree yields `(NULL, 0, false)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchResult {
    pub node: NodeId,
    pub slot: usize,
    pub found: bool,
}

impl SearchResult {
    const EMPTY: SearchResult = SearchResult {
        node: NodeId::NULL,
        slot: 0,
        found: false,
    };
}

/// A completed descent: the result, every position visited (root first),
/// and the last node read.
pub(super) struct Descent {
    pub result: SearchResult,
    pub path: Vec<NodeId>,
    pub last: Option<Node>,
}

impl MWayTree {
    /// Look up `key`.
    pub fn search(&mut self, key: Key) -> Result<SearchResult> {
        self.store.reset_stats();
        Ok(self.descend(key)?.result)
    }

    /// Whether `key` is present.
    pub fn contains(&mut self, key: Key) -> Result<bool> {
        Ok(self.search(key)?.found)
    }

    pub(super) fn descend(&mut self, key: Key) -> Result<Descent> {
        let mut path = Vec::new();
        let mut current = self.root;

        while !current.is_null() {
            // A well-formed tree never revisits a position
            if path.len() > self.store.node_count() as usize {
                return Err(Error::corrupt(current.0, "cycle in child pointers"));
            }
            path.push(current);

            let node = self.store.read_node(current)?;
            let (i, hit) = node.find_slot(key);

            if hit {
                return Ok(Descent {
                    result: SearchResult {
                        node: current,
                        slot: i + 1,
                        found: true,
                    },
                    path,
                    last: Some(node),
                });
            }

            let child = node.child(i);
            if child.is_null() {
                return Ok(Descent {
                    result: SearchResult {
                        node: current,
                        slot: i,
                        found: false,
                    },
                    path,
                    last: Some(node),
                });
            }
            current = child;
        }

        Ok(Descent {
            result: SearchResult::EMPTY,
            path,
            last: None,
        })
    }
}
