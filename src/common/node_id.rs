//! Node position type.

use std::fmt;

/// Logical position of a block in the index file.
///
/// Positions count blocks, not bytes: position `N` starts at byte offset
/// `N × BLOCK_SIZE`. Position 0 is the header, so a node never lives
/// there and `NodeId::NULL` doubles as "no child".
///
/// # Example
/// ```
/// use mwaytree::NodeId;
///
/// let id = NodeId::new(7);
/// assert!(!id.is_null());
/// assert!(NodeId::NULL.is_null());
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// "No node": an empty child slot, or the root of an empty tree.
    pub const NULL: NodeId = NodeId(0);

    /// The reserved header position.
    pub const HEADER: NodeId = NodeId(0);

    /// Create a new NodeId.
    #[inline]
    pub fn new(id: u32) -> Self {
        NodeId(id)
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Byte offset of this block in the file.
    #[inline]
    pub(crate) fn offset(&self, block_size: usize) -> u64 {
        (self.0 as u64) * (block_size as u64)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Node(NULL)")
        } else {
            write!(f, "Node({})", self.0)
        }
    }
}
