//! Tree header - the sentinel block at position 0.

use crate::common::{NodeId, Result};

use super::{
    read_i32, read_u32, write_i32, write_u32, CHILDREN_OFFSET, HEADER_MARKER, KEYS_OFFSET,
    KEY_COUNT_OFFSET,
};

/// Tree-wide metadata stored in block 0.
///
/// The header reuses the node block shape so the file stays a uniform array
/// of blocks:
/// ```text
/// Field        Node meaning   Header meaning
/// -----        ------------   --------------
/// key_count    n              -1 (sentinel)
/// keys[0]      first key      order
/// children[0]  first child    root position (0 = empty tree)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeHeader {
    /// Maximum number of children per node.
    pub order: usize,
    /// Position of the root node, `NodeId::NULL` for an empty tree.
    pub root: NodeId,
}

impl TreeHeader {
    pub fn new(order: usize, root: NodeId) -> Self {
        Self { order, root }
    }

    /// Write this header into a zeroed block buffer.
    pub(crate) fn write_to(&self, data: &mut [u8]) {
        write_i32(data, KEY_COUNT_OFFSET, HEADER_MARKER);
        write_i32(data, KEYS_OFFSET, self.order as i32);
        write_u32(data, CHILDREN_OFFSET, self.root.0);
    }

    /// Read a header from a block whose key count is the sentinel.
    pub(crate) fn read_from(id: NodeId, data: &[u8]) -> Result<Self> {
        let raw_order = read_i32(data, KEYS_OFFSET);
        let order = usize::try_from(raw_order).map_err(|_| {
            crate::common::Error::corrupt(id.0, format!("negative order {}", raw_order))
        })?;
        let root = NodeId(read_u32(data, CHILDREN_OFFSET));
        Ok(Self { order, root })
    }
}
