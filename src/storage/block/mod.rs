//! Block types and layout.
//!
//! The index file is an array of fixed-size blocks. Every block shares one
//! shape (key count, key array, child array) and the key count tells the
//! kinds apart:
//! - [`TreeHeader`] - the sentinel at position 0 (`key_count == -1`)
//! - [`Node`] - an ordinary tree node (`0 <= key_count <= MAX_ORDER`)
//! - abandoned slot - a node discarded by a merge or root contraction
//!   (`key_count == -2`); positions are never reused

mod header;
mod node;

pub use header::TreeHeader;
pub use node::Node;

use crate::common::config::{BLOCK_SIZE, MAX_ORDER};
use crate::common::{Error, NodeId, Result};

pub(crate) const KEY_COUNT_OFFSET: usize = 0;
pub(crate) const KEYS_OFFSET: usize = 4;
pub(crate) const CHILDREN_OFFSET: usize = KEYS_OFFSET + 4 * MAX_ORDER;

/// Key count marking the header block.
pub const HEADER_MARKER: i32 = -1;

/// Key count marking an abandoned slot.
pub const ABANDONED_MARKER: i32 = -2;

/// A decoded block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Header(TreeHeader),
    Node(Node),
    Abandoned,
}

impl Block {
    /// Encode into a fresh, zero-padded block.
    pub fn encode(&self) -> [u8; BLOCK_SIZE] {
        let mut data = [0u8; BLOCK_SIZE];
        match self {
            Block::Header(header) => header.write_to(&mut data),
            Block::Node(node) => node.write_to(&mut data),
            Block::Abandoned => write_i32(&mut data, KEY_COUNT_OFFSET, ABANDONED_MARKER),
        }
        data
    }

    /// Decode a block read from position `id`.
    ///
    /// Only the shape is checked (the key count must name a block kind and
    /// fit the arrays); tree invariants are left to the header manager and
    /// the integrity checker.
    ///
    /// # Errors
    /// Returns `Error::Corrupt` if the buffer is short or the key count is
    /// out of range.
    pub fn decode(id: NodeId, data: &[u8]) -> Result<Self> {
        if data.len() < BLOCK_SIZE {
            return Err(Error::corrupt(
                id.0,
                format!("short block: {} of {} bytes", data.len(), BLOCK_SIZE),
            ));
        }

        match read_i32(data, KEY_COUNT_OFFSET) {
            HEADER_MARKER => Ok(Block::Header(TreeHeader::read_from(id, data)?)),
            ABANDONED_MARKER => Ok(Block::Abandoned),
            n if (0..=MAX_ORDER as i32).contains(&n) => {
                Ok(Block::Node(Node::read_from(data, n as usize)))
            }
            n => Err(Error::corrupt(id.0, format!("key count {} out of range", n))),
        }
    }
}

#[inline]
pub(crate) fn read_i32(data: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

#[inline]
pub(crate) fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

#[inline]
pub(crate) fn write_i32(data: &mut [u8], offset: usize, value: i32) {
    data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

#[inline]
pub(crate) fn write_u32(data: &mut [u8], offset: usize, value: u32) {
    data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}
