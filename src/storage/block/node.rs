//! Node - one vertex of the m-way tree.

use std::fmt;

use crate::common::config::{BLOCK_SIZE, MAX_ORDER};
use crate::common::{Key, NodeId};

use super::{read_i32, read_u32, write_i32, write_u32, CHILDREN_OFFSET, KEYS_OFFSET, KEY_COUNT_OFFSET};

/// A tree node: `n` strictly increasing keys and `n + 1` child positions.
///
/// `children[i]` roots the subtree holding keys between `keys[i-1]` and
/// `keys[i]`. A null child means "no subtree"; a node is a leaf iff its
/// first child is null.
///
/// Storage is sized to what the node holds, not to [`MAX_ORDER`]; only the
/// encoded block is padded out to the fixed size.
///
/// # Example
/// ```
/// use mwaytree::{Node, NodeId};
///
/// let mut node = Node::with_key(20);
/// node.insert_at(0, 10, NodeId::NULL);
/// assert_eq!(node.keys(), &[10, 20]);
/// assert!(node.is_leaf());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    keys: Vec<Key>,
    children: Vec<NodeId>,
}

impl Node {
    /// Create an empty leaf.
    pub fn new() -> Self {
        Self {
            keys: Vec::new(),
            children: vec![NodeId::NULL],
        }
    }

    /// Create a leaf holding a single key.
    pub fn with_key(key: Key) -> Self {
        Self {
            keys: vec![key],
            children: vec![NodeId::NULL, NodeId::NULL],
        }
    }

    /// Build a node from its key and child arrays.
    ///
    /// # Panics
    /// Panics if `children.len() != keys.len() + 1`.
    pub fn from_parts(keys: Vec<Key>, children: Vec<NodeId>) -> Self {
        assert_eq!(
            children.len(),
            keys.len() + 1,
            "a node needs exactly one more child than keys"
        );
        Self { keys, children }
    }

    #[inline]
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children[0].is_null()
    }

    #[inline]
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[inline]
    pub fn key(&self, index: usize) -> Key {
        self.keys[index]
    }

    #[inline]
    pub fn child(&self, index: usize) -> NodeId {
        self.children[index]
    }

    #[inline]
    pub fn last_key(&self) -> Option<Key> {
        self.keys.last().copied()
    }

    #[inline]
    pub fn last_child(&self) -> NodeId {
        self.children[self.keys.len()]
    }

    pub fn set_key(&mut self, index: usize, key: Key) {
        self.keys[index] = key;
    }

    /// Locate `key` by linear scan.
    ///
    /// Returns the first index `i` with `key <= keys[i]` (or `key_count()`
    /// if there is none) and whether `keys[i] == key`. On a miss, `i` is both
    /// the child to descend into and the insertion index.
    pub fn find_slot(&self, key: Key) -> (usize, bool) {
        let i = self.keys.iter().take_while(|&&k| k < key).count();
        (i, i < self.keys.len() && self.keys[i] == key)
    }

    /// Insert `key` at `index`, with `right` as the child following it.
    ///
    /// Subsequent keys and children shift right by one. `children[index]`
    /// is untouched: after a split it already points at the left half.
    pub fn insert_at(&mut self, index: usize, key: Key, right: NodeId) {
        self.keys.insert(index, key);
        self.children.insert(index + 1, right);
    }

    /// Remove the key at `index` together with the child following it.
    pub fn remove_at(&mut self, index: usize) -> (Key, NodeId) {
        let key = self.keys.remove(index);
        let child = self.children.remove(index + 1);
        (key, child)
    }

    /// Detach the first key and the first child.
    pub fn pop_front(&mut self) -> Option<(Key, NodeId)> {
        if self.keys.is_empty() {
            return None;
        }
        let key = self.keys.remove(0);
        let child = self.children.remove(0);
        Some((key, child))
    }

    /// Detach the last key and the last child.
    pub fn pop_back(&mut self) -> Option<(Key, NodeId)> {
        let key = self.keys.pop()?;
        let child = self.children.pop()?;
        Some((key, child))
    }

    /// Prepend a key and the child preceding it.
    pub fn push_front(&mut self, key: Key, child: NodeId) {
        self.keys.insert(0, key);
        self.children.insert(0, child);
    }

    /// Append a key and the child following it.
    pub fn push_back(&mut self, key: Key, child: NodeId) {
        self.keys.push(key);
        self.children.push(child);
    }

    /// Concatenate `right` onto this node through the separator key.
    pub fn merge(&mut self, separator: Key, right: Node) {
        self.keys.push(separator);
        self.keys.extend(right.keys);
        self.children.extend(right.children);
    }

    /// Split an overfull node at `order / 2`.
    ///
    /// Returns `(left, median, right)`: `left` keeps keys `[0, mid)` and
    /// children `[0, mid]`, `right` takes keys and children past `mid`, and
    /// the median is promoted to the parent.
    ///
    /// # Panics
    /// Panics if the node holds `order / 2` keys or fewer.
    pub fn split(mut self, order: usize) -> (Node, Key, Node) {
        let mid = order / 2;
        let right_keys = self.keys.split_off(mid + 1);
        let right_children = self.children.split_off(mid + 1);
        let median = self.keys[mid];
        self.keys.truncate(mid);
        let right = Node {
            keys: right_keys,
            children: right_children,
        };
        (self, median, right)
    }

    /// Encode into a fresh, zero-padded block.
    pub(crate) fn encode(&self) -> [u8; BLOCK_SIZE] {
        let mut data = [0u8; BLOCK_SIZE];
        self.write_to(&mut data);
        data
    }

    /// Encode into a block buffer.
    ///
    /// # Panics
    /// Panics if the node holds more than `MAX_ORDER` keys or the buffer is
    /// shorter than a block.
    pub(crate) fn write_to(&self, data: &mut [u8]) {
        assert!(self.keys.len() <= MAX_ORDER, "node exceeds MAX_ORDER keys");

        write_i32(data, KEY_COUNT_OFFSET, self.keys.len() as i32);
        for (i, &key) in self.keys.iter().enumerate() {
            write_i32(data, KEYS_OFFSET + 4 * i, key);
        }
        for (i, child) in self.children.iter().enumerate() {
            write_u32(data, CHILDREN_OFFSET + 4 * i, child.0);
        }
    }

    /// Decode a node whose key count has already been read and range-checked.
    pub(crate) fn read_from(data: &[u8], key_count: usize) -> Self {
        let mut keys = Vec::with_capacity(key_count + 1);
        let mut children = Vec::with_capacity(key_count + 2);
        for i in 0..key_count {
            keys.push(read_i32(data, KEYS_OFFSET + 4 * i));
        }
        for i in 0..=key_count {
            children.push(NodeId(read_u32(data, CHILDREN_OFFSET + 4 * i)));
        }
        Self { keys, children }
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}

/// Text form used by import and export: `n A0 K1 A1 ... Kn An`.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.keys.len(), self.children[0].0)?;
        for (key, child) in self.keys.iter().zip(&self.children[1..]) {
            write!(f, " {} {}", key, child.0)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u32]) -> Vec<NodeId> {
        raw.iter().map(|&id| NodeId(id)).collect()
    }

    #[test]
    fn test_new_node_is_empty_leaf() {
        let node = Node::new();
        assert!(node.is_empty());
        assert!(node.is_leaf());
        assert_eq!(node.children(), &[NodeId::NULL]);
    }

    #[test]
    fn test_find_slot() {
        let node = Node::from_parts(vec![10, 20, 30], ids(&[0, 0, 0, 0]));
        assert_eq!(node.find_slot(5), (0, false));
        assert_eq!(node.find_slot(10), (0, true));
        assert_eq!(node.find_slot(15), (1, false));
        assert_eq!(node.find_slot(30), (2, true));
        assert_eq!(node.find_slot(35), (3, false));
    }

    #[test]
    fn test_insert_at_shifts_keys_and_children() {
        let mut node = Node::from_parts(vec![10, 30], ids(&[1, 2, 3]));
        node.insert_at(1, 20, NodeId(9));
        assert_eq!(node.keys(), &[10, 20, 30]);
        assert_eq!(node.children(), ids(&[1, 2, 9, 3]).as_slice());
    }

    #[test]
    fn test_remove_at() {
        let mut node = Node::from_parts(vec![10, 20, 30], ids(&[1, 2, 3, 4]));
        assert_eq!(node.remove_at(1), (20, NodeId(3)));
        assert_eq!(node.keys(), &[10, 30]);
        assert_eq!(node.children(), ids(&[1, 2, 4]).as_slice());
    }

    #[test]
    fn test_split_odd_order() {
        // order 3 overflows at 3 keys; median index 1
        let node = Node::from_parts(vec![10, 20, 30], ids(&[1, 2, 3, 4]));
        let (left, median, right) = node.split(3);
        assert_eq!(median, 20);
        assert_eq!(left.keys(), &[10]);
        assert_eq!(left.children(), ids(&[1, 2]).as_slice());
        assert_eq!(right.keys(), &[30]);
        assert_eq!(right.children(), ids(&[3, 4]).as_slice());
    }

    #[test]
    fn test_split_even_order() {
        // order 4 overflows at 4 keys; median index 2
        let node = Node::from_parts(vec![1, 2, 3, 4], ids(&[0, 0, 0, 0, 0]));
        let (left, median, right) = node.split(4);
        assert_eq!(left.keys(), &[1, 2]);
        assert_eq!(median, 3);
        assert_eq!(right.keys(), &[4]);
        assert_eq!(right.key_count() + 1, right.children().len());
    }

    #[test]
    fn test_rotation_helpers() {
        let mut node = Node::from_parts(vec![10, 20], ids(&[1, 2, 3]));
        assert_eq!(node.pop_back(), Some((20, NodeId(3))));
        node.push_front(5, NodeId(7));
        assert_eq!(node.keys(), &[5, 10]);
        assert_eq!(node.children(), ids(&[7, 1, 2]).as_slice());
        assert_eq!(node.pop_front(), Some((5, NodeId(7))));
        node.push_back(40, NodeId(8));
        assert_eq!(node.keys(), &[10, 40]);
        assert_eq!(node.children(), ids(&[1, 2, 8]).as_slice());
    }

    #[test]
    fn test_pop_on_empty_node() {
        let mut node = Node::new();
        assert_eq!(node.pop_front(), None);
        assert_eq!(node.pop_back(), None);
    }

    #[test]
    fn test_merge() {
        let mut left = Node::from_parts(vec![10], ids(&[1, 2]));
        let right = Node::from_parts(vec![30], ids(&[3, 4]));
        left.merge(20, right);
        assert_eq!(left.keys(), &[10, 20, 30]);
        assert_eq!(left.children(), ids(&[1, 2, 3, 4]).as_slice());
    }

    #[test]
    fn test_display_text_line() {
        let node = Node::from_parts(vec![10, 20], ids(&[1, 2, 3]));
        assert_eq!(node.to_string(), "2 1 10 2 20 3");
        assert_eq!(Node::new().to_string(), "0 0");
    }

    #[test]
    fn test_write_and_read_block() {
        let node = Node::from_parts(vec![-5, 7, 1000], ids(&[1, 2, 3, 4]));
        let buf = node.encode();

        assert_eq!(read_i32(&buf, KEY_COUNT_OFFSET), 3);
        assert_eq!(Node::read_from(&buf, 3), node);
    }
}
