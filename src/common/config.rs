//! Configuration for mwaytree.
//!
//! Compile-time bounds live here as constants; per-tree settings are carried
//! by [`TreeConfig`].

use crate::common::{Error, Result};

/// Smallest supported order (maximum number of children per node).
pub const MIN_ORDER: usize = 3;

/// Largest supported order.
///
/// The on-disk block is always sized for this order, whatever order a
/// particular tree was built with, so files stay readable by any build.
pub const MAX_ORDER: usize = 32;

/// Order used when none is given.
pub const DEFAULT_ORDER: usize = MIN_ORDER;

/// Size of one block on disk in bytes.
///
/// # Layout
/// ```text
/// Offset          Size               Field
/// ------          ----               -----
/// 0               4                  key_count (i32, little-endian)
/// 4               4 × MAX_ORDER      keys (i32, padded with zeros)
/// 4 + 4×MAX_ORDER 4 × (MAX_ORDER+1)  children (u32, padded with zeros)
/// ```
pub const BLOCK_SIZE: usize = 4 * (1 + MAX_ORDER + MAX_ORDER + 1);

/// Maximum payload length of a data-store record in bytes.
pub const PAYLOAD_SIZE: usize = 64;

/// Size of one data-store record on disk in bytes.
///
/// key (4) + flags (1) + reserved (3) + payload + crc32 (4).
pub const RECORD_SIZE: usize = 4 + 1 + 3 + PAYLOAD_SIZE + 4;

/// How hard a block write tries to reach stable storage before returning.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Durability {
    /// Hand every write to the operating system before returning.
    #[default]
    Flush,
    /// Additionally `fsync()` after every write.
    Sync,
}

/// Settings for opening a tree.
///
/// # Example
/// ```
/// use mwaytree::{Durability, TreeConfig};
///
/// let config = TreeConfig::new(5).unwrap().with_durability(Durability::Sync);
/// assert_eq!(config.order(), 5);
/// assert!(TreeConfig::new(2).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeConfig {
    order: usize,
    durability: Durability,
}

impl TreeConfig {
    /// Create a config for the given order.
    ///
    /// # Errors
    /// Returns `Error::InvalidOrder` if `order` is outside
    /// `[MIN_ORDER, MAX_ORDER]`.
    pub fn new(order: usize) -> Result<Self> {
        Ok(Self {
            order: check_order(order)?,
            durability: Durability::default(),
        })
    }

    /// Replace the durability mode.
    pub fn with_durability(mut self, durability: Durability) -> Self {
        self.durability = durability;
        self
    }

    #[inline]
    pub fn order(&self) -> usize {
        self.order
    }

    #[inline]
    pub fn durability(&self) -> Durability {
        self.durability
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            order: DEFAULT_ORDER,
            durability: Durability::default(),
        }
    }
}

/// Validate an order against the supported range.
pub fn check_order(order: usize) -> Result<usize> {
    if (MIN_ORDER..=MAX_ORDER).contains(&order) {
        Ok(order)
    } else {
        Err(Error::InvalidOrder(order))
    }
}

/// Minimum number of keys a non-root internal node must hold: `ceil(order/2) - 1`.
#[inline]
pub fn min_keys(order: usize) -> usize {
    order.div_ceil(2) - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_size() {
        // 1 count + 32 keys + 33 children, 4 bytes each
        assert_eq!(BLOCK_SIZE, 264);
    }

    #[test]
    fn test_record_size() {
        assert_eq!(RECORD_SIZE, 76);
    }

    #[test]
    fn test_min_keys() {
        assert_eq!(min_keys(3), 1);
        assert_eq!(min_keys(4), 1);
        assert_eq!(min_keys(5), 2);
        assert_eq!(min_keys(6), 2);
        assert_eq!(min_keys(32), 15);
    }

    #[test]
    fn test_check_order_bounds() {
        assert!(check_order(MIN_ORDER).is_ok());
        assert!(check_order(MAX_ORDER).is_ok());
        assert!(matches!(check_order(2), Err(Error::InvalidOrder(2))));
        assert!(matches!(check_order(33), Err(Error::InvalidOrder(33))));
    }

    #[test]
    fn test_config_default() {
        let config = TreeConfig::default();
        assert_eq!(config.order(), DEFAULT_ORDER);
        assert_eq!(config.durability(), Durability::Flush);
    }
}
