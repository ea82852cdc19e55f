//! Page Store - block-addressed file I/O for the index.
//!
//! The [`PageStore`] handles all direct file operations on an index file:
//! - Reading, writing, and appending node blocks
//! - Reading and writing the header block
//! - Counting block I/O

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::common::config::{Durability, BLOCK_SIZE};
use crate::common::{Error, NodeId, Result};
use crate::storage::block::{read_i32, Block, Node, TreeHeader, HEADER_MARKER};
use crate::storage::{IoCounters, IoStats};

/// Manages block I/O for a single index file.
///
/// # File Layout
/// The index is stored as a single file with blocks laid out sequentially:
/// ```text
/// ┌──────────┬──────────┬──────────┬─────────┬──────────┐
/// │ Block 0  │ Block 1  │ Block 2  │  ...    │ Block N  │
/// │ (header) │ (node)   │ (node)   │         │ (node)   │
/// └──────────┴──────────┴──────────┴─────────┴──────────┘
/// Offset:  0     264        528       ...     N×264
/// ```
///
/// Block N is located at file offset `N × BLOCK_SIZE`. Positions are stable:
/// blocks are appended or rewritten in place, never moved or reclaimed.
///
/// # Durability
/// Every write reaches the operating system before the call returns; with
/// [`Durability::Sync`] it is also `fsync`ed. Writes are never batched.
///
/// # Statistics
/// Node reads, node writes, and appends are counted. Header I/O is not.
pub struct PageStore {
    file: File,
    path: PathBuf,
    /// Number of whole blocks in the file, header included.
    block_count: u32,
    durability: Durability,
    stats: IoStats,
}

impl PageStore {
    /// Create (or truncate) an index file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P, durability: Durability) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path.as_ref())?;

        Ok(Self {
            file,
            path: path.as_ref().to_path_buf(),
            block_count: 0,
            durability,
            stats: IoStats::new(),
        })
    }

    /// Open an existing index file for reading and writing.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist or cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P, durability: Durability) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path.as_ref())?;
        Self::from_file(file, path.as_ref(), durability)
    }

    /// Open an existing index file without write access.
    ///
    /// Any write through the returned store fails with an I/O error.
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).open(path.as_ref())?;
        Self::from_file(file, path.as_ref(), Durability::Flush)
    }

    fn from_file(file: File, path: &Path, durability: Durability) -> Result<Self> {
        // Calculate block count from file size; a torn trailing block is ignored
        let file_size = file.metadata()?.len();
        let block_count = (file_size / BLOCK_SIZE as u64) as u32;

        Ok(Self {
            file,
            path: path.to_path_buf(),
            block_count,
            durability,
            stats: IoStats::new(),
        })
    }

    // ========================================================================
    // Nodes
    // ========================================================================

    /// Read any block, header included.
    ///
    /// # Errors
    /// - `Error::NodeNotFound` if the block lies past the end of the file
    /// - `Error::Corrupt` if the block cannot be decoded
    pub fn read_block(&mut self, id: NodeId) -> Result<Block> {
        let data = self.read_raw(id)?;
        self.stats.record_read();
        Block::decode(id, &data)
    }

    /// Read the node at `id`.
    ///
    /// # Errors
    /// - `Error::InvalidNodeId` for position 0
    /// - `Error::NodeNotFound` if the block lies past the end of the file
    /// - `Error::Corrupt` if the block is not a live node
    pub fn read_node(&mut self, id: NodeId) -> Result<Node> {
        if id.is_null() {
            return Err(Error::InvalidNodeId(id.0));
        }

        match self.read_block(id)? {
            Block::Node(node) => Ok(node),
            Block::Header(_) => Err(Error::corrupt(id.0, "header block inside the tree")),
            Block::Abandoned => Err(Error::corrupt(id.0, "abandoned block inside the tree")),
        }
    }

    /// Overwrite the node at `id` in place.
    ///
    /// # Errors
    /// - `Error::InvalidNodeId` for position 0
    /// - `Error::NodeNotFound` if the block hasn't been appended yet
    pub fn write_node(&mut self, node: &Node, id: NodeId) -> Result<()> {
        self.write_existing(id, &node.encode())
    }

    /// Append a node at the end of the file and return its position.
    pub fn append_node(&mut self, node: &Node) -> Result<NodeId> {
        // Position 0 belongs to the header even if it was never written
        let id = NodeId::new(self.block_count.max(1));
        self.write_raw(id, &node.encode())?;
        self.block_count = id.0 + 1;
        self.stats.record_write();
        Ok(id)
    }

    /// Mark the node at `id` as abandoned. The position is never reused.
    pub fn abandon(&mut self, id: NodeId) -> Result<()> {
        self.write_existing(id, &Block::Abandoned.encode())
    }

    fn write_existing(&mut self, id: NodeId, data: &[u8; BLOCK_SIZE]) -> Result<()> {
        if id.is_null() {
            return Err(Error::InvalidNodeId(id.0));
        }
        if id.0 >= self.block_count {
            return Err(Error::NodeNotFound(id.0));
        }

        self.write_raw(id, data)?;
        self.stats.record_write();
        Ok(())
    }

    // ========================================================================
    // Header
    // ========================================================================

    /// Read the header block.
    ///
    /// Returns `None` if the file is empty or block 0 is not a sentinel.
    pub fn read_header(&mut self) -> Result<Option<TreeHeader>> {
        if self.block_count == 0 {
            return Ok(None);
        }

        let data = self.read_raw(NodeId::HEADER)?;
        if read_i32(&data, 0) != HEADER_MARKER {
            return Ok(None);
        }
        TreeHeader::read_from(NodeId::HEADER, &data).map(Some)
    }

    /// Write the header block, creating it if the file is empty.
    pub fn write_header(&mut self, header: &TreeHeader) -> Result<()> {
        self.write_raw(NodeId::HEADER, &Block::Header(*header).encode())?;
        self.block_count = self.block_count.max(1);
        Ok(())
    }

    // ========================================================================
    // Raw I/O
    // ========================================================================

    fn read_raw(&mut self, id: NodeId) -> Result<[u8; BLOCK_SIZE]> {
        if id.0 >= self.block_count {
            return Err(Error::NodeNotFound(id.0));
        }

        self.file.seek(SeekFrom::Start(id.offset(BLOCK_SIZE)))?;
        let mut data = [0u8; BLOCK_SIZE];
        self.file.read_exact(&mut data)?;
        Ok(data)
    }

    fn write_raw(&mut self, id: NodeId, data: &[u8; BLOCK_SIZE]) -> Result<()> {
        self.file.seek(SeekFrom::Start(id.offset(BLOCK_SIZE)))?;
        self.file.write_all(data)?;
        self.file.flush()?;
        if self.durability == Durability::Sync {
            self.file.sync_data()?;
        }
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Number of blocks in the file, header included.
    #[inline]
    pub fn block_count(&self) -> u32 {
        self.block_count
    }

    /// Number of node positions (`1..=node_count()`), abandoned ones included.
    #[inline]
    pub fn node_count(&self) -> u32 {
        self.block_count.saturating_sub(1)
    }

    /// Size of the index file in bytes (whole blocks only).
    #[inline]
    pub fn file_size(&self) -> u64 {
        (self.block_count as u64) * (BLOCK_SIZE as u64)
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Counters accumulated since the last reset.
    #[inline]
    pub fn stats(&self) -> IoCounters {
        self.stats.snapshot()
    }

    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }
}
