//! Block I/O statistics.

use std::fmt;

/// Block reads and writes counted by a store.
///
/// Counters accumulate until [`IoStats::reset`]; every public tree or
/// data-store operation resets them at entry, so a snapshot taken right
/// after a call attributes I/O to exactly that call.
///
/// # Example
/// ```
/// use mwaytree::IoStats;
///
/// let mut stats = IoStats::new();
/// stats.record_read();
/// stats.record_write();
/// stats.record_write();
/// assert_eq!(stats.snapshot().writes, 2);
/// ```
#[derive(Debug, Default)]
pub struct IoStats {
    reads: u64,
    writes: u64,
}

impl IoStats {
    /// Create a new tracker with both counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_read(&mut self) {
        self.reads += 1;
    }

    #[inline]
    pub fn record_write(&mut self) {
        self.writes += 1;
    }

    /// Get a copy of the current counters.
    pub fn snapshot(&self) -> IoCounters {
        IoCounters {
            reads: self.reads,
            writes: self.writes,
        }
    }

    /// Reset both counters to zero.
    pub fn reset(&mut self) {
        self.reads = 0;
        self.writes = 0;
    }
}

/// A point-in-time copy of [`IoStats`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IoCounters {
    pub reads: u64,
    pub writes: u64,
}

impl IoCounters {
    /// Total block transfers.
    pub fn total(&self) -> u64 {
        self.reads + self.writes
    }
}

impl fmt::Display for IoCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "I/O {{ reads: {}, writes: {} }}", self.reads, self.writes)
    }
}
