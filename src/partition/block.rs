//! Block records tiling the simulated address space

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a block record
///
/// Assigned by the partition when the record is created and never reused,
/// so a stale id simply stops resolving once its block has been merged away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub(crate) u64);

/// One contiguous sub-range of the address space
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub(crate) id: BlockId,
    pub(crate) start: u64,
    pub(crate) size: u64,
    pub(crate) free: bool,
}

impl Block {
    pub fn id(&self) -> BlockId {
        self.id
    }

    /// Starting offset
    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// One past the last offset covered by this block
    pub fn end(&self) -> u64 {
        self.start + self.size
    }

    pub fn is_free(&self) -> bool {
        self.free
    }

    /// Check whether this block is free and large enough for `size`
    pub fn fits(&self, size: u64) -> bool {
        self.free && self.size >= size
    }

    pub fn info(&self) -> BlockInfo {
        BlockInfo {
            start: self.start,
            size: self.size,
            free: self.free,
        }
    }

    pub fn extent(&self) -> Extent {
        Extent::new(self.start, self.size)
    }
}

/// Plain view of a block, as handed to callers by `dump_blocks`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub start: u64,
    pub size: u64,
    pub free: bool,
}

impl fmt::Display for BlockInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Start: {}, Size: {}, Free: {}",
            self.start,
            self.size,
            if self.free { "Yes" } else { "No" }
        )
    }
}

/// A placed range handed out by an allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extent {
    /// Starting offset
    pub start: u64,
    /// Number of units covered
    pub size: u64,
}

impl Extent {
    pub fn new(start: u64, size: u64) -> Self {
        Extent { start, size }
    }

    pub fn end(&self) -> u64 {
        self.start + self.size
    }

    /// Check if this extent contains an offset
    pub fn contains(&self, offset: u64) -> bool {
        offset >= self.start && offset < self.end()
    }

    /// Check if this extent shares any offset with another
    pub fn overlaps(&self, other: &Extent) -> bool {
        self.start < other.end() && other.start < self.end()
    }
}
