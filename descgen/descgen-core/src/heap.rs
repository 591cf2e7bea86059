//! Native heap with allocation accounting.
//!
//! Every allocation a generated decoder makes lands here as a [`HeapBlock`]
//! and is addressed by its [`AllocId`]. The heap counts allocations and
//! frees and records every invalid release as a [`HeapFault`], which is how
//! decode/destroy pairs are checked for leaks and double frees.

use std::collections::BTreeMap;

use crate::{
    error::HeapFault,
    native::{AllocId, NativeValue},
};

/// Release operation a block must be freed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreeKind {
    /// `delete p`
    Delete,
    /// `delete[] p`
    DeleteArray,
}

/// Contents of one heap allocation.
#[derive(Debug, Clone, PartialEq)]
pub enum HeapBlock {
    /// `new T`
    Single(NativeValue),
    /// `new T[n]()`
    Array(Vec<NativeValue>),
    /// `new char[n]`, including the trailing NUL.
    CString(Vec<u8>),
}

impl HeapBlock {
    pub fn free_kind(&self) -> FreeKind {
        match self {
            Self::Single(_) => FreeKind::Delete,
            Self::Array(_) | Self::CString(_) => FreeKind::DeleteArray,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
    pub allocations: u64,
    pub frees: u64,
}

#[derive(Debug, Default)]
pub struct NativeHeap {
    next_id: u64,
    blocks: BTreeMap<AllocId, HeapBlock>,
    stats: HeapStats,
    faults: Vec<HeapFault>,
}

impl NativeHeap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, block: HeapBlock) -> AllocId {
        self.next_id += 1;
        let id = AllocId(self.next_id);
        self.blocks.insert(id, block);
        self.stats.allocations += 1;
        id
    }

    /// Allocate a NUL-terminated copy of `s`.
    pub fn alloc_c_string(&mut self, s: &str) -> AllocId {
        let mut bytes = Vec::with_capacity(s.len() + 1);
        bytes.extend_from_slice(s.as_bytes());
        bytes.push(0);
        self.alloc(HeapBlock::CString(bytes))
    }

    pub fn get(&self, id: AllocId) -> Option<&HeapBlock> {
        self.blocks.get(&id)
    }

    /// Overwrite the contents of a single-object block.
    pub fn store(&mut self, id: AllocId, value: NativeValue) {
        if let Some(HeapBlock::Single(slot)) = self.blocks.get_mut(&id) {
            *slot = value;
        }
    }

    /// Overwrite element `index` of an array block.
    pub fn store_element(&mut self, id: AllocId, index: usize, value: NativeValue) {
        if let Some(HeapBlock::Array(items)) = self.blocks.get_mut(&id)
            && let Some(slot) = items.get_mut(index)
        {
            *slot = value;
        }
    }

    /// Release a block, handing its contents back to the caller.
    ///
    /// Unknown ids and mismatched release kinds are recorded as faults. A
    /// mismatched release still removes the block so that one fault does not
    /// cascade into a leak report.
    pub fn free(&mut self, id: AllocId, kind: FreeKind) -> Result<HeapBlock, HeapFault> {
        let Some(block) = self.blocks.remove(&id) else {
            let fault = HeapFault::UnknownAllocation(id);
            log::warn!("{fault}");
            self.faults.push(fault.clone());
            return Err(fault);
        };
        self.stats.frees += 1;
        let expected = block.free_kind();
        if expected != kind {
            let fault = HeapFault::MismatchedFree {
                id,
                used: kind,
                expected,
            };
            log::warn!("{fault}");
            self.faults.push(fault.clone());
            return Err(fault);
        }
        Ok(block)
    }

    /// Read a NUL-terminated string block without the terminator.
    pub fn c_string(&self, id: AllocId) -> Option<&str> {
        match self.blocks.get(&id)? {
            HeapBlock::CString(bytes) => {
                let body = bytes.strip_suffix(&[0]).unwrap_or(bytes);
                std::str::from_utf8(body).ok()
            }
            _ => None,
        }
    }

    /// Number of blocks currently allocated.
    pub fn live(&self) -> usize {
        self.blocks.len()
    }

    pub fn stats(&self) -> HeapStats {
        self.stats
    }

    pub fn faults(&self) -> &[HeapFault] {
        &self.faults
    }
}
