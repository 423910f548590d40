//! Scratch stack
//!
//! A bounded, stack-disciplined budget for short-lived per-call buffers
//! such as derived storage keys.
//!
//! Opening a [`ScratchFrame`] marks a save point; dropping it releases every
//! byte the frame allocated, so nothing leaks on early returns or `?`.
//! Frames nest: a host callback that re-enters the backend opens its own
//! frame on top of the caller's. No lock is held while a frame is open, so
//! frames on different threads never wait on each other.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Fixed-size region handed out in stack frames
pub struct ScratchStack {
    capacity: usize,
    top: AtomicUsize,
}

impl ScratchStack {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            top: AtomicUsize::new(0),
        }
    }

    /// Open a frame over the region
    pub fn frame(&self) -> ScratchFrame<'_> {
        ScratchFrame {
            stack: self,
            reserved: 0,
            buffers: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes currently allocated. Zero whenever no frame is open.
    pub fn in_use(&self) -> usize {
        self.top.load(Ordering::Acquire)
    }

    fn reserve(&self, len: usize) -> bool {
        self.top
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |top| {
                top.checked_add(len).filter(|&end| end <= self.capacity)
            })
            .is_ok()
    }
}

/// An open frame; allocations are released when it drops
pub struct ScratchFrame<'a> {
    stack: &'a ScratchStack,
    reserved: usize,
    buffers: Vec<Box<[u8]>>,
}

impl ScratchFrame<'_> {
    /// Allocate `len` zeroed bytes, or None if the region is exhausted
    pub fn alloc(&mut self, len: usize) -> Option<&mut [u8]> {
        if !self.stack.reserve(len) {
            return None;
        }
        self.reserved += len;
        self.buffers.push(vec![0u8; len].into_boxed_slice());
        self.buffers.last_mut().map(|b| &mut b[..])
    }
}

impl Drop for ScratchFrame<'_> {
    fn drop(&mut self) {
        self.stack.top.fetch_sub(self.reserved, Ordering::AcqRel);
    }
}
