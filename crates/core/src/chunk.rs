//! Chunk stack: argument-frame storage
//!
//! Ordinary function calls put their argument cells in a chunk: a vector
//! acquired from a size-segregated free list and returned to it when the
//! call completes. Acquire and release are strictly paired; the live count
//! lets tests assert that every call released its chunk, including on
//! throw and error unwinds.
//!
//! Durable frames (closures, reified FRAME! values) do not use chunks:
//! their storage is a heap context whose lifetime is shared ownership.

use crate::value::Value;

/// Free-list size classes by capacity: 4, 8, 16, 32, 64, 128.
const CLASSES: usize = 6;
const MAX_CLASSED: usize = 128;
/// Retained chunks per class; beyond this, released chunks are dropped.
const KEEP_PER_CLASS: usize = 16;

fn class_of(capacity: usize) -> Option<usize> {
    if capacity > MAX_CLASSED {
        return None;
    }
    let mut size = 4usize;
    for class in 0..CLASSES {
        if capacity <= size {
            return Some(class);
        }
        size *= 2;
    }
    None
}

fn class_capacity(class: usize) -> usize {
    4 << class
}

#[derive(Debug)]
pub struct ChunkStack {
    free: Vec<Vec<Vec<Value>>>,
    live: usize,
    high_water: usize,
}

impl Default for ChunkStack {
    fn default() -> Self {
        ChunkStack::new()
    }
}

impl ChunkStack {
    pub fn new() -> ChunkStack {
        ChunkStack {
            free: (0..CLASSES).map(|_| Vec::new()).collect(),
            live: 0,
            high_water: 0,
        }
    }

    /// Chunks currently out on loan.
    pub fn live(&self) -> usize {
        self.live
    }

    /// Largest number of simultaneous live chunks seen.
    pub fn high_water(&self) -> usize {
        self.high_water
    }

    /// Hand out an empty chunk with capacity for at least `n` cells.
    pub fn acquire(&mut self, n: usize) -> Vec<Value> {
        self.live += 1;
        self.high_water = self.high_water.max(self.live);
        match class_of(n) {
            Some(class) => match self.free[class].pop() {
                Some(chunk) => chunk,
                None => Vec::with_capacity(class_capacity(class)),
            },
            // Oversized frames are allocated fresh and dropped on release.
            None => Vec::with_capacity(n),
        }
    }

    /// Return a chunk to the free list.
    pub fn release(&mut self, mut chunk: Vec<Value>) {
        debug_assert!(self.live > 0, "chunk release without acquire");
        self.live = self.live.saturating_sub(1);
        chunk.clear();
        if let Some(class) = class_of(chunk.capacity())
            && self.free[class].len() < KEEP_PER_CLASS
        {
            self.free[class].push(chunk);
        }
    }
}
