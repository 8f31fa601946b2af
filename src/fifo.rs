//! Fixed-capacity pixel ring buffers for the PPU.
//!
//! The background pipeline needs more than a tile's worth of pixels queued
//! before it will emit any, so pushes are allowed while at most eight
//! pixels are buffered and pops only once more than eight are. The sprite
//! FIFO bypasses the threshold with [`PixelFifo::pop_any`] since sprites
//! arrive a full row at a time.

const CAPACITY: usize = 16;

/// Pixels a tile fetch must be able to deposit at once.
pub const FETCH_WIDTH: usize = 8;

#[derive(Debug, Clone)]
pub struct PixelFifo {
    slots: [u8; CAPACITY],
    head: usize,
    len: usize,
}

impl PixelFifo {
    pub fn new() -> Self {
        Self {
            slots: [0; CAPACITY],
            head: 0,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// Room for a full tile row.
    pub fn can_push(&self) -> bool {
        self.len <= FETCH_WIDTH
    }

    /// Enough buffered to start emitting.
    pub fn can_pop(&self) -> bool {
        self.len > FETCH_WIDTH
    }

    pub fn push(&mut self, pixel: u8) {
        debug_assert!(self.len < CAPACITY);
        self.slots[(self.head + self.len) % CAPACITY] = pixel;
        self.len += 1;
    }

    /// Pop the front pixel. Callers gate on [`PixelFifo::can_pop`].
    pub fn pop(&mut self) -> u8 {
        debug_assert!(self.len > 0);
        let pixel = self.slots[self.head];
        self.head = (self.head + 1) % CAPACITY;
        self.len -= 1;
        pixel
    }

    /// Pop regardless of the refill threshold; `None` when empty.
    pub fn pop_any(&mut self) -> Option<u8> {
        if self.len == 0 {
            return None;
        }
        Some(self.pop())
    }

    /// Peek at the pixel `index` slots behind the front.
    pub fn get(&self, index: usize) -> u8 {
        debug_assert!(index < self.len);
        self.slots[(self.head + index) % CAPACITY]
    }

    /// Overwrite the pixel `index` slots behind the front. Used to merge
    /// overlapping sprites.
    pub fn set(&mut self, index: usize, pixel: u8) {
        debug_assert!(index < self.len);
        self.slots[(self.head + index) % CAPACITY] = pixel;
    }
}

impl Default for PixelFifo {
    fn default() -> Self {
        Self::new()
    }
}
