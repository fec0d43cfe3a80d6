//! Frame memory

use crate::word;
use fugue_primitives::U256;

/// Byte-addressed frame memory. Grows in whole words and never shrinks.
///
/// Callers expand (and pay for) a region through [`Memory::resize`] before
/// touching it; the accessors below panic on out-of-range offsets.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    data: Vec<u8>,
}

impl Memory {
    /// Create new empty memory
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Current size in bytes, always a multiple of 32
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Grow to cover `end` bytes, rounded up to a word boundary
    pub fn resize(&mut self, end: usize) {
        let aligned = end.div_ceil(32) * 32;
        if aligned > self.data.len() {
            self.data.resize(aligned, 0);
        }
    }

    /// Load a 32-byte word
    pub fn load(&self, offset: usize) -> U256 {
        U256::from_big_endian(&self.data[offset..offset + 32])
    }

    /// Store a 32-byte word
    pub fn store(&mut self, offset: usize, value: U256) {
        value.to_big_endian(&mut self.data[offset..offset + 32]);
    }

    /// Store the low byte of `value`
    pub fn store8(&mut self, offset: usize, value: U256) {
        self.data[offset] = value.low_u32() as u8;
    }

    /// Borrow a region
    pub fn slice(&self, offset: usize, size: usize) -> &[u8] {
        if size == 0 {
            return &[];
        }
        &self.data[offset..offset + size]
    }

    /// Write `data` at `offset`
    pub fn set(&mut self, offset: usize, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        self.data[offset..offset + data.len()].copy_from_slice(data);
    }

    /// Copy `size` bytes of `source` starting at `source_offset` into memory,
    /// zero-filling whatever lies past the end of `source`.
    pub fn set_padded(&mut self, offset: usize, size: usize, source: &[u8], source_offset: U256) {
        if size == 0 {
            return;
        }
        let target = &mut self.data[offset..offset + size];
        let start = word::to_usize(source_offset)
            .unwrap_or(usize::MAX)
            .min(source.len());
        let available = (source.len() - start).min(size);
        target[..available].copy_from_slice(&source[start..start + available]);
        target[available..].fill(0);
    }

    /// Copy within memory; regions may overlap
    pub fn copy_within(&mut self, dest: usize, src: usize, size: usize) {
        if size == 0 {
            return;
        }
        self.data.copy_within(src..src + size, dest);
    }

    /// Raw contents
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}
