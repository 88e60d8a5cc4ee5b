//! Memory-mapped register access
//!
//! All AM335x peripheral registers are 32 bits wide and word aligned. A
//! [`Block`] is the base address of one module; registers are addressed by
//! byte offset from it, matching the tables in the technical reference
//! manual.

use core::ptr;

/// Base address of one peripheral register block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    base: usize,
}

impl Block {
    /// Wrap a register block base address
    ///
    /// # Safety
    ///
    /// `base` must be the base of a peripheral register block that stays
    /// mapped for the life of the program, and every offset later passed to
    /// this block must name a register inside it. Reads and writes through
    /// the returned value have hardware side effects.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    /// Base address
    pub const fn base(self) -> usize {
        self.base
    }

    #[inline(always)]
    fn reg(self, offset: usize) -> *mut u32 {
        (self.base + offset) as *mut u32
    }

    /// Volatile read of the register at `offset`
    #[inline(always)]
    pub fn read(self, offset: usize) -> u32 {
        // SAFETY: offset validity is the contract of `Block::new`
        unsafe { ptr::read_volatile(self.reg(offset)) }
    }

    /// Volatile write of the register at `offset`
    #[inline(always)]
    pub fn write(self, offset: usize, value: u32) {
        // SAFETY: offset validity is the contract of `Block::new`
        unsafe { ptr::write_volatile(self.reg(offset), value) }
    }

    /// Read-modify-write
    ///
    /// Not atomic. Registers also modified from interrupt context must only
    /// be changed this way with interrupts masked.
    #[inline(always)]
    pub fn modify(self, offset: usize, f: impl FnOnce(u32) -> u32) {
        let value = self.read(offset);
        self.write(offset, f(value));
    }

    /// Set bits with a read-modify-write
    #[inline(always)]
    pub fn set_bits(self, offset: usize, mask: u32) {
        self.modify(offset, |v| v | mask);
    }

    /// Clear bits with a read-modify-write
    #[inline(always)]
    pub fn clear_bits(self, offset: usize, mask: u32) {
        self.modify(offset, |v| v & !mask);
    }

    /// Check whether any bit of `mask` is set
    #[inline(always)]
    pub fn any_set(self, offset: usize, mask: u32) -> bool {
        self.read(offset) & mask != 0
    }

    /// Poll until `done` holds for the register value
    ///
    /// Gives up after `budget` reads. Returns the last value read, or `None`
    /// if the budget ran out.
    pub fn poll(self, offset: usize, budget: u32, mut done: impl FnMut(u32) -> bool) -> Option<u32> {
        for _ in 0..budget {
            let value = self.read(offset);
            if done(value) {
                return Some(value);
            }
        }
        None
    }
}

/// Plain memory standing in for a register block in host tests
#[cfg(test)]
pub(crate) struct RegisterFile {
    words: *mut [u32],
    len: usize,
}

#[cfg(test)]
impl RegisterFile {
    /// Zeroed block covering offsets `0..size`
    pub fn new(size: usize) -> Self {
        let words = vec![0u32; size.div_ceil(4)].into_boxed_slice();
        Self {
            len: words.len(),
            words: Box::into_raw(words),
        }
    }

    /// Base address to put in a peripheral config
    pub fn base(&self) -> usize {
        self.words as *mut u32 as usize
    }

    fn block(&self, offset: usize) -> Block {
        assert!(offset / 4 < self.len, "offset {:#x} outside block", offset);
        // SAFETY: the allocation lives as long as `self` and offset is in range
        unsafe { Block::new(self.base()) }
    }

    pub fn get(&self, offset: usize) -> u32 {
        self.block(offset).read(offset)
    }

    pub fn set(&self, offset: usize, value: u32) {
        self.block(offset).write(offset, value);
    }
}

#[cfg(test)]
impl Drop for RegisterFile {
    fn drop(&mut self) {
        // SAFETY: produced by Box::into_raw in `new` and freed only here
        drop(unsafe { Box::from_raw(self.words) });
    }
}
