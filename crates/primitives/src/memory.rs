use alloy::primitives::U256;

use crate::errors::MemoryError;
use crate::uint::U256Ext;

/// Hard cap on a single call frame's memory, per spec: 128 MiB.
pub const MEMORY_LIMIT: usize = 128 * 1024 * 1024;

const WORD_SIZE: usize = 32;

/// Byte-addressable, word-aligned, auto-growing volatile memory for one
/// call frame. Length is always a multiple of 32 and new bytes are
/// zero-initialized on growth.
#[derive(Debug, Clone, Default)]
pub struct Memory {
    data: Vec<u8>,
}

fn words_for(bytes: usize) -> usize {
    bytes.div_ceil(WORD_SIZE)
}

impl Memory {
    pub fn new() -> Self {
        Memory { data: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Memory size in 32-byte words, used by the gas accounting engine
    /// to compute expansion cost.
    pub fn len_words(&self) -> usize {
        words_for(self.data.len())
    }

    /// Compute the word count memory would occupy after covering
    /// `[offset, offset+size)`, without mutating. A zero-size request
    /// never grows memory.
    pub fn words_required(offset: usize, size: usize) -> Result<usize, MemoryError> {
        if size == 0 {
            return Ok(0);
        }
        let end = offset
            .checked_add(size)
            .ok_or(MemoryError::IntegerOverflow)?;
        if end > MEMORY_LIMIT {
            return Err(MemoryError::InvalidOffset(MEMORY_LIMIT));
        }
        Ok(words_for(end))
    }

    /// Grow memory to cover `[offset, offset+size)`, word-aligned,
    /// zero-filling new bytes. A zero-size request is a no-op.
    pub fn ensure_capacity(&mut self, offset: usize, size: usize) -> Result<(), MemoryError> {
        if size == 0 {
            return Ok(());
        }
        let words = Self::words_required(offset, size)?;
        let new_len = words * WORD_SIZE;
        if new_len > self.data.len() {
            self.data.resize(new_len, 0);
        }
        Ok(())
    }

    /// Load a 32-byte big-endian word, growing memory if necessary.
    pub fn mload(&mut self, offset: usize) -> Result<U256, MemoryError> {
        self.ensure_capacity(offset, WORD_SIZE)?;
        let bytes: [u8; 32] = self.data[offset..offset + WORD_SIZE]
            .try_into()
            .expect("ensure_capacity guarantees the slice is 32 bytes");
        Ok(U256::from_be_bytes(bytes))
    }

    /// Store a 32-byte big-endian word, growing memory if necessary.
    pub fn mstore(&mut self, offset: usize, value: U256) -> Result<(), MemoryError> {
        self.ensure_capacity(offset, WORD_SIZE)?;
        let bytes = value.to_be_bytes::<32>();
        self.data[offset..offset + WORD_SIZE].copy_from_slice(&bytes);
        Ok(())
    }

    /// Store the single least-significant byte of `value`.
    pub fn mstore8(&mut self, offset: usize, value: U256) -> Result<(), MemoryError> {
        self.ensure_capacity(offset, 1)?;
        let byte = value
            .try_to_u64()
            .map(|v| v as u8)
            .unwrap_or_else(|| value.to_be_bytes::<32>()[31]);
        self.data[offset] = byte;
        Ok(())
    }

    /// Borrow a view `[offset, offset+size)` without growing memory.
    /// Fails if the region is not already resident.
    pub fn get_slice(&self, offset: usize, size: usize) -> Result<&[u8], MemoryError> {
        if size == 0 {
            return Ok(&[]);
        }
        let end = offset
            .checked_add(size)
            .ok_or(MemoryError::IntegerOverflow)?;
        if end > self.data.len() {
            return Err(MemoryError::OutOfBounds {
                offset,
                size,
                len: self.data.len(),
            });
        }
        Ok(&self.data[offset..end])
    }

    pub fn get_slice_mut(&mut self, offset: usize, size: usize) -> Result<&mut [u8], MemoryError> {
        if size == 0 {
            return Ok(&mut []);
        }
        let end = offset
            .checked_add(size)
            .ok_or(MemoryError::IntegerOverflow)?;
        let len = self.data.len();
        if end > len {
            return Err(MemoryError::OutOfBounds { offset, size, len });
        }
        Ok(&mut self.data[offset..end])
    }

    /// Copy `size` bytes out of memory starting at `offset` into an
    /// owned buffer, growing memory if the region isn't resident yet.
    pub fn copy(&mut self, offset: usize, size: usize) -> Result<Vec<u8>, MemoryError> {
        self.ensure_capacity(offset, size)?;
        Ok(self.data[offset..offset + size].to_vec())
    }

    /// Write `bytes` into memory starting at `offset`, growing memory
    /// as needed.
    pub fn set(&mut self, offset: usize, bytes: &[u8]) -> Result<(), MemoryError> {
        self.ensure_capacity(offset, bytes.len())?;
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// `MCOPY`: copy `size` bytes from `src` to `dest` within this same
    /// memory, with `memmove` overlap semantics. Grows memory to cover
    /// the larger of the two regions first.
    pub fn mcopy(&mut self, dest: usize, src: usize, size: usize) -> Result<(), MemoryError> {
        if size == 0 {
            return Ok(());
        }
        let dest_words = Self::words_required(dest, size)?;
        let src_words = Self::words_required(src, size)?;
        let words = dest_words.max(src_words);
        let new_len = words * WORD_SIZE;
        if new_len > self.data.len() {
            self.data.resize(new_len, 0);
        }
        self.data.copy_within(src..src + size, dest);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_capacity_rounds_up_to_word_and_zero_fills() {
        let mut mem = Memory::new();
        mem.ensure_capacity(0, 1).unwrap();
        assert_eq!(mem.len(), 32);
        assert!(mem.get_slice(0, 32).unwrap().iter().all(|&b| b == 0));
    }

    #[test]
    fn zero_size_request_is_noop() {
        let mut mem = Memory::new();
        mem.ensure_capacity(1_000_000, 0).unwrap();
        assert_eq!(mem.len(), 0);
    }

    #[test]
    fn mstore_then_mload_round_trips() {
        let mut mem = Memory::new();
        let value = U256::from(0xDEADBEEFu64);
        mem.mstore(0, value).unwrap();
        assert_eq!(mem.mload(0).unwrap(), value);
    }

    #[test]
    fn mstore8_writes_low_byte_only() {
        let mut mem = Memory::new();
        mem.mstore8(0, U256::from(0x1FFu16)).unwrap();
        assert_eq!(mem.get_slice(0, 1).unwrap()[0], 0xFF);
    }

    #[test]
    fn offset_past_cap_is_rejected() {
        let mut mem = Memory::new();
        let err = mem.ensure_capacity(MEMORY_LIMIT, 1).unwrap_err();
        assert!(matches!(err, MemoryError::InvalidOffset(_)));
    }

    #[test]
    fn overflowing_offset_plus_size_errors() {
        let mut mem = Memory::new();
        let err = mem.ensure_capacity(usize::MAX, 32).unwrap_err();
        assert!(matches!(err, MemoryError::IntegerOverflow));
    }

    #[test]
    fn get_slice_does_not_grow_and_fails_out_of_bounds() {
        let mem = Memory::new();
        assert!(matches!(
            mem.get_slice(0, 32),
            Err(MemoryError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn mcopy_handles_forward_overlap_like_memmove() {
        let mut mem = Memory::new();
        mem.set(0, &[1, 2, 3, 4, 5]).unwrap();
        mem.mcopy(2, 0, 3).unwrap();
        assert_eq!(mem.get_slice(0, 5).unwrap(), &[1, 2, 1, 2, 3]);
    }
}
