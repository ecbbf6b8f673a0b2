//! Byte-addressable, word-growing linear memory.

use crate::{error::StatusCode, primitives::Word};

/// Caps how large an offset the interpreter will even attempt to grow to,
/// independent of gas — without it a single crafted offset could ask for an
/// allocation no gas bound would ever actually pay for.
const MAX_OFFSET: u64 = u32::MAX as u64;

#[derive(Clone, Debug, Default)]
pub struct Memory(Vec<u8>);

impl Memory {
    pub fn new() -> Self {
        Self(Vec::with_capacity(4 * 1024))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of 32-byte words needed to cover `offset + size`, or `None` if
    /// that exceeds [`MAX_OFFSET`].
    pub fn words_needed(offset: u64, size: u64) -> Option<u64> {
        let end = offset.checked_add(size)?;
        if end > MAX_OFFSET {
            return None;
        }
        Some(crate::primitives::ceil_div(end, 32))
    }

    /// Grows the backing buffer to `words * 32` bytes if it is currently
    /// smaller. Does not charge gas — callers must charge
    /// `Gas::memory_expansion_cost` themselves before growing, per the
    /// component contract.
    pub fn grow_to_words(&mut self, words: u64) {
        let new_len = (words * 32) as usize;
        if new_len > self.0.len() {
            self.0.resize(new_len, 0);
        }
    }

    fn bounds_check(offset: Word, size: u64) -> Result<u64, StatusCode> {
        if offset > Word::from(MAX_OFFSET) {
            return Err(StatusCode::OutOfGas);
        }
        Ok(offset.as_u64())
    }

    pub fn mload(&mut self, offset: Word) -> Result<Word, StatusCode> {
        let offset = Self::bounds_check(offset, 32)?;
        let words = Self::words_needed(offset, 32).ok_or(StatusCode::OutOfGas)?;
        self.grow_to_words(words);
        let offset = offset as usize;
        Ok(Word::from_big_endian(&self.0[offset..offset + 32]))
    }

    pub fn mstore(&mut self, offset: Word, value: Word) -> Result<(), StatusCode> {
        let offset = Self::bounds_check(offset, 32)?;
        let words = Self::words_needed(offset, 32).ok_or(StatusCode::OutOfGas)?;
        self.grow_to_words(words);
        let offset = offset as usize;
        let mut buf = [0u8; 32];
        value.to_big_endian(&mut buf);
        self.0[offset..offset + 32].copy_from_slice(&buf);
        Ok(())
    }

    pub fn mstore8(&mut self, offset: Word, value: u8) -> Result<(), StatusCode> {
        let offset = Self::bounds_check(offset, 1)?;
        let words = Self::words_needed(offset, 1).ok_or(StatusCode::OutOfGas)?;
        self.grow_to_words(words);
        self.0[offset as usize] = value;
        Ok(())
    }

    /// Returns a copy of `size` bytes at `offset`, growing memory if needed.
    /// A zero-length request never grows memory and returns an empty vec.
    pub fn get_slice(&mut self, offset: Word, size: u64) -> Result<Vec<u8>, StatusCode> {
        if size == 0 {
            return Ok(Vec::new());
        }
        let offset = Self::bounds_check(offset, size)?;
        let words = Self::words_needed(offset, size).ok_or(StatusCode::OutOfGas)?;
        self.grow_to_words(words);
        let offset = offset as usize;
        let size = size as usize;
        Ok(self.0[offset..offset + size].to_vec())
    }

    /// Writes `data` at `offset`, zero-filling any bytes of the destination
    /// region beyond `data`'s length (used by the *COPY family when the
    /// source runs out before the requested length).
    pub fn set_data(&mut self, offset: Word, data: &[u8], size: u64) -> Result<(), StatusCode> {
        if size == 0 {
            return Ok(());
        }
        let offset = Self::bounds_check(offset, size)?;
        let words = Self::words_needed(offset, size).ok_or(StatusCode::OutOfGas)?;
        self.grow_to_words(words);
        let offset = offset as usize;
        let size = size as usize;
        let copy_len = data.len().min(size);
        self.0[offset..offset + copy_len].copy_from_slice(&data[..copy_len]);
        if copy_len < size {
            self.0[offset + copy_len..offset + size].fill(0);
        }
        Ok(())
    }

    /// EIP-5656 MCOPY: possibly-overlapping in-memory copy.
    pub fn mcopy(&mut self, dst: Word, src: Word, size: u64) -> Result<(), StatusCode> {
        if size == 0 {
            return Ok(());
        }
        let dst_off = Self::bounds_check(dst, size)?;
        let src_off = Self::bounds_check(src, size)?;
        let words =
            Self::words_needed(dst_off.max(src_off), size).ok_or(StatusCode::OutOfGas)?;
        self.grow_to_words(words);
        let (dst_off, src_off, size) = (dst_off as usize, src_off as usize, size as usize);
        self.0.copy_within(src_off..src_off + size, dst_off);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mstore_mload_roundtrip() {
        let mut m = Memory::new();
        m.mstore(0.into(), 0xdeadbeefu64.into()).unwrap();
        assert_eq!(m.mload(0.into()).unwrap(), 0xdeadbeefu64.into());
        assert_eq!(m.len() % 32, 0);
    }

    #[test]
    fn zero_length_never_grows() {
        let mut m = Memory::new();
        m.get_slice(1000.into(), 0).unwrap();
        assert_eq!(m.len(), 0);
    }

    #[test]
    fn mcopy_overlap_forward() {
        let mut m = Memory::new();
        m.set_data(0.into(), &[1, 2, 3, 4, 5], 5).unwrap();
        m.mcopy(2.into(), 0.into(), 5).unwrap();
        let out = m.get_slice(2.into(), 5).unwrap();
        assert_eq!(out, vec![1, 2, 3, 4, 5]);
    }
}
