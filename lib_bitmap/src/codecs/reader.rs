use crate::error::{CodecError, Result};

/// Bounds-checked cursor over an in-memory file.
///
/// Every read names what it was reading so a short file reports where it
/// ran out.
pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn skip(&mut self, len: usize, context: &'static str) -> Result<()> {
        self.bytes(len, context).map(|_| ())
    }

    pub fn bytes(&mut self, len: usize, context: &'static str) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| CodecError::truncated(context, len, self.remaining()))?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self, context: &'static str) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(N, context)?);
        Ok(out)
    }

    pub fn u8(&mut self, context: &'static str) -> Result<u8> {
        Ok(self.array::<1>(context)?[0])
    }

    pub fn u16_le(&mut self, context: &'static str) -> Result<u16> {
        self.array(context).map(u16::from_le_bytes)
    }

    pub fn u32_le(&mut self, context: &'static str) -> Result<u32> {
        self.array(context).map(u32::from_le_bytes)
    }

    pub fn i32_le(&mut self, context: &'static str) -> Result<i32> {
        self.array(context).map(i32::from_le_bytes)
    }

    pub fn u32_be(&mut self, context: &'static str) -> Result<u32> {
        self.array(context).map(u32::from_be_bytes)
    }
}
