//! Serialized forms of a skeleton.
//!
//! - [`ostd`]: checksummed binary container with typed attributes.
//! - [`precomputed`]: length-prefixed binary used by volumetric viewers.
//! - [`swc`]: the line-oriented neuron morphology text format.

pub mod ostd;
pub mod precomputed;
pub mod swc;

use crc::{Crc, CRC_16_ARC, CRC_32_ISCSI};

use crate::error::FormatError;

const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_ARC);
const CRC32C: Crc<u32> = Crc::<u32>::new(&CRC_32_ISCSI);

pub(crate) fn crc16(bytes: &[u8]) -> u16 {
    CRC16.checksum(bytes)
}

pub(crate) fn crc32c(bytes: &[u8]) -> u32 {
    CRC32C.checksum(bytes)
}

/// Multiplies element counts into a byte length, failing on overflow.
pub(crate) fn block_len(count: u64, item_bytes: usize) -> Result<usize, FormatError> {
    usize::try_from(count)
        .ok()
        .and_then(|count| count.checked_mul(item_bytes))
        .ok_or_else(|| FormatError::Malformed(format!("block of {count} elements is too large")))
}

/// Sequential little-endian reader over a byte buffer.
pub(crate) struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    pub(crate) fn at(bytes: &'a [u8], offset: usize) -> Self {
        Self { bytes, offset }
    }

    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    pub(crate) fn take(&mut self, len: usize) -> Result<&'a [u8], FormatError> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(FormatError::Truncated {
                needed: self.offset.saturating_add(len),
                actual: self.bytes.len(),
            })?;
        let slice = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], FormatError> {
        let mut buf = [0_u8; N];
        buf.copy_from_slice(self.take(N)?);
        Ok(buf)
    }

    pub(crate) fn u8(&mut self) -> Result<u8, FormatError> {
        Ok(self.array::<1>()?[0])
    }

    pub(crate) fn u16(&mut self) -> Result<u16, FormatError> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    pub(crate) fn u32(&mut self) -> Result<u32, FormatError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    pub(crate) fn u64(&mut self) -> Result<u64, FormatError> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    pub(crate) fn f32(&mut self) -> Result<f32, FormatError> {
        Ok(f32::from_le_bytes(self.array()?))
    }

    pub(crate) fn f64(&mut self) -> Result<f64, FormatError> {
        Ok(f64::from_le_bytes(self.array()?))
    }

    /// Reads an unsigned little-endian integer stored in `width` bytes.
    pub(crate) fn uint(&mut self, width: usize) -> Result<u64, FormatError> {
        let mut buf = [0_u8; 8];
        buf[..width].copy_from_slice(self.take(width)?);
        Ok(u64::from_le_bytes(buf))
    }
}
