//! Bit level access to a 128-bit block.
//!
//! Fields are stored LSB first: bit 0 of byte 0 is the first bit of the block and a field
//! that does not fit into the rest of its byte continues at bit 0 of the next byte.

pub(crate) const BLOCK_BITS: usize = 128;

macro_rules! mask {
    ($bits:expr) => {
        if $bits >= 32 {
            u32::MAX
        } else {
            (1u32 << $bits) - 1
        }
    };
}

/// Reads `width` bits starting at `bit_offset`.
pub(crate) fn read_bits(block: &[u8; 16], bit_offset: usize, width: usize) -> u32 {
    assert!(width <= 32, "field width {width} exceeds 32 bits");
    assert!(
        bit_offset + width <= BLOCK_BITS,
        "field at bit {bit_offset} with width {width} overflows the block"
    );

    let mut value = 0u32;
    let mut read = 0;
    let mut pos = bit_offset;

    while read < width {
        let byte = block[pos / 8] as u32;
        let shift = pos % 8;
        let take = usize::min(8 - shift, width - read);
        let part = (byte >> shift) & mask!(take);
        value |= part << read;
        read += take;
        pos += take;
    }

    value
}

/// Writes the low `width` bits of `value` starting at `bit_offset`. Bits outside of the
/// field keep their value.
pub(crate) fn write_bits(block: &mut [u8; 16], bit_offset: usize, width: usize, value: u32) {
    assert!(width <= 32, "field width {width} exceeds 32 bits");
    assert!(
        bit_offset + width <= BLOCK_BITS,
        "field at bit {bit_offset} with width {width} overflows the block"
    );

    let value = value & mask!(width);
    let mut written = 0;
    let mut pos = bit_offset;

    while written < width {
        let shift = pos % 8;
        let take = usize::min(8 - shift, width - written);
        let field_mask = (mask!(take) << shift) as u8;
        let part = (((value >> written) & mask!(take)) << shift) as u8;
        let byte = &mut block[pos / 8];
        *byte = (*byte & !field_mask) | part;
        written += take;
        pos += take;
    }
}

/// Sequential reader over a block.
pub(crate) struct BitReader<'a> {
    block: &'a [u8; 16],
    bit_pos: usize,
}

impl<'a> BitReader<'a> {
    pub(crate) fn new(block: &'a [u8; 16]) -> Self {
        Self { block, bit_pos: 0 }
    }

    #[cfg(test)]
    pub(crate) fn position(&self) -> usize {
        self.bit_pos
    }

    pub(crate) fn remaining(&self) -> usize {
        BLOCK_BITS - self.bit_pos
    }

    #[inline]
    pub(crate) fn read(&mut self, width: usize) -> u32 {
        let v = read_bits(self.block, self.bit_pos, width);
        self.bit_pos += width;
        v
    }

    #[inline]
    pub(crate) fn read_bit(&mut self) -> bool {
        self.read(1) != 0
    }
}

/// Sequential writer over a block.
pub(crate) struct BitWriter<'a> {
    block: &'a mut [u8; 16],
    bit_pos: usize,
}

impl<'a> BitWriter<'a> {
    pub(crate) fn new(block: &'a mut [u8; 16]) -> Self {
        Self { block, bit_pos: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.bit_pos
    }

    #[inline]
    pub(crate) fn write(&mut self, width: usize, value: u32) {
        write_bits(self.block, self.bit_pos, width, value);
        self.bit_pos += width;
    }

    #[inline]
    pub(crate) fn write_bit(&mut self, bit: bool) {
        self.write(1, bit as u32);
    }
}
