//! Decoding of single 16 byte blocks.
//!
//! Both decoders are driven by the mode tables shared with the encoder, so a block is read
//! back with exactly the layout it was written with.

#[cfg(feature = "bc6h")]
use half::f16;

use crate::{bits::BitReader, error::MalformedBlock, palette::interpolate, tables::*};
#[cfg(feature = "bc6h")]
use crate::{
    color::RgbF16,
    quantize::{extend_sign, finish_unquantize, int_to_f16, unquantize_hdr},
};
#[cfg(feature = "bc7")]
use crate::{
    color::{Channel, IntColor, Rgba8},
    quantize::unquantize_ldr,
};

#[inline]
fn read_index(reader: &mut BitReader, pixel: usize, width: u8) -> Result<usize, MalformedBlock> {
    let width = width as usize;
    if reader.remaining() < width {
        return Err(MalformedBlock::IndexOverflow {
            pixel,
            required: width,
            remaining: reader.remaining(),
        });
    }
    Ok(reader.read(width) as usize)
}

fn check_layout(mode: usize, header_bits: usize, index_bits: usize) -> Result<(), MalformedBlock> {
    if header_bits + index_bits != crate::bits::BLOCK_BITS {
        return Err(MalformedBlock::HeaderOverflow {
            mode: mode as u8,
            header_bits,
            index_bits,
        });
    }
    Ok(())
}

/// Decodes a BC6H block into 16 RGB half float pixels in row-major order.
///
/// Reserved mode selectors are rejected with [`MalformedBlock::ReservedMode`].
#[cfg(feature = "bc6h")]
#[cfg_attr(docsrs, doc(cfg(feature = "bc6h")))]
pub fn decode_block_bc6h(block: &[u8; 16], signed: bool) -> Result<[RgbF16; 16], MalformedBlock> {
    let mut reader = BitReader::new(block);
    let mut selector = reader.read(2) as u8;
    if selector >= 2 {
        selector |= (reader.read(3) as u8) << 2;
    }

    let mode_index =
        bc6h_mode_from_selector(selector).ok_or(MalformedBlock::ReservedMode { selector })?;
    let mode = &BC6H_MODES[mode_index];
    check_layout(mode_index, mode.header.len(), mode.index_bits_total())?;

    // The header layout starts with the selector bits, so it is read from the start again.
    let mut reader = BitReader::new(block);
    let mut shape = 0usize;
    let mut fields = [[0i32; 4]; 3];
    for header_bit in mode.header {
        let bit = reader.read_bit() as i32;
        let value = match header_bit.field {
            Field::Mode => continue,
            Field::Shape => {
                shape |= (bit as usize) << header_bit.bit;
                continue;
            }
            Field::Rw => &mut fields[0][0],
            Field::Rx => &mut fields[0][1],
            Field::Ry => &mut fields[0][2],
            Field::Rz => &mut fields[0][3],
            Field::Gw => &mut fields[1][0],
            Field::Gx => &mut fields[1][1],
            Field::Gy => &mut fields[1][2],
            Field::Gz => &mut fields[1][3],
            Field::Bw => &mut fields[2][0],
            Field::Bx => &mut fields[2][1],
            Field::By => &mut fields[2][2],
            Field::Bz => &mut fields[2][3],
        };
        *value |= bit << header_bit.bit;
    }

    let stored = 2 * mode.regions;
    let bits = mode.endpoint_bits;
    for (values, &delta_bits) in fields.iter_mut().zip(&mode.delta_bits) {
        if signed {
            values[0] = extend_sign(values[0], bits);
        }
        if mode.transformed || signed {
            for v in &mut values[1..stored] {
                *v = extend_sign(*v, delta_bits);
            }
        }
        if mode.transformed {
            let w = values[0];
            let mask = (1 << bits) - 1;
            for v in &mut values[1..stored] {
                *v = (*v + w) & mask;
                if signed {
                    *v = extend_sign(*v, bits);
                }
            }
        }
        for v in &mut values[..stored] {
            *v = unquantize_hdr(*v, bits, signed);
        }
    }

    let partition = partition(mode.regions, shape);
    let weights = weights(mode.index_bits);
    let mut pixels = [RgbF16::default(); BLOCK_PIXELS];

    for (px, pixel) in pixels.iter_mut().enumerate() {
        let width = mode.index_bits - is_anchor(mode.regions, shape, px) as u8;
        let weight = weights[read_index(&mut reader, px, width)?];
        let region = partition[px] as usize;

        let channel = |values: &[i32; 4]| {
            let v = interpolate(values[region * 2], values[region * 2 + 1], weight);
            f16::from_bits(int_to_f16(finish_unquantize(v, signed), signed))
        };
        *pixel = RgbF16::new(channel(&fields[0]), channel(&fields[1]), channel(&fields[2]));
    }

    Ok(pixels)
}

/// Decodes a BC7 block into 16 RGBA pixels in row-major order.
///
/// A block whose first byte is zero has no mode and is rejected with
/// [`MalformedBlock::MissingModeBit`].
#[cfg(feature = "bc7")]
#[cfg_attr(docsrs, doc(cfg(feature = "bc7")))]
pub fn decode_block_bc7(block: &[u8; 16]) -> Result<[Rgba8; 16], MalformedBlock> {
    if block[0] == 0 {
        return Err(MalformedBlock::MissingModeBit);
    }
    let mode_index = block[0].trailing_zeros() as usize;
    let mode = &BC7_MODES[mode_index];
    check_layout(mode_index, mode.header_bits(mode_index), mode.index_bits_total())?;

    let mut reader = BitReader::new(block);
    reader.read(mode_index + 1);
    let shape = reader.read(mode.shape_bits as usize) as usize;
    let rotation = reader.read(mode.rotation_bits as usize) as u8;
    let index_mode = reader.read(mode.index_mode_bits as usize);

    let mut endpoints = [[IntColor::default(); 2]; 3];
    let channels: &[Channel] = if mode.alpha_bits > 0 {
        &Channel::RGBA
    } else {
        &Channel::RGB
    };
    for &ch in channels {
        let bits = mode.endpoint_bits(ch as usize) as usize;
        for pair in &mut endpoints[..mode.regions] {
            for color in pair {
                color[ch] = reader.read(bits) as i32;
            }
        }
    }

    let mut pbits = [[0u8; 2]; 3];
    match mode.pbits {
        PBits::None => {}
        PBits::Shared => {
            for region in &mut pbits[..mode.regions] {
                *region = [reader.read_bit() as u8; 2];
            }
        }
        PBits::Unique => {
            for region in &mut pbits[..mode.regions] {
                for pbit in region {
                    *pbit = reader.read_bit() as u8;
                }
            }
        }
    }

    for (pair, pbits) in endpoints.iter_mut().zip(&pbits).take(mode.regions) {
        for (color, &pbit) in pair.iter_mut().zip(pbits) {
            *color = color.map(|ch, v| {
                let bits = mode.endpoint_bits(ch as usize);
                match (ch, mode.pbits) {
                    (Channel::A, _) if mode.alpha_bits == 0 => 255,
                    (_, PBits::None) => unquantize_ldr(v, bits),
                    _ => unquantize_ldr((v << 1) | pbit as i32, bits + 1),
                }
            });
        }
    }

    let mut primary = [0usize; BLOCK_PIXELS];
    for (px, index) in primary.iter_mut().enumerate() {
        let width = mode.index_bits - is_anchor(mode.regions, shape, px) as u8;
        *index = read_index(&mut reader, px, width)?;
    }

    let mut secondary = [0usize; BLOCK_PIXELS];
    if mode.alpha_index_bits > 0 {
        for (px, index) in secondary.iter_mut().enumerate() {
            let width = mode.alpha_index_bits - (px == 0) as u8;
            *index = read_index(&mut reader, px, width)?;
        }
    }

    let (color_indices, color_bits, alpha_indices, alpha_bits) =
        match (mode.alpha_index_bits, index_mode) {
            (0, _) => (&primary, mode.index_bits, &primary, mode.index_bits),
            (secondary_bits, 0) => (&primary, mode.index_bits, &secondary, secondary_bits),
            (secondary_bits, _) => (&secondary, secondary_bits, &primary, mode.index_bits),
        };
    let color_weights = weights(color_bits);
    let alpha_weights = weights(alpha_bits);

    let partition = partition(mode.regions, shape);
    let mut pixels = [Rgba8::default(); BLOCK_PIXELS];
    for (px, pixel) in pixels.iter_mut().enumerate() {
        let [a, b] = endpoints[partition[px] as usize];
        let color_weight = color_weights[color_indices[px]];
        let alpha_weight = alpha_weights[alpha_indices[px]];

        let color = IntColor::new(
            interpolate(a[Channel::R], b[Channel::R], color_weight),
            interpolate(a[Channel::G], b[Channel::G], color_weight),
            interpolate(a[Channel::B], b[Channel::B], color_weight),
            interpolate(a[Channel::A], b[Channel::A], alpha_weight),
        );
        *pixel = color.rotate(rotation).into();
    }

    Ok(pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "bc6h")]
    #[test]
    fn bc6h_signed_mode_0_vector() {
        let block = [
            0x40, 0xAF, 0xF6, 0x0B, 0xFD, 0x2E, 0xFF, 0xFF, 0x11, 0x71, 0x10, 0xA1, 0x21, 0xF2,
            0x33, 0x73,
        ];
        #[rustfmt::skip]
        let expected: [u16; 48] = [
            0x5BAB, 0x84B9, 0xDBE9, 0x5BA2, 0x84F6, 0xDBF1, 0x5B99, 0x8533, 0xDBFA, 0x5D9B, 0x8307, 0xD847,
            0x5B7E, 0x85F0, 0xDC15, 0x5BA2, 0x84F6, 0xDBF1, 0x5CC3, 0x81E8, 0xD8D6, 0x5D9B, 0x8307, 0xD847,
            0x5BA2, 0x84F6, 0xDBF1, 0x5B6D, 0x866B, 0xDC27, 0x5C27, 0x8117, 0xD93F, 0x5CC3, 0x81E8, 0xD8D6,
            0x5BA2, 0x84F6, 0xDBF1, 0x5CFE, 0x8235, 0xD8AF, 0x5C5B, 0x815C, 0xD91C, 0x5D66, 0x82C1, 0xD869,
        ];

        let pixels = decode_block_bc6h(&block, true).unwrap();
        for (px, pixel) in pixels.iter().enumerate() {
            let got = [pixel.r.to_bits(), pixel.g.to_bits(), pixel.b.to_bits()];
            assert_eq!(got, expected[px * 3..px * 3 + 3], "pixel {px}");
        }
    }

    #[cfg(feature = "bc6h")]
    #[test]
    fn bc6h_reserved_modes_are_rejected() {
        for selector in [0x13u8, 0x17, 0x1B, 0x1F] {
            let mut block = [0xFF; 16];
            block[0] = selector | 0xE0;
            assert_eq!(
                decode_block_bc6h(&block, false),
                Err(MalformedBlock::ReservedMode { selector })
            );
        }
    }

    #[cfg(feature = "bc6h")]
    #[test]
    fn bc6h_every_valid_selector_decodes() {
        for mode in &BC6H_MODES {
            let selector_mask: u8 = if mode.selector < 2 { 0x03 } else { 0x1F };
            let mut block = [0xA5; 16];
            block[0] = (0xA5 & !selector_mask) | mode.selector;
            assert!(decode_block_bc6h(&block, false).is_ok(), "selector {:#x}", mode.selector);
            assert!(decode_block_bc6h(&block, true).is_ok(), "selector {:#x}", mode.selector);
        }
    }

    #[cfg(feature = "bc6h")]
    #[test]
    fn bc6h_zero_block_is_black() {
        let pixels = decode_block_bc6h(&[0; 16], false).unwrap();
        assert!(pixels.iter().all(|p| *p == RgbF16::default()));
    }

    #[cfg(feature = "bc7")]
    #[test]
    fn bc7_mode_6_vector() {
        let block = [
            0xC0, 0x8C, 0xEF, 0xA2, 0xBB, 0xDC, 0xFE, 0x7F, 0x6C, 0x55, 0x6A, 0x34, 0x4F, 0x00,
            0x5D, 0x00,
        ];
        let pixels = decode_block_bc7(&block).unwrap();
        let at = |row: usize, col: usize| pixels[row * 4 + col];

        assert_eq!(at(0, 0), Rgba8::new(0x50, 0x4A, 0x48, 0xFE));
        assert_eq!(at(0, 1), Rgba8::new(0x50, 0x4A, 0x48, 0xFE));
        assert_eq!(at(1, 1), Rgba8::new(0x50, 0x4A, 0x48, 0xFE));
        assert_eq!(at(1, 0), Rgba8::new(0x64, 0x5D, 0x59, 0xFE));
        assert_eq!(at(2, 0), Rgba8::new(0x7C, 0x74, 0x6E, 0xFE));
        assert_eq!(at(2, 1), Rgba8::new(0x46, 0x41, 0x3F, 0xFE));
        assert_eq!(at(3, 0), Rgba8::new(0x72, 0x6A, 0x65, 0xFE));
        assert_eq!(at(3, 1), Rgba8::new(0x4A, 0x45, 0x43, 0xFE));
        assert_eq!(at(3, 2), Rgba8::new(0x32, 0x2E, 0x2E, 0xFE));
        assert_eq!(at(3, 3), Rgba8::new(0x32, 0x2E, 0x2E, 0xFE));
    }

    #[cfg(feature = "bc7")]
    #[test]
    fn bc7_missing_mode_bit_is_rejected() {
        let mut block = [0xFF; 16];
        block[0] = 0;
        assert_eq!(decode_block_bc7(&block), Err(MalformedBlock::MissingModeBit));
    }

    #[cfg(feature = "bc7")]
    #[test]
    fn bc7_every_mode_decodes() {
        for mode in 0..8 {
            let mut block = [0x5A; 16];
            block[0] = 1 << mode;
            assert!(decode_block_bc7(&block).is_ok(), "mode {mode}");
        }
    }

    #[cfg(feature = "bc7")]
    #[test]
    fn bc7_opaque_modes_decode_opaque() {
        for mode in 0..4 {
            let block: [u8; 16] = core::array::from_fn(|i| if i == 0 { 1 << mode } else { 0x3C });
            let pixels = decode_block_bc7(&block).unwrap();
            assert!(pixels.iter().all(|p| p.a == 255), "mode {mode}");
        }
    }
}
