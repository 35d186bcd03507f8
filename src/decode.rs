//! CPU based decoding.

mod block;

#[cfg(feature = "bc6h")]
use half::f16;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

#[cfg(feature = "bc6h")]
pub use self::block::decode_block_bc6h;
#[cfg(feature = "bc7")]
pub use self::block::decode_block_bc7;
use crate::{decode_block, BlockFormat, DecodeError, Tile};

/// Channel type of a tightly packed RGBA output image.
trait OutputTexel: Copy + Send + Sync {
    fn texels(tile: &Tile) -> [[Self; 4]; 16];
}

impl OutputTexel for u8 {
    #[inline]
    fn texels(tile: &Tile) -> [[u8; 4]; 16] {
        tile.to_ldr().map(|p| [p.r, p.g, p.b, p.a])
    }
}

#[cfg(feature = "bc6h")]
impl OutputTexel for f16 {
    #[inline]
    fn texels(tile: &Tile) -> [[f16; 4]; 16] {
        match tile {
            Tile::Ldr(pixels) => {
                pixels.map(|p| [p.r, p.g, p.b, p.a].map(|v| f16::from_f32(v as f32 / 255.0)))
            }
            Tile::Hdr(pixels) => pixels.map(|p| [p.r, p.g, p.b, f16::ONE]),
        }
    }
}

/// Decodes one row of blocks into the four (or fewer, at the bottom edge) pixel rows it
/// covers.
fn decompress_block_row<T: OutputTexel>(
    format: BlockFormat,
    width: usize,
    block_y: usize,
    output_rows: &mut [T],
    block_row: &[u8],
) -> Result<(), DecodeError> {
    let row_pitch = width * 4;

    for (block_x, bytes) in block_row.chunks_exact(16).enumerate() {
        let mut block = [0u8; 16];
        block.copy_from_slice(bytes);

        let tile = decode_block(&block, format).map_err(|source| {
            log::debug!("rejecting block ({block_x}, {block_y}) of a {format:?} image: {source}");
            DecodeError::Block {
                block_x: block_x as u32,
                block_y: block_y as u32,
                source,
            }
        })?;
        let texels = T::texels(&tile);

        for y in 0..4 {
            for x in 0..4 {
                let pixel_x = block_x * 4 + x;
                let offset = y * row_pitch + pixel_x * 4;
                if pixel_x >= width || offset >= output_rows.len() {
                    continue;
                }
                output_rows[offset..offset + 4].copy_from_slice(&texels[y * 4 + x]);
            }
        }
    }

    Ok(())
}

fn decompress<T: OutputTexel>(
    format: BlockFormat,
    width: u32,
    height: u32,
    input_bitstream: &[u8],
    output_bitstream: &mut [T],
) -> Result<(), DecodeError> {
    let expected_input_size = format.blocks_byte_size(width, height);
    if input_bitstream.len() != expected_input_size {
        return Err(DecodeError::InputSize {
            expected: expected_input_size,
            actual: input_bitstream.len(),
        });
    }

    let expected_output_size = width as usize * height as usize * 4;
    if output_bitstream.len() != expected_output_size {
        return Err(DecodeError::OutputSize {
            expected: expected_output_size,
            actual: output_bitstream.len(),
        });
    }

    if width == 0 || height == 0 {
        return Ok(());
    }

    let width = width as usize;
    let block_row_bytes = format.bytes_per_row(width as u32) as usize;
    let texels_per_block_row = width * 4 * 4;

    log::debug!(
        "decompressing {width}x{height} {format:?} image, {} blocks",
        input_bitstream.len() / 16
    );

    #[cfg(feature = "rayon")]
    let result = output_bitstream
        .par_chunks_mut(texels_per_block_row)
        .zip(input_bitstream.par_chunks(block_row_bytes))
        .enumerate()
        .try_for_each(|(block_y, (rows, blocks))| {
            decompress_block_row(format, width, block_y, rows, blocks)
        });

    #[cfg(not(feature = "rayon"))]
    let result = output_bitstream
        .chunks_mut(texels_per_block_row)
        .zip(input_bitstream.chunks(block_row_bytes))
        .enumerate()
        .try_for_each(|(block_y, (rows, blocks))| {
            decompress_block_row(format, width, block_y, rows, blocks)
        });

    result
}

/// Decodes BC6H or BC7 blocks into a tightly packed RGBA8 image.
///
/// BC6H values are clamped to `[0, 1]` and the image is opaque.
///
/// # Errors
/// * [`DecodeError::InputSize`] if `input_bitstream` does not hold exactly
///   [`BlockFormat::blocks_byte_size()`] bytes
/// * [`DecodeError::OutputSize`] if `output_bitstream` is not `width * height * 4` bytes
/// * [`DecodeError::Block`] for a malformed block
pub fn decompress_blocks_rgba8(
    format: BlockFormat,
    width: u32,
    height: u32,
    input_bitstream: &[u8],
    output_bitstream: &mut [u8],
) -> Result<(), DecodeError> {
    decompress(format, width, height, input_bitstream, output_bitstream)
}

/// Decodes BC6H or BC7 blocks into a tightly packed RGBA16F image.
///
/// BC6H alpha is 1.0. BC7 values are mapped to `[0, 1]`.
///
/// # Errors
/// Same as [`decompress_blocks_rgba8`], with the output measured in half floats.
#[cfg(feature = "bc6h")]
#[cfg_attr(docsrs, doc(cfg(feature = "bc6h")))]
pub fn decompress_blocks_rgba16f(
    format: BlockFormat,
    width: u32,
    height: u32,
    input_bitstream: &[u8],
    output_bitstream: &mut [f16],
) -> Result<(), DecodeError> {
    decompress(format, width, height, input_bitstream, output_bitstream)
}

#[cfg(all(test, feature = "bc7"))]
mod tests {
    use super::*;

    #[test]
    fn size_mismatches_are_reported() {
        let blocks = [0x40u8; 32];
        let mut output = [0u8; 8 * 4 * 4];

        assert_eq!(
            decompress_blocks_rgba8(BlockFormat::Bc7, 8, 4, &blocks[..16], &mut output),
            Err(DecodeError::InputSize {
                expected: 32,
                actual: 16
            })
        );
        assert_eq!(
            decompress_blocks_rgba8(BlockFormat::Bc7, 8, 4, &blocks, &mut output[..100]),
            Err(DecodeError::OutputSize {
                expected: 128,
                actual: 100
            })
        );
        assert!(decompress_blocks_rgba8(BlockFormat::Bc7, 8, 4, &blocks, &mut output).is_ok());
    }

    #[test]
    fn malformed_block_position_is_reported() {
        let mut blocks = [0x40u8; 16 * 4];
        blocks[3 * 16] = 0;
        let mut output = [0u8; 8 * 8 * 4];

        let error =
            decompress_blocks_rgba8(BlockFormat::Bc7, 8, 8, &blocks, &mut output).unwrap_err();
        assert_eq!(
            error,
            DecodeError::Block {
                block_x: 1,
                block_y: 1,
                source: crate::MalformedBlock::MissingModeBit
            }
        );
    }

    #[test]
    fn partial_edge_blocks_are_cropped() {
        let blocks = [0x40u8; 16 * 4];
        let mut output = vec![0u8; 6 * 5 * 4];
        decompress_blocks_rgba8(BlockFormat::Bc7, 6, 5, &blocks, &mut output).unwrap();

        let single = decode_block_bc7(&[0x40; 16]).unwrap();
        for y in 0..5 {
            for x in 0..6 {
                let pixel = single[(y % 4) * 4 + x % 4];
                let offset = (y * 6 + x) * 4;
                assert_eq!(output[offset..offset + 4], [pixel.r, pixel.g, pixel.b, pixel.a]);
            }
        }
    }
}
