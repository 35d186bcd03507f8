//! CPU based encoding.

#[cfg(feature = "bc6h")]
mod bc6h;
#[cfg(feature = "bc7")]
mod bc7;
#[cfg(any(feature = "bc6h", feature = "bc7"))]
mod common;

#[cfg(feature = "bc6h")]
use half::f16;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

#[cfg(feature = "bc6h")]
use self::bc6h::BlockCompressorBC6H;
#[cfg(feature = "bc7")]
use self::bc7::BlockCompressorBC7;
#[cfg(feature = "bc6h")]
use crate::{BC6HSettings, RgbF16};
#[cfg(feature = "bc7")]
use crate::{BC7Settings, Rgba8};
use crate::CompressionVariant;

#[cfg(feature = "bc6h")]
pub(crate) fn compress_tile_bc6h(
    pixels: &[RgbF16; 16],
    signed: bool,
    settings: &BC6HSettings,
) -> [u8; 16] {
    let mut block_compressor = BlockCompressorBC6H::new(settings, signed);
    block_compressor.load_block(pixels);
    block_compressor.compress_bc6h_core();
    block_compressor.block()
}

#[cfg(feature = "bc7")]
pub(crate) fn compress_tile_bc7(pixels: &[Rgba8; 16], settings: &BC7Settings) -> [u8; 16] {
    let mut block_compressor = BlockCompressorBC7::new(settings);
    block_compressor.load_block(pixels);
    block_compressor.compress_bc7_core();
    block_compressor.block()
}

/// Compresses an RGBA8 image into BC6H or BC7 blocks.
///
/// Pixels are read row by row, `stride` bytes apart, four bytes per pixel. BC7 takes the
/// bytes as they are. BC6H decodes them as sRGB to linear half floats and drops alpha.
///
/// Blocks are written in row-major order to the front of `blocks_buffer`, which needs room
/// for [`CompressionVariant::blocks_byte_size()`] bytes.
///
/// # Panics
/// * If `width` or `height` is not a multiple of 4
/// * If `blocks_buffer` is shorter than the blocks of the image
///
/// # Example
/// ```
/// use bptc_compression::{encode::compress_rgba8, BC7Settings, CompressionVariant};
///
/// let rgba_data = vec![0u8; 64 * 64 * 4];
/// let width = 64;
/// let height = 64;
/// let stride = width * 4;
/// let variant = CompressionVariant::BC7(BC7Settings::alpha_very_fast());
///
/// let mut blocks_buffer = vec![0u8; variant.blocks_byte_size(width, height)];
///
/// compress_rgba8(
///     variant,
///     &rgba_data,
///     &mut blocks_buffer,
///     width,
///     height,
///     stride,
/// );
/// ```
pub fn compress_rgba8(
    variation: CompressionVariant,
    rgba_data: &[u8],
    blocks_buffer: &mut [u8],
    width: u32,
    height: u32,
    stride: u32,
) {
    let (block_width, block_height) = check_dimensions(variation, blocks_buffer, width, height);
    let stride = stride as usize;

    log::debug!(
        "compressing {width}x{height} RGBA8 image to {variation}, {} blocks",
        block_width * block_height
    );

    match variation {
        #[cfg(feature = "bc6h")]
        CompressionVariant::BC6H(settings) | CompressionVariant::BC6HSigned(settings) => {
            let signed = matches!(variation, CompressionVariant::BC6HSigned(_));
            compress_rows(blocks_buffer, block_width, block_height, |yy, row| {
                let mut block_compressor = BlockCompressorBC6H::new(&settings, signed);
                for xx in 0..block_width {
                    block_compressor.load_block_interleaved_8bit(rgba_data, xx, yy, stride);
                    block_compressor.compress_bc6h_core();
                    block_compressor.store_data(row, block_width, xx, 0);
                }
            });
        }
        #[cfg(feature = "bc7")]
        CompressionVariant::BC7(settings) => {
            compress_rows(blocks_buffer, block_width, block_height, |yy, row| {
                let mut block_compressor = BlockCompressorBC7::new(&settings);
                for xx in 0..block_width {
                    block_compressor.load_block_interleaved_rgba(rgba_data, xx, yy, stride);
                    block_compressor.compress_bc7_core();
                    block_compressor.store_data(row, block_width, xx, 0);
                }
            });
        }
    }
}

/// Compresses an RGBA16F image into BC6H or BC7 blocks.
///
/// Same layout rules as [`compress_rgba8`], with `stride` counted in half floats. BC6H
/// ignores alpha. BC7 clamps every channel to `[0, 1]` and rounds it to 8 bits first.
///
/// # Panics
/// * If `width` or `height` is not a multiple of 4
/// * If `blocks_buffer` is shorter than the blocks of the image
#[cfg(feature = "bc6h")]
#[cfg_attr(docsrs, doc(cfg(feature = "bc6h")))]
pub fn compress_rgba16f(
    variation: CompressionVariant,
    rgba_data: &[f16],
    blocks_buffer: &mut [u8],
    width: u32,
    height: u32,
    stride: u32,
) {
    let (block_width, block_height) = check_dimensions(variation, blocks_buffer, width, height);
    let stride = stride as usize;

    log::debug!(
        "compressing {width}x{height} RGBA16F image to {variation}, {} blocks",
        block_width * block_height
    );

    match variation {
        CompressionVariant::BC6H(settings) | CompressionVariant::BC6HSigned(settings) => {
            let signed = matches!(variation, CompressionVariant::BC6HSigned(_));
            compress_rows(blocks_buffer, block_width, block_height, |yy, row| {
                let mut block_compressor = BlockCompressorBC6H::new(&settings, signed);
                for xx in 0..block_width {
                    block_compressor.load_block_interleaved_16bit(rgba_data, xx, yy, stride);
                    block_compressor.compress_bc6h_core();
                    block_compressor.store_data(row, block_width, xx, 0);
                }
            });
        }
        #[cfg(feature = "bc7")]
        CompressionVariant::BC7(settings) => {
            compress_rows(blocks_buffer, block_width, block_height, |yy, row| {
                let mut block_compressor = BlockCompressorBC7::new(&settings);
                for xx in 0..block_width {
                    block_compressor.load_block_interleaved_16bit(rgba_data, xx, yy, stride);
                    block_compressor.compress_bc7_core();
                    block_compressor.store_data(row, block_width, xx, 0);
                }
            });
        }
    }
}

fn check_dimensions(
    variation: CompressionVariant,
    blocks_buffer: &[u8],
    width: u32,
    height: u32,
) -> (usize, usize) {
    assert_eq!(height % 4, 0);
    assert_eq!(width % 4, 0);

    let required_size = variation.blocks_byte_size(width, height);

    assert!(
        blocks_buffer.len() >= required_size,
        "{} bytes can't hold the {required_size} bytes of a {width}x{height} {variation} image",
        blocks_buffer.len()
    );

    (width as usize / 4, height as usize / 4)
}

/// Runs `compress_row` for every row of blocks, handing it the block row index and the
/// output bytes of that row.
fn compress_rows<F>(
    blocks_buffer: &mut [u8],
    block_width: usize,
    block_height: usize,
    compress_row: F,
) where
    F: Fn(usize, &mut [u8]) + Send + Sync,
{
    if block_width == 0 || block_height == 0 {
        return;
    }

    let row_bytes = block_width * 16;
    let rows = &mut blocks_buffer[..row_bytes * block_height];

    #[cfg(feature = "rayon")]
    rows.par_chunks_mut(row_bytes)
        .enumerate()
        .for_each(|(yy, row)| compress_row(yy, row));

    #[cfg(not(feature = "rayon"))]
    rows.chunks_mut(row_bytes)
        .enumerate()
        .for_each(|(yy, row)| compress_row(yy, row));
}
