//! # bptc_compression
//!
//! CPU encoder and decoder for the BPTC texture block formats.
//!
//! A 4x4 tile of pixels is stored in a 16 byte block. Two formats are supported:
//!
//!  * BC6H for half float RGB content, in an unsigned and a signed flavor
//!  * BC7 for 8-bit RGBA content
//!
//! The encoder searches the modes and shapes of a format for the block with the lowest
//! squared error. How much of that search space is visited is controlled by
//! [`BC6HSettings`] and [`BC7Settings`]. Any block the encoder produces decodes with a
//! conforming decoder, whatever settings were used.
//!
//! ```
//! use bptc_compression::{decode_block, encode_block, BlockFormat, Rgba8, Tile};
//!
//! let tile = Tile::Ldr([Rgba8::new(200, 50, 25, 255); 16]);
//! let block = encode_block(&tile, BlockFormat::Bc7);
//! let Tile::Ldr(pixels) = decode_block(&block, BlockFormat::Bc7).unwrap() else {
//!     unreachable!()
//! };
//! assert!(pixels.iter().all(|p| p.r.abs_diff(200) <= 1));
//! ```
//!
//! Whole images are handled by [`encode::compress_rgba8`], [`encode::compress_rgba16f`]
//! and the functions in [`decode`]. With the `rayon` feature they work on block rows in
//! parallel.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod bits;
mod color;
pub mod decode;
pub mod encode;
mod error;
mod palette;
#[cfg(any(feature = "bc6h", feature = "bc7"))]
mod quantize;
mod settings;
mod tables;

#[cfg(feature = "bc6h")]
pub use half;

#[cfg(feature = "bc6h")]
pub use color::RgbF16;
pub use color::Rgba8;
pub use error::{DecodeError, MalformedBlock};
#[cfg(feature = "bc6h")]
pub use settings::BC6HSettings;
#[cfg(feature = "bc7")]
pub use settings::BC7Settings;

const BLOCK_BYTES: u32 = 16;

const fn blocks_byte_size(width: u32, height: u32) -> usize {
    let block_width = width.div_ceil(4) as usize;
    let block_height = height.div_ceil(4) as usize;
    block_width * block_height * BLOCK_BYTES as usize
}

/// Wire formats of a 16 byte block.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub enum BlockFormat {
    /// BC6H with non-negative half floats.
    #[cfg(feature = "bc6h")]
    Bc6hUnsigned,
    /// BC6H with signed half floats.
    #[cfg(feature = "bc6h")]
    Bc6hSigned,
    /// BC7 with 8-bit RGBA.
    #[cfg(feature = "bc7")]
    Bc7,
}

impl BlockFormat {
    /// The format paired with its default encoder settings.
    pub fn default_variant(self) -> CompressionVariant {
        match self {
            #[cfg(feature = "bc6h")]
            BlockFormat::Bc6hUnsigned => CompressionVariant::BC6H(BC6HSettings::default()),
            #[cfg(feature = "bc6h")]
            BlockFormat::Bc6hSigned => CompressionVariant::BC6HSigned(BC6HSettings::default()),
            #[cfg(feature = "bc7")]
            BlockFormat::Bc7 => CompressionVariant::BC7(BC7Settings::default()),
        }
    }

    /// Size of one block in bytes.
    pub const fn block_byte_size(self) -> u32 {
        BLOCK_BYTES
    }

    /// Bytes of one row of blocks. A partial block at the right edge counts as whole.
    pub const fn bytes_per_row(self, width: u32) -> u32 {
        width.div_ceil(4) * BLOCK_BYTES
    }

    /// Bytes of all blocks covering a `width` x `height` image, partial edge blocks included.
    pub const fn blocks_byte_size(self, width: u32, height: u32) -> usize {
        blocks_byte_size(width, height)
    }
}

/// Compression variants supported by this crate: a block format plus the settings its
/// encoder searches with.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum CompressionVariant {
    /// BC6H compression (RGB HDR, non-negative)
    #[cfg(feature = "bc6h")]
    BC6H(BC6HSettings),
    /// BC6H compression (RGB HDR, signed)
    #[cfg(feature = "bc6h")]
    BC6HSigned(BC6HSettings),
    /// BC7 compression with smooth alpha (RGBA)
    #[cfg(feature = "bc7")]
    BC7(BC7Settings),
}

impl CompressionVariant {
    /// The wire format this variant encodes to.
    pub const fn format(self) -> BlockFormat {
        match self {
            #[cfg(feature = "bc6h")]
            CompressionVariant::BC6H(_) => BlockFormat::Bc6hUnsigned,
            #[cfg(feature = "bc6h")]
            CompressionVariant::BC6HSigned(_) => BlockFormat::Bc6hSigned,
            #[cfg(feature = "bc7")]
            CompressionVariant::BC7(_) => BlockFormat::Bc7,
        }
    }

    /// Size of one block in bytes.
    pub const fn block_byte_size(self) -> u32 {
        BLOCK_BYTES
    }

    /// Bytes of one row of blocks, see [`BlockFormat::bytes_per_row()`].
    pub const fn bytes_per_row(self, width: u32) -> u32 {
        self.format().bytes_per_row(width)
    }

    /// Bytes of all blocks of an image, see [`BlockFormat::blocks_byte_size()`].
    pub const fn blocks_byte_size(self, width: u32, height: u32) -> usize {
        self.format().blocks_byte_size(width, height)
    }

    const fn name(self) -> &'static str {
        match self {
            #[cfg(feature = "bc6h")]
            CompressionVariant::BC6H(_) => "bc6h",
            #[cfg(feature = "bc6h")]
            CompressionVariant::BC6HSigned(_) => "bc6h-signed",
            #[cfg(feature = "bc7")]
            CompressionVariant::BC7(_) => "bc7",
        }
    }
}

impl core::fmt::Display for CompressionVariant {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// A 4x4 tile in row-major order: pixel `i` is at row `i / 4`, column `i % 4`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Tile {
    /// 8-bit RGBA pixels.
    Ldr([Rgba8; 16]),
    /// Half float RGB pixels.
    #[cfg(feature = "bc6h")]
    Hdr([RgbF16; 16]),
}

impl Tile {
    /// The tile as 8-bit RGBA. Half floats are clamped to `[0, 1]` and become opaque.
    pub fn to_ldr(&self) -> [Rgba8; 16] {
        match self {
            Tile::Ldr(pixels) => *pixels,
            #[cfg(feature = "bc6h")]
            Tile::Hdr(pixels) => {
                pixels.map(|p| Rgba8::new(unorm8(p.r), unorm8(p.g), unorm8(p.b), 255))
            }
        }
    }

    /// The tile as half float RGB. 8-bit values are mapped to `[0, 1]` and alpha is dropped.
    #[cfg(feature = "bc6h")]
    pub fn to_hdr(&self) -> [RgbF16; 16] {
        match self {
            Tile::Ldr(pixels) => pixels.map(|p| {
                RgbF16::from_f32(p.r as f32 / 255.0, p.g as f32 / 255.0, p.b as f32 / 255.0)
            }),
            Tile::Hdr(pixels) => *pixels,
        }
    }
}

#[cfg(feature = "bc6h")]
#[inline]
fn unorm8(v: half::f16) -> u8 {
    (v.to_f32().clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Encodes a tile with the default settings of `format`.
pub fn encode_block(tile: &Tile, format: BlockFormat) -> [u8; 16] {
    encode_block_with(tile, format.default_variant())
}

/// Encodes a tile with explicit encoder settings.
pub fn encode_block_with(tile: &Tile, variant: CompressionVariant) -> [u8; 16] {
    match variant {
        #[cfg(feature = "bc6h")]
        CompressionVariant::BC6H(settings) => {
            encode::compress_tile_bc6h(&tile.to_hdr(), false, &settings)
        }
        #[cfg(feature = "bc6h")]
        CompressionVariant::BC6HSigned(settings) => {
            encode::compress_tile_bc6h(&tile.to_hdr(), true, &settings)
        }
        #[cfg(feature = "bc7")]
        CompressionVariant::BC7(settings) => encode::compress_tile_bc7(&tile.to_ldr(), &settings),
    }
}

/// Decodes a block into the tile kind native to `format`.
pub fn decode_block(block: &[u8; 16], format: BlockFormat) -> Result<Tile, MalformedBlock> {
    match format {
        #[cfg(feature = "bc6h")]
        BlockFormat::Bc6hUnsigned => decode::decode_block_bc6h(block, false).map(Tile::Hdr),
        #[cfg(feature = "bc6h")]
        BlockFormat::Bc6hSigned => decode::decode_block_bc6h(block, true).map(Tile::Hdr),
        #[cfg(feature = "bc7")]
        BlockFormat::Bc7 => decode::decode_block_bc7(block).map(Tile::Ldr),
    }
}
