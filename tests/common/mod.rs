#![allow(dead_code)]

use image::{Rgba, RgbaImage};

pub mod metrics;

pub const IMAGE_SIZE: u32 = 32;

/// A smooth gradient with a hard edged disc in the middle and a translucent band at the
/// bottom, so that the encoder has to use partitions as well as smooth endpoints.
pub fn synthetic_image(width: u32, height: u32) -> RgbaImage {
    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
    let radius = width.min(height) as f32 / 4.0;

    RgbaImage::from_fn(width, height, |x, y| {
        let dx = x as f32 + 0.5 - cx;
        let dy = y as f32 + 0.5 - cy;

        if dx * dx + dy * dy <= radius * radius {
            return Rgba([230, 40, 25, 255]);
        }

        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        let b = 128u8.wrapping_add(((x + y) * 2) as u8);
        let a = if y >= height - height / 4 {
            (x * 255 / width.max(1)) as u8
        } else {
            255
        };
        Rgba([r, g, b, a])
    })
}

/// Compresses `image` row block by row block, so that every block is encoded on its own.
pub fn compress_blocks_one_by_one(
    image: &RgbaImage,
    variant: bptc_compression::CompressionVariant,
) -> Vec<u8> {
    use bptc_compression::{encode_block_with, Rgba8, Tile};

    let (width, height) = image.dimensions();
    let mut blocks = Vec::with_capacity(variant.blocks_byte_size(width, height));

    for block_y in 0..height / 4 {
        for block_x in 0..width / 4 {
            let pixels: [Rgba8; 16] = core::array::from_fn(|i| {
                let (x, y) = (block_x * 4 + i as u32 % 4, block_y * 4 + i as u32 / 4);
                let Rgba([r, g, b, a]) = *image.get_pixel(x, y);
                Rgba8::new(r, g, b, a)
            });
            blocks.extend_from_slice(&encode_block_with(&Tile::Ldr(pixels), variant));
        }
    }

    blocks
}

#[inline]
pub fn srgb_to_linear(srgb: u8) -> f32 {
    let v = srgb as f32 / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}
