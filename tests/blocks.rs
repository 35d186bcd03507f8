#![cfg(all(feature = "bc6h", feature = "bc7"))]

use bptc_compression::{
    decode_block, encode_block, encode_block_with, BC6HSettings, BC7Settings, BlockFormat,
    CompressionVariant, MalformedBlock, RgbF16, Rgba8, Tile,
};

fn ldr(tile: Tile) -> [Rgba8; 16] {
    match tile {
        Tile::Ldr(pixels) => pixels,
        Tile::Hdr(_) => panic!("expected an 8-bit tile"),
    }
}

fn hdr(tile: Tile) -> [RgbF16; 16] {
    match tile {
        Tile::Hdr(pixels) => pixels,
        Tile::Ldr(_) => panic!("expected a half float tile"),
    }
}

#[test]
fn solid_bc7_tile_decodes_within_one() {
    let color = Rgba8::new(200, 50, 25, 255);
    let block = encode_block(&Tile::Ldr([color; 16]), BlockFormat::Bc7);
    let pixels = ldr(decode_block(&block, BlockFormat::Bc7).unwrap());

    for pixel in pixels {
        assert!(pixel.r.abs_diff(color.r) <= 1, "{pixel:?}");
        assert!(pixel.g.abs_diff(color.g) <= 1, "{pixel:?}");
        assert!(pixel.b.abs_diff(color.b) <= 1, "{pixel:?}");
        assert_eq!(pixel.a, 255);
    }
}

#[test]
fn two_flat_halves_pick_the_matching_partition() {
    // Both colors are exactly representable by mode 1 endpoints, the top one with a
    // p-bit of 0 and the bottom one with a p-bit of 1.
    let top = Rgba8::new(201, 100, 233, 255);
    let bottom = Rgba8::new(22, 131, 62, 255);
    let tile: [Rgba8; 16] = core::array::from_fn(|i| if i < 8 { top } else { bottom });

    let variant = CompressionVariant::BC7(BC7Settings::alpha_basic().with_mode_mask(0b10));
    let block = encode_block_with(&Tile::Ldr(tile), variant);

    assert_eq!(block[0] & 0b11, 0b10, "mode 1");
    assert_eq!((block[0] >> 2) & 0x3F, 13, "shape");
    assert_eq!(ldr(decode_block(&block, BlockFormat::Bc7).unwrap()), tile);
}

#[test]
fn solid_bc6h_tile_is_close() {
    let color = RgbF16::from_f32(1.5, 0.25, 0.0625);

    for format in [BlockFormat::Bc6hUnsigned, BlockFormat::Bc6hSigned] {
        let block = encode_block(&Tile::Hdr([color; 16]), format);
        for pixel in hdr(decode_block(&block, format).unwrap()) {
            for (got, want) in [(pixel.r, color.r), (pixel.g, color.g), (pixel.b, color.b)] {
                let (got, want) = (got.to_f32(), want.to_f32());
                assert!((got - want).abs() <= want * 0.01, "{format:?}: {got} vs {want}");
            }
        }
    }
}

#[test]
fn tiles_are_converted_to_the_format_kind() {
    let ldr_tile = Tile::Ldr([Rgba8::new(255, 0, 128, 7); 16]);
    let block = encode_block(&ldr_tile, BlockFormat::Bc6hUnsigned);
    let decoded = hdr(decode_block(&block, BlockFormat::Bc6hUnsigned).unwrap());
    assert!((decoded[0].r.to_f32() - 1.0).abs() < 0.01);
    assert!(decoded[0].g.to_f32().abs() < 0.01);

    let hdr_tile = Tile::Hdr([RgbF16::from_f32(4.0, -1.0, 0.5); 16]);
    let block = encode_block(&hdr_tile, BlockFormat::Bc7);
    for pixel in ldr(decode_block(&block, BlockFormat::Bc7).unwrap()) {
        assert!(pixel.r >= 254, "{pixel:?}");
        assert!(pixel.g <= 1, "{pixel:?}");
        assert!(pixel.b.abs_diff(128) <= 1, "{pixel:?}");
        assert_eq!(pixel.a, 255);
    }
}

#[test]
fn every_preset_produces_decodable_blocks() {
    let tile: [Rgba8; 16] = core::array::from_fn(|i| {
        let v = (i * 16) as u8;
        Rgba8::new(v, 255 - v, v / 2, if i % 3 == 0 { 0 } else { 255 })
    });

    for settings in [
        BC7Settings::opaque_ultra_fast(),
        BC7Settings::opaque_very_fast(),
        BC7Settings::opaque_fast(),
        BC7Settings::opaque_basic(),
        BC7Settings::alpha_ultrafast(),
        BC7Settings::alpha_very_fast(),
        BC7Settings::alpha_fast(),
        BC7Settings::alpha_basic(),
    ] {
        let block = encode_block_with(&Tile::Ldr(tile), CompressionVariant::BC7(settings));
        assert!(decode_block(&block, BlockFormat::Bc7).is_ok(), "{settings:?}");
    }

    let tile = Tile::Ldr(tile);
    for settings in [BC6HSettings::very_fast(), BC6HSettings::fast(), BC6HSettings::basic()] {
        for variant in [
            CompressionVariant::BC6H(settings),
            CompressionVariant::BC6HSigned(settings),
        ] {
            let block = encode_block_with(&tile, variant);
            assert!(decode_block(&block, variant.format()).is_ok(), "{variant} {settings:?}");
        }
    }
}

#[test]
fn malformed_blocks_are_rejected() {
    assert_eq!(
        decode_block(&[0; 16], BlockFormat::Bc7),
        Err(MalformedBlock::MissingModeBit)
    );

    let mut block = [0xFF; 16];
    block[0] = 0b1111_0011;
    assert_eq!(
        decode_block(&block, BlockFormat::Bc6hUnsigned),
        Err(MalformedBlock::ReservedMode { selector: 0b10011 })
    );
}

#[test]
fn block_sizes() {
    for format in [BlockFormat::Bc6hUnsigned, BlockFormat::Bc6hSigned, BlockFormat::Bc7] {
        assert_eq!(format.block_byte_size(), 16);
        assert_eq!(format.bytes_per_row(5), 32);
        assert_eq!(format.blocks_byte_size(5, 9), 2 * 3 * 16);
        assert_eq!(format.default_variant().format(), format);
    }
}
