use core::ops::RangeInclusive;

use super::common::*;
use crate::{
    bits::{BitWriter, BLOCK_BITS},
    color::{Channel, IntColor, Rgba8},
    palette::Palette,
    quantize::{quantize_ldr, unquantize_ldr},
    tables::{anchor, is_anchor, partition, Bc7Mode, PBits, BC7_MODES, BLOCK_PIXELS},
    BC7Settings,
};

/// Quantizes an 8-bit value to `bits` bits, followed by the given p-bit if any.
///
/// With a p-bit only every other value of the `bits + 1` precision is reachable, so the
/// nearest one with the matching low bit is taken.
fn quantize_channel(value: i32, bits: u8, pbit: Option<u8>) -> i32 {
    let pbit = match pbit {
        Some(pbit) => pbit as i32,
        None => return quantize_ldr(value, bits),
    };

    let prec = bits + 1;
    let q = quantize_ldr(value, prec);
    if q & 1 == pbit {
        return q >> 1;
    }

    let max = (1 << prec) - 1;
    let nearest = [q - 1, q + 1]
        .into_iter()
        .filter(|c| (0..=max).contains(c))
        .min_by_key(|&c| (unquantize_ldr(c, prec) - value).abs())
        .unwrap_or(q);
    nearest >> 1
}

/// Error model of one BC7 mode with a fixed index mode.
struct LdrModel<'m> {
    mode: &'m Bc7Mode,
    color_index_bits: u8,
    /// Width of the separate alpha index, 0 if color and alpha share one.
    alpha_index_bits: u8,
    /// Stored alpha endpoints are pinned to the maximum.
    opaque: bool,
}

impl<'m> LdrModel<'m> {
    fn new(mode: &'m Bc7Mode, index_mode: u8, opaque: bool) -> Self {
        let (color_index_bits, alpha_index_bits) = match (mode.alpha_index_bits, index_mode) {
            (0, _) => (mode.index_bits, 0),
            (secondary, 0) => (mode.index_bits, secondary),
            (secondary, _) => (secondary, mode.index_bits),
        };
        Self {
            mode,
            color_index_bits,
            alpha_index_bits,
            opaque: opaque && mode.alpha_bits > 0,
        }
    }

    /// Channels written to the block.
    fn stored_channels(&self) -> &'static [Channel] {
        if self.mode.alpha_bits > 0 {
            &Channel::RGBA
        } else {
            &Channel::RGB
        }
    }

    /// P-bits worth trying. An opaque alpha of 255 needs a set p-bit.
    fn pbit_choices(&self) -> &'static [u8] {
        if self.opaque {
            &[1]
        } else {
            &[0, 1]
        }
    }

    #[inline]
    fn dual(&self) -> bool {
        self.alpha_index_bits > 0
    }

    /// Expands a quantized endpoint to 8 bits. Modes without alpha decode to opaque.
    fn unquantize(&self, color: IntColor, pbit: u8) -> IntColor {
        let mode = self.mode;
        let expand = |value: i32, bits: u8| match mode.pbits {
            PBits::None => unquantize_ldr(value, bits),
            PBits::Shared | PBits::Unique => unquantize_ldr((value << 1) | pbit as i32, bits + 1),
        };

        IntColor::new(
            expand(color[Channel::R], mode.color_bits),
            expand(color[Channel::G], mode.color_bits),
            expand(color[Channel::B], mode.color_bits),
            if mode.alpha_bits > 0 {
                expand(color[Channel::A], mode.alpha_bits)
            } else {
                255
            },
        )
    }

    fn unquantize_pair(&self, endpoints: &EndpointPair) -> [IntColor; 2] {
        [
            self.unquantize(endpoints.colors[0], endpoints.pbits[0]),
            self.unquantize(endpoints.colors[1], endpoints.pbits[1]),
        ]
    }

    fn quantize_color(&self, full: IntColor, pbit: Option<u8>) -> (IntColor, f32) {
        let mut q = IntColor::default();
        for &ch in self.channels() {
            q[ch] = quantize_channel(full[ch], self.mode.endpoint_bits(ch as usize), pbit);
        }
        if self.opaque {
            q[Channel::A] = (1 << self.mode.alpha_bits) - 1;
        }
        let error = self
            .unquantize(q, pbit.unwrap_or(0))
            .distance_sq(&full, self.channels());
        (q, error)
    }

    /// Quantizes two full precision endpoints, picking the p-bits that keep them closest.
    fn quantize(&self, full: [IntColor; 2]) -> EndpointPair {
        match self.mode.pbits {
            PBits::None => EndpointPair::new(
                self.quantize_color(full[0], None).0,
                self.quantize_color(full[1], None).0,
            ),
            PBits::Unique => {
                let mut pair = EndpointPair::default();
                for (e, &color) in full.iter().enumerate() {
                    let mut best_err = f32::INFINITY;
                    for &pbit in self.pbit_choices() {
                        let (q, err) = self.quantize_color(color, Some(pbit));
                        if err < best_err {
                            best_err = err;
                            pair.colors[e] = q;
                            pair.pbits[e] = pbit;
                        }
                    }
                }
                pair
            }
            PBits::Shared => {
                let mut best = (EndpointPair::default(), f32::INFINITY);
                for &pbit in self.pbit_choices() {
                    let (a, err_a) = self.quantize_color(full[0], Some(pbit));
                    let (b, err_b) = self.quantize_color(full[1], Some(pbit));
                    if err_a + err_b < best.1 {
                        best = (
                            EndpointPair {
                                colors: [a, b],
                                pbits: [pbit; 2],
                            },
                            err_a + err_b,
                        );
                    }
                }
                best.0
            }
        }
    }

    fn palettes(&self, a: IntColor, b: IntColor) -> (Palette, Option<Palette>) {
        let color = Palette::build(a, b, self.color_index_bits);
        let alpha = self.dual().then(|| Palette::build(a, b, self.alpha_index_bits));
        (color, alpha)
    }

    /// Error of `pixels` against the ramps spanned by 8-bit endpoints `a` and `b`.
    fn palette_error(&self, a: IntColor, b: IntColor, pixels: &[IntColor], limit: f32) -> f32 {
        let mut total = 0.0;
        match self.palettes(a, b) {
            (color, None) => {
                for pixel in pixels {
                    total += color.nearest(pixel, &Channel::RGBA).1;
                    if total > limit {
                        break;
                    }
                }
            }
            (color, Some(alpha)) => {
                for pixel in pixels {
                    total += color.nearest(pixel, &Channel::RGB).1
                        + alpha.nearest(pixel, &[Channel::A]).1;
                    if total > limit {
                        break;
                    }
                }
            }
        }
        total
    }
}

impl EndpointModel for LdrModel<'_> {
    fn channels(&self) -> &[Channel] {
        if self.opaque {
            &Channel::RGB
        } else {
            self.stored_channels()
        }
    }

    fn range(&self, channel: Channel) -> RangeInclusive<i32> {
        0..=(1 << self.mode.endpoint_bits(channel as usize)) - 1
    }

    fn region_error(&self, pixels: &[IntColor], endpoints: &EndpointPair, limit: f32) -> f32 {
        let [a, b] = self.unquantize_pair(endpoints);
        self.palette_error(a, b, pixels, limit)
    }
}

/// Color and alpha indices of a block. Single index modes only use `color`.
#[derive(Copy, Clone)]
struct Indices {
    color: [u8; BLOCK_PIXELS],
    alpha: [u8; BLOCK_PIXELS],
}

pub(crate) struct BlockCompressorBC7<'a> {
    pixels: [IntColor; BLOCK_PIXELS],
    best: Candidate,
    settings: &'a BC7Settings,
}

impl<'a> BlockCompressorBC7<'a> {
    pub(crate) fn new(settings: &'a BC7Settings) -> Self {
        Self {
            pixels: [IntColor::default(); BLOCK_PIXELS],
            best: Candidate::NONE,
            settings,
        }
    }

    fn load_pixel(&mut self, index: usize, pixel: Rgba8) {
        let mut color = IntColor::from(pixel);
        if self.settings.channels == 3 {
            color[Channel::A] = 255;
        }
        self.pixels[index] = color;
    }

    pub(crate) fn load_block(&mut self, pixels: &[Rgba8; BLOCK_PIXELS]) {
        for (index, &pixel) in pixels.iter().enumerate() {
            self.load_pixel(index, pixel);
        }
    }

    pub(crate) fn load_block_interleaved_rgba(
        &mut self,
        rgba_data: &[u8],
        xx: usize,
        yy: usize,
        stride: usize,
    ) {
        for y in 0..4 {
            for x in 0..4 {
                let pixel_x = xx * 4 + x;
                let pixel_y = yy * 4 + y;

                let offset = pixel_y * stride + pixel_x * 4;
                let pixel = Rgba8::new(
                    rgba_data[offset],
                    rgba_data[offset + 1],
                    rgba_data[offset + 2],
                    rgba_data[offset + 3],
                );

                self.load_pixel(y * 4 + x, pixel);
            }
        }
    }

    #[cfg(feature = "bc6h")]
    pub(crate) fn load_block_interleaved_16bit(
        &mut self,
        rgba_data: &[half::f16],
        xx: usize,
        yy: usize,
        stride: usize,
    ) {
        let unorm8 = |v: half::f16| (v.to_f32().clamp(0.0, 1.0) * 255.0).round() as u8;

        for y in 0..4 {
            for x in 0..4 {
                let pixel_x = xx * 4 + x;
                let pixel_y = yy * 4 + y;

                let offset = pixel_y * stride + pixel_x * 4;
                let pixel = Rgba8::new(
                    unorm8(rgba_data[offset]),
                    unorm8(rgba_data[offset + 1]),
                    unorm8(rgba_data[offset + 2]),
                    unorm8(rgba_data[offset + 3]),
                );

                self.load_pixel(y * 4 + x, pixel);
            }
        }
    }

    pub(crate) fn store_data(
        &self,
        blocks_buffer: &mut [u8],
        block_width: usize,
        xx: usize,
        yy: usize,
    ) {
        let offset = (yy * block_width + xx) * 16;
        blocks_buffer[offset..offset + 16].copy_from_slice(&self.best.block);
    }

    pub(crate) fn block(&self) -> [u8; 16] {
        self.best.block
    }

    pub(crate) fn compress_bc7_core(&mut self) {
        self.best = Candidate::NONE;
        let mode_mask = self.settings.effective_mode_mask();
        let opaque = self.settings.channels == 3;

        'modes: for (mode_index, mode) in BC7_MODES.iter().enumerate() {
            if mode_mask & (1 << mode_index) == 0 {
                continue;
            }

            let rotations = if mode.rotation_bits > 0 && self.settings.rotations != 0 && !opaque {
                4
            } else {
                1
            };
            let index_modes = if mode.index_mode_bits > 0 && self.settings.index_modes != 0 {
                2
            } else {
                1
            };

            for rotation in 0..rotations {
                for index_mode in 0..index_modes {
                    self.search_mode(mode_index, rotation, index_mode, opaque);
                    if self.best.error == 0.0 {
                        break 'modes;
                    }
                }
            }
        }

        log::trace!(
            "bc7 tile: mode {} shape {} error {}",
            self.best.mode,
            self.best.shape,
            self.best.error
        );
    }

    fn search_mode(&mut self, mode_index: usize, rotation: u8, index_mode: u8, opaque: bool) {
        let mode = &BC7_MODES[mode_index];
        let model = LdrModel::new(mode, index_mode, opaque);
        let pixels = self.pixels.map(|p| p.rotate(rotation));
        let shapes = mode.shapes();

        let mut ranked = [(0.0f32, 0usize); 64];
        for (shape, entry) in ranked.iter_mut().enumerate().take(shapes) {
            *entry = (rough_error(&model, &pixels, shape), shape);
        }

        let keep = self.settings.shapes_to_refine(shapes);
        partial_sort_list(&mut ranked[..shapes], keep);

        for &(_, shape) in &ranked[..keep] {
            let candidate = self.refine(&model, &pixels, mode_index, shape, rotation, index_mode);
            self.best.offer(candidate);
            if self.best.error == 0.0 {
                return;
            }
        }
    }

    fn refine(
        &self,
        model: &LdrModel,
        pixels: &[IntColor; BLOCK_PIXELS],
        mode_index: usize,
        shape: usize,
        rotation: u8,
        index_mode: u8,
    ) -> Candidate {
        let mode = model.mode;
        let partition = partition(mode.regions, shape);
        let regions = split_regions(pixels, partition, mode.regions);

        let mut org = [EndpointPair::default(); 3];
        for (endpoints, region) in org.iter_mut().zip(&regions).take(mode.regions) {
            *endpoints = model.quantize(fit_region(model, region.as_slice()));
        }

        let (mut org_indices, org_err) = assign_indices(model, pixels, partition, &org);
        swap_indices(model, shape, partition, &mut org, &mut org_indices);
        let org_total: f32 = org_err.iter().sum();

        let mut best = (org, org_indices, org_total);

        if self.settings.refine != 0 && org_total > 0.0 {
            let mut opt = org;
            for (r, region) in regions.iter().enumerate().take(mode.regions) {
                opt[r] = optimize_region(
                    model,
                    region.as_slice(),
                    org_err[r],
                    &org[r],
                    self.settings.exhaustive_delta as i32,
                )
                .0;
            }

            let (mut opt_indices, opt_err) = assign_indices(model, pixels, partition, &opt);
            swap_indices(model, shape, partition, &mut opt, &mut opt_indices);

            let opt_total: f32 = opt_err.iter().sum();
            if opt_total < org_total {
                best = (opt, opt_indices, opt_total);
            }
        }

        let (endpoints, indices, error) = best;
        Candidate {
            error,
            block: emit_block(model, mode_index, shape, rotation, index_mode, &endpoints, &indices),
            mode: mode_index as u8,
            shape: shape as u8,
        }
    }
}

/// Full precision endpoints of one region. Dual index modes fit color and alpha separately.
fn fit_region(model: &LdrModel, pixels: &[IntColor]) -> [IntColor; 2] {
    if model.dual() {
        let [mut a, mut b] = fit_axis(pixels, &Channel::RGB, 255.0, 0..=255);
        let [alpha_a, alpha_b] = fit_axis(pixels, &[Channel::A], 255.0, 0..=255);
        a[Channel::A] = alpha_a[Channel::A];
        b[Channel::A] = alpha_b[Channel::A];
        [a, b]
    } else {
        fit_axis(pixels, model.channels(), 255.0, 0..=255)
    }
}

/// Error of the shape with unquantized endpoints, used to rank the shapes.
fn rough_error(model: &LdrModel, pixels: &[IntColor; BLOCK_PIXELS], shape: usize) -> f32 {
    let mode = model.mode;
    let partition = partition(mode.regions, shape);
    let regions = split_regions(pixels, partition, mode.regions);

    let mut total = 0.0;
    for region in &regions[..mode.regions] {
        let [mut a, mut b] = fit_region(model, region.as_slice());
        if mode.alpha_bits == 0 || model.opaque {
            a[Channel::A] = 255;
            b[Channel::A] = 255;
        }
        total += model.palette_error(a, b, region.as_slice(), f32::INFINITY);
    }
    total
}

fn assign_indices(
    model: &LdrModel,
    pixels: &[IntColor; BLOCK_PIXELS],
    partition: &[u8; BLOCK_PIXELS],
    endpoints: &[EndpointPair; 3],
) -> (Indices, [f32; 3]) {
    let palettes: [(Palette, Option<Palette>); 3] = core::array::from_fn(|r| {
        let [a, b] = model.unquantize_pair(&endpoints[r]);
        model.palettes(a, b)
    });

    let mut indices = Indices {
        color: [0; BLOCK_PIXELS],
        alpha: [0; BLOCK_PIXELS],
    };
    let mut errors = [0.0; 3];

    for (px, pixel) in pixels.iter().enumerate() {
        let region = partition[px] as usize;
        let error = match &palettes[region] {
            (color, None) => {
                let (index, error) = color.nearest(pixel, &Channel::RGBA);
                indices.color[px] = index;
                error
            }
            (color, Some(alpha)) => {
                let (color_index, color_error) = color.nearest(pixel, &Channel::RGB);
                let (alpha_index, alpha_error) = alpha.nearest(pixel, &[Channel::A]);
                indices.color[px] = color_index;
                indices.alpha[px] = alpha_index;
                color_error + alpha_error
            }
        };
        errors[region] += error;
    }

    (indices, errors)
}

/// Makes every anchor index fit into one bit less. Dual index modes swap the color and
/// alpha endpoints independently.
fn swap_indices(
    model: &LdrModel,
    shape: usize,
    partition: &[u8; BLOCK_PIXELS],
    endpoints: &mut [EndpointPair; 3],
    indices: &mut Indices,
) {
    let regions = model.mode.regions;
    for (region, pair) in endpoints.iter_mut().enumerate().take(regions) {
        let anchor = anchor(regions, shape, region);
        if fixup_anchor(&mut indices.color, partition, region, anchor, model.color_index_bits) {
            if model.dual() {
                pair.swap_channels(&Channel::RGB);
            } else {
                pair.swap();
            }
        }
    }

    if model.dual() && fixup_anchor(&mut indices.alpha, partition, 0, 0, model.alpha_index_bits) {
        endpoints[0].swap_channels(&[Channel::A]);
    }
}

fn emit_block(
    model: &LdrModel,
    mode_index: usize,
    shape: usize,
    rotation: u8,
    index_mode: u8,
    endpoints: &[EndpointPair; 3],
    indices: &Indices,
) -> [u8; 16] {
    let mode = model.mode;
    let mut block = [0; 16];
    let mut writer = BitWriter::new(&mut block);

    writer.write(mode_index + 1, 1 << mode_index);
    writer.write(mode.shape_bits as usize, shape as u32);
    writer.write(mode.rotation_bits as usize, rotation as u32);
    writer.write(mode.index_mode_bits as usize, index_mode as u32);

    for &ch in model.stored_channels() {
        let bits = mode.endpoint_bits(ch as usize) as usize;
        for pair in &endpoints[..mode.regions] {
            for color in &pair.colors {
                writer.write(bits, color[ch] as u32);
            }
        }
    }

    match mode.pbits {
        PBits::None => {}
        PBits::Shared => {
            for pair in &endpoints[..mode.regions] {
                writer.write(1, pair.pbits[0] as u32);
            }
        }
        PBits::Unique => {
            for pair in &endpoints[..mode.regions] {
                writer.write(1, pair.pbits[0] as u32);
                writer.write(1, pair.pbits[1] as u32);
            }
        }
    }

    let (primary, secondary) = if index_mode == 0 {
        (&indices.color, &indices.alpha)
    } else {
        (&indices.alpha, &indices.color)
    };

    for (px, &index) in primary.iter().enumerate() {
        let width = mode.index_bits - is_anchor(mode.regions, shape, px) as u8;
        writer.write(width as usize, index as u32);
    }

    if mode.alpha_index_bits > 0 {
        for (px, &index) in secondary.iter().enumerate() {
            let width = mode.alpha_index_bits - (px == 0) as u8;
            writer.write(width as usize, index as u32);
        }
    }

    debug_assert_eq!(writer.position(), BLOCK_BITS);
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode_block_bc7;

    fn encode(pixels: &[Rgba8; 16], settings: &BC7Settings) -> [u8; 16] {
        let mut compressor = BlockCompressorBC7::new(settings);
        compressor.load_block(pixels);
        compressor.compress_bc7_core();
        compressor.block()
    }

    fn max_channel_error(a: &[Rgba8; 16], b: &[Rgba8; 16]) -> i32 {
        a.iter()
            .zip(b)
            .flat_map(|(p, q)| {
                [
                    (p.r as i32 - q.r as i32).abs(),
                    (p.g as i32 - q.g as i32).abs(),
                    (p.b as i32 - q.b as i32).abs(),
                    (p.a as i32 - q.a as i32).abs(),
                ]
            })
            .max()
            .unwrap_or(0)
    }

    #[test]
    fn pbit_quantization_matches_the_requested_low_bit() {
        for bits in [4u8, 5, 6, 7] {
            for value in 0..=255 {
                for pbit in 0..2u8 {
                    let q = quantize_channel(value, bits, Some(pbit));
                    assert!(q < (1 << bits));
                    let back = unquantize_ldr((q << 1) | pbit as i32, bits + 1);
                    // Every other step of the extended precision is reachable.
                    let step = 256 >> bits;
                    assert!((back - value).abs() <= step, "bits {bits} value {value} p {pbit}");
                }
            }
        }
    }

    #[test]
    fn solid_tile_is_reproduced_within_one() {
        let pixels = [Rgba8::new(200, 50, 25, 255); 16];
        let block = encode(&pixels, &BC7Settings::default());
        let decoded = decode_block_bc7(&block).expect("valid block");
        assert!(max_channel_error(&pixels, &decoded) <= 1, "{decoded:?}");
    }

    #[test]
    fn empty_mode_mask_encodes_with_mode_6() {
        let pixels: [Rgba8; 16] =
            core::array::from_fn(|i| Rgba8::new(i as u8 * 16, 80, 255 - i as u8 * 8, 255));
        let block = encode(&pixels, &BC7Settings::alpha_basic().with_mode_mask(0));
        assert_eq!(block[0] & 0x7F, 0x40);

        let decoded = decode_block_bc7(&block).expect("valid block");
        assert!(max_channel_error(&pixels, &decoded) <= 8, "{decoded:?}");
    }

    #[test]
    fn opaque_settings_produce_opaque_pixels() {
        let pixels: [Rgba8; 16] =
            core::array::from_fn(|i| Rgba8::new(i as u8 * 12, 30, 90, i as u8));
        let block = encode(&pixels, &BC7Settings::opaque_fast());
        let decoded = decode_block_bc7(&block).expect("valid block");
        assert!(decoded.iter().all(|p| p.a == 255));
    }

    #[test]
    fn dual_index_modes_keep_alpha_independent() {
        // Color steps along the rows and alpha along the columns, which a single index
        // cannot follow. Mode 4 always has one 3-bit index set, so its alpha levels sit on
        // that ramp.
        for (mask, alpha) in [(1 << 4, [255, 183, 72, 0]), (1 << 5, [255, 170, 85, 0])] {
            let pixels: [Rgba8; 16] = core::array::from_fn(|i| {
                let v = [0, 85, 170, 255][i % 4];
                Rgba8::new(v, v / 2, 64, alpha[i / 4])
            });
            let settings = BC7Settings::alpha_slow().with_mode_mask(mask);
            let block = encode(&pixels, &settings);
            assert_eq!(block[0].trailing_zeros(), mask.trailing_zeros());

            let decoded = decode_block_bc7(&block).expect("valid block");
            assert!(max_channel_error(&pixels, &decoded) <= 8, "mask {mask:#b}: {decoded:?}");
        }
    }
}
