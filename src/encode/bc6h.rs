use core::ops::RangeInclusive;

use half::f16;

use super::common::*;
use crate::{
    bits::{BitWriter, BLOCK_BITS},
    color::{Channel, IntColor, RgbF16},
    palette::Palette,
    quantize::{f16_to_int, finish_unquantize, quantize_hdr, unquantize_hdr, F16_MAX},
    tables::{anchor, is_anchor, partition, Bc6hMode, Field, BC6H_MODES, BLOCK_PIXELS},
    BC6HSettings,
};

/// Mode tried when no enabled mode can represent a tile. It stores both endpoints
/// untransformed, so every tile fits.
const FALLBACK_MODE: usize = 10;

#[inline(always)]
pub(crate) fn srgb_to_linear(srgb: u8) -> f32 {
    let v = (srgb as f32) / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

/// Inclusive range of an endpoint quantized to `prec` bits.
fn endpoint_range(prec: u8, signed: bool) -> RangeInclusive<i32> {
    if signed {
        let max = (1 << (prec - 1)) - 1;
        -max..=max
    } else {
        0..=(1 << prec) - 1
    }
}

#[inline]
fn fits(value: i32, bits: u8, signed: bool) -> bool {
    if signed {
        let half = 1 << (bits - 1);
        (-half..half).contains(&value)
    } else {
        (0..1 << bits).contains(&value)
    }
}

/// Error model of one BC6H mode.
struct HdrModel<'m> {
    mode: &'m Bc6hMode,
    signed: bool,
    /// Per channel values a transformed mode can store relative to `W`.
    window: Option<[RangeInclusive<i32>; 3]>,
}

impl<'m> HdrModel<'m> {
    fn new(mode: &'m Bc6hMode, signed: bool) -> Self {
        Self {
            mode,
            signed,
            window: None,
        }
    }

    /// Limits the endpoints of a transformed mode to the deltas reachable from `w`.
    fn around(mut self, w: &IntColor) -> Self {
        if self.mode.transformed {
            let full = endpoint_range(self.mode.endpoint_bits, self.signed);
            self.window = Some(core::array::from_fn(|i| {
                let half = 1 << (self.mode.delta_bits[i] - 1);
                let w = w[Channel::RGB[i]];
                (w - half).max(*full.start())..=(w + half - 1).min(*full.end())
            }));
        }
        self
    }

    /// Palette of the decoder for the quantized endpoints, in the integer half float domain.
    fn palette(&self, endpoints: &EndpointPair) -> Palette {
        let prec = self.mode.endpoint_bits;
        let signed = self.signed;
        let unquantize = |c: IntColor| c.map(|_, v| unquantize_hdr(v, prec, signed));

        Palette::build(
            unquantize(endpoints.colors[0]),
            unquantize(endpoints.colors[1]),
            self.mode.index_bits,
        )
        .map(|_, v| finish_unquantize(v, signed))
    }
}

impl EndpointModel for HdrModel<'_> {
    fn channels(&self) -> &[Channel] {
        &Channel::RGB
    }

    fn range(&self, channel: Channel) -> RangeInclusive<i32> {
        match &self.window {
            Some(window) => window[channel as usize].clone(),
            None => endpoint_range(self.mode.endpoint_bits, self.signed),
        }
    }

    fn region_error(&self, pixels: &[IntColor], endpoints: &EndpointPair, limit: f32) -> f32 {
        let palette = self.palette(endpoints);
        let mut total = 0.0;
        for pixel in pixels {
            total += palette.nearest(pixel, &Channel::RGB).1;
            if total > limit {
                break;
            }
        }
        total
    }
}

pub(crate) struct BlockCompressorBC6H<'a> {
    pixels: [IntColor; BLOCK_PIXELS],
    signed: bool,
    best: Candidate,
    settings: &'a BC6HSettings,
}

impl<'a> BlockCompressorBC6H<'a> {
    pub(crate) fn new(settings: &'a BC6HSettings, signed: bool) -> Self {
        Self {
            pixels: [IntColor::default(); BLOCK_PIXELS],
            signed,
            best: Candidate::NONE,
            settings,
        }
    }

    fn load_pixel(&mut self, index: usize, r: f16, g: f16, b: f16) {
        let signed = self.signed;
        self.pixels[index] = IntColor::new(
            f16_to_int(r.to_bits(), signed),
            f16_to_int(g.to_bits(), signed),
            f16_to_int(b.to_bits(), signed),
            0,
        );
    }

    pub(crate) fn load_block(&mut self, pixels: &[RgbF16; BLOCK_PIXELS]) {
        for (index, pixel) in pixels.iter().enumerate() {
            self.load_pixel(index, pixel.r, pixel.g, pixel.b);
        }
    }

    pub(crate) fn load_block_interleaved_8bit(
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

                let red = f16::from_f32(srgb_to_linear(rgba_data[offset]));
                let green = f16::from_f32(srgb_to_linear(rgba_data[offset + 1]));
                let blue = f16::from_f32(srgb_to_linear(rgba_data[offset + 2]));

                self.load_pixel(y * 4 + x, red, green, blue);
            }
        }
    }

    pub(crate) fn load_block_interleaved_16bit(
        &mut self,
        rgba_data: &[f16],
        xx: usize,
        yy: usize,
        stride: usize,
    ) {
        for y in 0..4 {
            for x in 0..4 {
                let pixel_x = xx * 4 + x;
                let pixel_y = yy * 4 + y;

                let offset = pixel_y * stride + pixel_x * 4;

                self.load_pixel(
                    y * 4 + x,
                    rgba_data[offset],
                    rgba_data[offset + 1],
                    rgba_data[offset + 2],
                );
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

    pub(crate) fn compress_bc6h_core(&mut self) {
        self.best = Candidate::NONE;

        for index in 0..BC6H_MODES.len() {
            if self.settings.mode_mask & (1 << index) == 0 {
                continue;
            }
            self.search_mode(index);
            if self.best.error == 0.0 {
                break;
            }
        }

        if !self.best.error.is_finite() {
            self.search_mode(FALLBACK_MODE);
        }

        log::trace!(
            "bc6h tile: mode {} shape {} error {}",
            self.best.mode,
            self.best.shape,
            self.best.error
        );
    }

    fn search_mode(&mut self, mode_index: usize) {
        let mode = &BC6H_MODES[mode_index];
        let shapes = mode.shapes();

        let mut ranked = [(0.0f32, 0usize); 32];
        for (shape, entry) in ranked.iter_mut().enumerate().take(shapes) {
            *entry = (self.rough_error(mode, shape), shape);
        }

        let keep = self.settings.shapes_to_refine(shapes);
        partial_sort_list(&mut ranked[..shapes], keep);

        for &(_, shape) in &ranked[..keep] {
            if let Some(candidate) = self.refine(mode_index, shape) {
                self.best.offer(candidate);
            }
            if self.best.error == 0.0 {
                return;
            }
        }
    }

    fn fit_region(&self, pixels: &[IntColor]) -> [IntColor; 2] {
        let lo = if self.signed { -F16_MAX } else { 0 };
        fit_axis(pixels, &Channel::RGB, F16_MAX as f32, lo..=F16_MAX)
    }

    /// Error of the shape with unquantized endpoints, used to rank the shapes.
    fn rough_error(&self, mode: &Bc6hMode, shape: usize) -> f32 {
        let partition = partition(mode.regions, shape);
        let regions = split_regions(&self.pixels, partition, mode.regions);

        let mut total = 0.0;
        for region in &regions[..mode.regions] {
            let [a, b] = self.fit_region(region.as_slice());
            let palette = Palette::build(a, b, mode.index_bits);
            total += region
                .as_slice()
                .iter()
                .map(|p| palette.nearest(p, &Channel::RGB).1)
                .sum::<f32>();
        }
        total
    }

    fn assign_indices(
        &self,
        model: &HdrModel,
        partition: &[u8; BLOCK_PIXELS],
        endpoints: &[EndpointPair; 2],
    ) -> ([u8; BLOCK_PIXELS], [f32; 2]) {
        let palettes = [model.palette(&endpoints[0]), model.palette(&endpoints[1])];
        let mut indices = [0; BLOCK_PIXELS];
        let mut errors = [0.0; 2];

        for (px, pixel) in self.pixels.iter().enumerate() {
            let region = partition[px] as usize;
            let (index, error) = palettes[region].nearest(pixel, &Channel::RGB);
            indices[px] = index;
            errors[region] += error;
        }

        (indices, errors)
    }

    fn refine(&self, mode_index: usize, shape: usize) -> Option<Candidate> {
        let mode = &BC6H_MODES[mode_index];
        let model = HdrModel::new(mode, self.signed);
        let partition = partition(mode.regions, shape);
        let regions = split_regions(&self.pixels, partition, mode.regions);
        let quantize = |c: IntColor| c.map(|_, v| quantize_hdr(v, mode.endpoint_bits, self.signed));

        let mut org = [EndpointPair::default(); 2];
        for (endpoints, region) in org.iter_mut().zip(&regions).take(mode.regions) {
            let [a, b] = self.fit_region(region.as_slice());
            *endpoints = EndpointPair::new(quantize(a), quantize(b));
        }

        let (mut org_indices, org_err) = self.assign_indices(&model, partition, &org);
        swap_indices(mode, shape, partition, &mut org, &mut org_indices);

        if !endpoints_fit(mode, &field_values(mode, &org), self.signed) {
            return None;
        }
        let mut chosen = Refinement {
            endpoints: org,
            indices: org_indices,
            error: org_err.iter().sum(),
        };

        if self.settings.refine != 0 && chosen.error > 0.0 {
            let model = model.around(&org[0].colors[0]);
            let mut opt = org;
            for (r, region) in regions.iter().enumerate().take(mode.regions) {
                opt[r] = optimize_region(
                    &model,
                    region.as_slice(),
                    org_err[r],
                    &org[r],
                    self.settings.exhaustive_delta as i32,
                )
                .0;
            }

            let (mut opt_indices, opt_err) = self.assign_indices(&model, partition, &opt);
            swap_indices(mode, shape, partition, &mut opt, &mut opt_indices);

            let refined = Refinement {
                endpoints: opt,
                indices: opt_indices,
                error: opt_err.iter().sum(),
            };
            chosen = chosen.or_refined(refined, mode, self.signed);
        }

        Some(Candidate {
            error: chosen.error,
            block: emit_block(mode, shape, &field_values(mode, &chosen.endpoints), &chosen.indices),
            mode: mode_index as u8,
            shape: shape as u8,
        })
    }
}

/// Quantized endpoints of a shape with their indices and error.
#[derive(Copy, Clone, Debug)]
struct Refinement {
    endpoints: [EndpointPair; 2],
    indices: [u8; BLOCK_PIXELS],
    error: f32,
}

impl Refinement {
    /// Takes `refined` if it lowers the error and its deltas still fit the mode. Moving
    /// the `W` endpoint or swapping a region can push the other endpoints out of reach.
    fn or_refined(self, refined: Refinement, mode: &Bc6hMode, signed: bool) -> Refinement {
        if refined.error < self.error
            && endpoints_fit(mode, &field_values(mode, &refined.endpoints), signed)
        {
            refined
        } else {
            self
        }
    }
}

/// Makes every anchor index fit into one bit less by mirroring the region's indices and
/// swapping its endpoints.
fn swap_indices(
    mode: &Bc6hMode,
    shape: usize,
    partition: &[u8; BLOCK_PIXELS],
    endpoints: &mut [EndpointPair; 2],
    indices: &mut [u8; BLOCK_PIXELS],
) {
    for (region, pair) in endpoints.iter_mut().enumerate().take(mode.regions) {
        let anchor = anchor(mode.regions, shape, region);
        if fixup_anchor(indices, partition, region, anchor, mode.index_bits) {
            pair.swap();
        }
    }
}

/// Header values per channel in `W X Y Z` order. Transformed modes store `X`, `Y` and `Z`
/// relative to `W`.
fn field_values(mode: &Bc6hMode, endpoints: &[EndpointPair; 2]) -> [[i32; 4]; 3] {
    let mut fields = [[0; 4]; 3];
    for (values, ch) in fields.iter_mut().zip(Channel::RGB) {
        let w = endpoints[0].colors[0][ch];
        *values = [
            w,
            endpoints[0].colors[1][ch],
            endpoints[1].colors[0][ch],
            endpoints[1].colors[1][ch],
        ];
        if mode.transformed {
            for v in &mut values[1..] {
                *v -= w;
            }
        }
    }
    fields
}

fn endpoints_fit(mode: &Bc6hMode, fields: &[[i32; 4]; 3], signed: bool) -> bool {
    let stored = 2 * mode.regions;
    fields.iter().zip(mode.delta_bits).all(|(values, delta_bits)| {
        fits(values[0], mode.endpoint_bits, signed)
            && values[1..stored]
                .iter()
                .all(|&v| fits(v, delta_bits, signed || mode.transformed))
    })
}

fn emit_block(
    mode: &Bc6hMode,
    shape: usize,
    fields: &[[i32; 4]; 3],
    indices: &[u8; BLOCK_PIXELS],
) -> [u8; 16] {
    let mut block = [0; 16];
    let mut writer = BitWriter::new(&mut block);

    for header_bit in mode.header {
        let value = match header_bit.field {
            Field::Mode => mode.selector as i32,
            Field::Shape => shape as i32,
            Field::Rw => fields[0][0],
            Field::Rx => fields[0][1],
            Field::Ry => fields[0][2],
            Field::Rz => fields[0][3],
            Field::Gw => fields[1][0],
            Field::Gx => fields[1][1],
            Field::Gy => fields[1][2],
            Field::Gz => fields[1][3],
            Field::Bw => fields[2][0],
            Field::Bx => fields[2][1],
            Field::By => fields[2][2],
            Field::Bz => fields[2][3],
        };
        writer.write_bit((value >> header_bit.bit) & 1 != 0);
    }

    for (px, &index) in indices.iter().enumerate() {
        let width = mode.index_bits - is_anchor(mode.regions, shape, px) as u8;
        writer.write(width as usize, index as u32);
    }

    debug_assert_eq!(writer.position(), BLOCK_BITS);
    block
}
