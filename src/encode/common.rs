use core::ops::RangeInclusive;

use crate::{
    color::{Channel, IntColor},
    tables::BLOCK_PIXELS,
};

#[inline(always)]
pub(crate) const fn sq(x: f32) -> f32 {
    x * x
}

/// Best block found so far for one tile.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Candidate {
    pub(crate) error: f32,
    pub(crate) block: [u8; 16],
    pub(crate) mode: u8,
    pub(crate) shape: u8,
}

impl Candidate {
    pub(crate) const NONE: Candidate = Candidate {
        error: f32::INFINITY,
        block: [0; 16],
        mode: 0,
        shape: 0,
    };

    #[inline]
    pub(crate) fn offer(&mut self, other: Candidate) {
        if other.error < self.error {
            *self = other;
        }
    }
}

/// Two quantized endpoints of one region. `pbits` is only used by BC7 modes that store
/// them; a shared p-bit is kept in both slots.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct EndpointPair {
    pub(crate) colors: [IntColor; 2],
    pub(crate) pbits: [u8; 2],
}

impl EndpointPair {
    pub(crate) fn new(a: IntColor, b: IntColor) -> Self {
        Self {
            colors: [a, b],
            pbits: [0; 2],
        }
    }

    /// Swaps the two endpoints in the given channels.
    pub(crate) fn swap_channels(&mut self, channels: &[Channel]) {
        let [a, b] = &mut self.colors;
        for &ch in channels {
            core::mem::swap(&mut a[ch], &mut b[ch]);
        }
    }

    /// Swaps both endpoints completely, including their p-bits.
    pub(crate) fn swap(&mut self) {
        self.colors.swap(0, 1);
        self.pbits.swap(0, 1);
    }
}

/// Pixels that belong to one region of a shape.
#[derive(Copy, Clone)]
pub(crate) struct RegionPixels {
    colors: [IntColor; BLOCK_PIXELS],
    len: usize,
}

impl RegionPixels {
    #[inline]
    pub(crate) fn as_slice(&self) -> &[IntColor] {
        &self.colors[..self.len]
    }
}

pub(crate) fn split_regions(
    pixels: &[IntColor; BLOCK_PIXELS],
    partition: &[u8; BLOCK_PIXELS],
    regions: usize,
) -> [RegionPixels; 3] {
    let mut out = [RegionPixels {
        colors: [IntColor::default(); BLOCK_PIXELS],
        len: 0,
    }; 3];

    for (pixel, &region) in pixels.iter().zip(partition) {
        let region = &mut out[region as usize];
        region.colors[region.len] = *pixel;
        region.len += 1;
    }

    debug_assert!(out[regions..].iter().all(|r| r.len == 0));
    out
}

/// What the endpoint search needs to know about a mode.
pub(crate) trait EndpointModel {
    /// Channels the endpoints store and the optimizer may move.
    fn channels(&self) -> &[Channel];

    /// Inclusive range of a quantized value of `channel`.
    fn range(&self, channel: Channel) -> RangeInclusive<i32>;

    /// Total error of `pixels` when each picks its best palette entry. Once the running sum
    /// exceeds `limit` the evaluation may stop and return any value above `limit`.
    fn region_error(&self, pixels: &[IntColor], endpoints: &EndpointPair, limit: f32) -> f32;
}

/// Mirrors all indices of `region` if the index at `anchor` has its high bit set. Returns
/// `true` if the caller has to swap the endpoints to keep the reconstruction unchanged.
pub(crate) fn fixup_anchor(
    indices: &mut [u8; BLOCK_PIXELS],
    partition: &[u8; BLOCK_PIXELS],
    region: usize,
    anchor: usize,
    index_bits: u8,
) -> bool {
    let high_bit = 1 << (index_bits - 1);
    if indices[anchor] & high_bit == 0 {
        return false;
    }

    let max_index = (1u8 << index_bits) - 1;
    for (index, &r) in indices.iter_mut().zip(partition) {
        if r as usize == region {
            *index = max_index - *index;
        }
    }
    true
}

/// Keeps the `partial_count` lowest error entries at the front of `list`, in order.
pub(crate) fn partial_sort_list(list: &mut [(f32, usize)], partial_count: usize) {
    for k in 0..partial_count.min(list.len()) {
        let mut best_idx = k;
        let mut best_value = list[k].0;

        for (i, entry) in list.iter().enumerate().skip(k + 1) {
            if best_value > entry.0 {
                best_value = entry.0;
                best_idx = i;
            }
        }

        list.swap(k, best_idx);
    }
}

const AXIS_ITERATIONS: usize = 8;
const AXIS_MIN_LENGTH: f32 = 1.0 / 4096.0;
const AXIS_EPSILON: f32 = sq(0.25 / 64.0);
const AXIS_STEPS: usize = 4;
const AXIS_PC: [f32; AXIS_STEPS] = [1.0, 2.0 / 3.0, 1.0 / 3.0, 0.0];
const AXIS_PD: [f32; AXIS_STEPS] = [0.0, 1.0 / 3.0, 2.0 / 3.0, 1.0];

type Vector = [f32; 4];

#[inline]
fn dot(a: &Vector, b: &Vector) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3]
}

#[inline]
fn sub(a: &Vector, b: &Vector) -> Vector {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2], a[3] - b[3]]
}

/// Rough endpoints for `points` along their dominant axis.
///
/// Works on values divided by `scale`, so the step thresholds are independent of the value
/// domain. The fitted endpoints are rounded and clamped into `bounds`. Channels not listed
/// in `channels` are left at zero.
pub(crate) fn fit_axis(
    points: &[IntColor],
    channels: &[Channel],
    scale: f32,
    bounds: RangeInclusive<i32>,
) -> [IntColor; 2] {
    match points {
        [] => return [IntColor::default(); 2],
        [p] => return [*p, *p],
        [p, q] => return [*p, *q],
        _ => {}
    }

    let n = channels.len();
    let mut pts = [[0.0f32; 4]; BLOCK_PIXELS];
    for (pt, point) in pts.iter_mut().zip(points) {
        for (i, &ch) in channels.iter().enumerate() {
            pt[i] = point[ch] as f32 / scale;
        }
    }
    let pts = &pts[..points.len()];

    let mut x = [0.0f32; 4];
    let mut y = [0.0f32; 4];
    for i in 0..n {
        x[i] = pts.iter().map(|p| p[i]).fold(f32::INFINITY, f32::min);
        y[i] = pts.iter().map(|p| p[i]).fold(f32::NEG_INFINITY, f32::max);
    }

    let store = |x: &Vector, y: &Vector| {
        let mut out = [IntColor::default(); 2];
        for (i, &ch) in channels.iter().enumerate() {
            let clamp = |v: f32| ((v * scale).round() as i32).clamp(*bounds.start(), *bounds.end());
            out[0][ch] = clamp(x[i]);
            out[1][ch] = clamp(y[i]);
        }
        out
    };

    let ab = sub(&y, &x);
    let f_ab = dot(&ab, &ab);

    // Single color.
    if f_ab < f32::MIN_POSITIVE {
        return store(&x, &y);
    }

    // Pick the diagonal of the bounding box that best fits the data.
    let inv_ab = 1.0 / f_ab;
    let dir = ab.map(|v| v * inv_ab);
    let mid: Vector = core::array::from_fn(|i| (x[i] + y[i]) * 0.5);
    let directions = 1usize << (n - 1);
    let mut f_dir = [0.0f32; 8];
    for p in pts {
        let pt: Vector = core::array::from_fn(|i| (p[i] - mid[i]) * dir[i]);
        for (d, acc) in f_dir.iter_mut().enumerate().take(directions) {
            let mut f = pt[0];
            for k in 1..n {
                if d & (1 << (n - 1 - k)) != 0 {
                    f -= pt[k];
                } else {
                    f += pt[k];
                }
            }
            *acc += f * f;
        }
    }

    let mut best_dir = 0;
    for d in 1..directions {
        if f_dir[d] > f_dir[best_dir] {
            best_dir = d;
        }
    }
    for k in 1..n {
        if best_dir & (1 << (n - 1 - k)) != 0 {
            core::mem::swap(&mut x[k], &mut y[k]);
        }
    }

    // Two colors.
    if f_ab < AXIS_MIN_LENGTH {
        return store(&x, &y);
    }

    // Newton's method on the sum of squared errors.
    let f_steps = (AXIS_STEPS - 1) as f32;
    for _ in 0..AXIS_ITERATIONS {
        let steps: [Vector; AXIS_STEPS] = core::array::from_fn(|s| {
            core::array::from_fn(|i| x[i] * AXIS_PC[s] + y[i] * AXIS_PD[s])
        });

        let dir = sub(&y, &x);
        let len = dot(&dir, &dir);
        if len < AXIS_MIN_LENGTH {
            break;
        }
        let dir = dir.map(|v| v * (f_steps / len));

        let mut d2x = 0.0;
        let mut d2y = 0.0;
        let mut dx = [0.0f32; 4];
        let mut dy = [0.0f32; 4];

        for p in pts {
            let f_dot = dot(&sub(p, &x), &dir);
            let step = if f_dot <= 0.0 {
                0
            } else if f_dot >= f_steps {
                AXIS_STEPS - 1
            } else {
                (f_dot + 0.5) as usize
            };

            let diff = sub(&steps[step], p);
            let fc = AXIS_PC[step] * (1.0 / 8.0);
            let fd = AXIS_PD[step] * (1.0 / 8.0);

            d2x += fc * AXIS_PC[step];
            d2y += fd * AXIS_PD[step];
            for i in 0..4 {
                dx[i] += fc * diff[i];
                dy[i] += fd * diff[i];
            }
        }

        if d2x > 0.0 {
            let f = -1.0 / d2x;
            for i in 0..4 {
                x[i] += dx[i] * f;
            }
        }
        if d2y > 0.0 {
            let f = -1.0 / d2y;
            for i in 0..4 {
                y[i] += dy[i] * f;
            }
        }

        if dot(&dx, &dx) < AXIS_EPSILON && dot(&dy, &dy) < AXIS_EPSILON {
            break;
        }
    }

    store(&x, &y)
}

/// Largest power of two not above half the width of `range`.
fn first_step(range: &RangeInclusive<i32>) -> i32 {
    let span = (range.end() - range.start() + 1) as u32;
    (span.next_power_of_two() >> 1) as i32
}

/// Binary search of one endpoint channel, halving the step while moving towards a lower
/// error. Returns the best value and its error.
fn perturb_one<M: EndpointModel>(
    model: &M,
    pixels: &[IntColor],
    endpoints: &EndpointPair,
    channel: Channel,
    endpoint: usize,
    old_err: f32,
) -> (i32, f32) {
    let range = model.range(channel);
    let mut trial = *endpoints;
    let mut best = endpoints.colors[endpoint][channel];
    let mut min_err = old_err;
    let mut step = first_step(&range);

    while step > 0 {
        let mut best_step = 0;
        for delta in [-step, step] {
            let value = best + delta;
            if !range.contains(&value) {
                continue;
            }
            trial.colors[endpoint][channel] = value;
            let err = model.region_error(pixels, &trial, min_err);
            if err < min_err {
                min_err = err;
                best_step = delta;
            }
        }
        best += best_step;
        trial.colors[endpoint][channel] = best;
        step >>= 1;
    }

    (best, min_err)
}

/// Tries every pair within `delta` of the current endpoints in one channel, keeping their
/// order.
fn exhaustive<M: EndpointModel>(
    model: &M,
    pixels: &[IntColor],
    channel: Channel,
    endpoints: &mut EndpointPair,
    org_err: f32,
    delta: i32,
) -> f32 {
    if org_err == 0.0 || delta <= 0 {
        return org_err;
    }

    let range = model.range(channel);
    let (lo, hi) = (*range.start(), *range.end());
    let a0 = endpoints.colors[0][channel];
    let b0 = endpoints.colors[1][channel];
    let (a_lo, a_hi) = ((a0 - delta).max(lo), (a0 + delta).min(hi));
    let (b_lo, b_hi) = ((b0 - delta).max(lo), (b0 + delta).min(hi));

    let mut trial = *endpoints;
    let mut best = (a0, b0);
    let mut best_err = org_err;

    let mut try_pair = |a: i32, b: i32, best_err: &mut f32, best: &mut (i32, i32)| {
        trial.colors[0][channel] = a;
        trial.colors[1][channel] = b;
        let err = model.region_error(pixels, &trial, *best_err);
        if err < *best_err {
            *best_err = err;
            *best = (a, b);
        }
    };

    if a0 <= b0 {
        for a in a_lo..=a_hi {
            for b in a.max(b_lo)..=b_hi {
                try_pair(a, b, &mut best_err, &mut best);
            }
        }
    } else {
        for b in b_lo..=b_hi {
            for a in b.max(a_lo)..=a_hi {
                try_pair(a, b, &mut best_err, &mut best);
            }
        }
    }

    if best_err < org_err {
        endpoints.colors[0][channel] = best.0;
        endpoints.colors[1][channel] = best.1;
    }
    best_err
}

/// Refines the endpoints of one region: coordinate descent per channel, alternating between
/// the endpoints, followed by a small exhaustive search around the result.
pub(crate) fn optimize_region<M: EndpointModel>(
    model: &M,
    pixels: &[IntColor],
    org_err: f32,
    org: &EndpointPair,
    exhaustive_delta: i32,
) -> (EndpointPair, f32) {
    let mut opt = *org;
    let mut opt_err = org_err;

    for &ch in model.channels() {
        if opt_err == 0.0 {
            break;
        }

        // Start with the endpoint that improves most, alternating blindly tends to get
        // stuck in a local minimum.
        let (new_a, err_a) = perturb_one(model, pixels, &opt, ch, 0, opt_err);
        let (new_b, err_b) = perturb_one(model, pixels, &opt, ch, 1, opt_err);

        let mut endpoint = if err_a < err_b {
            if err_a >= opt_err {
                continue;
            }
            opt.colors[0][ch] = new_a;
            opt_err = err_a;
            1
        } else {
            if err_b >= opt_err {
                continue;
            }
            opt.colors[1][ch] = new_b;
            opt_err = err_b;
            0
        };

        loop {
            let (value, err) = perturb_one(model, pixels, &opt, ch, endpoint, opt_err);
            if err >= opt_err {
                break;
            }
            opt.colors[endpoint][ch] = value;
            opt_err = err;
            endpoint = 1 - endpoint;
        }
    }

    if exhaustive_delta > 0 {
        for &ch in model.channels() {
            opt_err = exhaustive(model, pixels, ch, &mut opt, opt_err, exhaustive_delta);
        }
    }

    (opt, opt_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{palette::Palette, tables};

    /// Endpoints stored as plain 8-bit values with a 3-bit index.
    struct Plain;

    impl EndpointModel for Plain {
        fn channels(&self) -> &[Channel] {
            &Channel::RGB
        }

        fn range(&self, _channel: Channel) -> RangeInclusive<i32> {
            0..=255
        }

        fn region_error(&self, pixels: &[IntColor], endpoints: &EndpointPair, _limit: f32) -> f32 {
            let palette = Palette::build(endpoints.colors[0], endpoints.colors[1], 3);
            pixels.iter().map(|p| palette.nearest(p, &Channel::RGB).1).sum()
        }
    }

    #[test]
    fn fixup_clears_the_anchor_high_bit_for_every_shape() {
        for regions in 2..=3 {
            for shape in 0..64 {
                let partition = tables::partition(regions, shape);
                for index_bits in [2u8, 3] {
                    let max = (1u8 << index_bits) - 1;
                    let mut indices: [u8; 16] =
                        core::array::from_fn(|i| max - (i as u8 % (max + 1)));
                    let before = indices;

                    for region in 0..regions {
                        let anchor = tables::anchor(regions, shape, region);
                        fixup_anchor(&mut indices, partition, region, anchor, index_bits);
                        assert_eq!(indices[anchor] >> (index_bits - 1), 0);
                    }

                    for px in 0..16 {
                        let mirrored = max - before[px];
                        assert!(indices[px] == before[px] || indices[px] == mirrored);
                    }
                }
            }
        }
    }

    #[test]
    fn partial_sort_moves_the_lowest_to_the_front() {
        let mut list = [(5.0, 0), (1.0, 1), (4.0, 2), (1.0, 3), (0.5, 4)];
        partial_sort_list(&mut list, 3);
        assert_eq!(list[0], (0.5, 4));
        assert_eq!(list[1], (1.0, 1));
        assert_eq!(list[2], (1.0, 3));
    }

    #[test]
    fn axis_fit_spans_a_gradient() {
        let points: Vec<IntColor> = (0..16)
            .map(|i| IntColor::new(i * 16, 255 - i * 16, 128, 0))
            .collect();
        let [a, b] = fit_axis(&points, &Channel::RGB, 255.0, 0..=255);
        // Four evenly spaced steps sit inside the range of an even gradient.
        assert!((16..=40).contains(&a[Channel::R]), "{a:?} {b:?}");
        assert!((200..=224).contains(&b[Channel::R]), "{a:?} {b:?}");
        assert!((215..=239).contains(&a[Channel::G]), "{a:?} {b:?}");
        assert!((31..=55).contains(&b[Channel::G]), "{a:?} {b:?}");
        assert_eq!(a[Channel::B], 128);
        assert_eq!(b[Channel::B], 128);
    }

    #[test]
    fn axis_fit_uses_one_or_two_pixels_directly() {
        let p = IntColor::new(1, 2, 3, 4);
        let q = IntColor::new(9, 8, 7, 6);
        assert_eq!(fit_axis(&[p], &Channel::RGB, 255.0, 0..=255), [p, p]);
        assert_eq!(fit_axis(&[p, q], &Channel::RGB, 255.0, 0..=255), [p, q]);
    }

    #[test]
    fn optimizer_never_increases_the_error() {
        let pixels: Vec<IntColor> = (0..16)
            .map(|i| IntColor::new((i * 37) % 256, (i * 11 + 40) % 256, 200 - i * 3, 255))
            .collect();
        let org = EndpointPair::new(IntColor::new(10, 40, 150, 0), IntColor::new(240, 200, 200, 0));
        let org_err = Plain.region_error(&pixels, &org, f32::INFINITY);

        let (opt, opt_err) = optimize_region(&Plain, &pixels, org_err, &org, 2);
        assert!(opt_err <= org_err);
        assert_eq!(Plain.region_error(&pixels, &opt, f32::INFINITY), opt_err);
    }

    #[test]
    fn optimizer_finds_an_exact_solid_fit() {
        let pixels = [IntColor::new(77, 150, 3, 255); 16];
        let org = EndpointPair::new(IntColor::new(60, 140, 0, 0), IntColor::new(90, 160, 20, 0));
        let org_err = Plain.region_error(&pixels, &org, f32::INFINITY);

        let (_, opt_err) = optimize_region(&Plain, &pixels, org_err, &org, 0);
        assert_eq!(opt_err, 0.0);
    }
}
