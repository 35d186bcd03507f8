//! Interpolated color ramps between two unquantized endpoints.

use crate::{
    color::{Channel, IntColor},
    tables::{weights, BLOCK_PIXELS, WEIGHT_MAX, WEIGHT_ROUND, WEIGHT_SHIFT},
};

/// Interpolates between `a` and `b` with a weight in 1/64th.
#[inline]
pub(crate) fn interpolate(a: i32, b: i32, weight: i32) -> i32 {
    (a * (WEIGHT_MAX - weight) + b * weight + WEIGHT_ROUND) >> WEIGHT_SHIFT
}

/// Up to 16 colors an index of a given width can select.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Palette {
    entries: [IntColor; BLOCK_PIXELS],
    len: usize,
}

impl Palette {
    /// Builds the `1 << index_bits` entry ramp from `a` to `b`.
    pub(crate) fn build(a: IntColor, b: IntColor, index_bits: u8) -> Self {
        let weights = weights(index_bits);
        let mut entries = [IntColor::default(); BLOCK_PIXELS];
        for (entry, &weight) in entries.iter_mut().zip(weights) {
            *entry = IntColor::new(
                interpolate(a[Channel::R], b[Channel::R], weight),
                interpolate(a[Channel::G], b[Channel::G], weight),
                interpolate(a[Channel::B], b[Channel::B], weight),
                interpolate(a[Channel::A], b[Channel::A], weight),
            );
        }
        Self {
            entries,
            len: weights.len(),
        }
    }

    pub(crate) fn map(mut self, mut f: impl FnMut(Channel, i32) -> i32) -> Self {
        for entry in &mut self.entries[..self.len] {
            *entry = entry.map(&mut f);
        }
        self
    }

    #[inline]
    pub(crate) fn entries(&self) -> &[IntColor] {
        &self.entries[..self.len]
    }

    /// Returns the entry closest to `color` over `channels` and its squared distance.
    ///
    /// The ramp is a line segment, so the search stops at the first entry that is farther
    /// away than its predecessor.
    #[inline]
    pub(crate) fn nearest(&self, color: &IntColor, channels: &[Channel]) -> (u8, f32) {
        let mut best_index = 0;
        let mut best_error = color.distance_sq(&self.entries[0], channels);
        for (index, entry) in self.entries().iter().enumerate().skip(1) {
            let error = color.distance_sq(entry, channels);
            if error > best_error {
                break;
            }
            if error < best_error {
                best_index = index;
                best_error = error;
            }
        }
        (best_index as u8, best_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ramp_ends_at_the_endpoints() {
        let a = IntColor::new(12, 200, 0, 255);
        let b = IntColor::new(240, 3, 77, 0);
        for bits in [2, 3, 4] {
            let palette = Palette::build(a, b, bits);
            let entries = palette.entries();
            assert_eq!(entries.len(), 1 << bits);
            assert_eq!(entries[0], a);
            assert_eq!(entries[entries.len() - 1], b);
        }
    }

    #[test]
    fn ramp_is_monotonic_per_channel() {
        let a = IntColor::new(-31743, 0, 1000, 7);
        let b = IntColor::new(31743, 65535, 999, 7);
        for bits in [2, 3, 4] {
            let palette = Palette::build(a, b, bits);
            for pair in palette.entries().windows(2) {
                assert!(pair[0][Channel::R] < pair[1][Channel::R]);
                assert!(pair[0][Channel::G] < pair[1][Channel::G]);
                assert!(pair[0][Channel::B] >= pair[1][Channel::B]);
                assert_eq!(pair[0][Channel::A], pair[1][Channel::A]);
            }
        }
    }

    #[test]
    fn swapped_endpoints_mirror_the_ramp() {
        let a = IntColor::new(3, 90, 180, 255);
        let b = IntColor::new(250, 17, 64, 128);
        for bits in [2, 3, 4] {
            let forward = Palette::build(a, b, bits);
            let backward = Palette::build(b, a, bits);
            let n = forward.entries().len();
            for i in 0..n {
                assert_eq!(forward.entries()[i], backward.entries()[n - 1 - i]);
            }
        }
    }

    #[test]
    fn nearest_picks_the_closest_entry() {
        let palette = Palette::build(IntColor::splat(0), IntColor::splat(64), 2);
        let (index, error) = palette.nearest(&IntColor::splat(40), &Channel::RGB);
        assert_eq!(index, 2);
        assert_eq!(error, 27.0);

        let (index, error) = palette.nearest(&IntColor::splat(-5), &Channel::RGB);
        assert_eq!(index, 0);
        assert_eq!(error, 75.0);
    }
}
