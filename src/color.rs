use core::ops::{Index, IndexMut};

use bytemuck::{Pod, Zeroable};
#[cfg(feature = "bc6h")]
use half::f16;

/// A single 8-bit RGBA sample, as consumed and produced by BC7.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    /// Creates a new sample.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// A single half-float RGB sample, as consumed and produced by BC6H.
#[cfg(feature = "bc6h")]
#[cfg_attr(docsrs, doc(cfg(feature = "bc6h")))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct RgbF16 {
    pub r: f16,
    pub g: f16,
    pub b: f16,
}

#[cfg(feature = "bc6h")]
impl RgbF16 {
    /// Creates a new sample.
    pub const fn new(r: f16, g: f16, b: f16) -> Self {
        Self { r, g, b }
    }

    /// Creates a new sample from `f32` values.
    pub fn from_f32(r: f32, g: f32, b: f32) -> Self {
        Self {
            r: f16::from_f32(r),
            g: f16::from_f32(g),
            b: f16::from_f32(b),
        }
    }
}

/// Color channel selector used by the generic optimizer loops.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub(crate) enum Channel {
    R = 0,
    G = 1,
    B = 2,
    A = 3,
}

impl Channel {
    pub(crate) const RGB: [Channel; 3] = [Channel::R, Channel::G, Channel::B];
    pub(crate) const RGBA: [Channel; 4] = [Channel::R, Channel::G, Channel::B, Channel::A];
}

/// Integer working color. The meaning of the values depends on the stage: full precision
/// samples, quantized endpoints or BC6H endpoint deltas.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub(crate) struct IntColor(pub(crate) [i32; 4]);

impl IntColor {
    pub(crate) const fn new(r: i32, g: i32, b: i32, a: i32) -> Self {
        Self([r, g, b, a])
    }

    #[cfg(test)]
    pub(crate) fn splat(v: i32) -> Self {
        Self([v; 4])
    }

    /// Squared distance over the given channels.
    #[inline]
    pub(crate) fn distance_sq(&self, other: &IntColor, channels: &[Channel]) -> f32 {
        channels
            .iter()
            .map(|&ch| {
                let d = (self[ch] - other[ch]) as f32;
                d * d
            })
            .sum()
    }

    pub(crate) fn map(self, mut f: impl FnMut(Channel, i32) -> i32) -> Self {
        let mut out = self;
        for ch in Channel::RGBA {
            out[ch] = f(ch, self[ch]);
        }
        out
    }

    /// Swaps alpha with the channel a BC7 rotation names. Applying it twice restores the
    /// color.
    #[cfg(feature = "bc7")]
    pub(crate) fn rotate(self, rotation: u8) -> Self {
        let channel = match rotation {
            1 => Channel::R,
            2 => Channel::G,
            3 => Channel::B,
            _ => return self,
        };
        let mut out = self;
        out[Channel::A] = self[channel];
        out[channel] = self[Channel::A];
        out
    }
}

impl Index<Channel> for IntColor {
    type Output = i32;

    #[inline]
    fn index(&self, channel: Channel) -> &i32 {
        &self.0[channel as usize]
    }
}

impl IndexMut<Channel> for IntColor {
    #[inline]
    fn index_mut(&mut self, channel: Channel) -> &mut i32 {
        &mut self.0[channel as usize]
    }
}

impl From<Rgba8> for IntColor {
    fn from(c: Rgba8) -> Self {
        Self::new(c.r as i32, c.g as i32, c.b as i32, c.a as i32)
    }
}

impl From<IntColor> for Rgba8 {
    fn from(c: IntColor) -> Self {
        let clamp = |v: i32| v.clamp(0, 255) as u8;
        Rgba8::new(
            clamp(c[Channel::R]),
            clamp(c[Channel::G]),
            clamp(c[Channel::B]),
            clamp(c[Channel::A]),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_accessors_address_separate_slots() {
        let mut c = IntColor::default();
        c[Channel::G] = 7;
        c[Channel::A] = -3;
        assert_eq!(c, IntColor::new(0, 7, 0, -3));
    }

    #[test]
    fn distance_respects_channel_set() {
        let a = IntColor::new(10, 20, 30, 40);
        let b = IntColor::new(11, 22, 33, 0);
        assert_eq!(a.distance_sq(&b, &Channel::RGB), 14.0);
        assert_eq!(a.distance_sq(&b, &Channel::RGBA), 1614.0);
        assert_eq!(a.distance_sq(&b, &[Channel::A]), 1600.0);
    }

    #[cfg(feature = "bc7")]
    #[test]
    fn rotation_swaps_alpha_and_back() {
        let color = IntColor::new(1, 2, 3, 4);
        for rotation in 0..4 {
            assert_eq!(color.rotate(rotation).rotate(rotation), color);
        }
        assert_eq!(color.rotate(0), color);
        assert_eq!(color.rotate(2), IntColor::new(1, 4, 3, 2));
    }
}
