#[cfg(any(feature = "bc6h", feature = "bc7"))]
use bytemuck::{Pod, Zeroable};

/// Encoding settings for BC6H.
///
/// Every enabled mode is tried. For the 2-region modes all 32 shapes get a rough error
/// estimate and only the best `32 >> shape_shift` of them are refined.
#[cfg(feature = "bc6h")]
#[cfg_attr(docsrs, doc(cfg(feature = "bc6h")))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct BC6HSettings {
    pub(crate) mode_mask: u32,
    pub(crate) shape_shift: u32,
    pub(crate) refine: u32,
    pub(crate) exhaustive_delta: u32,
}

#[cfg(feature = "bc6h")]
impl BC6HSettings {
    const ALL_MODES: u32 = 0x3FFF;
    const SINGLE_REGION_MODES: u32 = 0x3C00;

    /// Very fast settings.
    pub const fn very_fast() -> Self {
        Self {
            mode_mask: Self::SINGLE_REGION_MODES,
            shape_shift: 5,
            refine: false as _,
            exhaustive_delta: 0,
        }
    }

    /// Fast settings.
    pub const fn fast() -> Self {
        Self {
            mode_mask: Self::ALL_MODES,
            shape_shift: 4,
            refine: true as _,
            exhaustive_delta: 0,
        }
    }

    /// Basic settings.
    pub const fn basic() -> Self {
        Self {
            mode_mask: Self::ALL_MODES,
            shape_shift: 2,
            refine: true as _,
            exhaustive_delta: 2,
        }
    }

    /// Slow settings.
    pub const fn slow() -> Self {
        Self {
            mode_mask: Self::ALL_MODES,
            shape_shift: 1,
            refine: true as _,
            exhaustive_delta: 3,
        }
    }

    /// Very slow settings.
    pub const fn very_slow() -> Self {
        Self {
            mode_mask: Self::ALL_MODES,
            shape_shift: 0,
            refine: true as _,
            exhaustive_delta: 5,
        }
    }

    /// Restricts the searched modes. Bit `n` enables mode `n`, in the order of the BC6H
    /// format documentation (0 is the 2-bit selector mode `00`, 13 is the 16-bit mode).
    pub const fn with_mode_mask(mut self, mask: u16) -> Self {
        self.mode_mask = mask as u32 & Self::ALL_MODES;
        self
    }

    pub(crate) const fn shapes_to_refine(&self, shapes: usize) -> usize {
        let n = shapes >> self.shape_shift;
        if n == 0 {
            1
        } else {
            n
        }
    }
}

#[cfg(feature = "bc6h")]
impl Default for BC6HSettings {
    fn default() -> Self {
        Self::basic()
    }
}

/// Encoding settings for BC7.
#[cfg(feature = "bc7")]
#[cfg_attr(docsrs, doc(cfg(feature = "bc7")))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct BC7Settings {
    pub(crate) mode_mask: u32,
    pub(crate) shape_shift: u32,
    pub(crate) rotations: u32,
    pub(crate) index_modes: u32,
    pub(crate) refine: u32,
    pub(crate) exhaustive_delta: u32,
    pub(crate) channels: u32,
}

#[cfg(feature = "bc7")]
#[cfg_attr(docsrs, doc(cfg(feature = "bc7")))]
impl BC7Settings {
    /// Opaque ultra fast settings.
    pub const fn opaque_ultra_fast() -> Self {
        Self {
            channels: 3,
            mode_mask: 0b0100_0000,
            shape_shift: 4,
            rotations: false as _,
            index_modes: false as _,
            refine: false as _,
            exhaustive_delta: 0,
        }
    }

    /// Opaque very fast settings.
    pub const fn opaque_very_fast() -> Self {
        Self {
            channels: 3,
            mode_mask: 0b0100_0010,
            shape_shift: 4,
            rotations: false as _,
            index_modes: false as _,
            refine: true as _,
            exhaustive_delta: 0,
        }
    }

    /// Opaque fast settings.
    pub const fn opaque_fast() -> Self {
        Self {
            channels: 3,
            mode_mask: 0b0110_1010,
            shape_shift: 3,
            rotations: false as _,
            index_modes: false as _,
            refine: true as _,
            exhaustive_delta: 0,
        }
    }

    /// Opaque basic settings.
    pub const fn opaque_basic() -> Self {
        Self {
            channels: 3,
            mode_mask: 0b0111_1010,
            shape_shift: 2,
            rotations: false as _,
            index_modes: true as _,
            refine: true as _,
            exhaustive_delta: 2,
        }
    }

    /// Opaque slow settings.
    pub const fn opaque_slow() -> Self {
        Self {
            channels: 3,
            mode_mask: 0b0111_1111,
            shape_shift: 0,
            rotations: false as _,
            index_modes: true as _,
            refine: true as _,
            exhaustive_delta: 5,
        }
    }

    /// Alpha ultra fast settings.
    pub const fn alpha_ultrafast() -> Self {
        Self {
            channels: 4,
            mode_mask: 0b0100_0000,
            shape_shift: 4,
            rotations: false as _,
            index_modes: false as _,
            refine: false as _,
            exhaustive_delta: 0,
        }
    }

    /// Alpha very fast settings.
    pub const fn alpha_very_fast() -> Self {
        Self {
            channels: 4,
            mode_mask: 0b0110_0000,
            shape_shift: 4,
            rotations: false as _,
            index_modes: false as _,
            refine: true as _,
            exhaustive_delta: 0,
        }
    }

    /// Alpha fast settings.
    pub const fn alpha_fast() -> Self {
        Self {
            channels: 4,
            mode_mask: 0b1110_0010,
            shape_shift: 3,
            rotations: true as _,
            index_modes: false as _,
            refine: true as _,
            exhaustive_delta: 0,
        }
    }

    /// Alpha basic settings.
    pub const fn alpha_basic() -> Self {
        Self {
            channels: 4,
            mode_mask: 0b1111_1010,
            shape_shift: 2,
            rotations: true as _,
            index_modes: true as _,
            refine: true as _,
            exhaustive_delta: 2,
        }
    }

    /// Alpha slow settings.
    pub const fn alpha_slow() -> Self {
        Self {
            channels: 4,
            mode_mask: 0b1111_1111,
            shape_shift: 0,
            rotations: true as _,
            index_modes: true as _,
            refine: true as _,
            exhaustive_delta: 5,
        }
    }

    /// Restricts the searched modes, bit `n` enables mode `n`.
    ///
    /// A mask without any mode still encodes every tile with mode 6.
    pub const fn with_mode_mask(mut self, mask: u8) -> Self {
        self.mode_mask = mask as u32;
        self
    }

    pub(crate) const fn effective_mode_mask(&self) -> u32 {
        if self.mode_mask & 0xFF == 0 {
            1 << 6
        } else {
            self.mode_mask & 0xFF
        }
    }

    pub(crate) const fn shapes_to_refine(&self, shapes: usize) -> usize {
        let n = shapes >> self.shape_shift;
        if n == 0 {
            1
        } else {
            n
        }
    }
}

#[cfg(feature = "bc7")]
impl Default for BC7Settings {
    fn default() -> Self {
        Self::alpha_basic()
    }
}
