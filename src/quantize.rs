//! Mapping between full precision channel values and the precision an endpoint is stored at.
//!
//! BC7 works on 8-bit channel values. BC6H works on the integer view of a half float: the
//! raw bit pattern for positive values and the negated magnitude for negative ones, clamped
//! to the largest finite half (`F16_MAX`).

/// Largest finite half float as an integer bit pattern.
#[cfg(feature = "bc6h")]
pub(crate) const F16_MAX: i32 = 0x7BFF;

#[cfg(feature = "bc6h")]
const F16_SIGN: u16 = 0x8000;
#[cfg(feature = "bc6h")]
const F16_MAGNITUDE: u16 = 0x7FFF;

/// Quantizes an 8-bit value to the `prec` bit value whose expansion is nearest.
#[cfg(feature = "bc7")]
#[inline]
pub(crate) fn quantize_ldr(value: i32, prec: u8) -> i32 {
    debug_assert!((1..=8).contains(&prec));
    debug_assert!((0..=255).contains(&value));
    if prec == 8 {
        return value;
    }
    let max = (1 << prec) - 1;
    let q = i32::min(max, (value + (1 << (7 - prec))) >> (8 - prec));

    // Bit replication spreads the levels unevenly, a neighbor can expand closer.
    let distance = |q: i32| (unquantize_ldr(q, prec) - value).abs();
    [q - 1, q + 1]
        .into_iter()
        .filter(|c| (0..=max).contains(c))
        .fold(q, |best, c| if distance(c) < distance(best) { c } else { best })
}

/// Expands a `prec` bit value back to 8 bits by replicating its high bits until the low
/// bits are filled.
#[cfg(feature = "bc7")]
#[inline]
pub(crate) fn unquantize_ldr(q: i32, prec: u8) -> i32 {
    debug_assert!((1..=8).contains(&prec));
    let mut value = q << (8 - prec);
    let mut filled = prec;
    while filled < 8 {
        value |= value >> filled;
        filled *= 2;
    }
    value
}

/// Sign extends the low `bits` bits of `value`.
#[cfg(feature = "bc6h")]
#[inline]
pub(crate) fn extend_sign(value: i32, bits: u8) -> i32 {
    let shift = 32 - bits as u32;
    (value << shift) >> shift
}

/// Converts half float bits into the integer domain the BC6H encoder works in.
///
/// Negative values become zero for the unsigned format. Infinities and NaNs are clamped to
/// the largest finite magnitude.
#[cfg(feature = "bc6h")]
pub(crate) fn f16_to_int(bits: u16, signed: bool) -> i32 {
    let magnitude = i32::min((bits & F16_MAGNITUDE) as i32, F16_MAX);
    let negative = bits & F16_SIGN != 0;
    match (negative, signed) {
        (false, _) => magnitude,
        (true, true) => -magnitude,
        (true, false) => 0,
    }
}

/// Converts an integer domain value back to half float bits.
#[cfg(feature = "bc6h")]
pub(crate) fn int_to_f16(value: i32, signed: bool) -> u16 {
    if signed && value < 0 {
        F16_SIGN | i32::min(-value, F16_MAX) as u16
    } else {
        value.clamp(0, F16_MAX) as u16
    }
}

/// Quantizes an integer domain value to `prec` bits.
///
/// At the precisions the decoder passes through unchanged (16 bits, or 15 and above for the
/// unsigned format) the value is scaled so that the decoder's final 31/64 (31/32) rescale
/// reproduces it exactly.
#[cfg(feature = "bc6h")]
pub(crate) fn quantize_hdr(value: i32, prec: u8, signed: bool) -> i32 {
    if signed {
        let magnitude = i32::min(value.abs(), F16_MAX);
        let q = if prec >= 16 {
            i32::min((magnitude * 32 + 30) / 31, 0x7FFF)
        } else {
            (magnitude << (prec - 1)) / (F16_MAX + 1)
        };
        if value < 0 {
            -q
        } else {
            q
        }
    } else {
        let value = value.clamp(0, F16_MAX);
        if prec >= 15 {
            i32::min((value * 64 + 30) / 31, 0xFFFF)
        } else {
            (value << prec) / (F16_MAX + 1)
        }
    }
}

/// Expands a `prec` bit endpoint to the 16-bit interpolation domain.
#[cfg(feature = "bc6h")]
pub(crate) fn unquantize_hdr(q: i32, prec: u8, signed: bool) -> i32 {
    if !signed {
        if prec >= 15 {
            q
        } else if q == 0 {
            0
        } else if q == (1 << prec) - 1 {
            0xFFFF
        } else {
            ((q << 16) + 0x8000) >> prec
        }
    } else if prec >= 16 {
        q
    } else {
        let magnitude = q.abs();
        let unq = if magnitude == 0 {
            0
        } else if magnitude >= (1 << (prec - 1)) - 1 {
            0x7FFF
        } else {
            ((magnitude << 15) + 0x4000) >> (prec - 1)
        };
        if q < 0 {
            -unq
        } else {
            unq
        }
    }
}

/// Rescales an interpolated value into the integer half float domain.
#[cfg(feature = "bc6h")]
#[inline]
pub(crate) fn finish_unquantize(value: i32, signed: bool) -> i32 {
    if !signed {
        (value * 31) >> 6
    } else if value < 0 {
        -(((-value) * 31) >> 5)
    } else {
        (value * 31) >> 5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "bc7")]
    #[test]
    fn ldr_round_trip_stays_within_one_step() {
        for prec in 1..=8u8 {
            let step = 256 >> prec;
            for value in 0..=255 {
                let q = quantize_ldr(value, prec);
                assert!(q < (1 << prec), "prec {prec} value {value} -> {q}");
                let back = unquantize_ldr(q, prec);
                assert!(
                    (back - value).abs() <= step,
                    "prec {prec} value {value} -> {back}"
                );
            }
        }
    }

    #[cfg(feature = "bc7")]
    #[test]
    fn ldr_low_precisions_fill_every_bit() {
        assert_eq!(unquantize_ldr(1, 1), 255);
        assert_eq!([0, 1, 2, 3].map(|q| unquantize_ldr(q, 2)), [0, 85, 170, 255]);
        assert_eq!(unquantize_ldr(5, 3), 182);
        assert_eq!(unquantize_ldr(0b10110, 5), 0b1011_0101);
        assert_eq!(quantize_ldr(160, 2), 2);
        assert_eq!(quantize_ldr(127, 1), 0);
        assert_eq!(quantize_ldr(128, 1), 1);
    }

    #[cfg(feature = "bc7")]
    #[test]
    fn ldr_quantization_picks_the_nearest_level() {
        for prec in 1..=8u8 {
            for value in 0..=255 {
                let q = quantize_ldr(value, prec);
                let error = (unquantize_ldr(q, prec) - value).abs();
                let best = (0..1 << prec)
                    .map(|c| (unquantize_ldr(c, prec) - value).abs())
                    .min()
                    .unwrap();
                assert_eq!(error, best, "prec {prec} value {value} -> {q}");
            }
        }
    }

    #[cfg(feature = "bc7")]
    #[test]
    fn ldr_extremes_are_exact() {
        for prec in 1..=8u8 {
            assert_eq!(unquantize_ldr(quantize_ldr(0, prec), prec), 0);
            assert_eq!(unquantize_ldr(quantize_ldr(255, prec), prec), 255);
        }
    }

    #[cfg(feature = "bc6h")]
    #[test]
    fn hdr_round_trip_stays_within_one_step() {
        for signed in [false, true] {
            for prec in 1..=16u8 {
                let value_bits = if signed { prec - 1 } else { prec };
                let step = (F16_MAX + 1) >> value_bits.min(15);
                for value in (0..=F16_MAX).step_by(97).chain([F16_MAX]) {
                    for value in [value, -value] {
                        if !signed && value < 0 {
                            continue;
                        }
                        let q = quantize_hdr(value, prec, signed);
                        let back = finish_unquantize(unquantize_hdr(q, prec, signed), signed);
                        assert!(
                            (back - value).abs() <= step + 1,
                            "prec {prec} signed {signed} value {value} -> {back}"
                        );
                    }
                }
            }
        }
    }

    #[cfg(feature = "bc6h")]
    #[test]
    fn signed_single_bit_endpoints_are_zero() {
        for value in [-F16_MAX, -1, 0, 1, F16_MAX] {
            let q = quantize_hdr(value, 1, true);
            assert_eq!(q, 0, "value {value}");
            assert_eq!(finish_unquantize(unquantize_hdr(q, 1, true), true), 0);
        }
    }

    #[cfg(feature = "bc6h")]
    #[test]
    fn full_precision_is_exact() {
        for value in (0..=F16_MAX).step_by(13) {
            let q = quantize_hdr(value, 16, false);
            assert_eq!(finish_unquantize(unquantize_hdr(q, 16, false), false), value);

            let q = quantize_hdr(-value, 16, true);
            assert_eq!(finish_unquantize(unquantize_hdr(q, 16, true), true), -value);
        }
    }

    #[cfg(feature = "bc6h")]
    #[test]
    fn sign_extension_widens_twos_complement() {
        assert_eq!(extend_sign(0b01111, 5), 15);
        assert_eq!(extend_sign(0b10000, 5), -16);
        assert_eq!(extend_sign(0b11111, 5), -1);
        assert_eq!(extend_sign(0x3FF, 10), -1);
        assert_eq!(extend_sign(0x1FF, 10), 511);
    }

    #[cfg(feature = "bc6h")]
    #[test]
    fn half_float_integer_view() {
        let one = half::f16::ONE.to_bits();
        assert_eq!(f16_to_int(one, false), one as i32);
        assert_eq!(f16_to_int(half::f16::NEG_ONE.to_bits(), true), -(one as i32));
        assert_eq!(f16_to_int(half::f16::NEG_ONE.to_bits(), false), 0);
        assert_eq!(f16_to_int(half::f16::INFINITY.to_bits(), false), F16_MAX);

        assert_eq!(int_to_f16(-(one as i32), true), half::f16::NEG_ONE.to_bits());
        assert_eq!(int_to_f16(one as i32, false), one);
    }
}
