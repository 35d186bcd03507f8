//! Static format tables shared by the encoder and the decoder.
//!
//! Partition and anchor tables are a compatibility surface of the formats and match the
//! published BC6H / BC7 tables entry for entry.

/// Interpolation weights for 2, 3 and 4 bit indices, in 1/64th.
pub(crate) static WEIGHTS2: [i32; 4] = [0, 21, 43, 64];
pub(crate) static WEIGHTS3: [i32; 8] = [0, 9, 18, 27, 37, 46, 55, 64];
pub(crate) static WEIGHTS4: [i32; 16] =
    [0, 4, 9, 13, 17, 21, 26, 30, 34, 38, 43, 47, 51, 55, 60, 64];

pub(crate) const WEIGHT_MAX: i32 = 64;
pub(crate) const WEIGHT_SHIFT: u32 = 6;
pub(crate) const WEIGHT_ROUND: i32 = 32;

pub(crate) const BLOCK_PIXELS: usize = 16;

#[inline]
pub(crate) fn weights(index_bits: u8) -> &'static [i32] {
    match index_bits {
        2 => &WEIGHTS2,
        3 => &WEIGHTS3,
        4 => &WEIGHTS4,
        _ => unreachable!("no weight table for {index_bits} bit indices"),
    }
}

static PARTITIONS_1: [u8; 16] = [0; 16];

#[rustfmt::skip]
static PARTITIONS_2: [[u8; 16]; 64] = [
    [0, 0, 1, 1, 0, 0, 1, 1, 0, 0, 1, 1, 0, 0, 1, 1], // 0
    [0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1], // 1
    [0, 1, 1, 1, 0, 1, 1, 1, 0, 1, 1, 1, 0, 1, 1, 1], // 2
    [0, 0, 0, 1, 0, 0, 1, 1, 0, 0, 1, 1, 0, 1, 1, 1], // 3
    [0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 1, 1], // 4
    [0, 0, 1, 1, 0, 1, 1, 1, 0, 1, 1, 1, 1, 1, 1, 1], // 5
    [0, 0, 0, 1, 0, 0, 1, 1, 0, 1, 1, 1, 1, 1, 1, 1], // 6
    [0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 1, 1, 0, 1, 1, 1], // 7
    [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 1, 1], // 8
    [0, 0, 1, 1, 0, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1], // 9
    [0, 0, 0, 0, 0, 0, 0, 1, 0, 1, 1, 1, 1, 1, 1, 1], // 10
    [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 1, 1, 1], // 11
    [0, 0, 0, 1, 0, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1], // 12
    [0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1], // 13
    [0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1], // 14
    [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1], // 15
    [0, 0, 0, 0, 1, 0, 0, 0, 1, 1, 1, 0, 1, 1, 1, 1], // 16
    [0, 1, 1, 1, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0], // 17
    [0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 1, 1, 1, 0], // 18
    [0, 1, 1, 1, 0, 0, 1, 1, 0, 0, 0, 1, 0, 0, 0, 0], // 19
    [0, 0, 1, 1, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0], // 20
    [0, 0, 0, 0, 1, 0, 0, 0, 1, 1, 0, 0, 1, 1, 1, 0], // 21
    [0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 1, 1, 0, 0], // 22
    [0, 1, 1, 1, 0, 0, 1, 1, 0, 0, 1, 1, 0, 0, 0, 1], // 23
    [0, 0, 1, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 0], // 24
    [0, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 1, 0, 0], // 25
    [0, 1, 1, 0, 0, 1, 1, 0, 0, 1, 1, 0, 0, 1, 1, 0], // 26
    [0, 0, 1, 1, 0, 1, 1, 0, 0, 1, 1, 0, 1, 1, 0, 0], // 27
    [0, 0, 0, 1, 0, 1, 1, 1, 1, 1, 1, 0, 1, 0, 0, 0], // 28
    [0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0], // 29
    [0, 1, 1, 1, 0, 0, 0, 1, 1, 0, 0, 0, 1, 1, 1, 0], // 30
    [0, 0, 1, 1, 1, 0, 0, 1, 1, 0, 0, 1, 1, 1, 0, 0], // 31
    [0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1], // 32
    [0, 0, 0, 0, 1, 1, 1, 1, 0, 0, 0, 0, 1, 1, 1, 1], // 33
    [0, 1, 0, 1, 1, 0, 1, 0, 0, 1, 0, 1, 1, 0, 1, 0], // 34
    [0, 0, 1, 1, 0, 0, 1, 1, 1, 1, 0, 0, 1, 1, 0, 0], // 35
    [0, 0, 1, 1, 1, 1, 0, 0, 0, 0, 1, 1, 1, 1, 0, 0], // 36
    [0, 1, 0, 1, 0, 1, 0, 1, 1, 0, 1, 0, 1, 0, 1, 0], // 37
    [0, 1, 1, 0, 1, 0, 0, 1, 0, 1, 1, 0, 1, 0, 0, 1], // 38
    [0, 1, 0, 1, 1, 0, 1, 0, 1, 0, 1, 0, 0, 1, 0, 1], // 39
    [0, 1, 1, 1, 0, 0, 1, 1, 1, 1, 0, 0, 1, 1, 1, 0], // 40
    [0, 0, 0, 1, 0, 0, 1, 1, 1, 1, 0, 0, 1, 0, 0, 0], // 41
    [0, 0, 1, 1, 0, 0, 1, 0, 0, 1, 0, 0, 1, 1, 0, 0], // 42
    [0, 0, 1, 1, 1, 0, 1, 1, 1, 1, 0, 1, 1, 1, 0, 0], // 43
    [0, 1, 1, 0, 1, 0, 0, 1, 1, 0, 0, 1, 0, 1, 1, 0], // 44
    [0, 0, 1, 1, 1, 1, 0, 0, 1, 1, 0, 0, 0, 0, 1, 1], // 45
    [0, 1, 1, 0, 0, 1, 1, 0, 1, 0, 0, 1, 1, 0, 0, 1], // 46
    [0, 0, 0, 0, 0, 1, 1, 0, 0, 1, 1, 0, 0, 0, 0, 0], // 47
    [0, 1, 0, 0, 1, 1, 1, 0, 0, 1, 0, 0, 0, 0, 0, 0], // 48
    [0, 0, 1, 0, 0, 1, 1, 1, 0, 0, 1, 0, 0, 0, 0, 0], // 49
    [0, 0, 0, 0, 0, 0, 1, 0, 0, 1, 1, 1, 0, 0, 1, 0], // 50
    [0, 0, 0, 0, 0, 1, 0, 0, 1, 1, 1, 0, 0, 1, 0, 0], // 51
    [0, 1, 1, 0, 1, 1, 0, 0, 1, 0, 0, 1, 0, 0, 1, 1], // 52
    [0, 0, 1, 1, 0, 1, 1, 0, 1, 1, 0, 0, 1, 0, 0, 1], // 53
    [0, 1, 1, 0, 0, 0, 1, 1, 1, 0, 0, 1, 1, 1, 0, 0], // 54
    [0, 0, 1, 1, 1, 0, 0, 1, 1, 1, 0, 0, 0, 1, 1, 0], // 55
    [0, 1, 1, 0, 1, 1, 0, 0, 1, 1, 0, 0, 1, 0, 0, 1], // 56
    [0, 1, 1, 0, 0, 0, 1, 1, 0, 0, 1, 1, 1, 0, 0, 1], // 57
    [0, 1, 1, 1, 1, 1, 1, 0, 1, 0, 0, 0, 0, 0, 0, 1], // 58
    [0, 0, 0, 1, 1, 0, 0, 0, 1, 1, 1, 0, 0, 1, 1, 1], // 59
    [0, 0, 0, 0, 1, 1, 1, 1, 0, 0, 1, 1, 0, 0, 1, 1], // 60
    [0, 0, 1, 1, 0, 0, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0], // 61
    [0, 0, 1, 0, 0, 0, 1, 0, 1, 1, 1, 0, 1, 1, 1, 0], // 62
    [0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 1, 1, 0, 1, 1, 1], // 63
];

#[rustfmt::skip]
static PARTITIONS_3: [[u8; 16]; 64] = [
    [0, 0, 1, 1, 0, 0, 1, 1, 0, 2, 2, 1, 2, 2, 2, 2], // 0
    [0, 0, 0, 1, 0, 0, 1, 1, 2, 2, 1, 1, 2, 2, 2, 1], // 1
    [0, 0, 0, 0, 2, 0, 0, 1, 2, 2, 1, 1, 2, 2, 1, 1], // 2
    [0, 2, 2, 2, 0, 0, 2, 2, 0, 0, 1, 1, 0, 1, 1, 1], // 3
    [0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 2, 2, 1, 1, 2, 2], // 4
    [0, 0, 1, 1, 0, 0, 1, 1, 0, 0, 2, 2, 0, 0, 2, 2], // 5
    [0, 0, 2, 2, 0, 0, 2, 2, 1, 1, 1, 1, 1, 1, 1, 1], // 6
    [0, 0, 1, 1, 0, 0, 1, 1, 2, 2, 1, 1, 2, 2, 1, 1], // 7
    [0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2], // 8
    [0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1, 2, 2, 2, 2], // 9
    [0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 2, 2, 2, 2], // 10
    [0, 0, 1, 2, 0, 0, 1, 2, 0, 0, 1, 2, 0, 0, 1, 2], // 11
    [0, 1, 1, 2, 0, 1, 1, 2, 0, 1, 1, 2, 0, 1, 1, 2], // 12
    [0, 1, 2, 2, 0, 1, 2, 2, 0, 1, 2, 2, 0, 1, 2, 2], // 13
    [0, 0, 1, 1, 0, 1, 1, 2, 1, 1, 2, 2, 1, 2, 2, 2], // 14
    [0, 0, 1, 1, 2, 0, 0, 1, 2, 2, 0, 0, 2, 2, 2, 0], // 15
    [0, 0, 0, 1, 0, 0, 1, 1, 0, 1, 1, 2, 1, 1, 2, 2], // 16
    [0, 1, 1, 1, 0, 0, 1, 1, 2, 0, 0, 1, 2, 2, 0, 0], // 17
    [0, 0, 0, 0, 1, 1, 2, 2, 1, 1, 2, 2, 1, 1, 2, 2], // 18
    [0, 0, 2, 2, 0, 0, 2, 2, 0, 0, 2, 2, 1, 1, 1, 1], // 19
    [0, 1, 1, 1, 0, 1, 1, 1, 0, 2, 2, 2, 0, 2, 2, 2], // 20
    [0, 0, 0, 1, 0, 0, 0, 1, 2, 2, 2, 1, 2, 2, 2, 1], // 21
    [0, 0, 0, 0, 0, 0, 1, 1, 0, 1, 2, 2, 0, 1, 2, 2], // 22
    [0, 0, 0, 0, 1, 1, 0, 0, 2, 2, 1, 0, 2, 2, 1, 0], // 23
    [0, 1, 2, 2, 0, 1, 2, 2, 0, 0, 1, 1, 0, 0, 0, 0], // 24
    [0, 0, 1, 2, 0, 0, 1, 2, 1, 1, 2, 2, 2, 2, 2, 2], // 25
    [0, 1, 1, 0, 1, 2, 2, 1, 1, 2, 2, 1, 0, 1, 1, 0], // 26
    [0, 0, 0, 0, 0, 1, 1, 0, 1, 2, 2, 1, 1, 2, 2, 1], // 27
    [0, 0, 2, 2, 1, 1, 0, 2, 1, 1, 0, 2, 0, 0, 2, 2], // 28
    [0, 1, 1, 0, 0, 1, 1, 0, 2, 0, 0, 2, 2, 2, 2, 2], // 29
    [0, 0, 1, 1, 0, 1, 2, 2, 0, 1, 2, 2, 0, 0, 1, 1], // 30
    [0, 0, 0, 0, 2, 0, 0, 0, 2, 2, 1, 1, 2, 2, 2, 1], // 31
    [0, 0, 0, 0, 0, 0, 0, 2, 1, 1, 2, 2, 1, 2, 2, 2], // 32
    [0, 2, 2, 2, 0, 0, 2, 2, 0, 0, 1, 2, 0, 0, 1, 1], // 33
    [0, 0, 1, 1, 0, 0, 1, 2, 0, 0, 2, 2, 0, 2, 2, 2], // 34
    [0, 1, 2, 0, 0, 1, 2, 0, 0, 1, 2, 0, 0, 1, 2, 0], // 35
    [0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 0, 0, 0, 0], // 36
    [0, 1, 2, 0, 1, 2, 0, 1, 2, 0, 1, 2, 0, 1, 2, 0], // 37
    [0, 1, 2, 0, 2, 0, 1, 2, 1, 2, 0, 1, 0, 1, 2, 0], // 38
    [0, 0, 1, 1, 2, 2, 0, 0, 1, 1, 2, 2, 0, 0, 1, 1], // 39
    [0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 0, 0, 0, 0, 1, 1], // 40
    [0, 1, 0, 1, 0, 1, 0, 1, 2, 2, 2, 2, 2, 2, 2, 2], // 41
    [0, 0, 0, 0, 0, 0, 0, 0, 2, 1, 2, 1, 2, 1, 2, 1], // 42
    [0, 0, 2, 2, 1, 1, 2, 2, 0, 0, 2, 2, 1, 1, 2, 2], // 43
    [0, 0, 2, 2, 0, 0, 1, 1, 0, 0, 2, 2, 0, 0, 1, 1], // 44
    [0, 2, 2, 0, 1, 2, 2, 1, 0, 2, 2, 0, 1, 2, 2, 1], // 45
    [0, 1, 0, 1, 2, 2, 2, 2, 2, 2, 2, 2, 0, 1, 0, 1], // 46
    [0, 0, 0, 0, 2, 1, 2, 1, 2, 1, 2, 1, 2, 1, 2, 1], // 47
    [0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 2, 2, 2, 2], // 48
    [0, 2, 2, 2, 0, 1, 1, 1, 0, 2, 2, 2, 0, 1, 1, 1], // 49
    [0, 0, 0, 2, 1, 1, 1, 2, 0, 0, 0, 2, 1, 1, 1, 2], // 50
    [0, 0, 0, 0, 2, 1, 1, 2, 2, 1, 1, 2, 2, 1, 1, 2], // 51
    [0, 2, 2, 2, 0, 1, 1, 1, 0, 1, 1, 1, 0, 2, 2, 2], // 52
    [0, 0, 0, 2, 1, 1, 1, 2, 1, 1, 1, 2, 0, 0, 0, 2], // 53
    [0, 1, 1, 0, 0, 1, 1, 0, 0, 1, 1, 0, 2, 2, 2, 2], // 54
    [0, 0, 0, 0, 0, 0, 0, 0, 2, 1, 1, 2, 2, 1, 1, 2], // 55
    [0, 1, 1, 0, 0, 1, 1, 0, 2, 2, 2, 2, 2, 2, 2, 2], // 56
    [0, 0, 2, 2, 0, 0, 1, 1, 0, 0, 1, 1, 0, 0, 2, 2], // 57
    [0, 0, 2, 2, 1, 1, 2, 2, 1, 1, 2, 2, 0, 0, 2, 2], // 58
    [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2, 1, 1, 2], // 59
    [0, 0, 0, 2, 0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0, 1], // 60
    [0, 2, 2, 2, 1, 2, 2, 2, 0, 2, 2, 2, 1, 2, 2, 2], // 61
    [0, 1, 0, 1, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2], // 62
    [0, 1, 1, 1, 2, 0, 1, 1, 2, 2, 0, 1, 2, 2, 2, 0], // 63
];

// Pixel holding the implicit high index bit of the second region of each 2-region shape.
#[rustfmt::skip]
static ANCHORS_2: [u8; 64] = [
    15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15, 15,
    15, 2, 8, 2, 2, 8, 8, 15, 2, 8, 2, 2, 8, 8, 2, 2,
    15, 15, 6, 8, 2, 8, 15, 15, 2, 8, 2, 2, 2, 15, 15, 6,
    6, 2, 6, 8, 15, 15, 2, 2, 15, 15, 15, 15, 15, 2, 2, 15,
];

// Same for the second and third region of each 3-region shape.
#[rustfmt::skip]
static ANCHORS_3: [[u8; 2]; 64] = [
    [3, 15], [3, 8], [15, 8], [15, 3], [8, 15], [3, 15], [15, 3], [15, 8],
    [8, 15], [8, 15], [6, 15], [6, 15], [6, 15], [5, 15], [3, 15], [3, 8],
    [3, 15], [3, 8], [8, 15], [15, 3], [3, 15], [3, 8], [6, 15], [10, 8],
    [5, 3], [8, 15], [8, 6], [6, 10], [8, 15], [5, 15], [15, 10], [15, 8],
    [8, 15], [15, 3], [3, 15], [5, 10], [6, 10], [10, 8], [8, 9], [15, 10],
    [15, 6], [3, 15], [15, 8], [5, 15], [15, 3], [15, 6], [15, 6], [15, 8],
    [3, 15], [15, 3], [5, 15], [5, 15], [5, 15], [8, 15], [5, 15], [10, 15],
    [5, 15], [10, 15], [8, 15], [13, 15], [15, 3], [12, 15], [3, 15], [3, 8],
];

/// Region of every pixel for the given region count (1 to 3) and shape.
#[inline]
pub(crate) fn partition(regions: usize, shape: usize) -> &'static [u8; 16] {
    match regions {
        1 => &PARTITIONS_1,
        2 => &PARTITIONS_2[shape],
        3 => &PARTITIONS_3[shape],
        _ => unreachable!("{regions} regions"),
    }
}

/// Pixel whose index has its high bit dropped for `region` of the given shape.
#[inline]
pub(crate) fn anchor(regions: usize, shape: usize, region: usize) -> usize {
    match (regions, region) {
        (_, 0) => 0,
        (2, 1) => ANCHORS_2[shape] as usize,
        (3, 1 | 2) => ANCHORS_3[shape][region - 1] as usize,
        _ => unreachable!("region {region} of {regions}"),
    }
}

/// Returns `true` if `pixel` is the anchor of any region of the given shape.
#[inline]
pub(crate) fn is_anchor(regions: usize, shape: usize, pixel: usize) -> bool {
    (0..regions).any(|region| anchor(regions, shape, region) == pixel)
}

/// Header field of a BC6H block.
///
/// `W`/`X` are the two endpoints of region 0 and `Y`/`Z` the endpoints of region 1.
#[cfg(feature = "bc6h")]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub(crate) enum Field {
    Mode,
    Shape,
    Rw,
    Rx,
    Ry,
    Rz,
    Gw,
    Gx,
    Gy,
    Gz,
    Bw,
    Bx,
    By,
    Bz,
}

/// Which bit of which field is stored at a given header position.
#[cfg(feature = "bc6h")]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct HeaderBit {
    pub(crate) field: Field,
    pub(crate) bit: u8,
}

#[cfg(feature = "bc6h")]
#[derive(Copy, Clone)]
struct Run {
    field: Field,
    first: u8,
    len: u8,
    descending: bool,
}

#[cfg(feature = "bc6h")]
const fn up(field: Field, first: u8, len: u8) -> Run {
    Run {
        field,
        first,
        len,
        descending: false,
    }
}

#[cfg(feature = "bc6h")]
const fn down(field: Field, first: u8, len: u8) -> Run {
    Run {
        field,
        first,
        len,
        descending: true,
    }
}

#[cfg(feature = "bc6h")]
const fn one(field: Field, bit: u8) -> Run {
    up(field, bit, 1)
}

/// Expands the runs into one entry per header bit.
#[cfg(feature = "bc6h")]
const fn expand<const N: usize>(runs: &[Run]) -> [HeaderBit; N] {
    let mut out = [HeaderBit {
        field: Field::Mode,
        bit: 0,
    }; N];
    let mut pos = 0;
    let mut r = 0;

    while r < runs.len() {
        let run = runs[r];
        let mut i = 0;
        while i < run.len {
            let bit = if run.descending {
                run.first - i
            } else {
                run.first + i
            };
            out[pos] = HeaderBit {
                field: run.field,
                bit,
            };
            pos += 1;
            i += 1;
        }
        r += 1;
    }

    assert!(pos == N, "header runs do not cover the header");
    out
}

#[cfg(feature = "bc6h")]
#[rustfmt::skip]
mod bc6h_layouts {
    use super::{down, expand, one, up, Field::*, HeaderBit};

    pub(super) static MODE_0: [HeaderBit; 82] = expand(&[
        up(Mode, 0, 2), one(Gy, 4), one(By, 4), one(Bz, 4), up(Rw, 0, 10), up(Gw, 0, 10),
        up(Bw, 0, 10), up(Rx, 0, 5), one(Gz, 4), up(Gy, 0, 4), up(Gx, 0, 5), one(Bz, 0),
        up(Gz, 0, 4), up(Bx, 0, 5), one(Bz, 1), up(By, 0, 4), up(Ry, 0, 5), one(Bz, 2),
        up(Rz, 0, 5), one(Bz, 3), up(Shape, 0, 5),
    ]);

    pub(super) static MODE_1: [HeaderBit; 82] = expand(&[
        up(Mode, 0, 2), one(Gy, 5), one(Gz, 4), one(Gz, 5), up(Rw, 0, 7), one(Bz, 0),
        one(Bz, 1), one(By, 4), up(Gw, 0, 7), one(By, 5), one(Bz, 2), one(Gy, 4),
        up(Bw, 0, 7), one(Bz, 3), one(Bz, 5), one(Bz, 4), up(Rx, 0, 6), up(Gy, 0, 4),
        up(Gx, 0, 6), up(Gz, 0, 4), up(Bx, 0, 6), up(By, 0, 4), up(Ry, 0, 6), up(Rz, 0, 6),
        up(Shape, 0, 5),
    ]);

    pub(super) static MODE_2: [HeaderBit; 82] = expand(&[
        up(Mode, 0, 5), up(Rw, 0, 10), up(Gw, 0, 10), up(Bw, 0, 10), up(Rx, 0, 5),
        one(Rw, 10), up(Gy, 0, 4), up(Gx, 0, 4), one(Gw, 10), one(Bz, 0), up(Gz, 0, 4),
        up(Bx, 0, 4), one(Bw, 10), one(Bz, 1), up(By, 0, 4), up(Ry, 0, 5), one(Bz, 2),
        up(Rz, 0, 5), one(Bz, 3), up(Shape, 0, 5),
    ]);

    pub(super) static MODE_3: [HeaderBit; 82] = expand(&[
        up(Mode, 0, 5), up(Rw, 0, 10), up(Gw, 0, 10), up(Bw, 0, 10), up(Rx, 0, 4),
        one(Rw, 10), one(Gz, 4), up(Gy, 0, 4), up(Gx, 0, 5), one(Gw, 10), up(Gz, 0, 4),
        up(Bx, 0, 4), one(Bw, 10), one(Bz, 1), up(By, 0, 4), up(Ry, 0, 4), one(Bz, 0),
        one(Bz, 2), up(Rz, 0, 4), one(Gy, 4), one(Bz, 3), up(Shape, 0, 5),
    ]);

    pub(super) static MODE_4: [HeaderBit; 82] = expand(&[
        up(Mode, 0, 5), up(Rw, 0, 10), up(Gw, 0, 10), up(Bw, 0, 10), up(Rx, 0, 4),
        one(Rw, 10), one(By, 4), up(Gy, 0, 4), up(Gx, 0, 4), one(Gw, 10), one(Bz, 0),
        up(Gz, 0, 4), up(Bx, 0, 5), one(Bw, 10), up(By, 0, 4), up(Ry, 0, 4), one(Bz, 1),
        one(Bz, 2), up(Rz, 0, 4), one(Bz, 4), one(Bz, 3), up(Shape, 0, 5),
    ]);

    pub(super) static MODE_5: [HeaderBit; 82] = expand(&[
        up(Mode, 0, 5), up(Rw, 0, 9), one(By, 4), up(Gw, 0, 9), one(Gy, 4), up(Bw, 0, 9),
        one(Bz, 4), up(Rx, 0, 5), one(Gz, 4), up(Gy, 0, 4), up(Gx, 0, 5), one(Bz, 0),
        up(Gz, 0, 4), up(Bx, 0, 5), one(Bz, 1), up(By, 0, 4), up(Ry, 0, 5), one(Bz, 2),
        up(Rz, 0, 5), one(Bz, 3), up(Shape, 0, 5),
    ]);

    pub(super) static MODE_6: [HeaderBit; 82] = expand(&[
        up(Mode, 0, 5), up(Rw, 0, 8), one(Gz, 4), one(By, 4), up(Gw, 0, 8), one(Bz, 2),
        one(Gy, 4), up(Bw, 0, 8), one(Bz, 3), one(Bz, 4), up(Rx, 0, 6), up(Gy, 0, 4),
        up(Gx, 0, 5), one(Bz, 0), up(Gz, 0, 4), up(Bx, 0, 5), one(Bz, 1), up(By, 0, 4),
        up(Ry, 0, 6), up(Rz, 0, 6), up(Shape, 0, 5),
    ]);

    pub(super) static MODE_7: [HeaderBit; 82] = expand(&[
        up(Mode, 0, 5), up(Rw, 0, 8), one(Bz, 0), one(By, 4), up(Gw, 0, 8), one(Gy, 5),
        one(Gy, 4), up(Bw, 0, 8), one(Gz, 5), one(Bz, 4), up(Rx, 0, 5), one(Gz, 4),
        up(Gy, 0, 4), up(Gx, 0, 6), up(Gz, 0, 4), up(Bx, 0, 5), one(Bz, 1), up(By, 0, 4),
        up(Ry, 0, 5), one(Bz, 2), up(Rz, 0, 5), one(Bz, 3), up(Shape, 0, 5),
    ]);

    pub(super) static MODE_8: [HeaderBit; 82] = expand(&[
        up(Mode, 0, 5), up(Rw, 0, 8), one(Bz, 1), one(By, 4), up(Gw, 0, 8), one(By, 5),
        one(Gy, 4), up(Bw, 0, 8), one(Bz, 5), one(Bz, 4), up(Rx, 0, 5), one(Gz, 4),
        up(Gy, 0, 4), up(Gx, 0, 5), one(Bz, 0), up(Gz, 0, 4), up(Bx, 0, 6), up(By, 0, 4),
        up(Ry, 0, 5), one(Bz, 2), up(Rz, 0, 5), one(Bz, 3), up(Shape, 0, 5),
    ]);

    pub(super) static MODE_9: [HeaderBit; 82] = expand(&[
        up(Mode, 0, 5), up(Rw, 0, 6), one(Gz, 4), one(Bz, 0), one(Bz, 1), one(By, 4),
        up(Gw, 0, 6), one(Gy, 5), one(By, 5), one(Bz, 2), one(Gy, 4), up(Bw, 0, 6),
        one(Gz, 5), one(Bz, 3), one(Bz, 5), one(Bz, 4), up(Rx, 0, 6), up(Gy, 0, 4),
        up(Gx, 0, 6), up(Gz, 0, 4), up(Bx, 0, 6), up(By, 0, 4), up(Ry, 0, 6), up(Rz, 0, 6),
        up(Shape, 0, 5),
    ]);

    pub(super) static MODE_10: [HeaderBit; 65] = expand(&[
        up(Mode, 0, 5), up(Rw, 0, 10), up(Gw, 0, 10), up(Bw, 0, 10), up(Rx, 0, 10),
        up(Gx, 0, 10), up(Bx, 0, 10),
    ]);

    pub(super) static MODE_11: [HeaderBit; 65] = expand(&[
        up(Mode, 0, 5), up(Rw, 0, 10), up(Gw, 0, 10), up(Bw, 0, 10), up(Rx, 0, 9),
        one(Rw, 10), up(Gx, 0, 9), one(Gw, 10), up(Bx, 0, 9), one(Bw, 10),
    ]);

    pub(super) static MODE_12: [HeaderBit; 65] = expand(&[
        up(Mode, 0, 5), up(Rw, 0, 10), up(Gw, 0, 10), up(Bw, 0, 10), up(Rx, 0, 8),
        down(Rw, 11, 2), up(Gx, 0, 8), down(Gw, 11, 2), up(Bx, 0, 8), down(Bw, 11, 2),
    ]);

    pub(super) static MODE_13: [HeaderBit; 65] = expand(&[
        up(Mode, 0, 5), up(Rw, 0, 10), up(Gw, 0, 10), up(Bw, 0, 10), up(Rx, 0, 4),
        down(Rw, 15, 6), up(Gx, 0, 4), down(Gw, 15, 6), up(Bx, 0, 4), down(Bw, 15, 6),
    ]);
}

/// Immutable description of one BC6H mode.
#[cfg(feature = "bc6h")]
#[derive(Debug)]
pub(crate) struct Bc6hMode {
    /// Value of the mode selector, either 2 or 5 bits wide.
    pub(crate) selector: u8,
    pub(crate) regions: usize,
    /// Whether `X`, `Y` and `Z` are stored as deltas against `W`.
    pub(crate) transformed: bool,
    pub(crate) index_bits: u8,
    /// Precision of the `W` endpoint, which is also the precision every endpoint
    /// is quantized to.
    pub(crate) endpoint_bits: u8,
    /// Per channel precision of the `X`, `Y` and `Z` fields.
    pub(crate) delta_bits: [u8; 3],
    pub(crate) header: &'static [HeaderBit],
}

#[cfg(feature = "bc6h")]
impl Bc6hMode {
    pub(crate) fn shapes(&self) -> usize {
        if self.regions == 2 {
            32
        } else {
            1
        }
    }

    pub(crate) fn index_bits_total(&self) -> usize {
        BLOCK_PIXELS * self.index_bits as usize - self.regions
    }
}

#[cfg(feature = "bc6h")]
macro_rules! bc6h_mode {
    ($selector:expr, $regions:expr, $transformed:expr, $index:expr, $w:expr, [$r:expr, $g:expr, $b:expr], $header:expr) => {
        Bc6hMode {
            selector: $selector,
            regions: $regions,
            transformed: $transformed,
            index_bits: $index,
            endpoint_bits: $w,
            delta_bits: [$r, $g, $b],
            header: &$header,
        }
    };
}

/// The 14 BC6H modes in the order of the format documentation.
#[cfg(feature = "bc6h")]
pub(crate) static BC6H_MODES: [Bc6hMode; 14] = [
    bc6h_mode!(0x00, 2, true, 3, 10, [5, 5, 5], bc6h_layouts::MODE_0),
    bc6h_mode!(0x01, 2, true, 3, 7, [6, 6, 6], bc6h_layouts::MODE_1),
    bc6h_mode!(0x02, 2, true, 3, 11, [5, 4, 4], bc6h_layouts::MODE_2),
    bc6h_mode!(0x06, 2, true, 3, 11, [4, 5, 4], bc6h_layouts::MODE_3),
    bc6h_mode!(0x0A, 2, true, 3, 11, [4, 4, 5], bc6h_layouts::MODE_4),
    bc6h_mode!(0x0E, 2, true, 3, 9, [5, 5, 5], bc6h_layouts::MODE_5),
    bc6h_mode!(0x12, 2, true, 3, 8, [6, 5, 5], bc6h_layouts::MODE_6),
    bc6h_mode!(0x16, 2, true, 3, 8, [5, 6, 5], bc6h_layouts::MODE_7),
    bc6h_mode!(0x1A, 2, true, 3, 8, [5, 5, 6], bc6h_layouts::MODE_8),
    bc6h_mode!(0x1E, 2, false, 3, 6, [6, 6, 6], bc6h_layouts::MODE_9),
    bc6h_mode!(0x03, 1, false, 4, 10, [10, 10, 10], bc6h_layouts::MODE_10),
    bc6h_mode!(0x07, 1, true, 4, 11, [9, 9, 9], bc6h_layouts::MODE_11),
    bc6h_mode!(0x0B, 1, true, 4, 12, [8, 8, 8], bc6h_layouts::MODE_12),
    bc6h_mode!(0x0F, 1, true, 4, 16, [4, 4, 4], bc6h_layouts::MODE_13),
];

/// Maps a mode selector to its mode. Selectors 0 and 1 are 2 bits wide, all others 5.
#[cfg(feature = "bc6h")]
pub(crate) fn bc6h_mode_from_selector(selector: u8) -> Option<usize> {
    BC6H_MODES.iter().position(|mode| mode.selector == selector)
}

/// How a BC7 mode stores the lowest endpoint bits.
#[cfg(feature = "bc7")]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum PBits {
    None,
    /// One bit per region, shared by both endpoints.
    Shared,
    /// One bit per endpoint.
    Unique,
}

/// Immutable description of one BC7 mode.
#[cfg(feature = "bc7")]
#[derive(Debug)]
pub(crate) struct Bc7Mode {
    pub(crate) regions: usize,
    pub(crate) shape_bits: u8,
    pub(crate) pbits: PBits,
    pub(crate) rotation_bits: u8,
    pub(crate) index_mode_bits: u8,
    pub(crate) index_bits: u8,
    /// Width of the second index set, 0 if the mode has a single one.
    pub(crate) alpha_index_bits: u8,
    /// Stored color precision, without p-bit.
    pub(crate) color_bits: u8,
    /// Stored alpha precision, without p-bit. 0 for opaque modes.
    pub(crate) alpha_bits: u8,
}

#[cfg(feature = "bc7")]
impl Bc7Mode {
    pub(crate) fn shapes(&self) -> usize {
        1 << self.shape_bits
    }

    pub(crate) fn endpoint_bits(&self, channel: usize) -> u8 {
        if channel < 3 {
            self.color_bits
        } else {
            self.alpha_bits
        }
    }

    pub(crate) fn pbit_count(&self) -> usize {
        match self.pbits {
            PBits::None => 0,
            PBits::Shared => self.regions,
            PBits::Unique => self.regions * 2,
        }
    }

    /// Number of header bits before the first index.
    pub(crate) fn header_bits(&self, mode: usize) -> usize {
        let channels = if self.alpha_bits > 0 { 4 } else { 3 };
        let endpoint_bits = self.regions * 2 * (3 * self.color_bits as usize)
            + self.regions * 2 * (channels - 3) * self.alpha_bits as usize;
        mode + 1
            + self.shape_bits as usize
            + self.rotation_bits as usize
            + self.index_mode_bits as usize
            + endpoint_bits
            + self.pbit_count()
    }

    pub(crate) fn index_bits_total(&self) -> usize {
        let primary = BLOCK_PIXELS * self.index_bits as usize - self.regions;
        let secondary = if self.alpha_index_bits > 0 {
            BLOCK_PIXELS * self.alpha_index_bits as usize - 1
        } else {
            0
        };
        primary + secondary
    }
}

/// The 8 BC7 modes.
#[cfg(feature = "bc7")]
#[rustfmt::skip]
pub(crate) static BC7_MODES: [Bc7Mode; 8] = [
    Bc7Mode { regions: 3, shape_bits: 4, pbits: PBits::Unique, rotation_bits: 0, index_mode_bits: 0, index_bits: 3, alpha_index_bits: 0, color_bits: 4, alpha_bits: 0 },
    Bc7Mode { regions: 2, shape_bits: 6, pbits: PBits::Shared, rotation_bits: 0, index_mode_bits: 0, index_bits: 3, alpha_index_bits: 0, color_bits: 6, alpha_bits: 0 },
    Bc7Mode { regions: 3, shape_bits: 6, pbits: PBits::None, rotation_bits: 0, index_mode_bits: 0, index_bits: 2, alpha_index_bits: 0, color_bits: 5, alpha_bits: 0 },
    Bc7Mode { regions: 2, shape_bits: 6, pbits: PBits::Unique, rotation_bits: 0, index_mode_bits: 0, index_bits: 2, alpha_index_bits: 0, color_bits: 7, alpha_bits: 0 },
    Bc7Mode { regions: 1, shape_bits: 0, pbits: PBits::None, rotation_bits: 2, index_mode_bits: 1, index_bits: 2, alpha_index_bits: 3, color_bits: 5, alpha_bits: 6 },
    Bc7Mode { regions: 1, shape_bits: 0, pbits: PBits::None, rotation_bits: 2, index_mode_bits: 0, index_bits: 2, alpha_index_bits: 2, color_bits: 7, alpha_bits: 8 },
    Bc7Mode { regions: 1, shape_bits: 0, pbits: PBits::Unique, rotation_bits: 0, index_mode_bits: 0, index_bits: 4, alpha_index_bits: 0, color_bits: 7, alpha_bits: 7 },
    Bc7Mode { regions: 2, shape_bits: 6, pbits: PBits::Unique, rotation_bits: 0, index_mode_bits: 0, index_bits: 2, alpha_index_bits: 0, color_bits: 5, alpha_bits: 5 },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_span_full_range() {
        for bits in [2, 3, 4] {
            let w = weights(bits);
            assert_eq!(w.len(), 1 << bits);
            assert_eq!(w[0], 0);
            assert_eq!(w[w.len() - 1], WEIGHT_MAX);
            assert!(w.windows(2).all(|p| p[0] < p[1]));
        }
    }

    #[test]
    fn pixel_zero_is_always_region_zero() {
        for regions in 1..=3 {
            for shape in 0..64 {
                assert_eq!(partition(regions, shape)[0], 0);
                assert_eq!(anchor(regions, shape, 0), 0);
            }
        }
    }

    #[test]
    fn anchors_belong_to_their_region() {
        for regions in 2..=3 {
            for shape in 0..64 {
                let p = partition(regions, shape);
                for region in 0..regions {
                    let a = anchor(regions, shape, region);
                    assert_eq!(p[a] as usize, region, "shape {shape} region {region}");
                    assert!(is_anchor(regions, shape, a));
                }
                let anchors = (0..16).filter(|&px| is_anchor(regions, shape, px)).count();
                assert_eq!(anchors, regions);
            }
        }
    }

    #[test]
    fn every_region_is_used() {
        for regions in 2..=3 {
            for shape in 0..64 {
                let p = partition(regions, shape);
                for region in 0..regions as u8 {
                    assert!(p.contains(&region), "shape {shape} misses region {region}");
                }
            }
        }
    }

    #[cfg(feature = "bc6h")]
    #[test]
    fn bc6h_headers_cover_each_field_bit_once() {
        for (index, mode) in BC6H_MODES.iter().enumerate() {
            let selector_bits = if mode.selector < 2 { 2 } else { 5 };
            let mut expected = vec![(Field::Mode, selector_bits)];
            let deltas = [
                (Field::Rw, Field::Rx, Field::Ry, Field::Rz),
                (Field::Gw, Field::Gx, Field::Gy, Field::Gz),
                (Field::Bw, Field::Bx, Field::By, Field::Bz),
            ];
            for (channel, (w, x, y, z)) in deltas.into_iter().enumerate() {
                let delta = mode.delta_bits[channel];
                expected.push((w, mode.endpoint_bits));
                expected.push((x, delta));
                if mode.regions == 2 {
                    expected.push((y, delta));
                    expected.push((z, delta));
                }
            }
            if mode.regions == 2 {
                expected.push((Field::Shape, 5));
            }

            for (field, width) in expected.iter().copied() {
                let mut bits: Vec<u8> = mode
                    .header
                    .iter()
                    .filter(|h| h.field == field)
                    .map(|h| h.bit)
                    .collect();
                bits.sort_unstable();
                assert_eq!(bits, (0..width).collect::<Vec<_>>(), "mode {index} field {field:?}");
            }

            let declared: usize = expected.iter().map(|&(_, w)| w as usize).sum();
            assert_eq!(declared, mode.header.len(), "mode {index}");
            assert_eq!(mode.header.len() + mode.index_bits_total(), 128, "mode {index}");
        }
    }

    #[cfg(feature = "bc6h")]
    #[test]
    fn bc6h_selectors_are_unique() {
        for selector in 0..32u8 {
            let hits = BC6H_MODES.iter().filter(|m| m.selector == selector).count();
            assert!(hits <= 1);
        }
        for reserved in [0x13, 0x17, 0x1B, 0x1F] {
            assert_eq!(bc6h_mode_from_selector(reserved), None);
        }
        assert_eq!(bc6h_mode_from_selector(0x0F), Some(13));
    }

    #[cfg(feature = "bc7")]
    #[test]
    fn bc7_modes_fill_the_block() {
        for (index, mode) in BC7_MODES.iter().enumerate() {
            assert_eq!(
                mode.header_bits(index) + mode.index_bits_total(),
                128,
                "mode {index}"
            );
        }
    }
}
