//! Packed 64-bit point keys.
//!
//! A point's screen position, quantized depth, and style index are packed
//! into one `u64` so that a plain numeric sort is also a depth sort, nearest
//! first. Layout, from the most significant end:
//!
//! ```text
//! [ depth: 32 bits | x: 12 bits | y: 12 bits | style: 8 bits ]
//! ```
//!
//! The quantized depth occupies the high word, so keys order by depth to the
//! precision of the quantization. The low word is only a deterministic
//! tie-break (x, then y, then style) and carries the exact field values back
//! out through [`decode_x`]/[`decode_y`]/[`decode_style`].

use crate::foundation::geom::DepthRange;

/// Bits available per screen coordinate.
pub const COORD_BITS: u32 = 12;

/// Exclusive upper bound on packable screen coordinates.
pub const COORD_LIMIT: i32 = 1 << COORD_BITS;

/// Exclusive upper bound on packable style indices.
pub const STYLE_LIMIT: usize = 1 << 8;

const X_SHIFT: u32 = 20;
const Y_SHIFT: u32 = 8;
const FIELD_MASK_12: u64 = 0xfff;
const FIELD_MASK_8: u64 = 0xff;

/// Maps depths in a [`DepthRange`] onto `[0, i32::MAX]` monotonically.
///
/// One scale is shared by every key produced for a rendering pass, so the
/// quantization is identical across backends.
#[derive(Clone, Copy, Debug)]
pub struct DepthScale {
    zmin: f64,
    scale: f64,
}

impl DepthScale {
    pub fn new(range: DepthRange) -> Self {
        Self {
            zmin: range.zmin,
            scale: f64::from(i32::MAX) / range.span(),
        }
    }

    /// Quantize a depth inside the declared range.
    pub fn quantize(self, z: f64) -> u32 {
        let q = (z - self.zmin) * self.scale;
        // Half a step of slack: z == zmax lands on i32::MAX only up to
        // floating rounding.
        debug_assert!(
            q >= -0.5 && q <= f64::from(i32::MAX) + 0.5,
            "depth {z} out of range"
        );
        q.clamp(0.0, f64::from(i32::MAX)) as u32
    }

    /// Reconstruct a depth from its quantized form, accurate to one step.
    pub fn dequantize(self, q: u32) -> f64 {
        f64::from(q) / self.scale + self.zmin
    }

    /// Size of one quantization step in depth units.
    pub fn step(self) -> f64 {
        1.0 / self.scale
    }
}

/// Return `true` when `(x, y, z)` fits the packable field ranges.
///
/// Points failing this check are silently dropped at submission; callers
/// needing guaranteed inclusion must range-check before submitting.
pub fn admissible(x: i32, y: i32, z: f64, range: DepthRange) -> bool {
    (0..COORD_LIMIT).contains(&x) && (0..COORD_LIMIT).contains(&y) && range.contains(z)
}

/// Pack screen position, quantized depth, and style index into one key.
pub fn encode(x: i32, y: i32, zq: u32, istyle: usize) -> u64 {
    debug_assert!((0..COORD_LIMIT).contains(&x), "x {x} exceeds 12 bits");
    debug_assert!((0..COORD_LIMIT).contains(&y), "y {y} exceeds 12 bits");
    debug_assert!(istyle < STYLE_LIMIT, "style index {istyle} exceeds 8 bits");
    debug_assert!(zq <= i32::MAX as u32, "quantized depth {zq} exceeds 31 bits");
    (u64::from(zq) << 32)
        | ((x as u64) << X_SHIFT)
        | ((y as u64) << Y_SHIFT)
        | (istyle as u64 & FIELD_MASK_8)
}

pub fn decode_x(key: u64) -> i32 {
    ((key >> X_SHIFT) & FIELD_MASK_12) as i32
}

pub fn decode_y(key: u64) -> i32 {
    ((key >> Y_SHIFT) & FIELD_MASK_12) as i32
}

pub fn decode_style(key: u64) -> usize {
    (key & FIELD_MASK_8) as usize
}

pub fn decode_zq(key: u64) -> u32 {
    (key >> 32) as u32
}
