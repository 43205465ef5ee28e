/// Round to nearest integer with ties toward positive infinity (`-2.5 -> -2`, `2.5 -> 3`).
pub(crate) fn round_half_up(x: f64) -> i64 {
    (x + 0.5).floor() as i64
}

/// Euclidean wrap of `i` into `[0, n)`. `n` must be non-zero.
pub(crate) fn wrap_index(i: i64, n: usize) -> usize {
    let n = n as i64;
    (((i % n) + n) % n) as usize
}

/// Scale a pixel length by a ratio, rounding to nearest and never returning less than 1.
pub(crate) fn scaled_band(len: u32, ratio: f64) -> u32 {
    let v = (f64::from(len) * ratio).round();
    if v < 1.0 {
        1
    } else if v >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        v as u32
    }
}

/// Rec. 601 luma of an RGB triple, in `0..=255`.
pub(crate) fn luma_u8(r: u8, g: u8, b: u8) -> u8 {
    ((299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b) + 500) / 1000) as u8
}

/// `x * y / 255`, rounded.
pub(crate) fn mul_div255_u8(x: u8, y: u8) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
