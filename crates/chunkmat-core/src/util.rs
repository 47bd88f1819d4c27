//! Index conversions and small shared constants
//
// Pattern offsets and chunk columns are stored as i64; traversal works in
// usize.

/// Values per parallel segment when summing a whole buffer.
pub const REDUCE_SEGMENT: usize = 4096;

/// Convert i64 to usize, asserting non-negativity.
#[inline]
#[must_use]
pub fn i64_to_usize(x: i64) -> usize {
    debug_assert!(x >= 0);
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    {
        x as usize
    }
}

/// Horizontal sum of a 4-lane accumulator plus a scalar tail.
#[inline]
#[must_use]
pub fn hsum4(v: wide::f64x4, tail: f64) -> f64 {
    let arr = v.to_array();
    arr[0] + arr[1] + arr[2] + arr[3] + tail
}
