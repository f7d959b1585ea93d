//! Modular routing arithmetic.
//!
//! The same non-negative modulo backs both the owner routing function and
//! the deduplicator's bucket index, so the two stay consistent across the
//! full signed value domain.

/// Non-negative modulo of a signed 64-bit value.
///
/// Returns a value in `[0, modulus)` for any `value`, including negative and
/// extreme-magnitude inputs. The intermediate arithmetic is widened to 128
/// bits so the result is well defined for every `i64`.
///
/// # Panics
///
/// Panics if `modulus` is zero (division by zero).
#[inline]
#[must_use]
pub fn safe_mod(value: i64, modulus: usize) -> usize {
    let m = modulus as i128;
    let r = (i128::from(value) % m + m) % m;
    r as usize
}
