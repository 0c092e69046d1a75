//! Bit-level damage to IEEE-754 single precision values.
//!
//! A normal `f32` is laid out as `sign | exponent (8 bits) | mantissa (23 bits)`.
//! The functions here rewrite those fields directly to emulate low-precision
//! floating point hardware:
//!
//! - [`truncate_mantissa`] zeroes the least significant mantissa bits
//! - [`quantise_exponent`] snaps the unbiased exponent to a coarser grid
//! - [`step_toward`] moves to the adjacent representable value
//!
//! Zero, subnormal, infinite and NaN inputs are returned unchanged by the
//! field rewrites. Only normal numbers have a meaningful exponent/mantissa
//! split.
//!
//! Reference: IEEE 754-2008, section 3.4 (binary interchange format encodings).

const MANTISSA_BITS: u32 = 23;
const EXPONENT_MASK: u32 = 0xff << MANTISSA_BITS;
const EXPONENT_BIAS: i32 = 127;

#[inline]
fn is_normal_bits(bits: u32) -> bool {
    let exponent = (bits & EXPONENT_MASK) >> MANTISSA_BITS;
    exponent != 0 && exponent != 0xff
}

/// Keep only the top `keep_bits` mantissa bits (clamped to 1..=23).
///
/// # Example
///
/// ```rust
/// use digitalis_core::truncate_mantissa;
///
/// // 1.75 = 1.11b; one mantissa bit keeps 1.5
/// assert_eq!(truncate_mantissa(1.75, 1), 1.5);
/// assert_eq!(truncate_mantissa(1.75, 23), 1.75);
/// ```
#[inline]
pub fn truncate_mantissa(x: f32, keep_bits: u32) -> f32 {
    if keep_bits >= MANTISSA_BITS || x == 0.0 {
        return x;
    }
    let bits = x.to_bits();
    if !is_normal_bits(bits) {
        return x;
    }
    let drop = MANTISSA_BITS - keep_bits.clamp(1, MANTISSA_BITS);
    let mask = !((1u32 << drop) - 1);
    f32::from_bits(bits & mask)
}

/// Round the unbiased exponent to a multiple of `step`.
///
/// The result exponent is clamped into the normal range [-126, 127]. A `step`
/// of 0 or 1 leaves the value untouched.
///
/// # Example
///
/// ```rust
/// use digitalis_core::quantise_exponent;
///
/// // 2^3 with step 2 rounds the exponent 3/2 = 1.5 away from zero to 4
/// assert_eq!(quantise_exponent(8.0, 2), 16.0);
/// assert_eq!(quantise_exponent(8.0, 1), 8.0);
/// ```
#[inline]
pub fn quantise_exponent(x: f32, step: u32) -> f32 {
    if step <= 1 || x == 0.0 {
        return x;
    }
    let bits = x.to_bits();
    if !is_normal_bits(bits) {
        return x;
    }
    let unbiased = ((bits & EXPONENT_MASK) >> MANTISSA_BITS) as i32 - EXPONENT_BIAS;
    let step = step as f32;
    let snapped = (libm::roundf(unbiased as f32 / step) * step) as i32;
    let snapped = snapped.clamp(-126, 127);
    let rebuilt = (bits & !EXPONENT_MASK) | (((snapped + EXPONENT_BIAS) as u32) << MANTISSA_BITS);
    f32::from_bits(rebuilt)
}

/// The next representable value above (`up = true`) or below `x`.
#[inline]
pub fn step_toward(x: f32, up: bool) -> f32 {
    let target = if up { f32::INFINITY } else { f32::NEG_INFINITY };
    libm::nextafterf(x, target)
}

/// Split `x` into a mantissa in [0.5, 1) and a power-of-two exponent.
#[inline]
pub fn frexp(x: f32) -> (f32, i32) {
    libm::frexpf(x)
}

/// Compute `x * 2^exp`.
#[inline]
pub fn ldexp(x: f32, exp: i32) -> f32 {
    libm::ldexpf(x, exp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_specials_pass_through() {
        assert_eq!(truncate_mantissa(0.0, 3), 0.0);
        assert!(truncate_mantissa(f32::NAN, 3).is_nan());
        assert_eq!(truncate_mantissa(f32::INFINITY, 3), f32::INFINITY);
        let sub = f32::from_bits(0x0000_1234);
        assert_eq!(truncate_mantissa(sub, 3).to_bits(), sub.to_bits());
    }

    #[test]
    fn test_truncate_reduces_magnitude() {
        for &x in &[0.123_f32, -0.987, 3.3, 1.0e-6] {
            let t = truncate_mantissa(x, 4);
            assert!(t.abs() <= x.abs(), "{x} -> {t}");
            assert_eq!(t.signum(), x.signum());
        }
    }

    #[test]
    fn test_truncate_clamps_keep_bits() {
        let x = 1.999_f32;
        assert_eq!(truncate_mantissa(x, 0), truncate_mantissa(x, 1));
    }

    #[test]
    fn test_quantise_exponent_snaps() {
        // 0.6 = 1.2 * 2^-1; step 4 snaps the exponent to 0
        let q = quantise_exponent(0.6, 4);
        assert!((q - 1.2).abs() < 1e-6, "got {q}");
        assert_eq!(quantise_exponent(-0.6, 4), -q);
        // 0.3 = 1.2 * 2^-2; -0.5 rounds away from zero to -4
        assert!((quantise_exponent(0.3, 4) - 0.075).abs() < 1e-6);
    }

    #[test]
    fn test_quantise_exponent_specials() {
        assert_eq!(quantise_exponent(0.0, 4), 0.0);
        assert!(quantise_exponent(f32::NAN, 4).is_nan());
        let sub = f32::from_bits(0x0000_0042);
        assert_eq!(quantise_exponent(sub, 4).to_bits(), sub.to_bits());
    }

    #[test]
    fn test_step_toward_adjacent() {
        let x = 0.5_f32;
        assert_eq!(step_toward(x, true).to_bits(), x.to_bits() + 1);
        assert_eq!(step_toward(x, false).to_bits(), x.to_bits() - 1);
    }

    #[test]
    fn test_frexp_ldexp_inverse() {
        let (m, e) = frexp(6.0);
        assert_eq!(m, 0.75);
        assert_eq!(e, 3);
        assert_eq!(ldexp(m, e), 6.0);
    }
}
