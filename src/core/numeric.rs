//! Numeric capability required from bound and Gram-Schmidt float types
//!
//! The search itself runs on `f64` values normalized by a shared binary
//! exponent. Callers may hold bounds and GSO data in any type that can
//! report its exponent and convert to and from scaled doubles.

use std::fmt::Debug;

/// Floating point type usable as an enumeration bound or GSO coefficient.
pub trait EnumFloat: Clone + PartialOrd + Debug + Send + Sync {
    /// Binary exponent `e` such that `self = m * 2^e` with `0.5 <= |m| < 1`.
    ///
    /// Zero and non-finite values report 0.
    fn exponent(&self) -> i64;

    /// `self * 2^e`, rounded to a double.
    fn to_f64_scaled(&self, e: i64) -> f64;

    /// Set `self` to `m * 2^e`, keeping the current precision.
    fn assign_scaled(&mut self, m: f64, e: i64);

    /// Plain conversion to a double.
    fn to_f64(&self) -> f64 {
        self.to_f64_scaled(0)
    }
}

/// `x * 2^e` without overflowing the intermediate power.
pub fn ldexp(x: f64, e: i64) -> f64 {
    if x == 0.0 || !x.is_finite() {
        return x;
    }
    let mut value = x;
    let mut rest = e;
    // 2^1000 and 2^-1000 are both representable as normal doubles
    while rest > 1000 {
        value *= 2f64.powi(1000);
        rest -= 1000;
    }
    while rest < -1000 {
        value *= 2f64.powi(-1000);
        rest += 1000;
    }
    value * 2f64.powi(rest as i32)
}

impl EnumFloat for f64 {
    fn exponent(&self) -> i64 {
        if *self == 0.0 || !self.is_finite() {
            return 0;
        }
        let bits = self.to_bits();
        let biased = ((bits >> 52) & 0x7ff) as i64;
        if biased == 0 {
            // subnormal
            self.abs().log2().floor() as i64 + 1
        } else {
            biased - 1022
        }
    }

    fn to_f64_scaled(&self, e: i64) -> f64 {
        ldexp(*self, e)
    }

    fn assign_scaled(&mut self, m: f64, e: i64) {
        *self = ldexp(m, e);
    }
}
