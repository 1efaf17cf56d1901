//! Arbitrary precision bounds and Gram-Schmidt data with rug support
//!
//! With the `high-precision` feature, `rug::Float` can hold the caller's
//! bound and the Gram-Schmidt coefficients. The search itself still runs on
//! normalized doubles; only the exponent bookkeeping happens in MPFR.

use crate::core::error::{LatticeError, Result};

#[cfg(feature = "high-precision")]
use crate::core::gso::GsoProvider;
#[cfg(feature = "high-precision")]
use crate::core::numeric::EnumFloat;
#[cfg(feature = "high-precision")]
use rug::{Assign, Float};

/// Smallest accepted MPFR precision
pub const MIN_PRECISION_BITS: u32 = 32;

/// Check a requested precision, in bits.
pub fn check_precision(bits: u32) -> Result<u32> {
    if bits < MIN_PRECISION_BITS {
        return Err(LatticeError::invalid_parameters(format!(
            "Precision must be at least {} bits, got {}",
            MIN_PRECISION_BITS, bits
        )));
    }
    if bits > 16384 {
        log::warn!(
            "Very high precision ({} bits) may cause performance issues",
            bits
        );
    }
    if !crate::features::high_precision_available() {
        return Err(LatticeError::precision_error(
            "High precision requested but 'high-precision' feature is not enabled. \
             Enable the 'high-precision' feature in Cargo.toml (rug backend) and rebuild.",
        ));
    }
    Ok(bits)
}

#[cfg(feature = "high-precision")]
fn clamp_shift(e: i64) -> i32 {
    e.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

#[cfg(feature = "high-precision")]
impl EnumFloat for Float {
    fn exponent(&self) -> i64 {
        self.get_exp().map_or(0, i64::from)
    }

    fn to_f64_scaled(&self, e: i64) -> f64 {
        let mut scaled = self.clone();
        scaled <<= clamp_shift(e);
        scaled.to_f64()
    }

    fn assign_scaled(&mut self, m: f64, e: i64) {
        self.assign(m);
        *self <<= clamp_shift(e);
    }

    fn to_f64(&self) -> f64 {
        Float::to_f64(self)
    }
}

/// Gram-Schmidt coefficients and squared norms in MPFR floats
#[cfg(feature = "high-precision")]
#[derive(Debug, Clone)]
pub struct HighPrecisionGso {
    precision: u32,
    mu: Vec<Vec<Float>>,
    norm_squared: Vec<Float>,
}

#[cfg(feature = "high-precision")]
impl HighPrecisionGso {
    /// Orthogonalize the rows of an integer basis at `precision` bits.
    pub fn from_basis(basis: &[Vec<i64>], precision: u32) -> Result<Self> {
        let precision = check_precision(precision)?;
        let n = basis.len();
        if n == 0 {
            return Err(LatticeError::invalid_parameters("basis must not be empty"));
        }
        let dim = basis[0].len();
        if let Some(row) = basis.iter().find(|row| row.len() != dim) {
            return Err(LatticeError::dimension_mismatch("basis row", dim, row.len()));
        }

        let rows: Vec<Vec<Float>> = basis
            .iter()
            .map(|row| row.iter().map(|&x| Float::with_val(precision, x)).collect())
            .collect();
        let zero = Float::with_val(precision, 0);
        let mut orthogonal: Vec<Vec<Float>> = Vec::with_capacity(n);
        let mut mu = vec![vec![zero.clone(); n]; n];
        let mut norm_squared: Vec<Float> = Vec::with_capacity(n);

        for i in 0..n {
            let mut vec = rows[i].clone();
            for j in 0..i {
                let dot = dot_product(&rows[i], &orthogonal[j], precision);
                let coefficient = Float::with_val(precision, &dot / &norm_squared[j]);
                for k in 0..dim {
                    vec[k] -= &coefficient * &orthogonal[j][k];
                }
                mu[i][j] = coefficient;
            }
            mu[i][i] = Float::with_val(precision, 1);

            let norm_sq = dot_product(&vec, &vec, precision);
            if norm_sq.is_zero() {
                return Err(LatticeError::invalid_parameters(format!(
                    "squared Gram-Schmidt norm {} is zero, basis must be linearly independent",
                    i
                )));
            }
            norm_squared.push(norm_sq);
            orthogonal.push(vec);
        }

        Ok(HighPrecisionGso {
            precision,
            mu,
            norm_squared,
        })
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }
}

#[cfg(feature = "high-precision")]
fn dot_product(a: &[Float], b: &[Float], precision: u32) -> Float {
    let mut result = Float::with_val(precision, 0);
    for (ai, bi) in a.iter().zip(b.iter()) {
        result += ai * bi;
    }
    result
}

#[cfg(feature = "high-precision")]
impl GsoProvider for HighPrecisionGso {
    type Float = Float;

    fn dimension(&self) -> usize {
        self.norm_squared.len()
    }

    fn r(&self, i: usize) -> Float {
        self.norm_squared[i].clone()
    }

    fn mu(&self, i: usize, j: usize) -> Float {
        self.mu[i][j].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precision_floor() {
        assert!(check_precision(16).is_err());
        assert_eq!(
            check_precision(128).is_ok(),
            crate::features::high_precision_available()
        );
    }

    #[cfg(feature = "high-precision")]
    #[test]
    fn test_rug_float_exponent_and_scaling() {
        let x = Float::with_val(128, 12);
        assert_eq!(x.exponent(), 4);
        assert_eq!(x.to_f64_scaled(-2), 3.0);

        let mut y = Float::with_val(256, 0);
        y.assign_scaled(0.75, 10);
        assert_eq!(y.to_f64(), 768.0);
        assert_eq!(y.prec(), 256);
        assert_eq!(Float::with_val(64, 0).exponent(), 0);
    }

    #[cfg(feature = "high-precision")]
    #[test]
    fn test_high_precision_shortest_vector() {
        use crate::core::gso::GramSchmidt;
        use crate::core::types::EnumParams;
        use crate::evaluator::FastEvaluator;
        use crate::sequential::SequentialEnumerator;

        let basis = vec![vec![4, 1, 0], vec![1, 5, 2], vec![0, 2, 6]];
        let hp = HighPrecisionGso::from_basis(&basis, 128).unwrap();
        let plain = GramSchmidt::from_basis(&basis).unwrap();

        let mut hp_eval = FastEvaluator::best(1);
        let mut hp_bound = Float::with_val(128, 40);
        SequentialEnumerator::new(&hp)
            .enumerate(&mut hp_eval, 0, None, &mut hp_bound, 0, &EnumParams::new())
            .unwrap();

        let mut eval = FastEvaluator::best(1);
        let mut bound = 40.0;
        SequentialEnumerator::new(&plain)
            .enumerate(&mut eval, 0, None, &mut bound, 0, &EnumParams::new())
            .unwrap();

        let hp_best = hp_eval.best_solution().unwrap();
        let best = eval.best_solution().unwrap();
        assert_eq!(hp_best.coords, best.coords);
        assert!((hp_best.dist - best.dist).abs() < 1e-9);
        assert!((hp_bound.to_f64() - bound).abs() < 1e-9);
    }
}
