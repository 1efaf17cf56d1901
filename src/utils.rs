//! Utility functions and helpers for enumeration inputs

use crate::core::error::{LatticeError, Result};
use crate::core::gso::{GramSchmidt, GsoProvider};
use crate::core::numeric::EnumFloat;
use rand::rngs::StdRng;
use rand::{rng, Rng, SeedableRng};

fn seeded(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => {
            let mut entropy = rng();
            <StdRng as SeedableRng>::from_rng(&mut entropy)
        }
    }
}

/// Basis generators
pub mod basis_utils {
    use super::*;

    /// Generate a random integer basis with `n` rows of dimension `m`
    pub fn generate_random_basis(n: usize, m: usize, seed: Option<u64>) -> Vec<Vec<i64>> {
        let mut rng = seeded(seed);
        (0..n)
            .map(|_| (0..m).map(|_| rng.random_range(-100..=100)).collect())
            .collect()
    }

    /// Identity basis with small random entries below the diagonal.
    ///
    /// Unimodular, so the lattice is always `Z^n` and the shortest squared
    /// length is 1.
    pub fn identity_like_basis(n: usize, seed: Option<u64>) -> Vec<Vec<i64>> {
        let mut rng = seeded(seed);
        (0..n)
            .map(|i| {
                let mut row = vec![0i64; n];
                row[i] = 1;
                for entry in row.iter_mut().take(i) {
                    if rng.random_range(0..4) == 0 {
                        *entry = rng.random_range(-1..=1);
                    }
                }
                row
            })
            .collect()
    }

    /// Gram-Schmidt data shaped like a reduced basis.
    ///
    /// Squared norms decay slowly from 1 with a little noise, coefficients are
    /// size-reduced (`|mu| <= 0.5`).
    pub fn random_reduced_gso(n: usize, seed: Option<u64>) -> Result<GramSchmidt> {
        if n == 0 {
            return Err(LatticeError::invalid_parameters("dimension must be positive"));
        }
        let mut rng = seeded(seed);
        let norm_squared: Vec<f64> = (0..n)
            .map(|i| 0.97f64.powi(i as i32) * rng.random_range(0.9..1.1))
            .collect();
        let mut mu = vec![vec![0.0; n]; n];
        for i in 0..n {
            for j in 0..i {
                mu[i][j] = rng.random_range(-0.5..=0.5);
            }
            mu[i][i] = 1.0;
        }
        GramSchmidt::from_parts(mu, norm_squared)
    }
}

/// Radius estimates
pub mod radius_utils {
    use super::*;

    // ln Gamma(d / 2 + 1)
    fn ln_gamma_half_plus_one(d: usize) -> f64 {
        let mut x = d as f64 / 2.0 + 1.0;
        let mut acc = 0.0;
        while x > 1.5 {
            x -= 1.0;
            acc += x.ln();
        }
        if x == 1.5 {
            acc + (std::f64::consts::PI.sqrt() / 2.0).ln()
        } else {
            acc
        }
    }

    /// Gaussian heuristic for the squared length of the shortest vector of
    /// the projected lattice `[first, last)`.
    pub fn gaussian_heuristic<G: GsoProvider + ?Sized>(gso: &G, first: usize, last: usize) -> Result<f64> {
        if first >= last || last > gso.dimension() {
            return Err(LatticeError::invalid_range(first, last, gso.dimension()));
        }
        let d = last - first;
        let log_volume: f64 = (first..last).map(|i| gso.r(i).to_f64().ln()).sum::<f64>() / 2.0;
        let exponent = 2.0 / d as f64 * (ln_gamma_half_plus_one(d) + log_volume);
        Ok(exponent.exp() / std::f64::consts::PI)
    }

    /// Pruning vector with every coefficient 1, i.e. no pruning
    pub fn no_pruning(d: usize) -> Vec<f64> {
        vec![1.0; d]
    }

    /// Linear pruning: level `k` keeps a fraction `(d - k) / d` of the bound,
    /// floored at `min_ratio`. Full solutions (level 0) keep the whole bound.
    pub fn linear_pruning(d: usize, min_ratio: f64) -> Vec<f64> {
        (0..d)
            .map(|k| ((d - k) as f64 / d as f64).max(min_ratio))
            .collect()
    }
}

pub use basis_utils::*;
pub use radius_utils::*;
