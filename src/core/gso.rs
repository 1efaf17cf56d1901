//! Read-only Gram-Schmidt data consumed by the enumeration engines

use crate::core::error::{LatticeError, Result};
use crate::core::numeric::EnumFloat;

/// Source of Gram-Schmidt coefficients and squared norms.
///
/// Providers must not change while an enumeration runs; the parallel engine
/// reads them from several threads at once.
pub trait GsoProvider: Sync {
    /// Float type of the stored coefficients, also used for bounds.
    type Float: EnumFloat;

    /// Number of basis vectors.
    fn dimension(&self) -> usize;

    /// Squared norm of `b*_i`.
    fn r(&self, i: usize) -> Self::Float;

    /// Coefficient `mu[i][j] = <b_i, b*_j> / ||b*_j||^2` for `j < i`.
    fn mu(&self, i: usize, j: usize) -> Self::Float;
}

/// Largest exponent of `r(i)` over `[first, last)`.
///
/// Every engine working on the same range uses this value as its `normExp`,
/// so distances reported by different threads share one scale.
pub fn norm_exponent<G: GsoProvider + ?Sized>(gso: &G, first: usize, last: usize) -> i64 {
    (first..last)
        .map(|i| gso.r(i).exponent())
        .max()
        .unwrap_or(0)
}

/// Gram-Schmidt coefficients and squared norms in double precision
#[derive(Debug, Clone)]
pub struct GramSchmidt {
    /// Coefficients mu[i][j] = <b_i, b*_j> / ||b*_j||^2
    pub mu: Vec<Vec<f64>>,
    /// Squared norms of orthogonal vectors
    pub norm_squared: Vec<f64>,
}

impl GramSchmidt {
    /// Build from precomputed coefficients.
    ///
    /// `mu` must be square with the same size as `norm_squared`; only the
    /// strictly lower triangle is read.
    pub fn from_parts(mu: Vec<Vec<f64>>, norm_squared: Vec<f64>) -> Result<Self> {
        let n = norm_squared.len();
        if mu.len() != n {
            return Err(LatticeError::dimension_mismatch("mu rows", n, mu.len()));
        }
        if let Some(row) = mu.iter().find(|row| row.len() != n) {
            return Err(LatticeError::dimension_mismatch("mu columns", n, row.len()));
        }
        if let Some(i) = norm_squared.iter().position(|r| !(*r > 0.0) || !r.is_finite()) {
            return Err(LatticeError::invalid_parameters(format!(
                "squared Gram-Schmidt norm {} is {}, basis must be linearly independent",
                i, norm_squared[i]
            )));
        }
        Ok(GramSchmidt { mu, norm_squared })
    }

    /// Orthogonal basis with the given squared norms and no projections.
    pub fn diagonal(norm_squared: Vec<f64>) -> Result<Self> {
        let n = norm_squared.len();
        Self::from_parts(vec![vec![0.0; n]; n], norm_squared)
    }

    /// Orthogonalize the rows of an integer basis.
    pub fn from_basis(basis: &[Vec<i64>]) -> Result<Self> {
        let n = basis.len();
        if n == 0 {
            return Err(LatticeError::invalid_parameters("basis must not be empty"));
        }
        let dim = basis[0].len();
        if let Some(row) = basis.iter().find(|row| row.len() != dim) {
            return Err(LatticeError::dimension_mismatch("basis row", dim, row.len()));
        }

        let rows: Vec<Vec<f64>> = basis
            .iter()
            .map(|row| row.iter().map(|&x| x as f64).collect())
            .collect();
        let mut b_star: Vec<Vec<f64>> = Vec::with_capacity(n);
        let mut mu = vec![vec![0.0; n]; n];
        let mut norm_squared = Vec::with_capacity(n);

        for i in 0..n {
            let mut b_i = rows[i].clone();
            for j in 0..i {
                let dot: f64 = rows[i].iter().zip(&b_star[j]).map(|(a, b)| a * b).sum();
                mu[i][j] = dot / norm_squared[j];
                for k in 0..dim {
                    b_i[k] -= mu[i][j] * b_star[j][k];
                }
            }
            let norm_sq: f64 = b_i.iter().map(|x| x * x).sum();
            norm_squared.push(norm_sq);
            b_star.push(b_i);
            mu[i][i] = 1.0;
        }

        Self::from_parts(mu, norm_squared)
    }

    /// Squared length of the lattice vector with the given integer coordinates.
    pub fn squared_length(&self, coords: &[f64]) -> f64 {
        let n = self.norm_squared.len().min(coords.len());
        (0..n)
            .map(|j| {
                let projected: f64 = coords[j]
                    + (j + 1..n)
                        .map(|i| coords[i] * self.mu[i][j])
                        .sum::<f64>();
                projected * projected * self.norm_squared[j]
            })
            .sum()
    }
}

impl GsoProvider for GramSchmidt {
    type Float = f64;

    fn dimension(&self) -> usize {
        self.norm_squared.len()
    }

    fn r(&self, i: usize) -> f64 {
        self.norm_squared[i]
    }

    fn mu(&self, i: usize, j: usize) -> f64 {
        self.mu[i][j]
    }
}
