//! Core types shared by the enumeration engines

use crate::core::error::{LatticeError, Result};
use serde::{Deserialize, Serialize};

/// Capacity of the parallel engine's top-node queue.
pub const TOP_NODE_QUEUE_CAPACITY: usize = 1 << 16;

/// Ranges at or below this many levels always run sequentially.
pub const PARALLEL_MIN_LEVELS: usize = 10;

/// Per-call enumeration parameters
///
/// Levels are numbered from 0 (full vectors) to `d - 1` (the root, basis index
/// `last - 1`) within the enumerated range `[first, last)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnumParams {
    /// Target in Gram-Schmidt coordinates, indexed by absolute basis index.
    /// Empty for shortest-vector search.
    pub target: Vec<f64>,
    /// Fixed coordinates of the top levels: `subtree[i]` sits at level `d - len + i`.
    pub subtree: Vec<f64>,
    /// Bound multiplier per level, `pruning[0]` for full solutions. Empty for none.
    pub pruning: Vec<f64>,
    /// Enumerate the dual lattice
    pub dual: bool,
    /// Do not count the fixed subtree's distance
    pub subtree_reset: bool,
}

impl EnumParams {
    /// Parameters for a plain shortest-vector search
    pub fn new() -> Self {
        Self::default()
    }

    /// Search for vectors close to `target` (Gram-Schmidt coordinates)
    pub fn with_target(mut self, target: Vec<f64>) -> Self {
        self.target = target;
        self
    }

    /// Restrict the search to the subtree below a fixed prefix
    pub fn with_subtree(mut self, subtree: Vec<f64>) -> Self {
        self.subtree = subtree;
        self
    }

    /// Set per-level pruning coefficients
    pub fn with_pruning(mut self, pruning: Vec<f64>) -> Self {
        self.pruning = pruning;
        self
    }

    /// Enable or disable dual enumeration
    pub fn with_dual(mut self, dual: bool) -> Self {
        self.dual = dual;
        self
    }

    /// Enable or disable subtree reset
    pub fn with_subtree_reset(mut self, reset: bool) -> Self {
        self.subtree_reset = reset;
        self
    }

    /// Whether the search looks for a closest vector rather than a shortest one
    pub fn is_cvp(&self) -> bool {
        !self.target.is_empty()
    }

    /// Check the parameters against the range `[first, last)`
    pub fn validate(&self, first: usize, last: usize) -> Result<()> {
        let d = last.saturating_sub(first);
        if self.subtree.len() > d {
            return Err(LatticeError::SubtreeTooLong {
                len: self.subtree.len(),
                range: d,
            });
        }
        if !self.pruning.is_empty() && self.pruning.len() < d {
            return Err(LatticeError::dimension_mismatch(
                "pruning",
                d,
                self.pruning.len(),
            ));
        }
        if let Some(p) = self.pruning.iter().find(|p| !(**p > 0.0) || !p.is_finite()) {
            return Err(LatticeError::invalid_parameters(format!(
                "pruning coefficients must be positive, got {}",
                p
            )));
        }
        if self.is_cvp() && self.target.len() < last {
            return Err(LatticeError::dimension_mismatch(
                "target",
                last,
                self.target.len(),
            ));
        }
        if self.dual && self.is_cvp() {
            return Err(LatticeError::not_supported(
                "closest vector search in dual mode",
            ));
        }
        if self.dual && !self.subtree.is_empty() {
            return Err(LatticeError::not_supported(
                "subtree enumeration in dual mode",
            ));
        }
        Ok(())
    }
}

/// Engine selection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumerationConfig {
    /// Threads available to the parallel engine, including the caller's
    pub threads: usize,
    /// Fixed split level for the parallel engine, or `None` for the default
    pub split_level: Option<usize>,
}

impl Default for EnumerationConfig {
    fn default() -> Self {
        EnumerationConfig {
            threads: num_cpus::get().max(1),
            split_level: None,
        }
    }
}

impl EnumerationConfig {
    /// Single-threaded configuration
    pub fn sequential() -> Self {
        EnumerationConfig {
            threads: 1,
            split_level: None,
        }
    }

    /// Set the number of threads
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// Set a fixed split level
    pub fn with_split_level(mut self, split: usize) -> Self {
        self.split_level = Some(split);
        self
    }
}

/// How a collecting evaluator shrinks the bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvaluatorStrategy {
    /// Keep the best `max_sols` solutions, bound becomes the worst kept once full
    Best,
    /// Stop searching as soon as `max_sols` solutions were accepted
    FirstN,
}

impl Default for EvaluatorStrategy {
    fn default() -> Self {
        EvaluatorStrategy::Best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_builder() {
        let params = EnumParams::new()
            .with_subtree(vec![1.0, 0.0])
            .with_pruning(vec![1.0; 5])
            .with_subtree_reset(true);
        assert_eq!(params.subtree.len(), 2);
        assert!(params.subtree_reset);
        assert!(!params.is_cvp());
        assert!(params.validate(0, 5).is_ok());
    }

    #[test]
    fn test_params_validation() {
        let long = EnumParams::new().with_subtree(vec![0.0; 4]);
        assert_eq!(
            long.validate(0, 3),
            Err(LatticeError::SubtreeTooLong { len: 4, range: 3 })
        );

        let short_pruning = EnumParams::new().with_pruning(vec![1.0; 2]);
        assert!(short_pruning.validate(0, 3).is_err());

        let short_target = EnumParams::new().with_target(vec![0.5; 3]);
        assert!(short_target.validate(1, 4).is_err());
        assert!(short_target.validate(0, 3).is_ok());

        let dual_cvp = EnumParams::new().with_target(vec![0.5; 3]).with_dual(true);
        assert!(matches!(
            dual_cvp.validate(0, 3),
            Err(LatticeError::NotSupported(_))
        ));
    }

    #[test]
    fn test_config_builder() {
        let config = EnumerationConfig::default().with_threads(0).with_split_level(3);
        assert_eq!(config.threads, 1);
        assert_eq!(config.split_level, Some(3));
        assert!(EnumerationConfig::default().threads >= 1);
    }
}
