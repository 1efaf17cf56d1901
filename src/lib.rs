//! lattice enumeration crate with sequential and parallel engines
//!
//! This crate provides the search kernel of lattice reduction:
//! - Schnorr-Euchner enumeration with pruning, subtrees and subsolutions
//! - SVP (shortest vector) and CVP (closest vector) modes, plus dual enumeration
//! - A parallel engine splitting the tree between a top walk and worker threads
//! - A façade choosing between an external backend, the parallel engine and
//!   the sequential one
//! - High-precision bounds and Gram-Schmidt data (optional)
//!
//! # Examples
//!
//! Shortest vector of a small basis:
//! ```rust
//! use lattice_enum::{EnumParams, Enumeration, FastEvaluator, GramSchmidt};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let gso = GramSchmidt::from_basis(&[
//!     vec![4, 1, 0],
//!     vec![1, 5, 2],
//!     vec![0, 2, 6],
//! ])?;
//!
//! let mut evaluator = FastEvaluator::best(1);
//! let mut bound = 20.0;
//! let mut enumeration = Enumeration::new(&gso);
//! let nodes = enumeration.enumerate(&mut evaluator, 0, None, &mut bound, 0, &EnumParams::new())?;
//!
//! let best = evaluator.best_solution().expect("a vector shorter than the bound");
//! println!("shortest: {:?} (squared length {}, {} nodes)", best.coords, best.dist, nodes);
//! # Ok(())
//! # }
//! ```
//!
//! Parallel enumeration with an explicit split:
//! ```rust
//! use lattice_enum::{EnumParams, FastEvaluator, ParallelEnumerator};
//! use lattice_enum::utils::random_reduced_gso;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let gso = random_reduced_gso(20, Some(1))?;
//! let mut evaluator = FastEvaluator::best(1);
//! let mut bound = 1.5;
//! let mut engine = ParallelEnumerator::new(&gso).with_threads(4);
//! engine.enumerate(&mut evaluator, 0, None, &mut bound, 0, Some(3), &EnumParams::new())?;
//! println!("{} nodes over {:?}", engine.get_nodes(), engine.node_counts());
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod enumeration;
pub mod evaluator;
pub mod features;
pub mod parallel;
pub mod precision;
pub mod sequential;
pub mod utils;

pub use crate::core::*;
pub use enumeration::{EngineKind, Enumeration, ExternalEnumerator};
pub use evaluator::{CallbackEvaluator, Evaluator, FastEvaluator, Solution};
pub use parallel::ParallelEnumerator;
pub use sequential::SequentialEnumerator;
#[cfg(feature = "high-precision")]
pub use precision::HighPrecisionGso;

// Re-export commonly used types
pub use crate::core::error::{LatticeError, Result};

/// Validate that requested features are available
pub fn validate_features() -> Result<()> {
    features::log_features();
    Ok(())
}
