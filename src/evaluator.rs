//! Solution evaluators
//!
//! The enumeration engines never return vectors directly. Every full solution
//! and every subsolution is handed to an [`Evaluator`], which stores what it
//! wants and may shrink the search bound in place.
//!
//! Distances passed to an evaluator are internal values: the true squared
//! length is `dist * 2^norm_exponent()`. The engine sets the norm exponent
//! before it reports anything.

use crate::core::numeric::ldexp;
use crate::core::types::EvaluatorStrategy;
use serde::{Deserialize, Serialize};

/// Consumer of solutions found during enumeration.
pub trait Evaluator {
    /// Full-depth solution with internal squared distance `dist`.
    ///
    /// `max_dist` is the engine's current bound in the same units; the
    /// evaluator may lower it but must never raise it.
    fn eval_sol(&mut self, coords: &[f64], dist: f64, max_dist: &mut f64);

    /// Partial solution whose coordinates below `offset` are zero.
    fn eval_sub_sol(&mut self, offset: usize, coords: &[f64], dist: f64);

    /// Set the exponent that scales internal distances to true ones.
    fn set_norm_exponent(&mut self, exp: i64);

    /// Exponent currently used to scale internal distances.
    fn norm_exponent(&self) -> i64;

    /// Whether no solution has been accepted.
    fn is_empty(&self) -> bool;

    /// Whether the engine should report subsolutions.
    fn find_subsolutions(&self) -> bool {
        false
    }
}

/// An accepted vector with its true squared length
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    /// Integer coordinates relative to the first enumerated basis index
    pub coords: Vec<f64>,
    /// Squared length (or squared distance to the target)
    pub dist: f64,
}

/// Collecting evaluator keeping the shortest solutions found
#[derive(Debug, Clone)]
pub struct FastEvaluator {
    max_sols: usize,
    strategy: EvaluatorStrategy,
    find_subsols: bool,
    norm_exp: i64,
    // sorted by increasing dist
    solutions: Vec<Solution>,
    sub_solutions: Vec<Option<Solution>>,
}

impl Default for FastEvaluator {
    fn default() -> Self {
        FastEvaluator::new(1, EvaluatorStrategy::Best, false)
    }
}

impl FastEvaluator {
    /// Create a new evaluator; `max_sols` is clamped to at least one
    pub fn new(max_sols: usize, strategy: EvaluatorStrategy, find_subsols: bool) -> Self {
        FastEvaluator {
            max_sols: max_sols.max(1),
            strategy,
            find_subsols,
            norm_exp: 0,
            solutions: Vec::new(),
            sub_solutions: Vec::new(),
        }
    }

    /// Keep the `max_sols` best solutions
    pub fn best(max_sols: usize) -> Self {
        Self::new(max_sols, EvaluatorStrategy::Best, false)
    }

    /// Also collect the best subsolution per level
    pub fn with_subsolutions(mut self) -> Self {
        self.find_subsols = true;
        self
    }

    /// Accepted solutions, shortest first
    pub fn solutions(&self) -> &[Solution] {
        &self.solutions
    }

    /// Shortest accepted solution
    pub fn best_solution(&self) -> Option<&Solution> {
        self.solutions.first()
    }

    /// Best subsolution per offset, for the offsets that have one
    pub fn sub_solutions(&self) -> impl Iterator<Item = (usize, &Solution)> {
        self.sub_solutions
            .iter()
            .enumerate()
            .filter_map(|(offset, sol)| sol.as_ref().map(|s| (offset, s)))
    }

    /// Number of accepted solutions
    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    /// Drop everything collected so far
    pub fn clear(&mut self) {
        self.solutions.clear();
        self.sub_solutions.clear();
    }

    fn insert(&mut self, solution: Solution) {
        let pos = self
            .solutions
            .partition_point(|s| s.dist <= solution.dist);
        self.solutions.insert(pos, solution);
    }
}

impl Evaluator for FastEvaluator {
    fn eval_sol(&mut self, coords: &[f64], dist: f64, max_dist: &mut f64) {
        if self.strategy == EvaluatorStrategy::FirstN && self.solutions.len() >= self.max_sols {
            *max_dist = 0.0;
            return;
        }
        self.insert(Solution {
            coords: coords.to_vec(),
            dist: ldexp(dist, self.norm_exp),
        });
        match self.strategy {
            EvaluatorStrategy::Best => {
                self.solutions.truncate(self.max_sols);
                if self.solutions.len() == self.max_sols {
                    if let Some(worst) = self.solutions.last() {
                        let bound = ldexp(worst.dist, -self.norm_exp);
                        if bound < *max_dist {
                            *max_dist = bound;
                        }
                    }
                }
            }
            EvaluatorStrategy::FirstN => {
                if self.solutions.len() >= self.max_sols {
                    *max_dist = 0.0;
                }
            }
        }
    }

    fn eval_sub_sol(&mut self, offset: usize, coords: &[f64], dist: f64) {
        if !self.find_subsols {
            return;
        }
        let dist = ldexp(dist, self.norm_exp);
        if self.sub_solutions.len() <= offset {
            self.sub_solutions.resize(offset + 1, None);
        }
        let slot = &mut self.sub_solutions[offset];
        if slot.as_ref().map_or(true, |s| dist < s.dist) {
            *slot = Some(Solution {
                coords: coords.to_vec(),
                dist,
            });
        }
    }

    fn set_norm_exponent(&mut self, exp: i64) {
        self.norm_exp = exp;
    }

    fn norm_exponent(&self) -> i64 {
        self.norm_exp
    }

    fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    fn find_subsolutions(&self) -> bool {
        self.find_subsols
    }
}

/// Collecting evaluator that only accepts solutions passing a predicate
pub struct CallbackEvaluator<F>
where
    F: FnMut(&[f64]) -> bool,
{
    inner: FastEvaluator,
    accept: F,
}

impl<F> CallbackEvaluator<F>
where
    F: FnMut(&[f64]) -> bool,
{
    /// Wrap `inner`, filtering full solutions through `accept`
    pub fn new(inner: FastEvaluator, accept: F) -> Self {
        CallbackEvaluator { inner, accept }
    }

    /// The wrapped collecting evaluator
    pub fn inner(&self) -> &FastEvaluator {
        &self.inner
    }

    /// Unwrap into the collecting evaluator
    pub fn into_inner(self) -> FastEvaluator {
        self.inner
    }
}

impl<F> Evaluator for CallbackEvaluator<F>
where
    F: FnMut(&[f64]) -> bool,
{
    fn eval_sol(&mut self, coords: &[f64], dist: f64, max_dist: &mut f64) {
        if (self.accept)(coords) {
            self.inner.eval_sol(coords, dist, max_dist);
        }
    }

    fn eval_sub_sol(&mut self, offset: usize, coords: &[f64], dist: f64) {
        self.inner.eval_sub_sol(offset, coords, dist);
    }

    fn set_norm_exponent(&mut self, exp: i64) {
        self.inner.set_norm_exponent(exp);
    }

    fn norm_exponent(&self) -> i64 {
        self.inner.norm_exponent()
    }

    fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn find_subsolutions(&self) -> bool {
        self.inner.find_subsolutions()
    }
}
