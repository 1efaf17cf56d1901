//! Enumeration façade
//!
//! Picks an engine per call: an external backend when one is configured and
//! the call is a plain full enumeration, the parallel engine for large ranges
//! when threads are available, and the sequential engine for everything else.

use crate::core::error::{LatticeError, Result};
use crate::core::gso::GsoProvider;
use crate::core::types::{EnumParams, EnumerationConfig, PARALLEL_MIN_LEVELS};
use crate::evaluator::Evaluator;
use crate::features;
use crate::parallel::{default_split_level, ParallelEnumerator};
use crate::sequential::SequentialEnumerator;

/// Externally supplied enumeration backend.
///
/// Only consulted for calls without target and subtree. Returning `false`
/// declines the call; the façade then runs its own engines.
pub trait ExternalEnumerator<G: GsoProvider + ?Sized> {
    #[allow(clippy::too_many_arguments)]
    fn enumerate(
        &mut self,
        gso: &G,
        evaluator: &mut dyn Evaluator,
        first: usize,
        last: usize,
        max_dist: &mut G::Float,
        max_dist_expo: i64,
        pruning: &[f64],
        dual: bool,
    ) -> bool;

    /// Nodes visited by the last accepted call
    fn get_nodes(&self) -> u64;
}

/// Engine that served the last call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    External,
    Parallel,
    Sequential,
}

/// Dispatching entry point for enumeration
pub struct Enumeration<'g, G: GsoProvider + ?Sized> {
    gso: &'g G,
    config: EnumerationConfig,
    max_indices: Vec<usize>,
    external: Option<Box<dyn ExternalEnumerator<G> + 'g>>,
    sequential: Option<SequentialEnumerator<'g, G>>,
    parallel: Option<ParallelEnumerator<'g, G>>,
    nodes: u64,
    last_engine: Option<EngineKind>,
}

impl<'g, G: GsoProvider + ?Sized> Enumeration<'g, G> {
    pub fn new(gso: &'g G) -> Self {
        Enumeration {
            gso,
            config: EnumerationConfig::default(),
            max_indices: Vec::new(),
            external: None,
            sequential: None,
            parallel: None,
            nodes: 0,
            last_engine: None,
        }
    }

    pub fn with_config(mut self, config: EnumerationConfig) -> Self {
        self.config = config;
        self.parallel = None;
        self
    }

    /// Cap `|x_k| <= max_indices[k]`; forces the sequential engine.
    pub fn with_max_indices(mut self, max_indices: Vec<usize>) -> Self {
        self.max_indices = max_indices;
        self.sequential = None;
        self
    }

    pub fn with_external(mut self, external: Box<dyn ExternalEnumerator<G> + 'g>) -> Self {
        self.external = Some(external);
        self
    }

    pub fn config(&self) -> &EnumerationConfig {
        &self.config
    }

    /// Nodes visited by the last call
    pub fn get_nodes(&self) -> u64 {
        self.nodes
    }

    /// Engine used by the last successful call
    pub fn last_engine(&self) -> Option<EngineKind> {
        self.last_engine
    }

    /// Enumerate `[first, last)` with the first engine able to serve the call.
    ///
    /// Returns the number of visited nodes, also available from
    /// [`Enumeration::get_nodes`].
    pub fn enumerate<E: Evaluator>(
        &mut self,
        evaluator: &mut E,
        first: usize,
        last: Option<usize>,
        max_dist: &mut G::Float,
        max_dist_expo: i64,
        params: &EnumParams,
    ) -> Result<u64> {
        let gso = self.gso;
        let dimension = gso.dimension();
        let last = last.unwrap_or(dimension);
        if first >= last || last > dimension {
            return Err(LatticeError::invalid_range(first, last, dimension));
        }
        params.validate(first, last)?;
        self.nodes = 0;
        self.last_engine = None;

        if let Some(external) = self.external.as_mut() {
            if params.subtree.is_empty() && params.target.is_empty() {
                if external.enumerate(
                    gso,
                    evaluator,
                    first,
                    last,
                    max_dist,
                    max_dist_expo,
                    &params.pruning,
                    params.dual,
                ) {
                    self.nodes = external.get_nodes();
                    self.last_engine = Some(EngineKind::External);
                    log::debug!(
                        "external enumerator served [{}, {}): {} nodes",
                        first,
                        last,
                        self.nodes
                    );
                    return Ok(self.nodes);
                }
                log::debug!(
                    "external enumerator declined [{}, {}), falling back",
                    first,
                    last
                );
            }
        }

        if let Some(split) = self.parallel_split(last - first, params) {
            log::debug!("dispatching [{}, {}) to the parallel engine", first, last);
            let threads = self.config.threads;
            let engine = self
                .parallel
                .get_or_insert_with(|| ParallelEnumerator::new(gso).with_threads(threads));
            engine.enumerate(
                evaluator,
                first,
                Some(last),
                max_dist,
                max_dist_expo,
                Some(split),
                params,
            )?;
            self.nodes = engine.get_nodes();
            self.last_engine = Some(EngineKind::Parallel);
        } else {
            log::debug!("dispatching [{}, {}) to the sequential engine", first, last);
            let max_indices = &self.max_indices;
            let engine = self.sequential.get_or_insert_with(|| {
                SequentialEnumerator::new(gso).with_max_indices(max_indices.clone())
            });
            engine.enumerate(evaluator, first, Some(last), max_dist, max_dist_expo, params)?;
            self.nodes = engine.get_nodes();
            self.last_engine = Some(EngineKind::Sequential);
        }
        Ok(self.nodes)
    }

    // split level for the parallel engine, or None to run sequentially
    fn parallel_split(&self, d: usize, params: &EnumParams) -> Option<usize> {
        let eligible = features::parallel_available()
            && self.config.threads > 1
            && d > PARALLEL_MIN_LEVELS
            && !params.dual
            && !params.subtree_reset
            && self.max_indices.is_empty();
        if !eligible {
            return None;
        }
        let subtree_len = params.subtree.len();
        let split = self
            .config
            .split_level
            .unwrap_or_else(|| default_split_level(d, subtree_len).max(subtree_len + 1));
        // an explicit split is passed through and validated by the engine
        if self.config.split_level.is_none() && split + 1 >= d {
            return None;
        }
        Some(split)
    }
}
