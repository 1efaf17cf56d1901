//! Parallel top/bottom split enumeration
//!
//! The invoking thread enumerates the top `split` levels of the range. Every
//! leaf of that walk is a prefix pushed onto a bounded queue; worker threads
//! pop prefixes and enumerate the levels below them. Solutions travel back to
//! the invoking thread over a channel, where the caller's evaluator runs and
//! the shared bound is tightened.

pub mod channel;
pub mod queue;
mod worker;

pub use channel::{Coordinator, SharedBound, SolutionEvent};
pub use queue::TopNodeQueue;
use worker::{BottomEvaluator, BottomWorker, TopEvaluator};

use crate::core::error::{LatticeError, Result};
use crate::core::gso::{norm_exponent, GsoProvider};
use crate::core::numeric::EnumFloat;
use crate::core::types::{EnumParams, TOP_NODE_QUEUE_CAPACITY};
use crate::evaluator::Evaluator;
use crate::sequential::SequentialEnumerator;
use queue::FinishGuard;
use std::thread;

/// Default number of top levels for a range of `d` levels with `subtree_len`
/// of them fixed.
pub fn default_split_level(d: usize, subtree_len: usize) -> usize {
    1 + d.saturating_sub(subtree_len) / 20
}

/// Result of one bottom worker thread
#[derive(Debug, Clone, Copy)]
struct WorkerReport {
    nodes: u64,
    bound: f64,
}

/// Multi-threaded enumerator splitting the tree at a fixed level
pub struct ParallelEnumerator<'g, G: GsoProvider + ?Sized> {
    gso: &'g G,
    threads: usize,
    queue_capacity: usize,
    node_counts: Vec<u64>,
}

impl<'g, G: GsoProvider + ?Sized> ParallelEnumerator<'g, G> {
    /// Create an enumerator using every available CPU
    pub fn new(gso: &'g G) -> Self {
        ParallelEnumerator {
            gso,
            threads: num_cpus::get().max(1),
            queue_capacity: TOP_NODE_QUEUE_CAPACITY,
            node_counts: Vec::new(),
        }
    }

    /// Set the number of threads, the invoking one included
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// Shrink the top-node queue so the producer runs into backpressure
    #[cfg(test)]
    pub(crate) fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Threads used per call, the invoking one included
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Nodes visited by the last call, summed over every enumerator
    pub fn get_nodes(&self) -> u64 {
        self.node_counts.iter().sum()
    }

    /// Nodes of the last call per enumerator: top, coordinator's helper, then
    /// one entry per worker thread.
    pub fn node_counts(&self) -> &[u64] {
        &self.node_counts
    }

    /// Enumerate `[first, last)` splitting `split` levels off the top.
    ///
    /// `split` defaults to [`default_split_level`] and must leave at least one
    /// free top level and two bottom levels. Dual mode and subtree reset are
    /// not supported. Every configuration error is reported before a thread
    /// is spawned.
    #[allow(clippy::too_many_arguments)]
    pub fn enumerate<E: Evaluator + ?Sized>(
        &mut self,
        evaluator: &mut E,
        first: usize,
        last: Option<usize>,
        max_dist: &mut G::Float,
        max_dist_expo: i64,
        split: Option<usize>,
        params: &EnumParams,
    ) -> Result<()> {
        self.node_counts.clear();
        let gso = self.gso;
        let dimension = gso.dimension();
        let last = last.unwrap_or(dimension);
        if first >= last || last > dimension {
            return Err(LatticeError::invalid_range(first, last, dimension));
        }
        params.validate(first, last)?;
        if params.dual {
            return Err(LatticeError::not_supported(
                "dual enumeration in the parallel engine",
            ));
        }
        if params.subtree_reset {
            return Err(LatticeError::not_supported(
                "subtree reset in the parallel engine",
            ));
        }

        let d = last - first;
        let subtree_len = params.subtree.len();
        let split = split.unwrap_or_else(|| default_split_level(d, subtree_len));
        if split <= subtree_len || split + 1 >= d {
            return Err(LatticeError::SplitOutOfBounds {
                split,
                min: subtree_len + 1,
                max: d.saturating_sub(2),
            });
        }

        let top_first = last - split;
        let norm_exp = norm_exponent(gso, first, last);
        let top_norm_exp = norm_exponent(gso, top_first, last);
        let shared = SharedBound::new(max_dist.to_f64_scaled(max_dist_expo - norm_exp));
        let queue = TopNodeQueue::with_capacity(self.queue_capacity);
        let (sender, receiver) = crossbeam_channel::unbounded();
        let find_subsols = evaluator.find_subsolutions();
        evaluator.set_norm_exponent(norm_exp);

        let top_params = EnumParams {
            target: params.target.clone(),
            subtree: params.subtree.clone(),
            pruning: if params.pruning.is_empty() {
                Vec::new()
            } else {
                params.pruning[d - split..d].to_vec()
            },
            dual: false,
            subtree_reset: false,
        };
        let workers = self.threads - 1;

        log::debug!(
            "parallel enumeration over [{}, {}): split {}, {} worker threads",
            first,
            last,
            split,
            workers
        );

        let outcome = thread::scope(|scope| -> Result<(u64, WorkerReport, Vec<WorkerReport>)> {
            let _finish = FinishGuard(&queue);

            let mut handles = Vec::with_capacity(workers);
            for id in 0..workers {
                let mut worker = BottomWorker::new(
                    gso,
                    first,
                    last,
                    params,
                    max_dist.clone(),
                    norm_exp,
                    &shared,
                );
                let mut bottom = BottomEvaluator::new(sender.clone(), &shared, find_subsols);
                let queue = &queue;
                let handle = thread::Builder::new()
                    .name(format!("enum-worker-{}", id))
                    .spawn_scoped(scope, move || -> Result<WorkerReport> {
                        worker.run(queue, &mut bottom)?;
                        log::trace!(
                            "worker {} done: {} jobs, {} nodes",
                            id,
                            worker.jobs(),
                            worker.nodes()
                        );
                        Ok(WorkerReport {
                            nodes: worker.nodes(),
                            bound: worker.local_bound(),
                        })
                    })
                    .map_err(|e| {
                        LatticeError::worker_error(format!("failed to spawn worker {}: {}", id, e))
                    })?;
                handles.push(handle);
            }

            let helper = BottomWorker::new(
                gso,
                first,
                last,
                params,
                max_dist.clone(),
                norm_exp,
                &shared,
            );
            // only the workers send; once they exit the channel disconnects
            drop(sender);
            let coordinator = Coordinator::new(&mut *evaluator, receiver, &shared);
            let mut top_eval = TopEvaluator::new(
                &queue,
                coordinator,
                helper,
                norm_exp - top_norm_exp,
                d - split,
                find_subsols,
            );

            let mut top = SequentialEnumerator::new(gso).partial_tree();
            let mut top_bound = max_dist.clone();
            let top_result = top.enumerate(
                &mut top_eval,
                top_first,
                Some(last),
                &mut top_bound,
                max_dist_expo,
                &top_params,
            );
            queue.finish();
            log::trace!("top enumeration pushed {} prefixes", top_eval.pushed());

            if workers == 0 {
                while let Some(prefix) = queue.try_pop() {
                    top_eval.help(prefix);
                }
            }

            let (mut coordinator, helper, helper_error) = top_eval.into_parts();
            let helper_report = WorkerReport {
                nodes: helper.nodes(),
                bound: helper.local_bound(),
            };
            coordinator.drain_until_disconnected();

            let mut reports = Vec::with_capacity(workers);
            let mut worker_error = None;
            for handle in handles {
                match handle.join() {
                    Ok(Ok(report)) => reports.push(report),
                    Ok(Err(e)) => {
                        worker_error.get_or_insert(e);
                    }
                    Err(_) => {
                        worker_error
                            .get_or_insert(LatticeError::worker_error("worker thread panicked"));
                    }
                }
            }

            top_result?;
            if let Some(e) = helper_error.or(worker_error) {
                return Err(e);
            }
            Ok((top.get_nodes(), helper_report, reports))
        });

        let (top_nodes, helper, reports) = outcome?;

        let final_bound = reports
            .iter()
            .map(|r| r.bound)
            .chain(std::iter::once(helper.bound))
            .fold(shared.get(), f64::min);
        max_dist.assign_scaled(final_bound, norm_exp - max_dist_expo);

        self.node_counts = std::iter::once(top_nodes)
            .chain(std::iter::once(helper.nodes))
            .chain(reports.iter().map(|r| r.nodes))
            .collect();
        Ok(())
    }
}
