//! Top and bottom evaluators and the bottom job runner.

use super::channel::{Coordinator, SharedBound, SolutionEvent};
use super::queue::TopNodeQueue;
use crate::core::error::{LatticeError, Result};
use crate::core::gso::GsoProvider;
use crate::core::numeric::{ldexp, EnumFloat};
use crate::core::types::EnumParams;
use crate::evaluator::Evaluator;
use crate::sequential::SequentialEnumerator;
use crossbeam_channel::Sender;

/// Forwards bottom solutions to the coordinator and follows the shared bound.
pub(crate) struct BottomEvaluator<'a> {
    sender: Sender<SolutionEvent>,
    shared: &'a SharedBound,
    norm_exp: i64,
    find_subsols: bool,
    sent: u64,
}

impl<'a> BottomEvaluator<'a> {
    pub(crate) fn new(sender: Sender<SolutionEvent>, shared: &'a SharedBound, find_subsols: bool) -> Self {
        BottomEvaluator {
            sender,
            shared,
            norm_exp: 0,
            find_subsols,
            sent: 0,
        }
    }

    fn send(&mut self, event: SolutionEvent) {
        if self.sender.send(event).is_err() {
            log::warn!("solution channel closed, dropping event");
        }
    }
}

impl Evaluator for BottomEvaluator<'_> {
    fn eval_sol(&mut self, coords: &[f64], dist: f64, max_dist: &mut f64) {
        let event = SolutionEvent::Solution {
            coords: coords.to_vec(),
            dist,
            norm_exp: self.norm_exp,
        };
        self.send(event);
        self.sent += 1;
        let shared = self.shared.get();
        if shared < *max_dist {
            *max_dist = shared;
        }
    }

    fn eval_sub_sol(&mut self, offset: usize, coords: &[f64], dist: f64) {
        let event = SolutionEvent::SubSolution {
            offset,
            coords: coords.to_vec(),
            dist,
            norm_exp: self.norm_exp,
        };
        self.send(event);
    }

    fn set_norm_exponent(&mut self, exp: i64) {
        self.norm_exp = exp;
    }

    fn norm_exponent(&self) -> i64 {
        self.norm_exp
    }

    fn is_empty(&self) -> bool {
        self.sent == 0
    }

    fn find_subsolutions(&self) -> bool {
        self.find_subsols
    }
}

/// Evaluator for bottom jobs run on the coordinator's own thread.
///
/// Solutions reach the caller's evaluator immediately, so the bound of the
/// running job shrinks as soon as the shared bound does.
pub(crate) struct InlineEvaluator<'c, 'a, E: Evaluator + ?Sized> {
    coordinator: &'c mut Coordinator<'a, E>,
    norm_exp: i64,
    find_subsols: bool,
    handled: u64,
}

impl<'c, 'a, E: Evaluator + ?Sized> InlineEvaluator<'c, 'a, E> {
    pub(crate) fn new(coordinator: &'c mut Coordinator<'a, E>, find_subsols: bool) -> Self {
        InlineEvaluator {
            coordinator,
            norm_exp: 0,
            find_subsols,
            handled: 0,
        }
    }
}

impl<E: Evaluator + ?Sized> Evaluator for InlineEvaluator<'_, '_, E> {
    fn eval_sol(&mut self, coords: &[f64], dist: f64, max_dist: &mut f64) {
        self.coordinator.handle(SolutionEvent::Solution {
            coords: coords.to_vec(),
            dist,
            norm_exp: self.norm_exp,
        });
        self.handled += 1;
        // pick up whatever the workers found meanwhile
        self.coordinator.drain();
        let shared = self.coordinator.shared().get();
        if shared < *max_dist {
            *max_dist = shared;
        }
    }

    fn eval_sub_sol(&mut self, offset: usize, coords: &[f64], dist: f64) {
        self.coordinator.handle(SolutionEvent::SubSolution {
            offset,
            coords: coords.to_vec(),
            dist,
            norm_exp: self.norm_exp,
        });
    }

    fn set_norm_exponent(&mut self, exp: i64) {
        self.norm_exp = exp;
    }

    fn norm_exponent(&self) -> i64 {
        self.norm_exp
    }

    fn is_empty(&self) -> bool {
        self.handled == 0
    }

    fn find_subsolutions(&self) -> bool {
        self.find_subsols
    }
}

/// One bottom enumerator with its local bound.
///
/// The first job prepares the enumerator over the whole range; later jobs
/// only swap the fixed prefix.
pub(crate) struct BottomWorker<'a, G: GsoProvider + ?Sized> {
    enumerator: SequentialEnumerator<'a, G>,
    shared: &'a SharedBound,
    first: usize,
    last: usize,
    params: EnumParams,
    // bound in units of 2^norm_exp
    local: G::Float,
    norm_exp: i64,
    jobs: u64,
}

impl<'a, G: GsoProvider + ?Sized> BottomWorker<'a, G> {
    /// `seed` only provides the float type and precision of the local bound;
    /// its value is taken from `shared`.
    pub(crate) fn new(
        gso: &'a G,
        first: usize,
        last: usize,
        params: &EnumParams,
        seed: G::Float,
        norm_exp: i64,
        shared: &'a SharedBound,
    ) -> Self {
        let mut local = seed;
        local.assign_scaled(shared.get(), 0);
        BottomWorker {
            enumerator: SequentialEnumerator::new(gso),
            shared,
            first,
            last,
            params: EnumParams {
                target: params.target.clone(),
                subtree: Vec::new(),
                pruning: params.pruning.clone(),
                dual: false,
                subtree_reset: false,
            },
            local,
            norm_exp,
            jobs: 0,
        }
    }

    /// Enumerate everything below `prefix`, reporting to `evaluator`.
    pub(crate) fn run_job<E: Evaluator + ?Sized>(&mut self, evaluator: &mut E, prefix: Vec<f64>) -> Result<()> {
        let shared = self.shared.get();
        if shared < self.local.to_f64_scaled(0) {
            self.local.assign_scaled(shared, 0);
        }
        if self.enumerator.is_prepared() {
            self.enumerator.next_subtree_enumerate(
                evaluator,
                &mut self.local,
                self.norm_exp,
                &prefix,
            )?;
        } else {
            self.params.subtree = prefix;
            self.enumerator.enumerate(
                evaluator,
                self.first,
                Some(self.last),
                &mut self.local,
                self.norm_exp,
                &self.params,
            )?;
        }
        self.jobs += 1;
        Ok(())
    }

    /// Pop and run jobs until the queue is finished and empty.
    pub(crate) fn run<E: Evaluator + ?Sized>(&mut self, queue: &TopNodeQueue, evaluator: &mut E) -> Result<()> {
        while let Some(prefix) = queue.wait_pop() {
            self.run_job(evaluator, prefix)?;
        }
        Ok(())
    }

    /// Nodes visited over every job so far
    pub(crate) fn nodes(&self) -> u64 {
        self.enumerator.get_nodes()
    }

    /// Jobs completed so far
    pub(crate) fn jobs(&self) -> u64 {
        self.jobs
    }

    /// Local bound in units of `2^norm_exp`
    pub(crate) fn local_bound(&self) -> f64 {
        self.local.to_f64_scaled(0)
    }
}

/// Evaluator of the top enumeration.
///
/// Leaves of the top region are prefixes, not solutions: they go to the queue.
/// Between pushes it forwards queued solution events to the caller's evaluator
/// and tightens the top bound from the shared one.
pub(crate) struct TopEvaluator<'a, E: Evaluator + ?Sized, G: GsoProvider + ?Sized> {
    queue: &'a TopNodeQueue,
    coordinator: Coordinator<'a, E>,
    helper: BottomWorker<'a, G>,
    // full-range norm exponent minus the top range's
    shift: i64,
    // levels below the top region
    bottom_levels: usize,
    find_subsols: bool,
    norm_exp: i64,
    pushed: u64,
    error: Option<LatticeError>,
}

impl<'a, E: Evaluator + ?Sized, G: GsoProvider + ?Sized> TopEvaluator<'a, E, G> {
    /// `shift` converts top-range distances to full-range units;
    /// `bottom_levels` is the number of levels below the top region.
    pub(crate) fn new(
        queue: &'a TopNodeQueue,
        coordinator: Coordinator<'a, E>,
        helper: BottomWorker<'a, G>,
        shift: i64,
        bottom_levels: usize,
        find_subsols: bool,
    ) -> Self {
        TopEvaluator {
            queue,
            coordinator,
            helper,
            shift,
            bottom_levels,
            find_subsols,
            norm_exp: 0,
            pushed: 0,
            error: None,
        }
    }

    /// Top nodes pushed so far
    pub(crate) fn pushed(&self) -> u64 {
        self.pushed
    }

    /// Run a queued job on the coordinator's thread, then forward pending
    /// worker events.
    pub(crate) fn help(&mut self, prefix: Vec<f64>) {
        let mut evaluator = InlineEvaluator::new(&mut self.coordinator, self.find_subsols);
        if let Err(e) = self.helper.run_job(&mut evaluator, prefix) {
            self.error.get_or_insert(e);
        }
        self.coordinator.drain();
    }

    /// Split into the coordinator, the helper worker and the first helper error.
    pub(crate) fn into_parts(self) -> (Coordinator<'a, E>, BottomWorker<'a, G>, Option<LatticeError>) {
        (self.coordinator, self.helper, self.error)
    }
}

impl<E: Evaluator + ?Sized, G: GsoProvider + ?Sized> Evaluator for TopEvaluator<'_, E, G> {
    fn eval_sol(&mut self, coords: &[f64], _dist: f64, max_dist: &mut f64) {
        let mut node = coords.to_vec();
        loop {
            match self.queue.try_push(node) {
                Ok(()) => break,
                Err(back) => {
                    node = back;
                    if let Some(prefix) = self.queue.try_pop() {
                        self.help(prefix);
                    }
                }
            }
        }
        self.pushed += 1;

        self.coordinator.drain();
        let bound = ldexp(self.coordinator.shared().get(), self.shift);
        if bound < *max_dist {
            *max_dist = bound;
        }
    }

    fn eval_sub_sol(&mut self, offset: usize, coords: &[f64], dist: f64) {
        // rebase onto the full range
        let mut full = vec![0.0; self.bottom_levels];
        full.extend_from_slice(coords);
        self.coordinator.handle(SolutionEvent::SubSolution {
            offset: offset + self.bottom_levels,
            coords: full,
            dist: ldexp(dist, -self.shift),
            norm_exp: self.norm_exp + self.shift,
        });
    }

    fn set_norm_exponent(&mut self, exp: i64) {
        self.norm_exp = exp;
    }

    fn norm_exponent(&self) -> i64 {
        self.norm_exp
    }

    fn is_empty(&self) -> bool {
        self.pushed == 0
    }

    fn find_subsolutions(&self) -> bool {
        self.find_subsols
    }
}
