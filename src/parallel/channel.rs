//! Solution events flowing from bottom workers to the coordinator.

use crate::evaluator::Evaluator;
use crossbeam_channel::Receiver;
use std::sync::atomic::{AtomicU64, Ordering};

/// Message sent by a bottom evaluator.
#[derive(Debug, Clone, PartialEq)]
pub enum SolutionEvent {
    /// Full-depth solution with its internal distance.
    Solution {
        coords: Vec<f64>,
        dist: f64,
        norm_exp: i64,
    },
    /// Partial solution, zero below `offset`.
    SubSolution {
        offset: usize,
        coords: Vec<f64>,
        dist: f64,
        norm_exp: i64,
    },
}

/// Search bound shared by every thread of one parallel call.
///
/// Stored as the bits of an `f64` in the units of the full range's norm
/// exponent. It only ever shrinks.
#[derive(Debug)]
pub struct SharedBound {
    bits: AtomicU64,
}

impl SharedBound {
    /// Bound starting at `bound`, in full-range units
    pub fn new(bound: f64) -> Self {
        SharedBound {
            bits: AtomicU64::new(bound.to_bits()),
        }
    }

    /// Current bound; may be stale but never too small.
    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }

    /// Lower the bound to `bound`. Returns true if it was lowered.
    pub fn shrink(&self, bound: f64) -> bool {
        let mut current = self.bits.load(Ordering::SeqCst);
        loop {
            if !(bound < f64::from_bits(current)) {
                return false;
            }
            match self.bits.compare_exchange_weak(
                current,
                bound.to_bits(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return true,
                Err(c) => current = c,
            }
        }
    }
}

/// Owner of the caller's evaluator during a parallel call.
///
/// Runs on the invoking thread. Every event is forwarded to the evaluator
/// with the shared bound, and whatever the evaluator leaves in the bound is
/// published back.
pub struct Coordinator<'a, E: Evaluator + ?Sized> {
    evaluator: &'a mut E,
    receiver: Receiver<SolutionEvent>,
    shared: &'a SharedBound,
    solutions: u64,
}

impl<'a, E: Evaluator + ?Sized> Coordinator<'a, E> {
    /// Take over the caller's evaluator for the duration of a call
    pub fn new(evaluator: &'a mut E, receiver: Receiver<SolutionEvent>, shared: &'a SharedBound) -> Self {
        Coordinator {
            evaluator,
            receiver,
            shared,
            solutions: 0,
        }
    }

    /// Bound published to every thread
    pub fn shared(&self) -> &SharedBound {
        self.shared
    }

    /// Solutions forwarded so far
    pub fn solutions(&self) -> u64 {
        self.solutions
    }

    /// Pass one event to the caller's evaluator and publish the resulting bound.
    pub fn handle(&mut self, event: SolutionEvent) {
        match event {
            SolutionEvent::Solution {
                coords,
                dist,
                norm_exp,
            } => {
                self.sync_exponent(norm_exp);
                let mut bound = self.shared.get();
                self.evaluator.eval_sol(&coords, dist, &mut bound);
                self.shared.shrink(bound);
                self.solutions += 1;
            }
            SolutionEvent::SubSolution {
                offset,
                coords,
                dist,
                norm_exp,
            } => {
                self.sync_exponent(norm_exp);
                self.evaluator.eval_sub_sol(offset, &coords, dist);
            }
        }
    }

    /// Handle every event already queued.
    pub fn drain(&mut self) {
        while let Ok(event) = self.receiver.try_recv() {
            self.handle(event);
        }
    }

    /// Handle events until every sender is gone.
    pub fn drain_until_disconnected(&mut self) {
        while let Ok(event) = self.receiver.recv() {
            self.handle(event);
        }
    }

    fn sync_exponent(&mut self, norm_exp: i64) {
        if self.evaluator.norm_exponent() != norm_exp {
            self.evaluator.set_norm_exponent(norm_exp);
        }
    }
}
