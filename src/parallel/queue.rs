//! Bounded LIFO queue of top nodes shared by the coordinator and workers.

use crate::core::types::TOP_NODE_QUEUE_CAPACITY;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct QueueState {
    nodes: Vec<Vec<f64>>,
    finished: bool,
    pushed: u64,
    popped: u64,
}

/// Prefixes produced by the top enumeration, waiting for a bottom job.
///
/// Producers never block: a full queue hands the node back so the caller can
/// do some bottom work first. Consumers block in [`TopNodeQueue::wait_pop`]
/// until a node arrives or the queue is finished.
#[derive(Debug)]
pub struct TopNodeQueue {
    state: Mutex<QueueState>,
    available: Condvar,
    capacity: usize,
}

impl Default for TopNodeQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TopNodeQueue {
    /// Queue with the standard capacity
    pub fn new() -> Self {
        Self::with_capacity(TOP_NODE_QUEUE_CAPACITY)
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        TopNodeQueue {
            state: Mutex::new(QueueState::default()),
            available: Condvar::new(),
            capacity: capacity.max(1),
        }
    }

    // every critical section leaves the state consistent, so a poisoned lock is still usable
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Push a node, handing it back if the queue is full.
    pub fn try_push(&self, node: Vec<f64>) -> Result<(), Vec<f64>> {
        let mut state = self.lock();
        if state.nodes.len() >= self.capacity {
            return Err(node);
        }
        state.nodes.push(node);
        state.pushed += 1;
        drop(state);
        self.available.notify_one();
        Ok(())
    }

    /// Pop the most recently pushed node, if any.
    pub fn try_pop(&self) -> Option<Vec<f64>> {
        let mut state = self.lock();
        let node = state.nodes.pop();
        if node.is_some() {
            state.popped += 1;
        }
        node
    }

    /// Pop a node, waiting while the queue is empty and not finished.
    ///
    /// Returns `None` once the queue is finished and drained.
    pub fn wait_pop(&self) -> Option<Vec<f64>> {
        let mut state = self.lock();
        loop {
            if let Some(node) = state.nodes.pop() {
                state.popped += 1;
                return Some(node);
            }
            if state.finished {
                return None;
            }
            state = self
                .available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Mark that no more nodes will be pushed and wake every waiter.
    pub fn finish(&self) {
        self.lock().finished = true;
        self.available.notify_all();
    }

    /// Whether `finish` has been called
    pub fn is_finished(&self) -> bool {
        self.lock().finished
    }

    /// Nodes currently waiting
    pub fn len(&self) -> usize {
        self.lock().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().nodes.is_empty()
    }

    /// Maximum number of waiting nodes
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total `(pushed, popped)` counts since creation.
    pub fn stats(&self) -> (u64, u64) {
        let state = self.lock();
        (state.pushed, state.popped)
    }
}

/// Finishes the queue when dropped, so waiting workers are released even if
/// the producer unwinds.
pub(crate) struct FinishGuard<'a>(pub(crate) &'a TopNodeQueue);

impl Drop for FinishGuard<'_> {
    fn drop(&mut self) {
        self.0.finish();
    }
}
