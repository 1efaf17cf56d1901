//! Sequential Schnorr-Euchner enumeration
//!
//! Depth-first walk over integer coordinate vectors of the projected lattice
//! `[first, last)`. Each level tries the coordinate closest to its center and
//! then zig-zags outward; a level stops as soon as the partial squared
//! distance exceeds the bound scaled by that level's pruning coefficient.
//!
//! Levels are numbered inside the range: level `k` holds the coordinate of
//! basis index `first + k` (reversed in dual mode), level `d - 1` is the root.

use crate::core::error::{LatticeError, Result};
use crate::core::gso::{norm_exponent, GsoProvider};
use crate::core::numeric::EnumFloat;
use crate::core::types::EnumParams;
use crate::evaluator::Evaluator;

/// Single-threaded bounded enumerator
pub struct SequentialEnumerator<'g, G: GsoProvider + ?Sized> {
    gso: &'g G,
    max_indices: Vec<usize>,
    partial_tree: bool,

    // prepared by `enumerate`, reused by `next_subtree_enumerate`
    prepared: bool,
    first: usize,
    d: usize,
    dual: bool,
    cvp: bool,
    norm_exp: i64,
    find_subsols: bool,
    rdiag: Vec<f64>,
    mut_: Vec<Vec<f64>>,
    target_base: Vec<f64>,
    pruning: Vec<f64>,
    subsoldists: Vec<f64>,

    // search state, reset for every subtree
    max_dist: f64,
    is_svp: bool,
    x: Vec<f64>,
    alpha: Vec<f64>,
    center: Vec<f64>,
    partdist: Vec<f64>,
    partsums: Vec<Vec<f64>>,
    partsum_begin: Vec<usize>,
    fx: Vec<f64>,

    nodes: u64,
}

impl<'g, G: GsoProvider + ?Sized> SequentialEnumerator<'g, G> {
    /// Create an enumerator reading Gram-Schmidt data from `gso`
    pub fn new(gso: &'g G) -> Self {
        SequentialEnumerator {
            gso,
            max_indices: Vec::new(),
            partial_tree: false,
            prepared: false,
            first: 0,
            d: 0,
            dual: false,
            cvp: false,
            norm_exp: 0,
            find_subsols: false,
            rdiag: Vec::new(),
            mut_: Vec::new(),
            target_base: Vec::new(),
            pruning: Vec::new(),
            subsoldists: Vec::new(),
            max_dist: 0.0,
            is_svp: false,
            x: Vec::new(),
            alpha: Vec::new(),
            center: Vec::new(),
            partdist: Vec::new(),
            partsums: Vec::new(),
            partsum_begin: Vec::new(),
            fx: Vec::new(),
            nodes: 0,
        }
    }

    /// Cap `|x_k| <= max_indices[k]` for the levels the vector covers
    pub fn with_max_indices(mut self, max_indices: Vec<usize>) -> Self {
        self.max_indices = max_indices;
        self
    }

    /// Report every leaf, the all-zero one included.
    ///
    /// Used when the leaves of this walk are prefixes of a larger tree.
    pub fn partial_tree(mut self) -> Self {
        self.partial_tree = true;
        self
    }

    /// Nodes visited since the last `enumerate` call
    pub fn get_nodes(&self) -> u64 {
        self.nodes
    }

    /// Exponent normalizing the prepared range
    pub fn norm_exponent(&self) -> i64 {
        self.norm_exp
    }

    /// Whether `next_subtree_enumerate` can be used
    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    /// Enumerate `[first, last)` (`last = None` for the full dimension).
    ///
    /// `max_dist * 2^max_dist_expo` is the initial squared radius; on return
    /// it holds the bound as shrunk by the evaluator.
    pub fn enumerate<E: Evaluator + ?Sized>(
        &mut self,
        evaluator: &mut E,
        first: usize,
        last: Option<usize>,
        max_dist: &mut G::Float,
        max_dist_expo: i64,
        params: &EnumParams,
    ) -> Result<()> {
        self.nodes = 0;
        let dimension = self.gso.dimension();
        let last = last.unwrap_or(dimension);
        if first >= last || last > dimension {
            return Err(LatticeError::invalid_range(first, last, dimension));
        }
        params.validate(first, last)?;

        log::trace!(
            "sequential enumeration over [{}, {}), subtree {}, dual {}",
            first,
            last,
            params.subtree.len(),
            params.dual
        );

        self.prepare(evaluator, first, last, params);
        self.run(evaluator, max_dist, max_dist_expo, &params.subtree, params.subtree_reset);
        Ok(())
    }

    /// Enumerate another subtree of the prepared range.
    ///
    /// Reuses the normalized Gram-Schmidt data, target and pruning of the last
    /// `enumerate` call; only the bound and the fixed prefix change. The node
    /// counter keeps accumulating.
    pub fn next_subtree_enumerate<E: Evaluator + ?Sized>(
        &mut self,
        evaluator: &mut E,
        max_dist: &mut G::Float,
        max_dist_expo: i64,
        subtree: &[f64],
    ) -> Result<()> {
        if !self.prepared {
            return Err(LatticeError::invalid_parameters(
                "next_subtree_enumerate called before enumerate",
            ));
        }
        if subtree.len() > self.d {
            return Err(LatticeError::SubtreeTooLong {
                len: subtree.len(),
                range: self.d,
            });
        }
        if self.dual && !subtree.is_empty() {
            return Err(LatticeError::not_supported(
                "subtree enumeration in dual mode",
            ));
        }
        evaluator.set_norm_exponent(self.evaluator_exponent());
        self.find_subsols = evaluator.find_subsolutions() && !self.dual;
        self.run(evaluator, max_dist, max_dist_expo, subtree, false);
        Ok(())
    }

    fn evaluator_exponent(&self) -> i64 {
        if self.dual {
            -self.norm_exp
        } else {
            self.norm_exp
        }
    }

    // internal bound = caller bound * 2^shift
    fn bound_shift(&self, max_dist_expo: i64) -> i64 {
        if self.dual {
            max_dist_expo + self.norm_exp
        } else {
            max_dist_expo - self.norm_exp
        }
    }

    fn prepare<E: Evaluator + ?Sized>(
        &mut self,
        evaluator: &mut E,
        first: usize,
        last: usize,
        params: &EnumParams,
    ) {
        let d = last - first;
        let gso = self.gso;
        self.first = first;
        self.d = d;
        self.dual = params.dual;
        self.cvp = params.is_cvp();
        self.norm_exp = norm_exponent(gso, first, last);
        evaluator.set_norm_exponent(self.evaluator_exponent());
        self.find_subsols = evaluator.find_subsolutions() && !self.dual;

        let norm_exp = self.norm_exp;
        self.rdiag = (0..d)
            .map(|i| {
                if self.dual {
                    1.0 / gso.r(last - 1 - i).to_f64_scaled(-norm_exp)
                } else {
                    gso.r(first + i).to_f64_scaled(-norm_exp)
                }
            })
            .collect();

        self.mut_ = vec![vec![0.0; d]; d];
        for i in 0..d {
            for j in i + 1..d {
                self.mut_[i][j] = if self.dual {
                    -gso.mu(last - 1 - i, last - 1 - j).to_f64()
                } else {
                    gso.mu(first + j, first + i).to_f64()
                };
            }
        }

        self.target_base = if self.cvp {
            params.target[first..last].to_vec()
        } else {
            vec![0.0; d]
        };
        self.pruning = if params.pruning.is_empty() {
            vec![1.0; d]
        } else {
            params.pruning[..d].to_vec()
        };
        self.subsoldists = self.rdiag.clone();

        self.x = vec![0.0; d];
        self.alpha = vec![0.0; d];
        self.center = vec![0.0; d];
        self.partdist = vec![0.0; d];
        self.partsums = vec![vec![0.0; d + 1]; d];
        self.partsum_begin = vec![0; d];
        self.fx = Vec::with_capacity(d);
        self.prepared = true;
    }

    fn run<E: Evaluator + ?Sized>(
        &mut self,
        evaluator: &mut E,
        max_dist: &mut G::Float,
        max_dist_expo: i64,
        subtree: &[f64],
        subtree_reset: bool,
    ) {
        let shift = self.bound_shift(max_dist_expo);
        self.max_dist = max_dist.to_f64_scaled(shift);
        self.search(evaluator, subtree, subtree_reset);
        max_dist.assign_scaled(self.max_dist, -shift);
    }

    fn search<E: Evaluator + ?Sized>(
        &mut self,
        evaluator: &mut E,
        subtree: &[f64],
        subtree_reset: bool,
    ) {
        let d = self.d;
        let k_end = d - subtree.len();
        self.is_svp = !self.cvp;
        self.x.iter_mut().for_each(|v| *v = 0.0);
        self.alpha.iter_mut().for_each(|v| *v = 0.0);
        self.center.iter_mut().for_each(|v| *v = 0.0);
        self.partdist.iter_mut().for_each(|v| *v = 0.0);

        // fold the fixed prefix into the centers of the free levels
        let mut base = self.target_base.clone();
        let mut dist = 0.0;
        for k in (k_end..d).rev() {
            let xk = subtree[k - k_end];
            if xk != 0.0 {
                self.is_svp = false;
            }
            let alpha = xk - base[k];
            self.x[k] = xk;
            self.center[k] = base[k];
            self.alpha[k] = alpha;
            self.partdist[k] = dist;
            if !subtree_reset {
                dist += alpha * alpha * self.rdiag[k];
            }
            if !(dist <= self.max_dist * self.pruning[k]) {
                return;
            }
            for j in 0..k {
                base[j] -= xk * self.mut_[j][k];
            }
        }

        if k_end == 0 {
            self.nodes += 1;
            if dist > 0.0 || !self.is_svp || self.partial_tree {
                self.report_solution(evaluator, dist);
            }
            return;
        }

        for k in 0..k_end {
            self.partsums[k][k_end] = base[k];
            self.partsum_begin[k] = k_end - 1;
        }
        let root = k_end - 1;
        self.center[root] = base[root];
        self.partdist[root] = dist;
        self.enumerate_level(evaluator, root);
    }

    fn enumerate_level<E: Evaluator + ?Sized>(&mut self, evaluator: &mut E, kk: usize) {
        let center = self.center[kk];
        let partdist = self.partdist[kk];
        // all levels above are zero: only one of v and -v needs visiting
        let half_space = self.is_svp && partdist == 0.0;

        let mut xk = if half_space { 0.0 } else { center.round() };
        let mut dx = if center >= xk { 1.0 } else { -1.0 };
        let mut ddx = dx;

        loop {
            let alpha = xk - center;
            let newdist = partdist + alpha * alpha * self.rdiag[kk];
            if !(newdist <= self.max_dist * self.pruning[kk]) {
                break;
            }

            if self.allows(kk, xk) {
                self.nodes += 1;
                self.x[kk] = xk;
                self.alpha[kk] = alpha;

                if self.find_subsols && newdist > 0.0 && newdist < self.subsoldists[kk] {
                    self.subsoldists[kk] = newdist;
                    self.report_subsolution(evaluator, kk, newdist);
                }

                if kk == 0 {
                    if newdist > 0.0 || !self.is_svp || self.partial_tree {
                        self.report_solution(evaluator, newdist);
                    }
                } else {
                    self.partdist[kk - 1] = newdist;
                    self.descend(kk);
                    self.enumerate_level(evaluator, kk - 1);
                }
            }

            if half_space {
                xk += 1.0;
            } else {
                xk += dx;
                ddx = -ddx;
                dx = ddx - dx;
            }
        }
    }

    // refresh the center of level kk - 1 after x[kk] changed
    fn descend(&mut self, kk: usize) {
        let row = kk - 1;
        let begin = self.partsum_begin[kk];
        for j in (kk..=begin).rev() {
            let coeff = if self.dual { self.alpha[j] } else { self.x[j] };
            self.partsums[row][j] = self.partsums[row][j + 1] - coeff * self.mut_[row][j];
        }
        if begin > self.partsum_begin[row] {
            self.partsum_begin[row] = begin;
        }
        self.partsum_begin[kk] = kk;
        self.center[row] = self.partsums[row][kk];
    }

    fn allows(&self, kk: usize, xk: f64) -> bool {
        self.max_indices
            .get(kk)
            .map_or(true, |&cap| xk.abs() <= cap as f64)
    }

    fn report_solution<E: Evaluator + ?Sized>(&mut self, evaluator: &mut E, dist: f64) {
        self.fx.clear();
        if self.dual {
            self.fx.extend(self.x.iter().rev());
        } else {
            self.fx.extend_from_slice(&self.x);
        }
        evaluator.eval_sol(&self.fx, dist, &mut self.max_dist);
    }

    fn report_subsolution<E: Evaluator + ?Sized>(
        &mut self,
        evaluator: &mut E,
        offset: usize,
        dist: f64,
    ) {
        self.fx.clear();
        self.fx.extend((0..self.d).map(|j| if j < offset { 0.0 } else { self.x[j] }));
        evaluator.eval_sub_sol(offset, &self.fx, dist);
    }
}
