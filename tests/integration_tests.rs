//! Integration tests for the enumeration engines and the façade
use lattice_enum::utils::{identity_like_basis, linear_pruning, random_reduced_gso};
use lattice_enum::*;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Keeps every solution and records the bound it was handed each time.
struct RecordingEvaluator {
    inner: FastEvaluator,
    observed: Vec<f64>,
}

impl RecordingEvaluator {
    fn new(inner: FastEvaluator) -> Self {
        RecordingEvaluator {
            inner,
            observed: Vec::new(),
        }
    }
}

impl Evaluator for RecordingEvaluator {
    fn eval_sol(&mut self, coords: &[f64], dist: f64, max_dist: &mut f64) {
        self.observed.push(*max_dist);
        self.inner.eval_sol(coords, dist, max_dist);
        self.observed.push(*max_dist);
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
}

/// Backend accepting plain enumerations and reporting a fixed node count.
struct MockBackend {
    accept: bool,
    calls: std::rc::Rc<std::cell::Cell<usize>>,
}

impl ExternalEnumerator<GramSchmidt> for MockBackend {
    fn enumerate(
        &mut self,
        _gso: &GramSchmidt,
        evaluator: &mut dyn Evaluator,
        first: usize,
        last: usize,
        max_dist: &mut f64,
        _max_dist_expo: i64,
        _pruning: &[f64],
        _dual: bool,
    ) -> bool {
        self.calls.set(self.calls.get() + 1);
        if !self.accept {
            return false;
        }
        let mut coords = vec![0.0; last - first];
        coords[0] = 1.0;
        evaluator.set_norm_exponent(0);
        evaluator.eval_sol(&coords, 1.0, max_dist);
        true
    }

    fn get_nodes(&self) -> u64 {
        42
    }
}

fn sequential_run(gso: &GramSchmidt, eval: &mut FastEvaluator, bound: f64, params: &EnumParams) -> (f64, u64) {
    let mut bound = bound;
    let mut engine = SequentialEnumerator::new(gso);
    engine
        .enumerate(eval, 0, None, &mut bound, 0, params)
        .unwrap();
    (bound, engine.get_nodes())
}

fn parallel_run(
    gso: &GramSchmidt,
    eval: &mut FastEvaluator,
    bound: f64,
    threads: usize,
    split: Option<usize>,
    params: &EnumParams,
) -> (f64, u64, Vec<u64>) {
    let mut bound = bound;
    let mut engine = ParallelEnumerator::new(gso).with_threads(threads);
    engine
        .enumerate(eval, 0, None, &mut bound, 0, split, params)
        .unwrap();
    (bound, engine.get_nodes(), engine.node_counts().to_vec())
}

#[test]
fn test_parallel_matches_sequential_on_random_bases() {
    init_logging();
    for (n, seed) in [(20, 1u64), (24, 2), (30, 3)] {
        let gso = random_reduced_gso(n, Some(seed)).unwrap();
        let bound = gso.r(0) * 1.01;
        let params = EnumParams::new();

        let mut seq_eval = FastEvaluator::best(3);
        let (seq_bound, seq_nodes) = sequential_run(&gso, &mut seq_eval, bound, &params);

        let mut par_eval = FastEvaluator::best(3);
        let (par_bound, par_nodes, counts) = parallel_run(&gso, &mut par_eval, bound, 3, None, &params);

        let seq_dists: Vec<f64> = seq_eval.solutions().iter().map(|s| s.dist).collect();
        let par_dists: Vec<f64> = par_eval.solutions().iter().map(|s| s.dist).collect();
        assert_eq!(seq_dists.len(), par_dists.len(), "dimension {}", n);
        for (a, b) in seq_dists.iter().zip(&par_dists) {
            assert!((a - b).abs() < 1e-9, "dimension {}: {} vs {}", n, a, b);
        }
        assert!((seq_bound - par_bound).abs() < 1e-9);
        for sol in par_eval.solutions() {
            assert!((gso.squared_length(&sol.coords) - sol.dist).abs() < 1e-9);
        }
        assert!(seq_nodes > 0);
        assert_eq!(par_nodes, counts.iter().sum::<u64>());
    }
}

#[test]
fn test_dimension_thirty_scenario() {
    init_logging();
    let basis = identity_like_basis(30, Some(30));
    let gso = GramSchmidt::from_basis(&basis).unwrap();

    let mut seq_eval = FastEvaluator::best(1);
    let (_, seq_nodes) = sequential_run(&gso, &mut seq_eval, 2.0, &EnumParams::new());

    let mut par_eval = FastEvaluator::best(1);
    let (par_bound, par_nodes, counts) = parallel_run(&gso, &mut par_eval, 2.0, 4, None, &EnumParams::new());

    let best = par_eval.best_solution().unwrap();
    assert!((best.dist - 1.0).abs() < 1e-9);
    assert!((gso.squared_length(&best.coords) - 1.0).abs() < 1e-9);
    assert!((par_bound - 1.0).abs() < 1e-9);
    assert_eq!(counts.len(), 5);
    assert!(par_nodes > 0);
    assert!(par_nodes <= seq_nodes * 25);
}

#[test]
fn test_bound_observed_by_evaluator_is_monotone() {
    init_logging();
    let gso = random_reduced_gso(26, Some(8)).unwrap();
    let mut eval = RecordingEvaluator::new(FastEvaluator::best(2));
    let mut bound = gso.r(0) * 1.5;
    let mut engine = ParallelEnumerator::new(&gso).with_threads(4);
    engine
        .enumerate(&mut eval, 0, None, &mut bound, 0, Some(4), &EnumParams::new())
        .unwrap();

    assert!(!eval.observed.is_empty());
    assert!(eval.observed.windows(2).all(|w| w[1] <= w[0]));
    assert!(!eval.is_empty());
}

#[test]
fn test_node_totals_conserved_with_target_and_pruning() {
    init_logging();
    let n = 22;
    let gso = random_reduced_gso(n, Some(5)).unwrap();
    let target: Vec<f64> = (0..n).map(|i| ((i * 7) % 5) as f64 * 0.2 - 0.4).collect();
    let params = EnumParams::new()
        .with_target(target)
        .with_pruning(linear_pruning(n, 0.5));

    // keeping every solution leaves the bound untouched in both engines
    let mut seq_eval = FastEvaluator::best(usize::MAX);
    let (_, seq_nodes) = sequential_run(&gso, &mut seq_eval, 2.0, &params);

    let mut par_eval = FastEvaluator::best(usize::MAX);
    let (par_bound, par_nodes, counts) = parallel_run(&gso, &mut par_eval, 2.0, 4, Some(3), &params);

    assert_eq!(par_nodes, seq_nodes);
    assert_eq!(counts.iter().sum::<u64>(), par_nodes);
    assert_eq!(par_eval.len(), seq_eval.len());
    assert_eq!(par_bound, 2.0);
}

#[test]
fn test_parallel_subsolutions_match_sequential() {
    init_logging();
    let gso = random_reduced_gso(18, Some(13)).unwrap();
    let bound = gso.r(0) * 1.2;

    let mut seq_eval = FastEvaluator::best(usize::MAX).with_subsolutions();
    sequential_run(&gso, &mut seq_eval, bound, &EnumParams::new());

    let mut par_eval = FastEvaluator::best(usize::MAX).with_subsolutions();
    parallel_run(&gso, &mut par_eval, bound, 3, Some(3), &EnumParams::new());

    let seq_subs: Vec<(usize, f64)> = seq_eval.sub_solutions().map(|(o, s)| (o, s.dist)).collect();
    let par_subs: Vec<(usize, f64)> = par_eval.sub_solutions().map(|(o, s)| (o, s.dist)).collect();
    assert_eq!(seq_subs.len(), par_subs.len());
    for ((so, sd), (po, pd)) in seq_subs.iter().zip(&par_subs) {
        assert_eq!(so, po);
        assert!((sd - pd).abs() < 1e-9);
    }
}

#[test]
fn test_first_n_collapses_parallel_bound() {
    init_logging();
    let gso = GramSchmidt::diagonal(vec![1.0; 16]).unwrap();
    let mut eval = FastEvaluator::new(5, EvaluatorStrategy::FirstN, false);
    let (bound, _, _) = parallel_run(&gso, &mut eval, 2.5, 3, None, &EnumParams::new());
    assert_eq!(eval.len(), 5);
    assert_eq!(bound, 0.0);
}

#[test]
fn test_callback_evaluator_through_facade() {
    init_logging();
    let gso = GramSchmidt::diagonal(vec![1.0; 14]).unwrap();
    let mut eval = CallbackEvaluator::new(FastEvaluator::best(4), |coords: &[f64]| coords[0] == 0.0);
    let mut bound = 1.5;
    let mut enumeration =
        Enumeration::new(&gso).with_config(EnumerationConfig::default().with_threads(2));
    enumeration
        .enumerate(&mut eval, 0, None, &mut bound, 0, &EnumParams::new())
        .unwrap();
    assert_eq!(eval.inner().len(), 4);
    assert!(eval.inner().solutions().iter().all(|s| s.coords[0] == 0.0));
}

#[test]
fn test_split_out_of_bounds_through_facade() {
    init_logging();
    let gso = GramSchmidt::diagonal(vec![1.0; 16]).unwrap();
    let mut enumeration = Enumeration::new(&gso).with_config(
        EnumerationConfig::default()
            .with_threads(4)
            .with_split_level(15),
    );
    let mut eval = FastEvaluator::best(1);
    let mut bound = 2.0;
    let result = enumeration.enumerate(&mut eval, 0, None, &mut bound, 0, &EnumParams::new());

    if features::parallel_available() {
        assert_eq!(
            result,
            Err(LatticeError::SplitOutOfBounds {
                split: 15,
                min: 1,
                max: 14
            })
        );
        assert!(eval.is_empty());
        assert_eq!(bound, 2.0);
        assert_eq!(enumeration.get_nodes(), 0);
    } else {
        assert!(result.is_ok());
    }
}

#[test]
fn test_external_backend_dispatch() {
    init_logging();
    let gso = GramSchmidt::diagonal(vec![1.0; 12]).unwrap();
    let calls = std::rc::Rc::new(std::cell::Cell::new(0));

    let mut enumeration = Enumeration::new(&gso).with_external(Box::new(MockBackend {
        accept: true,
        calls: calls.clone(),
    }));
    let mut eval = FastEvaluator::best(1);
    let mut bound = 4.0;
    let nodes = enumeration
        .enumerate(&mut eval, 0, None, &mut bound, 0, &EnumParams::new())
        .unwrap();
    assert_eq!(nodes, 42);
    assert_eq!(enumeration.last_engine(), Some(EngineKind::External));
    assert_eq!(calls.get(), 1);
    assert_eq!(bound, 1.0);

    // a target bypasses the backend
    let target = vec![0.3; 12];
    let mut eval = FastEvaluator::best(1);
    let mut bound = 4.0;
    enumeration
        .enumerate(&mut eval, 0, None, &mut bound, 0, &EnumParams::new().with_target(target))
        .unwrap();
    assert_eq!(calls.get(), 1);
    assert_ne!(enumeration.last_engine(), Some(EngineKind::External));
    assert!((eval.best_solution().unwrap().dist - 12.0 * 0.09).abs() < 1e-9);
}

#[test]
fn test_declining_backend_falls_back() {
    init_logging();
    let gso = GramSchmidt::diagonal(vec![1.0; 12]).unwrap();
    let calls = std::rc::Rc::new(std::cell::Cell::new(0));
    let mut enumeration = Enumeration::new(&gso)
        .with_config(EnumerationConfig::default().with_threads(2))
        .with_external(Box::new(MockBackend {
            accept: false,
            calls: calls.clone(),
        }));
    let mut eval = FastEvaluator::best(1);
    let mut bound = 4.0;
    let nodes = enumeration
        .enumerate(&mut eval, 0, None, &mut bound, 0, &EnumParams::new())
        .unwrap();
    assert_eq!(calls.get(), 1);
    assert!(nodes > 0);
    let expected = if features::parallel_available() {
        EngineKind::Parallel
    } else {
        EngineKind::Sequential
    };
    assert_eq!(enumeration.last_engine(), Some(expected));
    assert_eq!(bound, 1.0);
}

#[test]
fn test_dual_enumeration_routes_sequentially() {
    init_logging();
    // dual squared lengths are 1 / r_i, smallest at the largest r_i
    let mut norms = vec![1.0; 12];
    norms[2] = 16.0;
    norms[7] = 4.0;
    let gso = GramSchmidt::diagonal(norms).unwrap();
    let mut enumeration =
        Enumeration::new(&gso).with_config(EnumerationConfig::default().with_threads(4));
    let mut eval = FastEvaluator::best(2);
    let mut bound = 2.0;
    enumeration
        .enumerate(&mut eval, 0, None, &mut bound, 0, &EnumParams::new().with_dual(true))
        .unwrap();

    assert_eq!(enumeration.last_engine(), Some(EngineKind::Sequential));
    let solutions = eval.solutions();
    let mut expected = vec![0.0; 12];
    expected[2] = 1.0;
    assert_eq!(solutions[0].coords, expected);
    assert!((solutions[0].dist - 1.0 / 16.0).abs() < 1e-12);
    assert!((solutions[1].dist - 0.25).abs() < 1e-12);
    assert_eq!(solutions[1].coords[7], 1.0);
}

#[test]
fn test_index_caps_force_sequential() {
    init_logging();
    let gso = GramSchmidt::diagonal(vec![1.0; 12]).unwrap();
    let mut enumeration = Enumeration::new(&gso)
        .with_config(EnumerationConfig::default().with_threads(4))
        .with_max_indices(vec![0; 12]);
    let mut eval = FastEvaluator::best(1);
    let mut bound = 4.0;
    enumeration
        .enumerate(&mut eval, 0, None, &mut bound, 0, &EnumParams::new())
        .unwrap();
    assert_eq!(enumeration.last_engine(), Some(EngineKind::Sequential));
    assert!(eval.is_empty());
    assert_eq!(bound, 4.0);
}
