//! Time limits, resource-free problems and graphs edited after construction.

use std::thread;
use std::time::Duration;

use rcsp_labeling::{
    EdgeAttributes, GraphType, ProblemGraph, RcspError, RcspSolver, ResourceBounds, ResourceEdge, ResourceVector,
    SearchConfig, SearchMode,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Edge whose cost lookup takes `delay`, so a search can be made to outlive its deadline.
#[derive(Debug)]
struct SlowEdge {
    cost: f64,
    resources: ResourceVector,
    delay: Duration,
}

impl SlowEdge {
    fn new(cost: f64, delay_ms: u64) -> Self {
        Self {
            cost,
            resources: ResourceVector::from([1.0]),
            delay: Duration::from_millis(delay_ms),
        }
    }
}

impl EdgeAttributes for SlowEdge {
    fn cost(&self) -> f64 {
        thread::sleep(self.delay);
        self.cost
    }

    fn resources(&self) -> &ResourceVector {
        &self.resources
    }
}

/// s -> a -> t is cheap, s -> t is expensive; only s -> a is slow to read.
fn slow_graph() -> ProblemGraph<&'static str, SlowEdge> {
    let mut dag = GraphType::default();
    let s = dag.add_node("s");
    let a = dag.add_node("a");
    let t = dag.add_node("t");
    dag.add_edge(s, a, SlowEdge::new(1.0, 300));
    dag.add_edge(a, t, SlowEdge::new(1.0, 0));
    dag.add_edge(s, t, SlowEdge::new(5.0, 0));
    ProblemGraph::new(dag, s, t)
}

#[test]
fn zero_time_limit_finds_nothing() {
    init_logger();
    for mode in [SearchMode::Forward, SearchMode::Backward] {
        let bounds = ResourceBounds::new([3.0], [0.0]).unwrap();
        let config = SearchConfig::default().mode(mode).time_limit(Duration::ZERO);
        let solver = RcspSolver::new(slow_graph(), bounds).unwrap().with_config(config).unwrap();

        assert_eq!(solver.solve().unwrap_err(), RcspError::DeadlineExceeded { iterations: 0 }, "{mode:?}");
    }
}

#[test]
fn zero_time_limit_still_joins_the_origins() {
    init_logger();
    let bounds = ResourceBounds::new([3.0], [0.0]).unwrap();
    let config = SearchConfig::default().time_limit(Duration::ZERO);
    let solver = RcspSolver::new(slow_graph(), bounds).unwrap().with_config(config).unwrap();
    let solution = solver.solve().unwrap();

    // source and sink labels meet over the direct edge
    assert_eq!(solution.path.len(), 2);
    assert_eq!(solution.total_cost, 5.0);
    assert!(!solution.complete);
}

#[test]
fn path_found_before_deadline_is_returned_incomplete() {
    init_logger();
    let bounds = ResourceBounds::new([3.0], [0.0]).unwrap();
    let config = SearchConfig::default()
        .mode(SearchMode::Forward)
        .time_limit(Duration::from_millis(100));
    let solver = RcspSolver::new(slow_graph(), bounds).unwrap().with_config(config).unwrap();
    let solution = solver.solve().unwrap();

    // the first iteration stores s -> t and outlasts the limit reading s -> a
    assert_eq!(solution.path, vec![solver.get_graph().start, solver.get_graph().end]);
    assert_eq!(solution.total_cost, 5.0);
    assert!(!solution.complete);
    assert_eq!(solution.forward_stats.map(|s| s.iterations), Some(1));
}

#[test]
fn generous_time_limit_completes() {
    init_logger();
    let bounds = ResourceBounds::new([3.0], [0.0]).unwrap();
    let config = SearchConfig::default()
        .mode(SearchMode::Forward)
        .time_limit(Duration::from_secs(60));
    let solver = RcspSolver::new(slow_graph(), bounds).unwrap().with_config(config).unwrap();
    let solution = solver.solve().unwrap();

    assert_eq!(solution.total_cost, 2.0);
    assert!(solution.complete);
}

fn resource_free() -> ProblemGraph<&'static str, ResourceEdge> {
    let mut dag = GraphType::default();
    let s = dag.add_node("s");
    let a = dag.add_node("a");
    let t = dag.add_node("t");
    dag.add_edge(s, a, ResourceEdge::new(1.0, Vec::<f64>::new()));
    dag.add_edge(a, t, ResourceEdge::new(1.0, Vec::<f64>::new()));
    dag.add_edge(s, t, ResourceEdge::new(5.0, Vec::<f64>::new()));
    ProblemGraph::new(dag, s, t)
}

#[test]
fn resource_free_problem_needs_a_unidirectional_mode() {
    init_logger();
    let bounds = ResourceBounds::new(Vec::<f64>::new(), Vec::<f64>::new()).unwrap();

    let solver = RcspSolver::new(resource_free(), bounds.clone()).unwrap();
    assert_eq!(
        solver.solve().unwrap_err(),
        RcspError::DimensionMismatch { expected: 0, found: 1 }
    );

    let solver = RcspSolver::new(resource_free(), bounds)
        .unwrap()
        .with_config(SearchConfig::default().mode(SearchMode::Forward))
        .unwrap();
    let solution = solver.solve().unwrap();
    assert_eq!(solution.path.len(), 3);
    assert_eq!(solution.total_cost, 2.0);
    assert!(solution.consumed_resources.is_empty());
}

#[test]
fn repair_checks_an_edited_graph() {
    init_logger();
    let bounds = ResourceBounds::new([3.0], [0.0]).unwrap();
    let mut dag = GraphType::default();
    let s = dag.add_node("s");
    let t = dag.add_node("t");
    dag.add_edge(s, t, ResourceEdge::new(1.0, [1.0]));
    let mut solver = RcspSolver::new(ProblemGraph::new(dag, s, t), bounds).unwrap();
    assert!(solver.repair(&[s, t]).is_ok());

    solver.get_graph_mut().dag.add_edge(s, t, ResourceEdge::new(2.0, [1.0]));
    assert!(matches!(solver.repair(&[s, t]), Err(RcspError::InvalidGraph(_))));
}
