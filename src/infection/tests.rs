use std::sync::atomic::Ordering;
use std::sync::Arc;

use super::*;
use crate::error::GraphError;
use crate::graph::CoachingGraph;

fn star() -> CoachingGraph {
    let mut graph = CoachingGraph::directed();
    for id in ["A", "B", "C", "D"] {
        graph.add_node(id);
    }
    for student in ["B", "C", "D"] {
        graph.add_edge("A", student);
    }
    graph
}

fn tree(graph: &mut CoachingGraph) {
    for id in ["A", "B", "C", "D", "E", "F", "G", "H", "I"] {
        graph.add_node(id);
    }
    for (coach, student) in [
        ("A", "B"),
        ("A", "C"),
        ("B", "D"),
        ("B", "E"),
        ("C", "F"),
        ("C", "G"),
        ("G", "H"),
        ("G", "I"),
    ] {
        graph.add_edge(coach, student);
    }
}

fn two_components() -> CoachingGraph {
    let mut graph = CoachingGraph::directed();
    tree(&mut graph);
    for id in ["J", "K", "L", "M"] {
        graph.add_node(id);
    }
    for student in ["K", "L", "M"] {
        graph.add_edge("J", student);
    }
    graph
}

fn carriers(graph: &CoachingGraph, feature: &str) -> Vec<String> {
    graph
        .nodes()
        .filter(|node| node.features().contains(feature))
        .map(|node| node.id().to_string())
        .collect()
}

#[test]
fn total_infection_from_coach_and_student() {
    let engine = InfectionEngine::default();
    let mut graph = star();

    let report = engine.total_infection(&mut graph, "coach", "A").unwrap();
    assert!(report.is_success());
    assert_eq!(report.infected, 4);
    assert_eq!(carriers(&graph, "coach").len(), 4);

    engine.total_infection(&mut graph, "student", "C").unwrap();
    assert_eq!(carriers(&graph, "student").len(), 4);
}

#[test]
fn total_infection_stays_in_component() {
    let engine = InfectionEngine::default();
    let mut graph = two_components();
    engine.total_infection(&mut graph, "component1", "A").unwrap();
    engine.total_infection(&mut graph, "component2", "K").unwrap();
    for node in graph.nodes() {
        let first = node.id() < "J";
        assert_eq!(node.features().contains("component1"), first);
        assert_eq!(node.features().contains("component2"), !first);
    }
}

#[test]
fn total_infection_is_idempotent() {
    let engine = InfectionEngine::default();
    let mut graph = star();
    engine.total_infection(&mut graph, "x", "B").unwrap();
    let once: Vec<_> = graph.nodes().map(|n| n.features().clone()).collect();
    engine.total_infection(&mut graph, "x", "B").unwrap();
    let twice: Vec<_> = graph.nodes().map(|n| n.features().clone()).collect();
    assert_eq!(once, twice);
}

#[test]
fn total_infection_with_exclusion_removes_feature() {
    let engine = InfectionEngine::default();
    let mut graph = two_components();
    engine.total_infection(&mut graph, "points", "B").unwrap();
    engine.total_infection(&mut graph, "points", "K").unwrap();
    engine.total_infection(&mut graph, "!points", "D").unwrap();
    assert_eq!(carriers(&graph, "points"), vec!["J", "K", "L", "M"]);
    assert!(carriers(&graph, "!points").is_empty());
}

#[test]
fn total_infection_unknown_anchor() {
    let engine = InfectionEngine::default();
    let mut graph = star();
    let err = engine.total_infection(&mut graph, "x", "Z").unwrap_err();
    assert!(matches!(err, GraphError::NotFound(id) if id == "Z"));
    assert!(carriers(&graph, "x").is_empty());
}

#[test]
fn empty_feature_is_rejected_before_mutation() {
    let engine = InfectionEngine::default();
    let mut graph = star();
    assert!(matches!(
        engine.total_infection(&mut graph, "!", "A"),
        Err(GraphError::InvalidArgument(_))
    ));
}

#[test]
fn exact_on_single_component() {
    let engine = InfectionEngine::default();
    let mut graph = star();

    let report = engine.exact_limited_infection(&mut graph, "exact1", 3).unwrap();
    assert!(!report.is_success());
    assert_eq!(
        report.outcome,
        InfectionOutcome::Infeasible {
            reason: InfeasibleReason::NoExactSubset
        }
    );
    assert!(carriers(&graph, "exact1").is_empty());

    let report = engine.exact_limited_infection(&mut graph, "exact2", 4).unwrap();
    assert!(report.is_success());
    assert_eq!(report.users, vec!["A", "B", "C", "D"]);
    assert_eq!(carriers(&graph, "exact2").len(), 4);
}

#[test]
fn exact_on_two_components() {
    let engine = InfectionEngine::default();
    let mut graph = two_components();

    let report = engine.exact_limited_infection(&mut graph, "exact3", 6).unwrap();
    assert!(!report.is_success());
    assert!(carriers(&graph, "exact3").is_empty());

    let report = engine.exact_limited_infection(&mut graph, "exact4", 4).unwrap();
    assert!(report.is_success());
    assert_eq!(carriers(&graph, "exact4"), vec!["J", "K", "L", "M"]);

    let report = engine.exact_limited_infection(&mut graph, "exact5", 9).unwrap();
    assert!(report.is_success());
    assert_eq!(report.components_selected, 1);
    assert!(carriers(&graph, "exact5").iter().all(|id| id.as_str() < "J"));
    assert_eq!(carriers(&graph, "exact5").len(), 9);

    let report = engine.exact_limited_infection(&mut graph, "exact6", 13).unwrap();
    assert_eq!(report.components_selected, 2);
    assert_eq!(carriers(&graph, "exact6").len(), 13);
}

#[test]
fn exact_beyond_population() {
    let engine = InfectionEngine::default();
    let mut graph = star();
    let report = engine.exact_limited_infection(&mut graph, "x", 5).unwrap();
    assert_eq!(
        report.outcome,
        InfectionOutcome::Infeasible {
            reason: InfeasibleReason::TargetExceedsPopulation { population: 4 }
        }
    );
}

#[test]
fn exact_respects_search_budget() {
    let mut graph = CoachingGraph::directed();
    // 20 components of even size: an odd target can never be met.
    for c in 0..20 {
        let coach = format!("c{c}");
        graph.add_node(coach.clone());
        for s in 0..(2 * c + 1) {
            graph.add_edge(&coach, &format!("c{c}s{s}"));
        }
    }
    let engine = InfectionEngine::new(InfectionOptions::new().max_search_steps(Some(25)));
    let report = engine.exact_limited_infection(&mut graph, "x", 101).unwrap();
    assert_eq!(
        report.outcome,
        InfectionOutcome::Infeasible {
            reason: InfeasibleReason::SearchBudgetExhausted { steps: 25 }
        }
    );
    assert!(carriers(&graph, "x").is_empty());
}

#[test]
fn limited_on_single_component() {
    let engine = InfectionEngine::default();
    let mut graph = star();

    let report = engine.limited_infection(&mut graph, "limited1", 1, 5).unwrap();
    assert!(report.is_success());
    assert_eq!(carriers(&graph, "limited1").len(), 4);

    let report = engine.limited_infection(&mut graph, "limited2", 5, 10).unwrap();
    assert!(!report.is_success());
    assert!(carriers(&graph, "limited2").is_empty());
}

#[test]
fn limited_splits_a_component_into_classes() {
    let engine = InfectionEngine::default();
    let mut graph = CoachingGraph::directed();
    tree(&mut graph);

    let report = engine.limited_infection(&mut graph, "limited3", 4, 8).unwrap();
    assert!(report.is_success());
    assert_eq!(report.components_selected, 0);
    assert!(report.classes_selected > 0);
    let infected = carriers(&graph, "limited3").len();
    assert!((4..=8).contains(&infected));
    assert_eq!(report.infected, infected);
}

#[test]
fn limited_prefers_the_small_component() {
    let engine = InfectionEngine::default();
    let mut graph = two_components();

    let report = engine.limited_infection(&mut graph, "limited4", 3, 5).unwrap();
    assert!(report.is_success());
    assert_eq!(carriers(&graph, "limited4"), vec!["J", "K", "L", "M"]);

    let report = engine.limited_infection(&mut graph, "limited5", 3, 8).unwrap();
    assert!(report.is_success());
    let infected = carriers(&graph, "limited5");
    assert!(["J", "K", "L", "M"]
        .iter()
        .all(|id| infected.iter().any(|i| i == id)));
    assert!((4..=8).contains(&infected.len()));

    let report = engine.limited_infection(&mut graph, "limited6", 11, 15).unwrap();
    assert!(report.is_success());
    assert_eq!(carriers(&graph, "limited6").len(), 13);
}

#[test]
fn limited_tops_up_with_classes() {
    let engine = InfectionEngine::default();
    let mut graph = two_components();
    // 4 from J's component is not enough; classes from the tree fill the gap.
    let report = engine.limited_infection(&mut graph, "mix", 6, 8).unwrap();
    assert!(report.is_success());
    assert_eq!(report.components_selected, 1);
    assert!(report.classes_selected >= 1);
    let infected = carriers(&graph, "mix");
    assert!((6..=8).contains(&infected.len()));
    for id in ["J", "K", "L", "M"] {
        assert!(infected.iter().any(|i| i == id));
    }
}

#[test]
fn limited_without_class_pass_fails_cleanly() {
    let engine = InfectionEngine::new(InfectionOptions::new().class_pass(false));
    let mut graph = CoachingGraph::directed();
    tree(&mut graph);
    let report = engine.limited_infection(&mut graph, "x", 4, 8).unwrap();
    assert_eq!(
        report.outcome,
        InfectionOutcome::Infeasible {
            reason: InfeasibleReason::RangeUnreachable { best: 0 }
        }
    );
    assert!(report.users.is_empty());
    assert!(carriers(&graph, "x").is_empty());
}

#[test]
fn limited_rejects_inverted_range() {
    let engine = InfectionEngine::default();
    let mut graph = star();
    assert!(matches!(
        engine.limited_infection(&mut graph, "x", 5, 2),
        Err(GraphError::InvalidArgument(_))
    ));
}

#[test]
fn counter_metrics_observe_engine() {
    let metrics = Arc::new(CounterMetrics::default());
    let engine = InfectionEngine::default().with_metrics(metrics.clone());
    let mut graph = two_components();

    engine.total_infection(&mut graph, "t", "A").unwrap();
    engine.exact_limited_infection(&mut graph, "e", 4).unwrap();
    engine.exact_limited_infection(&mut graph, "e", 6).unwrap();
    engine.limited_infection(&mut graph, "l", 3, 5).unwrap();

    assert_eq!(metrics.total_users.load(Ordering::Relaxed), 9);
    assert_eq!(metrics.exact_users.load(Ordering::Relaxed), 4);
    assert_eq!(metrics.limited_users.load(Ordering::Relaxed), 4);
    assert_eq!(metrics.exact_hits.load(Ordering::Relaxed), 1);
    assert_eq!(metrics.exact_misses.load(Ordering::Relaxed), 1);
    assert_eq!(metrics.rejected.load(Ordering::Relaxed), 1);
    assert_eq!(metrics.component_scans.load(Ordering::Relaxed), 3);
    assert_eq!(metrics.frontier_passes.load(Ordering::Relaxed), 1);
    // The 9-user component exceeds the bound; the 4-user one joins the empty
    // candidate in the frontier.
    assert_eq!(metrics.frontier_peak.load(Ordering::Relaxed), 2);
}

#[test]
fn report_serializes_outcome_tags() {
    let engine = InfectionEngine::default();
    let mut graph = star();
    // The only component and the only class both exceed the upper bound.
    let report = engine.limited_infection(&mut graph, "x", 2, 3).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["policy"]["kind"], "limited");
    assert_eq!(json["outcome"]["status"], "infeasible");
    assert_eq!(json["outcome"]["reason"]["code"], "range_unreachable");
    assert_eq!(json["outcome"]["reason"]["best"], 0);
    assert!(carriers(&graph, "x").is_empty());
}
