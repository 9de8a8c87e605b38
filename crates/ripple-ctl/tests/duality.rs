//! Property-based tests for the fixpoint evaluator
//!
//! Random graphs of at most 8 states with random labelings, checked against
//! CTL dualities and against a direct reachability search.

use proptest::prelude::*;
use ripple_core::{Graph, StateId, StateSet};
use ripple_ctl::{pre_a, pre_e, Formula};

const PROPS: [&str; 3] = ["p", "q", "r"];

fn arb_graph() -> impl Strategy<Value = Graph> {
    (1usize..=8)
        .prop_flat_map(|n| {
            (
                prop::collection::vec(prop::collection::vec(any::<bool>(), PROPS.len()), n),
                prop::collection::vec((0..n, 0..n), 0..=3 * n),
                prop::collection::vec(0..n, 0..=2),
            )
        })
        .prop_map(|(labels, edges, initial)| {
            let mut graph = Graph::new();
            let ids: Vec<StateId> = labels
                .iter()
                .enumerate()
                .map(|(i, flags)| {
                    let props = PROPS
                        .iter()
                        .zip(flags)
                        .filter(|(_, on)| **on)
                        .map(|(p, _)| *p);
                    graph.add_state(format!("s{}", i), props)
                })
                .collect();
            for (from, to) in edges {
                graph.add_edge(ids[from], ids[to]);
            }
            for i in initial {
                graph.mark_initial(ids[i]);
            }
            graph
        })
}

fn arb_formula() -> impl Strategy<Value = Formula> {
    let leaf = prop_oneof![
        1 => Just(Formula::True),
        1 => Just(Formula::False),
        6 => prop::sample::select(PROPS.to_vec()).prop_map(Formula::atom),
    ];
    leaf.prop_recursive(4, 32, 2, |inner| {
        prop_oneof![
            inner.clone().prop_map(Formula::not),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| Formula::and(a, b)),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| Formula::or(a, b)),
            inner.clone().prop_map(Formula::ex),
            inner.clone().prop_map(Formula::ax),
            inner.clone().prop_map(Formula::ef),
            inner.clone().prop_map(Formula::af),
            inner.clone().prop_map(Formula::eg),
            inner.clone().prop_map(Formula::ag),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| Formula::eu(a, b)),
            (inner.clone(), inner).prop_map(|(a, b)| Formula::au(a, b)),
        ]
    })
}

/// States from which some state in `target` is reachable in zero or more steps
fn reachable_to(graph: &Graph, target: &StateSet) -> StateSet {
    let mut out = graph.empty_set();
    for start in graph.states() {
        let mut seen = graph.empty_set();
        let mut stack = vec![start];
        while let Some(s) = stack.pop() {
            if !seen.insert(s) {
                continue;
            }
            if target.contains(s) {
                out.insert(start);
                break;
            }
            stack.extend(graph.succ(s).iter().copied());
        }
    }
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_ef_is_dual_of_ag(graph in arb_graph(), phi in arb_formula()) {
        let ef = phi.clone().ef().sat(&graph);
        let dual = phi.not().ag().not().sat(&graph);
        prop_assert_eq!(ef, dual);
    }

    #[test]
    fn prop_af_is_dual_of_eg(graph in arb_graph(), phi in arb_formula()) {
        let af = phi.clone().af().sat(&graph);
        let dual = phi.not().eg().not().sat(&graph);
        prop_assert_eq!(af, dual);
    }

    #[test]
    fn prop_ex_is_dual_of_ax(graph in arb_graph(), phi in arb_formula()) {
        let ex = phi.clone().ex().sat(&graph);
        let dual = phi.not().ax().not().sat(&graph);
        prop_assert_eq!(ex, dual);
    }

    #[test]
    fn prop_pre_operators_are_dual_on_complements(graph in arb_graph(), phi in arb_formula()) {
        let target = phi.sat(&graph);
        prop_assert_eq!(
            pre_e(&graph, &target).complement(),
            pre_a(&graph, &target.complement())
        );
    }

    #[test]
    fn prop_eventually_is_until_true(graph in arb_graph(), phi in arb_formula()) {
        prop_assert_eq!(
            phi.clone().ef().sat(&graph),
            Formula::eu(Formula::True, phi.clone()).sat(&graph)
        );
        prop_assert_eq!(
            phi.clone().af().sat(&graph),
            Formula::au(Formula::True, phi).sat(&graph)
        );
    }

    #[test]
    fn prop_ef_matches_reachability(graph in arb_graph(), phi in arb_formula()) {
        let target = phi.sat(&graph);
        prop_assert_eq!(phi.ef().sat(&graph), reachable_to(&graph, &target));
    }

    #[test]
    fn prop_fixpoints_converge_within_state_count(graph in arb_graph(), phi in arb_formula()) {
        let nested = Formula::and(phi.clone().eg().af(), Formula::au(phi.clone(), phi.ag().ef()));
        let (_, stats) = nested.sat_with_stats(&graph);
        for trace in &stats.fixpoints {
            prop_assert!(
                trace.rounds <= graph.len(),
                "{} took {} rounds on {} states",
                trace.operator,
                trace.rounds,
                graph.len()
            );
        }
    }

    #[test]
    fn prop_globally_implies_operand(graph in arb_graph(), phi in arb_formula()) {
        let base = phi.sat(&graph);
        prop_assert!(phi.clone().ag().sat(&graph).is_subset(&base));
        prop_assert!(phi.clone().eg().sat(&graph).is_subset(&base));
        prop_assert!(phi.clone().ag().sat(&graph).is_subset(&phi.ef().sat(&graph)));
    }
}
