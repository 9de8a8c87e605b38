//! Kripke structure of a bounded buffer
//!
//! State `buffer_i` means the buffer holds `i` items. A producer step moves
//! to `buffer_{i+1}` and a consumer step to `buffer_{i-1}`.

use ripple_core::Graph;
use ripple_ctl::Formula;

pub const PRODUCER_READY: &str = "producer_ready";
pub const CONSUMER_READY: &str = "consumer_ready";
pub const BUFFER_FULL: &str = "buffer_full";
pub const BUFFER_EMPTY: &str = "buffer_empty";

pub fn state_name(size: usize) -> String {
    format!("buffer_{}", size)
}

/// Graph of a buffer with room for `capacity` items, initially empty
///
/// Capacity 0 gives a single state with no successors where neither side
/// is ready.
pub fn graph(capacity: usize) -> Graph {
    let mut graph = Graph::new();
    let states: Vec<_> = (0..=capacity)
        .map(|size| {
            let mut labels = Vec::new();
            if size < capacity {
                labels.push(PRODUCER_READY);
            }
            if size > 0 {
                labels.push(CONSUMER_READY);
            }
            if size == capacity {
                labels.push(BUFFER_FULL);
            }
            if size == 0 {
                labels.push(BUFFER_EMPTY);
            }
            graph.add_state(state_name(size), labels)
        })
        .collect();

    for pair in states.windows(2) {
        graph.add_edge(pair[0], pair[1]);
        graph.add_edge(pair[1], pair[0]);
    }
    graph.mark_initial(states[0]);
    graph
}

/// Properties every bounded buffer with positive capacity satisfies
///
/// `no_deadlock` fails on `graph(0)`; callers reject that capacity.
pub fn properties() -> Vec<(&'static str, Formula)> {
    vec![
        ("can_fill", Formula::atom(BUFFER_FULL).ef()),
        (
            "no_deadlock",
            Formula::or(Formula::atom(PRODUCER_READY), Formula::atom(CONSUMER_READY)).ag(),
        ),
        ("always_drainable", Formula::atom(BUFFER_EMPTY).ef().ag()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_shape() {
        let graph = graph(2);
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.edge_count(), 4);
        assert_eq!(graph.initial().len(), 1);

        let middle = graph.state_id("buffer_1").unwrap();
        assert!(graph.has_label(middle, PRODUCER_READY));
        assert!(graph.has_label(middle, CONSUMER_READY));
        assert!(!graph.has_label(middle, BUFFER_FULL));
        assert_eq!(graph.succ(middle).len(), 2);

        let full = graph.state_id("buffer_2").unwrap();
        assert!(graph.has_label(full, BUFFER_FULL));
        assert!(!graph.has_label(full, PRODUCER_READY));
    }

    #[test]
    fn test_zero_capacity_is_a_single_state() {
        let graph = graph(0);
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.edge_count(), 0);
        let only = graph.state_id("buffer_0").unwrap();
        assert!(graph.has_label(only, BUFFER_FULL));
        assert!(graph.has_label(only, BUFFER_EMPTY));

        let checker = ripple_ctl::CtlChecker::new(&graph);
        let failing: Vec<&str> = properties()
            .into_iter()
            .filter(|(_, property)| !checker.holds_initially(property))
            .map(|(name, _)| name)
            .collect();
        assert_eq!(failing, vec!["no_deadlock"]);
    }

    #[test]
    fn test_properties_hold_for_positive_capacity() {
        for capacity in 1..6 {
            let graph = graph(capacity);
            let checker = ripple_ctl::CtlChecker::new(&graph);
            for (name, property) in properties() {
                assert!(checker.holds_initially(&property), "{} at capacity {}", name, capacity);
            }
        }
    }
}
